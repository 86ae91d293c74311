//! Source adapters: one uniform contract, one profile-driven implementation.

mod extract;
mod profile;

pub use extract::{apply_detail, parse_listing, salary_from_text, ListingPage};
pub use profile::{CardFields, DetailFields, FetchMode, SearchUrl, SiteProfile};

use std::borrow::Cow;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::browser::{release, RenderSession, Renderer};
use super::error::{panic_message, ScrapeError};
use super::http_client::PageFetcher;
use super::relevance::{RelevanceClassifier, Verdict};
use crate::models::{HarvestIssue, Posting, SourceId};

/// Result of one listing page.
#[derive(Debug, Default)]
pub struct PageOutcome {
    /// Relevant postings in listing order.
    pub postings: Vec<Posting>,
    /// Non-fatal problems (detail fetch failures, render timeouts, no match).
    pub warnings: Vec<String>,
    /// The listing chain matched nothing.
    pub no_match: bool,
}

/// Everything one source produced during a harvest.
#[derive(Debug)]
pub struct SourceReport {
    pub source: SourceId,
    pub postings: Vec<Posting>,
    pub issues: Vec<HarvestIssue>,
    pub pages_fetched: u32,
    /// Stopped early because the run was cancelled.
    pub cancelled: bool,
}

impl SourceReport {
    pub fn new(source: SourceId) -> Self {
        Self {
            source,
            postings: Vec::new(),
            issues: Vec::new(),
            pages_fetched: 0,
            cancelled: false,
        }
    }

    /// A source that could not run at all.
    pub fn failed(source: SourceId, message: impl Into<String>) -> Self {
        let mut report = Self::new(source);
        report
            .issues
            .push(HarvestIssue::source(source.as_str(), message));
        report
    }
}

/// Uniform contract every job board adapter implements.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn id(&self) -> SourceId;

    /// Site-local ID from a canonical detail URL.
    fn extract_id(&self, url: &str) -> Option<String>;

    /// Fetch and parse one one-based results page.
    async fn parse_page(&self, query: &str, page: u32) -> Result<PageOutcome, ScrapeError>;

    /// Walk pages `1..=pages` sequentially. Page failures are recorded and
    /// the walk continues; cancellation stops it between pages.
    async fn parse_all(&self, query: &str, pages: u32, cancel: &CancellationToken) -> SourceReport;
}

/// Tuning shared by every site adapter.
#[derive(Debug, Clone)]
pub struct AdapterOptions {
    /// Pause between consecutive listing pages of one source.
    pub page_delay: Duration,
    /// Readiness budget for rendered pages.
    pub render_timeout: Duration,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            page_delay: Duration::from_secs(1),
            render_timeout: Duration::from_secs(30),
        }
    }
}

/// Adapter driven entirely by a [`SiteProfile`].
pub struct SiteAdapter {
    profile: SiteProfile,
    fetcher: Arc<dyn PageFetcher>,
    renderer: Option<Arc<dyn Renderer>>,
    classifier: Arc<RelevanceClassifier>,
    options: AdapterOptions,
}

impl SiteAdapter {
    pub fn new(
        profile: SiteProfile,
        fetcher: Arc<dyn PageFetcher>,
        renderer: Option<Arc<dyn Renderer>>,
        classifier: Arc<RelevanceClassifier>,
        options: AdapterOptions,
    ) -> Self {
        Self {
            profile,
            fetcher,
            renderer,
            classifier,
            options,
        }
    }

    pub fn profile(&self) -> &SiteProfile {
        &self.profile
    }

    /// Open a tab when this board needs rendering and a renderer exists.
    /// A failed launch degrades to direct fetching.
    async fn open_session(&self, warnings: &mut Vec<String>) -> Option<Box<dyn RenderSession>> {
        if self.profile.mode != FetchMode::Rendered {
            return None;
        }
        let Some(renderer) = self.renderer.as_ref() else {
            warn!(
                "{}: no renderer available, fetching without script execution",
                self.profile.id
            );
            return None;
        };
        match renderer.open_session().await {
            Ok(session) => Some(session),
            Err(e) => {
                warn!("{}: renderer unavailable ({}), using plain HTTP", self.profile.id, e);
                warnings.push(format!("renderer unavailable, used plain HTTP: {}", e));
                None
            }
        }
    }

    /// Listing HTML, or `None` when rendering never became ready.
    async fn fetch_listing(
        &self,
        url: &str,
        session: &mut Option<Box<dyn RenderSession>>,
    ) -> Result<Option<String>, ScrapeError> {
        let Some(session) = session.as_mut() else {
            return self.fetcher.fetch(url).await.map(Some);
        };
        let readiness = self.profile.readiness();
        match session.render(url, &readiness, self.options.render_timeout).await {
            Ok(html) => Ok(Some(html)),
            Err(ScrapeError::RenderTimeout(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn parse_page_with(
        &self,
        query: &str,
        page: u32,
        session: &mut Option<Box<dyn RenderSession>>,
        cancel: &CancellationToken,
    ) -> Result<PageOutcome, ScrapeError> {
        let source = self.profile.id;
        let url = self.profile.search.build(query, page)?;
        debug!(
            "{} page {}: {}",
            source,
            page,
            urlencoding::decode(&url).unwrap_or(Cow::Borrowed(url.as_str()))
        );

        let mut outcome = PageOutcome::default();

        let Some(html) = self.fetch_listing(&url, session).await? else {
            warn!("{} page {}: listing never rendered, treating as empty", source, page);
            outcome.no_match = true;
            outcome.warnings.push(format!(
                "render readiness not reached within {:?}",
                self.options.render_timeout
            ));
            return Ok(outcome);
        };

        let listing = parse_listing(&self.profile, &html);
        let Some(ref candidate) = listing.candidate else {
            let role = self.profile.listing.role();
            warn!("{} page {}: no {} selector matched", source, page, role);
            outcome.no_match = true;
            outcome.warnings.push(format!("no {} selector matched", role));
            return Ok(outcome);
        };
        debug!(
            "{} page {}: {} cards via {:?} ({} without ID)",
            source,
            page,
            listing.postings.len(),
            candidate,
            listing.dropped_without_id
        );

        for mut posting in listing.postings {
            // Once cancelled, remaining cards keep their summary (still pending).
            if let (Some(detail), false) = (&self.profile.detail, cancel.is_cancelled()) {
                match self.fetcher.fetch(&posting.url).await {
                    Ok(html) => apply_detail(&self.profile, detail, &mut posting, &html),
                    Err(e) => {
                        warn!("{}: detail fetch failed for {}: {}", source, posting.url, e);
                        outcome
                            .warnings
                            .push(format!("detail {} kept as summary: {}", posting.url, e));
                        posting.mark_needs_enrichment();
                    }
                }
            }

            if posting.title.is_empty() {
                debug!("{}: dropping untitled card {}", source, posting.url);
                continue;
            }

            match self
                .classifier
                .verdict(&posting.title, posting.classification_text())
            {
                Verdict::Relevant { .. } => outcome.postings.push(posting),
                Verdict::NoInclusion => {
                    debug!("{}: not relevant: {}", source, posting.title);
                }
                Verdict::Excluded { matched } => {
                    debug!("{}: excluded by {:?}: {}", source, matched, posting.title);
                }
            }
        }

        Ok(outcome)
    }

    /// Sequential page loop. Returns how many pages failed outright.
    async fn walk_pages(
        &self,
        query: &str,
        pages: u32,
        cancel: &CancellationToken,
        session: &mut Option<Box<dyn RenderSession>>,
        report: &mut SourceReport,
    ) -> u32 {
        let source = self.profile.id;
        let mut failed = 0;

        for page in 1..=pages {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            match self.parse_page_with(query, page, session, cancel).await {
                Ok(outcome) => {
                    info!(
                        "{} page {}: {} relevant postings",
                        source,
                        page,
                        outcome.postings.len()
                    );
                    report.postings.extend(outcome.postings);
                    report.issues.extend(
                        outcome
                            .warnings
                            .into_iter()
                            .map(|w| HarvestIssue::page(source.as_str(), page, w)),
                    );
                }
                Err(e) => {
                    warn!("{} page {} failed: {}", source, page, e);
                    failed += 1;
                    report
                        .issues
                        .push(HarvestIssue::page(source.as_str(), page, e.to_string()));
                }
            }
            report.pages_fetched += 1;

            if page < pages {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        report.cancelled = true;
                        break;
                    }
                    _ = tokio::time::sleep(self.options.page_delay) => {}
                }
            }
        }

        failed
    }
}

#[async_trait]
impl SourceAdapter for SiteAdapter {
    fn id(&self) -> SourceId {
        self.profile.id
    }

    fn extract_id(&self, url: &str) -> Option<String> {
        self.profile.extract_id(url)
    }

    async fn parse_page(&self, query: &str, page: u32) -> Result<PageOutcome, ScrapeError> {
        let mut warnings = Vec::new();
        let mut session = self.open_session(&mut warnings).await;
        let result = self
            .parse_page_with(query, page, &mut session, &CancellationToken::new())
            .await;
        release(session).await;
        result.map(|mut outcome| {
            warnings.append(&mut outcome.warnings);
            outcome.warnings = warnings;
            outcome
        })
    }

    async fn parse_all(&self, query: &str, pages: u32, cancel: &CancellationToken) -> SourceReport {
        let source = self.profile.id;
        let mut report = SourceReport::new(source);

        let mut startup = Vec::new();
        let mut session = self.open_session(&mut startup).await;
        report.issues.extend(
            startup
                .into_iter()
                .map(|w| HarvestIssue::source(source.as_str(), w)),
        );

        // The tab is closed whether the walk finishes or panics.
        let walk = AssertUnwindSafe(self.walk_pages(query, pages, cancel, &mut session, &mut report))
            .catch_unwind()
            .await;
        release(session).await;

        match walk {
            Ok(failed) if failed > 0 && failed == report.pages_fetched => {
                report.issues.push(HarvestIssue::source(
                    source.as_str(),
                    format!("all {} pages failed", failed),
                ));
            }
            Ok(_) => {}
            Err(panic) => {
                let message = panic_message(&*panic);
                error!("{}: page walk panicked: {}", source, message);
                report.issues.push(HarvestIssue::source(
                    source.as_str(),
                    format!("source panicked: {}", message),
                ));
            }
        }
        report
    }
}


#[cfg(test)]
mod tests {
    use regex::Regex;
    use url::Url;

    use super::testing::*;
    use super::*;
    use crate::models::LifecycleStatus;
    use crate::scrapers::selector::{FieldChain, SelectorChain};

    fn profile(detail: bool, mode: FetchMode) -> SiteProfile {
        SiteProfile {
            id: SourceId::Hh,
            base_url: Url::parse("https://jobs.test").unwrap(),
            search: SearchUrl {
                endpoint: "https://jobs.test/search",
                query_param: "q",
                page_param: "page",
                zero_based: false,
                extra: &[],
            },
            id_pattern: Regex::new(r"/vacancy/(\d+)").unwrap(),
            listing: SelectorChain::new("listing", &[".card"]).unwrap(),
            card: CardFields {
                link: FieldChain::attr("link", "href", &["a"]).unwrap(),
                title: FieldChain::text("title", &["h3"]).unwrap(),
                company: Some(FieldChain::text("company", &[".company"]).unwrap()),
                location: None,
                salary: None,
                salary_from_text: true,
                description: None,
                published: None,
                logo: None,
            },
            detail: detail.then(|| DetailFields {
                description: Some(FieldChain::text("description", &[".description"]).unwrap()),
                ..Default::default()
            }),
            mode,
        }
    }

    const PAGE: &str = r#"
        <div class="card"><h3>UI designer</h3><span class="company">Acme</span>
            <a href="/vacancy/1?from=serp">open</a> 200 000 ₽</div>
        <div class="card"><h3>Furniture designer</h3><a href="/vacancy/2">open</a></div>
        <div class="card"><h3>UI designer</h3><a href="/vacancy/1">again</a></div>
        <div class="card"><h3>Designer without link</h3></div>
    "#;

    fn adapter(fetcher: FixtureFetcher, detail: bool) -> SiteAdapter {
        SiteAdapter::new(
            profile(detail, FetchMode::Direct),
            Arc::new(fetcher),
            None,
            classifier(&["design"], &["furniture"]),
            fast_options(),
        )
    }

    #[tokio::test]
    async fn test_parse_page_filters_and_dedups() {
        let adapter = adapter(FixtureFetcher::new().page("page=1", PAGE), false);
        let outcome = adapter.parse_page("designer", 1).await.unwrap();

        assert_eq!(outcome.postings.len(), 1);
        let posting = &outcome.postings[0];
        assert_eq!(posting.title, "UI designer");
        assert_eq!(posting.external_id, "1");
        assert_eq!(posting.url, "https://jobs.test/vacancy/1");
        assert_eq!(posting.company, "Acme");
        assert_eq!(posting.salary, "200 000 ₽");
        assert_eq!(posting.status, LifecycleStatus::Pending);
        assert!(posting.needs_formatting);
    }

    #[tokio::test]
    async fn test_no_match_is_empty_not_error() {
        let adapter = adapter(FixtureFetcher::new().page("page=1", "<p>nothing</p>"), false);
        let outcome = adapter.parse_page("designer", 1).await.unwrap();
        assert!(outcome.no_match);
        assert!(outcome.postings.is_empty());
    }

    #[tokio::test]
    async fn test_detail_failure_keeps_summary() {
        let adapter = adapter(FixtureFetcher::new().page("search", PAGE), true);
        let outcome = adapter.parse_page("designer", 1).await.unwrap();

        assert_eq!(outcome.postings.len(), 1);
        assert!(outcome.postings[0].needs_formatting);
        assert_eq!(outcome.postings[0].status, LifecycleStatus::NeedsEnrichment);
        assert_eq!(outcome.warnings.len(), 2);
    }

    #[tokio::test]
    async fn test_detail_success_completes_posting() {
        let fetcher = FixtureFetcher::new()
            .page("search", PAGE)
            .page("/vacancy/1", r#"<div class="description">Figma, research</div>"#)
            .page("/vacancy/2", r#"<div class="description">Chairs</div>"#);
        let outcome = adapter(fetcher, true).parse_page("designer", 1).await.unwrap();

        let posting = &outcome.postings[0];
        assert_eq!(posting.status, LifecycleStatus::Complete);
        assert!(!posting.needs_formatting);
        assert_eq!(posting.full_description, "Figma, research");
        assert_eq!(posting.description, "Figma, research");
    }

    #[tokio::test]
    async fn test_page_failure_is_isolated() {
        let fetcher = FixtureFetcher::new()
            .page("page=1", PAGE)
            .failing("page=2", 500)
            .page("page=3", r#"<div class="card"><h3>Web designer</h3><a href="/vacancy/9">x</a></div>"#);
        let report = adapter(fetcher, false)
            .parse_all("designer", 3, &CancellationToken::new())
            .await;

        let ids: Vec<_> = report.postings.iter().map(|p| p.external_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "9"]);
        assert_eq!(report.pages_fetched, 3);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].page, Some(2));
        assert!(!report.cancelled);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_fetches_nothing() {
        let fetcher = Arc::new(FixtureFetcher::new().page("search", PAGE));
        let adapter = SiteAdapter::new(
            profile(false, FetchMode::Direct),
            fetcher.clone(),
            None,
            classifier(&["design"], &[]),
            fast_options(),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = adapter.parse_all("designer", 3, &cancel).await;
        assert!(report.cancelled);
        assert!(report.postings.is_empty());
        assert_eq!(fetcher.request_count(), 0);
    }

    #[tokio::test]
    async fn test_rendered_source_uses_one_session() {
        let renderer = Arc::new(FixtureRenderer {
            pages: [("page=1".to_string(), PAGE.to_string())].into_iter().collect(),
            ..Default::default()
        });
        let adapter = SiteAdapter::new(
            profile(false, FetchMode::Rendered),
            Arc::new(FixtureFetcher::new()),
            Some(renderer.clone() as Arc<dyn Renderer>),
            classifier(&["design"], &["furniture"]),
            fast_options(),
        );

        let report = adapter
            .parse_all("designer", 2, &CancellationToken::new())
            .await;

        // Page 2 never becomes ready: recorded, treated as empty.
        assert_eq!(report.postings.len(), 1);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].page, Some(2));
        assert_eq!(*renderer.opened.lock().unwrap(), 1);
        assert_eq!(*renderer.closed.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_panicking_render_still_closes_session() {
        let renderer = Arc::new(FixtureRenderer {
            crash: true,
            ..Default::default()
        });
        let adapter = SiteAdapter::new(
            profile(false, FetchMode::Rendered),
            Arc::new(FixtureFetcher::new()),
            Some(renderer.clone() as Arc<dyn Renderer>),
            classifier(&["design"], &[]),
            fast_options(),
        );

        let report = adapter
            .parse_all("designer", 2, &CancellationToken::new())
            .await;

        assert_eq!(*renderer.opened.lock().unwrap(), 1);
        assert_eq!(*renderer.closed.lock().unwrap(), 1);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].page, None);
        assert!(report.issues[0].message.contains("renderer lost its tab"));
    }

    #[tokio::test]
    async fn test_unreachable_source_gets_summary_issue() {
        let fetcher = FixtureFetcher::new().failing("search", 503);
        let report = adapter(fetcher, false)
            .parse_all("designer", 2, &CancellationToken::new())
            .await;

        assert!(report.postings.is_empty());
        assert_eq!(report.pages_fetched, 2);
        let located: Vec<_> = report.issues.iter().map(|i| i.page).collect();
        assert_eq!(located, vec![Some(1), Some(2), None]);
        assert!(report.issues[2].message.contains("all 2 pages failed"));
    }

    #[tokio::test]
    async fn test_rendered_source_without_renderer_fetches_directly() {
        let adapter = SiteAdapter::new(
            profile(false, FetchMode::Rendered),
            Arc::new(FixtureFetcher::new().page("page=1", PAGE)),
            None,
            classifier(&["design"], &["furniture"]),
            fast_options(),
        );
        let outcome = adapter.parse_page("designer", 1).await.unwrap();
        assert_eq!(outcome.postings.len(), 1);
    }

    #[test]
    fn test_extract_id() {
        let adapter = adapter(FixtureFetcher::new(), false);
        assert_eq!(adapter.extract_id("https://jobs.test/vacancy/77"), Some("77".into()));
        assert_eq!(adapter.extract_id("https://jobs.test/about"), None);
    }
}
