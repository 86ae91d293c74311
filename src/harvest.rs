//! Multi-source harvest orchestration.
//!
//! Sources run as independent tasks bounded by a semaphore; pages within one
//! source stay sequential inside the adapter. Results are merged in source
//! iteration order, so de-duplication keeps the first occurrence regardless of
//! which task finished first.

use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::models::{HarvestIssue, HarvestRequest, HarvestResult, RequestDefaults, SourceId};
use crate::scrapers::{panic_message, SourceAdapter, SourceReport, SourceRegistry};
use crate::storage::PostingStore;

/// Default number of sources harvested at once.
pub const DEFAULT_MAX_CONCURRENT: usize = 3;

/// Failures that abort a whole harvest.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("no known sources in request")]
    EmptySourceSet,
    #[error("harvester misconfigured: {0}")]
    Config(String),
}

/// Sources resolved from a request, plus entries for the names that were not.
pub struct Resolution {
    pub adapters: Vec<Arc<dyn SourceAdapter>>,
    pub issues: Vec<HarvestIssue>,
}

/// Runs harvests against a registry and hands results to a store.
pub struct Harvester {
    registry: Arc<SourceRegistry>,
    store: Arc<dyn PostingStore>,
    max_concurrent: usize,
    defaults: RequestDefaults,
}

impl Harvester {
    pub fn new(registry: Arc<SourceRegistry>, store: Arc<dyn PostingStore>) -> Self {
        Self {
            registry,
            store,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            defaults: RequestDefaults::default(),
        }
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn with_defaults(mut self, defaults: RequestDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn defaults(&self) -> &RequestDefaults {
        &self.defaults
    }

    /// Map requested names onto registered adapters. Repeats are ignored;
    /// unknown names become request-level issues.
    pub fn resolve(&self, names: &[String]) -> Resolution {
        let mut seen = HashSet::new();
        let mut resolution = Resolution {
            adapters: Vec::new(),
            issues: Vec::new(),
        };

        for name in names {
            match SourceId::parse(name).and_then(|id| self.registry.get(id)) {
                Some(adapter) => {
                    if seen.insert(adapter.id()) {
                        resolution.adapters.push(adapter);
                    }
                }
                None => {
                    warn!("unknown source requested: {:?}", name);
                    resolution
                        .issues
                        .push(HarvestIssue::request(format!("unknown source: {}", name.trim())));
                }
            }
        }
        resolution
    }

    /// Run one harvest.
    ///
    /// Only an empty resolved source set fails the call. Everything else, from
    /// an unreachable board to a rejected store write, ends up in
    /// [`HarvestResult::errors`].
    pub async fn harvest(
        &self,
        request: HarvestRequest,
        cancel: &CancellationToken,
    ) -> Result<HarvestResult, HarvestError> {
        if self.registry.is_empty() {
            return Err(HarvestError::Config("no sources registered".to_string()));
        }

        let request = request.with_defaults(&self.defaults);
        let Resolution { adapters, issues } = self.resolve(&request.sources);
        if adapters.is_empty() {
            return Err(HarvestError::EmptySourceSet);
        }

        info!(
            "harvesting {:?} from {} sources, {} pages each",
            request.query,
            adapters.len(),
            request.pages
        );

        let mut result = HarvestResult {
            query: request.query.clone(),
            pages: request.pages,
            sources: adapters.iter().map(|a| a.id()).collect(),
            errors: issues,
            ..Default::default()
        };

        let reports = self.run_sources(&adapters, &request, cancel).await;

        let mut seen = HashSet::new();
        for report in reports {
            info!(
                "{}: {} postings from {} pages, {} issues",
                report.source,
                report.postings.len(),
                report.pages_fetched,
                report.issues.len()
            );
            result.cancelled |= report.cancelled;
            result.errors.extend(report.issues);
            result.per_source_counts.entry(report.source).or_insert(0);

            for posting in report.postings {
                if seen.insert((posting.source, posting.external_id.clone())) {
                    result.postings.push(posting);
                }
            }
        }

        for posting in &result.postings {
            *result.per_source_counts.entry(posting.source).or_insert(0) += 1;
        }

        for posting in &result.postings {
            match self.store.save(posting).await {
                Ok(()) => result.saved += 1,
                Err(e) => {
                    warn!("{}: failed to store {}: {}", posting.source, posting.external_id, e);
                    result.store_failures += 1;
                    result.errors.push(HarvestIssue::source(
                        posting.source.as_str(),
                        format!("store failed for {}: {}", posting.external_id, e),
                    ));
                }
            }
        }

        result.cancelled |= cancel.is_cancelled();
        info!(
            "harvest done: {} found, {} saved, {} errors{}",
            result.total_found(),
            result.saved,
            result.errors.len(),
            if result.cancelled { " (cancelled)" } else { "" }
        );
        Ok(result)
    }

    /// One task per source; reports come back in `adapters` order.
    async fn run_sources(
        &self,
        adapters: &[Arc<dyn SourceAdapter>],
        request: &HarvestRequest,
        cancel: &CancellationToken,
    ) -> Vec<SourceReport> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();

        for (index, adapter) in adapters.iter().cloned().enumerate() {
            let semaphore = semaphore.clone();
            let cancel = cancel.clone();
            let query = request.query.clone();
            let pages = request.pages;

            tasks.spawn(async move {
                let source = adapter.id();
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (index, SourceReport::failed(source, "scheduler closed"));
                };
                if cancel.is_cancelled() {
                    let mut report = SourceReport::new(source);
                    report.cancelled = true;
                    return (index, report);
                }

                let run = AssertUnwindSafe(adapter.parse_all(&query, pages, &cancel))
                    .catch_unwind()
                    .await;
                let report = match run {
                    Ok(report) => report,
                    Err(panic) => {
                        let message = panic_message(&*panic);
                        error!("{}: source task panicked: {}", source, message);
                        SourceReport::failed(source, format!("source panicked: {}", message))
                    }
                };
                (index, report)
            });
        }

        let mut slots: Vec<Option<SourceReport>> = adapters.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, report)) => slots[index] = Some(report),
                Err(e) => error!("source task did not complete: {}", e),
            }
        }

        slots
            .into_iter()
            .zip(adapters)
            .map(|(slot, adapter)| {
                slot.unwrap_or_else(|| SourceReport::failed(adapter.id(), "source task aborted"))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Posting;
    use crate::scrapers::{PageOutcome, ScrapeError};
    use crate::storage::{MemoryPostingStore, StoreError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Clone, Copy)]
    enum Behavior {
        Normal,
        Panic,
        Unreachable,
        Slow,
    }

    struct FakeAdapter {
        id: SourceId,
        ids: Vec<&'static str>,
        behavior: Behavior,
        calls: Arc<AtomicUsize>,
    }

    impl FakeAdapter {
        fn new(id: SourceId, ids: &[&'static str]) -> Self {
            Self {
                id,
                ids: ids.to_vec(),
                behavior: Behavior::Normal,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn behaving(mut self, behavior: Behavior) -> Self {
            self.behavior = behavior;
            self
        }

        fn posting(&self, external_id: &str, title: &str) -> Posting {
            let mut p = Posting::new(
                self.id,
                external_id.to_string(),
                format!("https://{}.example/{}", self.id, external_id),
            );
            p.title = title.to_string();
            p
        }
    }

    #[async_trait]
    impl SourceAdapter for FakeAdapter {
        fn id(&self) -> SourceId {
            self.id
        }

        fn extract_id(&self, url: &str) -> Option<String> {
            url.rsplit('/').next().map(str::to_string)
        }

        async fn parse_page(&self, _query: &str, _page: u32) -> Result<PageOutcome, ScrapeError> {
            Ok(PageOutcome::default())
        }

        async fn parse_all(&self, query: &str, pages: u32, cancel: &CancellationToken) -> SourceReport {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut report = SourceReport::new(self.id);
            match self.behavior {
                Behavior::Panic => panic!("selector engine exploded"),
                Behavior::Unreachable => {
                    for page in 1..=pages {
                        report.issues.push(HarvestIssue::page(
                            self.id.as_str(),
                            page,
                            "request failed: connection refused",
                        ));
                        report.pages_fetched += 1;
                    }
                }
                Behavior::Slow => {
                    tokio::select! {
                        _ = cancel.cancelled() => report.cancelled = true,
                        _ = tokio::time::sleep(Duration::from_secs(30)) => {}
                    }
                }
                Behavior::Normal => {
                    for (i, id) in self.ids.iter().enumerate() {
                        report.postings.push(self.posting(id, &format!("{} #{}", query, i)));
                    }
                    report.pages_fetched = pages;
                }
            }
            report
        }
    }

    /// Store that rejects the listed external IDs.
    struct PickyStore {
        reject: Vec<&'static str>,
        saved: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PostingStore for PickyStore {
        async fn save(&self, posting: &Posting) -> Result<(), StoreError> {
            if self.reject.contains(&posting.external_id.as_str()) {
                return Err(StoreError::Rejected {
                    status: 500,
                    body: "db down".to_string(),
                });
            }
            self.saved.lock().unwrap().push(posting.external_id.clone());
            Ok(())
        }
    }

    fn harvester(adapters: Vec<FakeAdapter>) -> (Harvester, MemoryPostingStore) {
        let mut registry = SourceRegistry::new();
        for adapter in adapters {
            registry.register(Arc::new(adapter));
        }
        let store = MemoryPostingStore::new();
        let harvester = Harvester::new(Arc::new(registry), Arc::new(store.clone()));
        (harvester, store)
    }

    fn request(sources: &[&str]) -> HarvestRequest {
        HarvestRequest::new(
            "designer",
            sources.iter().map(|s| s.to_string()).collect(),
            1,
        )
    }

    #[tokio::test]
    async fn test_unknown_source_alongside_two_valid() {
        let (harvester, store) = harvester(vec![
            FakeAdapter::new(SourceId::Hh, &["1", "2"]),
            FakeAdapter::new(SourceId::Habr, &["7"]),
        ]);

        let result = harvester
            .harvest(request(&["hh", "linkedin", "habr"]), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.sources, vec![SourceId::Hh, SourceId::Habr]);
        assert_eq!(result.total_found(), 3);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].source, None);
        assert!(result.errors[0].message.contains("linkedin"));
        assert_eq!(result.saved, 3);
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn test_dedup_keeps_first_in_source_order() {
        let (harvester, _) = harvester(vec![
            FakeAdapter::new(SourceId::Hh, &["1", "2", "1"]),
            FakeAdapter::new(SourceId::Habr, &["1"]),
        ]);

        let result = harvester
            .harvest(request(&["hh", "habr"]), &CancellationToken::new())
            .await
            .unwrap();

        let keys: Vec<_> = result
            .postings
            .iter()
            .map(|p| (p.source, p.external_id.as_str(), p.title.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                (SourceId::Hh, "1", "designer #0"),
                (SourceId::Hh, "2", "designer #1"),
                (SourceId::Habr, "1", "designer #0"),
            ]
        );
        assert_eq!(result.per_source_counts[&SourceId::Hh], 2);
        assert_eq!(result.per_source_counts[&SourceId::Habr], 1);
    }

    #[tokio::test]
    async fn test_repeated_source_names_run_once() {
        let adapter = FakeAdapter::new(SourceId::Hh, &["1"]);
        let calls = adapter.calls.clone();
        let (harvester, _) = harvester(vec![adapter]);

        let result = harvester
            .harvest(request(&["hh", " HH "]), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.sources, vec![SourceId::Hh]);
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn test_failing_sources_do_not_stop_others() {
        let (harvester, _) = harvester(vec![
            FakeAdapter::new(SourceId::Geekjob, &[]).behaving(Behavior::Panic),
            FakeAdapter::new(SourceId::Hh, &["5"]),
            FakeAdapter::new(SourceId::Habr, &[]).behaving(Behavior::Unreachable),
        ]);

        let mut req = request(&["geekjob", "hh", "habr"]);
        req.pages = 2;
        let result = harvester.harvest(req, &CancellationToken::new()).await.unwrap();

        assert_eq!(result.total_found(), 1);
        assert_eq!(result.per_source_counts[&SourceId::Geekjob], 0);
        assert_eq!(result.per_source_counts[&SourceId::Habr], 0);

        let panicked: Vec<_> = result
            .errors
            .iter()
            .filter(|e| e.source.as_deref() == Some("geekjob"))
            .collect();
        assert_eq!(panicked.len(), 1);
        assert!(panicked[0].message.contains("selector engine exploded"));

        let habr_pages: Vec<_> = result
            .errors
            .iter()
            .filter(|e| e.source.as_deref() == Some("habr"))
            .filter_map(|e| e.page)
            .collect();
        assert_eq!(habr_pages, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_store_failures_are_counted_not_fatal() {
        let mut registry = SourceRegistry::new();
        registry.register(Arc::new(FakeAdapter::new(SourceId::Hh, &["1", "2", "3"])));
        let store = Arc::new(PickyStore {
            reject: vec!["2"],
            saved: Mutex::new(Vec::new()),
        });
        let harvester = Harvester::new(Arc::new(registry), store.clone());

        let result = harvester
            .harvest(request(&["hh"]), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.saved, 2);
        assert_eq!(result.store_failures, 1);
        assert_eq!(*store.saved.lock().unwrap(), vec!["1".to_string(), "3".to_string()]);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.contains("store failed for 2"));
    }

    #[tokio::test]
    async fn test_cancelled_before_start_fetches_nothing() {
        let adapter = FakeAdapter::new(SourceId::Hh, &["1"]);
        let calls = adapter.calls.clone();
        let (harvester, store) = harvester(vec![adapter]);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = harvester.harvest(request(&["hh"]), &cancel).await.unwrap();

        assert!(result.cancelled);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(result.postings.is_empty());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_cancel_mid_run_keeps_partial_results() {
        let (harvester, _) = harvester(vec![
            FakeAdapter::new(SourceId::Hh, &["1"]),
            FakeAdapter::new(SourceId::Habr, &[]).behaving(Behavior::Slow),
        ]);

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let result = harvester.harvest(request(&["hh", "habr"]), &cancel).await.unwrap();
        assert!(result.cancelled);
        assert_eq!(result.total_found(), 1);
        assert_eq!(result.saved, 1);
    }

    #[tokio::test]
    async fn test_only_unknown_sources_is_an_error() {
        let (harvester, _) = harvester(vec![FakeAdapter::new(SourceId::Hh, &["1"])]);
        let err = harvester
            .harvest(request(&["linkedin", "indeed"]), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, HarvestError::EmptySourceSet));
    }

    #[tokio::test]
    async fn test_empty_request_uses_defaults() {
        let (harvester, _) = harvester(vec![FakeAdapter::new(SourceId::Hh, &["1"])]);
        let harvester = harvester.with_defaults(RequestDefaults {
            query: "ux".to_string(),
            pages: 3,
        });

        let result = harvester
            .harvest(HarvestRequest::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.query, "ux");
        assert_eq!(result.pages, 3);
        // Every known name is requested; only hh is registered, the rest are reported.
        assert_eq!(result.sources, vec![SourceId::Hh]);
        assert_eq!(result.errors.len(), SourceId::ALL.len() - 1);
    }

    #[tokio::test]
    async fn test_empty_registry_is_misconfiguration() {
        let harvester = Harvester::new(
            Arc::new(SourceRegistry::new()),
            Arc::new(MemoryPostingStore::new()),
        );
        let err = harvester
            .harvest(request(&["hh"]), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, HarvestError::Config(_)));
    }
}
