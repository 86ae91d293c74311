//! Declarative description of one job board.

use regex::Regex;
use url::Url;

use crate::models::SourceId;
use crate::scrapers::browser::Readiness;
use crate::scrapers::error::ScrapeError;
use crate::scrapers::selector::{FieldChain, SelectorChain};

/// How listing pages are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    Direct,
    /// Listings are built by client-side scripts.
    Rendered,
}

/// Paginated search URL template.
#[derive(Debug, Clone)]
pub struct SearchUrl {
    pub endpoint: &'static str,
    pub query_param: &'static str,
    pub page_param: &'static str,
    /// Boards counting pages from zero get `page - 1`.
    pub zero_based: bool,
    pub extra: &'static [(&'static str, &'static str)],
}

impl SearchUrl {
    /// Build the URL for a one-based `page`.
    pub fn build(&self, query: &str, page: u32) -> Result<String, ScrapeError> {
        let mut url = Url::parse(self.endpoint)
            .map_err(|e| ScrapeError::Other(format!("bad endpoint {}: {}", self.endpoint, e)))?;
        let page = if self.zero_based {
            page.saturating_sub(1)
        } else {
            page
        };
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair(self.query_param, query);
            for (key, value) in self.extra {
                pairs.append_pair(key, value);
            }
            pairs.append_pair(self.page_param, &page.to_string());
        }
        Ok(url.into())
    }
}

/// Summary fields read from each listing card.
#[derive(Debug, Clone)]
pub struct CardFields {
    pub link: FieldChain,
    pub title: FieldChain,
    pub company: Option<FieldChain>,
    pub location: Option<FieldChain>,
    pub salary: Option<FieldChain>,
    /// Scan the card text for an amount with a currency when `salary` finds
    /// nothing.
    pub salary_from_text: bool,
    pub description: Option<FieldChain>,
    /// Boards without a date chain leave `published_at` unset.
    pub published: Option<FieldChain>,
    pub logo: Option<FieldChain>,
}

/// Fields read from a vacancy's own page. Non-empty values override the
/// card's.
#[derive(Debug, Clone, Default)]
pub struct DetailFields {
    pub title: Option<FieldChain>,
    pub company: Option<FieldChain>,
    pub location: Option<FieldChain>,
    pub salary: Option<FieldChain>,
    pub description: Option<FieldChain>,
    pub requirements: Option<FieldChain>,
    pub tasks: Option<FieldChain>,
    pub conditions: Option<FieldChain>,
    pub benefits: Option<FieldChain>,
    pub employment_type: Option<FieldChain>,
    pub experience_level: Option<FieldChain>,
    pub remote_type: Option<FieldChain>,
    pub company_logo: Option<FieldChain>,
    pub company_url: Option<FieldChain>,
}

/// Everything a [`SiteAdapter`](super::SiteAdapter) needs to know about one
/// board.
#[derive(Debug, Clone)]
pub struct SiteProfile {
    pub id: SourceId,
    /// Base for resolving relative links.
    pub base_url: Url,
    pub search: SearchUrl,
    /// First capture group is the external ID.
    pub id_pattern: Regex,
    pub listing: SelectorChain,
    pub card: CardFields,
    /// `None` for summary-only boards.
    pub detail: Option<DetailFields>,
    pub mode: FetchMode,
}

impl SiteProfile {
    pub fn extract_id(&self, url: &str) -> Option<String> {
        self.id_pattern
            .captures(url)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .filter(|id| !id.is_empty())
    }

    /// Resolve a possibly relative link and drop query and fragment.
    pub fn canonical_url(&self, href: &str) -> Option<String> {
        let mut url = self.base_url.join(href.trim()).ok()?;
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }
        url.set_query(None);
        url.set_fragment(None);
        Some(url.into())
    }

    /// Resolve an asset link (logos) without touching its query.
    pub fn absolute_url(&self, href: &str) -> Option<String> {
        self.base_url.join(href.trim()).ok().map(Into::into)
    }

    /// Rendering waits for any listing candidate to show up.
    pub fn readiness(&self) -> Readiness {
        Readiness::any_of(self.listing.candidates())
    }
}
