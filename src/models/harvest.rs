//! Harvest request and result models.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Posting, SourceId};

/// Defaults applied to a request before it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDefaults {
    /// Query used when the request has none (the target occupation term).
    pub query: String,
    /// Page budget used when the request asks for zero pages.
    pub pages: u32,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            query: "дизайнер".to_string(),
            pages: 2,
        }
    }
}

/// Parameters of one harvest run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestRequest {
    #[serde(default)]
    pub query: String,
    /// Requested source identifiers, as given by the caller. Unknown
    /// identifiers are reported, not rejected.
    #[serde(default)]
    pub sources: Vec<String>,
    /// Pages per source.
    #[serde(default)]
    pub pages: u32,
}

impl HarvestRequest {
    pub fn new(query: impl Into<String>, sources: Vec<String>, pages: u32) -> Self {
        Self {
            query: query.into(),
            sources,
            pages,
        }
    }

    /// Fill in empty fields: blank query, zero pages, no sources (= all known).
    pub fn with_defaults(mut self, defaults: &RequestDefaults) -> Self {
        if self.query.trim().is_empty() {
            self.query = defaults.query.clone();
        } else {
            self.query = self.query.trim().to_string();
        }
        if self.pages == 0 {
            self.pages = defaults.pages.max(1);
        }
        if self.sources.is_empty() {
            self.sources = SourceId::ALL.iter().map(|s| s.as_str().to_string()).collect();
        }
        self
    }
}

/// One recorded failure. `source` and `page` are absent for request-level
/// entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestIssue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    pub message: String,
}

impl HarvestIssue {
    pub fn request(message: impl Into<String>) -> Self {
        Self {
            source: None,
            page: None,
            message: message.into(),
        }
    }

    pub fn source(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            page: None,
            message: message.into(),
        }
    }

    pub fn page(source: impl Into<String>, page: u32, message: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            page: Some(page),
            message: message.into(),
        }
    }
}

impl fmt::Display for HarvestIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.source, self.page) {
            (Some(source), Some(page)) => write!(f, "{} page {}: {}", source, page, self.message),
            (Some(source), None) => write!(f, "{}: {}", source, self.message),
            _ => f.write_str(&self.message),
        }
    }
}

/// Aggregate outcome of a harvest.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HarvestResult {
    /// Resolved request, after defaults.
    pub query: String,
    pub pages: u32,
    /// Sources resolved from the request, in iteration order.
    pub sources: Vec<SourceId>,
    /// De-duplicated postings in source-iteration order.
    pub postings: Vec<Posting>,
    pub per_source_counts: BTreeMap<SourceId, usize>,
    pub errors: Vec<HarvestIssue>,
    pub saved: usize,
    pub store_failures: usize,
    /// Set when the run was cancelled before every page was fetched.
    pub cancelled: bool,
}

impl HarvestResult {
    pub fn total_found(&self) -> usize {
        self.postings.len()
    }
}
