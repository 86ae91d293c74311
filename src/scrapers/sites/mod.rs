//! The five supported job boards and the registry that holds their adapters.

mod geekjob;
mod getmatch;
mod habr;
mod hh;
mod hirehi;

use std::sync::Arc;
use std::time::Duration;

use super::adapter::{AdapterOptions, FetchMode, SiteAdapter, SiteProfile, SourceAdapter};
use super::browser::Renderer;
use super::error::ScrapeError;
use super::http_client::HttpClient;
use super::rate_limiter::RateLimiter;
use super::relevance::RelevanceClassifier;
use crate::models::SourceId;

/// Profile for one known source.
pub fn profile(id: SourceId) -> Result<SiteProfile, ScrapeError> {
    match id {
        SourceId::Geekjob => geekjob::profile(),
        SourceId::Hh => hh::profile(),
        SourceId::Habr => habr::profile(),
        SourceId::GetMatch => getmatch::profile(),
        SourceId::HireHi => hirehi::profile(),
    }
}

/// Row for `jobharvest sources` and `GET /api/sources`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SourceInfo {
    pub id: SourceId,
    pub name: &'static str,
    pub base_url: String,
    pub requires_rendering: bool,
    pub detail_pages: bool,
}

/// Describe every known source, in default harvest order.
pub fn describe() -> Result<Vec<SourceInfo>, ScrapeError> {
    SourceId::ALL
        .iter()
        .map(|&id| {
            let profile = profile(id)?;
            Ok(SourceInfo {
                id,
                name: id.display_name(),
                base_url: profile.base_url.to_string(),
                requires_rendering: profile.mode == FetchMode::Rendered,
                detail_pages: profile.detail.is_some(),
            })
        })
        .collect()
}

/// Settings needed to build the standard adapters.
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    pub request_timeout: Duration,
    pub adapter: AdapterOptions,
    pub user_agent: Option<String>,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            adapter: AdapterOptions::default(),
            user_agent: None,
        }
    }
}

/// Known adapters in default harvest order.
#[derive(Default)]
pub struct SourceRegistry {
    adapters: Vec<Arc<dyn SourceAdapter>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter, replacing any earlier one for the same source.
    pub fn register(&mut self, adapter: Arc<dyn SourceAdapter>) {
        let id = adapter.id();
        match self.adapters.iter().position(|a| a.id() == id) {
            Some(idx) => self.adapters[idx] = adapter,
            None => self.adapters.push(adapter),
        }
    }

    /// Build the five standard adapters. All share one rate limiter and, for
    /// render-dependent boards, one renderer.
    pub fn standard(
        classifier: Arc<RelevanceClassifier>,
        renderer: Option<Arc<dyn Renderer>>,
        options: &RegistryOptions,
    ) -> Result<Self, ScrapeError> {
        let rate_limiter = RateLimiter::new();
        let mut registry = Self::new();

        for id in SourceId::ALL {
            let client = HttpClient::with_rate_limiter(
                id.as_str(),
                options.request_timeout,
                rate_limiter.clone(),
                options.user_agent.as_deref(),
            )?;
            let adapter = SiteAdapter::new(
                profile(id)?,
                Arc::new(client),
                renderer.clone(),
                classifier.clone(),
                options.adapter.clone(),
            );
            registry.register(Arc::new(adapter));
        }

        Ok(registry)
    }

    pub fn get(&self, id: SourceId) -> Option<Arc<dyn SourceAdapter>> {
        self.adapters.iter().find(|a| a.id() == id).cloned()
    }

    pub fn ids(&self) -> Vec<SourceId> {
        self.adapters.iter().map(|a| a.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
