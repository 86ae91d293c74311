//! Adaptive per-domain rate limiter.
//!
//! Listing and detail fetches of one board share a host, so pacing is keyed
//! by host. 429/503 (and a streak of 403s) back off; a run of successes eases
//! the delay back to the base.

mod config;
mod domain_state;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

pub use config::RateLimitConfig;
use domain_state::{DomainState, Outcome, Transition};

/// Adaptive rate limiter. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct RateLimiter {
    config: RateLimitConfig,
    domains: Arc<RwLock<HashMap<String, DomainState>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RateLimitConfig) -> Self {
        Self {
            config,
            domains: Arc::default(),
        }
    }

    pub fn extract_domain(url: &str) -> Option<String> {
        Url::parse(url).ok()?.host_str().map(str::to_string)
    }

    /// Wait for this domain's next slot. Returns the domain to report the
    /// response status against, or `None` for URLs without a host.
    pub async fn acquire(&self, url: &str) -> Option<String> {
        let domain = Self::extract_domain(url)?;

        let wait = self
            .domains
            .write()
            .await
            .entry(domain.clone())
            .or_insert_with(|| DomainState::new(self.config.base_delay))
            .reserve(Instant::now());

        if !wait.is_zero() {
            debug!("{}: pacing request by {:?}", domain, wait);
            tokio::time::sleep(wait).await;
        }
        Some(domain)
    }

    /// Feed a response status back into the domain's delay.
    pub async fn report_status(&self, domain: &str, status: u16) {
        let mut domains = self.domains.write().await;
        let Some(state) = domains.get_mut(domain) else {
            return;
        };

        match state.apply(Outcome::from_status(status), &self.config) {
            Transition::BackedOff => warn!(
                "{} answered {}, backing off to {:?} ({} throttled of {} requests)",
                domain, status, state.current_delay, state.rate_limit_hits, state.total_requests
            ),
            Transition::SlowedDown => debug!(
                "{} answered {}, delay now {:?}",
                domain, status, state.current_delay
            ),
            Transition::Eased => debug!("{} delay eased to {:?}", domain, state.current_delay),
            Transition::Recovered => info!("{} recovered from backoff", domain),
            Transition::Unchanged => {}
        }
    }
}
