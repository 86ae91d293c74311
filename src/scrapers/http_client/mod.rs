//! HTTP client used for direct page fetches.

mod response;
mod user_agent;

pub use response::HttpResponse;
pub use user_agent::{resolve_user_agent, ACCEPT, ACCEPT_LANGUAGE, BROWSER_USER_AGENTS};

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use tracing::debug;

use super::error::ScrapeError;
use super::rate_limiter::RateLimiter;

/// Something that turns a URL into page HTML.
///
/// Adapters only depend on this, so tests substitute canned fixtures.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError>;
}

/// reqwest client with browser-like headers and adaptive per-domain pacing.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    source_id: String,
    timeout: Duration,
    rate_limiter: RateLimiter,
}

impl HttpClient {
    pub fn new(source_id: &str, timeout: Duration) -> Result<Self, ScrapeError> {
        Self::with_rate_limiter(source_id, timeout, RateLimiter::new(), None)
    }

    /// Build a client sharing `rate_limiter` with other clients.
    /// `user_agent` of `None` picks a desktop browser user agent.
    pub fn with_rate_limiter(
        source_id: &str,
        timeout: Duration,
        rate_limiter: RateLimiter,
        user_agent: Option<&str>,
    ) -> Result<Self, ScrapeError> {
        let mut headers = HeaderMap::new();
        headers.insert(reqwest::header::ACCEPT, HeaderValue::from_static(ACCEPT));
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            HeaderValue::from_static(ACCEPT_LANGUAGE),
        );

        let client = Client::builder()
            .user_agent(resolve_user_agent(user_agent))
            .default_headers(headers)
            .timeout(timeout)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(ScrapeError::Transport)?;

        Ok(Self {
            client,
            source_id: source_id.to_string(),
            timeout,
            rate_limiter,
        })
    }

    /// GET a URL, waiting on the rate limiter first and reporting the status
    /// back to it afterwards.
    pub async fn get(&self, url: &str) -> Result<HttpResponse, ScrapeError> {
        let domain = self.rate_limiter.acquire(url).await;

        let start = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;
        let status = response.status();

        debug!(
            source = %self.source_id,
            "GET {} -> {} in {:?}",
            url,
            status.as_u16(),
            start.elapsed()
        );

        if let Some(ref domain) = domain {
            self.rate_limiter.report_status(domain, status.as_u16()).await;
        }

        Ok(HttpResponse { status, response })
    }

    /// GET a page body, treating any non-2xx status as an error.
    pub async fn get_text(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self.get(url).await?;
        if !response.is_success() {
            return Err(ScrapeError::Status {
                status: response.status.as_u16(),
                url: url.to_string(),
            });
        }
        response.text().await.map_err(|e| self.map_error(e))
    }

    fn map_error(&self, e: reqwest::Error) -> ScrapeError {
        if e.is_timeout() {
            ScrapeError::Timeout(self.timeout)
        } else {
            e.into()
        }
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        self.get_text(url).await
    }
}
