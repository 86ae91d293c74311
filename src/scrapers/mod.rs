//! Job board scraping: fetching, rendering, selector resolution and
//! relevance filtering.

pub mod adapter;
pub mod browser;
pub mod dates;
mod error;
mod http_client;
pub mod rate_limiter;
pub mod relevance;
pub mod selector;
pub mod sites;
pub mod text;

pub use adapter::{AdapterOptions, PageOutcome, SiteAdapter, SourceAdapter, SourceReport};
#[cfg(feature = "browser")]
pub use browser::ChromiumRenderer;
pub use browser::{build_renderer, BrowserEngineConfig, Readiness, RenderSession, Renderer};
pub use error::ScrapeError;
pub(crate) use error::panic_message;
pub use http_client::{HttpClient, PageFetcher};
pub use rate_limiter::{RateLimitConfig, RateLimiter};
pub use relevance::{is_relevant, KeywordConfig, KeywordError, KeywordSet, RelevanceClassifier};
pub use sites::{RegistryOptions, SourceInfo, SourceRegistry};
