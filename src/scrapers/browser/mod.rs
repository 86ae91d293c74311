//! Rendering collaborator for boards that build their listings client-side.
//!
//! A [`Renderer`] is shared by the whole harvest; every source task opens its
//! own [`RenderSession`] (one browser tab) and closes it when the task ends,
//! so concurrent sources never drive the same tab.

mod config;
#[cfg(feature = "browser")]
mod chromium;

pub use config::BrowserEngineConfig;
#[cfg(feature = "browser")]
pub use chromium::ChromiumRenderer;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};

use super::error::ScrapeError;
use super::selector::element_text;

/// Condition a rendered page must meet before its HTML is taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// Wait until any of these selectors matches an element with text.
    AnyOf(Vec<String>),
}

impl Readiness {
    pub fn any_of<I, S>(selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::AnyOf(selectors.into_iter().map(Into::into).collect())
    }

    /// Check a DOM snapshot. Unparsable selectors never match.
    pub fn satisfied_by(&self, html: &str) -> bool {
        let Readiness::AnyOf(selectors) = self;
        let document = Html::parse_document(html);
        selectors
            .iter()
            .filter_map(|css| Selector::parse(css).ok())
            .any(|sel| {
                document
                    .select(&sel)
                    .next()
                    .map(|el| !element_text(el).is_empty())
                    .unwrap_or(false)
            })
    }
}

/// One browser tab owned by a single source task.
#[async_trait]
pub trait RenderSession: Send {
    /// Navigate and return the DOM once `readiness` holds.
    ///
    /// Returns [`ScrapeError::RenderTimeout`] when it does not hold within
    /// `timeout`.
    async fn render(
        &mut self,
        url: &str,
        readiness: &Readiness,
        timeout: Duration,
    ) -> Result<String, ScrapeError>;

    /// Release the tab.
    async fn close(self: Box<Self>);
}

/// Hands out render sessions.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn open_session(&self) -> Result<Box<dyn RenderSession>, ScrapeError>;

    /// Tear down any browser process. Sessions must be closed first.
    async fn shutdown(&self) {}
}

/// Build the configured renderer, if rendering is available.
pub fn build_renderer(config: &BrowserEngineConfig) -> Option<Arc<dyn Renderer>> {
    if config.disabled {
        return None;
    }
    #[cfg(feature = "browser")]
    {
        Some(Arc::new(ChromiumRenderer::new(config.clone())))
    }
    #[cfg(not(feature = "browser"))]
    {
        tracing::warn!("Browser support not compiled in; render-dependent sources will use plain HTTP");
        None
    }
}

/// Close a session if one was opened.
pub async fn release(session: Option<Box<dyn RenderSession>>) {
    if let Some(session) = session {
        session.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_of_needs_text() {
        let ready = Readiness::any_of([".job-card", ".vacancy"]);
        assert!(!ready.satisfied_by(r#"<div class="job-card"></div>"#));
        assert!(ready.satisfied_by(r#"<div class="vacancy">Designer</div>"#));
        assert!(!ready.satisfied_by("<p>loading...</p>"));
    }

    #[test]
    fn test_disabled_config_has_no_renderer() {
        let config = BrowserEngineConfig {
            disabled: true,
            ..Default::default()
        };
        assert!(build_renderer(&config).is_none());
    }
}
