//! chromiumoxide-backed renderer.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{BrowserEngineConfig, Readiness, RenderSession, Renderer};
use crate::scrapers::error::ScrapeError;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

fn render_err(e: impl std::fmt::Display) -> ScrapeError {
    ScrapeError::Render(e.to_string())
}

struct Running {
    browser: Browser,
    handler: JoinHandle<()>,
}

/// Lazily launches (or connects to) one Chrome and opens a tab per session.
pub struct ChromiumRenderer {
    config: BrowserEngineConfig,
    running: Mutex<Option<Running>>,
}

impl ChromiumRenderer {
    pub fn new(config: BrowserEngineConfig) -> Self {
        Self {
            config,
            running: Mutex::new(None),
        }
    }

    async fn launch(&self) -> Result<Running, ScrapeError> {
        if let Some(remote_url) = self.config.remote_url.as_deref() {
            return self.connect_remote(remote_url).await;
        }

        info!("Launching browser (headless={})", self.config.headless);

        let mut builder = BrowserConfig::builder();
        if !self.config.headless {
            builder = builder.with_head();
        }
        if let Some(ref proxy) = self.config.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }
        builder = builder
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--no-sandbox")
            .arg("--disable-gpu");
        for arg in &self.config.chrome_args {
            builder = builder.arg(arg);
        }

        let config = builder
            .build()
            .map_err(|e| ScrapeError::Render(format!("invalid browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(render_err)?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Running { browser, handler })
    }

    async fn connect_remote(&self, url: &str) -> Result<Running, ScrapeError> {
        info!("Connecting to remote browser at {}", url);

        let http_url = url
            .replace("ws://", "http://")
            .replace("wss://", "https://");
        let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

        let info: serde_json::Value = reqwest::Client::new()
            .get(&version_url)
            .send()
            .await?
            .json()
            .await?;
        let ws_url = info
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ScrapeError::Render("no webSocketDebuggerUrl in response".into()))?;

        debug!("Connecting to WebSocket: {}", ws_url);

        let handler_config = chromiumoxide::handler::HandlerConfig {
            request_timeout: Duration::from_secs(self.config.timeout),
            ..Default::default()
        };
        let (browser, mut handler) = Browser::connect_with_config(ws_url, handler_config)
            .await
            .map_err(render_err)?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Running { browser, handler })
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn open_session(&self) -> Result<Box<dyn RenderSession>, ScrapeError> {
        let mut running = self.running.lock().await;
        if running.is_none() {
            *running = Some(self.launch().await?);
        }
        let browser = match running.as_ref() {
            Some(r) => &r.browser,
            None => return Err(ScrapeError::Render("browser not running".into())),
        };
        let page = browser.new_page("about:blank").await.map_err(render_err)?;
        Ok(Box::new(ChromiumSession { page }))
    }

    async fn shutdown(&self) {
        let Some(mut running) = self.running.lock().await.take() else {
            return;
        };
        if let Err(e) = running.browser.close().await {
            warn!("Browser did not close cleanly: {}", e);
        }
        running.handler.abort();
    }
}

struct ChromiumSession {
    page: Page,
}

impl ChromiumSession {
    async fn navigate_and_wait(&self, url: &str, readiness: &Readiness) -> Result<String, ScrapeError> {
        self.page.goto(url).await.map_err(render_err)?;
        loop {
            let html = self.page.content().await.map_err(render_err)?;
            if readiness.satisfied_by(&html) {
                return Ok(html);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl RenderSession for ChromiumSession {
    async fn render(
        &mut self,
        url: &str,
        readiness: &Readiness,
        timeout: Duration,
    ) -> Result<String, ScrapeError> {
        debug!("Rendering {}", url);
        match tokio::time::timeout(timeout, self.navigate_and_wait(url, readiness)).await {
            Ok(result) => result,
            Err(_) => Err(ScrapeError::RenderTimeout(timeout)),
        }
    }

    async fn close(self: Box<Self>) {
        if let Err(e) = self.page.close().await {
            debug!("Tab close failed: {}", e);
        }
    }
}
