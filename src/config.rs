//! Configuration for jobharvest.
//!
//! Settings come from an optional TOML (or JSON) file and are then overridden
//! by environment variables. `.env` is loaded by `main` before this runs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::harvest::DEFAULT_MAX_CONCURRENT;
use crate::models::RequestDefaults;
use crate::scrapers::{
    AdapterOptions, BrowserEngineConfig, KeywordConfig, KeywordError, RegistryOptions,
    RelevanceClassifier,
};

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "jobharvest.toml";

/// Default document store root.
pub const DEFAULT_DATABASE_SERVICE_URL: &str = "http://localhost:8081";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
    #[error("invalid value for {key}: {value:?}")]
    Env { key: &'static str, value: String },
    #[error(transparent)]
    Keywords(#[from] KeywordError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Query used when a request leaves it blank.
    pub default_query: String,
    /// Pages per source when a request asks for none.
    pub default_pages: u32,
    pub request_timeout_secs: u64,
    /// Pause between listing pages of one source.
    pub request_delay_ms: u64,
    pub max_concurrent_sources: usize,
    /// Root of the document store service.
    pub database_service_url: String,
    /// Keyword file (`include`/`exclude`); bundled vocabulary when unset.
    pub keywords_file: Option<PathBuf>,
    pub host: String,
    pub port: u16,
    /// Fixed user agent; a browser-like one is used when unset.
    pub user_agent: Option<String>,
    pub browser: BrowserEngineConfig,
}

impl Default for Settings {
    fn default() -> Self {
        let defaults = RequestDefaults::default();
        Self {
            default_query: defaults.query,
            default_pages: defaults.pages,
            request_timeout_secs: 30,
            request_delay_ms: 1000,
            max_concurrent_sources: DEFAULT_MAX_CONCURRENT,
            database_service_url: DEFAULT_DATABASE_SERVICE_URL.to_string(),
            keywords_file: None,
            host: "0.0.0.0".to_string(),
            port: 8080,
            user_agent: None,
            browser: BrowserEngineConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from [`DEFAULT_CONFIG_FILE`] when it
    /// exists, then apply environment overrides.
    pub async fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let settings = match path {
            Some(path) => Self::load_from_path(path).await?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if tokio::fs::try_exists(default_path).await.unwrap_or(false) {
                    Self::load_from_path(default_path).await?
                } else {
                    Self::default()
                }
            }
        };
        settings.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Parse a config file. `.json` files are read as JSON, anything else as
    /// TOML. A relative `keywords_file` is resolved against the file's
    /// directory.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let mut settings = Self::parse(path, &contents)?;
        if let (Some(keywords), Some(base)) = (settings.keywords_file.as_ref(), path.parent()) {
            if keywords.is_relative() {
                settings.keywords_file = Some(base.join(keywords));
            }
        }
        Ok(settings)
    }

    fn parse(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        let parse_error = |reason: String| ConfigError::Parse {
            path: path.to_path_buf(),
            reason,
        };
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(contents).map_err(|e| parse_error(e.to_string())),
            _ => toml::from_str(contents).map_err(|e| parse_error(e.to_string())),
        }
    }

    /// Apply `DATABASE_SERVICE_URL`, `PORT`, `HOST`, `BROWSER_URL` and
    /// `HARVEST_DEFAULT_QUERY`. Empty values are ignored.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("DATABASE_SERVICE_URL") {
            self.database_service_url = url;
        }
        if let Some(port) = get("PORT") {
            self.port = port.trim().parse().map_err(|_| ConfigError::Env {
                key: "PORT",
                value: port,
            })?;
        }
        if let Some(host) = get("HOST") {
            self.host = host;
        }
        if let Some(url) = get("BROWSER_URL") {
            self.browser.remote_url = Some(url);
        }
        if let Some(query) = get("HARVEST_DEFAULT_QUERY") {
            self.default_query = query;
        }
        Ok(self)
    }

    /// Relevance classifier from `keywords_file`, or the bundled vocabulary.
    pub fn classifier(&self) -> Result<RelevanceClassifier, ConfigError> {
        let config = match self.keywords_file {
            Some(ref path) => KeywordConfig::load(path)?,
            None => KeywordConfig::bundled()?,
        };
        Ok(RelevanceClassifier::from_config(&config)?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions {
            request_timeout: self.request_timeout(),
            adapter: AdapterOptions {
                page_delay: Duration::from_millis(self.request_delay_ms),
                render_timeout: Duration::from_secs(self.browser.timeout),
            },
            user_agent: self.user_agent.clone(),
        }
    }

    pub fn request_defaults(&self) -> RequestDefaults {
        RequestDefaults {
            query: self.default_query.clone(),
            pages: self.default_pages.max(1),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
