//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

use super::feed::Feed;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP client behavior settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Fetch retry policy
    #[serde(default)]
    pub retry: RetryConfig,

    /// Snapshot store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Feed definitions
    #[serde(default)]
    pub feeds: Vec<Feed>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.retry.max_attempts == 0 {
            return Err(AppError::validation("retry.max_attempts must be > 0"));
        }
        if self.feeds.is_empty() {
            return Err(AppError::validation("No feeds defined"));
        }
        let mut seen_ids = HashSet::new();
        for feed in &self.feeds {
            if feed.id.trim().is_empty() {
                return Err(AppError::validation("Feed with empty id"));
            }
            if !seen_ids.insert(feed.id.as_str()) {
                // Two feeds sharing an id would share one snapshot document.
                return Err(AppError::validation(format!(
                    "Duplicate feed id '{}'",
                    feed.id
                )));
            }
            if feed.url.trim().is_empty() {
                return Err(AppError::validation(format!("Feed '{}' has no url", feed.id)));
            }
            if self.store.backend == StoreBackend::Issue && feed.issue_number.is_none() {
                return Err(AppError::validation(format!(
                    "Feed '{}' needs issue_number for the issue store",
                    feed.id
                )));
            }
        }
        Ok(())
    }

    /// Look up a feed by id.
    pub fn feed(&self, id: &str) -> Option<&Feed> {
        self.feeds.iter().find(|f| f.id == id)
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Fetch retry policy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum fetch attempts before the run fails
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds
    #[serde(default = "defaults::backoff_initial")]
    pub backoff_initial_ms: u64,

    /// Multiplier applied to the delay after each attempt
    #[serde(default = "defaults::backoff_multiplier")]
    pub backoff_multiplier: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::max_attempts(),
            backoff_initial_ms: defaults::backoff_initial(),
            backoff_multiplier: defaults::backoff_multiplier(),
        }
    }
}

/// Which snapshot store backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// One JSON file per feed under `store.dir`
    #[default]
    File,
    /// One issue per feed on a GitHub-style tracker
    Issue,
}

/// Snapshot store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend selection
    #[serde(default)]
    pub backend: StoreBackend,

    /// Root directory for the file backend
    #[serde(default = "defaults::store_dir")]
    pub dir: String,

    /// API base URL for the issue backend
    #[serde(default = "defaults::api_base")]
    pub api_base: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            dir: defaults::store_dir(),
            api_base: defaults::api_base(),
        }
    }
}

mod defaults {
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; akimachi/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_attempts() -> u32 {
        3
    }
    pub fn backoff_initial() -> u64 {
        1000
    }
    pub fn backoff_multiplier() -> u32 {
        2
    }
    pub fn store_dir() -> String {
        "snapshots".into()
    }
    pub fn api_base() -> String {
        "https://api.github.com".into()
    }
}
