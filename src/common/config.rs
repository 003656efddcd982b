//! Configuration for the minidoc client runtime

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Seed node urls used for the first topology fetch
    pub urls: Vec<String>,

    /// Default database name
    pub database: String,

    /// Max node-selection attempts per execute call (before the one
    /// failover refresh cycle)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Per-request deadline in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Wall-clock budget across all retries of one execute call
    #[serde(default = "default_overall_budget_ms")]
    pub overall_budget_ms: u64,

    /// Cap on forced refreshes caused by stale-topology responses
    /// within one execute call
    #[serde(default = "default_max_stale_refreshes")]
    pub max_stale_refreshes: usize,

    /// Initial backoff between transient failures, doubled per attempt
    #[serde(default = "default_first_backoff_ms")]
    pub first_backoff_ms: u64,

    /// Separator between the hilo prefix and the numeric part of
    /// generated document ids
    #[serde(default = "default_identity_parts_separator")]
    pub identity_parts_separator: String,
}

fn default_max_attempts() -> usize {
    3
}
fn default_request_timeout_ms() -> u64 {
    15_000
}
fn default_overall_budget_ms() -> u64 {
    60_000
}
fn default_max_stale_refreshes() -> usize {
    2
}
fn default_first_backoff_ms() -> u64 {
    100
}
fn default_identity_parts_separator() -> String {
    "/".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            database: String::new(),
            max_attempts: default_max_attempts(),
            request_timeout_ms: default_request_timeout_ms(),
            overall_budget_ms: default_overall_budget_ms(),
            max_stale_refreshes: default_max_stale_refreshes(),
            first_backoff_ms: default_first_backoff_ms(),
            identity_parts_separator: default_identity_parts_separator(),
        }
    }
}

impl ClientConfig {
    /// Minimal config from seed urls and a database name.
    pub fn new(urls: Vec<String>, database: impl Into<String>) -> Self {
        Self {
            urls,
            database: database.into(),
            ..Default::default()
        }
    }

    /// Load from `minidoc.toml` (if present), then `MINIDOC_*`
    /// environment overrides.
    pub fn load() -> crate::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("minidoc").required(false))
            .add_source(config::Environment::with_prefix("MINIDOC").separator("__"))
            .build()
            .map_err(|e| crate::Error::InvalidConfig(e.to_string()))?;

        let cfg: ClientConfig = settings
            .try_deserialize()
            .map_err(|e| crate::Error::InvalidConfig(e.to_string()))?;
        cfg.validated()
    }

    /// Validate and normalize (strip trailing slashes from seed urls).
    pub fn validated(mut self) -> crate::Result<Self> {
        if self.urls.is_empty() {
            return Err(crate::Error::InvalidConfig("no seed urls".into()));
        }
        if self.max_attempts == 0 {
            return Err(crate::Error::InvalidConfig(
                "max_attempts must be at least 1".into(),
            ));
        }
        for url in &mut self.urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(crate::Error::InvalidConfig(format!(
                    "seed url must be http(s): {}",
                    url
                )));
            }
            while url.ends_with('/') {
                url.pop();
            }
        }
        Ok(self)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn overall_budget(&self) -> Duration {
        Duration::from_millis(self.overall_budget_ms)
    }

    pub fn first_backoff(&self) -> Duration {
        Duration::from_millis(self.first_backoff_ms)
    }
}
