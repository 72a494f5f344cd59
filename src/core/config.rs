//! Console configuration threaded into the poller and the playground

use std::time::Duration;
use thiserror::Error;

use crate::{Args, DEFAULT_API_URL, DEFAULT_REFRESH_SECS, DEFAULT_SQL};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("API URL must not be empty")]
    EmptyApiUrl,
    #[error("API URL must start with http:// or https://: {0}")]
    UnsupportedScheme(String),
    #[error("refresh interval must be at least one second")]
    RefreshTooShort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Origin of the QueryCache service, without a trailing slash
    pub api_url: String,
    pub refresh_interval: Duration,
    /// Text the playground starts with
    pub default_sql: String,
}

impl ConsoleConfig {
    pub fn new(api_url: &str) -> Result<Self, ConfigError> {
        let api_url = api_url.trim();
        if api_url.is_empty() {
            return Err(ConfigError::EmptyApiUrl);
        }
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError::UnsupportedScheme(api_url.to_string()));
        }

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_SECS),
            default_sql: DEFAULT_SQL.to_string(),
        })
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Result<Self, ConfigError> {
        if interval < Duration::from_secs(1) {
            return Err(ConfigError::RefreshTooShort);
        }
        self.refresh_interval = interval;
        Ok(self)
    }

    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        Self::new(&args.api_url)?.with_refresh_interval(Duration::from_secs(args.refresh_secs))
    }

    /// Value the countdown starts from and wraps back to, in whole seconds.
    pub fn countdown_start(&self) -> u64 {
        self.refresh_interval.as_secs()
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_SECS),
            default_sql: DEFAULT_SQL.to_string(),
        }
    }
}
