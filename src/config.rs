//! Client configuration

use core::{fmt, time::Duration};
use std::env;

use crate::retry::RetryPolicy;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub const API_KEY_ENV: &str = "MEMVAULT_API_KEY";
pub const BASE_URL_ENV: &str = "MEMVAULT_BASE_URL";
pub const TIMEOUT_ENV: &str = "MEMVAULT_TIMEOUT_SECS";
pub const MAX_RETRIES_ENV: &str = "MEMVAULT_MAX_RETRIES";

/// Everything a [`Client`][crate::Client] needs, fixed once the client is built
#[derive(Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
    /// Bounds each attempt separately, not the whole call including retries
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub user_agent: String,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }

    /// Reads the api key from `MEMVAULT_API_KEY`, and optionally the base url, timeout (whole
    /// seconds) and retry count from `MEMVAULT_BASE_URL`, `MEMVAULT_TIMEOUT_SECS` and
    /// `MEMVAULT_MAX_RETRIES`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = env::var(API_KEY_ENV).map_err(|_| ConfigError::Missing(API_KEY_ENV))?;
        let mut config = Self::new(api_key);

        if let Ok(base_url) = env::var(BASE_URL_ENV) {
            config.base_url = base_url;
        }
        if let Some(seconds) = parse_env::<u64>(TIMEOUT_ENV)? {
            config.timeout = Duration::from_secs(seconds);
        }
        if let Some(max_retries) = parse_env::<u32>(MAX_RETRIES_ENV)? {
            config.retry.max_retries = max_retries;
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.retry.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.retry.base_delay = base_delay;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

fn parse_env<T: core::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(None),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),
    #[error("environment variable {name} has an invalid value `{value}`")]
    Invalid { name: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::new("sk-test");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.retry, RetryPolicy::default());
        assert!(config.user_agent.starts_with("memvault/"));
    }

    #[test]
    fn builder_methods() {
        let config = ClientConfig::new("sk-test")
            .with_base_url("https://memories.internal/api")
            .with_timeout(Duration::from_secs(5))
            .with_max_retries(7)
            .with_base_delay(Duration::from_millis(10));

        assert_eq!(config.base_url, "https://memories.internal/api");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(
            config.retry,
            RetryPolicy::new(7, Duration::from_millis(10))
        );
    }

    #[test]
    fn unset_optional_variables_are_skipped() {
        assert_eq!(parse_env::<u32>("MEMVAULT_SURELY_NOT_SET_ANYWHERE"), Ok(None));
    }

    #[test]
    fn debug_hides_the_key() {
        let rendered = format!("{:?}", ClientConfig::new("sk-very-secret"));
        assert!(!rendered.contains("sk-very-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
