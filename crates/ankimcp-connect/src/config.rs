//! AnkiConnect connection settings.

use crate::error::{AnkiError, AnkiResult};
use std::time::Duration;
use url::Url;

/// Default AnkiConnect host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default AnkiConnect port.
pub const DEFAULT_PORT: u16 = 8765;

/// Default connection establishment timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Default whole-request timeout in seconds. Anki can be slow while syncing.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default number of attempts per action.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the first retry, in milliseconds.
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 1000;

/// Where and how to reach AnkiConnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnkiConfig {
    /// Full endpoint URL. Takes precedence over `host` and `port`.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    /// API key, sent as the top-level `key` field when set.
    pub api_key: Option<String>,
    pub connect_timeout: Duration,
    pub timeout: Duration,
    /// Total attempts per action, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry. Doubles on every further retry.
    pub retry_backoff: Duration,
}

impl Default for AnkiConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            api_key: None,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
        }
    }
}

impl AnkiConfig {
    /// Configuration pointing at a full URL, e.g. `http://localhost:8765`.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the retry budget and initial backoff.
    pub fn with_retries(mut self, max_attempts: u32, backoff: Duration) -> Self {
        self.max_attempts = max_attempts;
        self.retry_backoff = backoff;
        self
    }

    /// Set the whole-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve the endpoint URL.
    pub fn endpoint(&self) -> AnkiResult<Url> {
        let raw = match &self.url {
            Some(url) => url.clone(),
            None => format!("http://{}:{}", self.host, self.port),
        };

        let url = Url::parse(&raw).map_err(|e| AnkiError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(AnkiError::InvalidUrl {
                url: raw,
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        Ok(url)
    }
}
