//! Commerce backend client configuration.

use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Environment variable overriding the per-request timeout, in
/// milliseconds. Invalid or non-positive values fall back to the default.
pub const TIMEOUT_ENV_VAR: &str = "STOREFRONT_API_TIMEOUT_MS";

/// Configuration for [`StoreClient`](crate::http::StoreClient).
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Commerce backend base URL, without a trailing slash.
    pub base_url: String,
    /// Publishable API key sent with every request.
    pub publishable_key: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl StoreConfig {
    /// Create a configuration with the timeout taken from the environment.
    pub fn new(base_url: impl Into<String>, publishable_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            publishable_key: publishable_key.into(),
            timeout: timeout_from_env(),
        }
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Read the per-request timeout from [`TIMEOUT_ENV_VAR`].
pub fn timeout_from_env() -> Duration {
    parse_timeout_ms(std::env::var(TIMEOUT_ENV_VAR).ok().as_deref())
}

fn parse_timeout_ms(raw: Option<&str>) -> Duration {
    let ms = raw
        .and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|ms| *ms > 0)
        .map(|ms| ms as u64)
        .unwrap_or(DEFAULT_TIMEOUT_MS);
    Duration::from_millis(ms)
}
