//! Transport configuration.
//!
//! Configuration is resolved once at startup and injected into [`KbClient`]
//! at construction time, rather than read from process-wide environment
//! variables during request handling.
//!
//! [`KbClient`]: crate::KbClient

use std::time::Duration;

/// Backend base endpoint used when `KBA_API_BASE` is unset.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Per-request timeout used when `KBA_HTTP_TIMEOUT_SECS` is unset. Browser
/// fetch has no timeout at all; a server-grade client needs a bound.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Transport settings for the KB-Assist backend.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    /// Create a config for the given base endpoint with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Resolve config from the environment.
    ///
    /// # Environment Variables
    /// - `KBA_API_BASE`: backend base endpoint (default: `http://127.0.0.1:8000`)
    /// - `KBA_HTTP_TIMEOUT_SECS`: per-request timeout in seconds (default: 30)
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("KBA_API_BASE").unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned());
        let timeout_secs = std::env::var("KBA_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
