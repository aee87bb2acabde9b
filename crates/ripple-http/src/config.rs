//! Configuration for the HTTP backend.

use std::time::Duration;

use crate::retry::RetryConfig;

/// Configuration for [`HttpBackend`](crate::HttpBackend).
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Base URL of the backend API. A trailing slash is added if missing.
    pub base_url: String,
    /// Bearer token attached to every request (optional).
    pub auth_token: Option<String>,
    /// Per-request timeout for fetch, submit, probe and upload, in
    /// milliseconds.
    pub request_timeout_ms: u64,
    /// Timeout for the long-lived subscription request, in seconds.
    /// Must exceed the server's heartbeat interval.
    pub subscribe_timeout_secs: u64,
    /// Retry policy for the pull endpoint.
    pub retry: RetryConfig,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/api/".into(),
            auth_token: None,
            request_timeout_ms: 10000,
            subscribe_timeout_secs: 300,
            retry: RetryConfig::default(),
        }
    }
}

impl HttpConfig {
    #[inline]
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    #[inline]
    #[must_use]
    pub fn subscribe_timeout(&self) -> Duration {
        Duration::from_secs(self.subscribe_timeout_secs)
    }
}
