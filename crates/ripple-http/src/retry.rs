//! Retry policy for the pull endpoint.

use std::time::Duration;

use ripple_sync::SyncError;

/// Configuration for fetch retry behavior. Attempts are bounded: the
/// polling channel must hand control back to its cadence rather than
/// retry forever.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts.
    pub max_retries: u32,
    /// Initial backoff duration.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(3),
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    #[must_use]
    pub fn with_initial_backoff(mut self, duration: Duration) -> Self {
        self.initial_backoff = duration;
        self
    }

    #[must_use]
    pub fn with_max_backoff(mut self, duration: Duration) -> Self {
        self.max_backoff = duration;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    Retry(Duration),
    GiveUp,
}

/// Per-request retry bookkeeping.
#[derive(Debug, Clone)]
pub struct RetryState {
    pub attempts: u32,
    current_backoff: Duration,
    config: RetryConfig,
}

impl RetryState {
    #[must_use]
    pub fn new(config: RetryConfig) -> Self {
        Self {
            attempts: 0,
            current_backoff: config.initial_backoff,
            config,
        }
    }

    /// Only transient errors are retried, and only up to the configured
    /// attempt bound. Backoff grows linearly and is capped.
    pub fn should_retry(&mut self, error: &SyncError) -> RetryDecision {
        if !error.is_transient() {
            return RetryDecision::GiveUp;
        }
        self.attempts += 1;
        if self.attempts > self.config.max_retries {
            return RetryDecision::GiveUp;
        }
        let wait = self.current_backoff;
        self.current_backoff = std::cmp::min(
            self.current_backoff + self.config.initial_backoff,
            self.config.max_backoff,
        );
        RetryDecision::Retry(wait)
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
        self.current_backoff = self.config.initial_backoff;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.initial_backoff, Duration::from_millis(500));
    }

    #[test]
    fn test_transient_error_retried_up_to_bound() {
        let mut state = RetryState::new(RetryConfig::default().with_max_retries(2));
        let err = SyncError::Connectivity("connection reset".into());
        assert!(matches!(state.should_retry(&err), RetryDecision::Retry(_)));
        assert!(matches!(state.should_retry(&err), RetryDecision::Retry(_)));
        assert_eq!(state.should_retry(&err), RetryDecision::GiveUp);
    }

    #[test]
    fn test_permanent_error_never_retried() {
        let mut state = RetryState::new(RetryConfig::default());
        let err = SyncError::Validation("bad request".into());
        assert_eq!(state.should_retry(&err), RetryDecision::GiveUp);
        assert_eq!(state.attempts, 0);
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let config = RetryConfig::default()
            .with_max_retries(10)
            .with_initial_backoff(Duration::from_secs(1))
            .with_max_backoff(Duration::from_secs(3));
        let mut state = RetryState::new(config);
        let err = SyncError::Timeout;
        assert_eq!(
            state.should_retry(&err),
            RetryDecision::Retry(Duration::from_secs(1))
        );
        assert_eq!(
            state.should_retry(&err),
            RetryDecision::Retry(Duration::from_secs(2))
        );
        assert_eq!(
            state.should_retry(&err),
            RetryDecision::Retry(Duration::from_secs(3))
        );
        assert_eq!(
            state.should_retry(&err),
            RetryDecision::Retry(Duration::from_secs(3))
        );
    }

    #[test]
    fn test_no_retry() {
        let mut state = RetryState::new(RetryConfig::no_retry());
        assert_eq!(state.should_retry(&SyncError::Timeout), RetryDecision::GiveUp);
    }

    #[test]
    fn test_reset() {
        let mut state = RetryState::new(RetryConfig::default());
        let _ = state.should_retry(&SyncError::Timeout);
        state.reset();
        assert_eq!(state.attempts, 0);
    }
}
