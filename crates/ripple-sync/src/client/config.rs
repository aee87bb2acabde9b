//! Configuration for the synchronization client.

use std::time::Duration;

/// Tuning values for transport detection and polling. The defaults match
/// the hosted backend's observed behavior but every threshold is a knob.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncConfig {
    /// How long to wait for the reactive channel before falling back, in
    /// milliseconds.
    pub detection_timeout_ms: u64,
    /// Recurring fetch interval for the polling channel, in milliseconds.
    pub poll_interval_ms: u64,
    /// Elapsed time since the last successful fetch after which a
    /// visibility resume triggers an immediate out-of-cycle fetch, in
    /// milliseconds.
    pub staleness_threshold_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            detection_timeout_ms: 3000,
            poll_interval_ms: 5000,
            staleness_threshold_ms: 10000,
        }
    }
}

impl SyncConfig {
    #[inline]
    #[must_use]
    pub fn detection_timeout(&self) -> Duration {
        Duration::from_millis(self.detection_timeout_ms)
    }

    #[inline]
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[inline]
    #[must_use]
    pub fn staleness_threshold(&self) -> Duration {
        Duration::from_millis(self.staleness_threshold_ms)
    }
}
