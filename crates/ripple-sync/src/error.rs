//! Error types for feed synchronization.

use thiserror::Error;

/// Result type for feed synchronization operations.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors that can occur while synchronizing or mutating a feed.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SyncError {
    #[error("Operation timed out")]
    Timeout,

    #[error("Connectivity error: {0}")]
    Connectivity(String),

    #[error("Attachments unavailable: {0}")]
    CapabilityUnsupported(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Subscription closed")]
    SubscriptionClosed,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SyncError {
    /// Transient errors are absorbed and retried internally; they drive
    /// failover or a later re-probe, never a permanent rejection.
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SyncError::Timeout | SyncError::Connectivity(_) | SyncError::SubscriptionClosed
        )
    }

    /// The permanent "feature not deployed" signature from the capability
    /// probe or the mutation endpoint.
    #[inline]
    #[must_use]
    pub fn is_capability_unsupported(&self) -> bool {
        matches!(self, SyncError::CapabilityUnsupported(_))
    }
}
