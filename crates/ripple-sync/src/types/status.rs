//! Channel, transport and capability state.

use serde::{Deserialize, Serialize};

use crate::types::FeedSnapshot;

/// Asynchronous status report from a channel.
#[derive(Clone, Debug, PartialEq)]
pub enum ChannelStatus {
    Loading,
    Ready(FeedSnapshot),
    Errored(String),
}

impl ChannelStatus {
    /// Readiness, not content: an empty snapshot still counts.
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, ChannelStatus::Ready(_))
    }

    #[inline]
    #[must_use]
    pub fn is_errored(&self) -> bool {
        matches!(self, ChannelStatus::Errored(_))
    }
}

/// Which transport carries the feed. Owned and mutated only by the
/// negotiator; everyone else observes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportState {
    Detecting,
    Reactive,
    Polling,
}

impl TransportState {
    /// Reactive and Polling are terminal for the session absent an
    /// explicit reset.
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransportState::Detecting)
    }
}

/// Whether the backend supports attachment uploads. Owned by the
/// capability probe; Unsupported is terminal for the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CapabilityState {
    Unknown,
    Supported,
    Unsupported,
}
