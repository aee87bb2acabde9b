//! Canonical shared snapshot.

use tokio::sync::watch;

use crate::client::diff::{diff, FeedDelta};
use crate::types::FeedSnapshot;

/// Owner of the canonical feed snapshot consumed by the UI layer.
/// Channels hand their snapshots here; the change detector decides
/// whether observers wake up at all.
pub struct FeedStore {
    tx: watch::Sender<FeedSnapshot>,
}

impl FeedStore {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(FeedSnapshot::empty());
        Self { tx }
    }

    /// Observe the canonical snapshot. Receivers are only notified on
    /// structural change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.tx.subscribe()
    }

    #[must_use]
    pub fn current(&self) -> FeedSnapshot {
        self.tx.borrow().clone()
    }

    /// Run the change detector against the canonical snapshot. On
    /// Unchanged the stored reference is kept and no notification fires;
    /// on Changed the new snapshot becomes canonical atomically.
    pub fn publish(&self, next: FeedSnapshot) -> FeedDelta {
        let delta = diff(&self.tx.borrow(), &next);
        match delta {
            FeedDelta::Unchanged => {
                tracing::trace!(len = next.len(), "suppressed structurally identical snapshot");
            }
            FeedDelta::Changed => {
                tracing::debug!(len = next.len(), "publishing new canonical snapshot");
                self.tx.send_replace(next);
            }
        }
        delta
    }
}

impl Default for FeedStore {
    fn default() -> Self {
        Self::new()
    }
}
