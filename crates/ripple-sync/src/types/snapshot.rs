//! Feed snapshots.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};
use crate::types::Message;

/// Ordered sequence of messages, oldest first.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedSnapshot {
    pub messages: Vec<Message>,
}

impl FeedSnapshot {
    #[must_use]
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// An empty feed is a valid ready state.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn latest(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Ordering by `created_at` is non-decreasing and identifiers are
    /// unique within a snapshot.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.messages.len());
        let mut previous = 0u64;
        for msg in &self.messages {
            if msg.created_at < previous {
                return Err(SyncError::Validation(format!(
                    "snapshot ordering violated at message {}",
                    msg.id
                )));
            }
            previous = msg.created_at;
            if !seen.insert(msg.id.as_str()) {
                return Err(SyncError::Validation(format!(
                    "duplicate message id {} in snapshot",
                    msg.id
                )));
            }
        }
        Ok(())
    }
}
