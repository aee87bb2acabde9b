//! Structural comparison of feed snapshots.

use crate::types::FeedSnapshot;

/// Verdict from comparing two snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedDelta {
    Changed,
    Unchanged,
}

/// Two snapshots are unchanged iff they have equal length and, at every
/// index, equal (id, content, sender_name, created_at) tuples. Anything
/// else, including reordering, counts as changed.
#[must_use]
pub fn diff(previous: &FeedSnapshot, next: &FeedSnapshot) -> FeedDelta {
    if previous.messages.len() != next.messages.len() {
        return FeedDelta::Changed;
    }
    let identical = previous
        .messages
        .iter()
        .zip(&next.messages)
        .all(|(a, b)| {
            a.id == b.id
                && a.content == b.content
                && a.sender_name == b.sender_name
                && a.created_at == b.created_at
        });
    if identical {
        FeedDelta::Unchanged
    } else {
        FeedDelta::Changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Message, MessageKind};

    fn message(id: &str, content: &str, created_at: u64) -> Message {
        Message {
            id: id.into(),
            sender_id: "u1".into(),
            sender_name: "alice".into(),
            content: content.into(),
            kind: MessageKind::Text,
            attachment: None,
            created_at,
            deleted: false,
        }
    }

    fn snapshot(messages: Vec<Message>) -> FeedSnapshot {
        FeedSnapshot::new(messages)
    }

    #[test]
    fn test_identical_snapshots_unchanged() {
        let a = snapshot(vec![message("m1", "hi", 1), message("m2", "yo", 2)]);
        let b = a.clone();
        assert_eq!(diff(&a, &b), FeedDelta::Unchanged);
    }

    #[test]
    fn test_empty_snapshots_unchanged() {
        assert_eq!(
            diff(&FeedSnapshot::empty(), &FeedSnapshot::empty()),
            FeedDelta::Unchanged
        );
    }

    #[test]
    fn test_insertion_changed() {
        let a = snapshot(vec![message("m1", "hi", 1)]);
        let b = snapshot(vec![message("m1", "hi", 1), message("m2", "yo", 2)]);
        assert_eq!(diff(&a, &b), FeedDelta::Changed);
    }

    #[test]
    fn test_deletion_changed() {
        let a = snapshot(vec![message("m1", "hi", 1), message("m2", "yo", 2)]);
        let b = snapshot(vec![message("m1", "hi", 1)]);
        assert_eq!(diff(&a, &b), FeedDelta::Changed);
    }

    #[test]
    fn test_reordering_changed() {
        let a = snapshot(vec![message("m1", "hi", 1), message("m2", "yo", 1)]);
        let b = snapshot(vec![message("m2", "yo", 1), message("m1", "hi", 1)]);
        assert_eq!(diff(&a, &b), FeedDelta::Changed);
    }

    #[test]
    fn test_content_mutation_changed() {
        let a = snapshot(vec![message("m1", "hi", 1)]);
        let b = snapshot(vec![message("m1", "hi (edited)", 1)]);
        assert_eq!(diff(&a, &b), FeedDelta::Changed);
    }

    #[test]
    fn test_sender_name_mutation_changed() {
        let a = snapshot(vec![message("m1", "hi", 1)]);
        let mut renamed = message("m1", "hi", 1);
        renamed.sender_name = "alice (away)".into();
        let b = snapshot(vec![renamed]);
        assert_eq!(diff(&a, &b), FeedDelta::Changed);
    }

    #[test]
    fn test_timestamp_mutation_changed() {
        let a = snapshot(vec![message("m1", "hi", 1)]);
        let b = snapshot(vec![message("m1", "hi", 2)]);
        assert_eq!(diff(&a, &b), FeedDelta::Changed);
    }

    #[test]
    fn test_sender_id_alone_not_compared() {
        let a = snapshot(vec![message("m1", "hi", 1)]);
        let mut moved = message("m1", "hi", 1);
        moved.sender_id = "u2".into();
        let b = snapshot(vec![moved]);
        assert_eq!(diff(&a, &b), FeedDelta::Unchanged);
    }
}
