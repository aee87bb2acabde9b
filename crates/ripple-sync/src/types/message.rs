//! Message and attachment wire types.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

/// What a message carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    Image,
    File,
}

/// Reference to an attachment payload. A message either points at backend
/// storage or embeds the payload inline, never both.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum AttachmentRef {
    Storage {
        handle: String,
        content_type: String,
        filename: String,
        size: u64,
    },
    Inline {
        /// Base64-encoded payload.
        data: String,
        content_type: String,
        filename: String,
    },
}

impl AttachmentRef {
    #[inline]
    #[must_use]
    pub fn filename(&self) -> &str {
        match self {
            AttachmentRef::Storage { filename, .. } => filename,
            AttachmentRef::Inline { filename, .. } => filename,
        }
    }

    #[inline]
    #[must_use]
    pub fn content_type(&self) -> &str {
        match self {
            AttachmentRef::Storage { content_type, .. } => content_type,
            AttachmentRef::Inline { content_type, .. } => content_type,
        }
    }
}

/// A single feed entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Opaque identifier, unique within a feed and stable across re-fetches.
    pub id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<AttachmentRef>,
    /// Backend-assigned logical timestamp. Monotonic within a feed, not
    /// wall-clock-authoritative.
    pub created_at: u64,
    /// Soft-delete tombstone; the backend clears `content` when set.
    #[serde(default)]
    pub deleted: bool,
}

impl Message {
    /// Image and file messages require an attachment reference; text
    /// messages forbid one.
    pub fn validate(&self) -> Result<()> {
        match (self.kind, self.attachment.is_some()) {
            (MessageKind::Text, true) => Err(SyncError::Validation(format!(
                "text message {} carries an attachment reference",
                self.id
            ))),
            (MessageKind::Image | MessageKind::File, false) => Err(SyncError::Validation(
                format!("message {} is missing its attachment reference", self.id),
            )),
            _ => Ok(()),
        }
    }
}

/// Identity of the local sender. Owned by the hosting application; the
/// core treats it as an opaque input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderIdentity {
    pub id: String,
    pub name: String,
}

impl SenderIdentity {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// An outgoing attachment payload, prior to upload.
#[derive(Clone, Debug)]
pub struct AttachmentUpload {
    pub bytes: Bytes,
    pub content_type: String,
    pub filename: String,
}

impl AttachmentUpload {
    #[must_use]
    pub fn new(
        bytes: impl Into<Bytes>,
        content_type: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
            filename: filename.into(),
        }
    }

    /// Message kind this payload produces once attached.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> MessageKind {
        if self.content_type.starts_with("image/") {
            MessageKind::Image
        } else {
            MessageKind::File
        }
    }

    /// Encode the payload as an inline reference instead of uploading it.
    #[must_use]
    pub fn into_inline(self) -> AttachmentRef {
        AttachmentRef::Inline {
            data: BASE64.encode(&self.bytes),
            content_type: self.content_type,
            filename: self.filename,
        }
    }
}

/// Mutation payload handed to the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    /// Client-generated id the backend may use for idempotency.
    pub client_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<AttachmentRef>,
}

impl OutgoingMessage {
    /// A plain text message from the given sender.
    #[must_use]
    pub fn text(sender: &SenderIdentity, content: impl Into<String>) -> Self {
        Self {
            client_id: uuid::Uuid::new_v4().to_string(),
            sender_id: sender.id.clone(),
            sender_name: sender.name.clone(),
            content: content.into(),
            kind: MessageKind::Text,
            attachment: None,
        }
    }

    /// A message carrying an already-resolved attachment reference.
    #[must_use]
    pub fn with_attachment(
        sender: &SenderIdentity,
        content: impl Into<String>,
        kind: MessageKind,
        attachment: AttachmentRef,
    ) -> Self {
        Self {
            client_id: uuid::Uuid::new_v4().to_string(),
            sender_id: sender.id.clone(),
            sender_name: sender.name.clone(),
            content: content.into(),
            kind,
            attachment: Some(attachment),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_message(id: &str) -> Message {
        Message {
            id: id.into(),
            sender_id: "u1".into(),
            sender_name: "alice".into(),
            content: "hello".into(),
            kind: MessageKind::Text,
            attachment: None,
            created_at: 1,
            deleted: false,
        }
    }

    #[test]
    fn test_text_message_valid() {
        assert!(text_message("m1").validate().is_ok());
    }

    #[test]
    fn test_text_with_attachment_invalid() {
        let mut msg = text_message("m1");
        msg.attachment = Some(AttachmentRef::Inline {
            data: "aGk=".into(),
            content_type: "text/plain".into(),
            filename: "hi.txt".into(),
        });
        assert!(msg.validate().is_err());
    }

    #[test]
    fn test_image_without_attachment_invalid() {
        let mut msg = text_message("m1");
        msg.kind = MessageKind::Image;
        assert!(msg.validate().is_err());
    }

    #[test]
    fn test_image_with_attachment_valid() {
        let mut msg = text_message("m1");
        msg.kind = MessageKind::Image;
        msg.attachment = Some(AttachmentRef::Storage {
            handle: "blob-1".into(),
            content_type: "image/png".into(),
            filename: "cat.png".into(),
            size: 512,
        });
        assert!(msg.validate().is_ok());
    }

    #[test]
    fn test_upload_kind_from_content_type() {
        let img = AttachmentUpload::new(Bytes::from_static(b"x"), "image/png", "a.png");
        let doc = AttachmentUpload::new(Bytes::from_static(b"x"), "application/pdf", "a.pdf");
        assert_eq!(img.kind(), MessageKind::Image);
        assert_eq!(doc.kind(), MessageKind::File);
    }

    #[test]
    fn test_upload_into_inline() {
        let upload = AttachmentUpload::new(Bytes::from_static(b"hi"), "text/plain", "hi.txt");
        match upload.into_inline() {
            AttachmentRef::Inline { data, filename, .. } => {
                assert_eq!(data, "aGk=");
                assert_eq!(filename, "hi.txt");
            }
            other => panic!("expected inline ref, got {:?}", other),
        }
    }

    #[test]
    fn test_outgoing_text() {
        let sender = SenderIdentity::new("u1", "alice");
        let out = OutgoingMessage::text(&sender, "hello");
        assert_eq!(out.kind, MessageKind::Text);
        assert!(out.attachment.is_none());
        assert!(!out.client_id.is_empty());
    }

    #[test]
    fn test_message_roundtrip() {
        let msg = text_message("m1");
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(msg, back);
    }

    #[test]
    fn test_deleted_defaults_false() {
        let json = r#"{"id":"m1","sender_id":"u1","sender_name":"alice",
            "content":"hi","type":"text","created_at":3}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert!(!msg.deleted);
    }
}
