//! Client-side synchronization of a hosted message feed over two
//! transports: a push-based live subscription with a polling fallback.

pub mod client;
pub mod error;
pub mod traits;
pub mod types;
pub mod visibility;

pub use client::{SyncClient, SyncConfig};
pub use error::{Result, SyncError};
pub use traits::FeedBackend;
pub use types::{
    AttachmentRef, AttachmentUpload, CapabilityState, ChannelStatus, FeedSnapshot, Message,
    MessageKind, OutgoingMessage, SenderIdentity, TransportState,
};
pub use visibility::{visibility_channel, Visibility, VisibilityReceiver};
