pub mod message;
pub mod snapshot;
pub mod status;

pub use message::{
    AttachmentRef, AttachmentUpload, Message, MessageKind, OutgoingMessage, SenderIdentity,
};
pub use snapshot::FeedSnapshot;
pub use status::{CapabilityState, ChannelStatus, TransportState};
