use async_trait::async_trait;

use crate::error::Result;
use crate::types::{AttachmentRef, AttachmentUpload, FeedSnapshot, OutgoingMessage};

/// Abstraction over the hosted backend's query, mutation and capability
/// endpoints. The core consumes this boundary; it never talks to the
/// network directly.
#[async_trait]
pub trait FeedBackend: Send + Sync + 'static {
    /// Pull endpoint: one snapshot per call.
    async fn fetch(&self, topic: &str) -> Result<FeedSnapshot>;

    /// Push endpoint. Must deliver an initial snapshot (possibly empty)
    /// to signal readiness; channel closure means the subscription died.
    async fn subscribe(
        &self,
        topic: &str,
    ) -> Result<async_channel::Receiver<Result<FeedSnapshot>>>;

    /// Mutation endpoint. Capability-not-supported and generic failures
    /// are distinguishable through the returned error variant.
    async fn submit(&self, topic: &str, message: OutgoingMessage) -> Result<()>;

    /// Low-cost probe of the optional attachment feature.
    /// `Err(CapabilityUnsupported)` is the permanent "not deployed"
    /// signature; any other error is transient.
    async fn probe_attachments(&self) -> Result<()>;

    /// Upload an attachment payload, returning its storage handle.
    async fn upload_attachment(&self, upload: AttachmentUpload) -> Result<AttachmentRef>;
}
