//! Unified send operation routed to the active transport.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use crate::client::capability::CapabilityProbe;
use crate::client::negotiator::NegotiatorHandle;
use crate::error::{Result, SyncError};
use crate::traits::FeedBackend;
use crate::types::{AttachmentUpload, OutgoingMessage, SenderIdentity, TransportState};

/// Routes sends through the active channel and enforces per-channel
/// constraints. Never mutates the shared store: a successful send is
/// expected to surface in the next snapshot from the active channel.
pub struct MessageDispatcher {
    backend: Arc<dyn FeedBackend>,
    probe: Arc<CapabilityProbe>,
    negotiator: NegotiatorHandle,
    poll_nudge: Arc<Notify>,
    topic: String,
    sender: SenderIdentity,
    detection_grace: Duration,
}

impl MessageDispatcher {
    #[must_use]
    pub fn new(
        backend: Arc<dyn FeedBackend>,
        probe: Arc<CapabilityProbe>,
        negotiator: NegotiatorHandle,
        poll_nudge: Arc<Notify>,
        topic: impl Into<String>,
        sender: SenderIdentity,
        detection_grace: Duration,
    ) -> Self {
        Self {
            backend,
            probe,
            negotiator,
            poll_nudge,
            topic: topic.into(),
            sender,
            detection_grace,
        }
    }

    /// Send a message through whichever transport is active.
    pub async fn send(
        &self,
        content: impl Into<String>,
        attachment: Option<AttachmentUpload>,
    ) -> Result<()> {
        let content = content.into();
        match self.active_transport().await? {
            TransportState::Reactive => self.send_reactive(content, attachment).await,
            TransportState::Polling => self.send_polling(content, attachment).await,
            TransportState::Detecting => Err(SyncError::Internal(
                "active_transport returned a non-terminal state".into(),
            )),
        }
    }

    /// Wait out an in-progress detection cycle, bounded by one detection
    /// timeout. Sends are routed only to a terminal transport.
    async fn active_transport(&self) -> Result<TransportState> {
        let mut rx = self.negotiator.watch();
        let state = *rx.borrow_and_update();
        if state.is_terminal() {
            return Ok(state);
        }

        let deadline = tokio::time::sleep(self.detection_grace);
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                _ = &mut deadline => {
                    return Err(SyncError::Connectivity(
                        "no transport available: channel detection did not complete".into(),
                    ));
                }
                res = rx.changed() => {
                    if res.is_err() {
                        return Err(SyncError::Internal("transport negotiator is gone".into()));
                    }
                    let state = *rx.borrow_and_update();
                    if state.is_terminal() {
                        return Ok(state);
                    }
                }
            }
        }
    }

    async fn send_reactive(
        &self,
        content: String,
        attachment: Option<AttachmentUpload>,
    ) -> Result<()> {
        let had_attachment = attachment.is_some();

        let message = match attachment {
            Some(upload) => {
                // Probe first; an Unsupported verdict is non-retryable and
                // never falls back to the polling transport.
                self.probe.ensure_supported().await?;
                let kind = upload.kind();
                let filename = upload.filename.clone();
                let attachment_ref = match self.backend.upload_attachment(upload).await {
                    Ok(r) => r,
                    Err(e) if e.is_transient() => {
                        self.negotiator.force_polling("attachment upload failed");
                        return Err(e);
                    }
                    Err(e) => return Err(e),
                };
                tracing::debug!(filename = %filename, "attachment uploaded");
                OutgoingMessage::with_attachment(&self.sender, content, kind, attachment_ref)
            }
            None => OutgoingMessage::text(&self.sender, content),
        };

        match self.backend.submit(&self.topic, message.clone()).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_transient() => {
                self.negotiator.force_polling("send failed on reactive transport");
                if had_attachment {
                    // The pull channel has no attachment transport.
                    return Err(e);
                }
                tracing::info!("retrying send once through polling transport");
                self.backend.submit(&self.topic, message).await?;
                self.poll_nudge.notify_one();
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn send_polling(
        &self,
        content: String,
        attachment: Option<AttachmentUpload>,
    ) -> Result<()> {
        if attachment.is_some() {
            // Rejected before any network call is made.
            return Err(SyncError::Validation(
                "attachments are unavailable on the polling connection".into(),
            ));
        }
        let message = OutgoingMessage::text(&self.sender, content);
        self.backend.submit(&self.topic, message).await?;
        // Surface the send in the next snapshot without waiting a full
        // poll interval.
        self.poll_nudge.notify_one();
        Ok(())
    }
}
