//! Single-flight detection of the optional attachment-upload feature.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Result, SyncError};
use crate::traits::FeedBackend;
use crate::types::CapabilityState;

/// Probes the backend's attachment endpoint at most once per outcome.
/// Supported and Unsupported are cached for the session; a transient
/// probe failure leaves the state Unknown so a later call re-probes.
pub struct CapabilityProbe {
    backend: Arc<dyn FeedBackend>,
    state: Mutex<CapabilityState>,
    // Serializes probes: concurrent callers queue here and re-check the
    // cached state instead of issuing duplicates.
    gate: tokio::sync::Mutex<()>,
}

impl CapabilityProbe {
    #[must_use]
    pub fn new(backend: Arc<dyn FeedBackend>) -> Self {
        Self {
            backend,
            state: Mutex::new(CapabilityState::Unknown),
            gate: tokio::sync::Mutex::new(()),
        }
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> CapabilityState {
        *self.state.lock()
    }

    fn unsupported() -> SyncError {
        SyncError::CapabilityUnsupported(
            "attachments are unavailable on this connection".into(),
        )
    }

    /// Resolve the capability, probing the backend once if it is still
    /// unknown. Returns immediately without any network call once a
    /// terminal state is cached.
    pub async fn ensure_supported(&self) -> Result<()> {
        match self.state() {
            CapabilityState::Supported => return Ok(()),
            CapabilityState::Unsupported => return Err(Self::unsupported()),
            CapabilityState::Unknown => {}
        }

        let _flight = self.gate.lock().await;
        // A caller ahead of us may have resolved the state while we waited.
        match self.state() {
            CapabilityState::Supported => return Ok(()),
            CapabilityState::Unsupported => return Err(Self::unsupported()),
            CapabilityState::Unknown => {}
        }

        match self.backend.probe_attachments().await {
            Ok(()) => {
                *self.state.lock() = CapabilityState::Supported;
                tracing::info!("attachment capability detected");
                Ok(())
            }
            Err(e) if e.is_capability_unsupported() => {
                *self.state.lock() = CapabilityState::Unsupported;
                tracing::warn!(error = %e, "attachment capability not deployed on backend");
                Err(e)
            }
            Err(e) => {
                // Transient: state stays Unknown, the next call re-probes.
                tracing::warn!(error = %e, "capability probe failed transiently");
                Err(e)
            }
        }
    }
}
