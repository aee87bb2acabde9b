//! Client assembly: channels, negotiator, store, probe and dispatcher.

pub mod capability;
pub mod config;
pub mod diff;
pub mod dispatcher;
pub mod negotiator;
pub mod polling;
pub mod reactive;
pub mod store;

pub use capability::CapabilityProbe;
pub use config::SyncConfig;
pub use diff::{diff, FeedDelta};
pub use dispatcher::MessageDispatcher;
pub use negotiator::NegotiatorHandle;
pub use polling::PollingChannel;
pub use reactive::ReactiveChannel;
pub use store::FeedStore;

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::traits::FeedBackend;
use crate::types::{
    AttachmentUpload, CapabilityState, FeedSnapshot, SenderIdentity, TransportState,
};
use crate::visibility::VisibilityReceiver;

/// The assembled synchronization client. Owns the spawned channel and
/// negotiator tasks; the UI layer observes the canonical feed and the
/// transport state through `watch` receivers.
pub struct SyncClient {
    store: Arc<FeedStore>,
    probe: Arc<CapabilityProbe>,
    negotiator: NegotiatorHandle,
    negotiator_task: JoinHandle<()>,
    reactive: ReactiveChannel,
    polling: PollingChannel,
    dispatcher: MessageDispatcher,
}

impl SyncClient {
    /// Start synchronizing a topic: spawns both channels and the
    /// detection cycle.
    #[must_use]
    pub fn start(
        backend: Arc<dyn FeedBackend>,
        sender: SenderIdentity,
        topic: impl Into<String>,
        visibility: VisibilityReceiver,
        config: SyncConfig,
    ) -> Self {
        let topic = topic.into();
        let store = Arc::new(FeedStore::new());
        let probe = Arc::new(CapabilityProbe::new(backend.clone()));

        let mut reactive = ReactiveChannel::new(backend.clone(), topic.clone(), store.clone());
        let mut polling =
            PollingChannel::new(backend.clone(), topic.clone(), store.clone(), config.clone());

        let (negotiator, negotiator_task) =
            negotiator::spawn(&config, reactive.status_watch(), polling.status_watch());

        reactive.start(negotiator.watch());
        polling.start(negotiator.watch(), visibility);

        let dispatcher = MessageDispatcher::new(
            backend,
            probe.clone(),
            negotiator.clone(),
            polling.force_handle(),
            topic,
            sender,
            config.detection_timeout(),
        );

        Self {
            store,
            probe,
            negotiator,
            negotiator_task,
            reactive,
            polling,
            dispatcher,
        }
    }

    /// Observe the canonical feed snapshot. Receivers wake only on
    /// structural change.
    #[must_use]
    pub fn feed(&self) -> watch::Receiver<FeedSnapshot> {
        self.store.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> FeedSnapshot {
        self.store.current()
    }

    #[must_use]
    pub fn transport(&self) -> watch::Receiver<TransportState> {
        self.negotiator.watch()
    }

    #[must_use]
    pub fn transport_state(&self) -> TransportState {
        self.negotiator.state()
    }

    #[must_use]
    pub fn capability(&self) -> CapabilityState {
        self.probe.state()
    }

    /// Send a message through the active transport.
    pub async fn send(
        &self,
        content: impl Into<String>,
        attachment: Option<AttachmentUpload>,
    ) -> Result<()> {
        self.dispatcher.send(content, attachment).await
    }

    /// Request one out-of-cycle poll fetch.
    pub fn force_refresh(&self) {
        self.polling.force_fetch();
    }

    /// Explicit recovery action: re-subscribe the reactive channel and
    /// re-run transport detection.
    pub async fn reset(&mut self) {
        tracing::info!("client reset: re-subscribing and re-running detection");
        self.reactive.start(self.negotiator.watch());
        self.negotiator.reset().await;
    }

    /// Stop both channels and the negotiator. No further emissions.
    pub fn shutdown(&mut self) {
        self.reactive.stop();
        self.polling.stop();
        self.negotiator_task.abort();
    }
}

impl Drop for SyncClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}
