//! Push-based subscription channel.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::client::store::FeedStore;
use crate::error::SyncError;
use crate::traits::FeedBackend;
use crate::types::{ChannelStatus, TransportState};

/// Wraps the backend's live subscription to the message feed. Reports
/// Ready on the first delivered snapshot, Errored when the stream fails
/// or closes. Restartable so an explicit reset can re-subscribe.
pub struct ReactiveChannel {
    backend: Arc<dyn FeedBackend>,
    topic: String,
    store: Arc<FeedStore>,
    status: Arc<watch::Sender<ChannelStatus>>,
    task: Option<JoinHandle<()>>,
}

impl ReactiveChannel {
    #[must_use]
    pub fn new(backend: Arc<dyn FeedBackend>, topic: impl Into<String>, store: Arc<FeedStore>) -> Self {
        let (status, _) = watch::channel(ChannelStatus::Loading);
        Self {
            backend,
            topic: topic.into(),
            store,
            status: Arc::new(status),
            task: None,
        }
    }

    #[must_use]
    pub fn status_watch(&self) -> watch::Receiver<ChannelStatus> {
        self.status.subscribe()
    }

    /// (Re)start the subscription task. Any previous task is stopped
    /// first and the status report returns to Loading.
    pub fn start(&mut self, transport: watch::Receiver<TransportState>) {
        self.stop();
        self.status.send_replace(ChannelStatus::Loading);
        let task = SubscriptionTask {
            backend: self.backend.clone(),
            topic: self.topic.clone(),
            store: self.store.clone(),
            status: self.status.clone(),
            transport,
        };
        self.task = Some(tokio::spawn(task.run()));
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for ReactiveChannel {
    fn drop(&mut self) {
        self.stop();
    }
}

struct SubscriptionTask {
    backend: Arc<dyn FeedBackend>,
    topic: String,
    store: Arc<FeedStore>,
    status: Arc<watch::Sender<ChannelStatus>>,
    transport: watch::Receiver<TransportState>,
}

impl SubscriptionTask {
    async fn run(self) {
        let rx = match self.backend.subscribe(&self.topic).await {
            Ok(rx) => rx,
            Err(e) => {
                tracing::warn!(error = %e, topic = %self.topic, "subscription request failed");
                self.status.send_replace(ChannelStatus::Errored(e.to_string()));
                return;
            }
        };
        tracing::debug!(topic = %self.topic, "subscription stream open");

        while let Ok(result) = rx.recv().await {
            match result {
                Ok(snapshot) => {
                    if let Err(e) = snapshot.validate() {
                        tracing::warn!(
                            error = %e,
                            topic = %self.topic,
                            "discarding malformed push snapshot"
                        );
                        continue;
                    }
                    let active = matches!(
                        *self.transport.borrow(),
                        TransportState::Detecting | TransportState::Reactive
                    );
                    if active {
                        self.store.publish(snapshot.clone());
                    }
                    // Readiness, not content: the initial snapshot may be empty.
                    self.status.send_replace(ChannelStatus::Ready(snapshot));
                }
                Err(e) => {
                    tracing::warn!(error = %e, topic = %self.topic, "subscription stream errored");
                    self.status.send_replace(ChannelStatus::Errored(e.to_string()));
                    return;
                }
            }
        }

        tracing::debug!(topic = %self.topic, "subscription stream closed by backend");
        self.status
            .send_replace(ChannelStatus::Errored(SyncError::SubscriptionClosed.to_string()));
    }
}
