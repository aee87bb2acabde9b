//! Pull-based polling channel with a visibility-aware lifecycle.

use std::sync::Arc;

use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::client::config::SyncConfig;
use crate::client::store::FeedStore;
use crate::traits::FeedBackend;
use crate::types::{ChannelStatus, TransportState};
use crate::visibility::VisibilityReceiver;

/// Recurring fetch on a fixed interval. Suspends while the hosting
/// surface is hidden; on resume, a feed staler than the configured
/// threshold triggers one immediate out-of-cycle fetch before the normal
/// cadence continues. Fetch failures are transient and keep the timer
/// running.
pub struct PollingChannel {
    backend: Arc<dyn FeedBackend>,
    topic: String,
    store: Arc<FeedStore>,
    config: SyncConfig,
    status: Arc<watch::Sender<ChannelStatus>>,
    force: Arc<Notify>,
    shutdown: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

impl PollingChannel {
    #[must_use]
    pub fn new(
        backend: Arc<dyn FeedBackend>,
        topic: impl Into<String>,
        store: Arc<FeedStore>,
        config: SyncConfig,
    ) -> Self {
        let (status, _) = watch::channel(ChannelStatus::Loading);
        Self {
            backend,
            topic: topic.into(),
            store,
            config,
            status: Arc::new(status),
            force: Arc::new(Notify::new()),
            shutdown: None,
            task: None,
        }
    }

    #[must_use]
    pub fn status_watch(&self) -> watch::Receiver<ChannelStatus> {
        self.status.subscribe()
    }

    /// Handle for requesting out-of-cycle fetches without holding the
    /// channel itself.
    #[must_use]
    pub fn force_handle(&self) -> Arc<Notify> {
        self.force.clone()
    }

    /// Request one out-of-cycle fetch.
    pub fn force_fetch(&self) {
        self.force.notify_one();
    }

    /// (Re)start the poll loop. The first fetch fires immediately so the
    /// negotiator can consult this channel during detection.
    pub fn start(&mut self, transport: watch::Receiver<TransportState>, visibility: VisibilityReceiver) {
        self.stop();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        self.shutdown = Some(shutdown_tx);
        self.status.send_replace(ChannelStatus::Loading);
        let task = PollTask {
            backend: self.backend.clone(),
            topic: self.topic.clone(),
            store: self.store.clone(),
            status: self.status.clone(),
            transport,
        };
        self.task = Some(tokio::spawn(task.run(
            visibility,
            self.force.clone(),
            shutdown_rx,
            self.config.clone(),
        )));
    }

    /// Cancel the recurring timer and the visibility listener together;
    /// no emissions afterward.
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(true);
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for PollingChannel {
    fn drop(&mut self) {
        self.stop();
    }
}

struct PollTask {
    backend: Arc<dyn FeedBackend>,
    topic: String,
    store: Arc<FeedStore>,
    status: Arc<watch::Sender<ChannelStatus>>,
    transport: watch::Receiver<TransportState>,
}

impl PollTask {
    async fn run(
        self,
        mut visibility: VisibilityReceiver,
        force: Arc<Notify>,
        mut shutdown: watch::Receiver<bool>,
        config: SyncConfig,
    ) {
        let interval = config.poll_interval();
        let staleness = config.staleness_threshold();
        let mut last_success: Option<Instant> = None;
        let mut visibility_alive = true;
        // First fetch runs immediately so detection has something to consult.
        let mut next_at = Instant::now();

        loop {
            if *shutdown.borrow() {
                break;
            }

            if visibility.borrow_and_update().is_hidden() {
                // Suspended: no network calls while the surface is hidden.
                tokio::select! {
                    _ = shutdown.changed() => break,
                    res = visibility.changed(), if visibility_alive => {
                        if res.is_err() {
                            visibility_alive = false;
                            continue;
                        }
                        if visibility.borrow_and_update().is_hidden() {
                            continue;
                        }
                        let stale = last_success.map_or(true, |at| at.elapsed() > staleness);
                        if stale {
                            tracing::debug!(topic = %self.topic, "feed stale after resume, fetching out of cycle");
                            self.fetch_once(&shutdown, &mut last_success).await;
                        }
                        next_at = Instant::now() + interval;
                    }
                }
                continue;
            }

            tokio::select! {
                _ = shutdown.changed() => break,
                res = visibility.changed(), if visibility_alive => {
                    if res.is_err() {
                        visibility_alive = false;
                    }
                    // Re-evaluated at the top of the loop.
                }
                _ = force.notified() => {
                    self.fetch_once(&shutdown, &mut last_success).await;
                    next_at = Instant::now() + interval;
                }
                _ = tokio::time::sleep_until(next_at) => {
                    self.fetch_once(&shutdown, &mut last_success).await;
                    next_at = Instant::now() + interval;
                }
            }
        }

        tracing::debug!(topic = %self.topic, "polling loop stopped");
    }

    async fn fetch_once(&self, shutdown: &watch::Receiver<bool>, last_success: &mut Option<Instant>) {
        let result = self.backend.fetch(&self.topic).await;
        if *shutdown.borrow() {
            return;
        }
        match result {
            Ok(snapshot) => {
                if let Err(e) = snapshot.validate() {
                    tracing::warn!(error = %e, topic = %self.topic, "discarding malformed poll snapshot");
                    self.status.send_replace(ChannelStatus::Errored(e.to_string()));
                    return;
                }
                *last_success = Some(Instant::now());
                let active = matches!(
                    *self.transport.borrow(),
                    TransportState::Detecting | TransportState::Polling
                );
                if active {
                    self.store.publish(snapshot.clone());
                }
                self.status.send_replace(ChannelStatus::Ready(snapshot));
            }
            Err(e) => {
                // Transient: the recurring timer keeps running.
                tracing::warn!(error = %e, topic = %self.topic, "poll fetch failed");
                self.status.send_replace(ChannelStatus::Errored(e.to_string()));
            }
        }
    }
}
