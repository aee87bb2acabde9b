//! Transport selection between the reactive and polling channels.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::client::config::SyncConfig;
use crate::types::{ChannelStatus, TransportState};

/// Selection rules, evaluated against the latest status report from each
/// channel:
///
/// 1. Reactive Ready wins outright, even with an empty snapshot, and even
///    when polling is simultaneously Ready.
/// 2. Reactive Errored, or the detection timer expiring, falls back to
///    Polling provided the polling channel is Ready.
/// 3. Otherwise stay in Detecting and re-evaluate on the next report.
#[must_use]
pub fn decide(
    reactive: &ChannelStatus,
    polling: &ChannelStatus,
    timer_expired: bool,
) -> Option<TransportState> {
    if reactive.is_ready() {
        return Some(TransportState::Reactive);
    }
    if (reactive.is_errored() || timer_expired) && polling.is_ready() {
        return Some(TransportState::Polling);
    }
    None
}

/// Handle onto the negotiator task. The negotiator exclusively owns
/// `TransportState`; everything else observes through [`watch`].
#[derive(Clone)]
pub struct NegotiatorHandle {
    state: Arc<watch::Sender<TransportState>>,
    reset_tx: mpsc::Sender<()>,
}

impl NegotiatorHandle {
    #[inline]
    #[must_use]
    pub fn state(&self) -> TransportState {
        *self.state.borrow()
    }

    #[must_use]
    pub fn watch(&self) -> watch::Receiver<TransportState> {
        self.state.subscribe()
    }

    /// Dispatcher-triggered failover after a connectivity-class send
    /// failure on the reactive path. This is the one transition that
    /// bypasses a detection cycle.
    pub fn force_polling(&self, reason: &str) {
        let current = *self.state.borrow();
        if current == TransportState::Polling {
            return;
        }
        tracing::warn!(reason, from = ?current, "failing over to polling transport");
        self.state.send_replace(TransportState::Polling);
    }

    /// Explicit external recovery: re-enter Detecting and restart the
    /// detection timer. Never triggered automatically.
    pub async fn reset(&self) {
        let _ = self.reset_tx.send(()).await;
    }
}

/// Spawn the detection driver. It consumes status reports from both
/// channels and owns every transition of [`TransportState`].
pub fn spawn(
    config: &SyncConfig,
    reactive: watch::Receiver<ChannelStatus>,
    polling: watch::Receiver<ChannelStatus>,
) -> (NegotiatorHandle, JoinHandle<()>) {
    let (state_tx, _) = watch::channel(TransportState::Detecting);
    let state = Arc::new(state_tx);
    let (reset_tx, reset_rx) = mpsc::channel(1);

    let handle = NegotiatorHandle {
        state: state.clone(),
        reset_tx,
    };
    let timeout = config.detection_timeout();
    let task = tokio::spawn(run(state, reactive, polling, reset_rx, timeout));
    (handle, task)
}

async fn run(
    state: Arc<watch::Sender<TransportState>>,
    mut reactive: watch::Receiver<ChannelStatus>,
    mut polling: watch::Receiver<ChannelStatus>,
    mut reset_rx: mpsc::Receiver<()>,
    timeout: Duration,
) {
    'detect: loop {
        state.send_replace(TransportState::Detecting);
        let deadline = Instant::now() + timeout;
        let mut timer_expired = false;

        let selected = loop {
            let r = reactive.borrow_and_update().clone();
            let p = polling.borrow_and_update().clone();
            if let Some(next) = decide(&r, &p, timer_expired) {
                break next;
            }
            tokio::select! {
                _ = tokio::time::sleep_until(deadline), if !timer_expired => {
                    timer_expired = true;
                    tracing::debug!("detection timer expired before reactive channel was ready");
                }
                res = reactive.changed() => {
                    if res.is_err() {
                        return;
                    }
                }
                res = polling.changed() => {
                    if res.is_err() {
                        return;
                    }
                }
                maybe_reset = reset_rx.recv() => {
                    match maybe_reset {
                        Some(()) => {
                            tracing::info!("detection reset requested mid-cycle");
                            continue 'detect;
                        }
                        None => return,
                    }
                }
            }
        };

        // First terminal transition; the timer arm above is never taken
        // again. Later status reports are ignored until an explicit reset.
        state.send_replace(selected);
        tracing::info!(transport = ?selected, "transport selected");

        match reset_rx.recv().await {
            Some(()) => tracing::info!("transport detection reset"),
            None => return,
        }
    }
}
