//! Shared mock backend for the integration suites.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use ripple_sync::traits::FeedBackend;
use ripple_sync::{
    AttachmentRef, AttachmentUpload, FeedSnapshot, Message, MessageKind, OutgoingMessage, Result,
    SenderIdentity, SyncError,
};

/// How the mock answers subscription requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubscribeMode {
    /// Stream opens; the test pushes snapshots through [`MockBackend::push`].
    Open,
    /// Stream opens but never delivers anything.
    Silent,
    /// The subscription request fails outright.
    Refused,
}

/// How the mock answers capability probes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProbeMode {
    Supported,
    Unsupported,
    Transient,
}

pub struct MockBackend {
    pub fetches: AtomicUsize,
    pub submits: AtomicUsize,
    pub probes: AtomicUsize,
    pub uploads: AtomicUsize,

    snapshot: Mutex<FeedSnapshot>,
    fetch_fails: AtomicBool,
    submit_failures: AtomicUsize,
    probe_mode: Mutex<ProbeMode>,
    probe_delay: Mutex<Option<Duration>>,
    subscribe_mode: Mutex<SubscribeMode>,
    push_tx: Mutex<Option<async_channel::Sender<Result<FeedSnapshot>>>>,
    held_senders: Mutex<Vec<async_channel::Sender<Result<FeedSnapshot>>>>,
    pub sent: Mutex<Vec<OutgoingMessage>>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            fetches: AtomicUsize::new(0),
            submits: AtomicUsize::new(0),
            probes: AtomicUsize::new(0),
            uploads: AtomicUsize::new(0),
            snapshot: Mutex::new(FeedSnapshot::empty()),
            fetch_fails: AtomicBool::new(false),
            submit_failures: AtomicUsize::new(0),
            probe_mode: Mutex::new(ProbeMode::Supported),
            probe_delay: Mutex::new(None),
            subscribe_mode: Mutex::new(SubscribeMode::Silent),
            push_tx: Mutex::new(None),
            held_senders: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn set_subscribe_mode(&self, mode: SubscribeMode) {
        *self.subscribe_mode.lock() = mode;
    }

    pub fn set_probe_mode(&self, mode: ProbeMode) {
        *self.probe_mode.lock() = mode;
    }

    pub fn set_probe_delay(&self, delay: Option<Duration>) {
        *self.probe_delay.lock() = delay;
    }

    pub fn set_fetch_fails(&self, fails: bool) {
        self.fetch_fails.store(fails, Ordering::SeqCst);
    }

    /// Fail the next `n` submits with a connectivity error.
    pub fn fail_next_submits(&self, n: usize) {
        self.submit_failures.store(n, Ordering::SeqCst);
    }

    /// Replace the snapshot served by `fetch`.
    pub fn set_snapshot(&self, snapshot: FeedSnapshot) {
        *self.snapshot.lock() = snapshot;
    }

    /// Push a snapshot through the open subscription stream.
    pub fn push(&self, snapshot: FeedSnapshot) {
        let guard = self.push_tx.lock();
        let tx = guard.as_ref().expect("no open subscription to push into");
        tx.try_send(Ok(snapshot)).expect("subscription buffer full");
    }

    /// Fail the open subscription stream.
    pub fn fail_subscription(&self) {
        let guard = self.push_tx.lock();
        let tx = guard.as_ref().expect("no open subscription to fail");
        tx.try_send(Err(SyncError::Connectivity("stream torn down".into())))
            .expect("subscription buffer full");
    }
}

#[async_trait]
impl FeedBackend for MockBackend {
    async fn fetch(&self, _topic: &str) -> Result<FeedSnapshot> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fetch_fails.load(Ordering::SeqCst) {
            return Err(SyncError::Connectivity("mock fetch failure".into()));
        }
        Ok(self.snapshot.lock().clone())
    }

    async fn subscribe(
        &self,
        _topic: &str,
    ) -> Result<async_channel::Receiver<Result<FeedSnapshot>>> {
        match *self.subscribe_mode.lock() {
            SubscribeMode::Refused => {
                Err(SyncError::Connectivity("subscription refused".into()))
            }
            SubscribeMode::Silent => {
                let (tx, rx) = async_channel::bounded(16);
                self.held_senders.lock().push(tx);
                Ok(rx)
            }
            SubscribeMode::Open => {
                let (tx, rx) = async_channel::bounded(16);
                *self.push_tx.lock() = Some(tx);
                Ok(rx)
            }
        }
    }

    async fn submit(&self, _topic: &str, message: OutgoingMessage) -> Result<()> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        let remaining = self.submit_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.submit_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(SyncError::Connectivity("mock submit failure".into()));
        }
        self.sent.lock().push(message);
        Ok(())
    }

    async fn probe_attachments(&self) -> Result<()> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        let delay = *self.probe_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match *self.probe_mode.lock() {
            ProbeMode::Supported => Ok(()),
            ProbeMode::Unsupported => Err(SyncError::CapabilityUnsupported(
                "attachment uploads are not deployed".into(),
            )),
            ProbeMode::Transient => Err(SyncError::Connectivity("probe timed out".into())),
        }
    }

    async fn upload_attachment(&self, upload: AttachmentUpload) -> Result<AttachmentRef> {
        let n = self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(AttachmentRef::Storage {
            handle: format!("blob-{n}"),
            content_type: upload.content_type,
            filename: upload.filename,
            size: upload.bytes.len() as u64,
        })
    }
}

pub fn sender() -> SenderIdentity {
    SenderIdentity::new("u-local", "local user")
}

pub fn message(id: &str, content: &str, created_at: u64) -> Message {
    Message {
        id: id.into(),
        sender_id: "u-remote".into(),
        sender_name: "remote user".into(),
        content: content.into(),
        kind: MessageKind::Text,
        attachment: None,
        created_at,
        deleted: false,
    }
}

pub fn snapshot(entries: &[(&str, &str, u64)]) -> FeedSnapshot {
    FeedSnapshot::new(
        entries
            .iter()
            .map(|(id, content, at)| message(id, content, *at))
            .collect(),
    )
}

/// Let spawned tasks run under paused time.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(5)).await;
}

/// Opt-in log output for debugging a failing test: RUST_LOG=ripple_sync=trace.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
