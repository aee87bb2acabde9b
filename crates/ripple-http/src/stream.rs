//! NDJSON subscription stream handling.

use std::time::Duration;

use futures::StreamExt;

use ripple_sync::{FeedSnapshot, Result, SyncError};

/// Heartbeat timeout derived from the server's advertised cadence: the
/// stream is declared dead after 1.2 intervals plus a 3 second grace.
#[derive(Debug, Clone)]
pub struct HeartbeatTimeout {
    pub interval_secs: f64,
    pub timeout: Duration,
}

impl HeartbeatTimeout {
    #[must_use]
    pub fn new(interval_secs: f64) -> Self {
        let timeout_secs = 1.2 * interval_secs + 3.0;
        Self {
            interval_secs,
            timeout: Duration::from_secs_f64(timeout_secs),
        }
    }

    /// Parse a `Heartbeats` header value such as `"30s"`.
    #[must_use]
    pub fn from_header(value: &str) -> Option<Self> {
        value
            .trim()
            .strip_suffix('s')
            .unwrap_or(value)
            .parse::<f64>()
            .ok()
            .map(Self::new)
    }
}

/// Incremental splitter for newline-delimited bodies that arrive in
/// arbitrary chunk boundaries.
#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }
}

/// Blank lines are heartbeats, anything else is a snapshot document.
pub(crate) fn parse_snapshot_line(line: &str) -> Option<Result<FeedSnapshot>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(serde_json::from_str(trimmed).map_err(SyncError::Json))
}

/// Spawn the reader task that turns the HTTP body stream into feed
/// snapshots. The channel closes when the stream ends; a heartbeat
/// timeout surfaces as `SyncError::Timeout` before closing.
pub(crate) fn spawn_reader(
    response: reqwest::Response,
    heartbeat: Option<HeartbeatTimeout>,
) -> async_channel::Receiver<Result<FeedSnapshot>> {
    let (tx, rx) = async_channel::bounded(100);
    let mut stream = response.bytes_stream();

    tokio::spawn(async move {
        let mut lines = LineBuffer::default();
        loop {
            let next = match &heartbeat {
                Some(hb) => match tokio::time::timeout(hb.timeout, stream.next()).await {
                    Ok(item) => item,
                    Err(_) => {
                        tracing::warn!(
                            interval = hb.interval_secs,
                            "subscription heartbeat timed out"
                        );
                        let _ = tx.send(Err(SyncError::Timeout)).await;
                        break;
                    }
                },
                None => stream.next().await,
            };

            match next {
                Some(Ok(chunk)) => {
                    for line in lines.feed(&chunk) {
                        if let Some(result) = parse_snapshot_line(&line) {
                            if tx.send(result).await.is_err() {
                                return;
                            }
                        }
                    }
                }
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "subscription body stream errored");
                    let _ = tx.send(Err(SyncError::Connectivity(e.to_string()))).await;
                    break;
                }
                None => break,
            }
        }
        tracing::debug!("subscription stream ended");
    });

    rx
}
