//! reqwest implementation of the feed backend contract.

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use ripple_sync::traits::FeedBackend;
use ripple_sync::{
    AttachmentRef, AttachmentUpload, FeedSnapshot, OutgoingMessage, Result, SyncError,
};

use crate::config::HttpConfig;
use crate::retry::{RetryDecision, RetryState};
use crate::stream::{spawn_reader, HeartbeatTimeout};

const UNSUPPORTED_CODE: &str = "attachments_unsupported";

/// HTTP backend: pull fetches, an NDJSON push subscription, mutations
/// and the attachment capability endpoints.
pub struct HttpBackend {
    client: reqwest::Client,
    base: Url,
    config: HttpConfig,
}

impl HttpBackend {
    pub fn new(config: HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| SyncError::Internal(format!("failed to build HTTP client: {e}")))?;
        Self::with_client(client, config)
    }

    pub fn with_client(client: reqwest::Client, config: HttpConfig) -> Result<Self> {
        let mut base_url = config.base_url.clone();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let base = Url::parse(&base_url)
            .map_err(|e| SyncError::Validation(format!("invalid base url {base_url}: {e}")))?;
        Ok(Self {
            client,
            base,
            config,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| SyncError::Validation(format!("invalid endpoint path {path}: {e}")))
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.auth_token {
            Some(token) => builder.header(
                http::header::AUTHORIZATION.as_str(),
                format!("Bearer {token}"),
            ),
            None => builder,
        }
    }

    async fn fetch_inner(&self, url: &Url) -> Result<FeedSnapshot> {
        let response = self
            .authorized(self.client.get(url.clone()))
            .send()
            .await
            .map_err(request_error)?;
        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_http_failure(status, &body));
        }
        let body = response.text().await.map_err(request_error)?;
        serde_json::from_str(&body).map_err(SyncError::Json)
    }
}

#[async_trait]
impl FeedBackend for HttpBackend {
    async fn fetch(&self, topic: &str) -> Result<FeedSnapshot> {
        let url = self.endpoint(&format!("feeds/{topic}"))?;
        let mut retry = RetryState::new(self.config.retry.clone());
        loop {
            match self.fetch_inner(&url).await {
                Ok(snapshot) => return Ok(snapshot),
                Err(e) => match retry.should_retry(&e) {
                    RetryDecision::Retry(delay) => {
                        tracing::warn!(
                            error = %e,
                            attempt = retry.attempts,
                            delay_ms = delay.as_millis() as u64,
                            "feed fetch failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    RetryDecision::GiveUp => return Err(e),
                },
            }
        }
    }

    async fn subscribe(
        &self,
        topic: &str,
    ) -> Result<async_channel::Receiver<Result<FeedSnapshot>>> {
        let url = self.endpoint(&format!("feeds/{topic}"))?;
        tracing::debug!(%url, "opening feed subscription");
        let response = self
            .authorized(self.client.get(url))
            .header("Subscribe", "true")
            .header(http::header::ACCEPT.as_str(), "application/x-ndjson")
            .timeout(self.config.subscribe_timeout())
            .send()
            .await
            .map_err(request_error)?;
        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(SyncError::Connectivity(format!(
                "subscription request returned HTTP {status}"
            )));
        }
        let heartbeat = response
            .headers()
            .get("heartbeats")
            .and_then(|v| v.to_str().ok())
            .and_then(HeartbeatTimeout::from_header);
        Ok(spawn_reader(response, heartbeat))
    }

    async fn submit(&self, topic: &str, message: OutgoingMessage) -> Result<()> {
        let url = self.endpoint(&format!("feeds/{topic}/messages"))?;
        let response = self
            .authorized(self.client.post(url))
            .json(&message)
            .send()
            .await
            .map_err(request_error)?;
        let status = response.status().as_u16();
        if (200..300).contains(&status) {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_http_failure(status, &body))
    }

    async fn probe_attachments(&self) -> Result<()> {
        let url = self.endpoint("attachments/capability")?;
        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(request_error)?;
        let status = response.status().as_u16();
        match status {
            200..=299 => Ok(()),
            404 | 501 => Err(SyncError::CapabilityUnsupported(
                "attachment uploads are not deployed on this backend".into(),
            )),
            _ => Err(SyncError::Connectivity(format!(
                "capability probe returned HTTP {status}"
            ))),
        }
    }

    async fn upload_attachment(&self, upload: AttachmentUpload) -> Result<AttachmentRef> {
        let url = self.endpoint("attachments")?;
        let part = reqwest::multipart::Part::stream(upload.bytes.clone())
            .file_name(upload.filename.clone())
            .mime_str(&upload.content_type)
            .map_err(|e| {
                SyncError::Validation(format!(
                    "invalid content type {}: {e}",
                    upload.content_type
                ))
            })?;
        let form = reqwest::multipart::Form::new().part("file", part);
        let response = self
            .authorized(self.client.post(url))
            .multipart(form)
            .send()
            .await
            .map_err(request_error)?;
        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_http_failure(status, &body));
        }
        let body = response.text().await.map_err(request_error)?;
        serde_json::from_str(&body).map_err(SyncError::Json)
    }
}

fn request_error(e: reqwest::Error) -> SyncError {
    if e.is_timeout() {
        SyncError::Timeout
    } else {
        SyncError::Connectivity(e.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// Map a failure status to the error taxonomy. The explicit
/// attachments-unsupported signature (501, or the structured error code)
/// is permanent; timeouts and server errors are transient; remaining
/// client errors are validation failures.
pub(crate) fn classify_http_failure(status: u16, body: &str) -> SyncError {
    let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
    let code = parsed.as_ref().and_then(|b| b.error.as_deref());
    if status == 501 || code == Some(UNSUPPORTED_CODE) {
        let detail = parsed
            .as_ref()
            .and_then(|b| b.message.clone())
            .unwrap_or_else(|| "the backend does not support attachment uploads".into());
        return SyncError::CapabilityUnsupported(detail);
    }
    match status {
        408 => SyncError::Timeout,
        429 | 500..=599 => SyncError::Connectivity(format!("HTTP {status}")),
        _ => {
            let detail = parsed
                .and_then(|b| b.message)
                .unwrap_or_else(|| format!("HTTP {status}"));
            SyncError::Validation(detail)
        }
    }
}
