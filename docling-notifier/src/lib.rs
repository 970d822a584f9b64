//! Completion webhooks.
//!
//! Every finished conversion job produces exactly one [`JobOutcome`], which is
//! posted once to the backend at
//! `{base_url}/api/documents/{document_id}/processing-complete`. Delivery is
//! best effort: failures are reported to the caller (who only logs them) and
//! never retried.

use std::time::Duration;

use async_trait::async_trait;
use docling_convert::ConversionMetadata;
use reqwest::{Client, Url};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Default bound on a single webhook round trip.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Body of the webhook, tagged by `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobOutcome {
    Completed {
        markdown_content: String,
        metadata: ConversionMetadata,
    },
    Failed {
        error: String,
    },
}

impl JobOutcome {
    pub fn completed(markdown_content: impl Into<String>, metadata: ConversionMetadata) -> Self {
        Self::Completed {
            markdown_content: markdown_content.into(),
            metadata,
        }
    }

    /// Failure outcome; an empty message is replaced so the backend always
    /// receives something to show.
    pub fn failed(error: impl Into<String>) -> Self {
        let error = error.into();
        let error = if error.trim().is_empty() {
            "unknown conversion error".to_string()
        } else {
            error
        };
        Self::Failed { error }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Self::Completed { .. } => "completed",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Something that can tell the backend how a job ended.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, document_id: &str, outcome: &JobOutcome) -> Result<(), NotifyError>;
}

/// Posts outcomes to the backend over HTTP.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    base_url: Url,
}

impl WebhookNotifier {
    /// Creates a notifier with the default 30 second timeout.
    pub fn new(base_url: &str) -> Result<Self, NotifyError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, NotifyError> {
        let base_url =
            Url::parse(base_url).map_err(|e| NotifyError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(NotifyError::InvalidUrl(base_url.to_string()));
        }
        let client = Client::builder()
            .user_agent(concat!("docling-service/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Client(e.to_string()))?;
        Ok(Self { client, base_url })
    }

    /// Callback URL for `document_id`, with the id percent-encoded as one segment.
    pub fn endpoint(&self, document_id: &str) -> Result<Url, NotifyError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| NotifyError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["api", "documents", document_id, "processing-complete"]);
        Ok(url)
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, document_id: &str, outcome: &JobOutcome) -> Result<(), NotifyError> {
        let url = self.endpoint(document_id)?;
        debug!(document_id, status = outcome.status(), %url, "sending webhook");

        let response = self
            .client
            .post(url.clone())
            .json(outcome)
            .send()
            .await
            .map_err(|e| {
                warn!(document_id, %url, error = %e, "webhook delivery failed");
                NotifyError::Transport(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(document_id, %url, %status, "backend rejected webhook");
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!(document_id, status = outcome.status(), "webhook delivered");
        Ok(())
    }
}

/// Webhook delivery failures.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid backend url: {0}")]
    InvalidUrl(String),
    #[error("failed to build HTTP client: {0}")]
    Client(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("backend responded with status {status}: {body}")]
    Status { status: u16, body: String },
}
