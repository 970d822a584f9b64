//! Conversion job implementation.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use docling_convert::{ConversionOutput, Converter};
use docling_job_queue::{async_trait, JobExecutor, JobQueueError, JobRequest};
use docling_notifier::{JobOutcome, Notifier};
use docling_store::ConversionStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::error::JobError;
use crate::job_types;

/// Default upper bound for a single conversion.
pub const DEFAULT_CONVERSION_TIMEOUT: Duration = Duration::from_secs(300);

/// Payload for the document.convert job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertPayload {
    pub document_id: String,
    pub file_path: PathBuf,
}

impl ConvertPayload {
    pub fn new(document_id: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
        Self {
            document_id: document_id.into(),
            file_path: file_path.into(),
        }
    }

    /// Queue request keyed by the document id.
    pub fn to_request(&self) -> Result<JobRequest, JobError> {
        let payload =
            serde_json::to_value(self).map_err(|e| JobError::InvalidPayload(e.to_string()))?;
        Ok(JobRequest::new(job_types::DOCUMENT_CONVERT, payload).with_key(&self.document_id))
    }
}

/// Executor for document.convert jobs.
///
/// Runs the converter, stores the Markdown artifact and reports the outcome
/// to the backend exactly once. Webhook failures are logged and otherwise
/// ignored.
#[derive(Clone)]
pub struct ConversionExecutor {
    converter: Arc<dyn Converter>,
    store: Arc<dyn ConversionStore>,
    notifier: Arc<dyn Notifier>,
    timeout: Duration,
}

impl std::fmt::Debug for ConversionExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionExecutor")
            .field("converter", &self.converter.name())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ConversionExecutor {
    pub fn new(
        converter: Arc<dyn Converter>,
        store: Arc<dyn ConversionStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            converter,
            store,
            notifier,
            timeout: DEFAULT_CONVERSION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Convert one document and notify the backend. Returns the outcome that
    /// was sent, whether or not the webhook got through.
    pub async fn run(&self, payload: &ConvertPayload) -> JobOutcome {
        let document_id = payload.document_id.as_str();
        info!(
            document_id,
            converter = self.converter.name(),
            path = %payload.file_path.display(),
            "starting conversion"
        );

        let outcome = match self.convert_and_store(payload).await {
            Ok(output) => {
                info!(
                    document_id,
                    page_count = output.metadata.page_count,
                    "conversion completed"
                );
                JobOutcome::completed(output.markdown, output.metadata)
            }
            Err(e) => {
                error!(document_id, error = %e, "conversion failed");
                JobOutcome::failed(e.to_string())
            }
        };

        if let Err(e) = self.notifier.notify(document_id, &outcome).await {
            warn!(document_id, error = %e, "could not notify backend");
        }
        outcome
    }

    async fn convert_and_store(
        &self,
        payload: &ConvertPayload,
    ) -> Result<ConversionOutput, JobError> {
        let output = tokio::time::timeout(
            self.timeout,
            self.converter.convert(&payload.document_id, &payload.file_path),
        )
        .await
        .map_err(|_| JobError::ConversionTimeout(self.timeout))??;

        self.store.write(&payload.document_id, &output.markdown).await?;
        Ok(output)
    }
}

#[async_trait]
impl JobExecutor for ConversionExecutor {
    fn job_type(&self) -> &str {
        job_types::DOCUMENT_CONVERT
    }

    async fn execute(&self, payload: Value) -> Result<(), JobQueueError> {
        let parsed: ConvertPayload = serde_json::from_value(payload)
            .map_err(|e| JobQueueError::ExecutionFailed(format!("invalid payload: {}", e)))?;

        match self.run(&parsed).await {
            JobOutcome::Completed { .. } => Ok(()),
            JobOutcome::Failed { error } => Err(JobQueueError::ExecutionFailed(error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use docling_convert::{ConversionMetadata, ConvertError};
    use docling_notifier::NotifyError;
    use docling_store::{FsConversionStore, StoreError};
    use serde_json::json;
    use tokio::sync::Mutex;

    enum Script {
        Succeed(&'static str),
        Fail(&'static str),
        Hang,
    }

    struct ScriptedConverter(Script);

    #[async_trait]
    impl Converter for ScriptedConverter {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn convert(
            &self,
            _document_id: &str,
            _path: &Path,
        ) -> Result<ConversionOutput, ConvertError> {
            match &self.0 {
                Script::Succeed(markdown) => Ok(ConversionOutput {
                    markdown: markdown.to_string(),
                    metadata: ConversionMetadata {
                        page_count: 2,
                        language: "fr".into(),
                        extracted_at: chrono::Utc::now(),
                    },
                }),
                Script::Fail(message) => Err(ConvertError::Failure(message.to_string())),
                Script::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    unreachable!()
                }
            }
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        calls: Mutex<Vec<(String, JobOutcome)>>,
        reject: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, document_id: &str, outcome: &JobOutcome) -> Result<(), NotifyError> {
            self.calls
                .lock()
                .await
                .push((document_id.to_string(), outcome.clone()));
            if self.reject {
                return Err(NotifyError::Status {
                    status: 503,
                    body: String::new(),
                });
            }
            Ok(())
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl ConversionStore for BrokenStore {
        async fn write(&self, _document_id: &str, _content: &str) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("disk full")))
        }

        async fn read(&self, document_id: &str) -> Result<String, StoreError> {
            Err(StoreError::NotFound(document_id.to_string()))
        }

        async fn exists(&self, _document_id: &str) -> Result<bool, StoreError> {
            Ok(false)
        }
    }

    struct Harness {
        _dir: tempfile::TempDir,
        store: Arc<FsConversionStore>,
        notifier: Arc<RecordingNotifier>,
    }

    fn harness(reject_webhooks: bool) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FsConversionStore::open(dir.path().join("output")).unwrap());
        let notifier = Arc::new(RecordingNotifier {
            reject: reject_webhooks,
            ..Default::default()
        });
        Harness {
            _dir: dir,
            store,
            notifier,
        }
    }

    fn executor(h: &Harness, script: Script) -> ConversionExecutor {
        ConversionExecutor::new(
            Arc::new(ScriptedConverter(script)),
            h.store.clone(),
            h.notifier.clone(),
        )
    }

    fn payload(id: &str) -> Value {
        let path = format!("/app/input/{id}_report.pdf");
        serde_json::to_value(ConvertPayload::new(id, path)).unwrap()
    }

    #[tokio::test]
    async fn success_stores_artifact_then_notifies() {
        let h = harness(false);
        let exec = executor(&h, Script::Succeed("# Document doc1\n"));
        assert_eq!(exec.job_type(), "document.convert");

        exec.execute(payload("doc1")).await.expect("job succeeds");

        assert_eq!(h.store.read("doc1").await.unwrap(), "# Document doc1\n");
        let calls = h.notifier.calls.lock().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "doc1");
        match &calls[0].1 {
            JobOutcome::Completed {
                markdown_content,
                metadata,
            } => {
                assert_eq!(markdown_content, "# Document doc1\n");
                assert_eq!(metadata.page_count, 2);
            }
            other => panic!("expected completed outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn converter_failure_notifies_once_without_artifact() {
        let h = harness(false);
        let exec = executor(&h, Script::Fail("corrupt xref table"));

        let err = exec.execute(payload("doc2")).await.unwrap_err();
        assert!(err.to_string().contains("corrupt xref table"));

        assert!(!h.store.exists("doc2").await.unwrap());
        let calls = h.notifier.calls.lock().await;
        assert_eq!(calls.len(), 1);
        match &calls[0].1 {
            JobOutcome::Failed { error } => assert!(error.contains("corrupt xref table")),
            other => panic!("expected failed outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_conversion_times_out() {
        let h = harness(false);
        let exec = executor(&h, Script::Hang).with_timeout(Duration::from_millis(50));

        let outcome = exec.run(&ConvertPayload::new("doc3", "/tmp/doc3.pdf")).await;

        assert_eq!(outcome.status(), "failed");
        assert!(matches!(&outcome, JobOutcome::Failed { error } if error.contains("timed out")));
        assert!(!h.store.exists("doc3").await.unwrap());
        assert_eq!(h.notifier.calls.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn storage_failure_is_reported_as_failed() {
        let notifier = Arc::new(RecordingNotifier::default());
        let exec = ConversionExecutor::new(
            Arc::new(ScriptedConverter(Script::Succeed("# ok"))),
            Arc::new(BrokenStore),
            notifier.clone(),
        );

        let outcome = exec.run(&ConvertPayload::new("doc4", "/tmp/doc4.pdf")).await;

        assert!(matches!(&outcome, JobOutcome::Failed { error } if error.contains("disk full")));
        assert_eq!(notifier.calls.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn rejected_webhook_does_not_fail_the_job() {
        let h = harness(true);
        let exec = executor(&h, Script::Succeed("# fine"));

        exec.execute(payload("doc5")).await.expect("job still succeeds");

        assert!(h.store.exists("doc5").await.unwrap());
        assert_eq!(h.notifier.calls.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn malformed_payload_is_rejected_without_webhook() {
        let h = harness(false);
        let exec = executor(&h, Script::Succeed("# unused"));

        let err = exec.execute(json!({ "document": "x" })).await.unwrap_err();
        assert!(err.to_string().contains("invalid payload"));
        assert!(h.notifier.calls.lock().await.is_empty());
    }

    #[test]
    fn request_is_keyed_by_document() {
        let request = ConvertPayload::new("doc6", "/app/input/doc6_a.pdf")
            .to_request()
            .unwrap();
        assert_eq!(request.job_type, job_types::DOCUMENT_CONVERT);
        assert_eq!(request.key.as_deref(), Some("doc6"));
        assert_eq!(request.payload["file_path"], "/app/input/doc6_a.pdf");
    }
}
