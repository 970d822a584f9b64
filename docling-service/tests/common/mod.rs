#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use docling_convert::{async_trait, Converter};
use docling_job_queue::{JobQueueClient, WorkerPoolConfig};
use docling_jobs::{register_all_executors, ConversionExecutor};
use docling_notifier::{JobOutcome, Notifier, NotifyError};
use docling_service::state::AppState;
use docling_store::{FsConversionStore, FsInputStore};
use serde_json::Value;
use tokio::sync::Mutex;
use tower::ServiceExt;

pub const BOUNDARY: &str = "docling-test-boundary";

/// Notifier that only records what it was asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    pub calls: Mutex<Vec<(String, JobOutcome)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, document_id: &str, outcome: &JobOutcome) -> Result<(), NotifyError> {
        self.calls
            .lock()
            .await
            .push((document_id.to_string(), outcome.clone()));
        Ok(())
    }
}

/// A fully wired service with temp directories and a recording notifier.
pub struct TestApp {
    pub dir: tempfile::TempDir,
    pub state: Arc<AppState>,
    pub notifier: Arc<RecordingNotifier>,
    pub config: docling_config::Config,
}

impl TestApp {
    pub async fn start(converter: Arc<dyn Converter>, pool: WorkerPoolConfig) -> Self {
        Self::start_with(converter, pool, Arc::new(RecordingNotifier::default()), |_| {}).await
    }

    pub async fn start_with(
        converter: Arc<dyn Converter>,
        pool: WorkerPoolConfig,
        notifier: Arc<RecordingNotifier>,
        tweak: impl FnOnce(&mut docling_config::Config),
    ) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = docling_config::Config::default();
        config.storage.input_dir = dir.path().join("input").display().to_string();
        config.storage.output_dir = dir.path().join("output").display().to_string();
        tweak(&mut config);

        let inputs = Arc::new(FsInputStore::open(&config.storage.input_dir).expect("input store"));
        let artifacts =
            Arc::new(FsConversionStore::open(&config.storage.output_dir).expect("output store"));

        let job_queue = JobQueueClient::new();
        let executor = ConversionExecutor::new(converter, artifacts.clone(), notifier.clone())
            .with_timeout(Duration::from_secs(5));
        register_all_executors(&job_queue, executor).await;
        job_queue.start(pool).await.expect("start workers");

        let state = Arc::new(AppState::new(inputs, artifacts, job_queue));
        Self {
            dir,
            state,
            notifier,
            config,
        }
    }

    pub fn router(&self) -> Router {
        docling_service::build_router_with_config(self.state.clone(), &self.config)
    }

    pub fn input_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.storage.input_dir)
    }

    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.storage.output_dir)
    }

    pub async fn send(&self, req: Request<Body>) -> (u16, Value) {
        let res = self.router().oneshot(req).await.expect("router error");
        read_json(res).await
    }

    /// Wait until `count` webhooks have been recorded.
    pub async fn webhooks(&self, count: usize) -> Vec<(String, JobOutcome)> {
        for _ in 0..500 {
            {
                let calls = self.notifier.calls.lock().await;
                if calls.len() >= count {
                    return calls.clone();
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {count} webhooks");
    }

    pub fn input_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.input_dir())
            .expect("read input dir")
            .map(|e| e.expect("dir entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

pub fn default_pool() -> WorkerPoolConfig {
    WorkerPoolConfig {
        concurrency: 2,
        queue_capacity: 16,
    }
}

/// Hand-built multipart body with a single `file` part.
pub fn multipart_body(filename: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn convert_request(query: &str, filename: &str, bytes: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/convert{query}"))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(filename, bytes)))
        .expect("request")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub async fn read_json(res: Response<Body>) -> (u16, Value) {
    let status = res.status().as_u16();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}

/// Poll `/status/{id}` until the document reports `completed`.
pub async fn wait_until_completed(app: &TestApp, document_id: &str) -> Value {
    for _ in 0..500 {
        let (status, body) = app.send(get(&format!("/status/{document_id}"))).await;
        assert_eq!(status, 200);
        if body["status"] == "completed" {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("{document_id} never completed");
}
