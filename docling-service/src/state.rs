use std::sync::Arc;

use docling_job_queue::JobQueueClient;
use docling_store::{ConversionStore, InputStore};

/// Shared application state passed to every route handler.
#[derive(Clone)]
pub struct AppState {
    /// Where uploaded PDFs are written before their job is queued.
    pub inputs: Arc<dyn InputStore>,
    /// Converted Markdown, read back by the status endpoint.
    pub artifacts: Arc<dyn ConversionStore>,
    pub job_queue: JobQueueClient,
}

impl AppState {
    /// Build a fully initialised state container from its constituent parts.
    pub fn new(
        inputs: Arc<dyn InputStore>,
        artifacts: Arc<dyn ConversionStore>,
        job_queue: JobQueueClient,
    ) -> Self {
        Self {
            inputs,
            artifacts,
            job_queue,
        }
    }
}
