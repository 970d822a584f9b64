//! Concrete job implementations for the docling service.
//!
//! This crate provides implementations of the [`JobExecutor`](docling_job_queue::JobExecutor)
//! trait for the job types the service schedules.
//!
//! # Job Types
//!
//! - `document.convert` - Convert an uploaded PDF to Markdown and notify the backend
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use docling_convert::SimulatedConverter;
//! use docling_job_queue::JobQueueClient;
//! use docling_jobs::{register_all_executors, ConversionExecutor};
//! use docling_notifier::WebhookNotifier;
//! use docling_store::FsConversionStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let executor = ConversionExecutor::new(
//!         Arc::new(SimulatedConverter::new(std::time::Duration::from_secs(5), "fr")),
//!         Arc::new(FsConversionStore::open("/app/output")?),
//!         Arc::new(WebhookNotifier::new("http://backend:3001")?),
//!     );
//!     let client = JobQueueClient::new();
//!     register_all_executors(&client, executor).await;
//!     Ok(())
//! }
//! ```

mod convert;
mod error;

pub use convert::{ConversionExecutor, ConvertPayload, DEFAULT_CONVERSION_TIMEOUT};
pub use error::JobError;

use docling_job_queue::JobQueueClient;

/// Register all available job executors with the job queue client.
pub async fn register_all_executors(client: &JobQueueClient, conversion: ConversionExecutor) {
    client.register_executor(conversion).await;
}

/// Job type constants for type-safe job references.
pub mod job_types {
    pub const DOCUMENT_CONVERT: &str = "document.convert";
}
