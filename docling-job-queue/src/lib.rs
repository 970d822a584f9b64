//! In-memory job queue with a bounded worker pool.
//!
//! Jobs are recorded as [`JobRun`]s, pushed onto a bounded channel and picked
//! up by a fixed number of workers. When the channel is full, enqueue fails
//! immediately with [`JobQueueError::Saturated`] instead of blocking the caller.
//!
//! # Architecture
//!
//! - [`JobQueueClient`] - The main interface for enqueuing and tracking jobs
//! - [`JobExecutor`] - Trait for implementing job handlers
//! - [`WorkerPoolConfig`] - Concurrency and queue depth of the pool
//! - [`JobRun`] - A record of a job execution
//!
//! # Example
//!
//! ```rust,no_run
//! use docling_job_queue::{JobExecutor, JobQueueClient, JobQueueError, JobRequest, WorkerPoolConfig};
//! use serde_json::json;
//! use async_trait::async_trait;
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl JobExecutor for Echo {
//!     fn job_type(&self) -> &str {
//!         "echo"
//!     }
//!
//!     async fn execute(&self, payload: serde_json::Value) -> Result<(), JobQueueError> {
//!         println!("{payload}");
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), JobQueueError> {
//!     let client = JobQueueClient::new();
//!     client.register_executor(Echo).await;
//!     let pool = client.start(WorkerPoolConfig::default()).await?;
//!
//!     let queued = client.enqueue(JobRequest::new("echo", json!({"hello": "world"}))).await?;
//!     println!("queued {}", queued.job_id);
//!
//!     client.shutdown().await;
//!     let _ = pool.await;
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod executor;
mod types;
mod worker;

pub use client::JobQueueClient;
pub use error::JobQueueError;
pub use executor::JobExecutor;
pub use types::{EnqueueResult, JobRequest, JobRun, JobStatus};
pub use worker::WorkerPoolConfig;

// Re-export async_trait for convenience when implementing JobExecutor
pub use async_trait::async_trait;
