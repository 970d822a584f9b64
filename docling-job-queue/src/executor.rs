//! Job executor trait for implementing job handlers.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::JobQueueError;

/// Trait for implementing job executors.
///
/// Each job type has exactly one executor. The queue records the run as
/// completed when `execute` returns `Ok(())` and as failed with the error's
/// message otherwise.
#[async_trait]
pub trait JobExecutor: Send + Sync {
    /// Returns the job type this executor handles.
    fn job_type(&self) -> &str;

    /// Execute the job with the given payload.
    async fn execute(&self, payload: Value) -> Result<(), JobQueueError>;
}
