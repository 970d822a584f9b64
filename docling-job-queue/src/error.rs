//! Error types for the job queue system.

use thiserror::Error;

/// Errors that may occur while interacting with the job queue.
#[derive(Debug, Error)]
pub enum JobQueueError {
    #[error("job queue is not running")]
    Unavailable,

    #[error("job queue is already running")]
    AlreadyStarted,

    #[error("job queue is full, try again later")]
    Saturated,

    #[error("no executor registered for job type {0}")]
    UnknownJobType(String),

    #[error("job execution failed: {0}")]
    ExecutionFailed(String),
}
