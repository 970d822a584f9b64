use axum::{http::StatusCode, response::IntoResponse, Json};
use docling_job_queue::JobQueueError;
use docling_jobs::JobError;
use docling_store::StoreError;
use serde_json::json;
use thiserror::Error;

/// Top-level API error shared by all route handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
    #[error("job queue error: {0}")]
    JobQueue(#[from] JobQueueError),
    #[error("job error: {0}")]
    Job(#[from] JobError),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Storage(StoreError::InvalidKey(_) | StoreError::InvalidFilename(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::JobQueue(JobQueueError::Saturated | JobQueueError::Unavailable) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::JobQueue(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Job(JobError::InvalidPayload(_)) => StatusCode::BAD_REQUEST,
            ApiError::Job(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, %status, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
