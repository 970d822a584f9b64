//! Job execution errors.

use std::time::Duration;

use docling_convert::ConvertError;
use docling_store::StoreError;
use thiserror::Error;

/// Errors that may occur during job execution.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("conversion timed out after {}s", .0.as_secs())]
    ConversionTimeout(Duration),

    #[error(transparent)]
    Conversion(#[from] ConvertError),

    #[error("failed to store conversion result: {0}")]
    Storage(#[from] StoreError),
}
