//! Error types for the storage layer.

use thiserror::Error;

/// Errors that may occur while reading or writing stored files.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid document id: {0:?}")]
    InvalidKey(String),

    #[error("invalid filename: {0:?}")]
    InvalidFilename(String),

    #[error("artifact not found: {0}")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage task failed: {0}")]
    Join(String),
}

impl StoreError {
    /// Returns true if the error means the artifact simply does not exist yet.
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
