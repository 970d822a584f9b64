//! Conversion errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to read input {}: {source}", path.display())]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("conversion failed: {0}")]
    Failure(String),

    #[error("conversion task failed: {0}")]
    Join(String),
}
