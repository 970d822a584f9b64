//! Markdown artifact storage.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::error::StoreError;
use crate::key::validate_document_id;

/// File extension of stored artifacts.
pub const ARTIFACT_EXTENSION: &str = "md";

/// Keyed storage for completed conversions.
///
/// Writes must be atomic with respect to readers: a concurrent `read` either
/// sees the previous artifact, nothing, or the complete new one.
#[async_trait]
pub trait ConversionStore: Send + Sync {
    /// Persist the Markdown for `document_id`, replacing any previous artifact.
    async fn write(&self, document_id: &str, content: &str) -> Result<(), StoreError>;

    /// Read the artifact, or [`StoreError::NotFound`] if none exists.
    async fn read(&self, document_id: &str) -> Result<String, StoreError>;

    /// Whether an artifact exists for `document_id`.
    async fn exists(&self, document_id: &str) -> Result<bool, StoreError>;
}

/// [`ConversionStore`] backed by a local directory.
#[derive(Debug, Clone)]
pub struct FsConversionStore {
    output_dir: PathBuf,
}

impl FsConversionStore {
    /// Open the store, creating `output_dir` if needed.
    pub fn open<P: AsRef<Path>>(output_dir: P) -> Result<Self, StoreError> {
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Final location of the artifact for `document_id`.
    pub fn artifact_path(&self, document_id: &str) -> Result<PathBuf, StoreError> {
        validate_document_id(document_id)?;
        Ok(self
            .output_dir
            .join(format!("{document_id}.{ARTIFACT_EXTENSION}")))
    }
}

/// Write `content` to a temp file in `dir`, fsync it, then rename it over `dest`.
fn persist_atomically(dir: &Path, dest: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut tmp = tempfile::Builder::new()
        .prefix(".artifact-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl ConversionStore for FsConversionStore {
    async fn write(&self, document_id: &str, content: &str) -> Result<(), StoreError> {
        let dest = self.artifact_path(document_id)?;
        let dir = self.output_dir.clone();
        let bytes = content.as_bytes().to_vec();
        let target = dest.clone();

        tokio::task::spawn_blocking(move || persist_atomically(&dir, &target, &bytes))
            .await
            .map_err(|e| StoreError::Join(e.to_string()))??;

        debug!(document_id, path = %dest.display(), "artifact written");
        Ok(())
    }

    async fn read(&self, document_id: &str) -> Result<String, StoreError> {
        let path = self.artifact_path(document_id)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(document_id.to_string()))
            }
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn exists(&self, document_id: &str) -> Result<bool, StoreError> {
        let path = self.artifact_path(document_id)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }
}
