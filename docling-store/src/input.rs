//! Storage for uploaded input files.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::key::{sanitize_filename, validate_document_id};

/// Durable location for uploaded documents awaiting conversion.
#[async_trait]
pub trait InputStore: Send + Sync {
    /// Persist `bytes` for `document_id` and return the stored path.
    ///
    /// The returned path is fully written and synced, so a job started after
    /// this call returns always sees the complete upload.
    async fn save_input(
        &self,
        document_id: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, StoreError>;

    /// Remove a previously saved input. Missing files are not an error.
    async fn remove_input(&self, path: &Path) -> Result<(), StoreError>;
}

/// [`InputStore`] backed by a local directory.
#[derive(Debug, Clone)]
pub struct FsInputStore {
    input_dir: PathBuf,
}

impl FsInputStore {
    /// Open the store, creating `input_dir` if needed.
    pub fn open<P: AsRef<Path>>(input_dir: P) -> Result<Self, StoreError> {
        let input_dir = input_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&input_dir)?;
        Ok(Self { input_dir })
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    /// Location an upload of `filename` for `document_id` is stored at.
    pub fn input_path(&self, document_id: &str, filename: &str) -> Result<PathBuf, StoreError> {
        validate_document_id(document_id)?;
        let name = sanitize_filename(filename)?;
        Ok(self.input_dir.join(format!("{document_id}_{name}")))
    }
}

#[async_trait]
impl InputStore for FsInputStore {
    async fn save_input(
        &self,
        document_id: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, StoreError> {
        let path = self.input_path(document_id, filename)?;

        let mut file = tokio::fs::File::create(&path).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;

        debug!(
            document_id,
            path = %path.display(),
            size = bytes.len(),
            "input file stored"
        );
        Ok(path)
    }

    async fn remove_input(&self, path: &Path) -> Result<(), StoreError> {
        if !path.starts_with(&self.input_dir) {
            warn!(path = %path.display(), "refusing to remove file outside the input directory");
            return Err(StoreError::InvalidFilename(path.display().to_string()));
        }
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_input_uses_id_and_filename() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsInputStore::open(dir.path()).unwrap();

        let path = store
            .save_input("doc1", "report.pdf", b"%PDF-1.4")
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("doc1_report.pdf"));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4");
    }

    #[tokio::test]
    async fn save_input_strips_client_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsInputStore::open(dir.path()).unwrap();

        let path = store
            .save_input("doc2", "../../secret/report.pdf", b"x")
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("doc2_report.pdf"));
    }

    #[tokio::test]
    async fn remove_input_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsInputStore::open(dir.path()).unwrap();
        let path = store.save_input("doc3", "a.pdf", b"x").await.unwrap();

        store.remove_input(&path).await.unwrap();
        assert!(!path.exists());
        store.remove_input(&path).await.unwrap();
    }

    #[tokio::test]
    async fn remove_input_outside_directory_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let other = tempfile::NamedTempFile::new().unwrap();
        let store = FsInputStore::open(dir.path()).unwrap();

        assert!(store.remove_input(other.path()).await.is_err());
        assert!(other.path().exists());
    }
}
