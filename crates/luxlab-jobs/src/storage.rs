//! Where finished workbooks are kept and served from.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::StorageError;

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Stores `bytes` under `filename`, replacing any previous artifact.
    async fn put(&self, filename: &str, bytes: &[u8]) -> Result<(), StorageError>;

    async fn get(&self, filename: &str) -> Result<Vec<u8>, StorageError>;
}

/// Rejects anything that is not a plain file name.
///
/// # Errors
///
/// [`StorageError::InvalidFilename`] for empty or hidden names, path
/// separators, `..` sequences and control characters.
pub fn validate_filename(filename: &str) -> Result<(), StorageError> {
    let bad = filename.is_empty()
        || filename.starts_with('.')
        || filename.contains(['/', '\\'])
        || filename.contains("..")
        || filename.chars().any(char::is_control);
    if bad {
        return Err(StorageError::InvalidFilename(filename.to_owned()));
    }
    Ok(())
}

/// Artifacts as files in one directory.
///
/// Writes go to a hidden temporary file first and are renamed into place,
/// so a reader never observes a partially written workbook.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, filename: &str) -> Result<PathBuf, StorageError> {
        validate_filename(filename)?;
        Ok(self.root.join(filename))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn put(&self, filename: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let target = self.path_for(filename)?;
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| io_error(&self.root, e))?;

        let staging = self.root.join(format!(".{filename}.partial"));
        tokio::fs::write(&staging, bytes)
            .await
            .map_err(|e| io_error(&staging, e))?;
        if let Err(e) = tokio::fs::rename(&staging, &target).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(io_error(&target, e));
        }

        tracing::info!(path = %target.display(), bytes = bytes.len(), "artifact stored");
        Ok(())
    }

    async fn get(&self, filename: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(filename)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(filename.to_owned()))
            }
            Err(e) => Err(io_error(&path, e)),
        }
    }
}
