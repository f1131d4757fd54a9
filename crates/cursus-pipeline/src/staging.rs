//! Temp staging area.
//!
//! Uploaded bytes are written here during HTTP body decode and held until
//! the transfer to remote storage completes or fails. Files in this
//! directory are transient by design and never referenced from outside the
//! pipeline.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use cursus_core::AppError;
use futures::{Stream, StreamExt};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// A locally held copy of an uploaded file's bytes.
///
/// Owned exclusively by the staging area between decode-complete and
/// transfer-complete (or transfer-failed). Dropping the handle removes the
/// file, so an upload future that is cancelled mid-transfer (client
/// disconnect drops the handler) cannot leak its staged bytes.
#[derive(Debug)]
pub struct StagedFile {
    pub path: PathBuf,
    pub original_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        // Explicit discard already removed the file on the happy paths;
        // a NotFound here is the normal case, not a failure.
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    error = %e,
                    path = %self.path.display(),
                    "Failed to delete staged file on drop"
                );
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("bin")
        .to_lowercase()
}

impl StagingArea {
    /// Open a staging area, creating the directory if needed.
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await.map_err(|e| {
            AppError::Configuration(format!(
                "Cannot create staging directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stream an inbound byte stream to a uniquely named staged file.
    ///
    /// `max_bytes` is enforced during the write: the first chunk that pushes
    /// the total over the ceiling aborts the decode, removes the partial
    /// file and returns `PayloadTooLarge`. A stream error (including a
    /// client aborting the request mid-body) likewise removes the partial
    /// file — nothing leaks on any path out of this function.
    pub async fn stage_stream<S, E>(
        &self,
        original_name: &str,
        content_type: &str,
        max_bytes: u64,
        mut stream: S,
    ) -> Result<StagedFile, AppError>
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: std::fmt::Display,
    {
        let path = self
            .dir
            .join(format!("{}.{}", Uuid::new_v4(), extension_of(original_name)));

        let mut file = fs::File::create(&path).await?;
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    self.remove_partial(&path).await;
                    return Err(AppError::LocalIo(format!("Upload stream aborted: {}", e)));
                }
            };

            written += chunk.len() as u64;
            if written > max_bytes {
                self.remove_partial(&path).await;
                return Err(AppError::PayloadTooLarge(format!(
                    "Payload exceeds maximum allowed size of {} MB",
                    max_bytes / 1024 / 1024
                )));
            }

            if let Err(e) = file.write_all(&chunk).await {
                self.remove_partial(&path).await;
                return Err(e.into());
            }
        }

        if let Err(e) = file.flush().await {
            self.remove_partial(&path).await;
            return Err(e.into());
        }
        drop(file);

        tracing::debug!(
            path = %path.display(),
            size_bytes = written,
            content_type = %content_type,
            "File staged"
        );

        Ok(StagedFile {
            path,
            original_name: original_name.to_string(),
            content_type: content_type.to_string(),
            size_bytes: written,
            created_at: Utc::now(),
        })
    }

    /// Best-effort deletion of a staged file. A failure here is logged and
    /// swallowed so it can never mask the error that led to the discard.
    pub async fn discard(&self, staged: &StagedFile) {
        if let Err(e) = fs::remove_file(&staged.path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    error = %e,
                    path = %staged.path.display(),
                    "Failed to delete staged file"
                );
            }
        }
    }

    async fn remove_partial(&self, path: &Path) {
        if let Err(e) = fs::remove_file(path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    error = %e,
                    path = %path.display(),
                    "Failed to delete partial staged file"
                );
            }
        }
    }
}
