//! Upload lifecycle manager.
//!
//! Binds transferred remote objects to domain records. The ordering rules
//! here are deliberate and asymmetric:
//!
//! - Replace: the old remote object is deleted only *after* the new URL is
//!   durably persisted, so the record never points at nothing. A failed
//!   old-object delete leaks a remote object (logged) but the operation
//!   still succeeds.
//! - Record deletion: the remote object is deleted *first*, but a remote
//!   failure never blocks removal of the local record. A record lingering
//!   in a deleted-but-linked state is worse than a leaked remote object.

use crate::staging::{StagedFile, StagingArea};
use crate::transfer::TransferEngine;
use cursus_core::models::{Document, DocumentKind, Lesson};
use cursus_core::{constants, AppError, DocumentStore, LessonStore};
use cursus_storage::{url, RemoteStore};
use std::sync::Arc;
use uuid::Uuid;

/// What an upload attaches to. Determines the provider folder, the size
/// ceiling and the MIME/extension allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadTarget {
    LessonVideo,
    LessonDocument,
}

impl UploadTarget {
    pub fn max_file_size(&self) -> u64 {
        match self {
            UploadTarget::LessonVideo => constants::VIDEO_MAX_FILE_SIZE,
            UploadTarget::LessonDocument => constants::DOCUMENT_MAX_FILE_SIZE,
        }
    }

    pub fn allowed_content_types(&self) -> &'static [&'static str] {
        match self {
            UploadTarget::LessonVideo => constants::VIDEO_ALLOWED_CONTENT_TYPES,
            UploadTarget::LessonDocument => constants::DOCUMENT_ALLOWED_CONTENT_TYPES,
        }
    }

    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            UploadTarget::LessonVideo => constants::VIDEO_ALLOWED_EXTENSIONS,
            UploadTarget::LessonDocument => constants::DOCUMENT_ALLOWED_EXTENSIONS,
        }
    }

    /// Validate declared name and MIME type. Called before any disk write;
    /// a rejected payload never touches the staging area.
    pub fn validate(&self, original_name: &str, content_type: &str) -> Result<(), AppError> {
        let content_type = content_type.to_lowercase();
        if !self
            .allowed_content_types()
            .iter()
            .any(|allowed| content_type == *allowed)
        {
            return Err(AppError::InvalidInput(format!(
                "Invalid content type '{}'. Allowed types: {}",
                content_type,
                self.allowed_content_types().join(", ")
            )));
        }

        let extension = std::path::Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if !self.allowed_extensions().contains(&extension.as_str()) {
            return Err(AppError::InvalidInput(format!(
                "Invalid file extension '{}'. Allowed extensions: {}",
                extension,
                self.allowed_extensions().join(", ")
            )));
        }

        Ok(())
    }
}

/// Orchestrates stage → transfer → link → clean up for every upload target.
pub struct UploadService {
    engine: TransferEngine,
    store: Arc<dyn RemoteStore>,
    staging: StagingArea,
    lessons: Arc<dyn LessonStore>,
    documents: Arc<dyn DocumentStore>,
    video_folder_id: String,
    document_folder_id: String,
}

impl UploadService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        engine: TransferEngine,
        store: Arc<dyn RemoteStore>,
        staging: StagingArea,
        lessons: Arc<dyn LessonStore>,
        documents: Arc<dyn DocumentStore>,
        video_folder_id: String,
        document_folder_id: String,
    ) -> Self {
        Self {
            engine,
            store,
            staging,
            lessons,
            documents,
            video_folder_id,
            document_folder_id,
        }
    }

    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    /// Attach a staged video to a lesson, replacing any previous one.
    ///
    /// Create path: transfer, then persist the URL. Replace path: same, then
    /// delete the old remote object once the new URL is durable.
    pub async fn attach_lesson_video(
        &self,
        lesson_id: Uuid,
        staged: StagedFile,
    ) -> Result<Lesson, AppError> {
        let lesson = match self.lessons.find_lesson(lesson_id).await {
            Ok(Some(lesson)) => lesson,
            Ok(None) => {
                self.staging.discard(&staged).await;
                return Err(AppError::NotFound(format!("Lesson {} not found", lesson_id)));
            }
            Err(e) => {
                self.staging.discard(&staged).await;
                return Err(e);
            }
        };
        let previous_url = lesson.video_url.clone();

        let object = self
            .engine
            .transfer(&self.staging, staged, &self.video_folder_id)
            .await?;

        let updated = match self
            .lessons
            .update_video_url(lesson_id, Some(&object.view_url))
            .await
        {
            Ok(updated) => updated,
            Err(e) => {
                // The record is unchanged; don't leave the new object
                // orphaned at the provider.
                if let Err(cleanup_err) = self.store.delete_object(&object.id).await {
                    tracing::warn!(
                        error = %cleanup_err,
                        object_id = %object.id,
                        "Failed to delete remote object after persist failure"
                    );
                }
                return Err(e);
            }
        };

        if let Some(old_url) = previous_url {
            self.delete_remote_if_ours(&old_url, "replaced lesson video").await;
        }

        tracing::info!(
            lesson_id = %lesson_id,
            object_id = %object.id,
            "Lesson video attached"
        );
        Ok(updated)
    }

    /// Create a lesson-scoped document from a staged file.
    pub async fn create_document(
        &self,
        lesson_id: Uuid,
        title: &str,
        kind: DocumentKind,
        staged: StagedFile,
    ) -> Result<Document, AppError> {
        match self.lessons.find_lesson(lesson_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                self.staging.discard(&staged).await;
                return Err(AppError::NotFound(format!("Lesson {} not found", lesson_id)));
            }
            Err(e) => {
                self.staging.discard(&staged).await;
                return Err(e);
            }
        }

        let object = self
            .engine
            .transfer(&self.staging, staged, &self.document_folder_id)
            .await?;

        match self
            .documents
            .create_document(lesson_id, title, &object.view_url, kind)
            .await
        {
            Ok(document) => {
                tracing::info!(
                    document_id = %document.id,
                    lesson_id = %lesson_id,
                    object_id = %object.id,
                    "Document created"
                );
                Ok(document)
            }
            Err(e) => {
                if let Err(cleanup_err) = self.store.delete_object(&object.id).await {
                    tracing::warn!(
                        error = %cleanup_err,
                        object_id = %object.id,
                        "Failed to delete remote object after persist failure"
                    );
                }
                Err(e)
            }
        }
    }

    /// Remove a document record and its remote object.
    ///
    /// Remote first, but local deletion always proceeds: local consistency
    /// takes priority over remote tidiness.
    pub async fn delete_document(&self, document_id: Uuid) -> Result<(), AppError> {
        let document = self
            .documents
            .find_document(document_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", document_id)))?;

        self.delete_remote_if_ours(&document.file_url, "deleted document").await;

        self.documents.delete_document(document_id).await?;
        tracing::info!(document_id = %document_id, "Document deleted");
        Ok(())
    }

    /// Best-effort delete of a remote object referenced by `record_url`,
    /// skipped entirely for URLs that don't belong to the provider.
    async fn delete_remote_if_ours(&self, record_url: &str, context: &str) {
        if !url::is_provider_url(record_url) {
            return;
        }
        let Some(object_id) = url::object_id_from_url(record_url) else {
            tracing::warn!(url = %record_url, "Provider URL with unresolvable object id");
            return;
        };
        if let Err(e) = self.store.delete_object(&object_id).await {
            tracing::warn!(
                error = %e,
                object_id = %object_id,
                context = context,
                "Failed to delete remote object; leaking it"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_target_accepts_only_mp4() {
        let target = UploadTarget::LessonVideo;
        assert!(target.validate("clip.mp4", "video/mp4").is_ok());
        assert!(target.validate("clip.mp4", "Video/MP4").is_ok());
        assert!(target.validate("clip.avi", "video/x-msvideo").is_err());
        assert!(target.validate("clip.mp4", "video/webm").is_err());
        // Extension must match even when the MIME type is allowed.
        assert!(target.validate("clip.mov", "video/mp4").is_err());
    }

    #[test]
    fn document_target_accepts_allow_listed_types() {
        let target = UploadTarget::LessonDocument;
        assert!(target.validate("notes.pdf", "application/pdf").is_ok());
        assert!(target.validate("photo.png", "image/png").is_ok());
        assert!(target
            .validate(
                "slides.pptx",
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            )
            .is_ok());
        assert!(target.validate("archive.zip", "application/zip").is_err());
        assert!(target.validate("script.sh", "text/x-shellscript").is_err());
    }

    #[test]
    fn ceilings_differ_by_target() {
        assert!(UploadTarget::LessonVideo.max_file_size() > UploadTarget::LessonDocument.max_file_size());
    }
}
