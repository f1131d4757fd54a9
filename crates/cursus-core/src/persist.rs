//! Persistence contracts consumed by the upload pipeline.
//!
//! The pipeline only needs look-up-by-id and single-field-update capability;
//! full query surfaces live in `cursus-db` behind these traits.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Document, DocumentKind, Lesson};
use crate::AppError;

#[async_trait]
pub trait LessonStore: Send + Sync {
    async fn find_lesson(&self, id: Uuid) -> Result<Option<Lesson>, AppError>;

    /// Update the lesson's video URL. `None` clears it.
    async fn update_video_url(&self, id: Uuid, url: Option<&str>) -> Result<Lesson, AppError>;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create_document(
        &self,
        lesson_id: Uuid,
        title: &str,
        file_url: &str,
        kind: DocumentKind,
    ) -> Result<Document, AppError>;

    async fn find_document(&self, id: Uuid) -> Result<Option<Document>, AppError>;

    async fn delete_document(&self, id: Uuid) -> Result<(), AppError>;
}
