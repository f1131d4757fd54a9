use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use cursus_core::models::Lesson;
use cursus_core::AppError;
use cursus_pipeline::UploadTarget;
use std::sync::Arc;
use uuid::Uuid;

/// Upload or replace a lesson's video.
///
/// The file field is streamed straight from the request body into the
/// staging area; the payload is never held in memory. MIME type and
/// extension are validated from the field headers before the first byte
/// hits disk.
pub async fn upload_lesson_video(
    State(state): State<Arc<AppState>>,
    Path(lesson_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<Lesson>, HttpAppError> {
    let target = UploadTarget::LessonVideo;

    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Failed to read multipart: {}", e)))?;

        let Some(field) = field else {
            return Err(AppError::InvalidInput("No file field provided".to_string()).into());
        };
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::InvalidInput("File field has no filename".to_string()))?;
        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        // Reject before any disk write.
        target.validate(&original_name, &content_type)?;

        let staged = state
            .upload
            .staging()
            .stage_stream(
                &original_name,
                &content_type,
                target.max_file_size(),
                Box::pin(field),
            )
            .await?;

        let lesson = state.upload.attach_lesson_video(lesson_id, staged).await?;
        return Ok(Json(lesson));
    }
}
