use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use cursus_core::models::CourseProgress;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SetPercentRequest {
    pub percent_complete: i64,
}

/// Fetch progress for a (student, course) pair, creating the record lazily
/// on first read.
pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    Path((student_id, course_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<CourseProgress>, HttpAppError> {
    let progress = state.progress.get_or_create(student_id, course_id).await?;
    Ok(Json(progress))
}

/// Set the completion percentage. Out-of-range values are clamped to
/// [0, 100], never rejected.
pub async fn set_progress_percent(
    State(state): State<Arc<AppState>>,
    Path((student_id, course_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<SetPercentRequest>,
) -> Result<Json<CourseProgress>, HttpAppError> {
    let progress = state
        .progress
        .set_percent(student_id, course_id, body.percent_complete)
        .await?;
    Ok(Json(progress))
}

/// Mark a lesson completed. Idempotent: repeating the call for the same
/// lesson leaves the set unchanged.
pub async fn complete_lesson(
    State(state): State<Arc<AppState>>,
    Path((student_id, course_id, lesson_id)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<Json<CourseProgress>, HttpAppError> {
    let progress = state
        .progress
        .add_completed_lesson(student_id, course_id, lesson_id)
        .await?;
    Ok(Json(progress))
}
