use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use cursus_core::models::{Document, DocumentKind};
use cursus_core::AppError;
use cursus_pipeline::{StagedFile, UploadTarget};
use std::sync::Arc;
use uuid::Uuid;

/// Upload a new lesson document.
///
/// Expects multipart fields `title`, `kind` and `file`. The text fields may
/// appear in any order relative to the file; if they turn out to be missing
/// once the body is exhausted, the already-staged file is discarded.
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    Path(lesson_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<Document>, HttpAppError> {
    let target = UploadTarget::LessonDocument;

    let mut title: Option<String> = None;
    let mut kind: Option<DocumentKind> = None;
    let mut staged: Option<StagedFile> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                if let Some(staged) = &staged {
                    state.upload.staging().discard(staged).await;
                }
                return Err(
                    AppError::InvalidInput(format!("Failed to read multipart: {}", e)).into(),
                );
            }
        };

        match field.name() {
            Some("title") => {
                title = Some(read_text_field(&state, field, &staged).await?);
            }
            Some("kind") => {
                let raw = read_text_field(&state, field, &staged).await?;
                match raw.parse::<DocumentKind>() {
                    Ok(parsed) => kind = Some(parsed),
                    Err(e) => {
                        if let Some(staged) = &staged {
                            state.upload.staging().discard(staged).await;
                        }
                        return Err(AppError::InvalidInput(e).into());
                    }
                }
            }
            Some("file") => match stage_file_field(&state, target, field).await {
                Ok(new_staged) => {
                    // A duplicate file field replaces the first; don't leak
                    // the earlier staged copy.
                    if let Some(previous) = staged.replace(new_staged) {
                        state.upload.staging().discard(&previous).await;
                    }
                }
                Err(e) => {
                    if let Some(staged) = &staged {
                        state.upload.staging().discard(staged).await;
                    }
                    return Err(e);
                }
            },
            _ => continue,
        }
    }

    let staged = staged
        .ok_or_else(|| AppError::InvalidInput("No file field provided".to_string()))?;

    let Some(title) = title else {
        state.upload.staging().discard(&staged).await;
        return Err(AppError::InvalidInput("Missing required field: title".to_string()).into());
    };
    let kind = kind.unwrap_or(DocumentKind::Lecture);

    let document = state
        .upload
        .create_document(lesson_id, &title, kind, staged)
        .await?;
    Ok(Json(document))
}

async fn stage_file_field(
    state: &Arc<AppState>,
    target: UploadTarget,
    field: axum::extract::multipart::Field<'_>,
) -> Result<StagedFile, HttpAppError> {
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
    Ok(staged)
}

async fn read_text_field(
    state: &Arc<AppState>,
    field: axum::extract::multipart::Field<'_>,
    staged: &Option<StagedFile>,
) -> Result<String, HttpAppError> {
    match field.text().await {
        Ok(text) => Ok(text),
        Err(e) => {
            if let Some(staged) = staged {
                state.upload.staging().discard(staged).await;
            }
            Err(AppError::InvalidInput(format!("Failed to read field: {}", e)).into())
        }
    }
}

pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    Path(lesson_id): Path<Uuid>,
) -> Result<Json<Vec<Document>>, HttpAppError> {
    let documents = state.documents.list_for_lesson(lesson_id).await?;
    Ok(Json(documents))
}

/// Remove a document record and its remote object. The record goes away
/// even when the provider-side delete fails.
pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<Uuid>,
) -> Result<StatusCode, HttpAppError> {
    state.upload.delete_document(document_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
