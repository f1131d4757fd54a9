use async_trait::async_trait;
use cursus_core::models::Lesson;
use cursus_core::{AppError, LessonStore};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct LessonRepository {
    pool: PgPool,
}

impl LessonRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LessonStore for LessonRepository {
    async fn find_lesson(&self, id: Uuid) -> Result<Option<Lesson>, AppError> {
        let lesson = sqlx::query_as::<_, Lesson>(
            r#"
            SELECT id, module_id, title, description, video_url, "position", status,
                   created_at, updated_at
            FROM lessons
            WHERE id = $1 AND status = 'active'
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, lesson_id = %id, "Failed to fetch lesson");
            AppError::Database("Failed to fetch lesson".to_string())
        })?;

        Ok(lesson)
    }

    async fn update_video_url(&self, id: Uuid, url: Option<&str>) -> Result<Lesson, AppError> {
        let lesson = sqlx::query_as::<_, Lesson>(
            r#"
            UPDATE lessons
            SET video_url = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'active'
            RETURNING id, module_id, title, description, video_url, "position", status,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if matches!(e, sqlx::Error::RowNotFound) {
                AppError::NotFound(format!("Lesson {} not found", id))
            } else {
                tracing::error!(error = %e, lesson_id = %id, "Failed to update lesson video URL");
                AppError::Database("Failed to update lesson video URL".to_string())
            }
        })?;

        tracing::info!(lesson_id = %id, has_url = url.is_some(), "Lesson video URL updated");
        Ok(lesson)
    }
}
