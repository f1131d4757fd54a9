use cursus_core::models::CourseProgress;
use cursus_core::AppError;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct ProgressRepository {
    pool: PgPool,
}

const SELECT_COLUMNS: &str =
    "id, student_id, course_id, percent_complete, completed_lesson_ids, created_at, updated_at";

impl ProgressRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch the progress record for a (student, course) pair, creating it
    /// lazily on first touch.
    pub async fn get_or_create(
        &self,
        student_id: Uuid,
        course_id: Uuid,
    ) -> Result<CourseProgress, AppError> {
        let progress = sqlx::query_as::<_, CourseProgress>(&format!(
            r#"
            INSERT INTO course_progress (student_id, course_id, percent_complete, completed_lesson_ids)
            VALUES ($1, $2, 0, '[]'::jsonb)
            ON CONFLICT (student_id, course_id)
            DO UPDATE SET student_id = EXCLUDED.student_id
            RETURNING {}
            "#,
            SELECT_COLUMNS
        ))
        .bind(student_id)
        .bind(course_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(
                error = %e,
                student_id = %student_id,
                course_id = %course_id,
                "Failed to get or create progress record"
            );
            AppError::Database("Failed to get or create progress record".to_string())
        })?;

        Ok(progress)
    }

    /// Set the completion percentage, clamped to [0, 100].
    pub async fn set_percent(
        &self,
        student_id: Uuid,
        course_id: Uuid,
        percent: i64,
    ) -> Result<CourseProgress, AppError> {
        // Ensure the record exists first (lazy creation on write).
        self.get_or_create(student_id, course_id).await?;

        let clamped = CourseProgress::clamp_percent(percent);
        let progress = sqlx::query_as::<_, CourseProgress>(&format!(
            r#"
            UPDATE course_progress
            SET percent_complete = $3, updated_at = NOW()
            WHERE student_id = $1 AND course_id = $2
            RETURNING {}
            "#,
            SELECT_COLUMNS
        ))
        .bind(student_id)
        .bind(course_id)
        .bind(clamped)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, student_id = %student_id, "Failed to update progress");
            AppError::Database("Failed to update progress".to_string())
        })?;

        Ok(progress)
    }

    /// Mark a lesson as completed. Idempotent: re-adding an id that is
    /// already in the set changes nothing. Runs read-modify-write inside a
    /// transaction with the row locked.
    pub async fn add_completed_lesson(
        &self,
        student_id: Uuid,
        course_id: Uuid,
        lesson_id: Uuid,
    ) -> Result<CourseProgress, AppError> {
        self.get_or_create(student_id, course_id).await?;

        let mut tx = self.pool.begin().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to begin progress transaction");
            AppError::Database("Failed to begin transaction".to_string())
        })?;

        let mut progress = sqlx::query_as::<_, CourseProgress>(&format!(
            r#"
            SELECT {}
            FROM course_progress
            WHERE student_id = $1 AND course_id = $2
            FOR UPDATE
            "#,
            SELECT_COLUMNS
        ))
        .bind(student_id)
        .bind(course_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, student_id = %student_id, "Failed to lock progress row");
            AppError::Database("Failed to lock progress row".to_string())
        })?;

        if progress.add_completed_lesson(lesson_id) {
            let ids = serde_json::to_value(&progress.completed_lesson_ids)
                .map_err(|e| AppError::Internal(format!("Failed to encode lesson ids: {}", e)))?;

            progress = sqlx::query_as::<_, CourseProgress>(&format!(
                r#"
                UPDATE course_progress
                SET completed_lesson_ids = $3, updated_at = NOW()
                WHERE student_id = $1 AND course_id = $2
                RETURNING {}
                "#,
                SELECT_COLUMNS
            ))
            .bind(student_id)
            .bind(course_id)
            .bind(&ids)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, student_id = %student_id, "Failed to store lesson ids");
                AppError::Database("Failed to store completed lessons".to_string())
            })?;
        }

        tx.commit().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to commit progress transaction");
            AppError::Database("Failed to commit transaction".to_string())
        })?;

        Ok(progress)
    }
}
