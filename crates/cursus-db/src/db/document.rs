use async_trait::async_trait;
use cursus_core::models::{Document, DocumentKind};
use cursus_core::{AppError, DocumentStore};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct DocumentRepository {
    pool: PgPool,
}

impl DocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Documents attached to a lesson, newest first.
    pub async fn list_for_lesson(&self, lesson_id: Uuid) -> Result<Vec<Document>, AppError> {
        let documents = sqlx::query_as::<_, Document>(
            r#"
            SELECT id, lesson_id, title, file_url, kind, status, created_at, updated_at
            FROM documents
            WHERE lesson_id = $1 AND status = 'active'
            ORDER BY created_at DESC
            "#,
        )
        .bind(lesson_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, lesson_id = %lesson_id, "Failed to list documents");
            AppError::Database("Failed to list documents".to_string())
        })?;

        Ok(documents)
    }
}

#[async_trait]
impl DocumentStore for DocumentRepository {
    async fn create_document(
        &self,
        lesson_id: Uuid,
        title: &str,
        file_url: &str,
        kind: DocumentKind,
    ) -> Result<Document, AppError> {
        let document = sqlx::query_as::<_, Document>(
            r#"
            INSERT INTO documents (lesson_id, title, file_url, kind, status)
            VALUES ($1, $2, $3, $4, 'active')
            RETURNING id, lesson_id, title, file_url, kind, status, created_at, updated_at
            "#,
        )
        .bind(lesson_id)
        .bind(title)
        .bind(file_url)
        .bind(kind)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, lesson_id = %lesson_id, "Failed to create document");
            AppError::Database("Failed to create document".to_string())
        })?;

        tracing::info!(document_id = %document.id, lesson_id = %lesson_id, "Document created");
        Ok(document)
    }

    async fn find_document(&self, id: Uuid) -> Result<Option<Document>, AppError> {
        let document = sqlx::query_as::<_, Document>(
            r#"
            SELECT id, lesson_id, title, file_url, kind, status, created_at, updated_at
            FROM documents
            WHERE id = $1 AND status = 'active'
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, document_id = %id, "Failed to fetch document");
            AppError::Database("Failed to fetch document".to_string())
        })?;

        Ok(document)
    }

    async fn delete_document(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, document_id = %id, "Failed to delete document");
                AppError::Database("Failed to delete document".to_string())
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Document {} not found", id)));
        }

        tracing::info!(document_id = %id, "Document record deleted");
        Ok(())
    }
}
