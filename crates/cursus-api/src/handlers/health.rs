use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{extract::State, Json};
use cursus_core::AppError;
use std::sync::Arc;

pub async fn health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, HttpAppError> {
    sqlx::query("SELECT 1")
        .execute(&state.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Health check failed: {}", e)))?;

    Ok(Json(serde_json::json!({
        "status": "ok",
        "environment": state.config.environment(),
    })))
}
