//! Service initialization: database, remote store, pipeline, router.

use crate::handlers;
use crate::state::AppState;
use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use cursus_core::{constants, AppError, Config};
use cursus_db::{DocumentRepository, LessonRepository, ProgressRepository};
use cursus_pipeline::{
    Janitor, JanitorHandle, MemoryPressure, NoopMemoryPressure, RssLogMemoryPressure, StagingArea,
    TransferEngine, UploadService,
};
use cursus_storage::{DriveStore, RemoteStore};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, Router, JanitorHandle)> {
    crate::error::set_production(config.is_production());

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections())
        .connect(config.database_url())
        .await
        .context("Failed to connect to database")?;

    cursus_db::MIGRATOR
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    let store: Arc<dyn RemoteStore> = Arc::new(
        DriveStore::new(
            config.drive_token().to_string(),
            config.drive_api_base().map(|s| s.to_string()),
        )
        .map_err(AppError::from)?,
    );

    validate_folders(&config, store.as_ref()).await?;

    let staging = StagingArea::new(config.staging_dir().clone()).await?;

    // Startup sweep is unconditional: a fresh process has nothing mid-flight.
    let janitor_handle = Janitor::with_defaults(config.staging_dir().clone())
        .start()
        .await;

    let state = build_state(config, pool, store, staging);
    let router = build_router(state.clone());

    Ok((state, router, janitor_handle))
}

/// One-time validation that both configured provider folders exist. A
/// missing folder is a fatal configuration error, caught before serving
/// traffic rather than on the first upload.
async fn validate_folders(config: &Config, store: &dyn RemoteStore) -> Result<()> {
    for (name, folder_id) in [
        ("video", config.video_folder_id()),
        ("document", config.document_folder_id()),
    ] {
        let exists = store
            .folder_exists(folder_id)
            .await
            .map_err(AppError::from)
            .with_context(|| format!("Failed to check {} folder", name))?;
        if !exists {
            anyhow::bail!(
                "Configured {} folder '{}' does not exist at the provider",
                name,
                folder_id
            );
        }
        tracing::info!(folder = %folder_id, kind = name, "Provider folder validated");
    }
    Ok(())
}

fn build_state(
    config: Config,
    pool: PgPool,
    store: Arc<dyn RemoteStore>,
    staging: StagingArea,
) -> Arc<AppState> {
    let lessons = LessonRepository::new(pool.clone());
    let documents = DocumentRepository::new(pool.clone());
    let progress = ProgressRepository::new(pool.clone());

    let memory: Arc<dyn MemoryPressure> = match RssLogMemoryPressure::new() {
        Some(rss) => Arc::new(rss),
        None => Arc::new(NoopMemoryPressure),
    };

    let engine = TransferEngine::new(store.clone(), memory);
    let upload = Arc::new(UploadService::new(
        engine,
        store,
        staging,
        Arc::new(lessons),
        Arc::new(documents.clone()),
        config.video_folder_id().to_string(),
        config.document_folder_id().to_string(),
    ));

    Arc::new(AppState {
        db_pool: pool,
        config,
        upload,
        documents,
        progress,
    })
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/v0/lessons/{lesson_id}/video",
            post(handlers::upload_lesson_video),
        )
        .route(
            "/api/v0/lessons/{lesson_id}/documents",
            post(handlers::upload_document).get(handlers::list_documents),
        )
        .route(
            "/api/v0/documents/{document_id}",
            delete(handlers::delete_document),
        )
        .route(
            "/api/v0/progress/{student_id}/{course_id}",
            get(handlers::get_progress).put(handlers::set_progress_percent),
        )
        .route(
            "/api/v0/progress/{student_id}/{course_id}/lessons/{lesson_id}",
            post(handlers::complete_lesson),
        )
        // The per-target ceilings are enforced during decode; this outer
        // limit only caps the whole request at the largest target plus
        // multipart framing slack.
        .layer(DefaultBodyLimit::max(
            constants::VIDEO_MAX_FILE_SIZE as usize + 1024 * 1024,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(config: &Config, router: Router) -> Result<()> {
    let addr = format!("{}:{}", config.server_host(), config.server_port());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(addr = %addr, environment = %config.environment(), "Server listening");

    axum::serve(listener, router)
        .await
        .context("Server error")?;

    Ok(())
}
