use cursus_core::Config;
use cursus_db::{DocumentRepository, ProgressRepository};
use cursus_pipeline::UploadService;
use sqlx::PgPool;
use std::sync::Arc;

/// Application state shared by all handlers.
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Config,
    pub upload: Arc<UploadService>,
    pub documents: DocumentRepository,
    pub progress: ProgressRepository,
}

#[allow(dead_code)]
fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    assert_send::<AppState>();
    assert_sync::<AppState>();
}
