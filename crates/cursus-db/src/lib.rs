//! Database layer: Postgres repositories for lessons, documents and
//! student progress.

pub mod db;

pub use db::{DocumentRepository, LessonRepository, ProgressRepository};

/// Embedded migrations, applied at startup.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();
