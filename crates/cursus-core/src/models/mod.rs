//! Domain models shared across crates.

mod document;
mod lesson;
mod progress;

pub use document::{Document, DocumentKind};
pub use lesson::Lesson;
pub use progress::CourseProgress;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a domain record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "record_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Active,
    Inactive,
}
