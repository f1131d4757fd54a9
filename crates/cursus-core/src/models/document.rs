use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::RecordStatus;

/// What kind of material a lesson document is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "document_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Lecture,
    Slides,
    Assignment,
    Image,
}

impl std::str::FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lecture" => Ok(DocumentKind::Lecture),
            "slides" => Ok(DocumentKind::Slides),
            "assignment" => Ok(DocumentKind::Assignment),
            "image" => Ok(DocumentKind::Image),
            other => Err(format!("Unknown document kind: {}", other)),
        }
    }
}

/// A lesson-scoped document (lecture notes, slides, etc.). `file_url` always
/// points at a live remote object; see the invariant on `Lesson::video_url`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Document {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub title: String,
    pub file_url: String,
    pub kind: DocumentKind,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
