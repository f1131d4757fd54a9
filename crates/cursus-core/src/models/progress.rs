use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-student progress through a course.
///
/// Created lazily on first read or write for a (student, course) pair.
/// `percent_complete` is clamped to [0, 100] on every write and
/// `completed_lesson_ids` behaves as a set: inserting an id that is already
/// present is a no-op.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CourseProgress {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub percent_complete: i32,
    #[sqlx(json)]
    pub completed_lesson_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CourseProgress {
    /// Clamp an arbitrary percentage into the valid [0, 100] range.
    pub fn clamp_percent(value: i64) -> i32 {
        value.clamp(0, 100) as i32
    }

    /// Record a completed lesson. Returns `false` when the id was already
    /// present (idempotent insert).
    pub fn add_completed_lesson(&mut self, lesson_id: Uuid) -> bool {
        if self.completed_lesson_ids.contains(&lesson_id) {
            return false;
        }
        self.completed_lesson_ids.push(lesson_id);
        true
    }

    /// Apply a percentage delta, clamping the result.
    pub fn increment_percent(&mut self, delta: i64) {
        self.percent_complete = Self::clamp_percent(self.percent_complete as i64 + delta);
    }
}
