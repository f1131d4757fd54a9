mod documents;
mod health;
mod lesson_video;
mod progress;

pub use documents::{delete_document, list_documents, upload_document};
pub use health::health;
pub use lesson_video::upload_lesson_video;
pub use progress::{complete_lesson, get_progress, set_progress_percent};
