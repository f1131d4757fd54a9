mod document;
mod lesson;
mod progress;

pub use document::DocumentRepository;
pub use lesson::LessonRepository;
pub use progress::ProgressRepository;
