//! Cursus core: shared models, error taxonomy and configuration for the
//! course media pipeline.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod persist;

pub use config::Config;
pub use error::{AppError, LogLevel};
pub use persist::{DocumentStore, LessonStore};
