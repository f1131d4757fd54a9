//! Media ingestion pipeline: stage → transfer → link → clean up.
//!
//! Uploads land on local disk first (staging), stream to the remote store in
//! bounded chunks (transfer), get bound to a domain record (lifecycle), and
//! abandoned temp files are reclaimed by a background sweep (janitor).

pub mod janitor;
pub mod lifecycle;
pub mod memory;
pub mod staging;
pub mod transfer;

pub use janitor::{Janitor, JanitorHandle};
pub use lifecycle::{UploadService, UploadTarget};
pub use memory::{MemoryPressure, NoopMemoryPressure, RssLogMemoryPressure};
pub use staging::{StagedFile, StagingArea};
pub use transfer::TransferEngine;
