use async_trait::async_trait;
use bytes::Bytes;
use cursus_core::AppError;
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;

/// Byte stream fed to the provider. Producers surface local read problems as
/// `std::io::Error` items; the store maps them into a failed create.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static>>;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Object create failed: {0}")]
    CreateFailed(String),

    #[error("Permission update failed: {0}")]
    PermissionFailed(String),

    #[error("Object delete failed: {0}")]
    DeleteFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Provider(err.to_string())
    }
}

/// Metadata accompanying an object create.
#[derive(Debug, Clone)]
pub struct ObjectMeta {
    pub name: String,
    pub content_type: String,
    /// Declared size, when the caller knows it. Zero is a valid size.
    pub size_bytes: Option<u64>,
}

/// Reference to a live remote object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub id: String,
    pub view_url: String,
    pub folder_id: String,
}

/// Contract over the remote storage provider.
///
/// All network concerns (retries, timeouts) live behind this trait; a timeout
/// surfaces as the corresponding `StoreError` variant.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Create an object in `folder_id`, streaming `body` to the provider.
    async fn create_object(
        &self,
        meta: ObjectMeta,
        folder_id: &str,
        body: ByteStream,
    ) -> StoreResult<ObjectRef>;

    /// Make an object world-readable. Required before its view URL is handed
    /// to clients.
    async fn set_public_readable(&self, object_id: &str) -> StoreResult<()>;

    /// Delete an object. Deleting an id that no longer exists is not an
    /// error; callers rely on this for best-effort cleanup.
    async fn delete_object(&self, object_id: &str) -> StoreResult<()>;

    /// One-time startup check that a configured folder actually exists.
    /// Not on the per-upload hot path.
    async fn folder_exists(&self, folder_id: &str) -> StoreResult<bool>;
}
