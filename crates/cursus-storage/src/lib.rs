//! Remote object store client.
//!
//! The upload pipeline talks to durable remote storage exclusively through
//! the [`RemoteStore`] trait. The production implementation is a Drive-style
//! HTTP provider ([`DriveStore`]); tests use [`MockRemoteStore`].

mod drive;
mod mock;
mod traits;
pub mod url;

pub use drive::DriveStore;
pub use mock::MockRemoteStore;
pub use traits::{ByteStream, ObjectMeta, ObjectRef, RemoteStore, StoreError, StoreResult};
