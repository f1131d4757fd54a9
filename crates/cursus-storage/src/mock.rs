//! In-memory `RemoteStore` implementation for tests.

use crate::traits::{ByteStream, ObjectMeta, ObjectRef, RemoteStore, StoreError, StoreResult};
use crate::url;
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Mock store that keeps objects in memory and can be told to fail any of
/// the three provider calls.
#[derive(Default)]
pub struct MockRemoteStore {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    public: Arc<Mutex<HashSet<String>>>,
    deleted: Arc<Mutex<Vec<String>>>,
    folders: Arc<Mutex<HashSet<String>>>,
    next_id: AtomicU64,
    stall_create: AtomicBool,
    fail_create: AtomicBool,
    fail_permission: AtomicBool,
    fail_delete: AtomicBool,
}

impl MockRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    /// Make `create_object` hang forever, like a provider that accepts the
    /// connection and then goes silent.
    pub fn set_stall_create(&self, stall: bool) {
        self.stall_create.store(stall, Ordering::SeqCst);
    }

    pub fn set_fail_permission(&self, fail: bool) {
        self.fail_permission.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    pub fn add_folder(&self, folder_id: &str) {
        self.folders.lock().unwrap().insert(folder_id.to_string());
    }

    pub fn has_object(&self, object_id: &str) -> bool {
        self.objects.lock().unwrap().contains_key(object_id)
    }

    pub fn object_data(&self, object_id: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(object_id).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn is_public(&self, object_id: &str) -> bool {
        self.public.lock().unwrap().contains(object_id)
    }

    /// Ids passed to `delete_object`, in call order, including ids that no
    /// longer existed.
    pub fn deleted_ids(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteStore for MockRemoteStore {
    async fn create_object(
        &self,
        _meta: ObjectMeta,
        folder_id: &str,
        mut body: ByteStream,
    ) -> StoreResult<ObjectRef> {
        if self.stall_create.load(Ordering::SeqCst) {
            futures::future::pending::<()>().await;
        }
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(StoreError::CreateFailed("injected create failure".to_string()));
        }

        let mut data = Vec::new();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| StoreError::CreateFailed(e.to_string()))?;
            data.extend_from_slice(&chunk);
        }

        let id = format!("obj-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.objects.lock().unwrap().insert(id.clone(), data);

        Ok(ObjectRef {
            view_url: url::view_url(&id),
            id,
            folder_id: folder_id.to_string(),
        })
    }

    async fn set_public_readable(&self, object_id: &str) -> StoreResult<()> {
        if self.fail_permission.load(Ordering::SeqCst) {
            return Err(StoreError::PermissionFailed(
                "injected permission failure".to_string(),
            ));
        }
        if !self.has_object(object_id) {
            return Err(StoreError::NotFound(object_id.to_string()));
        }
        self.public.lock().unwrap().insert(object_id.to_string());
        Ok(())
    }

    async fn delete_object(&self, object_id: &str) -> StoreResult<()> {
        self.deleted.lock().unwrap().push(object_id.to_string());
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(StoreError::DeleteFailed("injected delete failure".to_string()));
        }
        // Idempotent: removing a nonexistent id is still a success.
        self.objects.lock().unwrap().remove(object_id);
        self.public.lock().unwrap().remove(object_id);
        Ok(())
    }

    async fn folder_exists(&self, folder_id: &str) -> StoreResult<bool> {
        Ok(self.folders.lock().unwrap().contains(folder_id))
    }
}
