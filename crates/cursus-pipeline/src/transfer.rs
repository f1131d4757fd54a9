//! Streaming transfer engine.
//!
//! Pumps bytes from a staged file to the remote store in fixed-size chunks
//! through a bounded channel: when the network consumer falls behind, the
//! channel fills and the file reader suspends instead of buffering more.
//! Resident memory is therefore bounded by `CHUNK_SIZE * (CHANNEL_CAPACITY + 1)`
//! regardless of file size.

use crate::memory::MemoryPressure;
use crate::staging::{StagedFile, StagingArea};
use bytes::Bytes;
use cursus_core::AppError;
use cursus_storage::{ByteStream, ObjectMeta, ObjectRef, RemoteStore};
use std::sync::{Arc, Mutex};
use tokio::fs;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

pub const CHUNK_SIZE: usize = 256 * 1024;

/// Chunks the producer may have in flight before it suspends.
const CHANNEL_CAPACITY: usize = 4;

/// Progress is reported (and a memory hint fired) every this many percent of
/// the declared size.
const PROGRESS_STEP_PERCENT: u64 = 10;

pub struct TransferEngine {
    store: Arc<dyn RemoteStore>,
    memory: Arc<dyn MemoryPressure>,
}

impl TransferEngine {
    pub fn new(store: Arc<dyn RemoteStore>, memory: Arc<dyn MemoryPressure>) -> Self {
        Self { store, memory }
    }

    /// Stream `staged` into `folder_id` and return a reference to the new
    /// remote object.
    ///
    /// The staged file is deleted before returning on success *and* on every
    /// failure path; a deletion failure is logged and never masks the
    /// transfer outcome. On a permission failure the just-created object is
    /// best-effort deleted so a world-unreadable object is never referenced.
    pub async fn transfer(
        &self,
        staging: &StagingArea,
        staged: StagedFile,
        folder_id: &str,
    ) -> Result<ObjectRef, AppError> {
        let result = self.run(&staged, folder_id).await;
        staging.discard(&staged).await;
        result
    }

    async fn run(&self, staged: &StagedFile, folder_id: &str) -> Result<ObjectRef, AppError> {
        let start = std::time::Instant::now();

        let file = fs::File::open(&staged.path)
            .await
            .map_err(|e| AppError::LocalIo(format!("Cannot open staged file: {}", e)))?;

        let (tx, rx) = mpsc::channel::<Result<Bytes, std::io::Error>>(CHANNEL_CAPACITY);

        // A read error reaches the store as a broken stream; remember the
        // original cause so the caller sees a local I/O error, not a
        // provider error.
        let read_error: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));

        self.spawn_producer(file, staged.size_bytes, tx, read_error.clone());

        let body: ByteStream = Box::pin(ReceiverStream::new(rx));

        let meta = ObjectMeta {
            name: staged.original_name.clone(),
            content_type: staged.content_type.clone(),
            size_bytes: Some(staged.size_bytes),
        };

        let created = match self.store.create_object(meta, folder_id, body).await {
            Ok(created) => created,
            Err(e) => {
                if let Some(io) = read_error.lock().unwrap().take() {
                    return Err(AppError::LocalIo(io));
                }
                return Err(e.into());
            }
        };

        if let Err(e) = self.store.set_public_readable(&created.id).await {
            // The object exists but is unreadable; remove it rather than
            // report success for something clients cannot fetch.
            if let Err(cleanup_err) = self.store.delete_object(&created.id).await {
                tracing::warn!(
                    error = %cleanup_err,
                    object_id = %created.id,
                    "Failed to delete remote object after permission failure"
                );
            }
            return Err(e.into());
        }

        tracing::info!(
            object_id = %created.id,
            folder_id = %folder_id,
            size_bytes = staged.size_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Transfer complete"
        );

        Ok(created)
    }

    fn spawn_producer(
        &self,
        mut file: fs::File,
        total_bytes: u64,
        tx: mpsc::Sender<Result<Bytes, std::io::Error>>,
        read_error: Arc<Mutex<Option<String>>>,
    ) {
        let memory = self.memory.clone();

        tokio::spawn(async move {
            let mut buf = vec![0u8; CHUNK_SIZE];
            let mut sent: u64 = 0;
            let mut next_checkpoint = PROGRESS_STEP_PERCENT;

            loop {
                match file.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(n) => {
                        sent += n as u64;

                        // Declared size 0 means no progress reporting at all.
                        if total_bytes > 0 {
                            let percent = sent * 100 / total_bytes;
                            while next_checkpoint <= 100 && percent >= next_checkpoint {
                                tracing::debug!(
                                    percent = next_checkpoint,
                                    sent_bytes = sent,
                                    total_bytes = total_bytes,
                                    "Transfer progress"
                                );
                                memory.hint();
                                next_checkpoint += PROGRESS_STEP_PERCENT;
                            }
                        }

                        // Suspends while the consumer's buffer is full.
                        if tx.send(Ok(Bytes::copy_from_slice(&buf[..n]))).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        *read_error.lock().unwrap() = Some(e.to_string());
                        let _ = tx.send(Err(e)).await;
                        break;
                    }
                }
            }
        });
    }
}
