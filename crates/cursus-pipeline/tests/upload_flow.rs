//! End-to-end pipeline tests against the in-memory remote store.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use cursus_core::models::{Document, DocumentKind, Lesson, RecordStatus};
use cursus_core::{AppError, DocumentStore, LessonStore};
use cursus_pipeline::{NoopMemoryPressure, StagedFile, StagingArea, TransferEngine, UploadService};
use cursus_storage::{MockRemoteStore, RemoteStore};
use futures::stream;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

const VIDEO_FOLDER: &str = "folder-videos";
const DOCUMENT_FOLDER: &str = "folder-documents";

#[derive(Default)]
struct MemLessons {
    lessons: Mutex<HashMap<Uuid, Lesson>>,
    fail_update: AtomicBool,
}

impl MemLessons {
    fn insert(&self, lesson: Lesson) {
        self.lessons.lock().unwrap().insert(lesson.id, lesson);
    }

    fn video_url(&self, id: Uuid) -> Option<String> {
        self.lessons
            .lock()
            .unwrap()
            .get(&id)
            .and_then(|l| l.video_url.clone())
    }
}

#[async_trait]
impl LessonStore for MemLessons {
    async fn find_lesson(&self, id: Uuid) -> Result<Option<Lesson>, AppError> {
        Ok(self.lessons.lock().unwrap().get(&id).cloned())
    }

    async fn update_video_url(&self, id: Uuid, url: Option<&str>) -> Result<Lesson, AppError> {
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(AppError::Database("injected update failure".to_string()));
        }
        let mut lessons = self.lessons.lock().unwrap();
        let lesson = lessons
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("lesson".to_string()))?;
        lesson.video_url = url.map(|u| u.to_string());
        lesson.updated_at = Utc::now();
        Ok(lesson.clone())
    }
}

#[derive(Default)]
struct MemDocuments {
    documents: Mutex<HashMap<Uuid, Document>>,
    fail_delete: AtomicBool,
}

#[async_trait]
impl DocumentStore for MemDocuments {
    async fn create_document(
        &self,
        lesson_id: Uuid,
        title: &str,
        file_url: &str,
        kind: DocumentKind,
    ) -> Result<Document, AppError> {
        let document = Document {
            id: Uuid::new_v4(),
            lesson_id,
            title: title.to_string(),
            file_url: file_url.to_string(),
            kind,
            status: RecordStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.documents
            .lock()
            .unwrap()
            .insert(document.id, document.clone());
        Ok(document)
    }

    async fn find_document(&self, id: Uuid) -> Result<Option<Document>, AppError> {
        Ok(self.documents.lock().unwrap().get(&id).cloned())
    }

    async fn delete_document(&self, id: Uuid) -> Result<(), AppError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(AppError::Database("injected delete failure".to_string()));
        }
        self.documents.lock().unwrap().remove(&id);
        Ok(())
    }
}

struct Fixture {
    store: Arc<MockRemoteStore>,
    lessons: Arc<MemLessons>,
    documents: Arc<MemDocuments>,
    service: UploadService,
    staging: StagingArea,
    _dir: tempfile::TempDir,
}

async fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let staging = StagingArea::new(dir.path()).await.unwrap();

    let store = Arc::new(MockRemoteStore::new());
    store.add_folder(VIDEO_FOLDER);
    store.add_folder(DOCUMENT_FOLDER);

    let lessons = Arc::new(MemLessons::default());
    let documents = Arc::new(MemDocuments::default());

    let engine = TransferEngine::new(
        store.clone() as Arc<dyn RemoteStore>,
        Arc::new(NoopMemoryPressure),
    );
    let service = UploadService::new(
        engine,
        store.clone(),
        staging.clone(),
        lessons.clone(),
        documents.clone(),
        VIDEO_FOLDER.to_string(),
        DOCUMENT_FOLDER.to_string(),
    );

    Fixture {
        store,
        lessons,
        documents,
        service,
        staging,
        _dir: dir,
    }
}

fn lesson() -> Lesson {
    Lesson {
        id: Uuid::new_v4(),
        module_id: Uuid::new_v4(),
        title: "Intro".to_string(),
        description: None,
        video_url: None,
        position: 1,
        status: RecordStatus::Active,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

async fn stage(staging: &StagingArea, name: &str, content_type: &str, data: &[u8]) -> StagedFile {
    let chunks: Vec<Result<Bytes, String>> = vec![Ok(Bytes::copy_from_slice(data))];
    staging
        .stage_stream(name, content_type, u64::MAX, stream::iter(chunks))
        .await
        .unwrap()
}

fn staging_is_empty(staging: &StagingArea) -> bool {
    std::fs::read_dir(staging.dir()).unwrap().count() == 0
}

#[tokio::test]
async fn new_video_upload_links_lesson_and_cleans_staging() {
    let fx = fixture().await;
    let l = lesson();
    fx.lessons.insert(l.clone());

    let staged = stage(&fx.staging, "clip.mp4", "video/mp4", b"video bytes").await;
    let updated = fx.service.attach_lesson_video(l.id, staged).await.unwrap();

    let url = updated.video_url.expect("video url persisted");
    let object_id = cursus_storage::url::object_id_from_url(&url).unwrap();
    assert!(fx.store.has_object(&object_id));
    assert!(fx.store.is_public(&object_id));
    assert_eq!(fx.store.object_data(&object_id).unwrap(), b"video bytes");
    assert!(staging_is_empty(&fx.staging));
}

#[tokio::test]
async fn zero_byte_video_uploads_successfully() {
    let fx = fixture().await;
    let l = lesson();
    fx.lessons.insert(l.clone());

    let staged = stage(&fx.staging, "empty.mp4", "video/mp4", b"").await;
    let updated = fx.service.attach_lesson_video(l.id, staged).await.unwrap();

    let url = updated.video_url.expect("video url persisted");
    let object_id = cursus_storage::url::object_id_from_url(&url).unwrap();
    assert_eq!(fx.store.object_data(&object_id).unwrap(), b"");
    assert!(staging_is_empty(&fx.staging));
}

#[tokio::test]
async fn create_failure_leaves_record_unchanged_and_no_staged_file() {
    let fx = fixture().await;
    let l = lesson();
    fx.lessons.insert(l.clone());
    fx.store.set_fail_create(true);

    let staged = stage(&fx.staging, "clip.mp4", "video/mp4", b"video bytes").await;
    let err = fx.service.attach_lesson_video(l.id, staged).await.unwrap_err();

    assert!(matches!(err, AppError::Provider(_)));
    assert_eq!(fx.lessons.video_url(l.id), None);
    assert_eq!(fx.store.object_count(), 0);
    assert!(staging_is_empty(&fx.staging));
}

#[tokio::test]
async fn permission_failure_rolls_back_created_object() {
    let fx = fixture().await;
    let l = lesson();
    fx.lessons.insert(l.clone());
    fx.store.set_fail_permission(true);

    let staged = stage(&fx.staging, "clip.mp4", "video/mp4", b"video bytes").await;
    let err = fx.service.attach_lesson_video(l.id, staged).await.unwrap_err();

    assert!(matches!(err, AppError::Provider(_)));
    // The object created before the permission call must be gone again.
    assert_eq!(fx.store.object_count(), 0);
    assert_eq!(fx.store.deleted_ids().len(), 1);
    assert_eq!(fx.lessons.video_url(l.id), None);
    assert!(staging_is_empty(&fx.staging));
}

#[tokio::test]
async fn replace_deletes_old_object_after_new_url_is_persisted() {
    let fx = fixture().await;
    let l = lesson();
    fx.lessons.insert(l.clone());

    let first = stage(&fx.staging, "v1.mp4", "video/mp4", b"first").await;
    let updated = fx.service.attach_lesson_video(l.id, first).await.unwrap();
    let old_url = updated.video_url.clone().unwrap();
    let old_id = cursus_storage::url::object_id_from_url(&old_url).unwrap();

    let second = stage(&fx.staging, "v2.mp4", "video/mp4", b"second").await;
    let updated = fx.service.attach_lesson_video(l.id, second).await.unwrap();
    let new_url = updated.video_url.unwrap();
    let new_id = cursus_storage::url::object_id_from_url(&new_url).unwrap();

    assert_ne!(old_id, new_id);
    assert!(!fx.store.has_object(&old_id));
    assert!(fx.store.has_object(&new_id));
    assert_eq!(fx.store.object_data(&new_id).unwrap(), b"second");
}

#[tokio::test]
async fn replace_survives_old_object_delete_failure() {
    let fx = fixture().await;
    let l = lesson();
    fx.lessons.insert(l.clone());

    let first = stage(&fx.staging, "v1.mp4", "video/mp4", b"first").await;
    fx.service.attach_lesson_video(l.id, first).await.unwrap();

    fx.store.set_fail_delete(true);
    let second = stage(&fx.staging, "v2.mp4", "video/mp4", b"second").await;
    let updated = fx.service.attach_lesson_video(l.id, second).await.unwrap();

    // Stale remote object leaks, but the record points at the new object.
    let new_url = updated.video_url.unwrap();
    let new_id = cursus_storage::url::object_id_from_url(&new_url).unwrap();
    assert_eq!(fx.store.object_data(&new_id).unwrap(), b"second");
    assert_eq!(fx.lessons.video_url(l.id), Some(new_url));
}

#[tokio::test]
async fn replace_transfer_failure_keeps_old_url() {
    let fx = fixture().await;
    let l = lesson();
    fx.lessons.insert(l.clone());

    let first = stage(&fx.staging, "v1.mp4", "video/mp4", b"first").await;
    let updated = fx.service.attach_lesson_video(l.id, first).await.unwrap();
    let old_url = updated.video_url.unwrap();
    let old_id = cursus_storage::url::object_id_from_url(&old_url).unwrap();

    fx.store.set_fail_create(true);
    let second = stage(&fx.staging, "v2.mp4", "video/mp4", b"second").await;
    let err = fx.service.attach_lesson_video(l.id, second).await.unwrap_err();

    assert!(matches!(err, AppError::Provider(_)));
    // Old object still live, record still points at it.
    assert_eq!(fx.lessons.video_url(l.id), Some(old_url));
    assert!(fx.store.has_object(&old_id));
    assert!(staging_is_empty(&fx.staging));
}

#[tokio::test]
async fn persist_failure_deletes_freshly_created_object() {
    let fx = fixture().await;
    let l = lesson();
    fx.lessons.insert(l.clone());
    fx.lessons.fail_update.store(true, Ordering::SeqCst);

    let staged = stage(&fx.staging, "clip.mp4", "video/mp4", b"video bytes").await;
    let err = fx.service.attach_lesson_video(l.id, staged).await.unwrap_err();

    assert!(matches!(err, AppError::Database(_)));
    assert_eq!(fx.store.object_count(), 0);
    assert!(staging_is_empty(&fx.staging));
}

#[tokio::test]
async fn aborted_transfer_still_cleans_staging() {
    let fx = fixture().await;

    // A provider that accepts the upload and then never answers.
    fx.store.set_stall_create(true);
    let staged = stage(&fx.staging, "clip.mp4", "video/mp4", b"video bytes").await;

    let engine = TransferEngine::new(
        fx.store.clone() as Arc<dyn RemoteStore>,
        Arc::new(NoopMemoryPressure),
    );
    let staging = fx.staging.clone();
    let transfer = tokio::spawn(async move {
        let _ = engine.transfer(&staging, staged, VIDEO_FOLDER).await;
    });

    // Let the transfer reach the stalled provider call, then drop it the way
    // a client disconnect drops the request future.
    tokio::time::sleep(Duration::from_millis(50)).await;
    transfer.abort();
    let _ = transfer.await;

    assert!(staging_is_empty(&fx.staging));
}

#[tokio::test]
async fn upload_for_missing_lesson_discards_staged_file() {
    let fx = fixture().await;

    let staged = stage(&fx.staging, "clip.mp4", "video/mp4", b"video bytes").await;
    let err = fx
        .service
        .attach_lesson_video(Uuid::new_v4(), staged)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(fx.store.object_count(), 0);
    assert!(staging_is_empty(&fx.staging));
}

#[tokio::test]
async fn document_upload_creates_record() {
    let fx = fixture().await;
    let l = lesson();
    fx.lessons.insert(l.clone());

    let staged = stage(&fx.staging, "notes.pdf", "application/pdf", b"%PDF-1.4").await;
    let document = fx
        .service
        .create_document(l.id, "Lecture notes", DocumentKind::Lecture, staged)
        .await
        .unwrap();

    let object_id = cursus_storage::url::object_id_from_url(&document.file_url).unwrap();
    assert!(fx.store.is_public(&object_id));
    assert!(staging_is_empty(&fx.staging));
}

#[tokio::test]
async fn document_delete_removes_record_even_when_remote_delete_fails() {
    let fx = fixture().await;
    let l = lesson();
    fx.lessons.insert(l.clone());

    let staged = stage(&fx.staging, "notes.pdf", "application/pdf", b"%PDF-1.4").await;
    let document = fx
        .service
        .create_document(l.id, "Lecture notes", DocumentKind::Lecture, staged)
        .await
        .unwrap();

    fx.store.set_fail_delete(true);
    fx.service.delete_document(document.id).await.unwrap();

    // Local record gone despite the remote failure.
    assert!(fx
        .documents
        .find_document(document.id)
        .await
        .unwrap()
        .is_none());
    // The remote delete was at least attempted.
    assert!(!fx.store.deleted_ids().is_empty());
}

#[tokio::test]
async fn document_delete_removes_remote_object_first() {
    let fx = fixture().await;
    let l = lesson();
    fx.lessons.insert(l.clone());

    let staged = stage(&fx.staging, "notes.pdf", "application/pdf", b"%PDF-1.4").await;
    let document = fx
        .service
        .create_document(l.id, "Lecture notes", DocumentKind::Lecture, staged)
        .await
        .unwrap();
    let object_id = cursus_storage::url::object_id_from_url(&document.file_url).unwrap();

    fx.service.delete_document(document.id).await.unwrap();

    assert!(!fx.store.has_object(&object_id));
    assert!(fx
        .documents
        .find_document(document.id)
        .await
        .unwrap()
        .is_none());
}
