//! Claim arbitration tests against the in-memory store and local storage.
//!
//! Run with: `cargo test -p wordtally-worker --test claim_test`

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;
use wordtally_core::{
    derive_file_id, AppError, FileOutcome, FileRecord, FileStatus, OwnerFileEntry,
    StorageLocation,
};
use wordtally_db::{CreateOutcome, InMemoryMetadataStore, MetadataStore, OwnerViewProjector};
use wordtally_storage::keys::{build_upload_key, encode_key_for_url};
use wordtally_storage::{
    ByteStream, LocalStorage, Storage, StorageBackend, StorageResult, UploadSigner,
};
use wordtally_worker::{BlobEvent, ClaimArbitrator, ClaimOutcome, NotificationWorker, WorkerConfig};

const OWNER: &str = "owner-1";

/// Storage wrapper counting how many times blobs are read.
struct CountingStorage {
    inner: LocalStorage,
    downloads: AtomicUsize,
}

#[async_trait]
impl Storage for CountingStorage {
    async fn presigned_put_url(
        &self,
        storage_key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.inner
            .presigned_put_url(storage_key, content_type, expires_in)
            .await
    }

    async fn put_if_absent(
        &self,
        storage_key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<()> {
        self.inner.put_if_absent(storage_key, data, content_type).await
    }

    async fn download_stream(&self, storage_key: &str) -> StorageResult<ByteStream> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.inner.download_stream(storage_key).await
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        self.inner.exists(storage_key).await
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.inner.delete(storage_key).await
    }

    fn bucket(&self) -> &str {
        self.inner.bucket()
    }

    fn backend_type(&self) -> StorageBackend {
        self.inner.backend_type()
    }
}

/// Store wrapper recording every status the primary view passes through.
struct RecordingStore {
    inner: InMemoryMetadataStore,
    history: Mutex<Vec<FileStatus>>,
    /// Delete the file just before its outcome is written.
    delete_before_outcome: bool,
}

impl RecordingStore {
    fn new(delete_before_outcome: bool) -> Self {
        Self {
            inner: InMemoryMetadataStore::new(),
            history: Mutex::new(Vec::new()),
            delete_before_outcome,
        }
    }
}

#[async_trait]
impl MetadataStore for RecordingStore {
    async fn get(&self, file_id: &str) -> Result<Option<FileRecord>, AppError> {
        self.inner.get(file_id).await
    }

    async fn create_pending(&self, record: &FileRecord) -> Result<CreateOutcome, AppError> {
        let outcome = self.inner.create_pending(record).await?;
        if outcome == CreateOutcome::Created {
            self.history.lock().unwrap().push(record.status);
        }
        Ok(outcome)
    }

    async fn try_transition(
        &self,
        file_id: &str,
        from: &[FileStatus],
        to: FileStatus,
        at_ms: i64,
    ) -> Result<bool, AppError> {
        let moved = self.inner.try_transition(file_id, from, to, at_ms).await?;
        if moved {
            self.history.lock().unwrap().push(to);
        }
        Ok(moved)
    }

    async fn write_outcome(
        &self,
        file_id: &str,
        outcome: &FileOutcome,
        at_ms: i64,
    ) -> Result<bool, AppError> {
        if self.delete_before_outcome {
            self.inner.delete(file_id, OWNER).await?;
        }
        let written = self.inner.write_outcome(file_id, outcome, at_ms).await?;
        if written {
            self.history.lock().unwrap().push(outcome.status());
        }
        Ok(written)
    }

    async fn get_owner_entry(
        &self,
        owner_id: &str,
        file_id: &str,
    ) -> Result<Option<OwnerFileEntry>, AppError> {
        self.inner.get_owner_entry(owner_id, file_id).await
    }

    async fn upsert_owner_entry(&self, entry: &OwnerFileEntry) -> Result<bool, AppError> {
        self.inner.upsert_owner_entry(entry).await
    }

    async fn remove_orphaned_owner_entry(
        &self,
        owner_id: &str,
        file_id: &str,
    ) -> Result<(), AppError> {
        self.inner.remove_orphaned_owner_entry(owner_id, file_id).await
    }

    async fn list_records_by_owner(&self, owner_id: &str) -> Result<Vec<FileRecord>, AppError> {
        self.inner.list_records_by_owner(owner_id).await
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<OwnerFileEntry>, AppError> {
        self.inner.list_by_owner(owner_id).await
    }

    async fn delete(&self, file_id: &str, owner_id: &str) -> Result<(), AppError> {
        self.inner.delete(file_id, owner_id).await
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

struct Harness {
    store: Arc<dyn MetadataStore>,
    storage: Arc<CountingStorage>,
    projector: OwnerViewProjector,
    arbitrator: Arc<ClaimArbitrator>,
    _dir: TempDir,
}

async fn harness_with_store(store: Arc<dyn MetadataStore>) -> Harness {
    let dir = TempDir::new().unwrap();
    let local = LocalStorage::new(
        dir.path(),
        "http://localhost:4000/api/v0/blobs".to_string(),
        UploadSigner::new("k".repeat(32)),
    )
    .await
    .unwrap();
    let storage = Arc::new(CountingStorage {
        inner: local,
        downloads: AtomicUsize::new(0),
    });
    let projector = OwnerViewProjector::new(store.clone(), 3)
        .with_base_backoff(Duration::from_millis(1));
    let arbitrator = Arc::new(ClaimArbitrator::new(
        store.clone(),
        storage.clone(),
        projector.clone(),
    ));
    Harness {
        store,
        storage,
        projector,
        arbitrator,
        _dir: dir,
    }
}

async fn harness() -> Harness {
    harness_with_store(Arc::new(InMemoryMetadataStore::new())).await
}

/// Register a PENDING record and upload its blob. Returns the notification for it.
async fn register(h: &Harness, file_name: &str, content: &[u8]) -> (String, BlobEvent) {
    let fingerprint = wordtally_core::fingerprint(file_name, content.len() as u64, 1_700_000_000_000);
    let file_id = derive_file_id(OWNER, &fingerprint);
    let key = build_upload_key(OWNER, &file_id, file_name).unwrap();

    let record = FileRecord::pending(
        file_id.clone(),
        OWNER.to_string(),
        fingerprint,
        StorageLocation {
            bucket: h.storage.bucket().to_string(),
            key: key.clone(),
        },
        file_name.to_string(),
        "text/plain".to_string(),
        wordtally_core::now_millis(),
    );
    assert_eq!(
        h.store.create_pending(&record).await.unwrap(),
        CreateOutcome::Created
    );
    h.projector.project(OWNER, &file_id).await;
    h.storage
        .put_if_absent(&key, Bytes::copy_from_slice(content), "text/plain")
        .await
        .unwrap();

    let event = BlobEvent::new(h.storage.bucket(), encode_key_for_url(&key));
    (file_id, event)
}

#[tokio::test]
async fn test_completed_analysis_reaches_both_views() {
    let h = harness().await;
    let (file_id, event) =
        register(&h, "my notes.txt", b"The quick brown Fox. The QUICK fox jumps!").await;

    assert_eq!(h.arbitrator.on_blob_created(&event).await, ClaimOutcome::Completed);

    let record = h.store.get(&file_id).await.unwrap().unwrap();
    assert_eq!(record.status, FileStatus::Completed);
    let result = record.result.clone().unwrap();
    assert_eq!(result.total_words, 8);
    assert_eq!(result.unique_words, 5);
    assert_eq!(record.error_message, None);
    assert!(h.projector.is_converged(OWNER, &file_id).await.unwrap());
}

#[tokio::test]
async fn test_foreign_key_is_skipped() {
    let h = harness().await;
    let event = BlobEvent::new("local", "uploads/owner-1/readme.txt");
    assert_eq!(h.arbitrator.on_blob_created(&event).await, ClaimOutcome::InvalidKey);
    assert_eq!(h.storage.downloads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_file_id_is_skipped() {
    let h = harness().await;
    let key = format!("uploads/owner-1/{}-a.txt", "ab".repeat(32));
    let event = BlobEvent::new("local", key);
    assert_eq!(
        h.arbitrator.on_blob_created(&event).await,
        ClaimOutcome::RecordMissing
    );
}

#[tokio::test]
async fn test_duplicate_notification_after_completion_is_noop() {
    let h = harness().await;
    let (file_id, event) = register(&h, "a.txt", b"one two").await;

    assert_eq!(h.arbitrator.on_blob_created(&event).await, ClaimOutcome::Completed);
    let before = h.store.get(&file_id).await.unwrap().unwrap();

    assert_eq!(
        h.arbitrator.on_blob_created(&event).await,
        ClaimOutcome::AlreadyCompleted
    );
    assert_eq!(h.store.get(&file_id).await.unwrap().unwrap(), before);
    assert_eq!(h.storage.downloads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_in_progress_record_is_skipped() {
    let h = harness().await;
    let (file_id, event) = register(&h, "a.txt", b"one two").await;
    h.store
        .try_transition(&file_id, &FileStatus::CLAIMABLE, FileStatus::InProgress, i64::MAX - 10)
        .await
        .unwrap();

    assert_eq!(
        h.arbitrator.on_blob_created(&event).await,
        ClaimOutcome::AlreadyInProgress
    );
}

#[tokio::test]
async fn test_missing_blob_marks_failed() {
    let h = harness().await;
    let (file_id, event) = register(&h, "a.txt", b"words").await;
    let record = h.store.get(&file_id).await.unwrap().unwrap();
    h.storage.delete(&record.storage.key).await.unwrap();

    let outcome = h.arbitrator.on_blob_created(&event).await;
    assert!(matches!(outcome, ClaimOutcome::Failed(ref m) if m.contains("not found")));

    let record = h.store.get(&file_id).await.unwrap().unwrap();
    assert_eq!(record.status, FileStatus::Failed);
    assert!(record.result.is_none());
}

#[tokio::test]
async fn test_concurrent_notifications_analyze_once() {
    let h = harness().await;
    let (file_id, event) = register(&h, "race.txt", b"alpha beta gamma alpha").await;

    let mut handles = Vec::new();
    for _ in 0..12 {
        let arbitrator = h.arbitrator.clone();
        let event = event.clone();
        handles.push(tokio::spawn(async move {
            arbitrator.on_blob_created(&event).await
        }));
    }

    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await.unwrap());
    }

    let processed = outcomes.iter().filter(|o| o.processed()).count();
    assert_eq!(processed, 1, "outcomes: {:?}", outcomes);
    assert!(outcomes.iter().all(|o| matches!(
        o,
        ClaimOutcome::Completed
            | ClaimOutcome::LostRace
            | ClaimOutcome::AlreadyInProgress
            | ClaimOutcome::AlreadyCompleted
    )));
    assert_eq!(h.storage.downloads.load(Ordering::SeqCst), 1);

    let record = h.store.get(&file_id).await.unwrap().unwrap();
    assert_eq!(record.status, FileStatus::Completed);
    assert_eq!(record.result.unwrap().total_words, 4);
}

#[tokio::test]
async fn test_failed_then_reclaimed_lifecycle() {
    let recording = Arc::new(RecordingStore::new(false));
    let h = harness_with_store(recording.clone()).await;
    let (file_id, event) = register(&h, "draft.txt", b"broken \xff bytes").await;

    let first = h.arbitrator.on_blob_created(&event).await;
    assert!(matches!(first, ClaimOutcome::Failed(ref m) if m.contains("Invalid UTF-8")));

    let record = h.store.get(&file_id).await.unwrap().unwrap();
    h.storage.delete(&record.storage.key).await.unwrap();
    h.storage
        .put_if_absent(&record.storage.key, Bytes::from_static(b"fixed bytes"), "text/plain")
        .await
        .unwrap();

    assert_eq!(h.arbitrator.on_blob_created(&event).await, ClaimOutcome::Completed);

    let history = recording.history.lock().unwrap().clone();
    assert_eq!(
        history,
        vec![
            FileStatus::Pending,
            FileStatus::InProgress,
            FileStatus::Failed,
            FileStatus::InProgress,
            FileStatus::Completed,
        ]
    );
    for pair in history.windows(2) {
        assert!(pair[0].can_transition_to(pair[1]), "{:?}", pair);
    }

    let entries = h.store.list_by_owner(OWNER).await.unwrap();
    assert_eq!(entries.len(), 1);
    let item = wordtally_core::AnalyticsItem::from(entries[0].clone());
    assert_eq!(item.status, FileStatus::Completed);
    assert!(item.result.is_some());
    assert!(item.error_message.is_none());
}

#[tokio::test]
async fn test_worker_pool_processes_queued_events() {
    let h = harness().await;
    let (first_id, first) = register(&h, "one.txt", b"one fish two fish").await;
    let (second_id, second) = register(&h, "two.txt", b"red fish blue fish").await;

    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();
    let (notifier, worker) = NotificationWorker::start(
        h.arbitrator.clone(),
        WorkerConfig {
            max_concurrency: 2,
            queue_capacity: 8,
        },
        Some(outcome_tx),
    );

    for event in [first.clone(), second, first] {
        notifier.notify(event).await.unwrap();
    }

    let mut outcomes = Vec::new();
    for _ in 0..3 {
        let (_, outcome) = tokio::time::timeout(Duration::from_secs(5), outcome_rx.recv())
            .await
            .unwrap()
            .unwrap();
        outcomes.push(outcome);
    }
    worker.shutdown().await;

    assert_eq!(outcomes.iter().filter(|o| o.processed()).count(), 2);
    for file_id in [first_id, second_id] {
        let record = h.store.get(&file_id).await.unwrap().unwrap();
        assert_eq!(record.status, FileStatus::Completed);
    }
    assert!(notifier.notify(BlobEvent::new("local", "x")).await.is_err());
}

#[tokio::test]
async fn test_deleted_during_analysis_is_reported() {
    let recording = Arc::new(RecordingStore::new(true));
    let h = harness_with_store(recording.clone()).await;
    let (file_id, event) = register(&h, "short-lived.txt", b"here then gone").await;

    let outcome = h.arbitrator.on_blob_created(&event).await;
    assert_eq!(outcome, ClaimOutcome::RecordDeleted);
    assert!(outcome.processed());

    assert!(h.store.get(&file_id).await.unwrap().is_none());
    assert!(h.store.list_by_owner(OWNER).await.unwrap().is_empty());
    assert_eq!(
        recording.history.lock().unwrap().clone(),
        vec![FileStatus::Pending, FileStatus::InProgress]
    );
}

#[tokio::test]
async fn test_shutdown_processes_already_queued_events() {
    let h = harness().await;
    let mut file_ids = Vec::new();
    let mut events = Vec::new();
    for i in 0..20 {
        let (file_id, event) = register(&h, &format!("queued-{}.txt", i), b"queued words").await;
        file_ids.push(file_id);
        events.push(event);
    }

    let (notifier, worker) = NotificationWorker::start(
        h.arbitrator.clone(),
        WorkerConfig {
            max_concurrency: 1,
            queue_capacity: 32,
        },
        None,
    );
    for event in events {
        notifier.notify(event).await.unwrap();
    }
    worker.shutdown().await;

    for file_id in &file_ids {
        let record = h.store.get(file_id).await.unwrap().unwrap();
        assert_eq!(record.status, FileStatus::Completed, "{}", file_id);
    }
    assert_eq!(h.storage.downloads.load(Ordering::SeqCst), 20);
    assert!(notifier.notify(BlobEvent::new("local", "late")).await.is_err());
}
