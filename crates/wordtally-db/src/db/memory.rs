//! In-process metadata store.
//!
//! Both views live behind one mutex, so every operation is atomic with respect to
//! the others. Used by tests and by `METADATA_BACKEND=memory` deployments.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use wordtally_core::{AppError, FileOutcome, FileRecord, FileStatus, OwnerFileEntry};

use super::store::{CreateOutcome, MetadataStore};

#[derive(Default)]
struct Views {
    records: HashMap<String, FileRecord>,
    owner_view: HashMap<(String, String), OwnerFileEntry>,
    failing_owner_writes: usize,
}

#[derive(Clone, Default)]
pub struct InMemoryMetadataStore {
    views: Arc<Mutex<Views>>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` owner-view writes fail, to exercise the stale-view path.
    pub async fn fail_owner_view_writes(&self, count: usize) {
        self.views.lock().await.failing_owner_writes = count;
    }

    /// Number of rows in the primary view.
    pub async fn record_count(&self) -> usize {
        self.views.lock().await.records.len()
    }

    /// Insert an owner-view entry with no primary record behind it, as left by
    /// older deployments or manual edits.
    pub async fn insert_orphaned_owner_entry(&self, entry: OwnerFileEntry) {
        self.views
            .lock()
            .await
            .owner_view
            .insert((entry.owner_id.clone(), entry.file_id.clone()), entry);
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn get(&self, file_id: &str) -> Result<Option<FileRecord>, AppError> {
        Ok(self.views.lock().await.records.get(file_id).cloned())
    }

    async fn create_pending(&self, record: &FileRecord) -> Result<CreateOutcome, AppError> {
        let mut views = self.views.lock().await;
        if views.records.contains_key(&record.file_id) {
            return Ok(CreateOutcome::AlreadyExists);
        }
        views
            .records
            .insert(record.file_id.clone(), record.clone());
        Ok(CreateOutcome::Created)
    }

    async fn try_transition(
        &self,
        file_id: &str,
        from: &[FileStatus],
        to: FileStatus,
        at_ms: i64,
    ) -> Result<bool, AppError> {
        let mut views = self.views.lock().await;
        match views.records.get_mut(file_id) {
            Some(record) if from.contains(&record.status) => {
                record.status = to;
                record.updated_at = at_ms;
                record.result = None;
                record.error_message = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn write_outcome(
        &self,
        file_id: &str,
        outcome: &FileOutcome,
        at_ms: i64,
    ) -> Result<bool, AppError> {
        let mut views = self.views.lock().await;
        let Some(record) = views.records.get_mut(file_id) else {
            return Ok(false);
        };
        record.status = outcome.status();
        record.result = outcome.result().cloned();
        record.error_message = outcome.error_message().map(str::to_string);
        record.updated_at = at_ms;
        Ok(true)
    }

    async fn get_owner_entry(
        &self,
        owner_id: &str,
        file_id: &str,
    ) -> Result<Option<OwnerFileEntry>, AppError> {
        let views = self.views.lock().await;
        Ok(views
            .owner_view
            .get(&(owner_id.to_string(), file_id.to_string()))
            .cloned())
    }

    async fn upsert_owner_entry(&self, entry: &OwnerFileEntry) -> Result<bool, AppError> {
        let mut views = self.views.lock().await;
        if views.failing_owner_writes > 0 {
            views.failing_owner_writes -= 1;
            return Err(AppError::Internal(
                "owner view write rejected (injected failure)".to_string(),
            ));
        }
        if !views.records.contains_key(&entry.file_id) {
            return Ok(false);
        }

        let key = (entry.owner_id.clone(), entry.file_id.clone());
        match views.owner_view.get(&key) {
            Some(existing) if existing.updated_at > entry.updated_at => {}
            _ => {
                views.owner_view.insert(key, entry.clone());
            }
        }
        Ok(true)
    }

    async fn remove_orphaned_owner_entry(
        &self,
        owner_id: &str,
        file_id: &str,
    ) -> Result<(), AppError> {
        let mut views = self.views.lock().await;
        if !views.records.contains_key(file_id) {
            views
                .owner_view
                .remove(&(owner_id.to_string(), file_id.to_string()));
        }
        Ok(())
    }

    async fn list_records_by_owner(&self, owner_id: &str) -> Result<Vec<FileRecord>, AppError> {
        let views = self.views.lock().await;
        Ok(views
            .records
            .values()
            .filter(|record| record.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<OwnerFileEntry>, AppError> {
        let views = self.views.lock().await;
        let mut entries: Vec<OwnerFileEntry> = views
            .owner_view
            .values()
            .filter(|entry| entry.owner_id == owner_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.file_id.cmp(&b.file_id))
        });
        Ok(entries)
    }

    async fn delete(&self, file_id: &str, owner_id: &str) -> Result<(), AppError> {
        let mut views = self.views.lock().await;
        views.records.remove(file_id);
        views
            .owner_view
            .remove(&(owner_id.to_string(), file_id.to_string()));
        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
