//! Owner-facing reads and deletes of analysis records.

use std::sync::Arc;
use wordtally_core::models::ReconcileSummary;
use wordtally_core::{AnalyticsItem, AppError};
use wordtally_db::{MetadataStore, OwnerViewProjector};
use wordtally_storage::Storage;

use crate::error::storage_error;

#[derive(Clone)]
pub struct AnalyticsService {
    store: Arc<dyn MetadataStore>,
    storage: Arc<dyn Storage>,
    projector: OwnerViewProjector,
}

impl AnalyticsService {
    pub fn new(
        store: Arc<dyn MetadataStore>,
        storage: Arc<dyn Storage>,
        projector: OwnerViewProjector,
    ) -> Self {
        Self {
            store,
            storage,
            projector,
        }
    }

    /// The owner's history, newest first, read from the owner view.
    pub async fn list(&self, owner_id: &str) -> Result<Vec<AnalyticsItem>, AppError> {
        let entries = self.store.list_by_owner(owner_id).await?;
        Ok(entries.into_iter().map(AnalyticsItem::from).collect())
    }

    /// One file, read from the primary view.
    pub async fn get(&self, owner_id: &str, file_id: &str) -> Result<AnalyticsItem, AppError> {
        let record = self
            .store
            .get(file_id)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        if record.owner_id != owner_id {
            return Err(AppError::OwnershipMismatch(file_id.to_string()));
        }

        Ok(AnalyticsItem::from(record.owner_entry()))
    }

    /// Delete a file at any status. Absent records succeed, clearing any owner
    /// entry left behind for them.
    ///
    /// The blob goes first, then both metadata views.
    #[tracing::instrument(skip(self), fields(operation = "delete_file"))]
    pub async fn delete(&self, owner_id: &str, file_id: &str) -> Result<(), AppError> {
        let Some(record) = self.store.get(file_id).await? else {
            tracing::debug!("No primary record; clearing owner entry only");
            self.store
                .remove_orphaned_owner_entry(owner_id, file_id)
                .await?;
            return Ok(());
        };

        if record.owner_id != owner_id {
            return Err(AppError::OwnershipMismatch(file_id.to_string()));
        }

        self.storage
            .delete(&record.storage.key)
            .await
            .map_err(storage_error)?;
        self.store.delete(file_id, &record.owner_id).await?;

        tracing::info!(status = %record.status, "File deleted");
        Ok(())
    }

    /// Repair the owner view of `owner_id` from the primary view.
    pub async fn reconcile(&self, owner_id: &str) -> Result<ReconcileSummary, AppError> {
        let report = self.projector.reconcile_owner(owner_id).await?;
        Ok(ReconcileSummary {
            projected: report.projected,
            removed: report.removed,
            stale: report.stale,
        })
    }
}
