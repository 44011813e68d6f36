//! Owner-view projection.
//!
//! The primary view is the only authority. The owner view is rebuilt from it here,
//! one file at a time, and every projection is idempotent: projecting the same file
//! again converges the two views. When all attempts fail the view stays stale until
//! the next projection of that file or an owner reconcile.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use wordtally_core::AppError;

use super::store::MetadataStore;

const DEFAULT_BASE_BACKOFF: Duration = Duration::from_millis(50);
const MAX_BACKOFF: Duration = Duration::from_secs(2);

/// What a projection left behind in the owner view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionOutcome {
    /// The owner entry now mirrors the primary record.
    Projected,
    /// The primary record is gone, so the owner entry was removed.
    Removed,
    /// Every attempt failed; the owner entry may lag the primary record.
    Stale,
}

/// Summary of an owner reconcile sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub projected: usize,
    pub removed: usize,
    pub stale: usize,
}

#[derive(Clone)]
pub struct OwnerViewProjector {
    store: Arc<dyn MetadataStore>,
    max_attempts: u32,
    base_backoff: Duration,
}

/// Delay before retry number `attempt` (1-based), doubling and capped.
fn backoff_for_attempt(base: Duration, attempt: u32) -> Duration {
    let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(factor).min(MAX_BACKOFF)
}

impl OwnerViewProjector {
    pub fn new(store: Arc<dyn MetadataStore>, max_attempts: u32) -> Self {
        Self {
            store,
            max_attempts: max_attempts.max(1),
            base_backoff: DEFAULT_BASE_BACKOFF,
        }
    }

    pub fn with_base_backoff(mut self, base_backoff: Duration) -> Self {
        self.base_backoff = base_backoff;
        self
    }

    /// Mirror the primary record of `file_id` into the owner view, retrying with
    /// exponential backoff.
    #[tracing::instrument(skip(self), fields(operation = "project_owner_view"))]
    pub async fn project(&self, owner_id: &str, file_id: &str) -> ProjectionOutcome {
        let mut attempt = 1;
        loop {
            match self.project_once(owner_id, file_id).await {
                Ok(outcome) => return outcome,
                Err(e) if attempt < self.max_attempts => {
                    let delay = backoff_for_attempt(self.base_backoff, attempt);
                    tracing::warn!(
                        error = %e,
                        attempt = attempt,
                        retry_in_ms = delay.as_millis() as u64,
                        "Owner view projection failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        attempts = attempt,
                        "Owner view projection gave up; owner view is stale"
                    );
                    return ProjectionOutcome::Stale;
                }
            }
        }
    }

    async fn project_once(
        &self,
        owner_id: &str,
        file_id: &str,
    ) -> Result<ProjectionOutcome, AppError> {
        if let Some(record) = self.store.get(file_id).await? {
            if self.store.upsert_owner_entry(&record.owner_entry()).await? {
                return Ok(ProjectionOutcome::Projected);
            }
            // Deleted between the read and the write.
            tracing::debug!("Primary record deleted during projection");
        }
        self.store
            .remove_orphaned_owner_entry(owner_id, file_id)
            .await?;
        Ok(ProjectionOutcome::Removed)
    }

    /// Whether the owner view agrees with the primary view for this file.
    pub async fn is_converged(&self, owner_id: &str, file_id: &str) -> Result<bool, AppError> {
        let record = self.store.get(file_id).await?;
        let entry = self.store.get_owner_entry(owner_id, file_id).await?;
        Ok(match (record, entry) {
            (Some(record), Some(entry)) => entry.mirrors(&record),
            (None, None) => true,
            _ => false,
        })
    }

    /// Re-project every file of `owner_id` found in either view: entries whose
    /// primary record is gone are removed, and primary records missing from the
    /// owner view are added.
    #[tracing::instrument(skip(self), fields(operation = "reconcile_owner"))]
    pub async fn reconcile_owner(&self, owner_id: &str) -> Result<ReconcileReport, AppError> {
        let mut file_ids: BTreeSet<String> = self
            .store
            .list_by_owner(owner_id)
            .await?
            .into_iter()
            .map(|entry| entry.file_id)
            .collect();
        file_ids.extend(
            self.store
                .list_records_by_owner(owner_id)
                .await?
                .into_iter()
                .map(|record| record.file_id),
        );

        let mut report = ReconcileReport::default();
        for file_id in &file_ids {
            match self.project(owner_id, file_id).await {
                ProjectionOutcome::Projected => report.projected += 1,
                ProjectionOutcome::Removed => report.removed += 1,
                ProjectionOutcome::Stale => report.stale += 1,
            }
        }

        tracing::info!(
            projected = report.projected,
            removed = report.removed,
            stale = report.stale,
            "Owner view reconciled"
        );
        Ok(report)
    }
}
