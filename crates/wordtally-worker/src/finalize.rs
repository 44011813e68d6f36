use std::sync::Arc;
use wordtally_core::{now_millis, AppError, FileOutcome};
use wordtally_db::{MetadataStore, OwnerViewProjector, ProjectionOutcome};

/// Timestamp for a write that must sort after `previous_ms`.
pub(crate) fn next_timestamp(previous_ms: i64) -> i64 {
    now_millis().max(previous_ms.saturating_add(1))
}

/// Writes terminal outcomes to the primary view and projects them to the owner view.
#[derive(Clone)]
pub struct StatusProjector {
    store: Arc<dyn MetadataStore>,
    projector: OwnerViewProjector,
}

impl StatusProjector {
    pub fn new(store: Arc<dyn MetadataStore>, projector: OwnerViewProjector) -> Self {
        Self { store, projector }
    }

    /// Record `outcome` for a claimed file.
    ///
    /// The write is not conditioned on the current status; holding the claim is what
    /// makes it exclusive. `claimed_at_ms` keeps `updated_at` strictly increasing.
    /// Returns `false` when the record no longer exists.
    #[tracing::instrument(skip(self, outcome), fields(status = %outcome.status(), operation = "finalize"))]
    pub async fn finalize(
        &self,
        file_id: &str,
        owner_id: &str,
        outcome: &FileOutcome,
        claimed_at_ms: i64,
    ) -> Result<bool, AppError> {
        let written = self
            .store
            .write_outcome(file_id, outcome, next_timestamp(claimed_at_ms))
            .await?;

        if !written {
            tracing::warn!("Record disappeared before its outcome was written");
        }

        if self.projector.project(owner_id, file_id).await == ProjectionOutcome::Stale {
            tracing::warn!("Terminal status not yet visible in owner history");
        }

        Ok(written)
    }
}
