use std::sync::Arc;
use wordtally_core::{AnalysisResult, AppError, FileOutcome, FileStatus};
use wordtally_db::{MetadataStore, OwnerViewProjector};
use wordtally_processing::{analyze_stream, StreamAnalysisError};
use wordtally_storage::keys::{decode_notification_key, file_id_from_key};
use wordtally_storage::Storage;

use crate::event::BlobEvent;
use crate::finalize::{next_timestamp, StatusProjector};

/// How one notification was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The key does not follow the upload key layout; the event was dropped.
    InvalidKey,
    /// No record for the file id (stale notification or metadata race).
    RecordMissing,
    AlreadyCompleted,
    AlreadyInProgress,
    /// Another invocation claimed the file first.
    LostRace,
    /// The store failed while loading or claiming; nothing was processed.
    ClaimError,
    /// The claim succeeded but the terminal status could not be written.
    FinalizeError,
    /// The file was deleted while it was being analyzed; the outcome was discarded.
    RecordDeleted,
    Completed,
    Failed(String),
}

impl ClaimOutcome {
    /// Whether this invocation ran the analysis.
    pub fn processed(&self) -> bool {
        matches!(
            self,
            ClaimOutcome::Completed
                | ClaimOutcome::Failed(_)
                | ClaimOutcome::FinalizeError
                | ClaimOutcome::RecordDeleted
        )
    }
}

/// Decides which notification gets to process a file, then processes it.
#[derive(Clone)]
pub struct ClaimArbitrator {
    store: Arc<dyn MetadataStore>,
    storage: Arc<dyn Storage>,
    projector: OwnerViewProjector,
    status: StatusProjector,
}

impl ClaimArbitrator {
    pub fn new(
        store: Arc<dyn MetadataStore>,
        storage: Arc<dyn Storage>,
        projector: OwnerViewProjector,
    ) -> Self {
        let status = StatusProjector::new(store.clone(), projector.clone());
        Self {
            store,
            storage,
            projector,
            status,
        }
    }

    /// Handle one blob-created notification.
    ///
    /// Safe under duplicate and concurrent delivery: only the invocation whose
    /// compare-and-swap moves the record to IN_PROGRESS runs the analysis.
    #[tracing::instrument(
        skip(self, event),
        fields(bucket = %event.bucket, key = %event.key, file_id, operation = "on_blob_created")
    )]
    pub async fn on_blob_created(&self, event: &BlobEvent) -> ClaimOutcome {
        let key = decode_notification_key(&event.key);
        let Some(file_id) = file_id_from_key(&key) else {
            tracing::warn!(decoded_key = %key, "Skipping notification for foreign key");
            return ClaimOutcome::InvalidKey;
        };
        tracing::Span::current().record("file_id", file_id.as_str());

        let record = match self.store.get(&file_id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                tracing::warn!("Skipping notification: no metadata record");
                return ClaimOutcome::RecordMissing;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load metadata record");
                return ClaimOutcome::ClaimError;
            }
        };

        match record.status {
            FileStatus::Completed => {
                tracing::info!("Skipping notification: already completed");
                return ClaimOutcome::AlreadyCompleted;
            }
            FileStatus::InProgress => {
                tracing::info!("Skipping notification: already in progress");
                return ClaimOutcome::AlreadyInProgress;
            }
            FileStatus::Pending | FileStatus::Failed => {}
        }

        let claimed_at = next_timestamp(record.updated_at);
        match self
            .store
            .try_transition(
                &file_id,
                &FileStatus::CLAIMABLE,
                FileStatus::InProgress,
                claimed_at,
            )
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                tracing::info!("Claim lost to a concurrent invocation");
                return ClaimOutcome::LostRace;
            }
            Err(e) => {
                // Surfaced as a failed claim, never retried.
                tracing::error!(error = %e, "Claim attempt failed, not proceeding");
                return ClaimOutcome::ClaimError;
            }
        }

        tracing::info!(owner_id = %record.owner_id, "File claimed for analysis");
        self.projector.project(&record.owner_id, &file_id).await;

        let outcome = match self.analyze(&record.storage.key).await {
            Ok(result) => {
                tracing::info!(
                    total_words = result.total_words,
                    unique_words = result.unique_words,
                    "Analysis completed"
                );
                FileOutcome::Completed(result)
            }
            Err(e) => {
                tracing::error!(error = %e, error_type = e.error_type(), "Analysis failed");
                FileOutcome::Failed(e.to_string())
            }
        };

        match self
            .status
            .finalize(&file_id, &record.owner_id, &outcome, claimed_at)
            .await
        {
            Ok(true) => {}
            Ok(false) => return ClaimOutcome::RecordDeleted,
            Err(e) => {
                tracing::error!(error = %e, "Failed to record analysis outcome; record stays IN_PROGRESS");
                return ClaimOutcome::FinalizeError;
            }
        }

        match outcome {
            FileOutcome::Completed(_) => ClaimOutcome::Completed,
            FileOutcome::Failed(message) => ClaimOutcome::Failed(message),
        }
    }

    async fn analyze(&self, storage_key: &str) -> Result<AnalysisResult, AppError> {
        let stream = self
            .storage
            .download_stream(storage_key)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;
        analyze_stream(stream).await.map_err(|e| match e {
            StreamAnalysisError::Decode(decode) => AppError::Decode(decode.to_string()),
            StreamAnalysisError::Read(read) => AppError::Storage(read.to_string()),
        })
    }
}
