use async_trait::async_trait;
use wordtally_core::{AppError, FileOutcome, FileRecord, FileStatus, OwnerFileEntry};

/// Result of a conditional create on the primary view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// A record with the same file id already existed; nothing was written.
    AlreadyExists,
}

/// Metadata store holding both index views of every file.
///
/// The primary view (by file id) is authoritative. The owner view is a projection
/// of it, written through [`crate::OwnerViewProjector`].
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Primary record by file id.
    async fn get(&self, file_id: &str) -> Result<Option<FileRecord>, AppError>;

    /// Insert `record` unless a record with its file id exists.
    async fn create_pending(&self, record: &FileRecord) -> Result<CreateOutcome, AppError>;

    /// Compare-and-swap on status.
    ///
    /// Moves the record to `to` only if its current status is one of `from`, clearing
    /// `result` and `error_message` and setting `updated_at = at_ms`. Returns `false`
    /// when the precondition does not hold or the record is missing. Of several
    /// concurrent callers observing the same precondition, exactly one gets `true`.
    async fn try_transition(
        &self,
        file_id: &str,
        from: &[FileStatus],
        to: FileStatus,
        at_ms: i64,
    ) -> Result<bool, AppError>;

    /// Unconditionally store a terminal outcome. Returns `false` if the record is gone.
    async fn write_outcome(
        &self,
        file_id: &str,
        outcome: &FileOutcome,
        at_ms: i64,
    ) -> Result<bool, AppError>;

    async fn get_owner_entry(
        &self,
        owner_id: &str,
        file_id: &str,
    ) -> Result<Option<OwnerFileEntry>, AppError>;

    /// Insert or replace an owner-view entry, atomically conditioned on the primary
    /// record still existing. An entry never replaces one with a newer `updated_at`,
    /// so late writers cannot roll the view back.
    ///
    /// Returns `false` (and writes nothing) when the primary record is gone.
    async fn upsert_owner_entry(&self, entry: &OwnerFileEntry) -> Result<bool, AppError>;

    /// Remove an owner-view entry whose primary record no longer exists. Leaves the
    /// entry alone if the primary record is present (e.g. re-registered meanwhile).
    async fn remove_orphaned_owner_entry(
        &self,
        owner_id: &str,
        file_id: &str,
    ) -> Result<(), AppError>;

    /// Primary records registered by `owner_id`, in no particular order.
    async fn list_records_by_owner(&self, owner_id: &str) -> Result<Vec<FileRecord>, AppError>;

    /// Owner history, newest `created_at` first.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<OwnerFileEntry>, AppError>;

    /// Remove the file from both views. Missing rows are not an error.
    async fn delete(&self, file_id: &str, owner_id: &str) -> Result<(), AppError>;

    /// Cheap connectivity check for readiness checks.
    async fn ping(&self) -> Result<(), AppError>;
}
