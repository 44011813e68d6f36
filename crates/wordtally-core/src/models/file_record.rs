use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;

/// Processing status of a file.
///
/// Allowed moves: PENDING/FAILED -> IN_PROGRESS (a claim) and
/// IN_PROGRESS -> COMPLETED/FAILED (finalization). COMPLETED is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl FileStatus {
    /// Statuses from which a worker may claim the file.
    pub const CLAIMABLE: [FileStatus; 2] = [FileStatus::Pending, FileStatus::Failed];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Pending => "PENDING",
            FileStatus::InProgress => "IN_PROGRESS",
            FileStatus::Completed => "COMPLETED",
            FileStatus::Failed => "FAILED",
        }
    }

    pub fn is_claimable(&self) -> bool {
        Self::CLAIMABLE.contains(self)
    }

    /// Whether `self -> next` is a legal lifecycle edge.
    pub fn can_transition_to(&self, next: FileStatus) -> bool {
        matches!(
            (self, next),
            (FileStatus::Pending, FileStatus::InProgress)
                | (FileStatus::Failed, FileStatus::InProgress)
                | (FileStatus::InProgress, FileStatus::Completed)
                | (FileStatus::InProgress, FileStatus::Failed)
        )
    }
}

impl Display for FileStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(FileStatus::Pending),
            "IN_PROGRESS" => Ok(FileStatus::InProgress),
            "COMPLETED" => Ok(FileStatus::Completed),
            "FAILED" => Ok(FileStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid file status: {}", s)),
        }
    }
}

/// Location of the uploaded blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StorageLocation {
    pub bucket: String,
    pub key: String,
}

/// One entry of the most frequent words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WordCount {
    pub word: String,
    pub count: u64,
}

/// Word-frequency statistics for one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub total_words: u64,
    pub unique_words: u64,
    /// Mean word length in characters, rounded to two decimals
    pub avg_word_length: f64,
    pub top10_words: Vec<WordCount>,
}

impl AnalysisResult {
    pub fn empty() -> Self {
        Self {
            total_words: 0,
            unique_words: 0,
            avg_word_length: 0.0,
            top10_words: Vec::new(),
        }
    }
}

/// Terminal outcome of one analysis run.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Completed(AnalysisResult),
    Failed(String),
}

impl FileOutcome {
    pub fn status(&self) -> FileStatus {
        match self {
            FileOutcome::Completed(_) => FileStatus::Completed,
            FileOutcome::Failed(_) => FileStatus::Failed,
        }
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            FileOutcome::Completed(result) => Some(result),
            FileOutcome::Failed(_) => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            FileOutcome::Completed(_) => None,
            FileOutcome::Failed(message) => Some(message),
        }
    }
}

/// Authoritative record of one uploaded file, keyed by `file_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub file_id: String,
    pub owner_id: String,
    pub fingerprint_hash: String,
    pub storage: StorageLocation,
    pub original_file_name: String,
    pub content_type: String,
    pub status: FileStatus,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl FileRecord {
    /// A freshly registered record awaiting its upload.
    #[allow(clippy::too_many_arguments)]
    pub fn pending(
        file_id: String,
        owner_id: String,
        fingerprint_hash: String,
        storage: StorageLocation,
        original_file_name: String,
        content_type: String,
        now_ms: i64,
    ) -> Self {
        Self {
            file_id,
            owner_id,
            fingerprint_hash,
            storage,
            original_file_name,
            content_type,
            status: FileStatus::Pending,
            created_at: now_ms,
            updated_at: now_ms,
            result: None,
            error_message: None,
        }
    }

    /// The by-owner view of this record.
    pub fn owner_entry(&self) -> OwnerFileEntry {
        OwnerFileEntry {
            owner_id: self.owner_id.clone(),
            file_id: self.file_id.clone(),
            original_file_name: self.original_file_name.clone(),
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
            result: self.result.clone(),
            error_message: self.error_message.clone(),
        }
    }
}

/// Secondary view row, keyed by `(owner_id, file_id)` and listed newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerFileEntry {
    pub owner_id: String,
    pub file_id: String,
    pub original_file_name: String,
    pub status: FileStatus,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl OwnerFileEntry {
    /// Whether this entry mirrors the mutable fields of `record`.
    pub fn mirrors(&self, record: &FileRecord) -> bool {
        self.status == record.status
            && self.updated_at == record.updated_at
            && self.result == record.result
            && self.error_message == record.error_message
    }
}
