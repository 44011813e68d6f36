use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::file_record::{AnalysisResult, FileStatus, OwnerFileEntry};

/// One row of an owner's analytics history.
///
/// `result` is only exposed for COMPLETED files and `errorMessage` only for FAILED
/// ones, whatever else is stored on the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsItem {
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

impl From<OwnerFileEntry> for AnalyticsItem {
    fn from(entry: OwnerFileEntry) -> Self {
        let result = match entry.status {
            FileStatus::Completed => entry.result,
            _ => None,
        };
        let error_message = match entry.status {
            FileStatus::Failed => entry.error_message,
            _ => None,
        };
        Self {
            file_id: entry.file_id,
            original_file_name: entry.original_file_name,
            status: entry.status,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
            result,
            error_message,
        }
    }
}

/// Owner history, newest first
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnalyticsListResponse {
    pub data: Vec<AnalyticsItem>,
}

/// Single analytics item
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnalyticsItemResponse {
    pub data: AnalyticsItem,
}

/// Counts from an owner-view repair sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileSummary {
    /// Entries rewritten from (or added for) a primary record
    pub projected: usize,
    /// Entries dropped because their primary record is gone
    pub removed: usize,
    /// Entries whose projection still failed after every retry
    pub stale: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReconcileResponse {
    pub data: ReconcileSummary,
}
