//! Wordtally Core Library
//!
//! Domain models, error types, configuration and identity derivation shared by
//! every wordtally component.

pub mod config;
pub mod error;
pub mod identity;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{BaseConfig, Config, ServiceConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use identity::{derive_file_id, fingerprint, is_file_id, FileIdentity};
pub use models::{
    AnalysisResult, AnalyticsItem, FileOutcome, FileRecord, FileStatus, OwnerFileEntry,
    StorageLocation, WordCount,
};
pub use storage_types::{MetadataBackend, StorageBackend};

/// Current time as epoch milliseconds, the timestamp unit of every record.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
