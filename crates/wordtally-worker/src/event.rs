//! Blob-created notifications.
//!
//! Keys are carried in notification form: `+` stands for a space and other
//! reserved characters are percent-encoded, as in S3 event notifications. The
//! arbitrator decodes them before use.

use serde::{Deserialize, Serialize};

/// One object-created notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobEvent {
    pub bucket: String,
    pub key: String,
}

impl BlobEvent {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3EventDocument {
    #[serde(rename = "Records")]
    pub records: Vec<S3EventRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3EventRecord {
    #[serde(rename = "eventName", default)]
    pub event_name: Option<String>,
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Object {
    pub key: String,
}

/// Accepted notification payloads: a bare `{bucket, key}` or an S3 event document.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BlobNotification {
    S3(S3EventDocument),
    Direct(BlobEvent),
}

impl BlobNotification {
    /// Flatten into events. S3 records for anything other than object creation are dropped.
    pub fn into_events(self) -> Vec<BlobEvent> {
        match self {
            BlobNotification::Direct(event) => vec![event],
            BlobNotification::S3(document) => document
                .records
                .into_iter()
                .filter(|record| {
                    record
                        .event_name
                        .as_deref()
                        .is_none_or(|name| name.starts_with("ObjectCreated"))
                })
                .map(|record| BlobEvent {
                    bucket: record.s3.bucket.name,
                    key: record.s3.object.key,
                })
                .collect(),
        }
    }
}
