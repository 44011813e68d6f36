use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::identity::is_file_id;

/// Request a write credential for a new upload
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PresignRequest {
    /// Original file name, shown in the owner's history
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 255,
        message = "fileName must be between 1 and 255 characters"
    ))]
    pub file_name: String,
    /// MIME type the client will upload with
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 255,
        message = "contentType must be between 1 and 255 characters"
    ))]
    pub content_type: String,
    /// Caller-supplied owner identifier
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 128,
        message = "ownerId must be between 1 and 128 characters"
    ))]
    #[validate(custom(function = "validate_owner_id"))]
    pub owner_id: String,
    /// Hex SHA-256 over `name|size|lastModified`
    #[serde(default)]
    #[validate(custom(function = "validate_fingerprint"))]
    pub fingerprint_hash: String,
}

fn validate_owner_id(owner_id: &str) -> Result<(), ValidationError> {
    if owner_id.contains('/') || owner_id.contains('\\') {
        let mut err = ValidationError::new("owner_id_separator");
        err.message = Some("ownerId must not contain path separators".into());
        return Err(err);
    }
    Ok(())
}

fn validate_fingerprint(fingerprint: &str) -> Result<(), ValidationError> {
    if !is_file_id(fingerprint) {
        let mut err = ValidationError::new("fingerprint_hash");
        err.message = Some("fingerprintHash must be 64 hex characters".into());
        return Err(err);
    }
    Ok(())
}

/// Issued credential for a direct upload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUpload {
    /// URL the client PUTs the file body to
    pub upload_url: String,
    /// Storage key the blob will be written under
    pub key: String,
    pub file_id: String,
    /// Epoch milliseconds after which the URL is rejected
    pub expires_at: i64,
}

/// Envelope for a successful presign call
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PresignResponse {
    pub data: PresignedUpload,
}
