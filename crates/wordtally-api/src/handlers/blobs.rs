//! Upload gateway for the local storage backend.
//!
//! Plays the part S3 plays for presigned URLs: checks the signature issued by the
//! upload coordinator, accepts exactly one write per key and emits the blob-created
//! notification for it.

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;
use wordtally_core::AppError;
use wordtally_storage::keys::encode_key_for_url;
use wordtally_storage::signing::unix_now;
use wordtally_worker::BlobEvent;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SignedUploadParams {
    /// Unix timestamp (seconds) the URL stops being valid at
    pub expires: Option<u64>,
    /// Hex HMAC-SHA256 issued with the URL
    pub signature: Option<String>,
}

/// Store an object through a signed upload URL
#[utoipa::path(
    put,
    path = "/api/v0/blobs/{key}",
    tag = "blobs",
    params(
        ("key" = String, Path, description = "Storage key the URL was issued for"),
        SignedUploadParams
    ),
    request_body(content = String, content_type = "text/plain"),
    responses(
        (status = 201, description = "Object stored and notification queued"),
        (status = 403, description = "Missing, invalid or expired signature", body = ErrorResponse),
        (status = 404, description = "Gateway disabled for this storage backend", body = ErrorResponse),
        (status = 409, description = "An object already exists at this key", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, params, headers, body), fields(size = body.len(), operation = "put_blob"))]
pub async fn put_blob(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Query(params): Query<SignedUploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, HttpAppError> {
    let signer = state.blobs.gateway_signer.as_ref().ok_or_else(|| {
        AppError::NotFound("Upload gateway is not enabled for this storage backend".to_string())
    })?;

    let (Some(expires), Some(signature)) = (params.expires, params.signature.as_deref()) else {
        return Err(AppError::InvalidSignature("Upload URL is not signed".to_string()).into());
    };

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(DEFAULT_CONTENT_TYPE);

    signer
        .verify(&key, content_type, expires, signature, unix_now())
        .map_err(|e| AppError::InvalidSignature(e.to_string()))?;

    state
        .blobs
        .storage
        .put_if_absent(&key, body, content_type)
        .await?;

    tracing::info!(key = %key, "Blob stored");

    let event = BlobEvent::new(state.blobs.storage.bucket(), encode_key_for_url(&key));
    state
        .notifier
        .notify(event)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(StatusCode::CREATED)
}
