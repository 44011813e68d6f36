use crate::constants::NOTIFICATION_TOKEN_HEADER;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use utoipa::ToSchema;
use wordtally_core::AppError;
use wordtally_worker::BlobNotification;

#[derive(Debug, Serialize, ToSchema)]
pub struct AcceptedEvents {
    /// Object-created records queued for processing
    pub accepted: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AcceptedEventsResponse {
    pub data: AcceptedEvents,
}

fn check_token(expected: Option<&str>, headers: &HeaderMap) -> Result<(), AppError> {
    let Some(expected) = expected else {
        return Ok(());
    };
    let provided = headers
        .get(NOTIFICATION_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
        Ok(())
    } else {
        Err(AppError::Unauthorized(
            "Invalid notification token".to_string(),
        ))
    }
}

/// Ingest blob-created notifications
///
/// Accepts a bare `{bucket, key}` or an S3 event document. Every object-created
/// record is queued; delivery may repeat.
#[utoipa::path(
    post,
    path = "/api/v0/events/blob-created",
    tag = "events",
    request_body(content = serde_json::Value, description = "`{bucket, key}` or an S3 event notification document"),
    responses(
        (status = 202, description = "Notifications queued", body = AcceptedEventsResponse),
        (status = 400, description = "Unrecognized payload", body = ErrorResponse),
        (status = 401, description = "Missing or wrong notification token", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, headers, notification), fields(operation = "ingest_blob_events"))]
pub async fn blob_created(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ValidatedJson(notification): ValidatedJson<BlobNotification>,
) -> Result<impl IntoResponse, HttpAppError> {
    check_token(state.config.notification_token(), &headers)?;

    let events = notification.into_events();
    let accepted = events.len();
    for event in events {
        tracing::debug!(bucket = %event.bucket, key = %event.key, "Queueing blob notification");
        state
            .notifier
            .notify(event)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(AcceptedEventsResponse {
            data: AcceptedEvents { accepted },
        }),
    ))
}
