use crate::error::{ErrorResponse, HttpAppError};
use crate::extractors::OwnerId;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use wordtally_core::models::{AnalyticsItemResponse, AnalyticsListResponse, ReconcileResponse};
use wordtally_core::AppError;

/// List an owner's analysis history, newest first
#[utoipa::path(
    get,
    path = "/api/v0/owners/{owner_id}/analytics",
    tag = "analytics",
    params(
        ("owner_id" = String, Path, description = "Owner whose history is listed"),
        ("X-Owner-Id" = String, Header, description = "Caller-asserted owner id")
    ),
    responses(
        (status = 200, description = "Owner history", body = AnalyticsListResponse),
        (status = 400, description = "Missing X-Owner-Id header", body = ErrorResponse),
        (status = 403, description = "Header does not match the path owner", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, caller), fields(operation = "list_analytics"))]
pub async fn list_owner_analytics(
    State(state): State<Arc<AppState>>,
    Path(owner_id): Path<String>,
    caller: OwnerId,
) -> Result<impl IntoResponse, HttpAppError> {
    if caller.0 != owner_id {
        return Err(AppError::OwnershipMismatch(owner_id).into());
    }

    let data = state.analytics.list(&owner_id).await?;
    tracing::debug!(count = data.len(), "Listed owner analytics");

    Ok(Json(AnalyticsListResponse { data }))
}

/// Analysis record of a single file
#[utoipa::path(
    get,
    path = "/api/v0/analytics/{file_id}",
    tag = "analytics",
    params(
        ("file_id" = String, Path, description = "File id"),
        ("X-Owner-Id" = String, Header, description = "Caller-asserted owner id")
    ),
    responses(
        (status = 200, description = "File record", body = AnalyticsItemResponse),
        (status = 403, description = "File belongs to another owner", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, caller),
    fields(owner_id = %caller.0, operation = "get_analytics")
)]
pub async fn get_analytics(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
    caller: OwnerId,
) -> Result<impl IntoResponse, HttpAppError> {
    let data = state.analytics.get(&caller.0, &file_id).await?;
    Ok(Json(AnalyticsItemResponse { data }))
}

/// Delete a file and its analysis
#[utoipa::path(
    delete,
    path = "/api/v0/analytics/{file_id}",
    tag = "analytics",
    params(
        ("file_id" = String, Path, description = "File id"),
        ("X-Owner-Id" = String, Header, description = "Caller-asserted owner id")
    ),
    responses(
        (status = 204, description = "Deleted, or nothing to delete"),
        (status = 403, description = "File belongs to another owner", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, caller),
    fields(owner_id = %caller.0, operation = "delete_analytics")
)]
pub async fn delete_analytics(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
    caller: OwnerId,
) -> Result<impl IntoResponse, HttpAppError> {
    state.analytics.delete(&caller.0, &file_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Rebuild an owner's history from the primary records
///
/// Adds files missing from the history and drops entries whose file is gone.
#[utoipa::path(
    post,
    path = "/api/v0/owners/{owner_id}/analytics/reconcile",
    tag = "analytics",
    params(
        ("owner_id" = String, Path, description = "Owner whose history is repaired"),
        ("X-Owner-Id" = String, Header, description = "Caller-asserted owner id")
    ),
    responses(
        (status = 200, description = "Sweep finished", body = ReconcileResponse),
        (status = 400, description = "Missing X-Owner-Id header", body = ErrorResponse),
        (status = 403, description = "Header does not match the path owner", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, caller), fields(operation = "reconcile_analytics"))]
pub async fn reconcile_owner_analytics(
    State(state): State<Arc<AppState>>,
    Path(owner_id): Path<String>,
    caller: OwnerId,
) -> Result<impl IntoResponse, HttpAppError> {
    if caller.0 != owner_id {
        return Err(AppError::OwnershipMismatch(owner_id).into());
    }

    let data = state.analytics.reconcile(&owner_id).await?;
    Ok(Json(ReconcileResponse { data }))
}
