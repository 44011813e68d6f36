use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;
use validator::Validate;
use wordtally_core::models::{PresignRequest, PresignResponse};
use wordtally_core::AppError;

/// Request a write credential for a new file
#[utoipa::path(
    post,
    path = "/api/v0/uploads/presign",
    tag = "uploads",
    request_body = PresignRequest,
    responses(
        (status = 200, description = "Upload registered and URL issued", body = PresignResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Fingerprint already registered by this owner", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, request),
    fields(owner_id = %request.owner_id, file_name = %request.file_name, operation = "presign_upload")
)]
pub async fn presign_upload(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<PresignRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate().map_err(AppError::from)?;

    let upload = state.uploads.request_upload(&request).await?;

    Ok(Json(PresignResponse { data: upload }))
}
