//! Request extractors

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use wordtally_core::AppError;

use crate::constants::OWNER_ID_HEADER;
use crate::error::HttpAppError;

/// Caller-asserted owner id from the `X-Owner-Id` header.
///
/// Missing or blank headers are rejected with 400. Whether the owner matches the
/// resource is decided by the handler.
#[derive(Debug, Clone)]
pub struct OwnerId(pub String);

impl<S> FromRequestParts<S> for OwnerId
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let owner_id = parts
            .headers
            .get(OWNER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                AppError::BadRequest(format!("Missing {} header", OWNER_ID_HEADER))
            })?;

        Ok(OwnerId(owner_id.to_string()))
    }
}
