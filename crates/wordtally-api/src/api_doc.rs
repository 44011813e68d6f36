//! OpenAPI documentation served at `/api/openapi.json`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use wordtally_core::models;

/// OpenAPI document for the current API version.
pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Wordtally API",
        version = "0.1.0",
        description = "Upload text files, have each one analyzed exactly once, and read back word-frequency statistics. All endpoints are versioned under /api/v0/."
    ),
    paths(
        handlers::uploads::presign_upload,
        handlers::analytics::list_owner_analytics,
        handlers::analytics::reconcile_owner_analytics,
        handlers::analytics::get_analytics,
        handlers::analytics::delete_analytics,
        handlers::events::blob_created,
        handlers::blobs::put_blob,
    ),
    components(schemas(
        models::PresignRequest,
        models::PresignedUpload,
        models::PresignResponse,
        models::AnalyticsItem,
        models::AnalyticsListResponse,
        models::AnalyticsItemResponse,
        models::ReconcileSummary,
        models::ReconcileResponse,
        models::AnalysisResult,
        models::WordCount,
        models::FileStatus,
        handlers::events::AcceptedEvents,
        handlers::events::AcceptedEventsResponse,
        error::ErrorResponse,
        error::ErrorBody,
    )),
    tags(
        (name = "uploads", description = "Upload registration and deduplication"),
        (name = "analytics", description = "Per-owner analysis history"),
        (name = "events", description = "Blob-created notification ingest"),
        (name = "blobs", description = "Signed upload gateway for local storage"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_lists_versioned_paths() {
        let spec = get_openapi_spec();
        assert!(spec.paths.paths.contains_key("/api/v0/uploads/presign"));
        assert!(spec
            .paths
            .paths
            .contains_key("/api/v0/owners/{owner_id}/analytics"));
    }
}
