//! Upload coordination: deduplicate by file identity, issue a write credential and
//! register the PENDING record.

use std::sync::Arc;
use std::time::Duration;
use wordtally_core::models::{PresignRequest, PresignedUpload};
use wordtally_core::{now_millis, AppError, FileIdentity, FileRecord, StorageLocation};
use wordtally_db::{CreateOutcome, MetadataStore, OwnerViewProjector};
use wordtally_storage::keys::build_upload_key;
use wordtally_storage::Storage;

use crate::error::storage_error;

#[derive(Clone)]
pub struct UploadCoordinator {
    store: Arc<dyn MetadataStore>,
    storage: Arc<dyn Storage>,
    projector: OwnerViewProjector,
    url_ttl: Duration,
}

impl UploadCoordinator {
    pub fn new(
        store: Arc<dyn MetadataStore>,
        storage: Arc<dyn Storage>,
        projector: OwnerViewProjector,
        url_ttl: Duration,
    ) -> Self {
        Self {
            store,
            storage,
            projector,
            url_ttl,
        }
    }

    /// Register an upload and hand out its write credential.
    ///
    /// Fails with `Conflict` when the owner already registered this fingerprint,
    /// whatever the existing record's status. The lookup and the conditional create
    /// report the same conflict, so callers cannot tell which race they lost.
    /// Nothing here is retried; repeating the whole call is safe.
    #[tracing::instrument(
        skip(self, request),
        fields(owner_id = %request.owner_id, file_id, operation = "request_upload")
    )]
    pub async fn request_upload(
        &self,
        request: &PresignRequest,
    ) -> Result<PresignedUpload, AppError> {
        let identity = FileIdentity::new(&request.owner_id, &request.fingerprint_hash);
        tracing::Span::current().record("file_id", identity.file_id.as_str());

        if self.store.get(&identity.file_id).await?.is_some() {
            tracing::info!("Fingerprint already registered");
            return Err(AppError::Conflict {
                file_id: identity.file_id,
            });
        }

        let key = build_upload_key(&identity.owner_id, &identity.file_id, &request.file_name)
            .map_err(storage_error)?;

        let upload_url = self
            .storage
            .presigned_put_url(&key, &request.content_type, self.url_ttl)
            .await
            .map_err(storage_error)?;

        let now = now_millis();
        let record = FileRecord::pending(
            identity.file_id.clone(),
            identity.owner_id.clone(),
            identity.fingerprint_hash.clone(),
            StorageLocation {
                bucket: self.storage.bucket().to_string(),
                key: key.clone(),
            },
            request.file_name.clone(),
            request.content_type.clone(),
            now,
        );

        match self.store.create_pending(&record).await? {
            CreateOutcome::Created => {}
            CreateOutcome::AlreadyExists => {
                tracing::info!("Lost registration race for fingerprint");
                return Err(AppError::Conflict {
                    file_id: identity.file_id,
                });
            }
        }

        self.projector
            .project(&identity.owner_id, &identity.file_id)
            .await;

        tracing::info!(key = %key, "Upload registered");

        Ok(PresignedUpload {
            upload_url,
            key,
            file_id: identity.file_id,
            expires_at: now + self.url_ttl.as_millis() as i64,
        })
    }
}
