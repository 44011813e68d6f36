//! Application state shared by every handler.

use std::sync::Arc;
use wordtally_core::Config;
use wordtally_db::MetadataStore;
use wordtally_storage::{Storage, UploadSigner};
use wordtally_worker::BlobNotifier;

use crate::services::{AnalyticsService, UploadCoordinator};

/// Blob storage and, for the local backend, the signer its upload gateway verifies with.
#[derive(Clone)]
pub struct StorageState {
    pub storage: Arc<dyn Storage>,
    /// `None` when uploads go straight to S3 and the gateway route is disabled.
    pub gateway_signer: Option<UploadSigner>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn MetadataStore>,
    pub blobs: StorageState,
    pub uploads: UploadCoordinator,
    pub analytics: AnalyticsService,
    pub notifier: BlobNotifier,
}
