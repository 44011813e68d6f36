//! Storage setup and initialization

use anyhow::{Context, Result};
use wordtally_core::{Config, StorageBackend};
use wordtally_storage::{create_storage, upload_signer};

use crate::state::StorageState;

/// Build the blob store; the local backend also gets the gateway signer.
pub async fn setup_storage(config: &Config) -> Result<StorageState> {
    tracing::info!("Initializing storage abstraction...");
    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;
    let backend_type = storage.backend_type();
    tracing::info!(
        backend = %backend_type,
        bucket = storage.bucket(),
        "Storage abstraction initialized successfully"
    );

    let gateway_signer = if backend_type == StorageBackend::Local {
        Some(upload_signer(config).context("Local storage needs UPLOAD_SIGNING_SECRET")?)
    } else {
        None
    };

    Ok(StorageState {
        storage,
        gateway_signer,
    })
}
