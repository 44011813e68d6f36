//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod services;
pub mod storage;

use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use wordtally_core::Config;
use wordtally_worker::NotificationWorker;

/// Everything `main` needs to run the service.
pub struct InitializedApp {
    pub state: Arc<AppState>,
    pub router: axum::Router,
    pub worker: NotificationWorker,
}

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<InitializedApp> {
    // Validate configuration first - fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.log_format())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = config.environment(),
        "Configuration loaded and validated successfully"
    );

    let store = database::setup_metadata_store(&config).await?;
    let blobs = storage::setup_storage(&config).await?;

    let (state, worker) = services::initialize_services(&config, store, blobs);

    let router = routes::setup_routes(&config, state.clone()).await?;

    Ok(InitializedApp {
        state,
        router,
        worker,
    })
}
