//! Wires services and the notification worker from their collaborators.

use std::sync::Arc;
use std::time::Duration;
use wordtally_core::Config;
use wordtally_db::{MetadataStore, OwnerViewProjector};
use wordtally_worker::{ClaimArbitrator, NotificationWorker, WorkerConfig};

use crate::services::{AnalyticsService, UploadCoordinator};
use crate::state::{AppState, StorageState};

/// Build the application state and start the notification worker.
pub fn initialize_services(
    config: &Config,
    store: Arc<dyn MetadataStore>,
    blobs: StorageState,
) -> (Arc<AppState>, NotificationWorker) {
    let projector = OwnerViewProjector::new(store.clone(), config.projection_max_attempts());

    let arbitrator = Arc::new(ClaimArbitrator::new(
        store.clone(),
        blobs.storage.clone(),
        projector.clone(),
    ));
    let (notifier, worker) = NotificationWorker::start(
        arbitrator,
        WorkerConfig {
            max_concurrency: config.worker_max_concurrency(),
            queue_capacity: config.worker_queue_capacity(),
        },
        None,
    );

    let uploads = UploadCoordinator::new(
        store.clone(),
        blobs.storage.clone(),
        projector.clone(),
        Duration::from_secs(config.upload_url_ttl_secs()),
    );
    let analytics = AnalyticsService::new(store.clone(), blobs.storage.clone(), projector);

    let state = Arc::new(AppState {
        config: config.clone(),
        store,
        blobs,
        uploads,
        analytics,
        notifier,
    });

    (state, worker)
}
