use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;

use crate::arbitrator::{ClaimArbitrator, ClaimOutcome};
use crate::event::BlobEvent;

/// Optional sink for per-event outcomes (tests, diagnostics).
pub type OutcomeSender = mpsc::UnboundedSender<(BlobEvent, ClaimOutcome)>;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Events processed at the same time.
    pub max_concurrency: usize,
    /// Events buffered before `notify` waits.
    pub queue_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            queue_capacity: 1024,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Notification worker is not running")]
    Closed,
}

/// Handle for submitting blob-created notifications.
#[derive(Clone)]
pub struct BlobNotifier {
    tx: mpsc::Sender<BlobEvent>,
}

impl BlobNotifier {
    /// Enqueue an event, waiting for room when the queue is full.
    pub async fn notify(&self, event: BlobEvent) -> Result<(), NotifyError> {
        self.tx.send(event).await.map_err(|_| NotifyError::Closed)
    }
}

/// Receives notifications and runs each one on its own task.
///
/// Duplicate events may run concurrently; exclusivity comes from the status claim
/// in [`ClaimArbitrator`], not from this queue.
pub struct NotificationWorker {
    shutdown_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl NotificationWorker {
    /// Spawn the worker loop and return the notifier that feeds it.
    pub fn start(
        arbitrator: Arc<ClaimArbitrator>,
        config: WorkerConfig,
        outcome_tx: Option<OutcomeSender>,
    ) -> (BlobNotifier, Self) {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let handle = tokio::spawn(Self::run(arbitrator, config, rx, shutdown_rx, outcome_tx));

        (BlobNotifier { tx }, Self { shutdown_tx, handle })
    }

    async fn run(
        arbitrator: Arc<ClaimArbitrator>,
        config: WorkerConfig,
        mut rx: mpsc::Receiver<BlobEvent>,
        mut shutdown_rx: mpsc::Receiver<()>,
        outcome_tx: Option<OutcomeSender>,
    ) {
        let max_concurrency = config.max_concurrency.max(1);
        tracing::info!(
            max_concurrency = max_concurrency,
            queue_capacity = config.queue_capacity,
            "Notification worker started"
        );

        let semaphore = Arc::new(Semaphore::new(max_concurrency));

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("Notification worker shutting down");
                    break;
                }
                event = rx.recv() => match event {
                    Some(event) => {
                        Self::dispatch(&arbitrator, &semaphore, &outcome_tx, event).await;
                    }
                    None => break,
                },
            }
        }

        // Accepted events were already acknowledged to their senders; run them too.
        rx.close();
        let mut drained = 0usize;
        while let Some(event) = rx.recv().await {
            Self::dispatch(&arbitrator, &semaphore, &outcome_tx, event).await;
            drained += 1;
        }
        if drained > 0 {
            tracing::info!(drained = drained, "Processed queued notifications before stopping");
        }

        // Let in-flight invocations finish.
        let _ = semaphore.acquire_many(max_concurrency as u32).await;
        tracing::info!("Notification worker stopped");
    }

    /// Run one event on its own task once a concurrency slot is free.
    async fn dispatch(
        arbitrator: &Arc<ClaimArbitrator>,
        semaphore: &Arc<Semaphore>,
        outcome_tx: &Option<OutcomeSender>,
        event: BlobEvent,
    ) {
        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            return;
        };

        let arbitrator = arbitrator.clone();
        let outcome_tx = outcome_tx.clone();
        tokio::spawn(async move {
            let _permit = permit;
            let outcome = arbitrator.on_blob_created(&event).await;
            tracing::debug!(key = %event.key, outcome = ?outcome, "Notification handled");
            if let Some(tx) = outcome_tx {
                let _ = tx.send((event, outcome));
            }
        });
    }

    /// Stop taking new events, process the ones already queued and wait for all of
    /// them to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.handle.await {
            tracing::error!(error = %e, "Notification worker task panicked");
        }
    }
}
