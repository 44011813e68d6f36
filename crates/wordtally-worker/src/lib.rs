//! Wordtally Worker Library
//!
//! Turns blob-created notifications into analysis runs. The [`ClaimArbitrator`]
//! decides, through a compare-and-swap on the record status, which invocation gets
//! to analyze a file; the [`StatusProjector`] records the outcome; the
//! [`NotificationWorker`] runs invocations concurrently.

pub mod arbitrator;
pub mod event;
pub mod finalize;
pub mod queue;

pub use arbitrator::{ClaimArbitrator, ClaimOutcome};
pub use event::{BlobEvent, BlobNotification};
pub use finalize::StatusProjector;
pub use queue::{BlobNotifier, NotificationWorker, NotifyError, OutcomeSender, WorkerConfig};
