//! Metadata store repositories
//!
//! `store` defines the [`MetadataStore`] contract over both index views. `postgres`
//! and `memory` implement it; `projection` keeps the owner view in line with the
//! primary view.
pub mod memory;
pub mod postgres;
pub mod projection;
pub mod store;

pub use memory::InMemoryMetadataStore;
pub use postgres::PgMetadataStore;
pub use projection::{OwnerViewProjector, ProjectionOutcome, ReconcileReport};
pub use store::{CreateOutcome, MetadataStore};
