pub mod analytics;
pub mod blobs;
pub mod events;
pub mod uploads;
