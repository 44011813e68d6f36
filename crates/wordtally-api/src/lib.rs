//! Wordtally API Library
//!
//! HTTP handlers, the upload coordinator, middleware and application setup.

mod api_doc;
pub mod constants;
mod extractors;
mod handlers;
mod middleware;
pub mod services;
pub mod setup;
mod telemetry;

pub mod error;
pub mod state;

pub use error::{ErrorBody, ErrorResponse, HttpAppError};
pub use services::{AnalyticsService, UploadCoordinator};
pub use state::AppState;
