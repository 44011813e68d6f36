pub mod analytics;
pub mod upload;

pub use analytics::AnalyticsService;
pub use upload::UploadCoordinator;
