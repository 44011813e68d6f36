//! API constants

/// Versioned prefix every API route is nested under.
pub const API_PREFIX: &str = "/api/v0";

/// Header carrying the caller-asserted owner id.
pub const OWNER_ID_HEADER: &str = "X-Owner-Id";

/// Header carrying the shared secret for the notification ingest endpoint.
pub const NOTIFICATION_TOKEN_HEADER: &str = "X-Notification-Token";

pub const REQUEST_ID_HEADER: &str = "X-Request-ID";
