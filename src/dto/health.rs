//! Health check response.

use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status (always "ok"; the engine has no external dependency to degrade on).
    pub status: String,
    /// Number of live matches currently held in memory.
    pub live_matches: usize,
}

impl HealthResponse {
    /// Build a healthy response with the current live-match count.
    pub fn ok(live_matches: usize) -> Self {
        Self {
            status: "ok".to_string(),
            live_matches,
        }
    }
}
