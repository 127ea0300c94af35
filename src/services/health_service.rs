use crate::{dto::health::HealthResponse, state::SharedState};

/// Respond with the health payload, including the live match count.
pub fn health_status(state: &SharedState) -> HealthResponse {
    HealthResponse::ok(state.store().len())
}
