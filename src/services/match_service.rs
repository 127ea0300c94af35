//! Match bootstrap operations backing the REST surface.

use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::live::{CreateMatchRequest, MatchSnapshot},
    error::AppError,
    state::{SharedState, match_store::NewParticipant},
};

/// Create a live match in the Waiting state from a validated request.
pub fn create_match(
    state: &SharedState,
    request: CreateMatchRequest,
) -> Result<MatchSnapshot, AppError> {
    request.validate()?;

    let players = request
        .players
        .into_iter()
        .map(|player| NewParticipant {
            user_id: player.user_id,
            name: player.name,
        })
        .collect();

    let live = state
        .store()
        .create(request.variant, players, request.created_by)?;
    Ok(MatchSnapshot::from(&live))
}

/// Fetch the current snapshot of one live match.
pub fn get_match(state: &SharedState, id: Uuid) -> Result<MatchSnapshot, AppError> {
    let live = state.store().snapshot(id)?;
    Ok(MatchSnapshot::from(&live))
}
