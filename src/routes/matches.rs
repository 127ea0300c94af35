//! REST routes bootstrapping live matches.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::live::{CreateMatchRequest, MatchSnapshot},
    error::AppError,
    services::match_service,
    state::SharedState,
};

/// Routes handling match bootstrap operations (creation & lookup).
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/matches", post(create_match))
        .route("/matches/{id}", get(get_match))
}

/// Create a fresh match in the Waiting state.
#[utoipa::path(
    post,
    path = "/matches",
    tag = "matches",
    request_body = CreateMatchRequest,
    responses(
        (status = 200, description = "Match created", body = MatchSnapshot),
        (status = 400, description = "Invalid variant or participant list")
    )
)]
pub async fn create_match(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateMatchRequest>>,
) -> Result<Json<MatchSnapshot>, AppError> {
    let snapshot = match_service::create_match(&state, payload)?;
    Ok(Json(snapshot))
}

/// Fetch the current snapshot of a live match.
#[utoipa::path(
    get,
    path = "/matches/{id}",
    tag = "matches",
    params(("id" = Uuid, Path, description = "Identifier of the match to fetch")),
    responses(
        (status = 200, description = "Current match snapshot", body = MatchSnapshot),
        (status = 404, description = "No live match with this identifier")
    )
)]
pub async fn get_match(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MatchSnapshot>, AppError> {
    let snapshot = match_service::get_match(&state, id)?;
    Ok(Json(snapshot))
}
