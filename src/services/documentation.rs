use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Dartclub Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::matches::create_match,
        crate::routes::matches::get_match,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::live::CreateMatchRequest,
            crate::dto::live::PlayerInput,
            crate::dto::live::MatchSnapshot,
            crate::dto::live::ParticipantSnapshot,
            crate::dto::live::ThrowSnapshot,
            crate::dto::ws::ClientMessage,
            crate::dto::ws::ServerMessage,
            crate::scoring::GameVariant,
            crate::scoring::ScoreState,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "matches", description = "Match bootstrap operations"),
        (name = "scoring", description = "WebSocket operations for live scoring clients"),
    )
)]
pub struct ApiDoc;
