//! Application services and external collaborator seams.

/// OpenAPI documentation generation.
pub mod documentation;
/// Finalization sink handing completed matches off for permanent storage.
pub mod finalize;
/// Health check service.
pub mod health_service;
/// Identity resolution for connecting scorers.
pub mod identity;
/// Match bootstrap operations.
pub mod match_service;
/// WebSocket connection and message handling service.
pub mod websocket_service;
