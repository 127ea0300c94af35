//! Engine error taxonomy and its HTTP projection.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;
use validator::ValidationErrors;

use crate::scoring::{DartError, StateMismatch};

/// Recoverable per-operation failures raised by the live scoring engine.
///
/// Every variant terminates only the offending operation: over WebSocket it
/// is reported back to the originating connection as an `error` message, and
/// it never tears down the connection or the room.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No live match exists under the given identifier.
    #[error("no live match `{0}`")]
    NoSuchMatch(Uuid),
    /// Operation requires a different match status.
    #[error("match `{id}` is {status}, operation requires a playing match")]
    MatchNotPlaying {
        /// Match the operation targeted.
        id: Uuid,
        /// Status the match was actually in.
        status: &'static str,
    },
    /// Creator-only operation attempted by someone else, or an operation by
    /// a user who is not part of the match.
    #[error("not authorized: {0}")]
    NotAuthorized(String),
    /// Undo requested with no throws on record.
    #[error("nothing to undo")]
    NothingToUndo,
    /// Malformed payload, unknown message type, or invalid dart.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    /// Connection never resolved to an identity.
    #[error("connection is not authenticated")]
    Unauthenticated,
}

impl From<DartError> for EngineError {
    fn from(err: DartError) -> Self {
        EngineError::InvalidOperation(err.to_string())
    }
}

impl From<StateMismatch> for EngineError {
    fn from(err: StateMismatch) -> Self {
        // Participants are always initialized from the match variant, so a
        // mismatch means the in-memory record is corrupt.
        EngineError::InvalidOperation(err.to_string())
    }
}

/// Application-level errors converted to HTTP responses on the REST surface.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NoSuchMatch(id) => AppError::NotFound(format!("live match `{id}`")),
            EngineError::MatchNotPlaying { .. } => AppError::Conflict(err.to_string()),
            EngineError::NotAuthorized(message) => AppError::Unauthorized(message),
            EngineError::NothingToUndo => AppError::Conflict("nothing to undo".into()),
            EngineError::InvalidOperation(message) => AppError::BadRequest(message),
            EngineError::Unauthenticated => AppError::Unauthorized("not authenticated".into()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {err}"))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
