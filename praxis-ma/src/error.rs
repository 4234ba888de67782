//! Error types for praxis-ma
//!
//! Defines the module access engine's error taxonomy using thiserror.
//! Every variant maps to exactly one HTTP status; mutating endpoints return
//! 4xx with a `{message}` body that route guards surface verbatim.

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use praxis_common::api::types::ErrorResponse;
use thiserror::Error;

/// Main error type for the module access engine
#[derive(Error, Debug)]
pub enum Error {
    /// Missing/invalid bearer token
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Role or ownership violation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Unknown student, course, lesson or assignment
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate pending submission, or optimistic-concurrency collision
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Module index outside the course's module list
    #[error("Out of range: {0}")]
    OutOfRange(String),

    /// Operation not valid for the entity's current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using praxis-ma Error
pub type Result<T> = std::result::Result<T, Error>;

impl From<praxis_common::Error> for Error {
    fn from(e: praxis_common::Error) -> Self {
        match e {
            praxis_common::Error::Database(e) => Error::Database(e),
            praxis_common::Error::NotFound(msg) => Error::NotFound(msg),
            praxis_common::Error::InvalidInput(msg) => Error::InvalidState(msg),
            praxis_common::Error::Config(msg) => Error::Config(msg),
            other => Error::Internal(other.to_string()),
        }
    }
}

impl Error {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::OutOfRange(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::InvalidState(_) => StatusCode::CONFLICT,
            Error::Database(_) | Error::Config(_) | Error::Http(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal error details stay in the logs, not in responses
        let message = match &self {
            Error::Database(e) => {
                tracing::error!("Database error: {}", e);
                "Internal error".to_string()
            }
            Error::Config(_) | Error::Http(_) | Error::Internal(_) => {
                tracing::error!("{}", self);
                "Internal error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            Error::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            Error::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            Error::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            Error::OutOfRange("x".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            Error::InvalidState("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            Error::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
