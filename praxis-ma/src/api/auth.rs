//! Authentication middleware for praxis-ma
//!
//! Resolves the bearer token on every protected request to a `Principal`
//! and injects it into request extensions for handlers. Returns 401 with a
//! `{message}` body on failure.
//!
//! **Note:** This is applied to protected routes only.
//! Health endpoint (/health) does NOT use this middleware.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use praxis_common::api::auth::{parse_bearer_header, resolve_token, ApiAuthError};
use tracing::warn;

use crate::error::Error;
use crate::AppState;

/// Authentication middleware
///
/// Validates the Authorization header and attaches the resolved principal.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Error> {
    let header_value = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| Error::Unauthorized("Missing bearer token".to_string()))?;

    let token = parse_bearer_header(header_value)
        .map_err(|e| Error::Unauthorized(e.to_string()))?;

    let principal = resolve_token(&state.db, token).await.map_err(|e| match e {
        ApiAuthError::DatabaseError(msg) => Error::Internal(msg),
        other => {
            warn!("Token rejected: {}", other);
            Error::Unauthorized(other.to_string())
        }
    })?;

    // Handlers read the principal back via Extension<Principal>
    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}
