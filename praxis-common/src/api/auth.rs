//! Bearer-token principal resolution
//!
//! # Architecture
//!
//! Session issuance lives outside the academy services: an external identity
//! system provisions users and mints opaque bearer tokens. This module owns
//! the server side of that contract:
//! - Tokens are random opaque strings; only their SHA-256 hash is stored
//!   (`api_tokens` table), so a database leak does not leak credentials
//! - Every authenticated request resolves its token to a `Principal`
//!   (user id + role) which downstream authorization decisions consume
//!
//! # Pure Functions
//!
//! Hashing and principal/role logic are pure. Database lookups are gated
//! behind the `sqlx` feature - HTTP framework specifics (Axum middleware)
//! live in module-specific code.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

#[cfg(feature = "sqlx")]
use chrono::{DateTime, Utc};
#[cfg(feature = "sqlx")]
use sqlx::SqlitePool;

// ========================================
// Error Types
// ========================================

/// Authentication error types
#[derive(Debug, Clone)]
pub enum ApiAuthError {
    /// Authorization header missing from request
    MissingToken,

    /// Authorization header present but not `Bearer <token>`
    MalformedHeader,

    /// Token hash not present in api_tokens
    UnknownToken,

    /// Token found but past its expiry
    ExpiredToken,

    /// Token resolves to an archived user account
    ArchivedUser,

    /// Database error during token lookup
    DatabaseError(String),
}

impl std::fmt::Display for ApiAuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiAuthError::MissingToken => write!(f, "Missing bearer token"),
            ApiAuthError::MalformedHeader => write!(f, "Malformed Authorization header"),
            ApiAuthError::UnknownToken => write!(f, "Unknown token"),
            ApiAuthError::ExpiredToken => write!(f, "Token expired"),
            ApiAuthError::ArchivedUser => write!(f, "User account archived"),
            ApiAuthError::DatabaseError(err) => write!(f, "Database error: {}", err),
        }
    }
}

impl std::error::Error for ApiAuthError {}

// ========================================
// Principal and Role
// ========================================

/// Role attached to a user account
///
/// Students are gated by the module access engine; staff and admin
/// principals pass every access check and may run review/override
/// operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Staff,
    Admin,
}

impl Role {
    /// Stored string form (users.role column)
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Staff => "staff",
            Role::Admin => "admin",
        }
    }

    /// Parse from stored string form; unknown strings map to None
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "student" => Some(Role::Student),
            "staff" => Some(Role::Staff),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Authenticated request principal
///
/// Resolved once per request by the auth middleware and consumed by
/// handlers and the access oracle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    /// User guid from the users table
    pub user_id: Uuid,
    /// Role at resolution time
    pub role: Role,
}

impl Principal {
    /// Staff and admin principals bypass student gating
    pub fn is_staff(&self) -> bool {
        matches!(self.role, Role::Staff | Role::Admin)
    }
}

// ========================================
// Token Helpers
// ========================================

/// Length of minted opaque tokens (alphanumeric characters)
const TOKEN_LEN: usize = 48;

/// Mint a new opaque bearer token
///
/// The caller is responsible for storing its hash via [`store_token`] and
/// handing the cleartext to exactly one client. The cleartext is never
/// persisted.
pub fn mint_token() -> String {
    use rand::distributions::Alphanumeric;
    use rand::Rng;

    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// SHA-256 hex digest of a token's cleartext
///
/// # Examples
///
/// ```
/// use praxis_common::api::auth::hash_token;
///
/// let hash = hash_token("some-token");
/// assert_eq!(hash.len(), 64); // SHA-256 is 64 hex chars
/// ```
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn parse_bearer_header(header_value: &str) -> Result<&str, ApiAuthError> {
    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or(ApiAuthError::MalformedHeader)?
        .trim();

    if token.is_empty() {
        return Err(ApiAuthError::MalformedHeader);
    }

    Ok(token)
}

// ========================================
// Database Operations
// ========================================

/// Store a token hash for a user
///
/// `expires_at = None` stores a non-expiring token (used by service
/// integrations and tests).
#[cfg(feature = "sqlx")]
pub async fn store_token(
    db: &SqlitePool,
    user_id: Uuid,
    token: &str,
    expires_at: Option<DateTime<Utc>>,
) -> Result<(), ApiAuthError> {
    sqlx::query(
        "INSERT INTO api_tokens (token_hash, user_guid, expires_at) VALUES (?, ?, ?)",
    )
    .bind(hash_token(token))
    .bind(user_id.to_string())
    .bind(expires_at)
    .execute(db)
    .await
    .map_err(|e| ApiAuthError::DatabaseError(e.to_string()))?;

    Ok(())
}

/// Resolve a bearer token to its principal
///
/// Fails closed: unknown hash, expired token, unparseable role, and
/// archived users all reject the request.
#[cfg(feature = "sqlx")]
pub async fn resolve_token(db: &SqlitePool, token: &str) -> Result<Principal, ApiAuthError> {
    let row: Option<(String, String, Option<DateTime<Utc>>, i64)> = sqlx::query_as(
        r#"
        SELECT u.guid, u.role, t.expires_at, u.archived
        FROM api_tokens t
        JOIN users u ON u.guid = t.user_guid
        WHERE t.token_hash = ?
        "#,
    )
    .bind(hash_token(token))
    .fetch_optional(db)
    .await
    .map_err(|e| ApiAuthError::DatabaseError(e.to_string()))?;

    let (user_guid, role, expires_at, archived) = row.ok_or(ApiAuthError::UnknownToken)?;

    if let Some(expiry) = expires_at {
        if expiry < Utc::now() {
            return Err(ApiAuthError::ExpiredToken);
        }
    }

    if archived != 0 {
        return Err(ApiAuthError::ArchivedUser);
    }

    let user_id = user_guid
        .parse::<Uuid>()
        .map_err(|e| ApiAuthError::DatabaseError(format!("Invalid user guid: {}", e)))?;
    let role = Role::from_str(&role)
        .ok_or_else(|| ApiAuthError::DatabaseError(format!("Invalid role: {}", role)))?;

    Ok(Principal { user_id, role })
}

// ========================================
// Tests
// ========================================
