//! praxis-ma library - Module Access engine
//!
//! Gates which course module a student may view or work in, based on a
//! linear progression policy. Review outcomes and administrative overrides
//! feed one Decision Function writing through one Progress Store, so the
//! two authority sources can never produce contradictory state.

use std::sync::Arc;

use axum::Router;
use sqlx::SqlitePool;

pub mod api;
pub mod db;
pub mod engine;
pub mod error;
pub mod state;

pub use error::{Error, Result};
pub use state::SharedState;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// In-process event fan-out
    pub shared: Arc<SharedState>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            shared: Arc::new(SharedState::new()),
        }
    }
}

/// Build application router
///
/// Health endpoint is open; everything else requires a bearer token
/// resolved to a principal by the auth middleware.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};
    use tower_http::cors::CorsLayer;

    // Protected routes (require authentication)
    let protected = Router::new()
        // Student/portal surface
        .route("/progress/:student_id", get(api::get_progress))
        .route("/submit-assignment", post(api::submit_assignment))
        .route("/mark-lesson-complete", post(api::mark_lesson_complete))
        .route("/can-access", get(api::can_access))
        // Staff review surface
        .route("/pending-assignments", get(api::get_pending_assignments))
        .route("/review-assignment", post(api::review_assignment))
        // Administrative overrides
        .route("/unlock-module", post(api::unlock_module))
        .route("/lock-module", post(api::lock_module))
        .route("/force-progress", post(api::force_progress))
        .route("/auto-unlock-config", post(api::update_auto_unlock_config))
        // Event stream
        .route("/events", get(api::event_stream))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    // Public routes (no authentication)
    let public = Router::new().route("/health", get(api::health));

    // Combine routers
    Router::new()
        .merge(protected)
        .merge(public)
        .with_state(state)
        .layer(CorsLayer::permissive())
}
