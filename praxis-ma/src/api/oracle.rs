//! Access check endpoint

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use praxis_common::api::types::CanAccessResponse;
use praxis_common::Principal;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::oracle;
use crate::error::Result;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CanAccessQuery {
    pub course_id: Uuid,
    pub module_index: u32,
}

/// GET /can-access?course_id=&module_index= - authorization check
///
/// Side-effect-free; called by route guards on every gated navigation.
/// Denials surface as 4xx with a `{message}` body, which guards treat as
/// "deny and redirect".
pub async fn can_access(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<CanAccessQuery>,
) -> Result<Json<CanAccessResponse>> {
    oracle::can_access(&state.db, &principal, query.course_id, query.module_index).await?;
    Ok(Json(CanAccessResponse { allowed: true }))
}
