//! Staff review endpoints

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use praxis_common::api::types::{
    AssignmentInfo, PendingAssignmentsResponse, ReviewAssignmentRequest,
};
use praxis_common::Principal;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::assignments;
use crate::engine::apply;
use crate::error::{Error, Result};
use crate::AppState;

fn require_staff(principal: &Principal) -> Result<()> {
    if principal.is_staff() {
        Ok(())
    } else {
        Err(Error::Forbidden(
            "Staff role required for review operations".to_string(),
        ))
    }
}

#[derive(Debug, Deserialize)]
pub struct PendingQuery {
    pub course_id: Option<Uuid>,
}

/// GET /pending-assignments?course_id= - staff review queue
pub async fn get_pending_assignments(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<PendingQuery>,
) -> Result<Json<PendingAssignmentsResponse>> {
    require_staff(&principal)?;

    let pending = assignments::list_pending(&state.db, query.course_id).await?;
    Ok(Json(PendingAssignmentsResponse {
        assignments: pending,
    }))
}

/// POST /review-assignment - resolve a pending submission
///
/// Approval and its auto-unlock cascade are applied atomically by the
/// engine; see `engine::apply`.
pub async fn review_assignment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<ReviewAssignmentRequest>,
) -> Result<Json<AssignmentInfo>> {
    require_staff(&principal)?;

    let assignment = apply::apply_review_outcome(
        &state.db,
        &state.shared,
        req.assignment_id,
        req.status,
        req.feedback.as_deref(),
        req.score,
        &principal,
    )
    .await?;

    Ok(Json(assignment))
}
