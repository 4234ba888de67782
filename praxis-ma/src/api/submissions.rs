//! Student submission endpoints

use axum::{extract::State, Extension, Json};
use praxis_common::api::types::{
    AckResponse, AssignmentInfo, MarkLessonCompleteRequest, SubmitAssignmentRequest,
};
use praxis_common::Principal;

use crate::db::courses;
use crate::engine::{apply, oracle};
use crate::error::{Error, Result};
use crate::AppState;

/// POST /submit-assignment - create a pending submission
pub async fn submit_assignment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<SubmitAssignmentRequest>,
) -> Result<Json<AssignmentInfo>> {
    let assignment = apply::submit_assignment(
        &state.db,
        &state.shared,
        &principal,
        req.course_id,
        req.module_index,
        req.submission_link.as_deref(),
        req.file_url.as_deref(),
    )
    .await?;

    Ok(Json(assignment))
}

/// POST /mark-lesson-complete - record a lesson-level completion
///
/// Lesson completion is a finer-grained fact feeding eligibility to
/// submit, not itself a module unlock. Idempotent.
pub async fn mark_lesson_complete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<MarkLessonCompleteRequest>,
) -> Result<Json<AckResponse>> {
    // The module itself must be accessible before its lessons count
    oracle::can_access(&state.db, &principal, req.course_id, req.module_index).await?;

    if !courses::lesson_in_module(&state.db, req.lesson_id, req.course_id, req.module_index).await? {
        return Err(Error::NotFound(format!(
            "Lesson {} not found in module {}",
            req.lesson_id, req.module_index
        )));
    }

    courses::mark_lesson_complete(
        &state.db,
        principal.user_id,
        req.course_id,
        req.module_index,
        req.lesson_id,
    )
    .await?;

    Ok(Json(AckResponse::ok()))
}
