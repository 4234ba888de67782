//! Progress read endpoint

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use praxis_common::api::types::ProgressResponse;
use praxis_common::Principal;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::{assignments, courses, progress};
use crate::error::{Error, Result};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ProgressQuery {
    pub course_id: Uuid,
}

/// GET /progress/:student_id?course_id= - progress and submissions
///
/// Students may read only their own record; staff may read any.
/// Creates the default record on first read.
pub async fn get_progress(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(student_id): Path<Uuid>,
    Query(query): Query<ProgressQuery>,
) -> Result<Json<ProgressResponse>> {
    if !principal.is_staff() && principal.user_id != student_id {
        return Err(Error::Forbidden(
            "Students may only view their own progress".to_string(),
        ));
    }

    if !courses::user_exists(&state.db, student_id).await? {
        return Err(Error::NotFound(format!("Student {} not found", student_id)));
    }
    courses::require_module_count(&state.db, query.course_id).await?;

    let record = progress::get_or_create_progress(&state.db, student_id, query.course_id).await?;
    let submissions =
        assignments::list_for_student(&state.db, student_id, query.course_id).await?;

    Ok(Json(ProgressResponse {
        progress: record.to_info(),
        assignments: submissions,
    }))
}
