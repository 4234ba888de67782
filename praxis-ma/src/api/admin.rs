//! Administrative override endpoints
//!
//! unlock-module / lock-module / force-progress / auto-unlock-config.
//! All require a staff or admin principal; every override writes through
//! the same Progress Store as review outcomes and lands in history with
//! the acting principal's id.

use axum::{extract::State, Extension, Json};
use praxis_common::api::types::{
    AckResponse, AutoUnlockConfigRequest, ForceProgressRequest, ModuleLockRequest,
};
use praxis_common::events::PraxisEvent;
use praxis_common::Principal;

use crate::db::{course_config, courses};
use crate::engine::apply;
use crate::engine::decision::GateCommand;
use crate::error::{Error, Result};
use crate::AppState;

fn require_staff(principal: &Principal) -> Result<()> {
    if principal.is_staff() {
        Ok(())
    } else {
        Err(Error::Forbidden(
            "Staff role required for administrative overrides".to_string(),
        ))
    }
}

/// POST /unlock-module - administrative grant of a single module
pub async fn unlock_module(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<ModuleLockRequest>,
) -> Result<Json<AckResponse>> {
    require_staff(&principal)?;

    apply::apply_admin_command(
        &state.db,
        &state.shared,
        req.student_id,
        req.course_id,
        GateCommand::AdminUnlock {
            module_index: req.module_index,
        },
        &principal,
    )
    .await?;

    Ok(Json(AckResponse::ok()))
}

/// POST /lock-module - administrative revocation of a single module
///
/// Refused for module 0 and for modules behind the student's current
/// position (past completion is never orphaned).
pub async fn lock_module(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<ModuleLockRequest>,
) -> Result<Json<AckResponse>> {
    require_staff(&principal)?;

    apply::apply_admin_command(
        &state.db,
        &state.shared,
        req.student_id,
        req.course_id,
        GateCommand::AdminLock {
            module_index: req.module_index,
        },
        &principal,
    )
    .await?;

    Ok(Json(AckResponse::ok()))
}

/// POST /force-progress - set progression directly, ignoring review state
pub async fn force_progress(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<ForceProgressRequest>,
) -> Result<Json<AckResponse>> {
    require_staff(&principal)?;

    apply::apply_admin_command(
        &state.db,
        &state.shared,
        req.student_id,
        req.course_id,
        GateCommand::AdminForce {
            target_index: req.target_module_index,
        },
        &principal,
    )
    .await?;

    Ok(Json(AckResponse::ok()))
}

/// POST /auto-unlock-config - update a course's auto-unlock policy
pub async fn update_auto_unlock_config(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<AutoUnlockConfigRequest>,
) -> Result<Json<AckResponse>> {
    require_staff(&principal)?;

    courses::require_module_count(&state.db, req.course_id).await?;

    course_config::update_policy(
        &state.db,
        req.course_id,
        req.auto_unlock_enabled,
        req.auto_unlock_score_threshold,
        principal.user_id,
    )
    .await?;

    state.shared.broadcast_event(PraxisEvent::AutoUnlockConfigChanged {
        course_id: req.course_id,
        enabled: req.auto_unlock_enabled,
        score_threshold: req.auto_unlock_score_threshold,
        actor_id: principal.user_id,
        timestamp: chrono::Utc::now(),
    });

    Ok(Json(AckResponse::ok()))
}
