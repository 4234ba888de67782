//! Command application
//!
//! Drives the pure Decision Function against the store. Review outcomes run
//! a bounded read-decide-CAS retry loop; administrative overrides get a
//! single attempt so a conflicted force-progress is never silently applied
//! twice. The approval cascade (assignment update + next-module unlock +
//! history) commits in one SQLite transaction, so no reader can observe an
//! approved submission with the cascade missing.

use crate::db::{assignments, course_config, courses, progress};
use crate::engine::decision::{self, AutoUnlockPolicy, GateCommand};
use crate::engine::oracle;
use crate::error::{Error, Result};
use crate::state::SharedState;
use praxis_common::api::types::{AssignmentInfo, ReviewDecision, SubmissionStatus};
use praxis_common::events::PraxisEvent;
use praxis_common::Principal;
use sqlx::{Pool, Sqlite};
use tracing::{info, warn};
use uuid::Uuid;

/// Bounded retries for optimistic-concurrency collisions on review outcomes
const REVIEW_RETRY_ATTEMPTS: u32 = 3;

/// Submit an assignment for the principal's own account
///
/// Preconditions checked in order: course and index valid, module unlocked
/// for this student (Access Oracle), all registered lessons complete,
/// no pending submission in the slot (store-level uniqueness).
pub async fn submit_assignment(
    db: &Pool<Sqlite>,
    shared: &SharedState,
    principal: &Principal,
    course_id: Uuid,
    module_index: u32,
    submission_link: Option<&str>,
    file_url: Option<&str>,
) -> Result<AssignmentInfo> {
    // Bounds, course existence and unlock state
    oracle::can_access(db, principal, course_id, module_index).await?;

    if !courses::all_lessons_complete(db, principal.user_id, course_id, module_index).await? {
        return Err(Error::InvalidState(format!(
            "Complete all lessons in module {} before submitting",
            module_index
        )));
    }

    let assignment = assignments::insert_pending(
        db,
        principal.user_id,
        course_id,
        module_index,
        submission_link,
        file_url,
    )
    .await?;

    info!(
        "Assignment {} submitted by {} for course {} module {}",
        assignment.id, principal.user_id, course_id, module_index
    );

    shared.broadcast_event(PraxisEvent::AssignmentSubmitted {
        assignment_id: assignment.id,
        student_id: principal.user_id,
        course_id,
        module_index,
        timestamp: chrono::Utc::now(),
    });

    Ok(assignment)
}

/// Apply a staff review outcome to an assignment
///
/// Approval and its auto-unlock cascade persist atomically; a concurrent
/// writer on the progress record triggers a bounded retry of the whole
/// decision from a fresh read.
pub async fn apply_review_outcome(
    db: &Pool<Sqlite>,
    shared: &SharedState,
    assignment_id: Uuid,
    decision_kind: ReviewDecision,
    feedback: Option<&str>,
    score: Option<f64>,
    reviewer: &Principal,
) -> Result<AssignmentInfo> {
    let assignment = assignments::get_assignment(db, assignment_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Assignment {} not found", assignment_id)))?;

    if assignment.status != SubmissionStatus::Pending {
        return Err(Error::InvalidState(format!(
            "Assignment {} is not pending (status: {})",
            assignment_id,
            assignment.status.as_str()
        )));
    }

    let module_count = courses::require_module_count(db, assignment.course_id).await?;
    let policy = course_config::get_policy(db, assignment.course_id).await?;

    let command = match decision_kind {
        ReviewDecision::Approved => GateCommand::Approve {
            module_index: assignment.module_index,
            score,
        },
        ReviewDecision::Rejected => GateCommand::Reject {
            module_index: assignment.module_index,
        },
    };

    for attempt in 1..=REVIEW_RETRY_ATTEMPTS {
        let record =
            progress::get_or_create_progress(db, assignment.student_id, assignment.course_id)
                .await?;
        let snapshot = decision::ProgressSnapshot {
            current_module_index: record.current_module_index,
            unlocked_modules: record.unlocked_modules.clone(),
        };
        let outcome = decision::decide(&snapshot, &command, &policy, module_count)?;

        let mut tx = db.begin().await?;

        let updated = assignments::mark_reviewed(
            &mut tx,
            assignment_id,
            decision_kind.as_status(),
            feedback,
            score,
            reviewer.user_id,
        )
        .await?;
        if !updated {
            // Another reviewer resolved the slot between our read and now
            tx.rollback().await?;
            return Err(Error::InvalidState(format!(
                "Assignment {} is no longer pending",
                assignment_id
            )));
        }

        if outcome.changed {
            let applied = progress::apply_transition_cas(
                &mut tx,
                &record,
                outcome.current_module_index,
                &outcome.unlocked_modules,
            )
            .await?;
            if !applied {
                tx.rollback().await?;
                if attempt == REVIEW_RETRY_ATTEMPTS {
                    return Err(Error::Conflict(
                        "Progress record was modified concurrently; review not applied"
                            .to_string(),
                    ));
                }
                warn!(
                    "Progress CAS conflict reviewing assignment {} (attempt {}), retrying",
                    assignment_id, attempt
                );
                continue;
            }
        }

        if let Some(transition) = &outcome.transition {
            progress::append_history(
                &mut tx,
                assignment.student_id,
                assignment.course_id,
                transition.from_index,
                transition.to_index,
                transition.cause,
                Some(reviewer.user_id),
                transition.detail.as_deref(),
            )
            .await?;
        }

        tx.commit().await?;

        info!(
            "Assignment {} {} by {} (score: {:?})",
            assignment_id,
            decision_kind.as_status().as_str(),
            reviewer.user_id,
            score
        );

        shared.broadcast_event(PraxisEvent::AssignmentReviewed {
            assignment_id,
            student_id: assignment.student_id,
            course_id: assignment.course_id,
            module_index: assignment.module_index,
            status: decision_kind.as_status(),
            score,
            timestamp: chrono::Utc::now(),
        });

        if let Some(transition) = &outcome.transition {
            if outcome.changed {
                shared.broadcast_event(PraxisEvent::ProgressChanged {
                    student_id: assignment.student_id,
                    course_id: assignment.course_id,
                    from_index: transition.from_index,
                    to_index: transition.to_index,
                    unlocked_modules: outcome.unlocked_modules.iter().copied().collect(),
                    cause: transition.cause,
                    timestamp: chrono::Utc::now(),
                });
            }
        }

        return assignments::get_assignment(db, assignment_id)
            .await?
            .ok_or_else(|| Error::Internal("Assignment vanished after review".to_string()));
    }

    unreachable!("review retry loop always returns")
}

/// Apply an administrative override command
///
/// Admin commands are not retried on conflict: the caller resubmits
/// explicitly, so a force-progress is never double-applied.
pub async fn apply_admin_command(
    db: &Pool<Sqlite>,
    shared: &SharedState,
    student_id: Uuid,
    course_id: Uuid,
    command: GateCommand,
    actor: &Principal,
) -> Result<progress::ProgressRecord> {
    if !courses::user_exists(db, student_id).await? {
        return Err(Error::NotFound(format!("Student {} not found", student_id)));
    }
    let module_count = courses::require_module_count(db, course_id).await?;

    let record = progress::get_or_create_progress(db, student_id, course_id).await?;
    let snapshot = decision::ProgressSnapshot {
        current_module_index: record.current_module_index,
        unlocked_modules: record.unlocked_modules.clone(),
    };
    // Administrative overrides ignore the auto-unlock policy
    let outcome = decision::decide(&snapshot, &command, &AutoUnlockPolicy::default(), module_count)?;

    if !outcome.changed {
        return Ok(record);
    }

    let mut tx = db.begin().await?;

    let applied = progress::apply_transition_cas(
        &mut tx,
        &record,
        outcome.current_module_index,
        &outcome.unlocked_modules,
    )
    .await?;
    if !applied {
        tx.rollback().await?;
        return Err(Error::Conflict(
            "Progress record was modified concurrently; override not applied".to_string(),
        ));
    }

    if let Some(transition) = &outcome.transition {
        progress::append_history(
            &mut tx,
            student_id,
            course_id,
            transition.from_index,
            transition.to_index,
            transition.cause,
            Some(actor.user_id),
            transition.detail.as_deref(),
        )
        .await?;
    }

    tx.commit().await?;

    info!(
        "Admin override {:?} applied to student {} course {} by {}",
        command, student_id, course_id, actor.user_id
    );

    if let Some(transition) = &outcome.transition {
        shared.broadcast_event(PraxisEvent::ProgressChanged {
            student_id,
            course_id,
            from_index: transition.from_index,
            to_index: transition.to_index,
            unlocked_modules: outcome.unlocked_modules.iter().copied().collect(),
            cause: transition.cause,
            timestamp: chrono::Utc::now(),
        });
    }

    match command {
        GateCommand::AdminUnlock { module_index } => {
            shared.broadcast_event(PraxisEvent::ModuleLockChanged {
                student_id,
                course_id,
                module_index,
                locked: false,
                actor_id: actor.user_id,
                timestamp: chrono::Utc::now(),
            });
        }
        GateCommand::AdminLock { module_index } => {
            shared.broadcast_event(PraxisEvent::ModuleLockChanged {
                student_id,
                course_id,
                module_index,
                locked: true,
                actor_id: actor.user_id,
                timestamp: chrono::Utc::now(),
            });
        }
        _ => {}
    }

    progress::load_progress(db, student_id, course_id)
        .await?
        .ok_or_else(|| Error::Internal("Progress record vanished after override".to_string()))
}
