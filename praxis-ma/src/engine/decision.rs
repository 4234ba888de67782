//! Decision Function
//!
//! Pure logic: given the current progress snapshot and a command (a review
//! outcome or an administrative override), compute the next progress state.
//! No I/O here - the apply layer reads state, calls [`decide`], and writes
//! the outcome back under a compare-and-swap.

use std::collections::BTreeSet;

use praxis_common::api::types::SubmissionStatus;
use praxis_common::events::TransitionCause;

use crate::error::{Error, Result};

/// Per-course auto-unlock configuration consumed by approvals
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoUnlockPolicy {
    pub enabled: bool,
    pub score_threshold: f64,
}

impl Default for AutoUnlockPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            score_threshold: 0.0,
        }
    }
}

/// Progress state consumed by the Decision Function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub current_module_index: u32,
    pub unlocked_modules: BTreeSet<u32>,
}

/// Observable state of one module slot for a student
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    Locked,
    UnlockedNotSubmitted,
    UnlockedPending,
    UnlockedRejected,
    CompletedApproved,
}

/// Derive the slot state from the unlock set and the slot's latest
/// submission status
pub fn module_state(
    snapshot: &ProgressSnapshot,
    latest_submission: Option<SubmissionStatus>,
    module_index: u32,
) -> ModuleState {
    if !snapshot.unlocked_modules.contains(&module_index) {
        return ModuleState::Locked;
    }
    match latest_submission {
        None => ModuleState::UnlockedNotSubmitted,
        Some(SubmissionStatus::Pending) => ModuleState::UnlockedPending,
        Some(SubmissionStatus::Rejected) => ModuleState::UnlockedRejected,
        Some(SubmissionStatus::Approved) => ModuleState::CompletedApproved,
    }
}

/// Commands feeding the Decision Function
///
/// Review outcomes and administrative overrides are distinct command types
/// converging on the same function, so history can record which authority
/// caused each write.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateCommand {
    /// Staff approved the module's pending submission
    Approve {
        module_index: u32,
        score: Option<f64>,
    },
    /// Staff rejected the module's pending submission
    Reject { module_index: u32 },
    /// Administrative grant of a single module
    AdminUnlock { module_index: u32 },
    /// Administrative revocation of a single module
    AdminLock { module_index: u32 },
    /// Administrative force-progress to an arbitrary target
    AdminForce { target_index: u32 },
}

/// A transition to be appended to the audit history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from_index: u32,
    pub to_index: u32,
    pub cause: TransitionCause,
    pub detail: Option<String>,
}

/// Result of a decision: the state to persist plus the history entry
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub current_module_index: u32,
    pub unlocked_modules: BTreeSet<u32>,
    /// History entry for this command; None means nothing to record
    /// (a rejection leaves progress untouched - the ledger row is the audit)
    pub transition: Option<Transition>,
    /// Whether the progress record needs a write at all
    pub changed: bool,
}

impl Outcome {
    fn unchanged(snapshot: &ProgressSnapshot, transition: Option<Transition>) -> Self {
        Self {
            current_module_index: snapshot.current_module_index,
            unlocked_modules: snapshot.unlocked_modules.clone(),
            transition,
            changed: false,
        }
    }
}

/// Compute the next progress state for a command
///
/// `module_count` is the length of the course's module list; every index is
/// validated against it before any state is computed.
pub fn decide(
    snapshot: &ProgressSnapshot,
    command: &GateCommand,
    policy: &AutoUnlockPolicy,
    module_count: u32,
) -> Result<Outcome> {
    if module_count == 0 {
        return Err(Error::InvalidState("Course has no modules".to_string()));
    }

    match *command {
        GateCommand::Approve {
            module_index,
            score,
        } => {
            check_index(module_index, module_count)?;

            // Absent score fails closed: approval alone never cascades
            let meets_threshold = score.map_or(false, |s| s >= policy.score_threshold);
            let next_index = module_index + 1;

            if policy.enabled && meets_threshold && next_index < module_count {
                let mut unlocked = snapshot.unlocked_modules.clone();
                let newly_unlocked = unlocked.insert(next_index);
                let new_current = snapshot.current_module_index.max(next_index);
                let changed = newly_unlocked || new_current != snapshot.current_module_index;

                Ok(Outcome {
                    current_module_index: new_current,
                    unlocked_modules: unlocked,
                    transition: Some(Transition {
                        from_index: snapshot.current_module_index,
                        to_index: new_current,
                        cause: TransitionCause::Auto,
                        detail: Some(format!(
                            "approval of module {} unlocked module {}",
                            module_index, next_index
                        )),
                    }),
                    changed,
                })
            } else {
                // Approval recorded without a cascade: below threshold,
                // auto-unlock disabled, score absent, or final module
                Ok(Outcome::unchanged(
                    snapshot,
                    Some(Transition {
                        from_index: snapshot.current_module_index,
                        to_index: snapshot.current_module_index,
                        cause: TransitionCause::ManualApprove,
                        detail: Some(format!("module {} approved", module_index)),
                    }),
                ))
            }
        }

        GateCommand::Reject { module_index } => {
            check_index(module_index, module_count)?;
            // Module stays unlocked for resubmission; current index holds
            Ok(Outcome::unchanged(snapshot, None))
        }

        GateCommand::AdminUnlock { module_index } => {
            check_index(module_index, module_count)?;

            if snapshot.unlocked_modules.contains(&module_index) {
                return Ok(Outcome::unchanged(snapshot, None));
            }

            let mut unlocked = snapshot.unlocked_modules.clone();
            unlocked.insert(module_index);
            Ok(Outcome {
                current_module_index: snapshot.current_module_index,
                unlocked_modules: unlocked,
                transition: Some(Transition {
                    from_index: snapshot.current_module_index,
                    to_index: snapshot.current_module_index,
                    cause: TransitionCause::AdminUnlock,
                    detail: Some(format!("unlocked module {}", module_index)),
                }),
                changed: true,
            })
        }

        GateCommand::AdminLock { module_index } => {
            check_index(module_index, module_count)?;

            // Module 0 stays unlocked for the life of the record
            if module_index == 0 {
                return Err(Error::InvalidState(
                    "Module 0 cannot be locked".to_string(),
                ));
            }
            // Locking behind the active position would orphan completed
            // work; the policy here is to refuse, never roll back
            if module_index < snapshot.current_module_index {
                return Err(Error::InvalidState(format!(
                    "Cannot lock module {}: student is already at module {}",
                    module_index, snapshot.current_module_index
                )));
            }

            if !snapshot.unlocked_modules.contains(&module_index) {
                return Ok(Outcome::unchanged(snapshot, None));
            }

            let mut unlocked = snapshot.unlocked_modules.clone();
            unlocked.remove(&module_index);
            Ok(Outcome {
                current_module_index: snapshot.current_module_index,
                unlocked_modules: unlocked,
                transition: Some(Transition {
                    from_index: snapshot.current_module_index,
                    to_index: snapshot.current_module_index,
                    cause: TransitionCause::AdminLock,
                    detail: Some(format!("locked module {}", module_index)),
                }),
                changed: true,
            })
        }

        GateCommand::AdminForce { target_index } => {
            check_index(target_index, module_count)?;

            let mut unlocked = snapshot.unlocked_modules.clone();
            for index in 0..=target_index {
                unlocked.insert(index);
            }

            let changed = target_index != snapshot.current_module_index
                || unlocked != snapshot.unlocked_modules;

            Ok(Outcome {
                current_module_index: target_index,
                unlocked_modules: unlocked,
                transition: Some(Transition {
                    from_index: snapshot.current_module_index,
                    to_index: target_index,
                    cause: TransitionCause::AdminForce,
                    detail: Some(format!("forced progress to module {}", target_index)),
                }),
                changed,
            })
        }
    }
}

fn check_index(module_index: u32, module_count: u32) -> Result<()> {
    if module_index >= module_count {
        return Err(Error::OutOfRange(format!(
            "Module index {} outside course module list (0..{})",
            module_index, module_count
        )));
    }
    Ok(())
}
