//! Event types for the Praxis event system
//!
//! Domain events broadcast by the module access engine and transmitted to
//! connected UIs over SSE. Notification delivery (email, chat) is an
//! external consumer of this stream, not part of the engine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::types::SubmissionStatus;

/// Cause of a progress record transition
///
/// Recorded in progress_history for every write so audits can distinguish
/// "system unlocked" from "human unlocked".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionCause {
    /// Threshold-based unlock cascading from an approval
    #[serde(rename = "auto")]
    Auto,
    /// Approval recorded without an auto-unlock cascade
    #[serde(rename = "manual-approve")]
    ManualApprove,
    /// Administrative single-module unlock
    #[serde(rename = "admin-unlock")]
    AdminUnlock,
    /// Administrative force-progress
    #[serde(rename = "admin-force")]
    AdminForce,
    /// Administrative module lock
    #[serde(rename = "admin-lock")]
    AdminLock,
}

impl TransitionCause {
    /// Stored string form (progress_history.cause column)
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionCause::Auto => "auto",
            TransitionCause::ManualApprove => "manual-approve",
            TransitionCause::AdminUnlock => "admin-unlock",
            TransitionCause::AdminForce => "admin-force",
            TransitionCause::AdminLock => "admin-lock",
        }
    }

    /// Parse from stored string form
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "auto" => Some(TransitionCause::Auto),
            "manual-approve" => Some(TransitionCause::ManualApprove),
            "admin-unlock" => Some(TransitionCause::AdminUnlock),
            "admin-force" => Some(TransitionCause::AdminForce),
            "admin-lock" => Some(TransitionCause::AdminLock),
            _ => None,
        }
    }
}

/// Praxis event types
///
/// Events are broadcast via a tokio broadcast channel and serialized for
/// SSE transmission. All services use this central enum for type safety and
/// exhaustive matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PraxisEvent {
    /// Student created a pending submission
    ///
    /// Triggers:
    /// - SSE: Refresh staff review queues
    AssignmentSubmitted {
        assignment_id: Uuid,
        student_id: Uuid,
        course_id: Uuid,
        module_index: u32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Staff resolved a pending submission
    ///
    /// Triggers:
    /// - SSE: Refresh student progress views and staff queues
    AssignmentReviewed {
        assignment_id: Uuid,
        student_id: Uuid,
        course_id: Uuid,
        module_index: u32,
        status: SubmissionStatus,
        /// Score assigned on review, if any
        score: Option<f64>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Progress record transitioned (auto cascade or admin override)
    ///
    /// Triggers:
    /// - SSE: Route guards re-check on next navigation; dashboards refresh
    ProgressChanged {
        student_id: Uuid,
        course_id: Uuid,
        from_index: u32,
        to_index: u32,
        /// Unlocked set after the transition, sorted
        unlocked_modules: Vec<u32>,
        cause: TransitionCause,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Administrative lock or unlock of a single module
    ModuleLockChanged {
        student_id: Uuid,
        course_id: Uuid,
        module_index: u32,
        locked: bool,
        /// Acting staff principal
        actor_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Staff updated a course's auto-unlock policy
    AutoUnlockConfigChanged {
        course_id: Uuid,
        enabled: bool,
        score_threshold: f64,
        actor_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl PraxisEvent {
    /// Event name used as the SSE event field
    pub fn event_name(&self) -> &'static str {
        match self {
            PraxisEvent::AssignmentSubmitted { .. } => "AssignmentSubmitted",
            PraxisEvent::AssignmentReviewed { .. } => "AssignmentReviewed",
            PraxisEvent::ProgressChanged { .. } => "ProgressChanged",
            PraxisEvent::ModuleLockChanged { .. } => "ModuleLockChanged",
            PraxisEvent::AutoUnlockConfigChanged { .. } => "AutoUnlockConfigChanged",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_cause_round_trip() {
        for cause in [
            TransitionCause::Auto,
            TransitionCause::ManualApprove,
            TransitionCause::AdminUnlock,
            TransitionCause::AdminForce,
            TransitionCause::AdminLock,
        ] {
            assert_eq!(TransitionCause::from_str(cause.as_str()), Some(cause));
        }
        assert_eq!(TransitionCause::from_str("unknown"), None);
    }

    #[test]
    fn test_event_serialization_tagged() {
        let event = PraxisEvent::ProgressChanged {
            student_id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            from_index: 0,
            to_index: 1,
            unlocked_modules: vec![0, 1],
            cause: TransitionCause::Auto,
            timestamp: chrono::Utc::now(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"ProgressChanged\""));
        assert!(json.contains("\"cause\":\"auto\""));
    }

    #[test]
    fn test_event_name_matches_variant() {
        let event = PraxisEvent::AssignmentSubmitted {
            assignment_id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            module_index: 2,
            timestamp: chrono::Utc::now(),
        };
        assert_eq!(event.event_name(), "AssignmentSubmitted");
    }
}
