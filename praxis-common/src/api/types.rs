//! Shared API request/response types
//!
//! Wire types used by the module access engine (praxis-ma) and its
//! consumers (praxis-rg, portal UIs). Kept free of database dependencies so
//! client crates can build with `default-features = false`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ========================================
// Error Response
// ========================================

/// Error body returned by every 4xx/5xx response
///
/// The route guard surfaces `message` verbatim to the student.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ========================================
// Submission Status
// ========================================

/// Lifecycle status of an assignment submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    /// Stored string form (assignments.status column)
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Rejected => "rejected",
        }
    }

    /// Parse from stored string form
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(SubmissionStatus::Pending),
            "approved" => Some(SubmissionStatus::Approved),
            "rejected" => Some(SubmissionStatus::Rejected),
            _ => None,
        }
    }
}

/// Staff verdict on a pending submission
///
/// Deliberately excludes `pending`: a review always resolves the slot one
/// way or the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl ReviewDecision {
    pub fn as_status(&self) -> SubmissionStatus {
        match self {
            ReviewDecision::Approved => SubmissionStatus::Approved,
            ReviewDecision::Rejected => SubmissionStatus::Rejected,
        }
    }
}

// ========================================
// Progress Types
// ========================================

/// Per-(student, course) progression snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressInfo {
    pub student_id: Uuid,
    pub course_id: Uuid,
    /// Module the student is actively working in
    pub current_module_index: u32,
    /// Sorted unlocked module indices
    pub unlocked_modules: Vec<u32>,
}

/// Assignment submission record (wire form)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentInfo {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub module_index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    pub status: SubmissionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub submitted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Response for `GET /progress/:student_id`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressResponse {
    pub progress: ProgressInfo,
    pub assignments: Vec<AssignmentInfo>,
}

// ========================================
// Student Requests
// ========================================

/// Request body for `POST /submit-assignment`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitAssignmentRequest {
    pub course_id: Uuid,
    pub module_index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
}

/// Request body for `POST /mark-lesson-complete`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkLessonCompleteRequest {
    pub course_id: Uuid,
    pub module_index: u32,
    pub lesson_id: Uuid,
}

/// Response for `GET /can-access`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanAccessResponse {
    pub allowed: bool,
}

// ========================================
// Staff Requests
// ========================================

/// Request body for `POST /review-assignment`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewAssignmentRequest {
    pub assignment_id: Uuid,
    pub status: ReviewDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Request body for `POST /unlock-module` and `POST /lock-module`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleLockRequest {
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub module_index: u32,
}

/// Request body for `POST /force-progress`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForceProgressRequest {
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub target_module_index: u32,
}

/// Request body for `POST /auto-unlock-config`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoUnlockConfigRequest {
    pub course_id: Uuid,
    pub auto_unlock_enabled: bool,
    pub auto_unlock_score_threshold: f64,
}

/// Generic acknowledgment for mutating staff endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckResponse {
    pub status: String,
}

impl AckResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Response for `GET /pending-assignments`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingAssignmentsResponse {
    pub assignments: Vec<AssignmentInfo>,
}

// ========================================
// Tests
// ========================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_status_round_trip() {
        for status in [
            SubmissionStatus::Pending,
            SubmissionStatus::Approved,
            SubmissionStatus::Rejected,
        ] {
            assert_eq!(SubmissionStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(SubmissionStatus::from_str("graded"), None);
    }

    #[test]
    fn test_review_decision_serde_lowercase() {
        let json = serde_json::to_string(&ReviewDecision::Approved).unwrap();
        assert_eq!(json, "\"approved\"");

        let decision: ReviewDecision = serde_json::from_str("\"rejected\"").unwrap();
        assert_eq!(decision, ReviewDecision::Rejected);
    }

    #[test]
    fn test_error_response_message_field() {
        let error = ErrorResponse::new("Module 3 is locked");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"message\""));
        assert!(json.contains("Module 3 is locked"));
    }

    #[test]
    fn test_submit_request_optional_fields_omitted() {
        let req = SubmitAssignmentRequest {
            course_id: Uuid::new_v4(),
            module_index: 0,
            submission_link: None,
            file_url: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("submission_link"));
        assert!(!json.contains("file_url"));
    }
}
