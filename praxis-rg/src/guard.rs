//! Route Guard
//!
//! Blocks rendering of gated content pending the engine's authorization
//! check. Deliberately "dumb": no caching across navigations (every check
//! asks the engine again) and fail-closed on every error path - a network
//! failure denies exactly like a 403.

use tracing::warn;
use uuid::Uuid;

use crate::api::{ApiClient, ClientError};

/// Outcome of a guard check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Render the gated content
    Render,
    /// Redirect to the fallback route, carrying the denial reason as
    /// navigation state
    Redirect { to: String, reason: String },
}

/// Client-side guard for gated course content
#[derive(Debug, Clone)]
pub struct RouteGuard {
    client: ApiClient,
    fallback_route: String,
}

impl RouteGuard {
    /// Create a guard redirecting denials to `fallback_route`
    pub fn new(client: ApiClient, fallback_route: impl Into<String>) -> Self {
        Self {
            client,
            fallback_route: fallback_route.into(),
        }
    }

    /// Check access for a module before rendering it
    ///
    /// Never errors: anything other than an explicit allow becomes a
    /// redirect.
    pub async fn check(&self, course_id: Uuid, module_index: u32) -> GuardDecision {
        let result = self.client.can_access(course_id, module_index).await;
        self.decision_from(result)
    }

    /// Map an engine response to a decision (fail closed)
    fn decision_from(
        &self,
        result: Result<praxis_common::api::types::CanAccessResponse, ClientError>,
    ) -> GuardDecision {
        match result {
            Ok(response) if response.allowed => GuardDecision::Render,
            Ok(_) => self.redirect("Access denied".to_string()),
            Err(ClientError::Api { message, .. }) => self.redirect(message),
            Err(ClientError::Transport(e)) => {
                warn!("Access check failed, denying: {}", e);
                self.redirect("Could not verify access. Please try again.".to_string())
            }
        }
    }

    fn redirect(&self, reason: String) -> GuardDecision {
        GuardDecision::Redirect {
            to: self.fallback_route.clone(),
            reason,
        }
    }
}
