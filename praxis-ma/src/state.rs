//! Shared engine state
//!
//! Thread-safe shared state for coordination between HTTP handlers and the
//! SSE event stream. All durable state lives in the database; this struct
//! only carries the in-process event fan-out.

use praxis_common::events::PraxisEvent;
use tokio::sync::broadcast;

/// Shared state accessible by all handlers
pub struct SharedState {
    /// Event broadcaster for SSE events
    pub event_tx: broadcast::Sender<PraxisEvent>,
}

impl SharedState {
    /// Create new shared state
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(100); // Buffer up to 100 events
        Self { event_tx }
    }

    /// Broadcast an event to all SSE listeners
    pub fn broadcast_event(&self, event: PraxisEvent) {
        // Ignore send errors (no receivers is OK)
        let _ = self.event_tx.send(event);
    }

    /// Subscribe to event stream for SSE
    pub fn subscribe_events(&self) -> broadcast::Receiver<PraxisEvent> {
        self.event_tx.subscribe()
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_broadcast_reaches_subscriber() {
        let state = SharedState::new();
        let mut rx = state.subscribe_events();

        state.broadcast_event(PraxisEvent::AssignmentSubmitted {
            assignment_id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            module_index: 1,
            timestamp: chrono::Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_name(), "AssignmentSubmitted");
    }

    #[tokio::test]
    async fn test_broadcast_without_subscribers_is_ok() {
        let state = SharedState::new();
        state.broadcast_event(PraxisEvent::AssignmentSubmitted {
            assignment_id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            module_index: 0,
            timestamp: chrono::Utc::now(),
        });
    }
}
