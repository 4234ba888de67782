//! Server-Sent Events (SSE) utilities
//!
//! Shared SSE implementations for Praxis services.

use axum::response::sse::{Event, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::events::PraxisEvent;

/// Create an SSE stream fanning out domain events from a broadcast receiver
///
/// Sends an initial `ConnectionStatus` event, then forwards every
/// `PraxisEvent` as a named SSE event with a JSON payload. Lagged receivers
/// (slow clients that miss broadcast capacity) skip the missed events and
/// continue; clients are expected to re-fetch state on reconnect.
///
/// # Example
/// ```rust,ignore
/// pub async fn event_stream(
///     State(state): State<AppState>,
/// ) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
///     praxis_common::sse::create_event_sse_stream("praxis-ma", state.shared.subscribe_events())
/// }
/// ```
pub fn create_event_sse_stream(
    service_name: &'static str,
    mut rx: broadcast::Receiver<PraxisEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected to {} events", service_name);

    let stream = async_stream::stream! {
        // Send initial connected status
        yield Ok(Event::default()
            .event("ConnectionStatus")
            .data("connected"));

        loop {
            match rx.recv().await {
                Ok(event) => {
                    let name = event.event_name();
                    match serde_json::to_string(&event) {
                        Ok(payload) => {
                            debug!("SSE: Sending {} event", name);
                            yield Ok(Event::default().event(name).data(payload));
                        }
                        Err(e) => {
                            debug!("SSE: Failed to serialize {} event: {}", name, e);
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!("SSE: Client lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("SSE: {} event channel closed, ending stream", service_name);
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}

/// Create a simple heartbeat-only SSE stream for connection status monitoring
///
/// Used by services that don't have domain events to broadcast but still
/// need connection status UI.
pub fn create_heartbeat_sse_stream(
    service_name: &'static str,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected to {} general events", service_name);

    let stream = async_stream::stream! {
        info!("SSE: {} event stream started", service_name);

        // Send initial connected status
        yield Ok(Event::default()
            .event("ConnectionStatus")
            .data("connected"));

        loop {
            // Heartbeat every 15 seconds
            tokio::time::sleep(Duration::from_secs(15)).await;
            debug!("SSE: Sending heartbeat");
            yield Ok(Event::default().comment("heartbeat"));
        }
    };

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}
