//! SSE event stream endpoint

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use futures::stream::Stream;
use std::convert::Infallible;

use crate::AppState;

/// GET /events - domain event stream
///
/// Fans out engine events (submissions, reviews, progress changes) to
/// connected staff dashboards and portals.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    praxis_common::sse::create_event_sse_stream("praxis-ma", state.shared.subscribe_events())
}
