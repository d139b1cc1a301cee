//! Server-Sent Events stream of survey progress
//!
//! Observers (a monitoring dashboard, the UI itself) subscribe here instead
//! of polling. Events are advisory; missing one never affects session state.

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use serde::Deserialize;
use std::convert::Infallible;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::AppState;

/// Query parameters for GET /api/events
#[derive(Debug, Deserialize)]
pub struct EventStreamParams {
    /// Restrict the stream to one session's events
    pub session_id: Option<Uuid>,
}

/// GET /api/events - SSE stream of survey events
///
/// Streams every `SurveyEvent` as it is emitted, optionally filtered to a
/// single session via `?session_id=`. Heartbeat comments keep idle
/// connections alive through proxies.
pub async fn event_stream(
    State(state): State<AppState>,
    Query(params): Query<EventStreamParams>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!(filter = ?params.session_id, "new SSE client connected");

    let mut rx = state.event_bus.subscribe();
    let filter = params.session_id;

    let stream = async_stream::stream! {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(15)) => {
                    debug!("SSE: sending heartbeat");
                    yield Ok(Event::default().comment("heartbeat"));
                }

                Ok(event) = rx.recv() => {
                    let wanted = filter.map_or(true, |id| event.session_id() == id);
                    if wanted {
                        let event_type = event.event_type();
                        match serde_json::to_string(&event) {
                            Ok(json) => {
                                debug!(event_type, "SSE: forwarding event");
                                yield Ok(Event::default().event(event_type).data(json));
                            }
                            Err(e) => {
                                warn!(event_type, error = %e, "SSE: failed to serialize event");
                            }
                        }
                    }
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}
