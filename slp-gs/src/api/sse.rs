//! Server-Sent Events (SSE) for session activity
//!
//! One stream for every session event, optionally narrowed to a single
//! session with `?session_id=`.

use crate::AppState;
use axum::{
    extract::{Query, State},
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use serde::Deserialize;
use slp_common::SlpEvent;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Idle time before a heartbeat comment is sent
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// GET /events query
#[derive(Debug, Default, Deserialize)]
pub struct EventFilter {
    /// Only forward events of this session
    pub session_id: Option<Uuid>,
}

/// GET /events - SSE event stream
///
/// Streams every `SlpEvent` as JSON with the event type in the SSE
/// `event:` field. Heartbeat comment every 15 seconds.
pub async fn event_stream(
    State(state): State<AppState>,
    Query(filter): Query<EventFilter>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!(session_id = ?filter.session_id, "New SSE client connected");

    let rx = state.event_bus.subscribe();
    Sse::new(event_frames(rx, filter, HEARTBEAT_INTERVAL))
}

fn event_frames(
    mut rx: broadcast::Receiver<SlpEvent>,
    filter: EventFilter,
    heartbeat: Duration,
) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(heartbeat) => {
                    debug!("SSE: Sending heartbeat");
                    yield Ok(Event::default().comment("heartbeat"));
                }

                received = rx.recv() => {
                    let event = match received {
                        Ok(event) => event,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "SSE: Client lagging, events dropped");
                            continue;
                        }
                        Err(RecvError::Closed) => break,
                    };

                    if filter.session_id.is_some_and(|id| id != event.session_id()) {
                        continue;
                    }

                    let event_type = event.event_type();
                    match serde_json::to_string(&event) {
                        Ok(event_json) => {
                            yield Ok(Event::default().event(event_type).data(event_json));
                        }
                        Err(e) => {
                            warn!("SSE: Failed to serialize event {}: {}", event_type, e);
                        }
                    }
                }
            }
        }
        info!("SSE: Event stream ended");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::response::IntoResponse;
    use chrono::Utc;
    use http_body_util::BodyExt;
    use slp_common::EventBus;
    use std::time::Instant;

    async fn next_frame(body: &mut Body) -> String {
        let frame = body.frame().await.unwrap().unwrap();
        String::from_utf8(frame.into_data().unwrap().to_vec()).unwrap()
    }

    fn simulation_changed(session_id: Uuid) -> SlpEvent {
        SlpEvent::SimulationStateChanged {
            session_id,
            active: true,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_idle_stream_sends_one_heartbeat_per_interval() {
        let bus = EventBus::new(16);
        let heartbeat = Duration::from_millis(20);
        let frames = event_frames(bus.subscribe(), EventFilter::default(), heartbeat);
        let mut body = Sse::new(frames).into_response().into_body();

        let started = Instant::now();
        for _ in 0..3 {
            let frame = next_frame(&mut body).await;
            assert!(frame.starts_with(':'), "{frame:?}");
            assert!(frame.contains("heartbeat"), "{frame:?}");
        }
        assert!(started.elapsed() >= heartbeat * 3);
    }

    #[tokio::test]
    async fn test_filter_skips_other_sessions() {
        let bus = EventBus::new(16);
        let (wanted, other) = (Uuid::new_v4(), Uuid::new_v4());
        let filter = EventFilter {
            session_id: Some(wanted),
        };
        let frames = event_frames(bus.subscribe(), filter, Duration::from_secs(60));
        let mut body = Sse::new(frames).into_response().into_body();

        bus.emit_lossy(simulation_changed(other));
        bus.emit_lossy(simulation_changed(wanted));

        let frame = next_frame(&mut body).await;
        assert!(
            frame.starts_with("event: SimulationStateChanged\n"),
            "{frame:?}"
        );
        assert!(frame.contains(&wanted.to_string()));
        assert!(!frame.contains(&other.to_string()));
    }
}
