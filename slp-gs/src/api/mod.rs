//! HTTP API handlers for slp-gs
//!
//! REST endpoints per session plus one SSE stream for all session activity.

pub mod gestures;
pub mod health;
pub mod sector;
pub mod sessions;
pub mod sse;

pub use gestures::gesture_routes;
pub use health::health_routes;
pub use sector::sector_routes;
pub use sessions::session_routes;
pub use sse::event_stream;

use crate::error::{ApiError, ApiResult};
use crate::sessions::SharedSession;
use crate::AppState;
use serde::Serialize;
use slp_common::session::SessionSnapshot;
use slp_common::FeedbackMessage;
use uuid::Uuid;

/// Response for operations that change a session
#[derive(Debug, Serialize)]
pub struct OperationResponse {
    /// Feedback produced by the operation; absent for no-ops
    pub feedback: Option<FeedbackMessage>,
    pub session: SessionSnapshot,
}

/// Look up a session or fail with 404
pub(crate) async fn load_session(state: &AppState, id: Uuid) -> ApiResult<SharedSession> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Session not found: {}", id)))
}

/// Snapshot of a session at the current clock reading
pub(crate) async fn snapshot(state: &AppState, session: &SharedSession) -> SessionSnapshot {
    session.lock().await.snapshot(state.clock.now())
}
