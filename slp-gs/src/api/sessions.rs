//! Session lifecycle handlers
//!
//! POST /sessions, GET /sessions, GET/DELETE /sessions/:id,
//! POST /sessions/:id/clear, POST /sessions/:id/simulation/{start,stop}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use slp_common::session::SessionSnapshot;
use slp_common::{GestureSession, Sector, SlpEvent, StabilityGatedDetector};
use tracing::{info, warn};
use uuid::Uuid;

use super::{load_session, snapshot, OperationResponse};
use crate::{error::ApiResult, simulation, AppState};

/// POST /sessions request
#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    /// Initial sector; enterprise when omitted
    #[serde(default)]
    pub sector: Option<String>,
    /// Start the simulated polling loop right away
    #[serde(default)]
    pub simulate: bool,
}

/// POST /sessions
///
/// Open a session with a fresh gesture source. Returns 201 with the
/// session snapshot.
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> ApiResult<(StatusCode, Json<SessionSnapshot>)> {
    let sector = request
        .sector
        .as_deref()
        .map(str::parse::<Sector>)
        .transpose()?
        .unwrap_or_default();

    let source = match (state.source_factory)() {
        Ok(source) => source,
        Err(e) => {
            warn!(error = %e, "Failed to build gesture source");
            state.record_error(format!("Gesture source: {}", e)).await;
            return Err(e.into());
        }
    };

    let id = Uuid::new_v4();
    let detector = StabilityGatedDetector::new(state.config.detector.clone(), source);
    let session = GestureSession::new(id, sector, detector, state.event_bus.clone());
    let shared = state.sessions.insert(session).await;

    state.event_bus.emit_lossy(SlpEvent::SessionCreated {
        session_id: id,
        sector,
        timestamp: chrono::Utc::now(),
    });
    info!(session_id = %id, sector = %sector, simulate = request.simulate, "Session created");

    if request.simulate {
        simulation::start(&state, id).await?;
    }

    Ok((StatusCode::CREATED, Json(snapshot(&state, &shared).await)))
}

/// GET /sessions
pub async fn list_sessions(State(state): State<AppState>) -> Json<Vec<SessionSnapshot>> {
    let now = state.clock.now();
    let mut snapshots = Vec::new();
    for session in state.sessions.all().await {
        snapshots.push(session.lock().await.snapshot(now));
    }
    snapshots.sort_by_key(|s| s.created_at);
    Json(snapshots)
}

/// GET /sessions/:id
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionSnapshot>> {
    let session = load_session(&state, id).await?;
    Ok(Json(snapshot(&state, &session).await))
}

/// DELETE /sessions/:id
///
/// Tears the session down; a running simulation is cancelled.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .sessions
        .remove(id)
        .await
        .ok_or_else(|| crate::ApiError::NotFound(format!("Session not found: {}", id)))?;

    state.event_bus.emit_lossy(SlpEvent::SessionClosed {
        session_id: id,
        timestamp: chrono::Utc::now(),
    });
    info!(session_id = %id, "Session closed");

    Ok(StatusCode::NO_CONTENT)
}

/// POST /sessions/:id/clear
pub async fn clear_text(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<OperationResponse>> {
    let session = load_session(&state, id).await?;
    let mut guard = session.lock().await;
    let feedback = guard.clear_text();
    Ok(Json(OperationResponse {
        feedback: Some(feedback),
        session: guard.snapshot(state.clock.now()),
    }))
}

/// POST /sessions/:id/simulation/start
///
/// No-op (feedback absent) when the simulation is already running.
pub async fn start_simulation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<OperationResponse>> {
    let feedback = simulation::start(&state, id).await?;
    let session = load_session(&state, id).await?;
    Ok(Json(OperationResponse {
        feedback,
        session: snapshot(&state, &session).await,
    }))
}

/// POST /sessions/:id/simulation/stop
///
/// No-op (feedback absent) when no simulation is running.
pub async fn stop_simulation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<OperationResponse>> {
    let feedback = simulation::stop(&state, id).await?;
    let session = load_session(&state, id).await?;
    Ok(Json(OperationResponse {
        feedback,
        session: snapshot(&state, &session).await,
    }))
}

/// Build session lifecycle routes
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(create_session).get(list_sessions))
        .route("/sessions/:id", get(get_session).delete(delete_session))
        .route("/sessions/:id/clear", post(clear_text))
        .route("/sessions/:id/simulation/start", post(start_simulation))
        .route("/sessions/:id/simulation/stop", post(stop_simulation))
}
