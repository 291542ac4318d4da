//! Gesture input handlers
//!
//! POST /sessions/:id/tick, POST /sessions/:id/input,
//! POST /sessions/:id/care, GET /sessions/:id/notifications

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use slp_common::care::CareNotification;
use slp_common::session::SessionSnapshot;
use slp_common::{GestureSymbol, TickReport};
use std::time::Duration;
use uuid::Uuid;

use super::{load_session, OperationResponse};
use crate::{
    error::{ApiError, ApiResult},
    AppState,
};

/// POST /sessions/:id/tick response
#[derive(Debug, Serialize)]
pub struct TickResponse {
    #[serde(flatten)]
    pub report: TickReport,
    pub session: SessionSnapshot,
}

/// POST /sessions/:id/input request
#[derive(Debug, Deserialize)]
pub struct InputRequest {
    /// Symbol label: a letter, SPACE, ENTER, BACKSPACE/DELETE or a command
    pub symbol: String,
}

/// POST /sessions/:id/care request
#[derive(Debug, Deserialize)]
pub struct CareRequest {
    /// Care letter (B, L, D, T, W, P, H, E)
    pub gesture: String,
    /// How long the request was held, in seconds
    #[serde(default)]
    pub hold_secs: f64,
}

/// GET /sessions/:id/notifications query
#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    /// Only the most recent N entries
    pub recent: Option<usize>,
}

/// GET /sessions/:id/notifications response
#[derive(Debug, Serialize)]
pub struct NotificationsResponse {
    pub total: usize,
    pub emergencies: usize,
    pub notifications: Vec<CareNotification>,
}

/// POST /sessions/:id/tick
///
/// Run one detector tick at the current clock reading. Rejected with 409
/// while the session's simulation loop owns the ticks; the check and the
/// tick happen under the same session lock.
pub async fn tick(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TickResponse>> {
    let session = load_session(&state, id).await?;
    let mut guard = session.lock().await;
    if guard.simulation_active() {
        return Err(ApiError::Conflict(format!(
            "Simulation is running for session {}",
            id
        )));
    }

    let now = state.clock.now();
    let report = guard.tick(now);
    Ok(Json(TickResponse {
        report,
        session: guard.snapshot(now),
    }))
}

/// POST /sessions/:id/input
///
/// Manual (virtual key) input, routed exactly like a detected symbol.
pub async fn input(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<InputRequest>,
) -> ApiResult<Json<OperationResponse>> {
    let symbol: GestureSymbol = request.symbol.parse()?;
    let session = load_session(&state, id).await?;

    let mut guard = session.lock().await;
    let feedback = guard.input(symbol);
    Ok(Json(OperationResponse {
        feedback: Some(feedback),
        session: guard.snapshot(state.clock.now()),
    }))
}

/// POST /sessions/:id/care
pub async fn request_care(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CareRequest>,
) -> ApiResult<Json<OperationResponse>> {
    let mut chars = request.gesture.trim().chars();
    let letter = match (chars.next(), chars.next()) {
        (Some(c), None) => c,
        _ => {
            return Err(ApiError::BadRequest(format!(
                "Care gesture must be a single letter, got {:?}",
                request.gesture
            )))
        }
    };
    let held = Duration::try_from_secs_f64(request.hold_secs).map_err(|_| {
        ApiError::BadRequest(format!(
            "hold_secs must be a non-negative number, got {}",
            request.hold_secs
        ))
    })?;

    let session = load_session(&state, id).await?;
    let mut guard = session.lock().await;
    let feedback = guard.request_care(letter, held)?;
    Ok(Json(OperationResponse {
        feedback: Some(feedback),
        session: guard.snapshot(state.clock.now()),
    }))
}

/// GET /sessions/:id/notifications
pub async fn notifications(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<NotificationQuery>,
) -> ApiResult<Json<NotificationsResponse>> {
    let session = load_session(&state, id).await?;
    let guard = session.lock().await;
    let log = guard.care_log();

    let notifications = match query.recent {
        Some(n) => log.recent(n).to_vec(),
        None => log.all().to_vec(),
    };

    Ok(Json(NotificationsResponse {
        total: log.len(),
        emergencies: log.emergencies().count(),
        notifications,
    }))
}

/// Build gesture input routes
pub fn gesture_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions/:id/tick", post(tick))
        .route("/sessions/:id/input", post(input))
        .route("/sessions/:id/care", post(request_care))
        .route("/sessions/:id/notifications", get(notifications))
}
