//! Sector handlers
//!
//! POST /sessions/:id/sector, POST /sessions/:id/actions,
//! POST /sessions/:id/slides/{next,previous}

use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use slp_common::Sector;
use uuid::Uuid;

use super::{load_session, OperationResponse};
use crate::{error::ApiResult, AppState};

/// POST /sessions/:id/sector request
#[derive(Debug, Deserialize)]
pub struct SectorRequest {
    /// healthcare, enterprise or education
    pub sector: String,
}

/// POST /sessions/:id/actions request
#[derive(Debug, Deserialize)]
pub struct QuickActionRequest {
    /// Quick action name, case-insensitive
    pub name: String,
}

/// POST /sessions/:id/sector
///
/// Switches sector and clears the typed text.
pub async fn switch_sector(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SectorRequest>,
) -> ApiResult<Json<OperationResponse>> {
    let sector: Sector = request.sector.parse()?;
    let session = load_session(&state, id).await?;

    let mut guard = session.lock().await;
    let feedback = guard.switch_sector(sector);
    Ok(Json(OperationResponse {
        feedback: Some(feedback),
        session: guard.snapshot(state.clock.now()),
    }))
}

/// POST /sessions/:id/actions
pub async fn quick_action(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<QuickActionRequest>,
) -> ApiResult<Json<OperationResponse>> {
    let session = load_session(&state, id).await?;

    let mut guard = session.lock().await;
    let feedback = guard.execute_quick_action(&request.name)?;
    Ok(Json(OperationResponse {
        feedback: Some(feedback),
        session: guard.snapshot(state.clock.now()),
    }))
}

/// POST /sessions/:id/slides/next
pub async fn next_slide(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<OperationResponse>> {
    let session = load_session(&state, id).await?;

    let mut guard = session.lock().await;
    let feedback = guard.next_slide();
    Ok(Json(OperationResponse {
        feedback: Some(feedback),
        session: guard.snapshot(state.clock.now()),
    }))
}

/// POST /sessions/:id/slides/previous
pub async fn previous_slide(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<OperationResponse>> {
    let session = load_session(&state, id).await?;

    let mut guard = session.lock().await;
    let feedback = guard.previous_slide();
    Ok(Json(OperationResponse {
        feedback: Some(feedback),
        session: guard.snapshot(state.clock.now()),
    }))
}

/// Build sector routes
pub fn sector_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions/:id/sector", post(switch_sector))
        .route("/sessions/:id/actions", post(quick_action))
        .route("/sessions/:id/slides/next", post(next_slide))
        .route("/sessions/:id/slides/previous", post(previous_slide))
}
