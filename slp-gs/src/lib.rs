//! slp-gs library interface
//!
//! Gesture Session service: hosts one stability-gated detector per client
//! session, drives the polling loop for simulated sessions and streams
//! session activity over SSE.

pub mod api;
pub mod error;
pub mod sessions;
pub mod simulation;

pub use crate::error::{ApiError, ApiResult};
pub use crate::sessions::SessionStore;

use axum::Router;
use chrono::{DateTime, Utc};
use slp_common::config::TomlConfig;
use slp_common::{Clock, EventBus, GestureSource, MonotonicClock, RandomGestureSource};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builds a fresh gesture source for each new session
pub type SourceFactory =
    Arc<dyn Fn() -> slp_common::Result<Box<dyn GestureSource>> + Send + Sync>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Live sessions and their simulation tasks
    pub sessions: SessionStore,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Time base for detector ticks
    pub clock: Arc<dyn Clock>,
    /// Gesture source constructor, one call per session
    pub source_factory: SourceFactory,
    /// Resolved bootstrap configuration
    pub config: Arc<TomlConfig>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(
        config: TomlConfig,
        event_bus: EventBus,
        clock: Arc<dyn Clock>,
        source_factory: SourceFactory,
    ) -> Self {
        Self {
            sessions: SessionStore::new(),
            event_bus,
            clock,
            source_factory,
            config: Arc::new(config),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Production wiring: monotonic clock and the random simulator
    pub fn simulated(config: TomlConfig) -> slp_common::Result<Self> {
        config.simulation.validate()?;
        let event_bus = EventBus::new(config.event_bus_capacity);
        let factory = simulated_source_factory(&config);
        let clock = Arc::new(MonotonicClock::new());
        Ok(Self::new(config, event_bus, clock, factory))
    }

    /// Remember an error for the health endpoint
    pub async fn record_error(&self, message: impl Into<String>) {
        *self.last_error.write().await = Some(message.into());
    }
}

/// Random simulator per session
///
/// With a configured seed, session N draws from `seed + N` so sessions are
/// reproducible without all replaying the same sequence.
pub fn simulated_source_factory(config: &TomlConfig) -> SourceFactory {
    let simulation = config.simulation.clone();
    let counter = AtomicU64::new(0);

    Arc::new(move || {
        let mut settings = simulation.clone();
        if let Some(seed) = settings.seed {
            let n = counter.fetch_add(1, Ordering::Relaxed);
            settings.seed = Some(seed.wrapping_add(n));
        }
        let source = RandomGestureSource::from_config(&settings)?;
        Ok(Box::new(source) as Box<dyn GestureSource>)
    })
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::session_routes())
        .merge(api::gesture_routes())
        .merge(api::sector_routes())
        .merge(api::health_routes())
        .route("/events", get(api::event_stream))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
