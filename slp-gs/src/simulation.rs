//! Polling loop for simulated sessions
//!
//! One task per session, ticking the detector at the configured cadence
//! until its cancellation token fires.

use crate::error::{ApiError, ApiResult};
use crate::sessions::{SharedSession, SimulationClaim};
use crate::AppState;
use slp_common::{Clock, FeedbackMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

/// Start polling a session
///
/// Returns the session feedback, or `None` if simulation was already running.
pub async fn start(state: &AppState, id: Uuid) -> ApiResult<Option<FeedbackMessage>> {
    let claim = state
        .sessions
        .claim_simulation(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Session not found: {}", id)))?;

    let (session, token) = match claim {
        SimulationClaim::Claimed(session, token) => (session, token),
        SimulationClaim::AlreadyRunning => {
            debug!(session_id = %id, "Simulation already running");
            return Ok(None);
        }
    };

    let feedback = match activate(&session, &token).await {
        Some(feedback) => feedback,
        None => {
            debug!(session_id = %id, "Simulation stopped before it started");
            return Ok(None);
        }
    };

    let period = state.config.simulation.tick_interval();
    let clock = Arc::clone(&state.clock);
    tokio::spawn(run(id, session, clock, period, token));

    Ok(Some(feedback))
}

/// Stop polling a session
///
/// Returns the session feedback, or `None` if no simulation was running.
pub async fn stop(state: &AppState, id: Uuid) -> ApiResult<Option<FeedbackMessage>> {
    let stopped = state
        .sessions
        .release_simulation(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Session not found: {}", id)))?;

    if !stopped {
        debug!(session_id = %id, "Simulation not running");
        return Ok(None);
    }

    let session = state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Session not found: {}", id)))?;
    let feedback = session.lock().await.set_simulation_active(false);
    Ok(Some(feedback))
}

/// Raise the session flag, unless the claim was already released
///
/// The check and the flag update share one session lock, and `stop` cancels
/// the token before it takes that lock to clear the flag.
async fn activate(session: &SharedSession, token: &CancellationToken) -> Option<FeedbackMessage> {
    let mut session = session.lock().await;
    if token.is_cancelled() {
        return None;
    }
    Some(session.set_simulation_active(true))
}

async fn run(
    id: Uuid,
    session: SharedSession,
    clock: Arc<dyn Clock>,
    period: Duration,
    token: CancellationToken,
) {
    info!(session_id = %id, period_ms = period.as_millis() as u64, "Simulation started");

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut emitted = 0u64;
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                let report = session.lock().await.tick(clock.now());
                if let Some(symbol) = report.symbol {
                    emitted += 1;
                    debug!(session_id = %id, symbol = %symbol, "Simulated gesture accepted");
                }
            }
        }
    }

    info!(session_id = %id, emitted, "Simulation stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::SessionStore;
    use slp_common::{
        DetectorConfig, EventBus, GestureSession, ScriptedSource, Sector, StabilityGatedDetector,
    };

    async fn stored_session(store: &SessionStore) -> (Uuid, SharedSession) {
        let detector = StabilityGatedDetector::new(
            DetectorConfig::default(),
            Box::new(ScriptedSource::new()),
        );
        let events = EventBus::new(16);
        let session = GestureSession::new(Uuid::new_v4(), Sector::default(), detector, events);
        let id = session.id();
        (id, store.insert(session).await)
    }

    #[tokio::test]
    async fn test_activate_raises_flag_for_live_claim() {
        let store = SessionStore::new();
        let (id, session) = stored_session(&store).await;
        let token = match store.claim_simulation(id).await {
            Some(SimulationClaim::Claimed(_, token)) => token,
            _ => panic!("expected a fresh claim"),
        };

        assert!(activate(&session, &token).await.is_some());
        assert!(session.lock().await.simulation_active());
    }

    #[tokio::test]
    async fn test_stop_between_claim_and_activation_wins() {
        let store = SessionStore::new();
        let (id, session) = stored_session(&store).await;
        let token = match store.claim_simulation(id).await {
            Some(SimulationClaim::Claimed(_, token)) => token,
            _ => panic!("expected a fresh claim"),
        };

        // stop: release the slot, then clear the flag under the session lock
        assert_eq!(store.release_simulation(id).await, Some(true));
        session.lock().await.set_simulation_active(false);

        assert!(activate(&session, &token).await.is_none());
        assert!(!session.lock().await.simulation_active());
        assert_eq!(store.release_simulation(id).await, Some(false));
    }
}
