//! Session registry
//!
//! Maps session IDs to their [`GestureSession`] and, while simulation runs,
//! the cancellation token of the polling task. The map lock is only held
//! for lookups and bookkeeping, never across a detector tick.

use slp_common::GestureSession;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

/// Shared handle to one session
pub type SharedSession = Arc<Mutex<GestureSession>>;

struct SessionEntry {
    session: SharedSession,
    /// Present while a simulation task is polling this session
    simulation: Option<CancellationToken>,
}

/// Outcome of [`SessionStore::claim_simulation`]
pub enum SimulationClaim {
    /// Caller owns the slot and should spawn the polling task
    Claimed(SharedSession, CancellationToken),
    AlreadyRunning,
}

/// Registry of live sessions
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session and return its shared handle
    pub async fn insert(&self, session: GestureSession) -> SharedSession {
        let id = session.id();
        let shared = Arc::new(Mutex::new(session));
        self.inner.write().await.insert(
            id,
            SessionEntry {
                session: Arc::clone(&shared),
                simulation: None,
            },
        );
        debug!(session_id = %id, "Session registered");
        shared
    }

    pub async fn get(&self, id: Uuid) -> Option<SharedSession> {
        self.inner
            .read()
            .await
            .get(&id)
            .map(|entry| Arc::clone(&entry.session))
    }

    /// All sessions, in no particular order
    pub async fn all(&self) -> Vec<SharedSession> {
        self.inner
            .read()
            .await
            .values()
            .map(|entry| Arc::clone(&entry.session))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Remove a session, cancelling its simulation task if one is running
    pub async fn remove(&self, id: Uuid) -> Option<SharedSession> {
        let entry = self.inner.write().await.remove(&id)?;
        if let Some(token) = entry.simulation {
            token.cancel();
        }
        debug!(session_id = %id, "Session removed");
        Some(entry.session)
    }

    /// Claim the simulation slot of a session; `None` if it does not exist
    pub async fn claim_simulation(&self, id: Uuid) -> Option<SimulationClaim> {
        let mut map = self.inner.write().await;
        let entry = map.get_mut(&id)?;
        if entry.simulation.is_some() {
            return Some(SimulationClaim::AlreadyRunning);
        }
        let token = CancellationToken::new();
        entry.simulation = Some(token.clone());
        Some(SimulationClaim::Claimed(Arc::clone(&entry.session), token))
    }

    /// Release the simulation slot and cancel its task
    ///
    /// Returns `None` if the session does not exist, otherwise whether a
    /// running simulation was stopped.
    pub async fn release_simulation(&self, id: Uuid) -> Option<bool> {
        let mut map = self.inner.write().await;
        let entry = map.get_mut(&id)?;
        match entry.simulation.take() {
            Some(token) => {
                token.cancel();
                Some(true)
            }
            None => Some(false),
        }
    }

    /// Cancel every simulation task (service shutdown)
    pub async fn shutdown(&self) {
        let mut map = self.inner.write().await;
        let mut cancelled = 0;
        for entry in map.values_mut() {
            if let Some(token) = entry.simulation.take() {
                token.cancel();
                cancelled += 1;
            }
        }
        info!(sessions = map.len(), cancelled, "Session store shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slp_common::{DetectorConfig, EventBus, ScriptedSource, Sector, StabilityGatedDetector};

    fn session() -> GestureSession {
        let detector = StabilityGatedDetector::new(
            DetectorConfig::default(),
            Box::new(ScriptedSource::new()),
        );
        let events = EventBus::new(16);
        GestureSession::new(Uuid::new_v4(), Sector::default(), detector, events)
    }

    async fn claimed_token(store: &SessionStore, id: Uuid) -> CancellationToken {
        match store.claim_simulation(id).await {
            Some(SimulationClaim::Claimed(_, token)) => token,
            _ => panic!("expected a fresh claim"),
        }
    }

    #[tokio::test]
    async fn test_insert_get_remove() {
        let store = SessionStore::new();
        let s = session();
        let id = s.id();
        store.insert(s).await;

        assert_eq!(store.len().await, 1);
        assert!(store.get(id).await.is_some());
        assert!(store.remove(id).await.is_some());
        assert!(store.get(id).await.is_none());
        assert!(store.remove(id).await.is_none());
    }

    #[tokio::test]
    async fn test_simulation_slot_claimed_once() {
        let store = SessionStore::new();
        let s = session();
        let id = s.id();
        store.insert(s).await;

        let token = claimed_token(&store, id).await;
        assert!(matches!(
            store.claim_simulation(id).await,
            Some(SimulationClaim::AlreadyRunning)
        ));

        assert_eq!(store.release_simulation(id).await, Some(true));
        assert!(token.is_cancelled());
        assert_eq!(store.release_simulation(id).await, Some(false));
        assert!(store.claim_simulation(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn test_remove_cancels_simulation() {
        let store = SessionStore::new();
        let s = session();
        let id = s.id();
        store.insert(s).await;

        let token = claimed_token(&store, id).await;
        store.remove(id).await;
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_shutdown_cancels_all() {
        let store = SessionStore::new();
        let mut tokens = Vec::new();
        for _ in 0..3 {
            let s = session();
            let id = s.id();
            store.insert(s).await;
            tokens.push(claimed_token(&store, id).await);
        }
        store.shutdown().await;
        assert!(tokens.iter().all(|t| t.is_cancelled()));
    }
}
