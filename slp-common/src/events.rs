//! Event types for the SignLink event system
//!
//! Provides the shared event enum and the EventBus used to fan session
//! activity out to SSE clients.

use crate::buffer::FeedbackMessage;
use crate::care::CareNotification;
use crate::sector::Sector;
use crate::symbol::GestureSymbol;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// SignLink event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
/// Every event belongs to exactly one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SlpEvent {
    /// Session opened by a client
    SessionCreated {
        session_id: Uuid,
        sector: Sector,
        timestamp: DateTime<Utc>,
    },

    /// Session torn down (client disconnect or explicit delete)
    SessionClosed {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// Stability after a detector tick
    ///
    /// High frequency while simulation runs; emitted lossily.
    StabilityUpdated {
        session_id: Uuid,
        stability: f64,
        timestamp: DateTime<Utc>,
    },

    /// Symbol accepted by the detector or entered manually
    SymbolDetected {
        session_id: Uuid,
        symbol: GestureSymbol,
        /// True when the symbol came from the detector rather than manual input
        detected: bool,
        timestamp: DateTime<Utc>,
    },

    /// Feedback text shown to the user changed
    FeedbackIssued {
        session_id: Uuid,
        feedback: FeedbackMessage,
        /// Buffer contents after the operation
        text: String,
        timestamp: DateTime<Utc>,
    },

    /// ENTER pressed; the client decides what committing means
    TextCommitted {
        session_id: Uuid,
        text: String,
        timestamp: DateTime<Utc>,
    },

    SectorChanged {
        session_id: Uuid,
        sector: Sector,
        timestamp: DateTime<Utc>,
    },

    SimulationStateChanged {
        session_id: Uuid,
        active: bool,
        timestamp: DateTime<Utc>,
    },

    SlideChanged {
        session_id: Uuid,
        current: u32,
        total: u32,
        timestamp: DateTime<Utc>,
    },

    /// Healthcare request raised
    CareNotificationRaised {
        session_id: Uuid,
        notification: CareNotification,
    },

    /// Action the client should carry out (open a page, start voice input)
    ExternalActionRequested {
        session_id: Uuid,
        action: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        url: Option<String>,
        timestamp: DateTime<Utc>,
    },
}

impl SlpEvent {
    /// Get event type as string for SSE `event:` field and filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            SlpEvent::SessionCreated { .. } => "SessionCreated",
            SlpEvent::SessionClosed { .. } => "SessionClosed",
            SlpEvent::StabilityUpdated { .. } => "StabilityUpdated",
            SlpEvent::SymbolDetected { .. } => "SymbolDetected",
            SlpEvent::FeedbackIssued { .. } => "FeedbackIssued",
            SlpEvent::TextCommitted { .. } => "TextCommitted",
            SlpEvent::SectorChanged { .. } => "SectorChanged",
            SlpEvent::SimulationStateChanged { .. } => "SimulationStateChanged",
            SlpEvent::SlideChanged { .. } => "SlideChanged",
            SlpEvent::CareNotificationRaised { .. } => "CareNotificationRaised",
            SlpEvent::ExternalActionRequested { .. } => "ExternalActionRequested",
        }
    }

    /// Session this event belongs to
    pub fn session_id(&self) -> Uuid {
        match self {
            SlpEvent::SessionCreated { session_id, .. }
            | SlpEvent::SessionClosed { session_id, .. }
            | SlpEvent::StabilityUpdated { session_id, .. }
            | SlpEvent::SymbolDetected { session_id, .. }
            | SlpEvent::FeedbackIssued { session_id, .. }
            | SlpEvent::TextCommitted { session_id, .. }
            | SlpEvent::SectorChanged { session_id, .. }
            | SlpEvent::SimulationStateChanged { session_id, .. }
            | SlpEvent::SlideChanged { session_id, .. }
            | SlpEvent::CareNotificationRaised { session_id, .. }
            | SlpEvent::ExternalActionRequested { session_id, .. } => *session_id,
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// Wraps `tokio::sync::broadcast`:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use slp_common::events::{EventBus, SlpEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(SlpEvent::SessionClosed {
///     session_id: uuid::Uuid::new_v4(),
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert_eq!(rx.try_recv().unwrap().event_type(), "SessionClosed");
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SlpEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// `capacity` is the number of events buffered before the oldest are
    /// dropped for lagging subscribers.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<SlpEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if nobody is listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: SlpEvent) -> Result<usize, broadcast::error::SendError<SlpEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: SlpEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closed(session_id: Uuid) -> SlpEvent {
        SlpEvent::SessionClosed {
            session_id,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_eventbus_emit_without_subscribers_fails() {
        let bus = EventBus::new(10);
        assert!(bus.emit(closed(Uuid::new_v4())).is_err());
    }

    #[test]
    fn test_eventbus_emit() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();
        let id = Uuid::new_v4();

        assert_eq!(bus.emit(closed(id)).unwrap(), 1);
        let received = rx.try_recv().expect("Should receive event");
        assert_eq!(received.event_type(), "SessionClosed");
        assert_eq!(received.session_id(), id);
    }

    #[test]
    fn test_eventbus_emit_lossy_on_full_channel() {
        let bus = EventBus::new(2);
        let _rx = bus.subscribe();
        for _ in 0..10 {
            bus.emit_lossy(SlpEvent::StabilityUpdated {
                session_id: Uuid::new_v4(),
                stability: 0.5,
                timestamp: Utc::now(),
            });
        }
        assert_eq!(bus.capacity(), 2);
    }

    #[test]
    fn test_eventbus_multiple_subscribers() {
        let bus = EventBus::new(10);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.emit(closed(Uuid::new_v4())).unwrap();
        assert_eq!(rx1.try_recv().unwrap().event_type(), "SessionClosed");
        assert_eq!(rx2.try_recv().unwrap().event_type(), "SessionClosed");
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = SlpEvent::SymbolDetected {
            session_id: Uuid::nil(),
            symbol: GestureSymbol::Letter('A'),
            detected: true,
            timestamp: Utc::now(),
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "SymbolDetected");
        assert_eq!(json["symbol"], "A");
        assert_eq!(json["detected"], true);

        let back: SlpEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back.event_type(), "SymbolDetected");
    }

    #[test]
    fn test_external_action_omits_missing_url() {
        let event = SlpEvent::ExternalActionRequested {
            session_id: Uuid::nil(),
            action: "VOICE".to_string(),
            url: None,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("url").is_none());
    }
}
