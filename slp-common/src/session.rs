//! Per-session gesture state
//!
//! One `GestureSession` per connected client. It owns the detector (and
//! through it the gesture source), the typed text, the sector, the slide
//! deck and the care log. Nothing in here is shared between sessions; the
//! surrounding service decides when sessions are created and torn down.
//!
//! Detected and manually entered symbols take the same route:
//! 1. Healthcare care letters raise a care request
//! 2. Everything else goes through [`dispatch`] with a sector-aware sink
//! 3. Education watches the typed text for the search trigger

use crate::buffer::{dispatch, ActionSink, FeedbackKind, FeedbackMessage, OutputBuffer};
use crate::care::{care_gesture, CareGesture, CareLog, CareNotification};
use crate::detector::{DetectorPhase, StabilityGatedDetector};
use crate::events::{EventBus, SlpEvent};
use crate::sector::{Sector, SectorInfo};
use crate::symbol::GestureSymbol;
use crate::time::{wall_now, Timestamp};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Slides in a freshly opened presentation
pub const DEFAULT_TOTAL_SLIDES: u32 = 10;

/// Typing this word in the education sector opens the search page
const SEARCH_TRIGGER: &str = "google";
const SEARCH_URL: &str = "https://www.google.com";

const SWIPE_LEFT: &str = "SWIPE_LEFT";
const SWIPE_RIGHT: &str = "SWIPE_RIGHT";

/// Presentation position, 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlideDeck {
    current: u32,
    total: u32,
}

impl SlideDeck {
    pub fn new(total: u32) -> Self {
        Self {
            current: 1,
            total: total.max(1),
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    /// Advance one slide; false when already on the last one
    pub fn next(&mut self) -> bool {
        if self.current < self.total {
            self.current += 1;
            true
        } else {
            false
        }
    }

    /// Go back one slide; false when already on the first one
    pub fn previous(&mut self) -> bool {
        if self.current > 1 {
            self.current -= 1;
            true
        } else {
            false
        }
    }
}

impl Default for SlideDeck {
    fn default() -> Self {
        Self::new(DEFAULT_TOTAL_SLIDES)
    }
}

/// Result of one detector tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickReport {
    /// Symbol accepted on this tick, if any
    pub symbol: Option<GestureSymbol>,
    /// Feedback produced by routing the accepted symbol
    pub feedback: Option<FeedbackMessage>,
    /// Stability after the tick
    pub stability: f64,
    pub phase: DetectorPhase,
}

/// Serializable view of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub sector: Sector,
    pub sector_info: SectorInfo,
    pub text: String,
    pub text_len: usize,
    pub stability: f64,
    pub phase: DetectorPhase,
    pub last_prediction: Option<GestureSymbol>,
    pub feedback: Option<FeedbackMessage>,
    pub simulation_active: bool,
    pub slides: SlideDeck,
    pub notifications: usize,
    pub created_at: DateTime<Utc>,
}

/// Routes non-typing symbols for the session's current sector
struct SectorSink<'a> {
    session_id: Uuid,
    sector: Sector,
    slides: &'a mut SlideDeck,
    events: &'a EventBus,
}

impl SectorSink<'_> {
    fn slide_changed(&self) {
        self.events.emit_lossy(SlpEvent::SlideChanged {
            session_id: self.session_id,
            current: self.slides.current(),
            total: self.slides.total(),
            timestamp: wall_now(),
        });
    }
}

impl ActionSink for SectorSink<'_> {
    fn commit(&mut self, text: &str) {
        info!(session_id = %self.session_id, len = text.chars().count(), "Text committed");
        self.events.emit_lossy(SlpEvent::TextCommitted {
            session_id: self.session_id,
            text: text.to_string(),
            timestamp: wall_now(),
        });
    }

    fn command(&mut self, symbol: &GestureSymbol) -> Option<String> {
        let GestureSymbol::Command(token) = symbol else {
            return None;
        };

        match (self.sector, token.as_str()) {
            (Sector::Enterprise, SWIPE_RIGHT) => {
                if self.slides.next() {
                    self.slide_changed();
                    Some("➡️ Next slide".to_string())
                } else {
                    Some("➡️ Already on the last slide".to_string())
                }
            }
            (Sector::Enterprise, SWIPE_LEFT) => {
                if self.slides.previous() {
                    self.slide_changed();
                    Some("⬅️ Previous slide".to_string())
                } else {
                    Some("⬅️ Already on the first slide".to_string())
                }
            }
            // Slide control only exists in the enterprise sector
            (_, SWIPE_LEFT) | (_, SWIPE_RIGHT) => None,
            (_, other) => {
                self.events.emit_lossy(SlpEvent::ExternalActionRequested {
                    session_id: self.session_id,
                    action: other.to_string(),
                    url: None,
                    timestamp: wall_now(),
                });
                Some(format!("✅ {} requested", other))
            }
        }
    }
}

/// State and behavior of one gesture session
#[derive(Debug)]
pub struct GestureSession {
    id: Uuid,
    sector: Sector,
    detector: StabilityGatedDetector,
    buffer: OutputBuffer,
    slides: SlideDeck,
    care_log: CareLog,
    last_prediction: Option<GestureSymbol>,
    feedback: Option<FeedbackMessage>,
    simulation_active: bool,
    created_at: DateTime<Utc>,
    events: EventBus,
}

impl GestureSession {
    pub fn new(
        id: Uuid,
        sector: Sector,
        detector: StabilityGatedDetector,
        events: EventBus,
    ) -> Self {
        Self {
            id,
            sector,
            detector,
            buffer: OutputBuffer::new(),
            slides: SlideDeck::default(),
            care_log: CareLog::new(),
            last_prediction: None,
            feedback: None,
            simulation_active: false,
            created_at: wall_now(),
            events,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn sector(&self) -> Sector {
        self.sector
    }

    pub fn text(&self) -> &str {
        self.buffer.as_str()
    }

    pub fn buffer(&self) -> &OutputBuffer {
        &self.buffer
    }

    pub fn detector(&self) -> &StabilityGatedDetector {
        &self.detector
    }

    pub fn slides(&self) -> SlideDeck {
        self.slides
    }

    pub fn care_log(&self) -> &CareLog {
        &self.care_log
    }

    pub fn last_prediction(&self) -> Option<&GestureSymbol> {
        self.last_prediction.as_ref()
    }

    pub fn feedback(&self) -> Option<&FeedbackMessage> {
        self.feedback.as_ref()
    }

    pub fn simulation_active(&self) -> bool {
        self.simulation_active
    }

    /// Run one detector tick and route any accepted symbol
    pub fn tick(&mut self, now: Timestamp) -> TickReport {
        let symbol = self.detector.tick(now);
        let stability = self.detector.stability();

        self.events.emit_lossy(SlpEvent::StabilityUpdated {
            session_id: self.id,
            stability,
            timestamp: wall_now(),
        });

        let feedback = symbol.clone().map(|s| self.route(s, true));

        TickReport {
            symbol,
            feedback,
            stability,
            phase: self.detector.phase(now),
        }
    }

    /// Manual input (virtual keyboard); same routing as detected symbols
    pub fn input(&mut self, symbol: GestureSymbol) -> FeedbackMessage {
        self.route(symbol, false)
    }

    /// Raise a care request from the patient panel
    ///
    /// Only available in the healthcare sector. A request held longer than
    /// the emergency hold time is escalated.
    pub fn request_care(&mut self, letter: char, held: Duration) -> Result<FeedbackMessage> {
        if self.sector != Sector::Healthcare {
            return Err(Error::InvalidInput(format!(
                "Care requests are only available in the healthcare sector (current: {})",
                self.sector
            )));
        }
        let gesture = care_gesture(letter)
            .ok_or_else(|| Error::NotFound(format!("No care request bound to '{}'", letter)))?;

        let feedback = self.raise_care(gesture, held);
        self.set_feedback(feedback.clone());
        Ok(feedback)
    }

    /// Switch sector; the typed text is cleared
    pub fn switch_sector(&mut self, sector: Sector) -> FeedbackMessage {
        self.sector = sector;
        self.buffer.clear();
        info!(session_id = %self.id, sector = %sector, "Sector switched");

        self.events.emit_lossy(SlpEvent::SectorChanged {
            session_id: self.id,
            sector,
            timestamp: wall_now(),
        });

        let info = sector.info();
        let feedback = FeedbackMessage::notice(format!(
            "✅ Switched to {} - {}",
            info.name, info.scenario
        ));
        self.set_feedback(feedback.clone());
        feedback
    }

    /// Run a quick action of the current sector by name
    pub fn execute_quick_action(&mut self, name: &str) -> Result<FeedbackMessage> {
        let action = self.sector.find_action(name).ok_or_else(|| {
            Error::NotFound(format!(
                "No quick action '{}' in the {} sector",
                name, self.sector
            ))
        })?;

        self.events.emit_lossy(SlpEvent::ExternalActionRequested {
            session_id: self.id,
            action: action.name.to_string(),
            url: action.url.map(str::to_string),
            timestamp: wall_now(),
        });

        let mode = self.sector.info().name;
        let text = match action.url {
            Some(_) => format!("🌐 Opening {}...", action.name),
            None => format!("✅ {} activated in {} mode", action.name, mode),
        };
        let feedback = FeedbackMessage::new(FeedbackKind::Command, text);
        self.set_feedback(feedback.clone());
        Ok(feedback)
    }

    pub fn next_slide(&mut self) -> FeedbackMessage {
        self.slide_command(SWIPE_RIGHT)
    }

    pub fn previous_slide(&mut self) -> FeedbackMessage {
        self.slide_command(SWIPE_LEFT)
    }

    /// Explicit clear of the typed text
    pub fn clear_text(&mut self) -> FeedbackMessage {
        self.buffer.clear();
        let feedback = FeedbackMessage::notice("🧹 Text cleared");
        self.set_feedback(feedback.clone());
        feedback
    }

    /// Record whether the polling loop is running for this session
    pub fn set_simulation_active(&mut self, active: bool) -> FeedbackMessage {
        self.simulation_active = active;
        self.events.emit_lossy(SlpEvent::SimulationStateChanged {
            session_id: self.id,
            active,
            timestamp: wall_now(),
        });

        let feedback = if active {
            FeedbackMessage::notice("🎭 Gesture simulation started")
        } else {
            FeedbackMessage::notice("⏹️ Gesture simulation stopped")
        };
        self.set_feedback(feedback.clone());
        feedback
    }

    pub fn snapshot(&self, now: Timestamp) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            sector: self.sector,
            sector_info: self.sector.info(),
            text: self.buffer.as_str().to_string(),
            text_len: self.buffer.len(),
            stability: self.detector.stability(),
            phase: self.detector.phase(now),
            last_prediction: self.last_prediction.clone(),
            feedback: self.feedback.clone(),
            simulation_active: self.simulation_active,
            slides: self.slides,
            notifications: self.care_log.len(),
            created_at: self.created_at,
        }
    }

    fn slide_command(&mut self, token: &str) -> FeedbackMessage {
        // Explicit slide buttons work in every sector
        let moved = if token == SWIPE_RIGHT {
            self.slides.next()
        } else {
            self.slides.previous()
        };

        if moved {
            self.events.emit_lossy(SlpEvent::SlideChanged {
                session_id: self.id,
                current: self.slides.current(),
                total: self.slides.total(),
                timestamp: wall_now(),
            });
        }

        let text = match (token == SWIPE_RIGHT, moved) {
            (true, true) => "➡️ Next slide",
            (true, false) => "➡️ Already on the last slide",
            (false, true) => "⬅️ Previous slide",
            (false, false) => "⬅️ Already on the first slide",
        };
        let feedback = FeedbackMessage::new(FeedbackKind::Command, text);
        self.set_feedback(feedback.clone());
        feedback
    }

    fn route(&mut self, symbol: GestureSymbol, detected: bool) -> FeedbackMessage {
        debug!(session_id = %self.id, symbol = %symbol, detected, "Routing symbol");

        self.last_prediction = Some(symbol.clone());
        self.events.emit_lossy(SlpEvent::SymbolDetected {
            session_id: self.id,
            symbol: symbol.clone(),
            detected,
            timestamp: wall_now(),
        });

        let care = match (self.sector, symbol.as_letter()) {
            (Sector::Healthcare, Some(letter)) => care_gesture(letter),
            _ => None,
        };

        let feedback = match care {
            Some(gesture) => self.raise_care(gesture, Duration::ZERO),
            None => {
                let mut sink = SectorSink {
                    session_id: self.id,
                    sector: self.sector,
                    slides: &mut self.slides,
                    events: &self.events,
                };
                let feedback = dispatch(&symbol, &mut self.buffer, &mut sink);
                self.check_search_trigger().unwrap_or(feedback)
            }
        };

        self.set_feedback(feedback.clone());
        feedback
    }

    /// Education: typing the search word opens the search page
    fn check_search_trigger(&mut self) -> Option<FeedbackMessage> {
        if self.sector != Sector::Education
            || !self.buffer.as_str().to_lowercase().contains(SEARCH_TRIGGER)
        {
            return None;
        }

        self.buffer.clear();
        self.events.emit_lossy(SlpEvent::ExternalActionRequested {
            session_id: self.id,
            action: "Search".to_string(),
            url: Some(SEARCH_URL.to_string()),
            timestamp: wall_now(),
        });
        Some(FeedbackMessage::new(
            FeedbackKind::Command,
            "🌐 Opening Google...",
        ))
    }

    fn raise_care(&mut self, gesture: &CareGesture, held: Duration) -> FeedbackMessage {
        let notification = CareNotification::new(gesture, held, wall_now());

        let feedback = if notification.emergency {
            // Staff alert: delivery is the client's concern, the log is the record
            warn!(
                session_id = %self.id,
                subject = notification.subject(),
                body = %notification.alert_body(),
                "Care alert raised"
            );
            FeedbackMessage::notice(format!(
                "🚨 EMERGENCY: {} - Notification sent!",
                gesture.name
            ))
        } else {
            info!(session_id = %self.id, request = gesture.name, "Care request raised");
            FeedbackMessage::notice(format!("🏥 {} requested", gesture.name))
        };

        self.events.emit_lossy(SlpEvent::CareNotificationRaised {
            session_id: self.id,
            notification: notification.clone(),
        });
        self.care_log.record(notification);
        feedback
    }

    fn set_feedback(&mut self, feedback: FeedbackMessage) {
        self.events.emit_lossy(SlpEvent::FeedbackIssued {
            session_id: self.id,
            feedback: feedback.clone(),
            text: self.buffer.as_str().to_string(),
            timestamp: wall_now(),
        });
        self.feedback = Some(feedback);
    }
}
