//! # SignLink Common Library
//!
//! Shared code for the SignLink gesture services:
//! - Gesture symbols and alphabets
//! - Stability-gated detector and gesture sources
//! - Output buffer and symbol dispatch
//! - Sector routing, care notifications and per-session state
//! - Event types (SlpEvent enum) and EventBus
//! - Configuration loading

pub mod buffer;
pub mod care;
pub mod config;
pub mod detector;
pub mod error;
pub mod events;
pub mod sector;
pub mod session;
pub mod source;
pub mod symbol;
pub mod time;

pub use buffer::{dispatch, ActionSink, FeedbackKind, FeedbackMessage, NoopSink, OutputBuffer};
pub use detector::{DetectorConfig, DetectorPhase, DetectorState, StabilityGatedDetector};
pub use error::{Error, Result};
pub use events::{EventBus, SlpEvent};
pub use sector::Sector;
pub use session::{GestureSession, SessionSnapshot, SlideDeck, TickReport};
pub use source::{GestureSource, RandomGestureSource, Sample, ScriptedSource};
pub use symbol::{Alphabet, GestureSymbol};
pub use time::{Clock, ManualClock, MonotonicClock, Timestamp};
