//! Stability-gated gesture detector
//!
//! Debounces a noisy gesture source: each tick either raises a stability
//! accumulator (gesture in frame) or decays it (nothing in frame). A symbol
//! is emitted only when stability reaches the acceptance threshold, and the
//! emission resets stability to zero and opens a refractory window during
//! which ticks are ignored.
//!
//! ```text
//!            present: +increment (clip 1.0)
//!            absent:  -decay     (floor 0.0)
//!   +------+  stability >= threshold   +------------+
//!   | Idle | ------------------------> | Refractory |
//!   +------+ <------------------------ +------------+
//!              refractory interval elapsed
//! ```
//!
//! The two phases are derived from `stability` and `last_emission`; there is
//! no separate state enum to keep in sync.

use crate::source::{GestureSource, Sample};
use crate::symbol::GestureSymbol;
use crate::time::Timestamp;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Detector tuning parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetectorConfig {
    /// Minimum gap between two emissions, in seconds
    #[serde(default = "default_refractory_secs")]
    pub refractory_secs: f64,

    /// Stability at or above which a symbol is emitted
    #[serde(default = "default_acceptance_threshold")]
    pub acceptance_threshold: f64,

    /// Stability lost on a tick with nothing in frame
    #[serde(default = "default_decay_step")]
    pub decay_step: f64,
}

fn default_refractory_secs() -> f64 {
    2.0
}

fn default_acceptance_threshold() -> f64 {
    0.8
}

fn default_decay_step() -> f64 {
    0.1
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            refractory_secs: default_refractory_secs(),
            acceptance_threshold: default_acceptance_threshold(),
            decay_step: default_decay_step(),
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.refractory_secs.is_finite() || self.refractory_secs < 0.0 {
            return Err(Error::Config(format!(
                "detector.refractory_secs must be a non-negative number, got {}",
                self.refractory_secs
            )));
        }
        if !(self.acceptance_threshold > 0.0 && self.acceptance_threshold <= 1.0) {
            return Err(Error::Config(format!(
                "detector.acceptance_threshold must be within (0, 1], got {}",
                self.acceptance_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.decay_step) {
            return Err(Error::Config(format!(
                "detector.decay_step must be within [0, 1], got {}",
                self.decay_step
            )));
        }
        Ok(())
    }

    pub fn refractory(&self) -> Duration {
        Duration::try_from_secs_f64(self.refractory_secs).unwrap_or(Duration::ZERO)
    }
}

/// Mutable detector state, owned by exactly one session
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DetectorState {
    stability: f64,
    last_emission: Option<Timestamp>,
}

impl DetectorState {
    /// Build a state; stability is clamped into [0, 1]
    pub fn new(stability: f64, last_emission: Option<Timestamp>) -> Self {
        Self {
            stability: clamp_unit(stability),
            last_emission,
        }
    }

    pub fn stability(&self) -> f64 {
        self.stability
    }

    /// When the last symbol was accepted; `None` if never
    pub fn last_emission(&self) -> Option<Timestamp> {
        self.last_emission
    }
}

/// Derived detector phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectorPhase {
    /// Accumulating (stability may be non-zero)
    Idle,
    /// Just emitted; ticks ignored until the refractory interval elapses
    Refractory,
}

/// Debouncing detector wrapped around a gesture source
pub struct StabilityGatedDetector {
    config: DetectorConfig,
    state: DetectorState,
    source: Box<dyn GestureSource>,
}

impl std::fmt::Debug for StabilityGatedDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StabilityGatedDetector")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl StabilityGatedDetector {
    /// New detector in the initial state (Idle, stability 0)
    pub fn new(config: DetectorConfig, source: Box<dyn GestureSource>) -> Self {
        Self::with_state(config, DetectorState::default(), source)
    }

    /// Resume from a known state
    pub fn with_state(
        config: DetectorConfig,
        state: DetectorState,
        source: Box<dyn GestureSource>,
    ) -> Self {
        Self {
            config,
            state,
            source,
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    pub fn stability(&self) -> f64 {
        self.state.stability
    }

    pub fn phase(&self, now: Timestamp) -> DetectorPhase {
        if self.in_refractory(now) {
            DetectorPhase::Refractory
        } else {
            DetectorPhase::Idle
        }
    }

    /// Back to the initial state; the source is kept
    pub fn reset(&mut self) {
        self.state = DetectorState::default();
    }

    /// Run one polling tick
    ///
    /// Returns the accepted symbol, if this tick crossed the threshold.
    /// During the refractory window the source is not polled and state is
    /// left untouched. A failing source counts as "nothing in frame".
    pub fn tick(&mut self, now: Timestamp) -> Option<GestureSymbol> {
        if self.in_refractory(now) {
            trace!("Detector refractory, tick ignored");
            return None;
        }

        let sample = match self.source.sample() {
            Ok(sample) => sample,
            Err(e) => {
                warn!(error = %e, "Gesture source failed, treating tick as absent");
                Sample::Absent
            }
        };

        match sample {
            Sample::Present { symbol, increment } => {
                let increment = sanitize_increment(increment);
                self.state.stability = (self.state.stability + increment).min(1.0);
                trace!(
                    symbol = %symbol,
                    increment,
                    stability = self.state.stability,
                    "Gesture in frame"
                );

                if self.state.stability >= self.config.acceptance_threshold {
                    // Emission and reset happen together under &mut self
                    self.state.stability = 0.0;
                    self.state.last_emission = Some(now);
                    debug!(symbol = %symbol, at_secs = now.as_secs_f64(), "Gesture accepted");
                    return Some(symbol);
                }
            }
            Sample::Absent => {
                self.state.stability = (self.state.stability - self.config.decay_step).max(0.0);
                trace!(stability = self.state.stability, "No gesture in frame");
            }
        }

        None
    }

    fn in_refractory(&self, now: Timestamp) -> bool {
        match self.state.last_emission {
            Some(last) => now.duration_since(last) < self.config.refractory(),
            None => false,
        }
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn sanitize_increment(increment: f64) -> f64 {
    clamp_unit(increment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ScriptedSource;

    fn letter(c: char) -> GestureSymbol {
        GestureSymbol::Letter(c)
    }

    fn detector_with(samples: Vec<Sample>) -> StabilityGatedDetector {
        StabilityGatedDetector::new(
            DetectorConfig::default(),
            Box::new(ScriptedSource::from_samples(samples)),
        )
    }

    fn secs(s: f64) -> Timestamp {
        Timestamp::from_secs_f64(s)
    }

    #[test]
    fn test_initial_state_is_idle_and_empty() {
        let detector = detector_with(vec![]);
        assert_eq!(detector.stability(), 0.0);
        assert_eq!(detector.state().last_emission(), None);
        assert_eq!(detector.phase(Timestamp::ZERO), DetectorPhase::Idle);
    }

    #[test]
    fn test_presence_accumulates_until_threshold() {
        let mut detector = detector_with(vec![
            Sample::present(letter('A'), 0.3),
            Sample::present(letter('B'), 0.3),
            Sample::present(letter('C'), 0.3),
        ]);

        assert_eq!(detector.tick(secs(10.0)), None);
        assert!((detector.stability() - 0.3).abs() < 1e-9);
        assert_eq!(detector.tick(secs(10.5)), None);
        assert!((detector.stability() - 0.6).abs() < 1e-9);

        // 0.9 >= 0.8: emits the symbol observed on the crossing tick
        assert_eq!(detector.tick(secs(11.0)), Some(letter('C')));
        assert_eq!(detector.stability(), 0.0);
        assert_eq!(detector.state().last_emission(), Some(secs(11.0)));
        assert_eq!(detector.phase(secs(11.5)), DetectorPhase::Refractory);
    }

    #[test]
    fn test_crossing_with_clip_emits_and_resets() {
        // stability 0.75, last emission long ago, +0.3 clips to 1.0 and fires
        let t0 = secs(100.0);
        let source = ScriptedSource::from_samples([Sample::present(letter('K'), 0.3)]);
        let mut detector = StabilityGatedDetector::with_state(
            DetectorConfig::default(),
            DetectorState::new(0.75, Some(secs(97.0))),
            Box::new(source),
        );

        let now = t0.checked_add(Duration::from_millis(100)).unwrap();
        assert_eq!(detector.tick(now), Some(letter('K')));
        assert_eq!(detector.stability(), 0.0);
        assert_eq!(detector.state().last_emission(), Some(now));
    }

    #[test]
    fn test_refractory_uses_last_emission_time() {
        // Same scenario, but the last emission was only 0.1s ago
        let t0 = secs(100.0);
        let mut source = ScriptedSource::new();
        source.push(Sample::present(letter('K'), 0.3));
        let mut detector = StabilityGatedDetector::with_state(
            DetectorConfig::default(),
            DetectorState::new(0.75, Some(t0)),
            Box::new(source),
        );

        let now = t0.checked_add(Duration::from_millis(100)).unwrap();
        assert_eq!(detector.tick(now), None);
        // Refractory ticks leave state untouched and do not consume samples
        assert_eq!(detector.stability(), 0.75);
        assert_eq!(detector.state().last_emission(), Some(t0));

        let later = t0.checked_add(Duration::from_secs(2)).unwrap();
        assert_eq!(detector.tick(later), Some(letter('K')));
    }

    #[test]
    fn test_refractory_boundary_is_inclusive_of_interval() {
        let mut detector = StabilityGatedDetector::with_state(
            DetectorConfig::default(),
            DetectorState::new(0.0, Some(secs(5.0))),
            Box::new(ScriptedSource::from_samples(vec![Sample::Absent])),
        );
        assert_eq!(detector.phase(secs(6.999)), DetectorPhase::Refractory);
        assert_eq!(detector.phase(secs(7.0)), DetectorPhase::Idle);
        assert_eq!(detector.tick(secs(7.0)), None);
    }

    #[test]
    fn test_ten_absent_ticks_decay_and_never_emit() {
        let mut detector = StabilityGatedDetector::with_state(
            DetectorConfig::default(),
            DetectorState::new(0.5, None),
            Box::new(ScriptedSource::new()),
        );

        let mut previous = detector.stability();
        for i in 0..10 {
            assert_eq!(detector.tick(secs(i as f64)), None);
            assert!(detector.stability() <= previous);
            assert!(detector.stability() >= 0.0);
            previous = detector.stability();
        }
        assert_eq!(detector.stability(), 0.0);
    }

    #[test]
    fn test_source_error_decays_instead_of_emitting() {
        let mut source = ScriptedSource::new();
        source.push_error("classifier timeout");
        source.push_error("classifier timeout");
        let mut detector = StabilityGatedDetector::with_state(
            DetectorConfig::default(),
            DetectorState::new(0.7, None),
            Box::new(source),
        );

        assert_eq!(detector.tick(secs(1.0)), None);
        assert!((detector.stability() - 0.6).abs() < 1e-9);
        assert_eq!(detector.tick(secs(2.0)), None);
        assert!((detector.stability() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_bogus_increments_are_sanitized() {
        let mut detector = detector_with(vec![
            Sample::present(letter('A'), -5.0),
            Sample::present(letter('A'), f64::NAN),
            Sample::present(letter('A'), 0.5),
        ]);

        assert_eq!(detector.tick(secs(1.0)), None);
        assert_eq!(detector.stability(), 0.0);
        assert_eq!(detector.tick(secs(2.0)), None);
        assert_eq!(detector.stability(), 0.0);
        assert_eq!(detector.tick(secs(3.0)), None);
        assert_eq!(detector.stability(), 0.5);
    }

    #[test]
    fn test_custom_threshold_and_refractory() {
        let config = DetectorConfig {
            refractory_secs: 0.5,
            acceptance_threshold: 0.3,
            decay_step: 0.05,
        };
        let mut detector = StabilityGatedDetector::new(
            config,
            Box::new(ScriptedSource::from_samples(vec![
                Sample::present(letter('X'), 0.3),
                Sample::present(letter('Y'), 0.3),
            ])),
        );

        assert_eq!(detector.tick(secs(0.0)), Some(letter('X')));
        assert_eq!(detector.tick(secs(0.2)), None);
        assert_eq!(detector.tick(secs(0.5)), Some(letter('Y')));
    }

    #[test]
    fn test_reset_returns_to_initial_state() {
        let mut detector = detector_with(vec![Sample::present(letter('A'), 0.9)]);
        assert!(detector.tick(secs(1.0)).is_some());
        detector.reset();
        assert_eq!(detector.state(), DetectorState::default());
        assert_eq!(detector.phase(secs(1.1)), DetectorPhase::Idle);
    }

    #[test]
    fn test_state_constructor_clamps() {
        assert_eq!(DetectorState::new(3.0, None).stability(), 1.0);
        assert_eq!(DetectorState::new(-1.0, None).stability(), 0.0);
        assert_eq!(DetectorState::new(f64::NAN, None).stability(), 0.0);
    }

    #[test]
    fn test_config_validation() {
        assert!(DetectorConfig::default().validate().is_ok());

        let mut config = DetectorConfig::default();
        config.acceptance_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = DetectorConfig::default();
        config.refractory_secs = -1.0;
        assert!(config.validate().is_err());

        let mut config = DetectorConfig::default();
        config.decay_step = f64::NAN;
        assert!(config.validate().is_err());
    }
}
