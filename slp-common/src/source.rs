//! Gesture sources
//!
//! A [`GestureSource`] answers one question per polling tick: is a
//! recognizable gesture in frame, and if so which symbol and how much
//! confidence does this observation add. The detector only sees samples, so
//! a simulator and a real classifier are interchangeable.
//!
//! - [`RandomGestureSource`]: Bernoulli presence, uniform increment, uniform
//!   symbol choice over an alphabet
//! - [`ScriptedSource`]: replays a fixed list of samples (tests, replays)

use crate::config::SimulationConfig;
use crate::symbol::{Alphabet, GestureSymbol};
use crate::{Error, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::ops::RangeInclusive;

/// One observation from a gesture source
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    /// Nothing recognizable in frame
    Absent,
    /// A gesture is in frame
    Present {
        /// Best guess for the symbol being signed
        symbol: GestureSymbol,
        /// Confidence added to the stability accumulator
        increment: f64,
    },
}

impl Sample {
    pub fn present(symbol: GestureSymbol, increment: f64) -> Self {
        Sample::Present { symbol, increment }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Sample::Present { .. })
    }
}

/// Capability polled by the detector once per tick
///
/// Implementations may fail (camera gone, classifier timeout). The detector
/// treats any error as [`Sample::Absent`] for that tick.
pub trait GestureSource: Send {
    fn sample(&mut self) -> Result<Sample>;
}

impl<S: GestureSource + ?Sized> GestureSource for Box<S> {
    fn sample(&mut self) -> Result<Sample> {
        (**self).sample()
    }
}

/// Simulated classifier drawing from a seeded or entropy-backed RNG
#[derive(Debug)]
pub struct RandomGestureSource<R: Rng = StdRng> {
    presence_probability: f64,
    increment: RangeInclusive<f64>,
    alphabet: Alphabet,
    rng: R,
}

impl RandomGestureSource<StdRng> {
    /// Build from simulation settings; uses the configured seed if any
    pub fn from_config(config: &SimulationConfig) -> Result<Self> {
        let alphabet = config.alphabet.resolve()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(
            config.presence_probability,
            config.increment_min..=config.increment_max,
            alphabet,
            rng,
        )
    }

    /// Deterministic source for replays and tests
    pub fn seeded(
        presence_probability: f64,
        increment: RangeInclusive<f64>,
        alphabet: Alphabet,
        seed: u64,
    ) -> Result<Self> {
        Self::with_rng(
            presence_probability,
            increment,
            alphabet,
            StdRng::seed_from_u64(seed),
        )
    }
}

impl<R: Rng> RandomGestureSource<R> {
    pub fn with_rng(
        presence_probability: f64,
        increment: RangeInclusive<f64>,
        alphabet: Alphabet,
        rng: R,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&presence_probability) {
            return Err(Error::Config(format!(
                "presence_probability must be within [0, 1], got {}",
                presence_probability
            )));
        }

        let (lo, hi) = (*increment.start(), *increment.end());
        if !(0.0..=1.0).contains(&lo) || !(0.0..=1.0).contains(&hi) || lo > hi {
            return Err(Error::Config(format!(
                "increment range must satisfy 0 <= min <= max <= 1, got [{}, {}]",
                lo, hi
            )));
        }

        Ok(Self {
            presence_probability,
            increment,
            alphabet,
            rng,
        })
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }
}

impl<R: Rng + Send> GestureSource for RandomGestureSource<R> {
    fn sample(&mut self) -> Result<Sample> {
        if !self.rng.gen_bool(self.presence_probability) {
            return Ok(Sample::Absent);
        }

        let symbol = self.alphabet.choose(&mut self.rng);
        let increment = self.rng.gen_range(self.increment.clone());
        Ok(Sample::Present { symbol, increment })
    }
}

/// Replays queued samples, then reports `Absent` forever
#[derive(Debug, Default)]
pub struct ScriptedSource {
    queue: VecDeque<Result<Sample>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_samples<I: IntoIterator<Item = Sample>>(samples: I) -> Self {
        Self {
            queue: samples.into_iter().map(Ok).collect(),
        }
    }

    pub fn push(&mut self, sample: Sample) -> &mut Self {
        self.queue.push_back(Ok(sample));
        self
    }

    /// Queue a failed observation
    pub fn push_error(&mut self, message: &str) -> &mut Self {
        self.queue.push_back(Err(Error::Source(message.into())));
        self
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl GestureSource for ScriptedSource {
    fn sample(&mut self) -> Result<Sample> {
        self.queue.pop_front().unwrap_or(Ok(Sample::Absent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_source_replays_then_absent() {
        let mut source = ScriptedSource::from_samples(vec![
            Sample::present(GestureSymbol::Letter('A'), 0.3),
            Sample::Absent,
        ]);
        source.push_error("camera unplugged");

        assert!(source.sample().unwrap().is_present());
        assert_eq!(source.sample().unwrap(), Sample::Absent);
        assert!(matches!(source.sample(), Err(Error::Source(_))));
        assert_eq!(source.remaining(), 0);
        assert_eq!(source.sample().unwrap(), Sample::Absent);
    }

    #[test]
    fn test_random_source_respects_bounds() {
        let alphabet = Alphabet::from_labels(&["A", "B", "SPACE"]).unwrap();
        let mut source = RandomGestureSource::seeded(0.4, 0.2..=0.4, alphabet.clone(), 42).unwrap();

        let mut present = 0;
        for _ in 0..2000 {
            if let Sample::Present { symbol, increment } = source.sample().unwrap() {
                present += 1;
                assert!(alphabet.contains(&symbol));
                assert!((0.2..=0.4).contains(&increment));
            }
        }

        // 40% presence over 2000 draws, generous tolerance
        assert!(present > 600 && present < 1000, "present = {}", present);
    }

    #[test]
    fn test_random_source_is_deterministic_with_seed() {
        let make = || RandomGestureSource::seeded(0.5, 0.2..=0.4, Alphabet::standard(), 9).unwrap();
        let (mut a, mut b) = (make(), make());
        for _ in 0..50 {
            assert_eq!(a.sample().unwrap(), b.sample().unwrap());
        }
    }

    #[test]
    fn test_random_source_never_present_at_zero_probability() {
        let mut source =
            RandomGestureSource::seeded(0.0, 0.2..=0.4, Alphabet::standard(), 1).unwrap();
        for _ in 0..100 {
            assert_eq!(source.sample().unwrap(), Sample::Absent);
        }
    }

    #[test]
    fn test_random_source_rejects_bad_parameters() {
        let seeded = |probability, increments| {
            RandomGestureSource::seeded(probability, increments, Alphabet::standard(), 1)
        };
        assert!(seeded(1.5, 0.2..=0.4).is_err());
        assert!(seeded(0.4, 0.5..=0.2).is_err());
        assert!(seeded(0.4, -0.1..=0.2).is_err());
    }
}
