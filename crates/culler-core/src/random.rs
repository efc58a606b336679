//! Injectable randomness.
//!
//! The scheduler and the orchestrator never reach for a global generator;
//! they take a `RandomSource` so tests can script the draws.

use std::collections::VecDeque;

use rand::Rng;
use rand::rngs::{StdRng, ThreadRng};

pub trait RandomSource {
    /// Uniform sample on `[0, 1)`.
    fn sample_unit(&mut self) -> f64;

    /// Uniform integer on `[0, bound)`. `bound` must be positive.
    fn sample_below(&mut self, bound: usize) -> usize;
}

impl RandomSource for StdRng {
    fn sample_unit(&mut self) -> f64 {
        self.r#gen::<f64>()
    }

    fn sample_below(&mut self, bound: usize) -> usize {
        self.gen_range(0..bound)
    }
}

impl RandomSource for ThreadRng {
    fn sample_unit(&mut self) -> f64 {
        self.r#gen::<f64>()
    }

    fn sample_below(&mut self, bound: usize) -> usize {
        self.gen_range(0..bound)
    }
}

/// Replays fixed values in order.
///
/// Unit samples and integer samples are queued separately. Once a queue is
/// drained it keeps returning its last value (or 0 if it was never filled).
/// Integer samples are clamped into `[0, bound)`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    units: VecDeque<f64>,
    ints: VecDeque<usize>,
    last_unit: f64,
    last_int: usize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_units(mut self, units: impl IntoIterator<Item = f64>) -> Self {
        self.units.extend(units);
        self
    }

    pub fn with_ints(mut self, ints: impl IntoIterator<Item = usize>) -> Self {
        self.ints.extend(ints);
        self
    }

    /// A source that always returns the same unit sample.
    pub fn constant(unit: f64) -> Self {
        Self {
            last_unit: unit,
            ..Self::default()
        }
    }
}

impl RandomSource for ScriptedSource {
    fn sample_unit(&mut self) -> f64 {
        if let Some(v) = self.units.pop_front() {
            self.last_unit = v;
        }
        self.last_unit
    }

    fn sample_below(&mut self, bound: usize) -> usize {
        if let Some(v) = self.ints.pop_front() {
            self.last_int = v;
        }
        self.last_int.min(bound.saturating_sub(1))
    }
}
