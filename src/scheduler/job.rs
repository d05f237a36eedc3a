use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::config::DurationConfig;

/// One synthetic job handed to a dispatch policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Job {
    /// Sequence number within the run.
    pub index: usize,
    /// Simulated service time of each of its tasks.
    pub duration_ms: u64,
    pub task_count: usize,
}

impl Job {
    pub fn new(index: usize, duration_ms: u64, task_count: usize) -> Self {
        Self {
            index,
            duration_ms,
            task_count,
        }
    }
}

/// Source of job durations.
pub trait DurationDistribution: Send {
    fn next_duration(&mut self) -> u64;
}

/// Light/heavy mix: `heavy_ms` with probability `heavy_ratio`, else `light_ms`.
#[derive(Debug, Clone)]
pub struct Bimodal {
    light_ms: u64,
    heavy_ms: u64,
    heavy_ratio: f64,
    rng: StdRng,
}

impl Bimodal {
    pub fn new(config: &DurationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            light_ms: config.light_ms,
            heavy_ms: config.heavy_ms,
            heavy_ratio: if config.heavy_ratio.is_nan() {
                0.0
            } else {
                config.heavy_ratio.clamp(0.0, 1.0)
            },
            rng,
        }
    }
}

impl DurationDistribution for Bimodal {
    fn next_duration(&mut self) -> u64 {
        if self.rng.gen_bool(self.heavy_ratio) {
            self.heavy_ms
        } else {
            self.light_ms
        }
    }
}

/// Replays a fixed list of durations, wrapping around at the end.
#[derive(Debug, Clone)]
pub struct FixedSequence {
    durations: Vec<u64>,
    next: usize,
}

impl FixedSequence {
    /// An empty list yields 0 forever.
    pub fn new(durations: Vec<u64>) -> Self {
        Self { durations, next: 0 }
    }
}

impl DurationDistribution for FixedSequence {
    fn next_duration(&mut self) -> u64 {
        if self.durations.is_empty() {
            return 0;
        }
        let d = self.durations[self.next % self.durations.len()];
        self.next += 1;
        d
    }
}
