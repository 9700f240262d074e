// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Produces the value shared by every reading of one tick.
pub trait ValueSource: Send {
    fn next_value(&mut self) -> f64;
}

impl<F> ValueSource for F
where
    F: FnMut() -> f64 + Send,
{
    fn next_value(&mut self) -> f64 {
        self()
    }
}

/// Uniformly distributed values in `[0, max)`.
#[derive(Debug, Clone)]
pub struct RandomValues {
    rng: StdRng,
    max: f64,
}

impl RandomValues {
    pub fn new(max: f64) -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            max,
        }
    }

    /// Reproducible sequence for a given seed.
    pub fn seeded(seed: u64, max: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            max,
        }
    }
}

impl ValueSource for RandomValues {
    fn next_value(&mut self) -> f64 {
        self.rng.random::<f64>() * self.max
    }
}
