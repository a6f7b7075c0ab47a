//! Running mean and standard deviation
//!
//! [`StatAccumulator`] folds values in one at a time using Welford's update,
//! so windows of any length are summarised in a single pass without keeping
//! the values around.
//!
//! The standard deviation is the sample standard deviation (divisor `n - 1`)
//! and is reported as 0 while fewer than two values have been added.

/// Fewest values for which a spread is reported
pub const MIN_SIGMA_SAMPLES: usize = 2;

/// Incremental mean/variance over an arbitrary subset of samples
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatAccumulator {
    count: usize,
    mean: f64,
    m2: f64,
}

impl StatAccumulator {
    /// Empty accumulator
    pub const fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
        }
    }

    /// Fold in one value
    pub fn add(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    /// Number of values folded in
    pub fn count(&self) -> usize {
        self.count
    }

    /// Mean of the values, 0 when empty
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample standard deviation, 0 below two values
    pub fn sigma(&self) -> f64 {
        if self.count < MIN_SIGMA_SAMPLES {
            return 0.0;
        }
        (self.m2 / (self.count - 1) as f64).max(0.0).sqrt()
    }

    /// Forget everything
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

impl Extend<f64> for StatAccumulator {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for value in iter {
            self.add(value);
        }
    }
}

impl FromIterator<f64> for StatAccumulator {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut acc = Self::new();
        acc.extend(iter);
        acc
    }
}
