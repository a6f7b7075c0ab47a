//! Wheel encoder: position, velocity and fitted acceleration
//!
//! ## Overview
//!
//! The wheel reports delta counts per sample. Position is the running sum of
//! deltas, velocity is the delta scaled by the sample rate:
//!
//! ```text
//! r = position / countsPerMeter
//! v = delta * samplesPerSecond / countsPerMeter
//! ```
//!
//! Acceleration is not the second difference of position, which is far too
//! noisy at encoder resolution. It is the slope of an ordinary least-squares
//! line through velocity against time over a window around each sample.
//!
//! ## Windows
//!
//! With `k = max(5, nAverage / 2)` points each side:
//!
//! ```text
//! recalibration:  [i - k, i + k]   clamped to history
//! live append:    [i - 2k, i]      no future samples exist yet
//! ```
//!
//! The live window is replaced by the centered one on the next full
//! recalibration. A live fit needs at least three points; until then the
//! sample keeps its naive `delta-of-delta * sps^2` value.

use crate::decode::{components, Components};

/// Encoder counts per meter of travel
pub const DEFAULT_COUNTS_PER_METER: f64 = 1000.0;
/// Counts per meter of early wheels
pub const LEGACY_COUNTS_PER_METER: f64 = 926.0;
/// Remotes with a hardware ID below this carry the early wheel
pub const LEGACY_HARDWARE_ID_LIMIT: u32 = 0x150;
/// Fewest points fitted on each side of a sample
pub const MIN_POINTS_EACH_SIDE: usize = 5;

/// Slope of the least-squares line through `(x, y)` points
///
/// Returns 0 when fewer than two points are given or all `x` coincide.
pub fn ols_slope<I>(points: I) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let mut count = 0.0;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xx = 0.0;
    let mut sum_xy = 0.0;

    for (x, y) in points {
        count += 1.0;
        sum_x += x;
        sum_y += y;
        sum_xx += x * x;
        sum_xy += x * y;
    }

    if count < 2.0 {
        return 0.0;
    }

    let ss_x = sum_xx - sum_x * sum_x / count;
    let s_co = sum_xy - sum_x * sum_y / count;
    if ss_x == 0.0 {
        return 0.0;
    }
    s_co / ss_x
}

/// Derived-quantity estimator for the wheel encoder
#[derive(Debug, Clone, PartialEq)]
pub struct WheelEstimator {
    counts_per_meter: f64,
    min_points_each_side: usize,
}

impl Default for WheelEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTS_PER_METER)
    }
}

impl WheelEstimator {
    /// Estimator with an explicit encoder resolution
    pub fn new(counts_per_meter: f64) -> Self {
        Self {
            counts_per_meter,
            min_points_each_side: MIN_POINTS_EACH_SIDE,
        }
    }

    /// Estimator for the wheel fitted to remote `hardware_id`
    pub fn for_hardware(hardware_id: u32) -> Self {
        if hardware_id != 0 && hardware_id < LEGACY_HARDWARE_ID_LIMIT {
            log_info!(
                "remote 0x{:x} is below 0x{:x}: wheel calibration set to {} counts/meter",
                hardware_id,
                LEGACY_HARDWARE_ID_LIMIT,
                LEGACY_COUNTS_PER_METER
            );
            Self::new(LEGACY_COUNTS_PER_METER)
        } else {
            Self::default()
        }
    }

    /// Encoder counts per meter
    pub fn counts_per_meter(&self) -> f64 {
        self.counts_per_meter
    }

    /// Points fitted each side of a sample for averaging window `n_average`
    pub fn points_each_side(&self, n_average: usize) -> usize {
        self.min_points_each_side.max(n_average / 2)
    }

    /// Trailing window `[last - 2k, last]` used while streaming
    ///
    /// `None` when fewer than three points are available.
    pub fn live_window(&self, last: usize, n_average: usize) -> Option<(usize, usize)> {
        let k = self.points_each_side(n_average);
        let first = last.saturating_sub(2 * k);
        (last - first > 1).then_some((first, last))
    }

    /// Centered window `[i - k, i + k]` clamped to `len` samples
    pub fn centered_window(&self, i: usize, len: usize, n_average: usize) -> (usize, usize) {
        let k = self.points_each_side(n_average);
        let last = (i + k).min(len.saturating_sub(1));
        (i.saturating_sub(k), last)
    }

    /// Velocity in m/s for a delta count
    pub fn velocity(&self, delta: f64, samples_per_second: f64) -> f64 {
        delta * samples_per_second / self.counts_per_meter
    }

    /// Calibrated `(r, v, a)` from raw `(position, delta, delta-of-delta)`
    ///
    /// The acceleration is the naive estimate; callers replace it with a
    /// fitted slope whenever a window is available.
    pub fn calibrate(&self, raw: &Components, samples_per_second: f64) -> Components {
        let position = raw.first().copied().unwrap_or(0.0);
        let delta = raw.get(1).copied().unwrap_or(0.0);
        let dv = raw.get(2).copied().unwrap_or(0.0);
        components([
            position / self.counts_per_meter,
            self.velocity(delta, samples_per_second),
            dv * samples_per_second * samples_per_second,
        ])
    }

    /// Fitted acceleration from `(sample index, delta count)` pairs
    ///
    /// Time for index `i` is `i / sps - timing_shift`, matching the sample
    /// time stamps, so the slope is in m/s².
    pub fn fit_acceleration<I>(&self, deltas: I, samples_per_second: f64, timing_shift: f64) -> f64
    where
        I: IntoIterator<Item = (usize, f64)>,
    {
        ols_slope(deltas.into_iter().map(|(i, delta)| {
            (
                i as f64 / samples_per_second - timing_shift,
                self.velocity(delta, samples_per_second),
            )
        }))
    }
}
