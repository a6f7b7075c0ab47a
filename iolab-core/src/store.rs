//! Sample History and Windowed Statistics
//!
//! ## Overview
//!
//! A [`SampleStore`] is the ordered history of one channel. Every entry pairs
//! a raw sample with its calibrated values, its time stamp and the windowed
//! average shown on the live display, so raw and calibrated counts can never
//! diverge.
//!
//! ## TimeAverage
//!
//! [`SampleStore::time_average`] summarises a window that ends at an anchor:
//!
//! ```text
//! anchor = last      if anchor == 0 or anchor > last
//! n < 2              -> the anchor sample itself, sigma 0, count 1
//! anchor <= 1        -> zeroed stats (not enough history)
//! anchor < last      -> anchor = min(last, anchor + n / 2)
//! first = max(0, anchor - n)
//! stats over [first, anchor] inclusive
//! ```
//!
//! While streaming the anchor is always the newest sample, so the window
//! trails it. During recalibration the anchor is a historical index and the
//! `n / 2` extension centers the window on it. Anchor 0 always means "the
//! newest sample", including during recalibration.
//!
//! ## Memory Layout
//!
//! ```text
//! SampleStore
//! ┌────────┬────────┬────────┬─────┐
//! │ Sample │ Sample │ Sample │ ... │  Vec<Sample>, index = sample index
//! └────────┴────────┴────────┴─────┘
//! Sample = raw: [f64; ≤3] | cal: [f64; ≤3] | ave: [f64; ≤3] | time: f64
//! ```
//!
//! A recalibration pass builds a complete replacement history and swaps it in
//! with [`SampleStore::replace_all`]; no entry is ever rewritten in place.

use crate::decode::Components;
use crate::sensor::MAX_AXES;
use crate::stats::StatAccumulator;

/// One entry of channel history
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Decoded raw components
    pub raw: Components,
    /// Calibrated components
    pub cal: Components,
    /// Windowed average of the calibrated components
    pub ave: Components,
    /// Seconds since the start of the run
    pub time: f64,
}

/// Which values [`SampleStore::time_average`] should summarise
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selector {
    /// Include raw values
    pub raw: bool,
    /// Include calibrated values
    pub cal: bool,
    /// Bit `i` set = include axis `i`
    pub axes: u8,
}

const ALL_AXES: u8 = (1 << MAX_AXES) - 1;

impl Selector {
    /// Raw values of every axis
    pub const fn raw() -> Self {
        Self {
            raw: true,
            cal: false,
            axes: ALL_AXES,
        }
    }

    /// Calibrated values of every axis
    pub const fn cal() -> Self {
        Self {
            raw: false,
            cal: true,
            axes: ALL_AXES,
        }
    }

    /// Raw and calibrated values of every axis
    pub const fn raw_cal() -> Self {
        Self {
            raw: true,
            cal: true,
            axes: ALL_AXES,
        }
    }

    /// Restrict to a single axis
    pub const fn only_axis(mut self, axis: usize) -> Self {
        self.axes = if axis < MAX_AXES { 1 << axis } else { 0 };
        self
    }

    /// True if `axis` is selected
    pub const fn wants_axis(&self, axis: usize) -> bool {
        axis < MAX_AXES && self.axes & (1 << axis) != 0
    }
}

/// Mean and spread of one axis
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AxisStats {
    /// Mean over the window
    pub mean: f64,
    /// Sample standard deviation, 0 below two samples
    pub sigma: f64,
}

impl From<&StatAccumulator> for AxisStats {
    fn from(acc: &StatAccumulator) -> Self {
        Self {
            mean: acc.mean(),
            sigma: acc.sigma(),
        }
    }
}

/// Result of a windowed average
///
/// Unselected or absent axes stay at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WindowStats {
    /// Per-axis raw statistics
    pub raw: [AxisStats; MAX_AXES],
    /// Per-axis calibrated statistics
    pub cal: [AxisStats; MAX_AXES],
    /// Samples in the window
    pub count: usize,
}

impl WindowStats {
    /// Calibrated means of the first `axes` axes
    pub fn cal_means(&self, axes: usize) -> Components {
        self.cal.iter().take(axes).map(|s| s.mean).collect()
    }

    /// Raw means of the first `axes` axes
    pub fn raw_means(&self, axes: usize) -> Components {
        self.raw.iter().take(axes).map(|s| s.mean).collect()
    }
}

/// Ordered history of one channel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleStore {
    samples: Vec<Sample>,
}

impl SampleStore {
    /// Empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample at the end
    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    /// Sample at `index`
    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    /// Mutable sample at `index`
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Sample> {
        self.samples.get_mut(index)
    }

    /// Newest sample
    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    /// Number of samples held
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when no sample is held
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples in index order
    pub fn iter(&self) -> core::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    /// Samples as a slice
    pub fn as_slice(&self) -> &[Sample] {
        &self.samples
    }

    /// Drop every sample
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Swap in a rebuilt history
    pub fn replace_all(&mut self, samples: Vec<Sample>) {
        self.samples = samples;
    }

    /// Windowed mean/sigma ending at `anchor`
    ///
    /// Never reads outside `[0, len - 1]`. An empty store, or an anchor with
    /// fewer than two samples before it, yields zeroed stats.
    pub fn time_average(&self, n: usize, selector: Selector, anchor: usize) -> WindowStats {
        window_stats(&self.samples, n, selector, anchor)
    }
}

/// [`SampleStore::time_average`] over any sample slice
pub fn window_stats(samples: &[Sample], n: usize, selector: Selector, anchor: usize) -> WindowStats {
    let mut out = WindowStats::default();
    let Some(last) = samples.len().checked_sub(1) else {
        return out;
    };

    let mut anchor = if anchor == 0 || anchor > last {
        last
    } else {
        anchor
    };

    if n < 2 {
        let sample = &samples[anchor];
        for axis in 0..MAX_AXES {
            if !selector.wants_axis(axis) {
                continue;
            }
            if selector.raw {
                if let Some(&value) = sample.raw.get(axis) {
                    out.raw[axis].mean = value;
                }
            }
            if selector.cal {
                if let Some(&value) = sample.cal.get(axis) {
                    out.cal[axis].mean = value;
                }
            }
        }
        out.count = 1;
        return out;
    }

    if anchor <= 1 {
        return out;
    }

    if anchor < last {
        anchor = last.min(anchor + n / 2);
    }
    let first = anchor.saturating_sub(n);
    let window = &samples[first..=anchor];

    let mut raw = [StatAccumulator::new(); MAX_AXES];
    let mut cal = [StatAccumulator::new(); MAX_AXES];
    for sample in window {
        for axis in 0..MAX_AXES {
            if !selector.wants_axis(axis) {
                continue;
            }
            if selector.raw {
                if let Some(&value) = sample.raw.get(axis) {
                    raw[axis].add(value);
                }
            }
            if selector.cal {
                if let Some(&value) = sample.cal.get(axis) {
                    cal[axis].add(value);
                }
            }
        }
    }

    for axis in 0..MAX_AXES {
        out.raw[axis] = AxisStats::from(&raw[axis]);
        out.cal[axis] = AxisStats::from(&cal[axis]);
    }
    out.count = window.len();
    out
}
