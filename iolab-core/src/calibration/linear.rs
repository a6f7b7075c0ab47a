//! Linear per-axis calibration
//!
//! `cal = (raw - midpoint - countsOffset) / countsPerUnit`
//!
//! Most sensors use a midpoint of 0 and carry any bias in the offset. The
//! force probe keeps its offset relative to the ADC midpoint `0x7FF`, which
//! is how its calibration file stores it.

use heapless::Vec as HVec;

use crate::decode::Components;
use crate::sensor::{SensorKind, MAX_AXES};

/// ADC midpoint of the 12-bit analog inputs (Vcc / 2)
pub const NOMINAL_MIDPOINT: f64 = 2047.0;

/// Scale and offset of one axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisCalibration {
    /// Raw counts per physical unit
    pub counts_per_unit: f64,
    /// Raw counts at zero input (after the midpoint)
    pub counts_offset: f64,
}

impl AxisCalibration {
    /// Axis with the given scale and offset
    pub const fn new(counts_per_unit: f64, counts_offset: f64) -> Self {
        Self {
            counts_per_unit,
            counts_offset,
        }
    }
}

/// Scale/offset for each axis of a sensor
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    axes: HVec<AxisCalibration, MAX_AXES>,
    midpoint: f64,
}

impl LinearModel {
    /// Model over `axes` (extra axes beyond three are ignored)
    pub fn new(axes: &[AxisCalibration], midpoint: f64) -> Self {
        let mut out = HVec::new();
        for axis in axes.iter().take(MAX_AXES) {
            let _ = out.push(*axis);
        }
        Self {
            axes: out,
            midpoint,
        }
    }

    /// Built-in constants for `kind`, if it calibrates linearly
    pub fn defaults(kind: SensorKind) -> Option<Self> {
        use AxisCalibration as A;
        let model = match kind {
            SensorKind::Accelerometer => Self::new(
                &[A::new(8206.0, 38.0), A::new(8116.0, 0.0), A::new(8162.0, -53.0)],
                0.0,
            ),
            SensorKind::Magnetometer => Self::new(
                &[A::new(573.0, -569.0), A::new(591.0, -388.0), A::new(558.0, -1283.0)],
                0.0,
            ),
            // 2000 dps full scale = 34.91 rad/s at 0x7FFF
            SensorKind::Gyroscope => Self::new(
                &[A::new(938.7, -20.0), A::new(938.7, 230.0), A::new(938.7, -80.0)],
                0.0,
            ),
            SensorKind::Force => Self::new(&[A::new(-120.0, 0.0)], NOMINAL_MIDPOINT),
            SensorKind::Light | SensorKind::Microphone => Self::new(&[A::new(500.0, 0.0)], 0.0),
            SensorKind::Battery => Self::new(&[A::new(682.5, 0.0)], 0.0),
            // full-scale counts * gain / mV full scale, referenced to Vcc/2
            SensorKind::HighGain => Self::new(&[A::new(1911.0, NOMINAL_MIDPOINT)], 0.0),
            SensorKind::Ecg => Self::new(&[A::new(477.0, NOMINAL_MIDPOINT); 3], 0.0),
            SensorKind::Analog7 | SensorKind::Analog8 | SensorKind::Analog9 => {
                Self::new(&[A::new(1365.0, 0.0)], 0.0)
            }
            _ => return None,
        };
        Some(model)
    }

    /// Per-axis constants
    pub fn axes(&self) -> &[AxisCalibration] {
        &self.axes
    }

    /// Per-axis constants, mutable
    pub fn axes_mut(&mut self) -> &mut [AxisCalibration] {
        &mut self.axes
    }

    /// Counts subtracted before the offset
    pub fn midpoint(&self) -> f64 {
        self.midpoint
    }

    /// Physical values for raw counts
    pub fn calibrate(&self, raw: &Components) -> Components {
        raw.iter()
            .zip(self.axes.iter())
            .map(|(&r, a)| (r - self.midpoint - a.counts_offset) / a.counts_per_unit)
            .collect()
    }

    /// Raw counts that calibrate to `values` (before integer rounding)
    pub fn raw_for(&self, values: &[f64]) -> Components {
        values
            .iter()
            .zip(self.axes.iter())
            .map(|(&v, a)| v * a.counts_per_unit + a.counts_offset + self.midpoint)
            .collect()
    }

    /// Constants in calibration-file order: scale, offset per axis
    pub fn file_constants(&self) -> Vec<f64> {
        self.axes
            .iter()
            .flat_map(|a| [a.counts_per_unit, a.counts_offset])
            .collect()
    }

    /// Load constants in calibration-file order
    ///
    /// Pairs beyond the model's axis count are ignored.
    pub fn load_file_constants(&mut self, constants: &[f64]) {
        for (axis, pair) in self.axes.iter_mut().zip(constants.chunks_exact(2)) {
            axis.counts_per_unit = pair[0];
            axis.counts_offset = pair[1];
        }
    }

    /// Load only the offsets from calibration-file order constants
    pub fn load_file_offsets(&mut self, constants: &[f64]) {
        for (axis, pair) in self.axes.iter_mut().zip(constants.chunks_exact(2)) {
            axis.counts_offset = pair[1];
        }
    }
}
