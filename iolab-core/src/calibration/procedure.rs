//! Deriving calibration constants from a calibration procedure
//!
//! ## Orientation Procedure
//!
//! The remote is held still in six orientations (x-up, x-down, y-up, y-down,
//! z-up, z-down) and the mean raw vector over the last 200 samples is
//! recorded for each. For an axis pointing up then down:
//!
//! ```text
//! scale  = (m[up] - m[down]) / 2
//! offset = (m[up] + m[down]) / 2
//! ```
//!
//! - **Accelerometer**: each axis from its own orientation pair.
//! - **Magnetometer**: the same pair formula with the scale negated (the
//!   vertical field points down), then every scale is multiplied by
//!   `|B| / B_z` measured in the z-up orientation. The procedure only sees
//!   the vertical field component, so the scales are normalized to it.
//! - **Gyroscope**: the remote is at rest in every orientation, so the
//!   offset is the mean of all six readings. The scale stays fixed.
//!
//! ## Force Procedure
//!
//! Two readings: unloaded (`f0`) and with the 2 N calibration load (`f1`).
//!
//! ```text
//! offset = f0 - 0x7FF
//! scale  = (f0 - f1) / 2 N
//! ```

use crate::calibration::linear::{AxisCalibration, NOMINAL_MIDPOINT};
use crate::errors::{IolabError, IolabResult};
use crate::sensor::SensorKind;

/// Samples averaged for each procedure reading
pub const PROCEDURE_AVERAGE: usize = 200;

/// Load applied during the force procedure (N)
pub const FORCE_CALIBRATION_NEWTONS: f64 = 2.0;

/// Mean raw (x, y, z) reading
pub type Reading = [f64; 3];

/// Physical orientation during a procedure reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// +x pointing up
    XUp,
    /// +x pointing down
    XDown,
    /// +y pointing up
    YUp,
    /// +y pointing down
    YDown,
    /// +z pointing up
    ZUp,
    /// +z pointing down
    ZDown,
}

impl Orientation {
    /// Procedure order
    pub const ALL: [Orientation; 6] = [
        Orientation::XUp,
        Orientation::XDown,
        Orientation::YUp,
        Orientation::YDown,
        Orientation::ZUp,
        Orientation::ZDown,
    ];

    /// Position in procedure order
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Readings collected so far in an orientation procedure
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrientationReadings {
    readings: [Option<Reading>; 6],
}

impl OrientationReadings {
    /// No readings yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or re-record) the reading for one orientation
    pub fn record(&mut self, orientation: Orientation, reading: Reading) {
        self.readings[orientation.index()] = Some(reading);
    }

    /// Reading for one orientation, if recorded
    pub fn get(&self, orientation: Orientation) -> Option<Reading> {
        self.readings[orientation.index()]
    }

    /// Number of orientations recorded
    pub fn recorded(&self) -> usize {
        self.readings.iter().filter(|r| r.is_some()).count()
    }

    /// All six readings, or an error naming how many are missing
    pub fn complete(&self) -> IolabResult<[Reading; 6]> {
        let mut out = [[0.0; 3]; 6];
        for (slot, reading) in out.iter_mut().zip(self.readings.iter()) {
            *slot = reading.ok_or(IolabError::InsufficientHistory {
                required: Orientation::ALL.len(),
                available: self.recorded(),
            })?;
        }
        Ok(out)
    }
}

/// Unloaded and loaded force probe readings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceReadings {
    /// Mean raw count with no load
    pub unloaded: f64,
    /// Mean raw count with the calibration load
    pub loaded: f64,
}

/// Measurements gathered by a calibration procedure
#[derive(Debug, Clone, PartialEq)]
pub enum Measurements {
    /// Six-orientation readings for accelerometer, magnetometer, gyroscope
    Orientations(OrientationReadings),
    /// Two-point force readings
    Force(ForceReadings),
}

fn pair(m: &[Reading; 6], up: Orientation, down: Orientation, axis: usize) -> (f64, f64) {
    (m[up.index()][axis], m[down.index()][axis])
}

const AXIS_PAIRS: [(Orientation, Orientation); 3] = [
    (Orientation::XUp, Orientation::XDown),
    (Orientation::YUp, Orientation::YDown),
    (Orientation::ZUp, Orientation::ZDown),
];

fn check_scales(sensor: SensorKind, axes: &[AxisCalibration]) -> IolabResult<()> {
    if axes
        .iter()
        .any(|a| a.counts_per_unit == 0.0 || !a.counts_per_unit.is_finite())
    {
        return Err(IolabError::DegenerateCalibration {
            sensor,
            reason: "up and down readings coincide",
        });
    }
    Ok(())
}

/// Accelerometer scale/offset per axis
pub fn accelerometer_axes(m: &[Reading; 6]) -> IolabResult<[AxisCalibration; 3]> {
    let axes = core::array::from_fn(|axis| {
        let (up, down) = pair(m, AXIS_PAIRS[axis].0, AXIS_PAIRS[axis].1, axis);
        AxisCalibration::new((up - down) / 2.0, (up + down) / 2.0)
    });
    check_scales(SensorKind::Accelerometer, &axes)?;
    Ok(axes)
}

/// Magnetometer scale/offset per axis, normalized to the total field
pub fn magnetometer_axes(m: &[Reading; 6]) -> IolabResult<[AxisCalibration; 3]> {
    let mut axes: [AxisCalibration; 3] = core::array::from_fn(|axis| {
        let (up, down) = pair(m, AXIS_PAIRS[axis].0, AXIS_PAIRS[axis].1, axis);
        AxisCalibration::new(-(up - down) / 2.0, (up + down) / 2.0)
    });
    check_scales(SensorKind::Magnetometer, &axes)?;

    let reference = m[Orientation::ZUp.index()];
    let b: [f64; 3] = core::array::from_fn(|axis| {
        (reference[axis] - axes[axis].counts_offset).abs() / axes[axis].counts_per_unit
    });
    let ratio = (b[0] * b[0] + b[1] * b[1] + b[2] * b[2]).sqrt() / b[2];
    if !ratio.is_finite() || ratio == 0.0 {
        return Err(IolabError::DegenerateCalibration {
            sensor: SensorKind::Magnetometer,
            reason: "no vertical field in the z-up reading",
        });
    }

    for axis in &mut axes {
        axis.counts_per_unit *= ratio;
    }
    Ok(axes)
}

/// Gyroscope offsets from six at-rest readings; scales kept from `current`
pub fn gyroscope_axes(m: &[Reading; 6], current: &[AxisCalibration]) -> [AxisCalibration; 3] {
    core::array::from_fn(|axis| {
        let offset = m.iter().map(|r| r[axis]).sum::<f64>() / m.len() as f64;
        let scale = current
            .get(axis)
            .map(|a| a.counts_per_unit)
            .unwrap_or(1.0);
        AxisCalibration::new(scale, offset)
    })
}

/// Force probe scale/offset from the two-point procedure
pub fn force_axis(readings: ForceReadings) -> IolabResult<AxisCalibration> {
    let scale = (readings.unloaded - readings.loaded) / FORCE_CALIBRATION_NEWTONS;
    let axis = AxisCalibration::new(scale, readings.unloaded - NOMINAL_MIDPOINT);
    check_scales(SensorKind::Force, &[axis])?;
    Ok(axis)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn readings(values: [Reading; 6]) -> [Reading; 6] {
        values
    }

    #[test]
    fn accelerometer_uses_each_axis_pair() {
        let m = readings([
            [8244.0, 5.0, 7.0],
            [-8168.0, 9.0, 3.0],
            [1.0, 8116.0, 2.0],
            [4.0, -8116.0, 6.0],
            [0.0, 0.0, 8109.0],
            [0.0, 0.0, -8215.0],
        ]);
        let axes = accelerometer_axes(&m).unwrap();
        assert_eq!(axes[0], AxisCalibration::new(8206.0, 38.0));
        assert_eq!(axes[1], AxisCalibration::new(8116.0, 0.0));
        assert_eq!(axes[2], AxisCalibration::new(8162.0, -53.0));
    }

    #[test]
    fn magnetometer_rescales_to_total_field() {
        // x and y pairs give scale 100, offset 0; the z-up reading also sees
        // 3 units of horizontal field on x
        let m = readings([
            [-100.0, 0.0, 0.0],
            [100.0, 0.0, 0.0],
            [0.0, -100.0, 0.0],
            [0.0, 100.0, 0.0],
            [300.0, 0.0, -400.0],
            [0.0, 0.0, 400.0],
        ]);
        let axes = magnetometer_axes(&m).unwrap();

        // z: scale -(-400 - 400) / 2 = 400, offset 0
        // B = (300 / 100, 0, 400 / 400) = (3, 0, 1)
        let ratio = 10f64.sqrt();
        assert!((axes[0].counts_per_unit - 100.0 * ratio).abs() < 1e-9);
        assert!((axes[1].counts_per_unit - 100.0 * ratio).abs() < 1e-9);
        assert!((axes[2].counts_per_unit - 400.0 * ratio).abs() < 1e-9);
        assert_eq!(axes[0].counts_offset, 0.0);
        assert_eq!(axes[2].counts_offset, 0.0);
    }

    #[test]
    fn magnetometer_with_flat_pair_is_rejected() {
        let m = readings([
            [-100.0, 0.0, 0.0],
            [100.0, 0.0, 0.0],
            [0.0, -100.0, 0.0],
            [0.0, 100.0, 0.0],
            [0.0, 0.0, 5.0],
            [0.0, 0.0, 5.0],
        ]);
        assert!(matches!(
            magnetometer_axes(&m),
            Err(IolabError::DegenerateCalibration { .. })
        ));
    }

    #[test]
    fn gyroscope_only_moves_offsets() {
        let m = readings([
            [-20.0, 230.0, -80.0],
            [-22.0, 228.0, -78.0],
            [-18.0, 232.0, -82.0],
            [-20.0, 230.0, -80.0],
            [-21.0, 231.0, -79.0],
            [-19.0, 229.0, -81.0],
        ]);
        let current = [AxisCalibration::new(938.7, 0.0); 3];
        let axes = gyroscope_axes(&m, &current);
        assert_eq!(axes[0], AxisCalibration::new(938.7, -20.0));
        assert_eq!(axes[1], AxisCalibration::new(938.7, 230.0));
        assert_eq!(axes[2], AxisCalibration::new(938.7, -80.0));
    }

    #[test]
    fn force_two_point() {
        let axis = force_axis(ForceReadings {
            unloaded: 2100.0,
            loaded: 2340.0,
        })
        .unwrap();
        assert_eq!(axis, AxisCalibration::new(-120.0, 53.0));

        assert!(force_axis(ForceReadings {
            unloaded: 2100.0,
            loaded: 2100.0
        })
        .is_err());
    }

    #[test]
    fn incomplete_orientations_report_missing() {
        let mut set = OrientationReadings::new();
        set.record(Orientation::XUp, [1.0, 2.0, 3.0]);
        set.record(Orientation::ZDown, [4.0, 5.0, 6.0]);
        assert_eq!(set.recorded(), 2);
        assert_eq!(set.get(Orientation::ZDown), Some([4.0, 5.0, 6.0]));

        match set.complete() {
            Err(IolabError::InsufficientHistory { required, available }) => {
                assert_eq!((required, available), (6, 2));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
