//! Calibration Models
//!
//! ## Overview
//!
//! Every channel holds one [`CalibrationModel`], chosen by sensor type when
//! the channel is set up. The variant fixes the shape of the raw-to-physical
//! transform:
//!
//! | Variant | Sensors | Transform |
//! |---------|---------|-----------|
//! | `Linear` | accelerometer, magnetometer, gyroscope, force, light, microphone, battery, high gain, ECG, analog 7-9 | `(raw - midpoint - offset) / scale` per axis |
//! | `Barometer` | barometer | polynomial with a P·T cross term, see [`crate::barometer`] |
//! | `Thermometer` | thermometer | two-point line through the 30 °C and 85 °C references |
//! | `Wheel` | wheel | position, velocity and naive acceleration, see [`crate::wheel`] |
//! | `Identity` | RSSI, digital | `cal = raw` |
//!
//! Constants start at the built-in defaults and change only through a
//! calibration file load, a calibration procedure ([`procedure`]), or device
//! registers read at runtime.
//!
//! ## Axis Reversal
//!
//! When the remote's y axis is reversed, [`apply_reversal`] negates the
//! components listed by [`SensorKind::reversed_axes`]. It runs after any
//! fitting so the wheel's fitted acceleration is negated with `r` and `v`.

pub mod linear;
pub mod procedure;

pub use linear::{AxisCalibration, LinearModel, NOMINAL_MIDPOINT};
pub use procedure::{
    ForceReadings, Measurements, Orientation, OrientationReadings, Reading,
    FORCE_CALIBRATION_NEWTONS, PROCEDURE_AVERAGE,
};

use crate::barometer::{BarometerModel, BarometerRegisters};
use crate::decode::{components, Components};
use crate::sensor::SensorKind;
use crate::wheel::WheelEstimator;

/// Thermometer ADC reading at 30 °C
pub const DEFAULT_CAL_AT_30: f64 = 2041.0;
/// Thermometer ADC reading at 85 °C
pub const DEFAULT_CAL_AT_85: f64 = 2426.0;

/// Two-point thermometer calibration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermometerModel {
    /// ADC value at 30 °C
    pub cal_at_30: f64,
    /// ADC value at 85 °C
    pub cal_at_85: f64,
}

impl Default for ThermometerModel {
    fn default() -> Self {
        Self {
            cal_at_30: DEFAULT_CAL_AT_30,
            cal_at_85: DEFAULT_CAL_AT_85,
        }
    }
}

impl ThermometerModel {
    /// Temperature in °C for an averaged ADC value
    pub fn celsius(&self, raw: f64) -> f64 {
        30.0 + (raw - self.cal_at_30) * (85.0 - 30.0) / (self.cal_at_85 - self.cal_at_30)
    }
}

/// Raw-to-physical transform of one channel
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationModel {
    /// Scale/offset per axis
    Linear(LinearModel),
    /// Polynomial pressure, linear temperature
    Barometer(BarometerModel),
    /// Two-point interpolation
    Thermometer(ThermometerModel),
    /// Encoder counts to r, v, a
    Wheel(WheelEstimator),
    /// Pass-through
    Identity,
}

impl CalibrationModel {
    /// Built-in model for `kind` on remote `hardware_id`
    pub fn defaults(kind: SensorKind, hardware_id: u32) -> Self {
        match kind {
            SensorKind::Barometer => CalibrationModel::Barometer(BarometerModel::default()),
            SensorKind::Thermometer => CalibrationModel::Thermometer(ThermometerModel::default()),
            SensorKind::Wheel => CalibrationModel::Wheel(WheelEstimator::for_hardware(hardware_id)),
            _ => LinearModel::defaults(kind)
                .map(CalibrationModel::Linear)
                .unwrap_or(CalibrationModel::Identity),
        }
    }

    /// Physical values for one raw sample
    ///
    /// `samples_per_second` is only used by the wheel.
    pub fn calibrate(&mut self, raw: &Components, samples_per_second: f64) -> Components {
        match self {
            CalibrationModel::Linear(model) => model.calibrate(raw),
            CalibrationModel::Barometer(model) => {
                let p = raw.first().copied().unwrap_or(0.0);
                let t = raw.get(1).copied().unwrap_or(0.0);
                let (kpa, celsius) = model.calibrate(p, t);
                components([kpa, celsius])
            }
            CalibrationModel::Thermometer(model) => {
                raw.iter().map(|&r| model.celsius(r)).collect()
            }
            CalibrationModel::Wheel(wheel) => wheel.calibrate(raw, samples_per_second),
            CalibrationModel::Identity => raw.clone(),
        }
    }

    /// Linear constants, if this model has them
    pub fn linear(&self) -> Option<&LinearModel> {
        match self {
            CalibrationModel::Linear(model) => Some(model),
            _ => None,
        }
    }

    /// Linear constants, mutable
    pub fn linear_mut(&mut self) -> Option<&mut LinearModel> {
        match self {
            CalibrationModel::Linear(model) => Some(model),
            _ => None,
        }
    }

    /// Wheel estimator, if this is the wheel
    pub fn wheel(&self) -> Option<&WheelEstimator> {
        match self {
            CalibrationModel::Wheel(wheel) => Some(wheel),
            _ => None,
        }
    }

    /// Replace barometer registers; returns false for other models
    pub fn set_barometer_registers(&mut self, registers: BarometerRegisters) -> bool {
        match self {
            CalibrationModel::Barometer(model) => {
                model.set_registers(registers);
                true
            }
            _ => false,
        }
    }

    /// Replace thermometer references; returns false for other models
    ///
    /// Equal or non-finite references are rejected and the current pair kept.
    pub fn set_thermometer_references(&mut self, cal_at_30: f64, cal_at_85: f64) -> bool {
        match self {
            CalibrationModel::Thermometer(_)
                if !(cal_at_30.is_finite() && cal_at_85.is_finite()) || cal_at_30 == cal_at_85 =>
            {
                log_warn!(
                    "rejecting thermometer references {} and {}",
                    cal_at_30,
                    cal_at_85
                );
                false
            }
            CalibrationModel::Thermometer(model) => {
                model.cal_at_30 = cal_at_30;
                model.cal_at_85 = cal_at_85;
                true
            }
            _ => false,
        }
    }
}

/// Negate the reversed components of `kind` in place
pub fn apply_reversal(kind: SensorKind, cal: &mut Components) {
    for &axis in kind.reversed_axes() {
        if let Some(value) = cal.get_mut(axis) {
            *value = -*value;
        }
    }
}
