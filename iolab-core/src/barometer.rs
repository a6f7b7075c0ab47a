//! Barometric Calibration Decoder
//!
//! ## Overview
//!
//! The barometer reports 10-bit pressure (P) and temperature (T) ADC counts.
//! Turning them into a pressure needs four device-specific coefficients that
//! the remote exposes as raw 16-bit calibration registers:
//!
//! ```text
//! pComp = A0 + (B1 + C12 * T) * P + B2 * T
//! p_kPa = 50 + pComp * (115 - 50) / 1023
//! ```
//!
//! ## Register Encoding
//!
//! Each register is sign-magnitude fixed point. The sign is the sign of the
//! register read as `i16`, the magnitude its absolute value. The magnitude
//! is then split into integer and fractional bits:
//!
//! | Coefficient | Magnitude bits | Fractional bits | Fixed type |
//! |-------------|----------------|-----------------|------------|
//! | A0  | 16 | 3  | `U13F3`  |
//! | B1  | 16 | 13 | `U3F13`  |
//! | B2  | 16 | 14 | `U2F14`  |
//! | C12 | register >> 2, low 13 bits | 22 | `U10F22` |
//!
//! C12 is purely fractional: its 13-bit numerator sits over `2^22`.
//!
//! Decoding is done once, lazily, the first time a pressure is computed.
//! Loading new registers from the device discards the decoded values.

use fixed::types::{U10F22, U13F3, U2F14, U3F13};

/// A0 register of the reference unit
pub const DEFAULT_A0: u16 = 0x4422;
/// B1 register of the reference unit
pub const DEFAULT_B1: u16 = 0xad63;
/// B2 register of the reference unit
pub const DEFAULT_B2: u16 = 0xbcda;
/// C12 register of the reference unit
pub const DEFAULT_C12: u16 = 0x3ab8;

/// Lower end of the sensor's pressure range (kPa)
pub const PRESSURE_MIN_KPA: f64 = 50.0;
/// Upper end of the sensor's pressure range (kPa)
pub const PRESSURE_MAX_KPA: f64 = 115.0;
/// Full-scale value of the compensated 10-bit reading
pub const PRESSURE_FULL_SCALE: f64 = 1023.0;

/// Temperature ADC count at 0 °C extrapolated from the datasheet line
pub const TEMPERATURE_ZERO_COUNTS: f64 = 605.75;
/// Temperature ADC counts per °C (negative slope)
pub const TEMPERATURE_COUNTS_PER_C: f64 = -5.35;

/// The four raw calibration registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarometerRegisters {
    /// Offset coefficient register
    pub a0: u16,
    /// Pressure sensitivity register
    pub b1: u16,
    /// Temperature coefficient of offset register
    pub b2: u16,
    /// Temperature coefficient of sensitivity register
    pub c12: u16,
}

impl Default for BarometerRegisters {
    fn default() -> Self {
        Self {
            a0: DEFAULT_A0,
            b1: DEFAULT_B1,
            b2: DEFAULT_B2,
            c12: DEFAULT_C12,
        }
    }
}

/// Decoded floating-point coefficients
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarometerCoefficients {
    /// Offset
    pub a0: f64,
    /// Pressure sensitivity
    pub b1: f64,
    /// Temperature coefficient of offset
    pub b2: f64,
    /// Temperature coefficient of sensitivity
    pub c12: f64,
}

fn sign(register: u16) -> f64 {
    (register as i16).signum() as f64
}

fn magnitude(register: u16) -> u16 {
    // |i16::MIN| = 0x8000 still fits the unsigned 16-bit container
    (register as i16 as i32).unsigned_abs() as u16
}

impl BarometerCoefficients {
    /// Decode the sign-magnitude fixed-point registers
    pub fn decode(registers: &BarometerRegisters) -> Self {
        let a0 = U13F3::from_bits(magnitude(registers.a0)).to_num::<f64>();
        let b1 = U3F13::from_bits(magnitude(registers.b1)).to_num::<f64>();
        let b2 = U2F14::from_bits(magnitude(registers.b2)).to_num::<f64>();

        let c12_bits = (registers.c12 >> 2) & 0x1FFF;
        let c12 = U10F22::from_bits(u32::from(c12_bits)).to_num::<f64>();

        Self {
            a0: sign(registers.a0) * a0,
            b1: sign(registers.b1) * b1,
            b2: sign(registers.b2) * b2,
            c12: sign(registers.c12) * c12,
        }
    }

    /// Temperature-compensated pressure in ADC units
    pub fn compensated(&self, p_adc: f64, t_adc: f64) -> f64 {
        self.a0 + (self.b1 + self.c12 * t_adc) * p_adc + self.b2 * t_adc
    }

    /// Absolute pressure in kPa
    pub fn pressure_kpa(&self, p_adc: f64, t_adc: f64) -> f64 {
        PRESSURE_MIN_KPA
            + self.compensated(p_adc, t_adc) * (PRESSURE_MAX_KPA - PRESSURE_MIN_KPA)
                / PRESSURE_FULL_SCALE
    }
}

/// Barometer die temperature in °C from its raw ADC count
pub fn temperature_c(t_adc: f64) -> f64 {
    (t_adc - TEMPERATURE_ZERO_COUNTS) / TEMPERATURE_COUNTS_PER_C
}

/// Registers plus their lazily decoded coefficients
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BarometerModel {
    registers: BarometerRegisters,
    decoded: Option<BarometerCoefficients>,
}

impl BarometerModel {
    /// Model for the given registers, not yet decoded
    pub fn new(registers: BarometerRegisters) -> Self {
        Self {
            registers,
            decoded: None,
        }
    }

    /// Raw registers in use
    pub fn registers(&self) -> BarometerRegisters {
        self.registers
    }

    /// Replace the registers with values read from the device
    pub fn set_registers(&mut self, registers: BarometerRegisters) {
        if registers != self.registers {
            self.registers = registers;
            self.decoded = None;
        }
    }

    /// True once the registers have been decoded
    pub fn is_decoded(&self) -> bool {
        self.decoded.is_some()
    }

    /// Decoded coefficients, decoding on first use
    pub fn coefficients(&mut self) -> BarometerCoefficients {
        let registers = self.registers;
        *self.decoded.get_or_insert_with(|| {
            let c = BarometerCoefficients::decode(&registers);
            log_info!(
                "barometer coefficients A0:{:.4} B1:{:.4} B2:{:.4} C12:{:.4}",
                c.a0,
                c.b1,
                c.b2,
                c.c12
            );
            c
        })
    }

    /// Calibrated (pressure kPa, temperature °C) from raw (P, T)
    pub fn calibrate(&mut self, p_adc: f64, t_adc: f64) -> (f64, f64) {
        let c = self.coefficients();
        (c.pressure_kpa(p_adc, t_adc), temperature_c(t_adc))
    }
}
