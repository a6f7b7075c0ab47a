//! Sensor Type Registry
//!
//! Every sensor on the remote is identified on the wire by a one-byte type
//! code. This module maps each code to everything the rest of the pipeline
//! needs to know about the sensor without consulting a per-sensor class:
//!
//! | Code | Name | Bytes/sample | Axes |
//! |------|------|--------------|------|
//! | 0x00 | RSSI | 1 | 1 |
//! | 0x01 | Accelerometer | 6 | X Y Z |
//! | 0x02 | Magnetometer | 6 | X Y Z |
//! | 0x03 | Gyroscope | 6 | X Y Z |
//! | 0x04 | Barometer | 4 | P T |
//! | 0x06 | Microphone | 2 | 1 |
//! | 0x07 | Light | 2 | 1 |
//! | 0x08 | Force | 2 | 1 |
//! | 0x09 | Wheel | 2 | R V A |
//! | 0x0A | ECG | 6 | 1 2 3 |
//! | 0x0B | Battery | 2 | 1 |
//! | 0x0C | HighGain | 2 | 1 |
//! | 0x0D | Digital | 1 | 1 |
//! | 0x15-0x17 | Analog7-9 | 2 | 1 |
//! | 0x1A | Thermometer | 4 | T |
//!
//! The display name doubles as the file-name component for calibration
//! files and data exports, so it must match the historical spelling.

use core::fmt;

use crate::errors::IolabError;

/// Largest number of value components carried by one sample
pub const MAX_AXES: usize = 3;

/// Sensor types reported by the remote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SensorKind {
    /// Received signal strength of the radio link
    Rssi,
    /// Three-axis accelerometer
    Accelerometer,
    /// Three-axis magnetometer
    Magnetometer,
    /// Three-axis gyroscope
    Gyroscope,
    /// Barometric pressure with its internal temperature
    Barometer,
    /// Microphone level
    Microphone,
    /// Ambient light
    Light,
    /// Force probe
    Force,
    /// Wheel encoder
    Wheel,
    /// Three-lead electrocardiograph
    Ecg,
    /// Battery voltage
    Battery,
    /// High-gain analog input
    HighGain,
    /// Eight digital header inputs
    Digital,
    /// Analog header pin 7
    Analog7,
    /// Analog header pin 8
    Analog8,
    /// Analog header pin 9
    Analog9,
    /// Oversampled thermometer
    Thermometer,
}

impl SensorKind {
    /// Every known sensor, in wire-code order
    pub const ALL: [SensorKind; 17] = [
        SensorKind::Rssi,
        SensorKind::Accelerometer,
        SensorKind::Magnetometer,
        SensorKind::Gyroscope,
        SensorKind::Barometer,
        SensorKind::Microphone,
        SensorKind::Light,
        SensorKind::Force,
        SensorKind::Wheel,
        SensorKind::Ecg,
        SensorKind::Battery,
        SensorKind::HighGain,
        SensorKind::Digital,
        SensorKind::Analog7,
        SensorKind::Analog8,
        SensorKind::Analog9,
        SensorKind::Thermometer,
    ];

    /// Wire type code
    pub const fn code(self) -> u8 {
        match self {
            SensorKind::Rssi => 0x00,
            SensorKind::Accelerometer => 0x01,
            SensorKind::Magnetometer => 0x02,
            SensorKind::Gyroscope => 0x03,
            SensorKind::Barometer => 0x04,
            SensorKind::Microphone => 0x06,
            SensorKind::Light => 0x07,
            SensorKind::Force => 0x08,
            SensorKind::Wheel => 0x09,
            SensorKind::Ecg => 0x0A,
            SensorKind::Battery => 0x0B,
            SensorKind::HighGain => 0x0C,
            SensorKind::Digital => 0x0D,
            SensorKind::Analog7 => 0x15,
            SensorKind::Analog8 => 0x16,
            SensorKind::Analog9 => 0x17,
            SensorKind::Thermometer => 0x1A,
        }
    }

    /// Look up a sensor by wire type code
    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0x00 => SensorKind::Rssi,
            0x01 => SensorKind::Accelerometer,
            0x02 => SensorKind::Magnetometer,
            0x03 => SensorKind::Gyroscope,
            0x04 => SensorKind::Barometer,
            0x06 => SensorKind::Microphone,
            0x07 => SensorKind::Light,
            0x08 => SensorKind::Force,
            0x09 => SensorKind::Wheel,
            0x0A => SensorKind::Ecg,
            0x0B => SensorKind::Battery,
            0x0C => SensorKind::HighGain,
            0x0D => SensorKind::Digital,
            0x15 => SensorKind::Analog7,
            0x16 => SensorKind::Analog8,
            0x17 => SensorKind::Analog9,
            0x1A => SensorKind::Thermometer,
            _ => return None,
        })
    }

    /// Look up a sensor by display name
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    /// Display name, also used in file names
    pub const fn name(self) -> &'static str {
        match self {
            SensorKind::Rssi => "RSSI",
            SensorKind::Accelerometer => "Accelerometer",
            SensorKind::Magnetometer => "Magnetometer",
            SensorKind::Gyroscope => "Gyroscope",
            SensorKind::Barometer => "Barometer",
            SensorKind::Microphone => "Microphone",
            SensorKind::Light => "Light",
            SensorKind::Force => "Force",
            SensorKind::Wheel => "Wheel",
            SensorKind::Ecg => "ECG",
            SensorKind::Battery => "Battery",
            SensorKind::HighGain => "HighGain",
            SensorKind::Digital => "Digital",
            SensorKind::Analog7 => "Analog7",
            SensorKind::Analog8 => "Analog8",
            SensorKind::Analog9 => "Analog9",
            SensorKind::Thermometer => "Thermometer",
        }
    }

    /// Payload bytes consumed per decoded sample
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            SensorKind::Accelerometer
            | SensorKind::Magnetometer
            | SensorKind::Gyroscope
            | SensorKind::Ecg => 6,
            SensorKind::Barometer | SensorKind::Thermometer => 4,
            SensorKind::Rssi | SensorKind::Digital => 1,
            _ => 2,
        }
    }

    /// Column suffixes for the value components, one per axis
    pub const fn axis_labels(self) -> &'static [&'static str] {
        match self {
            SensorKind::Accelerometer | SensorKind::Magnetometer | SensorKind::Gyroscope => {
                &["X", "Y", "Z"]
            }
            SensorKind::Ecg => &["1", "2", "3"],
            SensorKind::Barometer => &["P", "T"],
            SensorKind::Wheel => &["R", "V", "A"],
            SensorKind::Thermometer => &["T"],
            _ => &[""],
        }
    }

    /// Number of value components per sample
    pub const fn axis_count(self) -> usize {
        self.axis_labels().len()
    }

    /// Averaging window a freshly set up channel starts with
    pub const fn default_n_average(self) -> usize {
        match self {
            SensorKind::Accelerometer
            | SensorKind::Light
            | SensorKind::Force
            | SensorKind::Wheel
            | SensorKind::Ecg => 3,
            SensorKind::Barometer => 2,
            _ => 1,
        }
    }

    /// Field count of the calibration file line, for sensors that persist one
    pub const fn calibration_field_count(self) -> Option<usize> {
        match self {
            SensorKind::Accelerometer | SensorKind::Magnetometer | SensorKind::Gyroscope => Some(9),
            SensorKind::Force => Some(5),
            _ => None,
        }
    }

    /// Calibrated components negated when the remote's y axis is reversed
    pub const fn reversed_axes(self) -> &'static [usize] {
        match self {
            SensorKind::Accelerometer | SensorKind::Magnetometer | SensorKind::Gyroscope => &[1],
            SensorKind::Force => &[0],
            SensorKind::Wheel => &[0, 1, 2],
            _ => &[],
        }
    }
}

impl TryFrom<u8> for SensorKind {
    type Error = IolabError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(IolabError::UnknownSensor(code))
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
