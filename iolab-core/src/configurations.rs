//! Fixed remote configurations
//!
//! The remote streams one of a fixed set of sensor combinations, selected by
//! a configuration code. Each entry lists the sensors it enables together
//! with their nominal sample rates (Hz). The nominal rate drives live time
//! stamps until a recalibration pass measures the real one.

use crate::errors::{IolabError, IolabResult};
use crate::sensor::SensorKind;
use crate::sensor::SensorKind::*;

/// One selectable sensor combination
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedConfiguration {
    /// Configuration code sent to the remote
    pub code: u8,
    /// Human-readable name
    pub name: &'static str,
    /// Enabled sensors and their nominal sample rates
    pub sensors: &'static [(SensorKind, u32)],
}

impl FixedConfiguration {
    /// Nominal rate for `kind`, if this configuration enables it
    pub fn nominal_rate(&self, kind: SensorKind) -> Option<u32> {
        self.sensors
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|&(_, rate)| rate)
    }
}

const HEADER_3V: &[(SensorKind, u32)] = &[
    (Analog7, 100),
    (Analog8, 100),
    (Analog9, 100),
    (HighGain, 200),
    (Digital, 100),
];

/// Every configuration this crate can decode
pub static CONFIGURATIONS: &[FixedConfiguration] = &[
    FixedConfiguration { code: 1, name: "Gyroscope", sensors: &[(Gyroscope, 380)] },
    FixedConfiguration { code: 2, name: "Accelerometer", sensors: &[(Accelerometer, 400)] },
    FixedConfiguration {
        code: 3,
        name: "Orientation",
        sensors: &[(Accelerometer, 100), (Magnetometer, 80), (Gyroscope, 95), (HighGain, 100)],
    },
    FixedConfiguration {
        code: 4,
        name: "Mini-motion",
        sensors: &[(Accelerometer, 200), (Wheel, 100), (Force, 200)],
    },
    FixedConfiguration {
        code: 5,
        name: "Pendulum",
        sensors: &[(Accelerometer, 100), (Gyroscope, 95), (Force, 100)],
    },
    FixedConfiguration {
        code: 6,
        name: "Ambient",
        sensors: &[(Barometer, 100), (Battery, 50), (Light, 400), (Thermometer, 50)],
    },
    FixedConfiguration { code: 7, name: "ECG3", sensors: &[(Ecg, 400)] },
    FixedConfiguration { code: 8, name: "Header 3V", sensors: HEADER_3V },
    FixedConfiguration { code: 9, name: "Microphone", sensors: &[(Microphone, 2400)] },
    FixedConfiguration {
        code: 10,
        name: "Magnetic",
        sensors: &[(Magnetometer, 80), (HighGain, 400)],
    },
    FixedConfiguration { code: 12, name: "Header 3V3", sensors: HEADER_3V },
    FixedConfiguration { code: 32, name: "Gyroscope (HS)", sensors: &[(Gyroscope, 760)] },
    FixedConfiguration { code: 33, name: "Accelerometer (HS)", sensors: &[(Accelerometer, 800)] },
    FixedConfiguration {
        code: 34,
        name: "Orientation (HS)",
        sensors: &[(Accelerometer, 400), (Magnetometer, 80), (Gyroscope, 190)],
    },
    FixedConfiguration {
        code: 35,
        name: "Motion",
        sensors: &[(Accelerometer, 200), (Gyroscope, 190), (Wheel, 100), (Force, 200)],
    },
    FixedConfiguration {
        code: 36,
        name: "Sports",
        sensors: &[(Ecg, 200), (Accelerometer, 200), (Magnetometer, 80), (Gyroscope, 190)],
    },
    FixedConfiguration {
        code: 37,
        name: "Pendulum (HS)",
        sensors: &[(Accelerometer, 200), (Gyroscope, 190), (Force, 200)],
    },
    FixedConfiguration {
        code: 38,
        name: "Kitchen Sink",
        sensors: &[
            (Magnetometer, 80),
            (Accelerometer, 100),
            (Wheel, 100),
            (Force, 100),
            (Gyroscope, 95),
            (Light, 100),
            (Battery, 100),
            (HighGain, 100),
            (Analog7, 100),
            (Digital, 100),
            (Barometer, 100),
        ],
    },
    FixedConfiguration { code: 39, name: "Microphone (HS)", sensors: &[(Microphone, 4800)] },
    FixedConfiguration { code: 40, name: "Ambient Light (HS)", sensors: &[(Light, 4800)] },
    FixedConfiguration {
        code: 41,
        name: "Ambient Light & Accel (HS)",
        sensors: &[(Light, 800), (Accelerometer, 800)],
    },
    FixedConfiguration {
        code: 42,
        name: "Force Gauge & Accel (HS)",
        sensors: &[(Force, 800), (Accelerometer, 800)],
    },
    FixedConfiguration {
        code: 43,
        name: "Ambient Light & Micro (HS)",
        sensors: &[(Light, 2400), (Microphone, 2400)],
    },
    FixedConfiguration { code: 44, name: "Electrocardiograph (9)", sensors: &[(Ecg, 800)] },
    FixedConfiguration { code: 45, name: "High Gain (HS)", sensors: &[(HighGain, 4800)] },
    FixedConfiguration { code: 46, name: "Force Gauge (HS)", sensors: &[(Force, 4800)] },
];

/// Find a configuration by code
pub fn lookup(code: u8) -> IolabResult<&'static FixedConfiguration> {
    CONFIGURATIONS
        .iter()
        .find(|c| c.code == code)
        .ok_or(IolabError::UnknownConfiguration(code))
}
