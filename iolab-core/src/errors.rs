//! Error Types for the Telemetry Pipeline
//!
//! ## Design Philosophy
//!
//! Nothing in the decode/calibrate/average pipeline is fatal to the process.
//! Every failure is recoverable at the level of a single channel, and most of
//! them leave the channel exactly as it was before the call:
//!
//! 1. **Configuration not ready**: the remote's hardware ID is still 0, so no
//!    calibration file can be named. No file access is attempted.
//!
//! 2. **Malformed input**: a calibration file exists but its line does not
//!    name the sensor, has the wrong number of fields, or holds a value that
//!    is not a number. Built-in defaults stay in place.
//!
//! 3. **I/O failure**: reading or writing a file failed. The error carries the
//!    path and the underlying [`std::io::Error`].
//!
//! 4. **Insufficient history**: an operation needs more samples than the
//!    channel holds. Windowed statistics never raise this (they return zeroed
//!    defaults); it is reserved for operations that cannot produce a value at
//!    all, such as measuring a calibration orientation on an empty channel.
//!
//! ## Error Handling Strategy
//!
//! ```rust
//! use iolab_core::{IolabError, calfile};
//! use iolab_core::sensor::SensorKind;
//!
//! match calfile::read_calibration("Calibration/CalData".as_ref(), 0, SensorKind::Accelerometer) {
//!     Ok(Some(_record)) => { /* apply constants */ }
//!     Ok(None) => { /* no file yet, keep defaults */ }
//!     Err(IolabError::HardwareIdUnknown { .. }) => { /* retry once the ID is known */ }
//!     Err(_other) => { /* log and keep defaults */ }
//! }
//! ```

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::sensor::SensorKind;

/// Result type for pipeline operations
pub type IolabResult<T> = Result<T, IolabError>;

/// Everything that can go wrong in a channel
#[derive(Error, Debug)]
pub enum IolabError {
    /// Calibration read/write attempted before the hardware ID is known
    #[error("remote hardware ID unknown: cannot access {sensor} calibration")]
    HardwareIdUnknown {
        /// Sensor whose calibration was requested
        sensor: SensorKind,
    },

    /// Calibration file present but unusable
    #[error("malformed calibration file {}: {reason}", path.display())]
    MalformedCalibration {
        /// File that was read
        path: PathBuf,
        /// What was wrong with its line
        reason: MalformedReason,
    },

    /// Underlying file system failure
    #[error("I/O failure on {}: {source}", path.display())]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Error reported by the OS
        source: io::Error,
    },

    /// Not enough samples recorded for the requested operation
    #[error("insufficient history: need {required} samples, have {available}")]
    InsufficientHistory {
        /// Minimum number of samples needed
        required: usize,
        /// Number of samples held by the channel
        available: usize,
    },

    /// Sensor type code not known to this crate
    #[error("unknown sensor code 0x{0:02x}")]
    UnknownSensor(u8),

    /// Fixed configuration code not in the configuration table
    #[error("unknown configuration code {0}")]
    UnknownConfiguration(u8),

    /// Bad remote/channel configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Calibration measurements that would give an unusable model
    #[error("degenerate {sensor} calibration: {reason}")]
    DegenerateCalibration {
        /// Sensor being calibrated
        sensor: SensorKind,
        /// What made the measurements unusable
        reason: &'static str,
    },

    /// Operation not defined for this sensor type
    #[error("{operation} is not supported for {sensor}")]
    Unsupported {
        /// Sensor the operation was requested on
        sensor: SensorKind,
        /// Name of the operation
        operation: &'static str,
    },
}

/// Why a calibration line was rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MalformedReason {
    /// The file has no first line
    #[error("file is empty")]
    Empty,

    /// First field does not contain the sensor name
    #[error("first field does not name the sensor")]
    MissingName,

    /// Wrong number of comma-separated fields
    #[error("expected {expected} fields, found {found}")]
    FieldCount {
        /// Field count defined for the sensor
        expected: usize,
        /// Field count found in the file
        found: usize,
    },

    /// A numeric field failed to parse
    #[error("field {index} is not a number")]
    BadNumber {
        /// Zero-based field position
        index: usize,
    },
}

impl IolabError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        IolabError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for failures that left in-memory state untouched
    pub fn keeps_defaults(&self) -> bool {
        matches!(
            self,
            IolabError::HardwareIdUnknown { .. }
                | IolabError::MalformedCalibration { .. }
                | IolabError::Io { .. }
                | IolabError::InsufficientHistory { .. }
                | IolabError::DegenerateCalibration { .. }
        )
    }
}
