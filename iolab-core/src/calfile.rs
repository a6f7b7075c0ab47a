//! Calibration File Store
//!
//! ## File Format
//!
//! One file per (remote, sensor), named `{hardware_id:06x}_{SensorName}.txt`
//! inside the calibration directory. The file holds a single line:
//!
//! ```text
//! Accelerometer, 8206.0000, 38.0000, 8116.0000, 0.0000, 8162.0000, -53.0000, 400.0000, 0.000000
//! Force, -120.0000, 0.0000, 4800.0000, 0.000000
//! ```
//!
//! Constants and the sample rate carry 4 decimals, the timing shift 6.
//! Existing files written by earlier tools must keep loading, so the reader
//! only checks that the first field contains the sensor name and that the
//! field count matches exactly.
//!
//! ## Outcomes
//!
//! | Situation | Result |
//! |-----------|--------|
//! | hardware ID 0 | `Err(HardwareIdUnknown)`, no file access |
//! | no file | `Ok(None)` |
//! | empty file, wrong name, wrong count, bad number | `Err(MalformedCalibration)` |
//! | any other I/O failure | `Err(Io)` |

use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::errors::{IolabError, IolabResult, MalformedReason};
use crate::sensor::SensorKind;

/// Contents of one calibration line
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationRecord {
    /// Sensor-specific constants in file order
    pub constants: Vec<f64>,
    /// Sample rate measured when the constants were saved
    pub samples_per_second: f64,
    /// Time stamp offset in seconds
    pub timing_shift: f64,
}

/// Path of the calibration file for `kind` on remote `hardware_id`
pub fn calibration_path(dir: &Path, hardware_id: u32, kind: SensorKind) -> PathBuf {
    dir.join(format!("{:06x}_{}.txt", hardware_id, kind.name()))
}

/// Render the calibration line for `kind`
pub fn format_line(kind: SensorKind, record: &CalibrationRecord) -> String {
    let mut fields = Vec::with_capacity(record.constants.len() + 3);
    fields.push(kind.name().to_string());
    fields.extend(record.constants.iter().map(|c| format!("{c:.4}")));
    fields.push(format!("{:.4}", record.samples_per_second));
    fields.push(format!("{:.6}", record.timing_shift));
    fields.join(", ")
}

/// Parse a calibration line for `kind`
pub fn parse_line(kind: SensorKind, line: &str) -> Result<CalibrationRecord, MalformedReason> {
    let parts: Vec<&str> = line.split(',').collect();
    if !parts[0].contains(kind.name()) {
        return Err(MalformedReason::MissingName);
    }

    if let Some(expected) = kind.calibration_field_count() {
        if parts.len() != expected {
            return Err(MalformedReason::FieldCount {
                expected,
                found: parts.len(),
            });
        }
    } else if parts.len() < 3 {
        return Err(MalformedReason::FieldCount {
            expected: 3,
            found: parts.len(),
        });
    }

    let mut numbers = Vec::with_capacity(parts.len() - 1);
    for (index, part) in parts.iter().enumerate().skip(1) {
        let value = part
            .trim()
            .parse::<f64>()
            .map_err(|_| MalformedReason::BadNumber { index })?;
        numbers.push(value);
    }

    let timing_shift = numbers.pop().unwrap_or_default();
    let samples_per_second = numbers.pop().unwrap_or_default();
    Ok(CalibrationRecord {
        constants: numbers,
        samples_per_second,
        timing_shift,
    })
}

/// Read the calibration file for `kind`
///
/// # Errors
///
/// See the module table. The caller's model is never touched here, so any
/// error leaves the built-in constants in place.
pub fn read_calibration(
    dir: &Path,
    hardware_id: u32,
    kind: SensorKind,
) -> IolabResult<Option<CalibrationRecord>> {
    if hardware_id == 0 {
        log_warn!("remote ID not known: cannot read {} calibration data", kind);
        return Err(IolabError::HardwareIdUnknown { sensor: kind });
    }

    let path = calibration_path(dir, hardware_id, kind);
    let file = match fs::File::open(&path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log_debug!("no calibration file at {}", path.display());
            return Ok(None);
        }
        Err(e) => return Err(IolabError::io(path, e)),
    };

    let mut line = String::new();
    let read = BufReader::new(file)
        .read_line(&mut line)
        .map_err(|e| IolabError::io(&path, e))?;
    if read == 0 {
        return Err(IolabError::MalformedCalibration {
            path,
            reason: MalformedReason::Empty,
        });
    }

    let line = line.trim_end_matches(['\r', '\n']);
    match parse_line(kind, line) {
        Ok(record) => {
            log_info!(
                "{} calibration read from {}: samplesPerSecond {}, timingShift {}",
                kind,
                path.display(),
                record.samples_per_second,
                record.timing_shift
            );
            Ok(Some(record))
        }
        Err(reason) => Err(IolabError::MalformedCalibration { path, reason }),
    }
}

/// Write the calibration file for `kind`, creating the directory if needed
///
/// Returns the path written.
pub fn write_calibration(
    dir: &Path,
    hardware_id: u32,
    kind: SensorKind,
    record: &CalibrationRecord,
) -> IolabResult<PathBuf> {
    if hardware_id == 0 {
        log_warn!("remote ID not known: cannot save {} calibration data", kind);
        return Err(IolabError::HardwareIdUnknown { sensor: kind });
    }

    fs::create_dir_all(dir).map_err(|e| IolabError::io(dir, e))?;
    let path = calibration_path(dir, hardware_id, kind);
    fs::write(&path, format!("{}\n", format_line(kind, record)))
        .map_err(|e| IolabError::io(&path, e))?;

    log_info!("{} calibration saved to {}", kind, path.display());
    Ok(path)
}
