//! Data export
//!
//! One text file per sensor per run, `{SensorName}_{unique}.csv` (comma
//! delimited) or `.mat` (space delimited), with a header line and one row
//! per sample:
//!
//! ```text
//! index, time, rawX, rawY, rawZ, calX, calY, calZ, aveX(3), aveY(3), aveZ(3)
//! 0, 0.0000, -16, 258, -1, -0.0066, 0.0318, -0.0001, 0.0000, 0.0000, 0.0000
//! ```
//!
//! Raw values print as they were decoded (integers without decimals), time,
//! calibrated and averaged values with 4 decimals. The microphone also gets
//! a `.bin` dump of its raw samples as little-endian `i16`.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{IolabError, IolabResult};
use crate::sensor::SensorKind;
use crate::store::Sample;

/// Text layout of an export file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Comma-space delimited `.csv`
    #[default]
    Csv,
    /// Space delimited `.mat`
    Matlab,
}

impl ExportFormat {
    /// File extension without the dot
    pub const fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Matlab => "mat",
        }
    }

    /// Field separator
    pub const fn delimiter(self) -> &'static str {
        match self {
            ExportFormat::Csv => ", ",
            ExportFormat::Matlab => " ",
        }
    }
}

/// Export file path for `kind`
pub fn data_path(dir: &Path, kind: SensorKind, unique: &str, format: ExportFormat) -> PathBuf {
    dir.join(format!("{}_{}.{}", kind.name(), unique, format.extension()))
}

/// Header line for `kind` averaged over `n_average` samples
pub fn header(kind: SensorKind, n_average: usize, format: ExportFormat) -> String {
    let labels = kind.axis_labels();
    let mut columns = vec!["index".to_string(), "time".to_string()];
    columns.extend(labels.iter().map(|l| format!("raw{l}")));
    columns.extend(labels.iter().map(|l| format!("cal{l}")));
    columns.extend(labels.iter().map(|l| format!("ave{l}({n_average})")));
    columns.join(format.delimiter())
}

fn row(index: usize, sample: &Sample, format: ExportFormat) -> String {
    let mut fields = Vec::with_capacity(2 + 3 * sample.raw.len());
    fields.push(index.to_string());
    fields.push(format!("{:.4}", sample.time));
    fields.extend(sample.raw.iter().map(|v| v.to_string()));
    fields.extend(sample.cal.iter().map(|v| format!("{v:.4}")));
    fields.extend(sample.ave.iter().map(|v| format!("{v:.4}")));
    fields.join(format.delimiter())
}

/// Write one channel's history to `path`
pub fn export_channel(
    path: &Path,
    kind: SensorKind,
    n_average: usize,
    samples: &[Sample],
    format: ExportFormat,
) -> IolabResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| IolabError::io(parent, e))?;
    }

    let file = fs::File::create(path).map_err(|e| IolabError::io(path, e))?;
    let mut out = BufWriter::new(file);
    let io_err = |e| IolabError::io(path, e);

    writeln!(out, "{}", header(kind, n_average, format)).map_err(io_err)?;
    for (i, sample) in samples.iter().enumerate() {
        writeln!(out, "{}", row(i, sample, format)).map_err(io_err)?;
    }
    out.flush().map_err(io_err)?;

    log_info!("{} samples of {} written to {}", samples.len(), kind, path.display());
    Ok(())
}

/// Dump the first raw component of every sample as little-endian `i16`
///
/// Only 16-bit raw readings belong here; the cast saturates anything wider.
pub fn write_raw_binary(path: &Path, samples: &[Sample]) -> IolabResult<()> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        let raw = sample.raw.first().copied().unwrap_or(0.0);
        debug_assert!(
            (f64::from(i16::MIN)..=f64::from(i16::MAX)).contains(&raw),
            "raw value {raw} does not fit in i16"
        );
        let value = raw as i16;
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    fs::write(path, bytes).map_err(|e| IolabError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::components;

    #[test]
    fn headers_follow_axis_labels() {
        assert_eq!(
            header(SensorKind::Accelerometer, 3, ExportFormat::Matlab),
            "index time rawX rawY rawZ calX calY calZ aveX(3) aveY(3) aveZ(3)"
        );
        assert_eq!(
            header(SensorKind::Barometer, 2, ExportFormat::Csv),
            "index, time, rawP, rawT, calP, calT, aveP(2), aveT(2)"
        );
        assert_eq!(
            header(SensorKind::Light, 5, ExportFormat::Csv),
            "index, time, raw, cal, ave(5)"
        );
        assert_eq!(
            header(SensorKind::Thermometer, 1, ExportFormat::Matlab),
            "index time rawT calT aveT(1)"
        );
        assert_eq!(
            header(SensorKind::Ecg, 3, ExportFormat::Matlab),
            "index time raw1 raw2 raw3 cal1 cal2 cal3 ave1(3) ave2(3) ave3(3)"
        );
    }

    #[test]
    fn rows_keep_raw_integers() {
        let sample = Sample {
            raw: components([2000.0, -5.0]),
            cal: components([0.123456, 1.0]),
            ave: components([0.5, 2.0 / 3.0]),
            time: 0.125,
        };
        assert_eq!(
            row(7, &sample, ExportFormat::Csv),
            "7, 0.1250, 2000, -5, 0.1235, 1.0000, 0.5000, 0.6667"
        );
    }

    #[test]
    fn export_and_binary_dump() {
        let dir = tempfile::tempdir().unwrap();
        let samples: Vec<Sample> = [-2.0, 300.0]
            .iter()
            .enumerate()
            .map(|(i, &r)| Sample {
                raw: components([r]),
                cal: components([r / 500.0]),
                ave: components([0.0]),
                time: i as f64 / 2400.0,
            })
            .collect();

        let path = data_path(dir.path(), SensorKind::Microphone, "run1", ExportFormat::Csv);
        export_channel(&path, SensorKind::Microphone, 1, &samples, ExportFormat::Csv).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "index, time, raw, cal, ave(1)");
        assert_eq!(lines[2], "1, 0.0004, 300, 0.6000, 0.0000");

        let bin = dir.path().join("Microphone_run1.bin");
        write_raw_binary(&bin, &samples).unwrap();
        assert_eq!(fs::read(&bin).unwrap(), vec![0xFE, 0xFF, 0x2C, 0x01]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "does not fit in i16")]
    fn binary_dump_refuses_wide_raw_values() {
        let dir = tempfile::tempdir().unwrap();
        let sample = Sample {
            raw: components([40_000.0]),
            cal: components([0.0]),
            ave: components([0.0]),
            time: 0.0,
        };
        let _ = write_raw_binary(&dir.path().join("wide.bin"), &[sample]);
    }
}
