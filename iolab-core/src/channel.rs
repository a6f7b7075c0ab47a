//! Generic Sensor Channel
//!
//! ## Overview
//!
//! A [`SensorChannel`] is one sensor's pipeline within a configured remote.
//! The same engine serves every sensor type; what differs is carried by the
//! decoder layout and the calibration model chosen at setup:
//!
//! ```text
//! payload bytes ──► FrameDecoder ──► raw ──► CalibrationModel ──► cal
//!                        │                                          │
//!                PacketTimingTracker                 wheel fit, axis reversal
//!                                                                   │
//!                              SampleStore ◄── Sample { raw, cal, ave, time }
//! ```
//!
//! ## Live vs. Recalibrated
//!
//! | | Live append | [`SensorChannel::recalibrate`] |
//! |---|---|---|
//! | sample rate | nominal (or from the calibration file) | measured by the timing tracker |
//! | wheel acceleration | trailing window `[i - 2k, i]` | centered window `[i - k, i + k]` |
//! | average | window trailing the newest sample | window around each sample |
//!
//! Recalibration builds a full replacement history and swaps it in, so a
//! reader never sees a half-updated store.
//!
//! ## Sharing
//!
//! Appending and recalibrating both rewrite the history. [`ChannelHandle`]
//! wraps a channel in a mutex so every mutation of one channel is serialized
//! while different channels proceed in parallel.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::barometer::BarometerRegisters;
use crate::calfile::{self, CalibrationRecord};
use crate::calibration::procedure::{self, Measurements, Reading};
use crate::calibration::{apply_reversal, AxisCalibration, CalibrationModel, NOMINAL_MIDPOINT};
use crate::config::RemoteContext;
use crate::decode::{Components, FrameDecoder};
use crate::errors::{IolabError, IolabResult};
use crate::export::{self, ExportFormat};
use crate::sensor::SensorKind;
use crate::store::{window_stats, Sample, SampleStore, Selector, WindowStats};
use crate::time::Timestamp;
use crate::timing::PacketTimingTracker;

/// Samples averaged by the force probe's zero action
pub const FORCE_ZERO_AVERAGE: usize = 50;

/// Fewest samples for which a windowed average is produced
const MIN_WINDOW_SAMPLES: usize = 3;

/// One point handed to a live display
#[derive(Debug, Clone, PartialEq)]
pub struct LivePoint {
    /// Sample time in seconds
    pub time: f64,
    /// Raw components
    pub raw: Components,
    /// Windowed average of the calibrated components
    pub ave: Components,
}

/// One sensor's decode, calibration and history
#[derive(Debug, Clone)]
pub struct SensorChannel {
    kind: SensorKind,
    active: bool,
    n_average: usize,
    samples_per_second: f64,
    timing_shift: f64,
    decoder: FrameDecoder,
    model: CalibrationModel,
    store: SampleStore,
    timing: PacketTimingTracker,
    max_samples: Option<usize>,
    cap_reported: bool,
}

impl SensorChannel {
    /// Set up a channel streaming at `nominal_rate` Hz
    ///
    /// Loads the remote's calibration file when the sensor has one. A missing
    /// or unusable file leaves the built-in constants in place.
    pub fn new(kind: SensorKind, nominal_rate: f64, ctx: &RemoteContext) -> Self {
        let settings = ctx.settings_for(kind).cloned().unwrap_or_default();
        let nominal_rate = settings.nominal_rate.unwrap_or(nominal_rate);

        let mut channel = Self {
            kind,
            active: true,
            n_average: settings.n_average.unwrap_or(kind.default_n_average()),
            samples_per_second: nominal_rate,
            timing_shift: 0.0,
            decoder: FrameDecoder::new(kind).with_thermometer_rate(nominal_rate),
            model: CalibrationModel::defaults(kind, ctx.hardware_id),
            store: SampleStore::new(),
            timing: PacketTimingTracker::new(),
            max_samples: ctx.max_samples,
            cap_reported: false,
        };

        log_info!("{} channel set up at {} Hz", kind, nominal_rate);
        if kind.calibration_field_count().is_some() && !channel.read_calibration(ctx) {
            log_info!("cannot read {} calibration constants, using defaults", kind);
        }
        channel
    }

    /// Sensor this channel carries
    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    /// True while the channel is part of the remote's configuration
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Enable or disable the channel
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Averaging window
    pub fn n_average(&self) -> usize {
        self.n_average
    }

    /// Change the averaging window used from now on
    pub fn set_n_average(&mut self, n: usize) {
        self.n_average = n;
    }

    /// Sample rate used for time stamps
    pub fn samples_per_second(&self) -> f64 {
        self.samples_per_second
    }

    /// Seconds subtracted from every time stamp
    pub fn timing_shift(&self) -> f64 {
        self.timing_shift
    }

    /// Set the time stamp offset
    pub fn set_timing_shift(&mut self, shift: f64) {
        self.timing_shift = shift;
    }

    /// Sample history
    pub fn store(&self) -> &SampleStore {
        &self.store
    }

    /// Frame/sample counters
    pub fn timing(&self) -> &PacketTimingTracker {
        &self.timing
    }

    /// Calibration model
    pub fn model(&self) -> &CalibrationModel {
        &self.model
    }

    /// Calibration model, mutable
    pub fn model_mut(&mut self) -> &mut CalibrationModel {
        &mut self.model
    }

    /// Frame decoder state
    pub fn decoder(&self) -> &FrameDecoder {
        &self.decoder
    }

    /// Number of samples held
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// True when no sample is held
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Decode and append one frame's payload, `elapsed_ms` into the run
    ///
    /// Returns a display point per stored sample. Samples over the cap are
    /// counted by the timing tracker but not stored.
    pub fn ingest(
        &mut self,
        payload: &[u8],
        frame_number: u8,
        elapsed_ms: Timestamp,
        ctx: &RemoteContext,
    ) -> Vec<LivePoint> {
        self.timing.another_frame(elapsed_ms);
        let raws = self.decoder.decode(payload);
        let mut points = Vec::with_capacity(raws.len());
        for (position, raw) in raws.into_iter().enumerate() {
            let point = self.append(raw.values, ctx);
            self.timing
                .another_sample(position, frame_number, point.is_some());
            points.extend(point);
        }
        points
    }

    fn at_capacity(&mut self) -> bool {
        let Some(cap) = self.max_samples else {
            return false;
        };
        if self.store.len() < cap {
            return false;
        }
        if !self.cap_reported {
            log_warn!("{} holds {} samples: dropping new samples", self.kind, cap);
            self.cap_reported = true;
        }
        true
    }

    fn append(&mut self, raw: Components, ctx: &RemoteContext) -> Option<LivePoint> {
        if self.at_capacity() {
            return None;
        }

        let index = self.store.len();
        let sps = self.samples_per_second;
        let time = index as f64 / sps - self.timing_shift;
        let mut cal = self.model.calibrate(&raw, sps);

        if let Some(wheel) = self.model.wheel() {
            if let Some((first, _)) = wheel.live_window(index, self.n_average) {
                let history = self.store.as_slice()[first..index]
                    .iter()
                    .enumerate()
                    .map(|(offset, s)| (first + offset, wheel_delta(&s.raw)));
                let deltas = history.chain(core::iter::once((index, wheel_delta(&raw))));
                if let Some(a) = cal.get_mut(2) {
                    *a = wheel.fit_acceleration(deltas, sps, self.timing_shift);
                }
            }
        }

        if ctx.reverse_y {
            apply_reversal(self.kind, &mut cal);
        }

        self.store.push(Sample {
            raw: raw.clone(),
            cal,
            ave: Components::new(),
            time,
        });

        let ave = self
            .store
            .time_average(self.n_average, Selector::cal(), 0)
            .cal_means(self.kind.axis_count());
        if let Some(last) = self.store.get_mut(index) {
            last.ave = ave.clone();
        }

        Some(LivePoint { time, raw, ave })
    }

    /// Recompute every calibrated value, time stamp and average
    ///
    /// Uses the measured sample rate when the timing tracker has one. A no-op
    /// (returning false) when fewer than `n_average` samples are held.
    pub fn recalibrate(&mut self, ctx: &RemoteContext) -> bool {
        let n = self.store.len();
        if n == 0 || n < self.n_average {
            log_debug!(
                "{} recalibration skipped: {} samples, window {}",
                self.kind,
                n,
                self.n_average
            );
            return false;
        }

        if let Some(sps) = self.timing.analyze(ctx.use_frame_timing) {
            if sps.is_finite() && sps > 0.0 {
                self.samples_per_second = sps;
            }
        }
        let sps = self.samples_per_second;
        log_info!(
            "{} analysis: nSamples {}, samplesPerSecond {}, timingShift {}",
            self.kind,
            n,
            sps,
            self.timing_shift
        );

        let old = self.store.as_slice();
        let mut rebuilt = Vec::with_capacity(n);
        for (i, sample) in old.iter().enumerate() {
            let mut cal = self.model.calibrate(&sample.raw, sps);

            if let Some(wheel) = self.model.wheel() {
                let (first, last) = wheel.centered_window(i, n, self.n_average);
                let deltas = (first..=last).map(|j| (j, wheel_delta(&old[j].raw)));
                if let Some(a) = cal.get_mut(2) {
                    *a = wheel.fit_acceleration(deltas, sps, self.timing_shift);
                }
            }

            if ctx.reverse_y {
                apply_reversal(self.kind, &mut cal);
            }

            rebuilt.push(Sample {
                raw: sample.raw.clone(),
                cal,
                ave: Components::new(),
                time: i as f64 / sps - self.timing_shift,
            });
        }

        let axes = self.kind.axis_count();
        let averages: Vec<Components> = (0..n)
            .map(|i| window_stats(&rebuilt, self.n_average, Selector::cal(), i).cal_means(axes))
            .collect();
        for (sample, ave) in rebuilt.iter_mut().zip(averages) {
            sample.ave = ave;
        }

        self.store.replace_all(rebuilt);
        true
    }

    /// Windowed statistics over this channel's history
    pub fn time_average(&self, n: usize, selector: Selector, anchor: usize) -> WindowStats {
        self.store.time_average(n, selector, anchor)
    }

    /// Mean raw vector over the newest `n` samples
    ///
    /// This is one calibration procedure reading.
    pub fn measure(&self, n: usize) -> IolabResult<Reading> {
        let stats = self.store.time_average(n, Selector::raw(), 0);
        if stats.count == 0 {
            return Err(IolabError::InsufficientHistory {
                required: MIN_WINDOW_SAMPLES,
                available: self.store.len(),
            });
        }
        Ok(core::array::from_fn(|axis| stats.raw[axis].mean))
    }

    /// The sensor's custom action
    ///
    /// Force probe: zero the reading at the current load. Wheel: restart the
    /// position from zero.
    pub fn custom_action(&mut self) -> IolabResult<()> {
        match self.kind {
            SensorKind::Force => {
                let stats = self.store.time_average(FORCE_ZERO_AVERAGE, Selector::raw(), 0);
                if stats.count == 0 {
                    return Err(IolabError::InsufficientHistory {
                        required: MIN_WINDOW_SAMPLES,
                        available: self.store.len(),
                    });
                }
                let offset = stats.raw[0].mean - NOMINAL_MIDPOINT;
                if let Some(axis) = self
                    .model
                    .linear_mut()
                    .and_then(|m| m.axes_mut().first_mut())
                {
                    axis.counts_offset = offset;
                }
                log_info!("force zeroed: countsOffset {:.4}", offset);
                Ok(())
            }
            SensorKind::Wheel => {
                self.decoder.zero_position();
                log_info!("wheel position zeroed");
                Ok(())
            }
            sensor => Err(IolabError::Unsupported {
                sensor,
                operation: "custom action",
            }),
        }
    }

    /// Derive constants from procedure measurements and save them
    ///
    /// Returns whether the calibration file was written. The in-memory model
    /// is only changed when the derivation succeeds.
    pub fn apply_procedure(
        &mut self,
        measurements: &Measurements,
        ctx: &RemoteContext,
    ) -> IolabResult<bool> {
        let unsupported = IolabError::Unsupported {
            sensor: self.kind,
            operation: "calibration procedure",
        };
        let Some(model) = self.model.linear_mut() else {
            return Err(unsupported);
        };

        match (self.kind, measurements) {
            (SensorKind::Accelerometer, Measurements::Orientations(readings)) => {
                let axes = procedure::accelerometer_axes(&readings.complete()?)?;
                install(model.axes_mut(), &axes);
            }
            (SensorKind::Magnetometer, Measurements::Orientations(readings)) => {
                let axes = procedure::magnetometer_axes(&readings.complete()?)?;
                install(model.axes_mut(), &axes);
            }
            (SensorKind::Gyroscope, Measurements::Orientations(readings)) => {
                let axes = procedure::gyroscope_axes(&readings.complete()?, model.axes());
                install(model.axes_mut(), &axes);
            }
            (SensorKind::Force, Measurements::Force(readings)) => {
                let axis = procedure::force_axis(*readings)?;
                install(model.axes_mut(), &[axis]);
            }
            _ => return Err(unsupported),
        }

        log_info!("{} calibration constants derived", self.kind);
        Ok(self.write_calibration(ctx))
    }

    /// Load constants from the calibration file
    ///
    /// Returns false (keeping the current constants) when the hardware ID is
    /// unknown, the file is missing or malformed, or the sensor has no file.
    pub fn read_calibration(&mut self, ctx: &RemoteContext) -> bool {
        if self.kind.calibration_field_count().is_none() {
            return false;
        }

        let record = match calfile::read_calibration(&ctx.calibration_dir, ctx.hardware_id, self.kind)
        {
            Ok(Some(record)) => record,
            Ok(None) => return false,
            Err(e) => {
                log_warn!("cannot read {} calibration data: {}", self.kind, e);
                return false;
            }
        };

        let kind = self.kind;
        if let Some(model) = self.model.linear_mut() {
            match kind {
                SensorKind::Gyroscope => model.load_file_offsets(&record.constants),
                SensorKind::Magnetometer => {
                    model.load_file_constants(&record.constants);
                    for axis in model.axes_mut() {
                        if axis.counts_per_unit < 0.0 {
                            axis.counts_per_unit = -axis.counts_per_unit;
                        }
                    }
                }
                _ => model.load_file_constants(&record.constants),
            }
        }

        if record.samples_per_second.is_finite() && record.samples_per_second > 0.0 {
            self.samples_per_second = record.samples_per_second;
        }
        self.timing_shift = record.timing_shift;
        true
    }

    /// Save the current constants to the calibration file
    pub fn write_calibration(&self, ctx: &RemoteContext) -> bool {
        let Some(model) = self.model.linear() else {
            return false;
        };
        if self.kind.calibration_field_count().is_none() {
            return false;
        }

        let record = CalibrationRecord {
            constants: model.file_constants(),
            samples_per_second: self.samples_per_second,
            timing_shift: self.timing_shift,
        };
        match calfile::write_calibration(&ctx.calibration_dir, ctx.hardware_id, self.kind, &record) {
            Ok(_) => true,
            Err(e) => {
                log_warn!("cannot save {} calibration data: {}", self.kind, e);
                false
            }
        }
    }

    /// Install barometer registers read from the device
    pub fn set_barometer_registers(&mut self, registers: BarometerRegisters) -> bool {
        self.model.set_barometer_registers(registers)
    }

    /// Install thermometer reference points read from the device
    pub fn set_thermometer_references(&mut self, cal_at_30: f64, cal_at_85: f64) -> bool {
        self.model.set_thermometer_references(cal_at_30, cal_at_85)
    }

    /// Recalibrate, then write the history to `{data_dir}/{Name}_{unique}`
    ///
    /// Returns the path of the text export.
    pub fn export(
        &mut self,
        ctx: &RemoteContext,
        unique: &str,
        format: ExportFormat,
    ) -> IolabResult<PathBuf> {
        self.recalibrate(ctx);

        let path = export::data_path(&ctx.data_dir, self.kind, unique, format);
        export::export_channel(&path, self.kind, self.n_average, self.store.as_slice(), format)?;

        if self.kind == SensorKind::Microphone {
            let bin = ctx
                .data_dir
                .join(format!("{}_{}.bin", self.kind.name(), unique));
            export::write_raw_binary(&bin, self.store.as_slice())?;
        }
        Ok(path)
    }

    /// Drop all samples and counters
    pub fn clear(&mut self) {
        self.store.clear();
        self.timing.clear();
        self.decoder.reset();
        self.cap_reported = false;
    }
}

fn install(dst: &mut [AxisCalibration], src: &[AxisCalibration]) {
    for (axis, derived) in dst.iter_mut().zip(src) {
        *axis = *derived;
    }
}

fn wheel_delta(raw: &Components) -> f64 {
    raw.get(1).copied().unwrap_or(0.0)
}

/// Shared, single-writer access to a channel
#[derive(Debug, Clone)]
pub struct ChannelHandle(Arc<Mutex<SensorChannel>>);

impl ChannelHandle {
    /// Wrap a channel for sharing
    pub fn new(channel: SensorChannel) -> Self {
        Self(Arc::new(Mutex::new(channel)))
    }

    /// Run `f` with exclusive access to the channel
    ///
    /// A panic in an earlier holder does not lock the channel out; the
    /// history it left behind is used as is.
    pub fn with<R>(&self, f: impl FnOnce(&mut SensorChannel) -> R) -> R {
        let mut guard = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }
}
