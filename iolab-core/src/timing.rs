//! Packet timing and sample-rate estimation
//!
//! ## Overview
//!
//! The remote sends one frame every 10 ms, each carrying a variable number
//! of samples per sensor. Counting frames and samples as they arrive gives
//! two estimates of the true per-sensor sample rate:
//!
//! ```text
//! frame timing:   msPerSample = totalFrames * msPerFrame / totalSamples
//! elapsed timing: msPerSample = elapsedMs / totalSamples
//! ```
//!
//! Frame timing is immune to host scheduling jitter and is the default.
//! Elapsed timing uses the run timer stamp of the latest frame.
//!
//! ## Live vs. Finalized Rate
//!
//! While frames stream in, calibrated samples are time stamped with the
//! channel's nominal rate. Only [`PacketTimingTracker::analyze`] produces the
//! measured rate, and it is consumed by a full recalibration pass. The two
//! differ slightly and that difference is expected.

use crate::time::Timestamp;

/// Frame period of the radio link
pub const DEFAULT_MS_PER_FRAME: f64 = 10.0;

/// Where one sample sat in the frame stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketRecord {
    /// Frame counter byte carried by the frame
    pub frame_number: u8,
    /// Run timer reading when the frame arrived
    pub frame_time_ms: Timestamp,
    /// 1-based position of the sample within its frame
    pub sample_in_frame: usize,
}

/// Frame/sample counters for one channel
#[derive(Debug, Clone, PartialEq)]
pub struct PacketTimingTracker {
    total_frames: u64,
    total_samples: u64,
    elapsed_ms: Timestamp,
    ms_per_frame: f64,

    ms_per_sample: f64,
    samples_per_second: f64,
    frames_per_second: f64,
    samples_per_frame: f64,

    records: Vec<PacketRecord>,
}

impl Default for PacketTimingTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketTimingTracker {
    /// Tracker for the standard 10 ms frame period
    pub fn new() -> Self {
        Self::with_ms_per_frame(DEFAULT_MS_PER_FRAME)
    }

    /// Tracker for a non-standard frame period
    pub fn with_ms_per_frame(ms_per_frame: f64) -> Self {
        Self {
            total_frames: 0,
            total_samples: 0,
            elapsed_ms: 0,
            ms_per_frame,
            ms_per_sample: 0.0,
            samples_per_second: 0.0,
            frames_per_second: 0.0,
            samples_per_frame: 0.0,
            records: Vec::new(),
        }
    }

    /// A frame arrived `elapsed_ms` into the run
    pub fn another_frame(&mut self, elapsed_ms: Timestamp) {
        self.total_frames += 1;
        self.elapsed_ms = elapsed_ms;
    }

    /// Sample at 0-based `position` of the current frame arrived
    ///
    /// Every sample counts toward the rate. Only `stored` samples enter the
    /// arrival log, so the log never outgrows the channel history.
    pub fn another_sample(&mut self, position: usize, frame_number: u8, stored: bool) {
        self.total_samples += 1;
        if stored {
            self.records.push(PacketRecord {
                frame_number,
                frame_time_ms: self.elapsed_ms,
                sample_in_frame: position + 1,
            });
        }
    }

    /// Finalize the rate estimate
    ///
    /// Returns the measured samples per second, or `None` when no sample has
    /// been recorded yet (the previous rates are left untouched).
    pub fn analyze(&mut self, use_frame_timing: bool) -> Option<f64> {
        if self.total_samples == 0 {
            return None;
        }

        self.ms_per_sample = if use_frame_timing {
            (self.total_frames as f64 * self.ms_per_frame) / self.total_samples as f64
        } else {
            self.elapsed_ms as f64 / self.total_samples as f64
        };

        self.samples_per_second = 1000.0 / self.ms_per_sample;
        self.frames_per_second = 1000.0 / self.ms_per_frame;
        self.samples_per_frame = self.total_samples as f64 / self.total_frames as f64;

        log_debug!(
            "analyzing packets: samples {}, frames {}, time {} ms",
            self.total_samples,
            self.total_frames,
            self.elapsed_ms
        );

        Some(self.samples_per_second)
    }

    /// Reset counters and rates, restoring the default frame period
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Frames seen so far
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Samples seen so far
    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }

    /// Run timer stamp of the latest frame
    pub fn elapsed_ms(&self) -> Timestamp {
        self.elapsed_ms
    }

    /// Frame period in milliseconds
    pub fn ms_per_frame(&self) -> f64 {
        self.ms_per_frame
    }

    /// Milliseconds per sample from the last analysis
    pub fn ms_per_sample(&self) -> f64 {
        self.ms_per_sample
    }

    /// Samples per second from the last analysis
    pub fn samples_per_second(&self) -> f64 {
        self.samples_per_second
    }

    /// Frames per second from the last analysis
    pub fn frames_per_second(&self) -> f64 {
        self.frames_per_second
    }

    /// Mean samples per frame from the last analysis
    pub fn samples_per_frame(&self) -> f64 {
        self.samples_per_frame
    }

    /// Arrival log of the stored samples
    pub fn records(&self) -> &[PacketRecord] {
        &self.records
    }
}
