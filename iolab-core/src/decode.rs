//! Frame Decoder
//!
//! ## Overview
//!
//! Each frame carries, per sensor, a run of fixed-width big-endian samples.
//! The decoder turns one sensor's payload into [`RawSample`]s:
//!
//! | Sensor | Bytes | Layout |
//! |--------|-------|--------|
//! | Accelerometer, Gyroscope | 6 | words w1 w2 w3 -> (-w2, w1, w3) |
//! | Magnetometer | 6 | (-w1, -w2, -w3) |
//! | ECG | 6 | (w1, w2, w3) |
//! | Force, Light, Microphone, Battery, HighGain, Analog7-9 | 2 | one signed word |
//! | Barometer | 4 | P = (w1 >> 6) & 0x3FF, T = (w2 >> 6) & 0x3FF |
//! | Thermometer | 4 | u32 accumulator * thisRate / rawRate |
//! | Wheel | 2 | signed delta count, running position |
//! | Digital, RSSI | 1 | unsigned byte |
//!
//! Words are read as unsigned 16-bit values and reinterpreted as `i16`;
//! negation happens on the 16-bit value, so `-0x8000` wraps to itself.
//!
//! ## Trailing Bytes
//!
//! A payload whose length is not a multiple of the sample width yields
//! `len / width` samples. The leftover bytes are dropped without error.
//!
//! ## Wheel State
//!
//! The wheel reports velocity as delta counts. The decoder keeps the running
//! position and the previous delta, so a wheel sample is `(r, dr, dv)`:
//! position, delta, and change of delta. All three are exact integers.

use heapless::Vec as HVec;

use crate::sensor::{SensorKind, MAX_AXES};

/// Value components of one sample
pub type Components = HVec<f64, MAX_AXES>;

/// Thermometer hardware sample rate (Hz)
pub const THERMOMETER_RAW_RATE: f64 = 400.0;
/// Thermometer reporting rate used when none is configured (Hz)
pub const THERMOMETER_DEFAULT_RATE: f64 = 50.0;

/// Build a component vector from a fixed-size array
pub fn components<const N: usize>(values: [f64; N]) -> Components {
    let mut out = Components::new();
    for value in values.into_iter().take(MAX_AXES) {
        // capacity checked by take()
        let _ = out.push(value);
    }
    out
}

/// One decoded, uncalibrated sample
#[derive(Debug, Clone, PartialEq)]
pub struct RawSample {
    /// Position in the channel's decoded stream
    pub index: usize,
    /// Raw components in axis order
    pub values: Components,
}

/// Number of whole samples in a payload of `len` bytes
pub fn sample_count(kind: SensorKind, len: usize) -> usize {
    len / kind.bytes_per_sample()
}

#[inline]
fn word(chunk: &[u8], i: usize) -> u16 {
    u16::from_be_bytes([chunk[2 * i], chunk[2 * i + 1]])
}

#[inline]
fn signed(w: u16) -> f64 {
    f64::from(w as i16)
}

#[inline]
fn negated(w: u16) -> f64 {
    f64::from(w.wrapping_neg() as i16)
}

/// Per-channel payload decoder
#[derive(Debug, Clone, PartialEq)]
pub struct FrameDecoder {
    kind: SensorKind,
    this_rate: f64,
    raw_rate: f64,
    position: i32,
    last_velocity: i32,
    decoded: usize,
}

impl FrameDecoder {
    /// Decoder for one sensor type
    pub fn new(kind: SensorKind) -> Self {
        Self {
            kind,
            this_rate: THERMOMETER_DEFAULT_RATE,
            raw_rate: THERMOMETER_RAW_RATE,
            position: 0,
            last_velocity: 0,
            decoded: 0,
        }
    }

    /// Set the thermometer's reporting rate (ignored by other sensors)
    pub fn with_thermometer_rate(mut self, this_rate: f64) -> Self {
        self.this_rate = this_rate;
        self
    }

    /// Sensor this decoder reads
    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    /// Samples decoded since creation or the last reset
    pub fn decoded(&self) -> usize {
        self.decoded
    }

    /// Current wheel position in counts
    pub fn position(&self) -> i32 {
        self.position
    }

    /// Restart the wheel position from zero
    pub fn zero_position(&mut self) {
        self.position = 0;
    }

    /// Drop all stream state
    pub fn reset(&mut self) {
        self.position = 0;
        self.last_velocity = 0;
        self.decoded = 0;
    }

    /// Decode one sensor payload
    pub fn decode(&mut self, bytes: &[u8]) -> Vec<RawSample> {
        let width = self.kind.bytes_per_sample();
        let mut out = Vec::with_capacity(bytes.len() / width);
        for chunk in bytes.chunks_exact(width) {
            let values = self.decode_one(chunk);
            out.push(RawSample {
                index: self.decoded,
                values,
            });
            self.decoded += 1;
        }
        out
    }

    fn decode_one(&mut self, chunk: &[u8]) -> Components {
        match self.kind {
            SensorKind::Accelerometer | SensorKind::Gyroscope => components([
                negated(word(chunk, 1)),
                signed(word(chunk, 0)),
                signed(word(chunk, 2)),
            ]),
            SensorKind::Magnetometer => components([
                negated(word(chunk, 0)),
                negated(word(chunk, 1)),
                negated(word(chunk, 2)),
            ]),
            SensorKind::Ecg => components([
                signed(word(chunk, 0)),
                signed(word(chunk, 1)),
                signed(word(chunk, 2)),
            ]),
            SensorKind::Barometer => components([
                f64::from((word(chunk, 0) >> 6) & 0x3FF),
                f64::from((word(chunk, 1) >> 6) & 0x3FF),
            ]),
            SensorKind::Thermometer => {
                let acc = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                components([f64::from(acc) * self.this_rate / self.raw_rate])
            }
            SensorKind::Wheel => {
                let dr = i32::from(word(chunk, 0) as i16);
                self.position = self.position.wrapping_add(dr);
                let dv = dr - self.last_velocity;
                self.last_velocity = dr;
                components([f64::from(self.position), f64::from(dr), f64::from(dv)])
            }
            SensorKind::Digital | SensorKind::Rssi => components([f64::from(chunk[0])]),
            SensorKind::Force
            | SensorKind::Light
            | SensorKind::Microphone
            | SensorKind::Battery
            | SensorKind::HighGain
            | SensorKind::Analog7
            | SensorKind::Analog8
            | SensorKind::Analog9 => components([signed(word(chunk, 0))]),
        }
    }
}

/// Spacing between stacked digital traces
pub const DIGITAL_HIGH_LEVEL: f64 = 0.75;

/// The eight header lines of a digital sample, bit `i` = line `i`
pub fn digital_lines(raw: f64) -> [bool; 8] {
    let byte = raw as u8;
    core::array::from_fn(|bit| (byte >> bit) & 1 == 1)
}

/// Display level of each digital line: `i + 0.75` when high, `i` when low
pub fn digital_levels(raw: f64) -> [f64; 8] {
    let lines = digital_lines(raw);
    core::array::from_fn(|bit| bit as f64 + if lines[bit] { DIGITAL_HIGH_LEVEL } else { 0.0 })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(samples: &[RawSample]) -> Vec<Vec<f64>> {
        samples.iter().map(|s| s.values.to_vec()).collect()
    }

    #[test]
    fn accelerometer_swaps_and_negates() {
        let mut dec = FrameDecoder::new(SensorKind::Accelerometer);
        // w1 = 0x0102, w2 = 0x0010, w3 = 0xFFFF
        let out = dec.decode(&[0x01, 0x02, 0x00, 0x10, 0xFF, 0xFF]);
        assert_eq!(values(&out), vec![vec![-16.0, 258.0, -1.0]]);
    }

    #[test]
    fn magnetometer_negates_everything() {
        let mut dec = FrameDecoder::new(SensorKind::Magnetometer);
        let out = dec.decode(&[0x00, 0x05, 0xFF, 0xFB, 0x80, 0x00]);
        // -0x8000 wraps to itself in 16 bits
        assert_eq!(values(&out), vec![vec![-5.0, 5.0, -32768.0]]);
    }

    #[test]
    fn ecg_keeps_wire_order() {
        let mut dec = FrameDecoder::new(SensorKind::Ecg);
        let out = dec.decode(&[0x07, 0xFF, 0x00, 0x01, 0x80, 0x01]);
        assert_eq!(values(&out), vec![vec![2047.0, 1.0, -32767.0]]);
    }

    #[test]
    fn barometer_keeps_ten_bits() {
        let mut dec = FrameDecoder::new(SensorKind::Barometer);
        // 0xFFFF >> 6 = 0x3FF, 0x7D40 >> 6 = 0x1F5
        let out = dec.decode(&[0xFF, 0xFF, 0x7D, 0x40]);
        assert_eq!(values(&out), vec![vec![1023.0, 501.0]]);
    }

    #[test]
    fn thermometer_scales_accumulator() {
        let mut dec = FrameDecoder::new(SensorKind::Thermometer);
        // 16328 summed over 8 hardware samples at 50 Hz reporting
        let out = dec.decode(&16328u32.to_be_bytes());
        assert_eq!(values(&out), vec![vec![2041.0]]);

        let mut dec = FrameDecoder::new(SensorKind::Thermometer).with_thermometer_rate(100.0);
        let out = dec.decode(&8164u32.to_be_bytes());
        assert_eq!(values(&out), vec![vec![2041.0]]);
    }

    #[test]
    fn wheel_integrates_deltas() {
        let mut dec = FrameDecoder::new(SensorKind::Wheel);
        let out = dec.decode(&[0x00, 0x03, 0x00, 0x05, 0xFF, 0xFE]);
        assert_eq!(
            values(&out),
            vec![vec![3.0, 3.0, 3.0], vec![8.0, 5.0, 2.0], vec![6.0, -2.0, -7.0]]
        );

        dec.zero_position();
        let out = dec.decode(&[0x00, 0x01]);
        assert_eq!(values(&out), vec![vec![1.0, 1.0, 3.0]]);
    }

    #[test]
    fn single_byte_sensors_are_unsigned() {
        let mut dec = FrameDecoder::new(SensorKind::Digital);
        let out = dec.decode(&[0x00, 0xA5]);
        assert_eq!(values(&out), vec![vec![0.0], vec![165.0]]);

        let mut dec = FrameDecoder::new(SensorKind::Rssi);
        assert_eq!(values(&dec.decode(&[200])), vec![vec![200.0]]);
    }

    #[test]
    fn trailing_partial_sample_is_dropped() {
        let mut dec = FrameDecoder::new(SensorKind::Force);
        let out = dec.decode(&[0x07, 0xFF, 0x08, 0x00, 0x09]);
        assert_eq!(out.len(), 2);
        assert_eq!(sample_count(SensorKind::Force, 5), 2);
        assert_eq!(values(&out), vec![vec![2047.0], vec![2048.0]]);
    }

    #[test]
    fn indices_continue_across_frames() {
        let mut dec = FrameDecoder::new(SensorKind::Light);
        let first = dec.decode(&[0, 1, 0, 2]);
        let second = dec.decode(&[0, 3]);
        assert_eq!(first[1].index, 1);
        assert_eq!(second[0].index, 2);
        assert_eq!(dec.decoded(), 3);

        dec.reset();
        assert_eq!(dec.decode(&[0, 4])[0].index, 0);
    }

    #[test]
    fn digital_lines_and_levels() {
        let lines = digital_lines(0b1000_0101 as f64);
        assert_eq!(lines, [true, false, true, false, false, false, false, true]);

        let levels = digital_levels(0b0000_0011 as f64);
        assert_eq!(levels[0], 0.75);
        assert_eq!(levels[1], 1.75);
        assert_eq!(levels[2], 2.0);
    }
}
