//! Wire-format payload encoders
//!
//! Each encoder is the inverse of the decoder layout for its sensor, so a
//! test can start from the raw values it wants the channel to see.

/// Big-endian 16-bit words
pub fn encode_words(words: &[i16]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_be_bytes()).collect()
}

/// Accelerometer/gyroscope sample that decodes to `(x, y, z)`
///
/// The decoder yields `(-w2, w1, w3)`.
pub fn encode_rotated(x: i16, y: i16, z: i16) -> Vec<u8> {
    encode_words(&[y, x.wrapping_neg(), z])
}

/// Magnetometer sample that decodes to `(x, y, z)`
pub fn encode_magnetometer(x: i16, y: i16, z: i16) -> Vec<u8> {
    encode_words(&[x.wrapping_neg(), y.wrapping_neg(), z.wrapping_neg()])
}

/// Barometer sample with 10-bit P and T counts
pub fn encode_barometer(p: u16, t: u16) -> Vec<u8> {
    let mut out = Vec::with_capacity(4);
    out.extend_from_slice(&((p & 0x3FF) << 6).to_be_bytes());
    out.extend_from_slice(&((t & 0x3FF) << 6).to_be_bytes());
    out
}

/// Thermometer accumulator
pub fn encode_thermometer(accumulator: u32) -> Vec<u8> {
    accumulator.to_be_bytes().to_vec()
}

/// Repeat one sample payload `n` times
pub fn repeat(sample: &[u8], n: usize) -> Vec<u8> {
    sample.iter().copied().cycle().take(sample.len() * n).collect()
}
