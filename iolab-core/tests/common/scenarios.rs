//! Frame streaming scenarios

use iolab_core::remote::FRAMES_PER_SECOND;
use iolab_core::time::FixedTime;
use iolab_core::{Frame, Remote, SensorKind};

/// Milliseconds between frames
pub const FRAME_MS: u64 = (1000.0 / FRAMES_PER_SECOND) as u64;

/// Stream `frames` frames built by `build`, advancing the clock 10 ms each
///
/// Returns the total number of samples stored.
pub fn stream<F>(remote: &Remote, clock: &FixedTime, frames: usize, mut build: F) -> usize
where
    F: FnMut(u8) -> Frame,
{
    let mut stored = 0;
    for i in 0..frames {
        let frame_number = (i % 256) as u8;
        stored += remote.ingest(&build(frame_number), clock);
        clock.advance(FRAME_MS);
    }
    stored
}

/// Frame carrying one payload for `kind`
pub fn single_payload(frame_number: u8, kind: SensorKind, bytes: Vec<u8>) -> Frame {
    Frame::new(frame_number, 200).with_payload(kind.code(), bytes)
}
