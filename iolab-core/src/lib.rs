//! Telemetry pipeline for IOLab remotes
//!
//! Turns raw sensor payloads from a remote into calibrated, time-stamped
//! samples with windowed statistics, and recomputes the whole history once
//! the real sample rate is known.
//!
//! Key properties:
//! - Bit-exact per-sensor payload layouts
//! - One generic channel engine for every sensor type
//! - Live and recalibrated values computed by the same windowing rules
//!
//! ```no_run
//! use iolab_core::{Frame, Remote, RemoteContext, SensorKind};
//! use iolab_core::time::RunTimer;
//!
//! let mut remote = Remote::new(RemoteContext::new(0x0001a3));
//! remote.configure(2)?; // accelerometer at 400 Hz
//!
//! let timer = RunTimer::start();
//! let frame = Frame::new(0, 200).with_payload(SensorKind::Accelerometer.code(), vec![0; 6]);
//! remote.ingest(&frame, &timer);
//!
//! remote.recalibrate_all();
//! # Ok::<(), iolab_core::IolabError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod macros;

pub mod barometer;
pub mod calfile;
pub mod calibration;
pub mod channel;
pub mod config;
pub mod configurations;
pub mod decode;
pub mod errors;
pub mod export;
pub mod remote;
pub mod sensor;
pub mod stats;
pub mod store;
pub mod time;
pub mod timing;
pub mod wheel;

// Public API
pub use calibration::CalibrationModel;
pub use channel::{ChannelHandle, LivePoint, SensorChannel};
pub use config::{ChannelSettings, RemoteContext};
pub use decode::{Components, FrameDecoder, RawSample};
pub use errors::{IolabError, IolabResult};
pub use export::ExportFormat;
pub use remote::{Frame, Remote};
pub use sensor::SensorKind;
pub use store::{Sample, SampleStore, Selector, WindowStats};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
