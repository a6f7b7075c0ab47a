//! Configured Remote
//!
//! ## Overview
//!
//! A [`Remote`] owns the channels of one remote for the configuration it was
//! set to. Configuring builds one [`SensorChannel`] per sensor in the fixed
//! configuration table, plus the RSSI channel every remote carries:
//!
//! ```text
//! Frame { frame_number, rssi, payloads[code] }
//!    │
//!    ├─► RSSI channel        ◄── [rssi]
//!    ├─► Accelerometer       ◄── payloads[0x01] (or nothing this frame)
//!    └─► ...
//! ```
//!
//! Every configured channel sees every frame, even when the frame carries no
//! samples for it, so frame-count timing stays correct. Payloads for sensors
//! the configuration does not enable are skipped.
//!
//! ## Threads
//!
//! Channels sit behind [`ChannelHandle`]s, so ingestion and recalibration
//! take `&self` and different channels may be driven from different threads.
//! Reconfiguring or changing the hardware ID needs `&mut self`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::channel::{ChannelHandle, SensorChannel};
use crate::config::RemoteContext;
use crate::configurations::{self, FixedConfiguration};
use crate::errors::{IolabError, IolabResult};
use crate::export::ExportFormat;
use crate::sensor::SensorKind;
use crate::time::TimeSource;

/// Frame rate of the radio link, and so the RSSI sample rate (Hz)
pub const FRAMES_PER_SECOND: f64 = 100.0;

/// One decoded radio frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    /// Rolling frame counter
    pub frame_number: u8,
    /// Received signal strength byte
    pub rssi: u8,
    /// Sensor payloads keyed by sensor type code
    pub payloads: Vec<(u8, Vec<u8>)>,
}

impl Frame {
    /// Empty frame
    pub fn new(frame_number: u8, rssi: u8) -> Self {
        Self {
            frame_number,
            rssi,
            payloads: Vec::new(),
        }
    }

    /// Add a payload for sensor code `code`
    pub fn with_payload(mut self, code: u8, bytes: Vec<u8>) -> Self {
        self.payloads.push((code, bytes));
        self
    }

    /// Payload bytes for `kind`, empty if the frame has none
    pub fn payload(&self, kind: SensorKind) -> &[u8] {
        self.payloads
            .iter()
            .find(|(code, _)| *code == kind.code())
            .map(|(_, bytes)| bytes.as_slice())
            .unwrap_or(&[])
    }
}

/// One remote and its configured channels
#[derive(Debug)]
pub struct Remote {
    context: RemoteContext,
    configuration: Option<&'static FixedConfiguration>,
    channels: BTreeMap<SensorKind, ChannelHandle>,
}

impl Remote {
    /// Unconfigured remote
    pub fn new(context: RemoteContext) -> Self {
        Self {
            context,
            configuration: None,
            channels: BTreeMap::new(),
        }
    }

    /// Remote context in use
    pub fn context(&self) -> &RemoteContext {
        &self.context
    }

    /// Active fixed configuration
    pub fn configuration(&self) -> Option<&'static FixedConfiguration> {
        self.configuration
    }

    /// Discard all channels
    pub fn clear(&mut self) {
        self.channels.clear();
        self.configuration = None;
    }

    /// Switch to fixed configuration `code`
    ///
    /// An unknown code leaves the current configuration in place.
    pub fn configure(&mut self, code: u8) -> IolabResult<()> {
        let configuration = configurations::lookup(code)?;
        self.clear();

        log_info!("configuring remote for {} ({})", configuration.name, code);
        self.insert(SensorChannel::new(SensorKind::Rssi, FRAMES_PER_SECOND, &self.context));
        for &(kind, rate) in configuration.sensors {
            self.insert(SensorChannel::new(kind, f64::from(rate), &self.context));
        }
        self.configuration = Some(configuration);
        Ok(())
    }

    fn insert(&mut self, channel: SensorChannel) {
        self.channels.insert(channel.kind(), ChannelHandle::new(channel));
    }

    /// Channel for `kind`, if configured
    pub fn channel(&self, kind: SensorKind) -> Option<&ChannelHandle> {
        self.channels.get(&kind)
    }

    /// Configured sensors in code order
    pub fn sensors(&self) -> impl Iterator<Item = SensorKind> + '_ {
        self.channels.keys().copied()
    }

    /// Route one frame to the channels; returns the number of samples stored
    pub fn ingest(&self, frame: &Frame, clock: &dyn TimeSource) -> usize {
        let elapsed = clock.now();

        for (code, bytes) in &frame.payloads {
            match SensorKind::try_from(*code) {
                Err(e) => log_debug!("skipping {} bytes: {}", bytes.len(), e),
                Ok(kind) if !self.channels.contains_key(&kind) => {
                    log_debug!("skipping {} bytes for unconfigured {}", bytes.len(), kind)
                }
                Ok(_) => {}
            }
        }

        let rssi = [frame.rssi];
        let mut stored = 0;
        for (&kind, handle) in &self.channels {
            let payload = if kind == SensorKind::Rssi {
                &rssi[..]
            } else {
                frame.payload(kind)
            };
            stored += handle.with(|ch| {
                if !ch.is_active() {
                    return 0;
                }
                ch.ingest(payload, frame.frame_number, elapsed, &self.context)
                    .len()
            });
        }
        stored
    }

    /// Recalibrate every channel; returns how many had enough history
    pub fn recalibrate_all(&self) -> usize {
        self.channels
            .values()
            .filter(|h| h.with(|ch| ch.recalibrate(&self.context)))
            .count()
    }

    /// Export every channel holding samples
    pub fn export_all(&self, unique: &str, format: ExportFormat) -> IolabResult<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for handle in self.channels.values() {
            let path = handle.with(|ch| {
                if ch.is_empty() {
                    return Ok(None);
                }
                ch.export(&self.context, unique, format).map(Some)
            })?;
            paths.extend(path);
        }
        Ok(paths)
    }

    /// Apply an averaging command `"{SensorName}, {N}"`
    pub fn apply_averaging_command(&self, command: &str) -> IolabResult<()> {
        let mut parts = command.split(',');
        let (Some(name), Some(n)) = (parts.next(), parts.next()) else {
            return Err(IolabError::Config(format!(
                "averaging command {command:?} needs a sensor name and a window"
            )));
        };

        let kind = SensorKind::from_name(name)
            .ok_or_else(|| IolabError::Config(format!("unknown sensor {:?}", name.trim())))?;
        let n: usize = n
            .trim()
            .parse()
            .map_err(|_| IolabError::Config(format!("bad averaging window {:?}", n.trim())))?;
        let handle = self
            .channel(kind)
            .ok_or_else(|| IolabError::Config(format!("{kind} is not configured")))?;

        handle.with(|ch| ch.set_n_average(n));
        log_info!("{} averaging window set to {}", kind, n);
        Ok(())
    }

    /// Record the hardware ID read from the remote
    ///
    /// Channels with a calibration file re-read it.
    pub fn set_hardware_id(&mut self, hardware_id: u32) {
        self.context.hardware_id = hardware_id;
        log_info!("remote hardware ID 0x{:06x}", hardware_id);
        for (kind, handle) in &self.channels {
            if kind.calibration_field_count().is_some() {
                handle.with(|ch| ch.read_calibration(&self.context));
            }
        }
    }
}
