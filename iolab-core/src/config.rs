//! Remote context and channel settings
//!
//! Everything a channel needs to know about the remote it belongs to travels
//! in a [`RemoteContext`] passed into each call. Nothing is read from global
//! state.
//!
//! ## Example
//!
//! ```rust
//! use iolab_core::config::RemoteContext;
//!
//! let ctx = RemoteContext::from_json_str(r#"{
//!     "hardware_id": 4660,
//!     "reverse_y": true,
//!     "channels": { "Accelerometer": { "n_average": 10 } }
//! }"#)?;
//! assert_eq!(ctx.hardware_id, 0x1234);
//! assert!(ctx.use_frame_timing);
//! # Ok::<(), iolab_core::IolabError>(())
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{IolabError, IolabResult};
use crate::sensor::SensorKind;

/// Default calibration directory
pub const DEFAULT_CALIBRATION_DIR: &str = "Calibration/CalData";
/// Default export directory
pub const DEFAULT_DATA_DIR: &str = "IOLabData";

/// Per-channel overrides, keyed by sensor name in [`RemoteContext::channels`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelSettings {
    /// Averaging window instead of the sensor default
    pub n_average: Option<usize>,
    /// Nominal sample rate instead of the configuration table's
    pub nominal_rate: Option<f64>,
}

/// The remote's identity and run options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteContext {
    /// Hardware ID read from the remote (0 = not yet known)
    pub hardware_id: u32,
    /// Negate the y axis (and the 1-D sensors that follow it)
    pub reverse_y: bool,
    /// Estimate sample rates from frame counts rather than elapsed time
    pub use_frame_timing: bool,
    /// Where calibration files live
    pub calibration_dir: PathBuf,
    /// Where exports are written
    pub data_dir: PathBuf,
    /// Per-channel sample cap (`None` = unbounded)
    pub max_samples: Option<usize>,
    /// Overrides by sensor name
    pub channels: BTreeMap<String, ChannelSettings>,
}

impl Default for RemoteContext {
    fn default() -> Self {
        Self {
            hardware_id: 0,
            reverse_y: false,
            use_frame_timing: true,
            calibration_dir: PathBuf::from(DEFAULT_CALIBRATION_DIR),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            max_samples: None,
            channels: BTreeMap::new(),
        }
    }
}

impl RemoteContext {
    /// Context for a remote whose hardware ID is known
    pub fn new(hardware_id: u32) -> Self {
        Self {
            hardware_id,
            ..Self::default()
        }
    }

    /// Set the calibration directory
    pub fn calibration_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.calibration_dir = dir.into();
        self
    }

    /// Set the export directory
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Enable or disable y-axis reversal
    pub fn reverse_y(mut self, reverse: bool) -> Self {
        self.reverse_y = reverse;
        self
    }

    /// Cap the samples held per channel
    pub fn max_samples(mut self, cap: usize) -> Self {
        self.max_samples = Some(cap);
        self
    }

    /// Override settings for one sensor
    pub fn channel(mut self, kind: SensorKind, settings: ChannelSettings) -> Self {
        self.channels.insert(kind.name().to_string(), settings);
        self
    }

    /// Overrides for `kind`, if any
    pub fn settings_for(&self, kind: SensorKind) -> Option<&ChannelSettings> {
        self.channels.get(kind.name())
    }

    /// Parse and validate a JSON context
    pub fn from_json_str(json: &str) -> IolabResult<Self> {
        let ctx: Self =
            serde_json::from_str(json).map_err(|e| IolabError::Config(e.to_string()))?;
        ctx.validate()?;
        Ok(ctx)
    }

    /// Load and validate a JSON context file
    pub fn load(path: impl AsRef<Path>) -> IolabResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| IolabError::io(path, e))?;
        Self::from_json_str(&text)
    }

    /// Reject settings no channel could run with
    pub fn validate(&self) -> IolabResult<()> {
        if self.max_samples == Some(0) {
            return Err(IolabError::Config("max_samples must be at least 1".into()));
        }

        for (name, settings) in &self.channels {
            if SensorKind::from_name(name).is_none() {
                return Err(IolabError::Config(format!("unknown sensor name {name:?}")));
            }
            if let Some(rate) = settings.nominal_rate {
                if !(rate.is_finite() && rate > 0.0) {
                    return Err(IolabError::Config(format!(
                        "{name}: nominal_rate must be positive, got {rate}"
                    )));
                }
            }
        }
        Ok(())
    }
}
