// SPDX-License-Identifier: GPL-3.0-only

//! Persistent user configuration
//!
//! Stored as JSON at `~/.config/intervalcam/config.json`. A missing file
//! means defaults; unknown or missing keys fall back to their defaults so
//! older files keep loading.

use crate::constants::DEFAULT_INTERVAL_MINUTES;
use crate::errors::ConfigError;
use crate::pipelines::photo::{EncodingFormat, EncodingQuality};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Config directory name under the platform config dir
const APP_DIR: &str = "intervalcam";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Current config schema version
pub const CONFIG_VERSION: u32 = 1;

/// Where frames come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CameraSource {
    /// V4L2 device node, e.g. `/dev/video0`
    V4l2 { device: PathBuf },
    /// Still image replayed on every capture
    File { path: PathBuf },
}

impl Default for CameraSource {
    fn default() -> Self {
        CameraSource::V4l2 {
            device: PathBuf::from("/dev/video0"),
        }
    }
}

/// Torch usage for the countdown signal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashSetting {
    /// Use every writable flash LED that is detected
    #[default]
    Auto,
    /// Never touch the LEDs; the countdown still runs its timing
    Off,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Schema version of the file
    pub version: u32,
    /// Minutes between capture ticks
    pub interval_minutes: f64,
    /// Directory photos are written to
    pub photo_dir: PathBuf,
    /// Output encoding (JPEG or PNG)
    pub photo_format: EncodingFormat,
    /// JPEG quality preset
    pub photo_quality: EncodingQuality,
    /// Frame source
    pub camera: CameraSource,
    /// Torch usage
    pub flash: FlashSetting,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            interval_minutes: DEFAULT_INTERVAL_MINUTES,
            photo_dir: default_photo_dir(),
            photo_format: EncodingFormat::default(),
            photo_quality: EncodingQuality::default(),
            camera: CameraSource::default(),
            flash: FlashSetting::default(),
        }
    }
}

/// Default photo directory (`~/Pictures/intervalcam`)
pub fn default_photo_dir() -> PathBuf {
    dirs::picture_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join(APP_DIR)
}

impl Config {
    /// Default config file location
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load from the default location
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load from a file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config: Config = serde_json::from_str(&contents)?;
        debug!(path = %path.display(), version = config.version, "Loaded config");
        Ok(config)
    }

    /// Save to a file, creating its parent directory
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "Config saved");
        Ok(())
    }
}
