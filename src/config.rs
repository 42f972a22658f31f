// SPDX-License-Identifier: GPL-3.0-only

//! User configuration handling
//!
//! Configuration is stored as JSON under the user's config directory
//! (`~/.config/gesture-capture/config.json`). Missing or unreadable files
//! fall back to defaults; saving creates the directory as needed.

use crate::constants::{countdown, photo};
use crate::errors::SessionError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Output format for captured stills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PhotoOutputFormat {
    /// JPEG (lossy, small files)
    #[default]
    Jpeg,
    /// PNG (lossless)
    Png,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Countdown length in ticks once the pose is confirmed
    pub countdown_ticks: u32,
    /// Last used camera device path
    pub last_camera_path: Option<String>,
    /// Output format for captured stills
    pub output_format: PhotoOutputFormat,
    /// JPEG encoding quality (0-100; ignored for PNG)
    pub jpeg_quality: u8,
    /// Directory captured stills are saved to (default: ~/Pictures/gesture-capture)
    pub output_dir: Option<PathBuf>,
    /// Mirror frames horizontally before capture (selfie mode)
    pub mirror: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            countdown_ticks: countdown::DEFAULT_TICKS,
            last_camera_path: None,
            output_format: PhotoOutputFormat::default(),
            jpeg_quality: photo::DEFAULT_JPEG_QUALITY,
            output_dir: None,
            // The saved still is unmirrored; mirroring is an opt-in knob
            mirror: false,
        }
    }
}

impl Config {
    /// Path of the on-disk configuration file
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("gesture-capture").join("config.json"))
    }

    /// Load the configuration, falling back to defaults on any failure
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            return Self::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    debug!(path = ?path, "Loaded configuration");
                    config
                }
                Err(e) => {
                    warn!(path = ?path, error = %e, "Invalid configuration, using defaults");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Persist the configuration to disk
    pub fn save(&self) -> Result<(), SessionError> {
        let path = Self::path()
            .ok_or_else(|| SessionError::Config("No config directory available".to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| SessionError::Config(e.to_string()))?;
        std::fs::write(&path, contents)?;

        debug!(path = ?path, "Saved configuration");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_countdown() {
        let config = Config::default();
        assert_eq!(config.countdown_ticks, countdown::DEFAULT_TICKS);
        assert!(!config.mirror);
    }

    #[test]
    fn test_roundtrip_json() {
        let mut config = Config::default();
        config.countdown_ticks = 5;
        config.last_camera_path = Some("/dev/video2".to_string());

        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        // Older config files without newer fields still parse
        let parsed: Config = serde_json::from_str(r#"{"countdown_ticks": 4}"#).unwrap();
        assert_eq!(parsed.countdown_ticks, 4);
        assert_eq!(parsed.jpeg_quality, photo::DEFAULT_JPEG_QUALITY);
    }
}
