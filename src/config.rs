// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Stored as JSON under the user's config directory. A missing file means
//! defaults; a malformed or out-of-range file is an error the caller reports.

use crate::constants::{self, sampler, throttle, thresholds};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Region-of-interest and percentile settings for the depth sampler
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Fraction of frame width and height covered by the centered region
    pub roi_fraction: f32,
    /// Minimum region edge length in pixels
    pub min_roi_pixels: u32,
    /// Near-edge percentile reported as the distance (0.0 - 1.0)
    pub percentile: f32,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            roi_fraction: sampler::ROI_FRACTION,
            min_roi_pixels: sampler::MIN_ROI_PIXELS,
            percentile: sampler::PERCENTILE,
        }
    }
}

/// Rate, delta and announcement decay settings for the feedback throttle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Minimum spacing between accepted samples (milliseconds)
    pub min_interval_ms: u64,
    /// Skip samples that barely moved since the last processed one
    pub delta_gate_enabled: bool,
    /// Minimum change for the delta gate (millimeters)
    pub min_delta_mm: u32,
    /// Announcement mute window per level (milliseconds)
    pub announcement_decay_ms: u64,
}

impl ThrottleConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    pub fn min_delta_m(&self) -> f32 {
        self.min_delta_mm as f32 / 1000.0
    }

    pub fn announcement_decay(&self) -> Duration {
        Duration::from_millis(self.announcement_decay_ms)
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: throttle::MIN_INTERVAL.as_millis() as u64,
            delta_gate_enabled: throttle::DELTA_GATE_ENABLED,
            min_delta_mm: (throttle::MIN_DELTA_M * 1000.0).round() as u32,
            announcement_decay_ms: throttle::ANNOUNCEMENT_DECAY.as_millis() as u64,
        }
    }
}

/// Inclusive distance ceilings for each urgency level (meters)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrgencyThresholds {
    pub notice_m: f32,
    pub alert_m: f32,
    pub urgent_m: f32,
}

impl Default for UrgencyThresholds {
    fn default() -> Self {
        Self {
            notice_m: thresholds::NOTICE_M,
            alert_m: thresholds::ALERT_M,
            urgent_m: thresholds::URGENT_M,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Depth sampler settings
    pub sampler: SamplerConfig,
    /// Feedback throttle settings
    pub throttle: ThrottleConfig,
    /// Urgency level distance thresholds
    pub thresholds: UrgencyThresholds,
    /// Vibration feedback enabled
    pub haptics_enabled: bool,
    /// Spoken feedback enabled
    pub voice_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sampler: SamplerConfig::default(),
            throttle: ThrottleConfig::default(),
            thresholds: UrgencyThresholds::default(),
            haptics_enabled: true,
            voice_enabled: true,
        }
    }
}

impl Config {
    /// Default config file location (`$XDG_CONFIG_HOME/obstacle-feedback/config.json`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| {
            dir.join(constants::APP_DIR_NAME)
                .join(constants::CONFIG_FILE_NAME)
        })
    }

    /// Load and validate a config file, falling back to defaults if it does not exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load from an explicit path or the default location
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => match Self::default_path() {
                Some(path) => Self::load(&path),
                None => Ok(Self::default()),
            },
        }
    }

    /// Write the config as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Check value ranges and threshold ordering
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;
        if !(t.urgent_m > 0.0 && t.urgent_m < t.alert_m && t.alert_m < t.notice_m) {
            return Err(ConfigError::Invalid(format!(
                "thresholds must be positive and strictly decreasing (notice {} > alert {} > urgent {})",
                t.notice_m, t.alert_m, t.urgent_m
            )));
        }
        if !t.notice_m.is_finite() {
            return Err(ConfigError::Invalid("notice threshold must be finite".into()));
        }

        let s = &self.sampler;
        if !(s.roi_fraction > 0.0 && s.roi_fraction <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "roi_fraction must be in (0, 1], got {}",
                s.roi_fraction
            )));
        }
        if !(0.0..=1.0).contains(&s.percentile) {
            return Err(ConfigError::Invalid(format!(
                "percentile must be in [0, 1], got {}",
                s.percentile
            )));
        }
        if s.min_roi_pixels == 0 {
            return Err(ConfigError::Invalid("min_roi_pixels must be at least 1".into()));
        }

        Ok(())
    }
}
