// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants
//!
//! Single source of truth for default thresholds, timing and sensor limits.
//! [`crate::config::Config`] defaults are built from these values.

use std::time::Duration;

/// Urgency distance thresholds (meters, inclusive ceilings)
pub mod thresholds {
    /// Anything at or inside this distance is worth a notice
    pub const NOTICE_M: f32 = 1.5;
    /// Anything at or inside this distance is an obstacle alert
    pub const ALERT_M: f32 = 1.0;
    /// Anything at or inside this distance means stop
    pub const URGENT_M: f32 = 0.5;
}

/// Feedback throttle timing defaults
pub mod throttle {
    use super::Duration;

    /// Minimum spacing between accepted distance samples
    pub const MIN_INTERVAL: Duration = Duration::from_millis(700);
    /// Minimum distance change for the delta gate (meters)
    pub const MIN_DELTA_M: f32 = 0.1;
    /// Delta gate is off unless configured
    pub const DELTA_GATE_ENABLED: bool = false;
    /// How long an announced level stays muted while the user remains inside it
    pub const ANNOUNCEMENT_DECAY: Duration = Duration::from_millis(3000);
}

/// Depth sampler defaults
pub mod sampler {
    /// Fraction of frame width and height covered by the centered region of interest
    pub const ROI_FRACTION: f32 = 0.2;
    /// Minimum region of interest edge length in pixels
    pub const MIN_ROI_PIXELS: u32 = 2;
    /// Near-edge percentile reported as the obstacle distance
    pub const PERCENTILE: f32 = 0.1;
}

/// Depth sensor limits
pub mod depth {
    /// Invalid depth marker for raw millimeter frames
    pub const DEPTH_INVALID_MM: u16 = 0;
    /// Maximum valid depth value (values above this are considered invalid)
    pub const DEPTH_MAX_VALID_MM: u16 = 8000;
}

/// Haptic pattern timing
pub mod haptics {
    use super::Duration;

    /// Length of a single soft transient
    pub const TRANSIENT: Duration = Duration::from_millis(30);
    /// Gap between the start of the two alert transients
    pub const ALERT_SPACING: Duration = Duration::from_millis(120);
    /// Length of the continuous urgent pulse
    pub const URGENT_PULSE: Duration = Duration::from_millis(300);
}

/// Spoken phrases
pub mod phrases {
    use super::Duration;

    /// Phrase for the urgent level; notice and alert phrases carry the distance
    pub const URGENT: &str = "Obstacle very close. Stop.";

    /// A phrase started this recently may still be speaking and gets cancelled
    pub const SUPERSEDE_WINDOW: Duration = Duration::from_secs(3);
}

/// Sensor source defaults
pub mod sensor {
    /// Frame rate of the approach simulator
    pub const SIMULATOR_FPS: u32 = 30;
    /// Depth grid size produced by the approach simulator
    pub const SIMULATOR_WIDTH: u32 = 64;
    pub const SIMULATOR_HEIGHT: u32 = 48;
    /// Limited tracking before the simulated map is established
    pub const SIMULATOR_WARMUP_MS: u64 = 500;
    /// Every Nth simulated pixel reads as a dropout
    pub const SIMULATOR_DROPOUT_STRIDE: usize = 7;
    /// Log a frame summary every N frames
    pub const FRAME_LOG_INTERVAL: u64 = 60;
}

/// Application directory name used for config and recordings
pub const APP_DIR_NAME: &str = "obstacle-feedback";

/// Config file name inside the config directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Presentation poll interval when waiting for published state changes
pub const OBSERVER_POLL: Duration = Duration::from_millis(100);
