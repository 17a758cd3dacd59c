// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for sensors and feedback outputs
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              Obstacle Session                │
//! └──────────┬─────────────────────┬────────────┘
//!            │                     │
//! ┌──────────┴──────────┐ ┌────────┴────────────┐
//! │       Sensor        │ │      Outputs        │
//! │ replay / simulator  │ │ haptics │  voice    │
//! └─────────────────────┘ └─────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`sensor`]: Depth and tracking event sources
//! - [`haptics`]: Vibration output ports
//! - [`voice`]: Spoken output ports

pub mod haptics;
pub mod sensor;
pub mod voice;

pub use haptics::{HapticPattern, HapticPort, LogHaptics, NoHaptics, SysfsVibrator};
pub use sensor::{SensorEvent, SensorFrame, SensorSource, TrackingQuality};
pub use voice::{LogVoice, SpeechCommand, VoicePort};
