// SPDX-License-Identifier: GPL-3.0-only

//! Sensor source abstraction
//!
//! The depth/tracking subsystem is an external collaborator. The session only
//! sees a stream of [`SensorEvent`]s pulled from a [`SensorSource`]:
//!
//! ```text
//! ┌──────────────────┐   next_event()   ┌────────────────┐
//! │  SensorSource    │ ───────────────► │ ObstacleSession│
//! │ (replay, sim...) │                  └────────────────┘
//! └──────────────────┘
//! ```

pub mod recording;
pub mod replay;
pub mod simulator;

pub use recording::{RecordEntry, RecordingTee, RecordingWriter};
pub use replay::{Pacing, ReplaySource};
pub use simulator::{ApproachSimulator, SimulatorConfig};

use crate::depth::DepthFrame;
use crate::errors::SensorError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Mapping status reported by the tracking subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingQuality {
    /// No tracking
    #[default]
    NotTracked,
    /// Tracking with reduced quality
    Limited,
    /// Current surroundings are mapped
    Mapped,
    /// Mapped and growing the map
    Extending,
}

impl TrackingQuality {
    /// Good enough to trust the depth estimate
    pub fn is_well_tracked(self) -> bool {
        matches!(self, TrackingQuality::Mapped | TrackingQuality::Extending)
    }
}

impl fmt::Display for TrackingQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackingQuality::NotTracked => write!(f, "not tracked"),
            TrackingQuality::Limited => write!(f, "limited"),
            TrackingQuality::Mapped => write!(f, "mapped"),
            TrackingQuality::Extending => write!(f, "extending"),
        }
    }
}

/// One frame update from the sensor
#[derive(Debug, Clone)]
pub struct SensorFrame {
    /// Depth grid, or `None` when the sensor had no depth this frame
    pub depth: Option<DepthFrame>,
    /// Mapping status at this frame
    pub tracking: TrackingQuality,
    /// Capture time
    pub captured_at: Instant,
}

/// Everything a sensor source can report
#[derive(Debug, Clone)]
pub enum SensorEvent {
    /// Regular frame update
    Frame(SensorFrame),
    /// Sensor session interrupted (app backgrounded, camera taken)
    Interrupted,
    /// Sensor session resumed after an interruption
    Resumed,
    /// Source reported an error; the stream continues
    Failed(SensorError),
}

/// Blocking stream of sensor events
pub trait SensorSource: Send {
    /// Name for logging
    fn name(&self) -> &str;

    /// Wait for the next event; `None` ends the stream
    fn next_event(&mut self) -> Option<SensorEvent>;
}
