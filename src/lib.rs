// SPDX-License-Identifier: GPL-3.0-only

//! Obstacle Feedback - depth-based obstacle warnings
//!
//! Estimates the distance to the nearest obstacle straight ahead from depth
//! frames and turns it into haptic and spoken feedback for a person walking.
//!
//! # Architecture
//!
//! - [`depth`]: Depth frames and the region-of-interest distance sampler
//! - [`feedback`]: Urgency levels, feedback throttle and alert dispatch
//! - [`session`]: Session orchestration, frame thread and published state
//! - [`backends`]: Sensor sources and output ports
//! - [`config`]: User configuration handling
//!
//! # Example
//!
//! ```ignore
//! let dispatcher = AlertDispatcher::new(Box::new(LogHaptics), Box::new(LogVoice));
//! let mut session = ObstacleSession::new(&Config::default(), dispatcher);
//! session.start();
//! let runner = SessionRunner::spawn("frames", Box::new(source), session)?;
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod depth;
pub mod errors;
pub mod feedback;
pub mod session;

// Re-export commonly used types
pub use backends::sensor::{SensorEvent, SensorFrame, SensorSource, TrackingQuality};
pub use config::Config;
pub use depth::{DepthFrame, DepthSampler};
pub use errors::{AppError, AppResult};
pub use feedback::{AlertDispatcher, FeedbackEvent, FeedbackThrottle, UrgencyLevel};
pub use session::{ObstacleSession, SessionObserver, SessionRunner, SessionSnapshot};
