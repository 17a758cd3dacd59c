// SPDX-License-Identifier: GPL-3.0-only

//! Feedback decision and dispatch
//!
//! - [`throttle`]: rate/delta gating and announcement hysteresis
//! - [`urgency`]: urgency levels and feedback events
//! - [`dispatcher`]: routing events to the haptic and voice outputs

pub mod dispatcher;
pub mod throttle;
pub mod urgency;

pub use dispatcher::AlertDispatcher;
pub use throttle::FeedbackThrottle;
pub use urgency::{FeedbackEvent, UrgencyLevel};
