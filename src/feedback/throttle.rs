// SPDX-License-Identifier: GPL-3.0-only

//! Feedback throttle
//!
//! Decides, for each new distance sample, whether the user gets feedback and
//! whether it is spoken. Two gates run first:
//!
//! - rate gate: samples closer together than the configured interval are dropped
//! - delta gate (optional): samples that barely moved since the last processed
//!   one are dropped as noise
//!
//! Accepted samples are classified into an [`UrgencyLevel`]. Haptics fire on
//! every classified sample. Speech is edge-triggered per level: a level speaks
//! when the user crosses into it, then stays muted until its decay window
//! expires or the user leaves the level again.

use super::urgency::{FeedbackEvent, UrgencyLevel};
use crate::config::{ThrottleConfig, UrgencyThresholds};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Edge and decay state for one urgency level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct LevelState {
    /// Last accepted distance was at or inside this level's threshold
    inside: bool,
    /// Announcement mute expires at this instant
    muted_until: Option<Instant>,
}

impl LevelState {
    /// Announced earlier and the mute has run out
    fn mute_expired(&self, now: Instant) -> bool {
        self.muted_until.is_some_and(|until| now >= until)
    }
}

/// Mutable state owned by the throttle
#[derive(Debug, Clone, Default)]
struct ThrottleState {
    last_accepted_at: Option<Instant>,
    last_distance: Option<f32>,
    levels: [LevelState; 3],
}

/// Stateful rate/delta gate with per-level announcement hysteresis
#[derive(Debug, Clone)]
pub struct FeedbackThrottle {
    min_interval: Duration,
    /// Minimum change in millimeters, when the delta gate is on
    delta_gate_mm: Option<u32>,
    decay: Duration,
    thresholds: UrgencyThresholds,
    state: ThrottleState,
}

impl FeedbackThrottle {
    pub fn new(config: ThrottleConfig, thresholds: UrgencyThresholds) -> Self {
        Self {
            min_interval: config.min_interval(),
            delta_gate_mm: config.delta_gate_enabled.then_some(config.min_delta_mm),
            decay: config.announcement_decay(),
            thresholds,
            state: ThrottleState::default(),
        }
    }

    /// Forget all timing, distance and announcement history
    pub fn reset(&mut self) {
        debug!("Feedback throttle reset");
        self.state = ThrottleState::default();
    }

    /// Last distance that passed both gates
    pub fn last_distance(&self) -> Option<f32> {
        self.state.last_distance
    }

    /// Feed a new distance sample taken at `now`
    ///
    /// Returns the feedback to play, or `None` when the sample was gated out,
    /// invalid, or farther than every threshold.
    pub fn decide(&mut self, distance: f32, now: Instant) -> Option<FeedbackEvent> {
        if let Some(last) = self.state.last_accepted_at
            && now.saturating_duration_since(last) < self.min_interval
        {
            trace!(distance, "Sample rejected by rate gate");
            return None;
        }

        if let (Some(min_delta_mm), Some(last)) = (self.delta_gate_mm, self.state.last_distance)
            && change_mm(distance, last) < min_delta_mm
        {
            trace!(distance, last, "Sample rejected by delta gate");
            return None;
        }

        if !(distance.is_finite() && distance > 0.0) {
            debug!(distance, "Ignoring non-positive distance");
            return None;
        }

        self.state.last_accepted_at = Some(now);
        self.state.last_distance = Some(distance);

        let level = UrgencyLevel::classify(distance, &self.thresholds);
        let announce = level.is_some_and(|level| self.should_announce(level, now));
        self.update_levels(distance, level, announce, now);

        let level = level?;
        let event = if announce {
            FeedbackEvent::announced(level, distance)
        } else {
            FeedbackEvent::haptic(level, distance)
        };

        debug!(
            distance,
            level = %level,
            announce,
            "Feedback accepted"
        );
        Some(event)
    }

    fn should_announce(&self, level: UrgencyLevel, now: Instant) -> bool {
        let state = &self.state.levels[level.index()];
        !state.inside || state.mute_expired(now)
    }

    /// Track which levels the user is inside and mute the one just announced
    fn update_levels(
        &mut self,
        distance: f32,
        level: Option<UrgencyLevel>,
        announce: bool,
        now: Instant,
    ) {
        for candidate in UrgencyLevel::ALL {
            let state = &mut self.state.levels[candidate.index()];
            let inside = distance <= candidate.threshold(&self.thresholds);
            if !inside {
                *state = LevelState::default();
                continue;
            }
            state.inside = true;
            if announce && Some(candidate) == level {
                state.muted_until = Some(now + self.decay);
            }
        }
    }
}

/// Distance change rounded to whole millimeters
///
/// f32 subtraction leaves 0.9 - 0.8 just under 0.1, so the gate compares
/// rounded millimeters instead of raw meters.
fn change_mm(distance: f32, last: f32) -> u32 {
    ((distance - last).abs() * 1000.0).round() as u32
}

impl Default for FeedbackThrottle {
    fn default() -> Self {
        Self::new(ThrottleConfig::default(), UrgencyThresholds::default())
    }
}
