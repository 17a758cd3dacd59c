// SPDX-License-Identifier: GPL-3.0-only

//! Urgency levels and the feedback events they produce

use crate::config::UrgencyThresholds;
use crate::constants::phrases;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How close the nearest obstacle is, from least to most urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UrgencyLevel {
    /// Within the notice threshold
    Notice,
    /// Within the alert threshold
    Alert,
    /// Within the urgent threshold, the user should stop
    Urgent,
}

impl UrgencyLevel {
    /// All levels in ascending urgency
    pub const ALL: [UrgencyLevel; 3] = [
        UrgencyLevel::Notice,
        UrgencyLevel::Alert,
        UrgencyLevel::Urgent,
    ];

    /// Slot of this level in per-level tables
    pub fn index(self) -> usize {
        match self {
            UrgencyLevel::Notice => 0,
            UrgencyLevel::Alert => 1,
            UrgencyLevel::Urgent => 2,
        }
    }

    /// Inclusive distance ceiling for this level
    pub fn threshold(self, thresholds: &UrgencyThresholds) -> f32 {
        match self {
            UrgencyLevel::Notice => thresholds.notice_m,
            UrgencyLevel::Alert => thresholds.alert_m,
            UrgencyLevel::Urgent => thresholds.urgent_m,
        }
    }

    /// Tightest level whose threshold the distance satisfies
    pub fn classify(distance: f32, thresholds: &UrgencyThresholds) -> Option<Self> {
        UrgencyLevel::ALL
            .into_iter()
            .rev()
            .find(|level| distance <= level.threshold(thresholds))
    }

    /// Haptic strength for this level (0.0 - 1.0)
    pub fn intensity(self) -> f32 {
        match self {
            UrgencyLevel::Notice => 0.4,
            UrgencyLevel::Alert => 0.8,
            UrgencyLevel::Urgent => 1.0,
        }
    }

    /// Spoken phrase for an obstacle at `distance` meters
    pub fn phrase(self, distance: f32) -> String {
        match self {
            UrgencyLevel::Notice => format!("Object {:.1} meters ahead", distance),
            UrgencyLevel::Alert => format!("Obstacle {:.1} meters ahead", distance),
            UrgencyLevel::Urgent => phrases::URGENT.to_string(),
        }
    }
}

impl fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrgencyLevel::Notice => write!(f, "notice"),
            UrgencyLevel::Alert => write!(f, "alert"),
            UrgencyLevel::Urgent => write!(f, "urgent"),
        }
    }
}

/// One feedback decision, consumed once by the dispatcher
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackEvent {
    /// Urgency the distance was classified into
    pub level: UrgencyLevel,
    /// Distance that triggered the event (meters)
    pub distance: f32,
    /// Haptic strength (0.0 - 1.0)
    pub intensity: f32,
    /// Phrase to speak, only on a fresh announcement
    pub phrase: Option<String>,
}

impl FeedbackEvent {
    /// Haptic-only event for a level
    pub fn haptic(level: UrgencyLevel, distance: f32) -> Self {
        Self {
            level,
            distance,
            intensity: level.intensity(),
            phrase: None,
        }
    }

    /// Event that also speaks the level's phrase
    pub fn announced(level: UrgencyLevel, distance: f32) -> Self {
        Self {
            phrase: Some(level.phrase(distance)),
            ..Self::haptic(level, distance)
        }
    }

    pub fn is_announcement(&self) -> bool {
        self.phrase.is_some()
    }
}
