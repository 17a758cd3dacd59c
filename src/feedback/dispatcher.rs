// SPDX-License-Identifier: GPL-3.0-only

//! Alert dispatch to the haptic and voice outputs
//!
//! The two outputs are independent: a failing vibrator never holds back the
//! spoken phrase and a busy speech engine never holds back the vibration.
//! Failures are logged and dropped, the next frame tries again.

use super::urgency::{FeedbackEvent, UrgencyLevel};
use crate::backends::haptics::{HapticPattern, HapticPort};
use crate::backends::voice::VoicePort;
use tracing::{debug, info, warn};

/// Routes feedback events to the output ports
pub struct AlertDispatcher {
    haptics: Box<dyn HapticPort>,
    voice: Box<dyn VoicePort>,
    /// Cleared for the rest of a session when the haptic port fails to prepare
    haptics_ready: bool,
    haptics_enabled: bool,
    voice_enabled: bool,
}

impl AlertDispatcher {
    pub fn new(haptics: Box<dyn HapticPort>, voice: Box<dyn VoicePort>) -> Self {
        Self {
            haptics,
            voice,
            haptics_ready: false,
            haptics_enabled: true,
            voice_enabled: true,
        }
    }

    /// Turn whole channels on or off (user preference)
    pub fn with_channels(mut self, haptics_enabled: bool, voice_enabled: bool) -> Self {
        self.haptics_enabled = haptics_enabled;
        self.voice_enabled = voice_enabled;
        self
    }

    /// Prepare the outputs for a new session
    ///
    /// A haptic port that cannot be prepared stays disabled until the next call.
    pub fn prepare(&mut self) {
        if !self.haptics_enabled {
            self.haptics_ready = false;
            return;
        }
        match self.haptics.prepare() {
            Ok(()) => {
                self.haptics_ready = true;
                info!(port = self.haptics.name(), "Haptic output ready");
            }
            Err(e) => {
                self.haptics_ready = false;
                warn!(
                    port = self.haptics.name(),
                    error = %e,
                    "Haptic output unavailable, continuing with voice only"
                );
            }
        }
    }

    /// Whether haptics will be played this session
    pub fn haptics_active(&self) -> bool {
        self.haptics_enabled && self.haptics_ready
    }

    /// Play an event on both outputs, fire-and-forget
    pub fn dispatch(&self, event: FeedbackEvent) {
        if self.haptics_active() {
            let pattern = pattern_for(event.level);
            if let Err(e) = self.haptics.play(event.intensity, pattern) {
                warn!(
                    level = %event.level,
                    error = %e,
                    "Haptic feedback failed"
                );
            }
        }

        if let Some(phrase) = event.phrase.as_deref() {
            if !self.voice_enabled {
                debug!(phrase, "Voice output disabled, phrase dropped");
                return;
            }
            if let Err(e) = self.voice.announce(phrase) {
                warn!(
                    level = %event.level,
                    error = %e,
                    "Spoken feedback failed"
                );
            }
        }
    }
}

/// Vibration shape for each urgency level
pub fn pattern_for(level: UrgencyLevel) -> HapticPattern {
    match level {
        UrgencyLevel::Notice => HapticPattern::Notice,
        UrgencyLevel::Alert => HapticPattern::Alert,
        UrgencyLevel::Urgent => HapticPattern::Urgent,
    }
}
