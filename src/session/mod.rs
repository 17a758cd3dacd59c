// SPDX-License-Identifier: GPL-3.0-only

//! Obstacle feedback session
//!
//! Owns the whole per-frame pipeline and its mutable state:
//!
//! ```text
//! SensorFrame ─► DepthSampler ─► estimate ─► FeedbackThrottle ─► AlertDispatcher
//!      │                            │
//!      └── tracking ────────────────┴──► SessionObserver (published state)
//! ```
//!
//! A session is driven by exactly one thread (see [`runner`]); observers read
//! the published state from anywhere.

pub mod observer;
pub mod runner;

pub use observer::{SessionObserver, SessionSnapshot};
pub use runner::SessionRunner;

use crate::backends::sensor::{SensorEvent, SensorFrame, TrackingQuality};
use crate::config::Config;
use crate::constants::sensor::FRAME_LOG_INTERVAL;
use crate::depth::DepthSampler;
use crate::feedback::{AlertDispatcher, FeedbackThrottle};
use observer::StatePublisher;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
}

/// Per-frame counters for the current run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames: u64,
    pub frames_without_estimate: u64,
    pub feedback_events: u64,
    pub announcements: u64,
    pub sensor_errors: u64,
}

/// Orchestrates sampling, throttling and dispatch for one user session
pub struct ObstacleSession {
    id: Uuid,
    state: SessionState,
    sampler: DepthSampler,
    throttle: FeedbackThrottle,
    dispatcher: AlertDispatcher,
    publisher: StatePublisher,
    stats: SessionStats,
}

impl ObstacleSession {
    pub fn new(config: &Config, dispatcher: AlertDispatcher) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Idle,
            sampler: DepthSampler::new(config.sampler),
            throttle: FeedbackThrottle::new(config.throttle, config.thresholds),
            dispatcher,
            publisher: StatePublisher::new(),
            stats: SessionStats::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// New read-only handle on the published state
    pub fn observer(&self) -> SessionObserver {
        self.publisher.observer()
    }

    /// Current published state
    pub fn snapshot(&self) -> SessionSnapshot {
        self.publisher.current()
    }

    /// Begin accepting frames
    ///
    /// Clears all throttle history and the published distance and tracking,
    /// then prepares the output ports. Calling `start` on a running session
    /// restarts it.
    pub fn start(&mut self) {
        if self.is_running() {
            debug!(session = %self.id, "Restarting running session");
        }
        self.throttle.reset();
        self.stats = SessionStats::default();
        self.dispatcher.prepare();
        self.publisher.update(|s| {
            s.distance = None;
            s.tracking = TrackingQuality::NotTracked;
            s.running = true;
        });
        self.state = SessionState::Running;
        info!(
            session = %self.id,
            haptics = self.dispatcher.haptics_active(),
            "Obstacle session started"
        );
    }

    /// Stop accepting frames
    ///
    /// The published distance is cleared; the tracking value keeps whatever
    /// the last frame reported.
    pub fn stop(&mut self) {
        if !self.is_running() {
            return;
        }
        self.state = SessionState::Idle;
        self.throttle.reset();
        self.publisher.update(|s| {
            s.distance = None;
            s.running = false;
        });
        info!(
            session = %self.id,
            frames = self.stats.frames,
            feedback = self.stats.feedback_events,
            announcements = self.stats.announcements,
            sensor_errors = self.stats.sensor_errors,
            "Obstacle session stopped"
        );
    }

    /// Forget announcement and timing history without stopping
    ///
    /// Used when the tracking subsystem restarts its map.
    pub fn reset_tracking(&mut self) {
        info!(session = %self.id, "Tracking reset, feedback history cleared");
        self.throttle.reset();
    }

    /// Route any sensor event
    pub fn handle_event(&mut self, event: SensorEvent) {
        match event {
            SensorEvent::Frame(frame) => self.on_frame(frame),
            SensorEvent::Interrupted => self.on_interrupted(),
            SensorEvent::Resumed => {
                info!(session = %self.id, "Sensor resumed");
            }
            SensorEvent::Failed(e) => {
                self.stats.sensor_errors += 1;
                warn!(session = %self.id, error = %e, "Sensor error");
            }
        }
    }

    /// Process one frame
    pub fn on_frame(&mut self, frame: SensorFrame) {
        if !self.is_running() {
            debug!(session = %self.id, "Frame ignored, session idle");
            return;
        }

        self.stats.frames += 1;
        let estimate = frame.depth.as_ref().and_then(|d| self.sampler.sample(d));
        self.publisher.update(|s| {
            s.distance = estimate;
            s.tracking = frame.tracking;
        });

        if self.stats.frames % FRAME_LOG_INTERVAL == 1 {
            debug!(
                session = %self.id,
                frame = self.stats.frames,
                distance = ?estimate,
                tracking = %frame.tracking,
                "Frame processed"
            );
        }

        let Some(distance) = estimate else {
            self.stats.frames_without_estimate += 1;
            return;
        };

        if let Some(event) = self.throttle.decide(distance, frame.captured_at) {
            self.stats.feedback_events += 1;
            if event.is_announcement() {
                self.stats.announcements += 1;
            }
            self.dispatcher.dispatch(event);
        }
    }

    fn on_interrupted(&mut self) {
        warn!(session = %self.id, "Sensor interrupted");
        self.publisher
            .update(|s| s.tracking = TrackingQuality::NotTracked);
    }
}

impl Drop for ObstacleSession {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::haptics::{HapticPattern, HapticPort};
    use crate::backends::voice::VoicePort;
    use crate::depth::DepthFrame;
    use crate::errors::PortResult;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    #[derive(Clone, Default)]
    struct Calls(Arc<Mutex<Vec<String>>>);

    struct Haptics(Calls);
    struct Voice(Calls);

    impl HapticPort for Haptics {
        fn name(&self) -> &str {
            "test"
        }

        fn play(&self, _intensity: f32, pattern: HapticPattern) -> PortResult<()> {
            self.0.0.lock().unwrap().push(format!("{:?}", pattern));
            Ok(())
        }
    }

    impl VoicePort for Voice {
        fn name(&self) -> &str {
            "test"
        }

        fn announce(&self, text: &str) -> PortResult<()> {
            self.0.0.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn session(calls: &Calls) -> ObstacleSession {
        let dispatcher = AlertDispatcher::new(
            Box::new(Haptics(calls.clone())),
            Box::new(Voice(calls.clone())),
        );
        ObstacleSession::new(&Config::default(), dispatcher)
    }

    fn frame(distance: f32, at: Instant) -> SensorFrame {
        SensorFrame {
            depth: Some(DepthFrame::filled(10, 10, distance)),
            tracking: TrackingQuality::Mapped,
            captured_at: at,
        }
    }

    #[test]
    fn test_idle_session_ignores_frames() {
        let calls = Calls::default();
        let mut s = session(&calls);
        s.on_frame(frame(0.3, Instant::now()));
        assert_eq!(s.stats().frames, 0);
        assert_eq!(s.snapshot().distance, None);
        assert!(calls.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_frame_publishes_and_dispatches() {
        let calls = Calls::default();
        let mut s = session(&calls);
        let observer = s.observer();
        s.start();
        assert!(observer.is_running());

        s.on_frame(frame(0.9, Instant::now()));
        assert_eq!(observer.current_distance(), Some(0.9));
        assert!(observer.is_well_tracked());
        assert_eq!(
            *calls.0.lock().unwrap(),
            vec!["Alert", "Obstacle 0.9 meters ahead"]
        );
        assert_eq!(s.stats().announcements, 1);
    }

    #[test]
    fn test_stop_clears_distance_keeps_tracking() {
        let calls = Calls::default();
        let mut s = session(&calls);
        s.start();
        s.on_frame(frame(1.2, Instant::now()));
        s.stop();

        let snapshot = s.snapshot();
        assert_eq!(snapshot.distance, None);
        assert_eq!(snapshot.tracking, TrackingQuality::Mapped);
        assert!(!snapshot.running);
        assert_eq!(s.state(), SessionState::Idle);
    }

    #[test]
    fn test_interruption_and_errors() {
        let calls = Calls::default();
        let mut s = session(&calls);
        let t0 = Instant::now();
        s.start();
        s.on_frame(frame(1.2, t0));
        s.handle_event(SensorEvent::Interrupted);
        assert!(!s.snapshot().is_well_tracked());
        assert_eq!(s.snapshot().distance, Some(1.2));

        s.handle_event(SensorEvent::Failed(crate::errors::SensorError::Interrupted));
        assert_eq!(s.stats().sensor_errors, 1);

        s.handle_event(SensorEvent::Resumed);
        s.handle_event(SensorEvent::Frame(frame(1.2, t0 + Duration::from_secs(1))));
        assert!(s.snapshot().is_well_tracked());
    }
}
