// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the obstacle session pipeline

use obstacle_feedback::backends::haptics::{HapticPattern, HapticPort};
use obstacle_feedback::backends::voice::VoicePort;
use obstacle_feedback::errors::{PortError, PortResult};
use obstacle_feedback::{
    AlertDispatcher, Config, DepthFrame, ObstacleSession, SensorEvent, SensorFrame,
    TrackingQuality,
};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Everything the fake ports were asked to do, in order
#[derive(Clone, Default)]
struct Outputs(Arc<Mutex<Vec<Output>>>);

#[derive(Debug, Clone, PartialEq)]
enum Output {
    Haptic(HapticPattern),
    Voice(String),
}

impl Outputs {
    fn take(&self) -> Vec<Output> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }

    fn phrases(&self) -> Vec<String> {
        self.take()
            .into_iter()
            .filter_map(|o| match o {
                Output::Voice(text) => Some(text),
                Output::Haptic(_) => None,
            })
            .collect()
    }
}

struct FakeHaptics {
    outputs: Outputs,
    available: bool,
}

impl HapticPort for FakeHaptics {
    fn name(&self) -> &str {
        "fake-haptics"
    }

    fn prepare(&mut self) -> PortResult<()> {
        if self.available {
            Ok(())
        } else {
            Err(PortError::Unavailable("no engine".into()))
        }
    }

    fn play(&self, _intensity: f32, pattern: HapticPattern) -> PortResult<()> {
        self.outputs.0.lock().unwrap().push(Output::Haptic(pattern));
        Ok(())
    }
}

struct FakeVoice(Outputs);

impl VoicePort for FakeVoice {
    fn name(&self) -> &str {
        "fake-voice"
    }

    fn announce(&self, text: &str) -> PortResult<()> {
        self.0.0.lock().unwrap().push(Output::Voice(text.to_string()));
        Ok(())
    }
}

fn session_with(outputs: &Outputs, haptics_available: bool) -> ObstacleSession {
    let dispatcher = AlertDispatcher::new(
        Box::new(FakeHaptics {
            outputs: outputs.clone(),
            available: haptics_available,
        }),
        Box::new(FakeVoice(outputs.clone())),
    );
    ObstacleSession::new(&Config::default(), dispatcher)
}

fn frame_at(distance: f32, at: Instant) -> SensorEvent {
    SensorEvent::Frame(SensorFrame {
        depth: Some(DepthFrame::filled(20, 20, distance)),
        tracking: TrackingQuality::Mapped,
        captured_at: at,
    })
}

#[test]
fn test_approach_sequence() {
    let outputs = Outputs::default();
    let mut session = session_with(&outputs, true);
    session.start();

    let t0 = Instant::now();
    let mut per_sample = Vec::new();
    for (i, distance) in [2.0, 1.2, 0.9, 0.4].into_iter().enumerate() {
        session.handle_event(frame_at(distance, t0 + Duration::from_secs(i as u64)));
        per_sample.push(outputs.take());
    }

    assert!(per_sample[0].is_empty(), "2.0 m is beyond every level");
    assert_eq!(
        per_sample[1],
        vec![
            Output::Haptic(HapticPattern::Notice),
            Output::Voice("Object 1.2 meters ahead".into())
        ]
    );
    assert_eq!(
        per_sample[2],
        vec![
            Output::Haptic(HapticPattern::Alert),
            Output::Voice("Obstacle 0.9 meters ahead".into())
        ]
    );
    assert_eq!(
        per_sample[3],
        vec![
            Output::Haptic(HapticPattern::Urgent),
            Output::Voice("Obstacle very close. Stop.".into())
        ]
    );
}

#[test]
fn test_urgent_reannounce_after_decay() {
    let outputs = Outputs::default();
    let mut session = session_with(&outputs, true);
    session.start();

    let t0 = Instant::now();
    session.handle_event(frame_at(0.4, t0));
    assert_eq!(outputs.phrases().len(), 1);

    session.handle_event(frame_at(0.4, t0 + Duration::from_secs(1)));
    assert!(outputs.phrases().is_empty(), "muted within the decay window");

    session.handle_event(frame_at(0.4, t0 + Duration::from_millis(3500)));
    assert_eq!(outputs.phrases(), vec!["Obstacle very close. Stop."]);
}

#[test]
fn test_haptics_on_every_accepted_frame() {
    let outputs = Outputs::default();
    let mut session = session_with(&outputs, true);
    session.start();

    let t0 = Instant::now();
    // 30 fps for 2.4 s: the rate gate lets through one frame every 700 ms
    for i in 0..=72u64 {
        session.handle_event(frame_at(0.8, t0 + Duration::from_millis(i * 1000 / 30)));
    }

    let all = outputs.take();
    let haptics = all
        .iter()
        .filter(|o| matches!(o, Output::Haptic(HapticPattern::Alert)))
        .count();
    let voices = all.iter().filter(|o| matches!(o, Output::Voice(_))).count();
    assert_eq!(haptics, 4);
    assert_eq!(voices, 1);
    assert_eq!(session.stats().feedback_events, 4);
    assert_eq!(session.stats().announcements, 1);
}

#[test]
fn test_retreat_does_not_reannounce_looser_level() {
    let outputs = Outputs::default();
    let mut session = session_with(&outputs, true);
    session.start();

    let t0 = Instant::now();
    session.handle_event(frame_at(0.4, t0));
    outputs.take();

    session.handle_event(frame_at(0.9, t0 + Duration::from_secs(1)));
    assert_eq!(outputs.take(), vec![Output::Haptic(HapticPattern::Alert)]);

    // Leaving every level re-arms them
    session.handle_event(frame_at(2.0, t0 + Duration::from_secs(2)));
    session.handle_event(frame_at(0.9, t0 + Duration::from_secs(3)));
    assert_eq!(outputs.phrases(), vec!["Obstacle 0.9 meters ahead"]);
}

#[test]
fn test_restart_resets_throttle() {
    let outputs = Outputs::default();
    let mut session = session_with(&outputs, true);
    let t0 = Instant::now();

    session.start();
    session.handle_event(frame_at(0.4, t0));
    assert_eq!(outputs.phrases().len(), 1);

    session.stop();
    session.start();

    // Inside both the rate gate and the decay window of the previous run
    session.handle_event(frame_at(0.4, t0 + Duration::from_millis(100)));
    assert_eq!(
        outputs.take(),
        vec![
            Output::Haptic(HapticPattern::Urgent),
            Output::Voice("Obstacle very close. Stop.".into())
        ]
    );
}

#[test]
fn test_reset_tracking_keeps_running() {
    let outputs = Outputs::default();
    let mut session = session_with(&outputs, true);
    let t0 = Instant::now();

    session.start();
    session.handle_event(frame_at(0.9, t0));
    outputs.take();

    session.reset_tracking();
    assert!(session.is_running());
    session.handle_event(frame_at(0.9, t0 + Duration::from_millis(200)));
    assert_eq!(outputs.phrases(), vec!["Obstacle 0.9 meters ahead"]);
}

#[test]
fn test_missing_haptics_falls_back_to_voice() {
    let outputs = Outputs::default();
    let mut session = session_with(&outputs, false);
    session.start();

    session.handle_event(frame_at(1.2, Instant::now()));
    assert_eq!(
        outputs.take(),
        vec![Output::Voice("Object 1.2 meters ahead".into())]
    );
}

#[test]
fn test_published_state() {
    let outputs = Outputs::default();
    let mut session = session_with(&outputs, true);
    let observer = session.observer();
    assert!(!observer.is_running());

    let t0 = Instant::now();
    session.start();
    assert!(observer.is_running());
    assert!(!observer.is_well_tracked());

    session.handle_event(frame_at(1.2, t0));
    assert_eq!(observer.current_distance(), Some(1.2));
    assert!(observer.is_well_tracked());

    // A frame without depth publishes no distance and triggers nothing
    outputs.take();
    session.handle_event(SensorEvent::Frame(SensorFrame {
        depth: None,
        tracking: TrackingQuality::Limited,
        captured_at: t0 + Duration::from_secs(1),
    }));
    assert_eq!(observer.current_distance(), None);
    assert_eq!(observer.tracking(), TrackingQuality::Limited);
    assert!(outputs.take().is_empty());

    // Interruption drops tracking until the next frame reports it
    session.handle_event(frame_at(1.2, t0 + Duration::from_secs(2)));
    session.handle_event(SensorEvent::Interrupted);
    assert!(!observer.is_well_tracked());
    session.handle_event(SensorEvent::Resumed);
    assert!(!observer.is_well_tracked());
    session.handle_event(frame_at(1.2, t0 + Duration::from_secs(3)));
    assert!(observer.is_well_tracked());

    // Stop clears the distance, tracking keeps its last value
    session.stop();
    assert_eq!(observer.current_distance(), None);
    assert_eq!(observer.tracking(), TrackingQuality::Mapped);
    assert!(!observer.is_running());

    // Start clears both
    session.start();
    assert_eq!(observer.tracking(), TrackingQuality::NotTracked);
}

#[test]
fn test_frames_without_valid_pixels() {
    let outputs = Outputs::default();
    let mut session = session_with(&outputs, true);
    session.start();

    session.handle_event(SensorEvent::Frame(SensorFrame {
        depth: Some(DepthFrame::filled(20, 20, 0.0)),
        tracking: TrackingQuality::Mapped,
        captured_at: Instant::now(),
    }));
    assert_eq!(session.snapshot().distance, None);
    assert_eq!(session.stats().frames_without_estimate, 1);
    assert!(outputs.take().is_empty());
}
