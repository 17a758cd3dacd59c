// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic approach scenario
//!
//! A flat wall straight ahead that the user walks towards at a constant
//! speed. Frames carry a fixed pattern of dropout pixels so the sampler has
//! something to reject, tracking is limited until the warm-up ends, and an
//! interruption can be injected part-way through.

use super::{SensorEvent, SensorFrame, SensorSource, TrackingQuality};
use crate::constants::sensor::{
    SIMULATOR_DROPOUT_STRIDE, SIMULATOR_FPS, SIMULATOR_HEIGHT, SIMULATOR_WARMUP_MS,
    SIMULATOR_WIDTH,
};
use crate::depth::DepthFrame;
use std::time::{Duration, Instant};
use tracing::debug;

/// Approach scenario parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatorConfig {
    /// Wall distance at the first frame (meters)
    pub start_m: f32,
    /// Closing speed (meters per second)
    pub speed_mps: f32,
    /// Closest the user gets to the wall (meters)
    pub stop_m: f32,
    /// Frames per second
    pub fps: u32,
    /// Scenario length
    pub duration: Duration,
    pub width: u32,
    pub height: u32,
    /// Optional interruption: (start offset, length)
    pub interruption: Option<(Duration, Duration)>,
    /// Sleep between frames to match `fps`
    pub realtime: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            start_m: 3.0,
            speed_mps: 0.5,
            stop_m: 0.3,
            fps: SIMULATOR_FPS,
            duration: Duration::from_secs(10),
            width: SIMULATOR_WIDTH,
            height: SIMULATOR_HEIGHT,
            interruption: None,
            realtime: true,
        }
    }
}

/// Sensor source producing the approach scenario
pub struct ApproachSimulator {
    config: SimulatorConfig,
    origin: Instant,
    frame_index: u64,
    interrupted: bool,
}

impl ApproachSimulator {
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            config,
            origin: Instant::now(),
            frame_index: 0,
            interrupted: false,
        }
    }

    /// Wall distance at `elapsed` into the scenario
    pub fn distance_at(&self, elapsed: Duration) -> f32 {
        let d = self.config.start_m - self.config.speed_mps * elapsed.as_secs_f32();
        d.max(self.config.stop_m)
    }

    fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.config.fps.max(1) as f64)
    }

    fn in_interruption(&self, elapsed: Duration) -> bool {
        self.config
            .interruption
            .is_some_and(|(start, len)| elapsed >= start && elapsed < start + len)
    }

    fn depth_frame(&self, distance: f32) -> DepthFrame {
        let (w, h) = (self.config.width, self.config.height);
        let readings: Vec<f32> = (0..(w as usize * h as usize))
            .map(|i| {
                if i % SIMULATOR_DROPOUT_STRIDE == 0 {
                    0.0
                } else {
                    distance
                }
            })
            .collect();
        DepthFrame::new(w, h, readings).unwrap_or_else(|_| DepthFrame::filled(w, h, distance))
    }
}

impl SensorSource for ApproachSimulator {
    fn name(&self) -> &str {
        "simulator"
    }

    fn next_event(&mut self) -> Option<SensorEvent> {
        let elapsed = self.frame_interval() * self.frame_index as u32;
        if elapsed > self.config.duration {
            return None;
        }

        let interrupted = self.in_interruption(elapsed);
        if interrupted != self.interrupted {
            self.interrupted = interrupted;
            debug!(interrupted, elapsed_ms = elapsed.as_millis() as u64, "Simulated interruption");
            return Some(if interrupted {
                SensorEvent::Interrupted
            } else {
                SensorEvent::Resumed
            });
        }

        let captured_at = self.origin + elapsed;
        if self.config.realtime {
            let now = Instant::now();
            if captured_at > now {
                std::thread::sleep(captured_at - now);
            }
        }
        self.frame_index += 1;

        if interrupted {
            return Some(SensorEvent::Frame(SensorFrame {
                depth: None,
                tracking: TrackingQuality::NotTracked,
                captured_at,
            }));
        }

        let tracking = if elapsed < Duration::from_millis(SIMULATOR_WARMUP_MS) {
            TrackingQuality::Limited
        } else {
            TrackingQuality::Mapped
        };

        Some(SensorEvent::Frame(SensorFrame {
            depth: Some(self.depth_frame(self.distance_at(elapsed))),
            tracking,
            captured_at,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depth::DepthSampler;

    fn fast(config: SimulatorConfig) -> ApproachSimulator {
        ApproachSimulator::new(SimulatorConfig {
            realtime: false,
            ..config
        })
    }

    #[test]
    fn test_distance_profile() {
        let sim = fast(SimulatorConfig::default());
        assert_eq!(sim.distance_at(Duration::ZERO), 3.0);
        assert!((sim.distance_at(Duration::from_secs(2)) - 2.0).abs() < 1e-6);
        assert_eq!(sim.distance_at(Duration::from_secs(60)), 0.3);
    }

    #[test]
    fn test_frames_sample_to_wall_distance() {
        let mut sim = fast(SimulatorConfig::default());
        let sampler = DepthSampler::default();

        let frame = match sim.next_event() {
            Some(SensorEvent::Frame(frame)) => frame,
            other => panic!("expected frame, got {:?}", other),
        };
        assert_eq!(frame.tracking, TrackingQuality::Limited);
        let depth = frame.depth.expect("depth present");
        assert!(depth.readings().iter().any(|&d| d == 0.0), "has dropouts");
        assert_eq!(sampler.sample(&depth), Some(3.0));
    }

    #[test]
    fn test_stream_ends_after_duration() {
        let mut sim = fast(SimulatorConfig {
            fps: 10,
            duration: Duration::from_secs(1),
            ..SimulatorConfig::default()
        });
        let mut frames = 0;
        while let Some(event) = sim.next_event() {
            assert!(matches!(event, SensorEvent::Frame(_)));
            frames += 1;
        }
        assert_eq!(frames, 11);
    }

    #[test]
    fn test_interruption_events() {
        let mut sim = fast(SimulatorConfig {
            fps: 10,
            duration: Duration::from_secs(1),
            interruption: Some((Duration::from_millis(300), Duration::from_millis(200))),
            ..SimulatorConfig::default()
        });
        let mut kinds = Vec::new();
        while let Some(event) = sim.next_event() {
            kinds.push(match event {
                SensorEvent::Frame(f) if f.depth.is_some() => "frame",
                SensorEvent::Frame(_) => "blank",
                SensorEvent::Interrupted => "interrupted",
                SensorEvent::Resumed => "resumed",
                SensorEvent::Failed(_) => "failed",
            });
        }
        assert_eq!(
            kinds,
            vec![
                "frame",
                "frame",
                "frame",
                "interrupted",
                "blank",
                "blank",
                "resumed",
                "frame",
                "frame",
                "frame",
                "frame",
                "frame",
                "frame"
            ]
        );
    }
}
