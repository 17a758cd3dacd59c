// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for obstacle feedback sessions
//!
//! This module provides command-line functionality for:
//! - Running a session over a recording or the approach simulator
//! - Inspecting per-frame distance estimates
//! - Showing and writing the configuration

use crate::{HapticsBackend, VoiceBackend};
use chrono::Local;
use obstacle_feedback::backends::haptics::{HapticPort, LogHaptics, NoHaptics, SysfsVibrator};
use obstacle_feedback::backends::sensor::{
    ApproachSimulator, Pacing, RecordingTee, RecordingWriter, ReplaySource, SensorEvent,
    SensorSource, SimulatorConfig, TrackingQuality,
};
use obstacle_feedback::backends::voice::{LogVoice, SpeechCommand, VoicePort};
use obstacle_feedback::constants::{APP_DIR_NAME, OBSERVER_POLL};
use obstacle_feedback::{
    AlertDispatcher, Config, DepthSampler, ObstacleSession, SessionObserver, SessionRunner,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

/// Output selection from the command line
#[derive(Debug, Clone, Copy)]
pub struct Outputs {
    pub haptics: HapticsBackend,
    pub voice: VoiceBackend,
}

/// Simulator options from the command line
#[derive(Debug, Clone)]
pub struct SimulateOptions {
    pub start_m: f32,
    pub speed: f32,
    pub fps: u32,
    pub seconds: u64,
    pub interrupt_at: Option<f32>,
    pub interrupt_for: f32,
    pub record: Option<Option<PathBuf>>,
    pub fast: bool,
}

/// Run a session over a recording
pub fn replay(
    config_path: Option<&Path>,
    outputs: Outputs,
    path: &Path,
    realtime: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default(config_path)?;
    let pacing = if realtime {
        Pacing::Realtime
    } else {
        Pacing::AsFastAsPossible
    };
    let source = ReplaySource::open(path, pacing)?;

    println!("Replaying: {}", path.display());
    run_session(&config, outputs, Box::new(source))
}

/// Run a session over the approach simulator
pub fn simulate(
    config_path: Option<&Path>,
    outputs: Outputs,
    options: SimulateOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default(config_path)?;

    if options.fps == 0 {
        return Err("fps must be at least 1".into());
    }
    if !(options.speed.is_finite() && options.start_m.is_finite() && options.start_m > 0.0) {
        return Err("start distance and speed must be finite, start must be positive".into());
    }

    let interruption = options
        .interrupt_at
        .map(|at| interruption_window(at, options.interrupt_for))
        .transpose()?;

    let simulator = ApproachSimulator::new(SimulatorConfig {
        start_m: options.start_m,
        speed_mps: options.speed,
        fps: options.fps,
        duration: Duration::from_secs(options.seconds),
        interruption,
        realtime: !options.fast,
        ..SimulatorConfig::default()
    });

    println!(
        "Simulating: {:.1} m at {:.1} m/s for {} s",
        options.start_m, options.speed, options.seconds
    );

    let source: Box<dyn SensorSource> = match options.record {
        Some(path) => {
            let path = path.unwrap_or_else(default_recording_path);
            let writer = RecordingWriter::create(&path)?;
            println!("Recording to: {}", path.display());
            Box::new(RecordingTee::new(simulator, writer))
        }
        None => Box::new(simulator),
    };

    run_session(&config, outputs, source)
}

/// Print per-frame estimates of a recording
pub fn sample(config_path: Option<&Path>, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default(config_path)?;
    let sampler = DepthSampler::new(config.sampler);
    let mut source = ReplaySource::open(path, Pacing::AsFastAsPossible)?;

    let mut origin: Option<Instant> = None;
    let mut frames = 0usize;
    let mut estimated = 0usize;

    while let Some(event) = source.next_event() {
        match event {
            SensorEvent::Frame(frame) => {
                frames += 1;
                let origin = *origin.get_or_insert(frame.captured_at);
                let t_ms = frame.captured_at.saturating_duration_since(origin).as_millis();
                let estimate = frame.depth.as_ref().and_then(|d| sampler.sample(d));
                let size = frame
                    .depth
                    .as_ref()
                    .map(|d| format!("{}x{}", d.width(), d.height()))
                    .unwrap_or_else(|| "-".to_string());
                match estimate {
                    Some(d) => {
                        estimated += 1;
                        println!("{:>6} ms  {:>7}  {:<12} {:.2} m", t_ms, size, frame.tracking, d);
                    }
                    None => println!("{:>6} ms  {:>7}  {:<12} -", t_ms, size, frame.tracking),
                }
            }
            SensorEvent::Interrupted => println!("-- interrupted"),
            SensorEvent::Resumed => println!("-- resumed"),
            SensorEvent::Failed(e) => println!("-- error: {}", e),
        }
    }

    println!();
    println!("{} frames, {} with an estimate", frames, estimated);
    Ok(())
}

/// Print the effective config, or write the defaults
pub fn show_config(
    config_path: Option<&Path>,
    write: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if write {
        let path = match config_path {
            Some(path) => path.to_path_buf(),
            None => Config::default_path().ok_or("No config directory available")?,
        };
        Config::default().save(&path)?;
        println!("Config written: {}", path.display());
        return Ok(());
    }

    let config = Config::load_or_default(config_path)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn build_dispatcher(config: &Config, outputs: Outputs) -> AlertDispatcher {
    let haptics: Box<dyn HapticPort> = match outputs.haptics {
        HapticsBackend::Sysfs => Box::new(SysfsVibrator::new()),
        HapticsBackend::Log => Box::new(LogHaptics),
        HapticsBackend::Off => Box::new(NoHaptics),
    };
    let voice: Box<dyn VoicePort> = match outputs.voice {
        VoiceBackend::Speech => Box::new(SpeechCommand::new()),
        VoiceBackend::Log | VoiceBackend::Off => Box::new(LogVoice),
    };

    AlertDispatcher::new(haptics, voice).with_channels(
        config.haptics_enabled && outputs.haptics != HapticsBackend::Off,
        config.voice_enabled && outputs.voice != VoiceBackend::Off,
    )
}

fn run_session(
    config: &Config,
    outputs: Outputs,
    source: Box<dyn SensorSource>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = ObstacleSession::new(config, build_dispatcher(config, outputs));
    let observer = session.observer();
    session.start();

    let mut runner = SessionRunner::spawn("obstacle-frames", source, session)?;

    // Set up Ctrl+C handler
    let stop_flag = runner.stop_signal();
    ctrlc::set_handler(move || {
        stop_flag.store(true, Ordering::SeqCst);
    })?;

    println!("Running... (press Ctrl+C to stop)");
    println!();

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    rt.block_on(present(observer, &runner));

    let session = runner.join().ok_or("Frame loop ended abnormally")?;
    let stats = session.stats();
    println!();
    println!(
        "Session finished: {} frames, {} feedback events, {} announcements, {} sensor errors",
        stats.frames, stats.feedback_events, stats.announcements, stats.sensor_errors
    );
    Ok(())
}

/// Print published state changes until the frame loop ends
async fn present(mut observer: SessionObserver, runner: &SessionRunner) {
    let mut last: Option<(Option<i32>, TrackingQuality)> = None;

    loop {
        match tokio::time::timeout(OBSERVER_POLL, observer.changed()).await {
            Ok(Ok(())) => {
                let snapshot = observer.snapshot_and_mark_seen();
                // Decimeter resolution keeps the output readable
                let shown = (
                    snapshot.distance.map(|d| (d * 10.0).round() as i32),
                    snapshot.tracking,
                );
                if last != Some(shown) && snapshot.running {
                    last = Some(shown);
                    let distance = snapshot
                        .distance
                        .map(|d| format!("{:.1} m", d))
                        .unwrap_or_else(|| "--".to_string());
                    let marker = if snapshot.is_well_tracked() { "" } else { " (unreliable)" };
                    println!(
                        "[{}] {:>7}  {}{}",
                        Local::now().format("%H:%M:%S%.3f"),
                        distance,
                        snapshot.tracking,
                        marker
                    );
                }
            }
            Ok(Err(_)) => break,
            Err(_) => {}
        }

        if !runner.is_running() {
            break;
        }
    }
}

/// Interruption start and length from seconds on the command line
fn interruption_window(at: f32, length: f32) -> Result<(Duration, Duration), &'static str> {
    const INVALID: &str = "interruption start and length must be positive";
    if length <= 0.0 {
        return Err(INVALID);
    }
    let start = Duration::try_from_secs_f32(at).map_err(|_| INVALID)?;
    let length = Duration::try_from_secs_f32(length).map_err(|_| INVALID)?;
    Ok((start, length))
}

/// Default location for simulator recordings
fn default_recording_path() -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join(APP_DIR_NAME)
        .join(format!("recording_{}.jsonl", timestamp))
}
