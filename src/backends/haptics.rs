// SPDX-License-Identifier: GPL-3.0-only

//! Haptic output
//!
//! [`SysfsVibrator`] drives a vibration motor exposed through the Linux LED
//! class (`/sys/class/leds/*vibrator*`) with the transient trigger: writing
//! `duration` then `state` and `activate` runs the motor once for that many
//! milliseconds. `brightness` scales the strength where the driver supports it.

use crate::constants::haptics::{ALERT_SPACING, TRANSIENT, URGENT_PULSE};
use crate::errors::{PortError, PortResult};
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Vibration shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HapticPattern {
    /// Single soft transient
    Notice,
    /// Two transients ~120 ms apart
    Alert,
    /// One continuous ~0.3 s pulse
    Urgent,
}

/// One motor activation within a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HapticPulse {
    /// Start relative to the beginning of the pattern
    pub offset: Duration,
    pub duration: Duration,
}

impl HapticPattern {
    pub fn pulses(self) -> Vec<HapticPulse> {
        let at = |offset, duration| HapticPulse { offset, duration };
        match self {
            HapticPattern::Notice => vec![at(Duration::ZERO, TRANSIENT)],
            HapticPattern::Alert => vec![at(Duration::ZERO, TRANSIENT), at(ALERT_SPACING, TRANSIENT)],
            HapticPattern::Urgent => vec![at(Duration::ZERO, URGENT_PULSE)],
        }
    }
}

/// Haptic actuator driver
///
/// `play` must return quickly; patterns longer than a single write are played
/// in the background.
pub trait HapticPort: Send {
    /// Name for logging
    fn name(&self) -> &str;

    /// Acquire the device at session start
    fn prepare(&mut self) -> PortResult<()> {
        Ok(())
    }

    /// Play a pattern at `intensity` (0.0 - 1.0)
    fn play(&self, intensity: f32, pattern: HapticPattern) -> PortResult<()>;
}

/// Logs patterns instead of vibrating (desktop runs, replays)
#[derive(Debug, Default)]
pub struct LogHaptics;

impl HapticPort for LogHaptics {
    fn name(&self) -> &str {
        "log"
    }

    fn play(&self, intensity: f32, pattern: HapticPattern) -> PortResult<()> {
        info!(?pattern, intensity, "Haptic feedback");
        Ok(())
    }
}

/// Stand-in for devices without a vibration motor
#[derive(Debug, Default)]
pub struct NoHaptics;

impl HapticPort for NoHaptics {
    fn name(&self) -> &str {
        "none"
    }

    fn prepare(&mut self) -> PortResult<()> {
        Err(PortError::Unavailable("no haptic hardware".into()))
    }

    fn play(&self, _intensity: f32, _pattern: HapticPattern) -> PortResult<()> {
        Err(PortError::Unavailable("no haptic hardware".into()))
    }
}

/// A vibrator LED-class device discovered via sysfs
#[derive(Debug, Clone)]
struct VibratorDevice {
    /// Sysfs path, e.g. `/sys/class/leds/vibrator`
    path: PathBuf,
    /// Maximum brightness value (from `max_brightness` file)
    max_brightness: u32,
}

impl VibratorDevice {
    fn write(&self, file: &str, value: impl ToString) -> io::Result<()> {
        std::fs::write(self.path.join(file), value.to_string())
    }

    /// Run the motor once for `duration` at `intensity`
    fn pulse(&self, intensity: f32, duration: Duration) -> io::Result<()> {
        let level = (intensity.clamp(0.0, 1.0) * self.max_brightness as f32).round() as u32;
        self.write("brightness", level.max(1))?;
        self.write("duration", duration.as_millis())?;
        self.write("state", 1)?;
        self.write("activate", 1)
    }
}

/// Vibration motor driven through sysfs
pub struct SysfsVibrator {
    leds_dir: PathBuf,
    device: Option<VibratorDevice>,
    /// Set while a multi-pulse pattern is still playing
    playing: Arc<AtomicBool>,
}

impl SysfsVibrator {
    pub fn new() -> Self {
        Self::with_leds_dir("/sys/class/leds")
    }

    /// Look for the vibrator under a different LED class directory
    pub fn with_leds_dir(leds_dir: impl Into<PathBuf>) -> Self {
        Self {
            leds_dir: leds_dir.into(),
            device: None,
            playing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Scan the LED class directory for a writable `*vibrator*` entry
    fn discover(&self) -> PortResult<VibratorDevice> {
        let entries = std::fs::read_dir(&self.leds_dir).map_err(|e| {
            PortError::Unavailable(format!("cannot read {}: {}", self.leds_dir.display(), e))
        })?;

        let mut candidates: Vec<PathBuf> = entries
            .flatten()
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.contains("vibrator"))
            })
            .map(|entry| entry.path())
            .collect();
        candidates.sort();

        let mut permission_failures = Vec::new();
        for path in candidates {
            let max_brightness_path = path.join("max_brightness");
            let max_brightness = match std::fs::read_to_string(&max_brightness_path) {
                Ok(s) => match s.trim().parse::<u32>() {
                    Ok(v) if v > 0 => v,
                    _ => {
                        warn!(path = %max_brightness_path.display(), "Invalid max_brightness value");
                        continue;
                    }
                },
                Err(e) => {
                    warn!(path = %max_brightness_path.display(), error = %e, "Cannot read max_brightness");
                    continue;
                }
            };

            let activate_path = path.join("activate");
            match std::fs::OpenOptions::new().write(true).open(&activate_path) {
                Ok(_) => {
                    info!(path = %path.display(), max_brightness, "Discovered vibrator");
                    return Ok(VibratorDevice {
                        path,
                        max_brightness,
                    });
                }
                Err(e) => {
                    warn!(path = %activate_path.display(), error = %e, "Vibrator found but not writable");
                    permission_failures.push(activate_path);
                }
            }
        }

        match permission_failures.first() {
            Some(path) => Err(PortError::Unavailable(permission_hint(path))),
            None => Err(PortError::Unavailable("no vibrator device found".into())),
        }
    }
}

impl Default for SysfsVibrator {
    fn default() -> Self {
        Self::new()
    }
}

impl HapticPort for SysfsVibrator {
    fn name(&self) -> &str {
        "sysfs"
    }

    fn prepare(&mut self) -> PortResult<()> {
        let device = self.discover()?;
        // The transient trigger exposes duration/state/activate
        let trigger = device.path.join("trigger");
        if trigger.exists() {
            device.write("trigger", "transient")?;
        }
        self.device = Some(device);
        Ok(())
    }

    fn play(&self, intensity: f32, pattern: HapticPattern) -> PortResult<()> {
        let device = self
            .device
            .as_ref()
            .ok_or_else(|| PortError::Unavailable("vibrator not prepared".into()))?;

        let pulses = pattern.pulses();
        if let [single] = pulses.as_slice()
            && single.offset.is_zero()
        {
            device.pulse(intensity, single.duration)?;
            return Ok(());
        }

        if self.playing.swap(true, Ordering::SeqCst) {
            return Err(PortError::Busy);
        }

        let device = device.clone();
        let playing = Arc::clone(&self.playing);
        let spawned = std::thread::Builder::new()
            .name("haptic-pattern".into())
            .spawn(move || {
                let mut elapsed = Duration::ZERO;
                for pulse in pulses {
                    if pulse.offset > elapsed {
                        std::thread::sleep(pulse.offset - elapsed);
                        elapsed = pulse.offset;
                    }
                    if let Err(e) = device.pulse(intensity, pulse.duration) {
                        warn!(error = %e, "Vibrator write failed mid-pattern");
                        break;
                    }
                }
                playing.store(false, Ordering::SeqCst);
                debug!("Haptic pattern finished");
            });

        if let Err(e) = spawned {
            self.playing.store(false, Ordering::SeqCst);
            return Err(PortError::Io(e.to_string()));
        }
        Ok(())
    }
}

/// User-facing hint for a vibrator that exists but is not writable
fn permission_hint(path: &Path) -> String {
    let username = std::env::var("USER").unwrap_or_else(|_| "user".to_string());

    let group = std::fs::metadata(path)
        .ok()
        .and_then(|meta| {
            let gid = meta.gid();
            let groups = std::fs::read_to_string("/etc/group").ok()?;
            groups.lines().find_map(|line| {
                let parts: Vec<&str> = line.split(':').collect();
                (parts.len() >= 3 && parts[2].parse::<u32>().ok() == Some(gid))
                    .then(|| parts[0].to_string())
            })
        })
        .unwrap_or_else(|| "feedbackd".to_string());

    format!(
        "vibrator detected but cannot be controlled; run: sudo adduser {} {}",
        username, group
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_leds_dir(device: &str) -> PathBuf {
        let root = std::env::temp_dir().join(format!("leds-{}", uuid::Uuid::new_v4()));
        let dev = root.join(device);
        std::fs::create_dir_all(&dev).unwrap();
        for (file, contents) in [
            ("max_brightness", "255\n"),
            ("brightness", "0"),
            ("trigger", "none"),
            ("duration", "0"),
            ("state", "0"),
            ("activate", "0"),
        ] {
            std::fs::write(dev.join(file), contents).unwrap();
        }
        root
    }

    fn read(root: &Path, device: &str, file: &str) -> String {
        std::fs::read_to_string(root.join(device).join(file)).unwrap()
    }

    #[test]
    fn test_pattern_shapes() {
        assert_eq!(HapticPattern::Notice.pulses().len(), 1);

        let alert = HapticPattern::Alert.pulses();
        assert_eq!(alert.len(), 2);
        assert_eq!(alert[1].offset, Duration::from_millis(120));

        let urgent = HapticPattern::Urgent.pulses();
        assert_eq!(urgent.len(), 1);
        assert_eq!(urgent[0].duration, Duration::from_millis(300));
    }

    #[test]
    fn test_sysfs_single_pulse() {
        let root = fake_leds_dir("vibrator");
        let mut vibrator = SysfsVibrator::with_leds_dir(&root);
        vibrator.prepare().unwrap();
        assert_eq!(read(&root, "vibrator", "trigger"), "transient");

        vibrator.play(0.4, HapticPattern::Notice).unwrap();
        assert_eq!(read(&root, "vibrator", "brightness"), "102");
        assert_eq!(read(&root, "vibrator", "duration"), "30");
        assert_eq!(read(&root, "vibrator", "activate"), "1");

        vibrator.play(1.0, HapticPattern::Urgent).unwrap();
        assert_eq!(read(&root, "vibrator", "duration"), "300");

        std::fs::remove_dir_all(root).ok();
    }

    #[test]
    fn test_sysfs_missing_device() {
        let root = fake_leds_dir("white:flash");
        let mut vibrator = SysfsVibrator::with_leds_dir(&root);
        assert!(matches!(vibrator.prepare(), Err(PortError::Unavailable(_))));
        assert!(vibrator.play(1.0, HapticPattern::Notice).is_err());
        std::fs::remove_dir_all(root).ok();
    }

    #[test]
    fn test_no_haptics_is_unavailable() {
        let mut port = NoHaptics;
        assert!(port.prepare().is_err());
        assert!(LogHaptics.play(0.4, HapticPattern::Notice).is_ok());
    }
}
