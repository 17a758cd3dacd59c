// SPDX-License-Identifier: GPL-3.0-only

//! Recorded sensor playback
//!
//! Streams a JSON-lines recording (see [`super::recording`]) as sensor
//! events. Frame timestamps come from the recording, so throttling behaves
//! the same whether the file is played in real time or as fast as possible.

use super::recording::RecordEntry;
use super::{SensorEvent, SensorFrame, SensorSource};
use crate::depth::DepthFrame;
use crate::errors::{SensorError, SensorResult};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How fast a recording is played back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pacing {
    /// Sleep until each entry is due
    Realtime,
    /// Emit entries back to back
    #[default]
    AsFastAsPossible,
}

/// Sensor source reading a recording
pub struct ReplaySource {
    lines: Box<dyn BufRead + Send>,
    pacing: Pacing,
    origin: Instant,
    line_number: usize,
    name: String,
}

impl ReplaySource {
    /// Open a recording file
    pub fn open(path: &Path, pacing: Pacing) -> SensorResult<Self> {
        let file = File::open(path).map_err(|e| {
            SensorError::Unavailable(format!("cannot open {}: {}", path.display(), e))
        })?;
        info!(path = %path.display(), ?pacing, "Opened sensor recording");
        Ok(Self::from_reader(BufReader::new(file), pacing)
            .named(path.display().to_string()))
    }

    /// Replay from any buffered reader
    pub fn from_reader(reader: impl BufRead + Send + 'static, pacing: Pacing) -> Self {
        Self {
            lines: Box::new(reader),
            pacing,
            origin: Instant::now(),
            line_number: 0,
            name: "replay".to_string(),
        }
    }

    fn named(mut self, name: String) -> Self {
        self.name = name;
        self
    }

    fn read_entry(&mut self) -> Option<Result<RecordEntry, SensorError>> {
        let mut line = String::new();
        loop {
            line.clear();
            self.line_number += 1;
            match self.lines.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) if line.trim().is_empty() => continue,
                Ok(_) => {
                    return Some(serde_json::from_str(line.trim()).map_err(|e| {
                        SensorError::Parse {
                            line: self.line_number,
                            message: e.to_string(),
                        }
                    }));
                }
                Err(e) => return Some(Err(SensorError::Io(e.to_string()))),
            }
        }
    }

    fn wait_until(&self, due: Instant) {
        if self.pacing == Pacing::Realtime {
            let now = Instant::now();
            if due > now {
                std::thread::sleep(due - now);
            }
        }
    }

    fn to_event(&self, entry: RecordEntry) -> SensorEvent {
        match entry {
            RecordEntry::Frame {
                t_ms,
                tracking,
                width,
                height,
                depth,
            } => {
                let captured_at = self.origin + Duration::from_millis(t_ms);
                let depth = match depth {
                    Some(readings) => match DepthFrame::new(width, height, readings) {
                        Ok(frame) => Some(frame),
                        Err(e) => return SensorEvent::Failed(e),
                    },
                    None => None,
                };
                SensorEvent::Frame(SensorFrame {
                    depth,
                    tracking,
                    captured_at,
                })
            }
            RecordEntry::Interrupted { .. } => SensorEvent::Interrupted,
            RecordEntry::Resumed { .. } => SensorEvent::Resumed,
        }
    }
}

impl SensorSource for ReplaySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_event(&mut self) -> Option<SensorEvent> {
        match self.read_entry()? {
            Ok(entry) => {
                self.wait_until(self.origin + Duration::from_millis(entry.t_ms()));
                Some(self.to_event(entry))
            }
            Err(e) => {
                warn!(source = %self.name, error = %e, "Skipping unreadable recording entry");
                debug!(line = self.line_number, "Recording position");
                Some(SensorEvent::Failed(e))
            }
        }
    }
}
