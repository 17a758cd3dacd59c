// SPDX-License-Identifier: GPL-3.0-only

//! JSON-lines sensor recordings
//!
//! One entry per line, tagged by `kind`:
//!
//! ```text
//! {"kind":"frame","t_ms":0,"tracking":"mapped","width":4,"height":4,"depth":[...]}
//! {"kind":"interrupted","t_ms":1200}
//! {"kind":"resumed","t_ms":2500}
//! ```
//!
//! `t_ms` is the offset from the start of the recording. Missing depth is
//! written as `null`; dropout pixels as `0`.

use super::{SensorEvent, SensorSource, TrackingQuality};
use crate::depth::DepthFrame;
use crate::errors::{SensorError, SensorResult};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// One line of a recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordEntry {
    Frame {
        t_ms: u64,
        #[serde(default)]
        tracking: TrackingQuality,
        width: u32,
        height: u32,
        #[serde(default)]
        depth: Option<Vec<f32>>,
    },
    Interrupted {
        t_ms: u64,
    },
    Resumed {
        t_ms: u64,
    },
}

impl RecordEntry {
    pub fn t_ms(&self) -> u64 {
        match self {
            RecordEntry::Frame { t_ms, .. }
            | RecordEntry::Interrupted { t_ms }
            | RecordEntry::Resumed { t_ms } => *t_ms,
        }
    }
}

/// Writes sensor events to a recording file
pub struct RecordingWriter {
    writer: Box<dyn Write + Send>,
    origin: Option<Instant>,
    last_t_ms: u64,
    entries: u64,
}

impl RecordingWriter {
    /// Create (or truncate) a recording file
    pub fn create(path: &Path) -> SensorResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        info!(path = %path.display(), "Recording sensor events");
        Ok(Self::new(BufWriter::new(file)))
    }

    /// Record into any writer
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Box::new(writer),
            origin: None,
            last_t_ms: 0,
            entries: 0,
        }
    }

    /// Number of entries written so far
    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Append one event
    ///
    /// Frames are timed by their capture time; other events reuse the time of
    /// the last frame. Errors are not recorded.
    pub fn record(&mut self, event: &SensorEvent) -> SensorResult<()> {
        let entry = match event {
            SensorEvent::Frame(frame) => {
                let origin = *self.origin.get_or_insert(frame.captured_at);
                self.last_t_ms = frame
                    .captured_at
                    .saturating_duration_since(origin)
                    .as_millis() as u64;
                RecordEntry::Frame {
                    t_ms: self.last_t_ms,
                    tracking: frame.tracking,
                    width: frame.depth.as_ref().map_or(0, DepthFrame::width),
                    height: frame.depth.as_ref().map_or(0, DepthFrame::height),
                    depth: frame.depth.as_ref().map(|d| {
                        d.readings()
                            .iter()
                            .map(|&m| if DepthFrame::is_valid_reading(m) { m } else { 0.0 })
                            .collect()
                    }),
                }
            }
            SensorEvent::Interrupted => RecordEntry::Interrupted {
                t_ms: self.last_t_ms,
            },
            SensorEvent::Resumed => RecordEntry::Resumed {
                t_ms: self.last_t_ms,
            },
            SensorEvent::Failed(_) => return Ok(()),
        };

        let line = serde_json::to_string(&entry)
            .map_err(|e| SensorError::Io(format!("failed to encode entry: {}", e)))?;
        writeln!(self.writer, "{}", line)?;
        self.entries += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> SensorResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}

impl Drop for RecordingWriter {
    fn drop(&mut self) {
        if let Err(e) = self.writer.flush() {
            warn!(error = %e, "Failed to flush recording");
        }
    }
}

/// Source adaptor that records every event it passes through
pub struct RecordingTee<S> {
    inner: S,
    writer: RecordingWriter,
    name: String,
}

impl<S: SensorSource> RecordingTee<S> {
    pub fn new(inner: S, writer: RecordingWriter) -> Self {
        let name = format!("{}+recording", inner.name());
        Self {
            inner,
            writer,
            name,
        }
    }
}

impl<S: SensorSource> SensorSource for RecordingTee<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_event(&mut self) -> Option<SensorEvent> {
        let event = self.inner.next_event();
        match &event {
            Some(event) => {
                if let Err(e) = self.writer.record(event) {
                    warn!(error = %e, "Failed to record sensor event");
                }
            }
            None => {
                if let Err(e) = self.writer.flush() {
                    warn!(error = %e, "Failed to flush recording");
                }
                info!(entries = self.writer.entries(), "Recording finished");
            }
        }
        event
    }
}
