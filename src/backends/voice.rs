// SPDX-License-Identifier: GPL-3.0-only

//! Spoken output
//!
//! [`SpeechCommand`] hands phrases to speech-dispatcher through `spd-say`.
//! The client only queues the phrase, so a newer phrase is sent with
//! `--cancel` while an earlier one may still be speaking. Phrases use the
//! `message` priority so they pre-empt ordinary screen reader text.

use crate::constants::phrases::SUPERSEDE_WINDOW;
use crate::errors::{PortError, PortResult};
use std::process::{Child, Command, Stdio};
use std::sync::Mutex;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Text-to-speech / accessibility announcer
pub trait VoicePort: Send {
    /// Name for logging
    fn name(&self) -> &str;

    /// Speak `text` without waiting for it to finish
    fn announce(&self, text: &str) -> PortResult<()>;
}

/// Logs phrases instead of speaking them
#[derive(Debug, Default)]
pub struct LogVoice;

impl VoicePort for LogVoice {
    fn name(&self) -> &str {
        "log"
    }

    fn announce(&self, text: &str) -> PortResult<()> {
        info!(phrase = text, "Spoken feedback");
        Ok(())
    }
}

/// Speaks through an external command (`spd-say` by default)
pub struct SpeechCommand {
    program: String,
    args: Vec<String>,
    /// Inserted before the phrase when it supersedes a recent one
    supersede_args: Vec<String>,
    last: Mutex<Option<Spoken>>,
}

struct Spoken {
    child: Child,
    started: Instant,
}

impl SpeechCommand {
    pub fn new() -> Self {
        Self::with_program("spd-say", ["--priority", "message"]).superseding_with(["--cancel"])
    }

    /// Use a different speech program; the phrase is appended as the last argument
    pub fn with_program<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            supersede_args: Vec::new(),
            last: Mutex::new(None),
        }
    }

    /// Extra arguments that cancel speech already queued by the program
    pub fn superseding_with<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supersede_args = args.into_iter().map(Into::into).collect();
        self
    }

    fn command_args(&self, last: Option<&Spoken>, text: &str, now: Instant) -> Vec<String> {
        let supersede =
            last.is_some_and(|s| now.saturating_duration_since(s.started) < SUPERSEDE_WINDOW);
        let mut args = self.args.clone();
        if supersede {
            args.extend(self.supersede_args.iter().cloned());
        }
        args.push(text.to_string());
        args
    }
}

impl Default for SpeechCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl VoicePort for SpeechCommand {
    fn name(&self) -> &str {
        &self.program
    }

    fn announce(&self, text: &str) -> PortResult<()> {
        let mut last = self.last.lock().map_err(|_| PortError::Busy)?;

        // Programs that speak in-process stop when killed
        if let Some(spoken) = last.as_mut() {
            match spoken.child.try_wait() {
                Ok(Some(_)) => {}
                Ok(None) => {
                    debug!(program = %self.program, "Superseding unfinished phrase");
                    if let Err(e) = spoken.child.kill() {
                        warn!(error = %e, "Failed to stop previous phrase");
                    }
                    let _ = spoken.child.wait();
                }
                Err(e) => warn!(error = %e, "Failed to poll speech process"),
            }
        }

        let now = Instant::now();
        let args = self.command_args(last.as_ref(), text, now);
        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| PortError::Unavailable(format!("{}: {}", self.program, e)))?;

        debug!(program = %self.program, phrase = text, "Speaking");
        *last = Some(Spoken {
            child,
            started: now,
        });
        Ok(())
    }
}

impl Drop for SpeechCommand {
    fn drop(&mut self) {
        if let Ok(mut last) = self.last.lock()
            && let Some(mut spoken) = last.take()
        {
            let _ = spoken.child.kill();
            let _ = spoken.child.wait();
        }
    }
}
