// SPDX-License-Identifier: GPL-3.0-only

//! Frame-processing thread
//!
//! Pulls events from a [`SensorSource`] and feeds them to an
//! [`ObstacleSession`] on a dedicated thread, so all throttle state stays
//! owned by a single context. The session is handed back when the thread
//! ends, either because the source ran dry or because a stop was requested.

use super::ObstacleSession;
use crate::backends::sensor::SensorSource;
use crate::errors::{AppError, AppResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Controller for a session running on its own thread
pub struct SessionRunner {
    thread_handle: Option<JoinHandle<ObstacleSession>>,
    stop_signal: Arc<AtomicBool>,
    name: String,
}

impl SessionRunner {
    /// Spawn the frame loop
    ///
    /// The session should already be started; frames arriving at an idle
    /// session are ignored. The session is stopped when the loop exits.
    pub fn spawn(
        name: &str,
        mut source: Box<dyn SensorSource>,
        mut session: ObstacleSession,
    ) -> AppResult<Self> {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let stop_signal_clone = Arc::clone(&stop_signal);
        let name_clone = name.to_string();

        info!(name = %name, source = source.name(), session = %session.id(), "Starting frame loop");

        let thread_handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                loop {
                    if stop_signal_clone.load(Ordering::SeqCst) {
                        debug!(name = %name_clone, "Stop signal received");
                        break;
                    }
                    match source.next_event() {
                        Some(event) => session.handle_event(event),
                        None => {
                            debug!(name = %name_clone, source = source.name(), "Sensor stream ended");
                            break;
                        }
                    }
                }
                session.stop();
                info!(name = %name_clone, "Frame loop exiting");
                session
            })
            .map_err(|e| AppError::Other(format!("failed to start frame loop: {}", e)))?;

        Ok(Self {
            thread_handle: Some(thread_handle),
            stop_signal,
            name: name.to_string(),
        })
    }

    /// Whether the loop thread is still alive
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Shared stop flag, e.g. for a Ctrl-C handler
    pub fn stop_signal(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop_signal)
    }

    /// Ask the loop to stop after the current event (non-blocking)
    pub fn request_stop(&self) {
        debug!(name = %self.name, "Requesting frame loop stop");
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Wait for the loop to finish and take the session back
    ///
    /// Returns `None` if the thread panicked or was already joined.
    pub fn join(&mut self) -> Option<ObstacleSession> {
        let handle = self.thread_handle.take()?;
        debug!(name = %self.name, "Waiting for frame loop to finish");
        match handle.join() {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(name = %self.name, "Frame loop thread panicked: {:?}", e);
                None
            }
        }
    }

    /// Request a stop and wait for the session
    pub fn stop(&mut self) -> Option<ObstacleSession> {
        self.request_stop();
        self.join()
    }
}

impl Drop for SessionRunner {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!(name = %self.name, "SessionRunner dropped, stopping frame loop");
            self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::haptics::NoHaptics;
    use crate::backends::sensor::{SensorEvent, SensorFrame, TrackingQuality};
    use crate::backends::voice::LogVoice;
    use crate::config::Config;
    use crate::depth::DepthFrame;
    use crate::feedback::AlertDispatcher;
    use std::time::{Duration, Instant};

    /// Emits a fixed number of frames, optionally sleeping between them
    struct CountingSource {
        remaining: usize,
        pause: Duration,
        origin: Instant,
        sent: u32,
    }

    impl SensorSource for CountingSource {
        fn name(&self) -> &str {
            "counting"
        }

        fn next_event(&mut self) -> Option<SensorEvent> {
            if self.remaining == 0 {
                return None;
            }
            self.remaining -= 1;
            thread::sleep(self.pause);
            self.sent += 1;
            Some(SensorEvent::Frame(SensorFrame {
                depth: Some(DepthFrame::filled(8, 8, 1.2)),
                tracking: TrackingQuality::Mapped,
                captured_at: self.origin + Duration::from_millis(100) * self.sent,
            }))
        }
    }

    fn started_session() -> ObstacleSession {
        let dispatcher = AlertDispatcher::new(Box::new(NoHaptics), Box::new(LogVoice));
        let mut session = ObstacleSession::new(&Config::default(), dispatcher);
        session.start();
        session
    }

    #[test]
    fn test_runs_until_source_ends() {
        let source = CountingSource {
            remaining: 5,
            pause: Duration::ZERO,
            origin: Instant::now(),
            sent: 0,
        };
        let mut runner = SessionRunner::spawn("test-run", Box::new(source), started_session())
            .unwrap();
        let session = runner.join().expect("session returned");
        assert_eq!(session.stats().frames, 5);
        assert!(!session.is_running());
        assert!(!runner.is_running());
    }

    #[test]
    fn test_stop_request() {
        let source = CountingSource {
            remaining: usize::MAX,
            pause: Duration::from_millis(5),
            origin: Instant::now(),
            sent: 0,
        };
        let session = started_session();
        let observer = session.observer();
        let mut runner = SessionRunner::spawn("test-stop", Box::new(source), session).unwrap();
        thread::sleep(Duration::from_millis(50));
        assert!(runner.is_running());

        let session = runner.stop().expect("session returned");
        assert!(session.stats().frames > 0);
        assert!(!observer.is_running());
        assert_eq!(observer.current_distance(), None);
    }
}
