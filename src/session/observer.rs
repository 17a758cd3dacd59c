// SPDX-License-Identifier: GPL-3.0-only

//! Published session state
//!
//! The frame thread is the only writer; any number of presentation readers
//! hold a [`SessionObserver`]. Backed by a `tokio::sync::watch` channel, which
//! works from plain threads as well as async tasks and always holds only the
//! latest value.

use crate::backends::sensor::TrackingQuality;
use tokio::sync::watch;

/// Latest state published by a session
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SessionSnapshot {
    /// Nearest obstacle distance from the latest frame (meters)
    pub distance: Option<f32>,
    /// Mapping status from the latest frame
    pub tracking: TrackingQuality,
    /// Session is consuming frames
    pub running: bool,
}

impl SessionSnapshot {
    pub fn is_well_tracked(&self) -> bool {
        self.tracking.is_well_tracked()
    }
}

/// Write side, owned by the session
#[derive(Debug)]
pub(crate) struct StatePublisher {
    sender: watch::Sender<SessionSnapshot>,
}

impl StatePublisher {
    pub(crate) fn new() -> Self {
        let (sender, _) = watch::channel(SessionSnapshot::default());
        Self { sender }
    }

    pub(crate) fn observer(&self) -> SessionObserver {
        SessionObserver {
            receiver: self.sender.subscribe(),
        }
    }

    pub(crate) fn current(&self) -> SessionSnapshot {
        *self.sender.borrow()
    }

    /// Apply a change, notifying readers only if something actually changed
    pub(crate) fn update(&self, change: impl FnOnce(&mut SessionSnapshot)) {
        self.sender.send_if_modified(|snapshot| {
            let before = *snapshot;
            change(snapshot);
            *snapshot != before
        });
    }
}

/// Read-only handle for the presentation layer
#[derive(Debug, Clone)]
pub struct SessionObserver {
    receiver: watch::Receiver<SessionSnapshot>,
}

impl SessionObserver {
    /// Latest published state
    pub fn snapshot(&self) -> SessionSnapshot {
        *self.receiver.borrow()
    }

    /// Latest state, marking it as seen
    pub fn snapshot_and_mark_seen(&mut self) -> SessionSnapshot {
        *self.receiver.borrow_and_update()
    }

    pub fn current_distance(&self) -> Option<f32> {
        self.snapshot().distance
    }

    pub fn is_well_tracked(&self) -> bool {
        self.snapshot().is_well_tracked()
    }

    pub fn tracking(&self) -> TrackingQuality {
        self.snapshot().tracking
    }

    pub fn is_running(&self) -> bool {
        self.snapshot().running
    }

    /// Whether something was published since the last `snapshot_and_mark_seen`
    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }

    /// Wait for the next change; errors once the session is gone
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.receiver.changed().await
    }
}
