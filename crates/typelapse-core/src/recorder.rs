//! Session recorder
//!
//! Capture-side session controller: opens a time-bounded session, appends
//! one full-snapshot event per reported content change, and closes the
//! session on countdown expiry or explicit stop.

use std::mem;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::Instant;

use crate::event::EventLog;
use crate::format;
use crate::timer::SessionTimer;

/// Capture mode selecting the session duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureMode {
    /// Code entry session, 180 seconds
    Code,
    /// Free-text (prose) session, 360 seconds
    Prose,
}

impl CaptureMode {
    /// Total session duration for this mode
    pub fn duration(&self) -> Duration {
        match self {
            CaptureMode::Code => Duration::from_secs(180),
            CaptureMode::Prose => Duration::from_secs(360),
        }
    }
}

/// Recorder lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecorderState {
    /// No session started
    Idle,
    /// A session is running and accepting content changes
    Capturing,
    /// The session ended; the log is frozen and ready for export
    Stopped,
}

/// Why a capture session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// The session countdown ran out
    Expired,
    /// The user ended the session early
    Stopped,
}

/// Notifications the recorder sends to the embedding UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CaptureSignal {
    /// Remaining session time, sent once per elapsed second
    TimeLeft {
        /// Whole seconds left in the session
        seconds: u64,
    },
    /// The session ended and the finished log is ready for export
    SessionEnded {
        /// What ended the session
        reason: StopReason,
    },
}

/// Capture-side session controller.
///
/// Owns the event log and the session countdown. Exactly one signal stream
/// exists per recorder; the receiver half is handed out by `new`.
pub struct Recorder {
    mode: CaptureMode,
    state: RecorderState,
    log: EventLog,
    /// Wall-clock session start in Unix milliseconds
    started_at_ms: u64,
    /// Monotonic session start, for drift-free event timestamps
    started_instant: Option<Instant>,
    timer: SessionTimer,
    signals: UnboundedSender<CaptureSignal>,
}

impl Recorder {
    /// Create a recorder and the signal stream it reports on
    pub fn new(mode: CaptureMode) -> (Self, UnboundedReceiver<CaptureSignal>) {
        let (signals, receiver) = mpsc::unbounded_channel();
        let recorder = Self {
            mode,
            state: RecorderState::Idle,
            log: EventLog::new(),
            started_at_ms: 0,
            started_instant: None,
            timer: SessionTimer::new(mode.duration()),
            signals,
        };
        (recorder, receiver)
    }

    /// Start a capture session, discarding any previously captured log.
    ///
    /// The countdown begins immediately; `TimeLeft` signals follow once per
    /// second and a `SessionEnded` signal fires when the countdown expires.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        self.log.clear();
        self.state = RecorderState::Capturing;
        self.started_at_ms = Utc::now().timestamp_millis().max(0) as u64;
        self.started_instant = Some(Instant::now());

        let tick_signals = self.signals.clone();
        let expire_signals = self.signals.clone();
        self.timer.start(
            move |seconds| {
                let _ = tick_signals.send(CaptureSignal::TimeLeft { seconds });
            },
            move || {
                let _ = expire_signals.send(CaptureSignal::SessionEnded {
                    reason: StopReason::Expired,
                });
            },
        );
        tracing::info!(
            "capture session started ({:?}, {}s)",
            self.mode,
            self.mode.duration().as_secs()
        );
    }

    /// Record a content change reported by the editor.
    ///
    /// Appends one full-snapshot event stamped with the current session
    /// clock. Ignored unless a session is capturing; an expired countdown
    /// freezes the log even if the expiry signal has not been drained yet.
    pub fn content_changed(&mut self, value: impl Into<String>) {
        if self.timer.is_expired() {
            self.state = RecorderState::Stopped;
        }
        if self.state != RecorderState::Capturing {
            return;
        }
        let timestamp = self.now_ms();
        self.log.append(value, timestamp);
    }

    /// Stop the session before the countdown runs out.
    ///
    /// Cancels the countdown and freezes the log; the log stays readable
    /// until the next `start`. A no-op while idle or already stopped.
    pub fn stop(&mut self) {
        if self.timer.is_expired() {
            self.state = RecorderState::Stopped;
        }
        if self.state != RecorderState::Capturing {
            return;
        }
        self.timer.stop();
        self.state = RecorderState::Stopped;
        let _ = self.signals.send(CaptureSignal::SessionEnded {
            reason: StopReason::Stopped,
        });
        tracing::info!("capture session stopped with {} events", self.log.len());
    }

    /// Current lifecycle state.
    ///
    /// Countdown expiry moves the recorder to `Stopped` even before the
    /// expiry signal has been observed.
    pub fn state(&self) -> RecorderState {
        if self.state == RecorderState::Capturing && self.timer.is_expired() {
            RecorderState::Stopped
        } else {
            self.state
        }
    }

    /// Capture mode of this recorder
    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    /// Whole seconds left in the running session
    pub fn remaining_secs(&self) -> u64 {
        self.timer.remaining_secs()
    }

    /// Wall-clock session start in Unix milliseconds (zero before `start`)
    pub fn started_at_ms(&self) -> u64 {
        self.started_at_ms
    }

    /// Get the captured log
    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Get the number of captured events
    pub fn event_count(&self) -> usize {
        self.log.len()
    }

    /// Take ownership of the captured log, stopping the session first.
    ///
    /// The recorder is left with an empty log; a later `start` begins a
    /// fresh session.
    pub fn take_log(&mut self) -> EventLog {
        self.stop();
        mem::take(&mut self.log)
    }

    /// Serialize the captured log to the JSON interchange format
    pub fn export_json(&self) -> serde_json::Result<String> {
        format::to_json(&self.log)
    }

    /// Session clock: wall-clock start plus monotonic elapsed time
    fn now_ms(&self) -> u64 {
        let elapsed = self
            .started_instant
            .map(|start| start.elapsed().as_millis() as u64)
            .unwrap_or(0);
        self.started_at_ms + elapsed
    }
}
