//! Session playback
//!
//! Replay-side controller: walks an event log in capture order, emitting
//! each snapshot after its original inter-event gap scaled by a playback
//! speed factor that can change while the replay runs.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

use crate::event::EventLog;

/// Slowest accepted playback speed
pub const MIN_PLAYBACK_SPEED: f64 = 0.1;
/// Fastest accepted playback speed
pub const MAX_PLAYBACK_SPEED: f64 = 10.0;
/// Speed substituted for non-finite requests
pub const DEFAULT_PLAYBACK_SPEED: f64 = 1.0;

/// Replay lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReplayState {
    /// No replay in progress
    Idle,
    /// Snapshots are being emitted
    Playing,
    /// The last snapshot has been emitted
    Finished,
}

/// Events the scheduler emits to the rendering side
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ReplayEvent {
    /// Display this snapshot now
    Frame {
        /// Position of the snapshot in the log
        index: usize,
        /// Full content to render
        value: String,
    },
    /// Advisory remaining-time display update.
    ///
    /// Ticks once per scaled second while a replay runs. Purely cosmetic:
    /// the frame sequence always runs to completion regardless of what the
    /// countdown shows.
    TimeLeft {
        /// Estimated seconds of replay left at the current speed
        seconds: f64,
    },
    /// The full event sequence has been emitted
    Finished,
}

/// Replay scheduler with live-adjustable speed.
///
/// Drives two tasks per playback: the frame sequence, which sleeps out each
/// scaled gap and emits the next snapshot, and the advisory countdown. Both
/// are owned handles, so stopping or dropping the scheduler cancels all
/// pending emissions.
pub struct ReplayScheduler {
    /// Log being replayed; retained after finish for instant re-runs
    log: Option<Arc<EventLog>>,
    /// Index of the last emitted snapshot
    cursor: Arc<AtomicUsize>,
    /// Set by the sequence task after the final snapshot
    finished: Arc<AtomicBool>,
    /// Current speed factor; sequence task reads it per gap
    speed: watch::Sender<f64>,
    /// Wakes the countdown when the sequence completes
    done: Arc<Notify>,
    sequence: Option<JoinHandle<()>>,
    countdown: Option<JoinHandle<()>>,
    events: UnboundedSender<ReplayEvent>,
}

impl ReplayScheduler {
    /// Create a scheduler and the event stream it emits on
    pub fn new() -> (Self, UnboundedReceiver<ReplayEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let (speed, _) = watch::channel(DEFAULT_PLAYBACK_SPEED);
        let scheduler = Self {
            log: None,
            cursor: Arc::new(AtomicUsize::new(0)),
            finished: Arc::new(AtomicBool::new(false)),
            speed,
            done: Arc::new(Notify::new()),
            sequence: None,
            countdown: None,
            events,
        };
        (scheduler, receiver)
    }

    /// Start replaying a log, replacing any retained one.
    ///
    /// The first snapshot is emitted immediately; each later snapshot
    /// follows after its original gap divided by the playback speed. An
    /// empty log is ignored and the scheduler state does not change.
    ///
    /// Must be called from within a tokio runtime.
    pub fn play(&mut self, log: EventLog, speed: f64) {
        if log.is_empty() {
            tracing::debug!("ignoring replay of empty session log");
            return;
        }
        self.log = Some(Arc::new(log));
        self.start_playback(speed);
    }

    /// Replay the retained log from the beginning
    pub fn replay(&mut self, speed: f64) {
        if self.log.is_none() {
            return;
        }
        self.start_playback(speed);
    }

    /// Stop an active replay.
    ///
    /// Cancels every pending emission; on a current-thread runtime nothing
    /// arrives on the event stream afterwards, while a multi-thread runtime
    /// may still deliver an emission that was in flight when its task was
    /// aborted. The log is retained for `replay`. A no-op when idle or
    /// finished.
    pub fn stop(&mut self) {
        if self.state() != ReplayState::Playing {
            return;
        }
        self.stop_tasks();
        self.cursor.store(0, Ordering::SeqCst);
        tracing::info!("replay stopped");
    }

    /// Change the playback speed.
    ///
    /// Applies to every gap computed after the call; a gap already being
    /// slept keeps the speed it was scheduled with. While playing, the
    /// advisory countdown restarts from the unplayed remainder at the new
    /// speed. Non-finite values fall back to 1.0 and finite values are
    /// clamped to the supported range.
    pub fn set_speed(&mut self, speed: f64) {
        let speed = sanitize_speed(speed);
        self.speed.send_replace(speed);

        if self.state() == ReplayState::Playing {
            if let Some(task) = self.countdown.take() {
                task.abort();
            }
            if let Some(log) = &self.log {
                let from = self.cursor.load(Ordering::SeqCst);
                self.countdown = Some(self.spawn_countdown(Arc::clone(log), from));
            }
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ReplayState {
        if self.finished.load(Ordering::SeqCst) {
            ReplayState::Finished
        } else if self.sequence.is_some() {
            ReplayState::Playing
        } else {
            ReplayState::Idle
        }
    }

    /// Current speed factor
    pub fn speed(&self) -> f64 {
        *self.speed.borrow()
    }

    /// Index of the last emitted snapshot
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }

    /// Get the retained log
    pub fn log(&self) -> Option<&EventLog> {
        self.log.as_deref()
    }

    /// Estimated seconds of replay left at the current speed
    pub fn remaining_estimate_secs(&self) -> f64 {
        match &self.log {
            Some(log) => {
                let from = self.cursor.load(Ordering::SeqCst);
                remaining_span_ms(log, from) as f64 / 1000.0 / self.speed()
            }
            None => 0.0,
        }
    }

    /// Take back ownership of the retained log, cancelling any active
    /// replay first
    pub fn take_log(&mut self) -> Option<EventLog> {
        self.stop_tasks();
        self.finished.store(false, Ordering::SeqCst);
        self.cursor.store(0, Ordering::SeqCst);
        let log = self.log.take()?;
        Some(Arc::try_unwrap(log).unwrap_or_else(|shared| (*shared).clone()))
    }

    /// Launch the sequence and countdown tasks for the retained log
    fn start_playback(&mut self, speed: f64) {
        self.stop_tasks();

        let log = match &self.log {
            Some(log) => Arc::clone(log),
            None => return,
        };

        self.speed.send_replace(sanitize_speed(speed));
        self.cursor.store(0, Ordering::SeqCst);
        self.finished.store(false, Ordering::SeqCst);
        // Fresh per playback so a permit from a finished run cannot leak
        // into the next one.
        self.done = Arc::new(Notify::new());

        // The first snapshot goes out synchronously, before any scheduling.
        if let Some(first) = log.first() {
            let _ = self.events.send(ReplayEvent::Frame {
                index: 0,
                value: first.value.clone(),
            });
        }

        tracing::info!("replay started: {} events at {:.1}x", log.len(), self.speed());

        self.countdown = Some(self.spawn_countdown(Arc::clone(&log), 0));

        let cursor = Arc::clone(&self.cursor);
        let finished = Arc::clone(&self.finished);
        let done = Arc::clone(&self.done);
        let events = self.events.clone();
        let speed_rx = self.speed.subscribe();

        let handle = tokio::spawn(async move {
            for i in 1..log.len() {
                let gap_ms = log.events()[i]
                    .timestamp
                    .saturating_sub(log.events()[i - 1].timestamp);
                let speed = *speed_rx.borrow();
                tokio::time::sleep(scaled_delay(gap_ms, speed)).await;
                let _ = events.send(ReplayEvent::Frame {
                    index: i,
                    value: log.events()[i].value.clone(),
                });
                cursor.store(i, Ordering::SeqCst);
            }
            finished.store(true, Ordering::SeqCst);
            done.notify_one();
            let _ = events.send(ReplayEvent::Finished);
        });
        self.sequence = Some(handle);
    }

    /// Spawn the advisory countdown over the log tail starting at an index.
    ///
    /// The countdown captures the speed current at spawn time; `set_speed`
    /// replaces the whole task rather than adjusting a running one. It ends
    /// on its own when the displayed time runs out or when the sequence
    /// task signals completion, whichever comes first.
    fn spawn_countdown(&self, log: Arc<EventLog>, from: usize) -> JoinHandle<()> {
        let events = self.events.clone();
        let done = Arc::clone(&self.done);
        let speed = *self.speed.borrow();

        tokio::spawn(async move {
            let mut time_left = remaining_span_ms(&log, from) as f64 / 1000.0 / speed;
            let step = 1.0 / speed;
            let tick = Duration::from_secs_f64(step);

            let _ = events.send(ReplayEvent::TimeLeft { seconds: time_left });
            if time_left <= 1.0 {
                return;
            }
            loop {
                tokio::select! {
                    _ = done.notified() => break,
                    _ = tokio::time::sleep(tick) => {
                        time_left = (time_left - step).max(0.0);
                        let _ = events.send(ReplayEvent::TimeLeft { seconds: time_left });
                        if time_left <= 1.0 {
                            break;
                        }
                    }
                }
            }
        })
    }

    fn stop_tasks(&mut self) {
        if let Some(task) = self.sequence.take() {
            task.abort();
        }
        if let Some(task) = self.countdown.take() {
            task.abort();
        }
    }
}

impl Drop for ReplayScheduler {
    fn drop(&mut self) {
        self.stop_tasks();
    }
}

/// Clamp a requested speed factor to the supported range
fn sanitize_speed(speed: f64) -> f64 {
    if !speed.is_finite() {
        return DEFAULT_PLAYBACK_SPEED;
    }
    speed.clamp(MIN_PLAYBACK_SPEED, MAX_PLAYBACK_SPEED)
}

/// Scale an inter-event gap by the speed factor
fn scaled_delay(gap_ms: u64, speed: f64) -> Duration {
    Duration::from_secs_f64((gap_ms as f64 / 1000.0) / speed)
}

/// Log time between the event at `from` and the final event
fn remaining_span_ms(log: &EventLog, from: usize) -> u64 {
    match (log.get(from), log.last()) {
        (Some(from), Some(last)) => last.timestamp.saturating_sub(from.timestamp),
        _ => 0,
    }
}
