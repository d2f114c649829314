//! Session countdown timer
//!
//! A single countdown bounds each capture session and fires an expiry
//! callback exactly once when it runs out.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Countdown timer ticking once per elapsed second.
///
/// The running countdown is an owned task handle, so dropping or restarting
/// the timer always cancels it; a discarded timer can never fire into a
/// session that no longer exists.
pub struct SessionTimer {
    /// Full countdown duration
    duration: Duration,
    /// Whole seconds left, updated by the running task
    remaining_secs: Arc<AtomicU64>,
    /// Set when the countdown reaches zero
    expired: Arc<AtomicBool>,
    /// The running countdown task, if any
    task: Option<JoinHandle<()>>,
}

impl SessionTimer {
    /// Create a timer for the given duration. It does not run until `start`.
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            remaining_secs: Arc::new(AtomicU64::new(duration.as_secs())),
            expired: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }

    /// Start (or restart) the countdown from the full duration.
    ///
    /// Any countdown already running is cancelled first; there is never more
    /// than one. `on_tick` receives the remaining whole seconds after each
    /// elapsed second. `on_expire` fires exactly once when the countdown
    /// reaches zero, after which the timer is inert until restarted.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<T, F>(&mut self, mut on_tick: T, on_expire: F)
    where
        T: FnMut(u64) + Send + 'static,
        F: FnOnce() + Send + 'static,
    {
        self.stop();

        // Fresh state per run so a cancelled task from a previous run can
        // never write into this one.
        self.remaining_secs = Arc::new(AtomicU64::new(self.duration.as_secs()));
        self.expired = Arc::new(AtomicBool::new(false));

        let remaining = Arc::clone(&self.remaining_secs);
        let expired = Arc::clone(&self.expired);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(1));
            // The first tick completes immediately; consume it so the loop
            // below ticks once per elapsed second.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let left = remaining.load(Ordering::SeqCst).saturating_sub(1);
                remaining.store(left, Ordering::SeqCst);
                on_tick(left);
                if left == 0 {
                    expired.store(true, Ordering::SeqCst);
                    on_expire();
                    break;
                }
            }
        });
        self.task = Some(handle);
    }

    /// Stop the countdown without firing the expiry callback.
    ///
    /// Idempotent: stopping an idle or already-expired timer is a no-op.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Check if the countdown is currently running
    pub fn is_running(&self) -> bool {
        self.task.as_ref().map(|t| !t.is_finished()).unwrap_or(false)
    }

    /// Check if the countdown has reached zero
    pub fn is_expired(&self) -> bool {
        self.expired.load(Ordering::SeqCst)
    }

    /// Remaining whole seconds
    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs.load(Ordering::SeqCst)
    }

    /// Full countdown duration
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
