//! Latency analysis
//!
//! Flags events that took noticeably longer to produce than their
//! predecessor, for highlight rendering over line-oriented content.

use std::collections::BTreeSet;

use crate::event::EventLog;

/// Default highlight threshold in milliseconds
pub const DEFAULT_HIGHLIGHT_THRESHOLD_MS: u64 = 3000;

/// Derives the set of slow-event indices from a log's timestamp gaps.
///
/// The threshold can change between calls; results are recomputed each time
/// rather than cached, since logs are session sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyAnalyzer {
    threshold_ms: u64,
}

impl LatencyAnalyzer {
    /// Create an analyzer with the given threshold in milliseconds
    pub fn new(threshold_ms: u64) -> Self {
        Self { threshold_ms }
    }

    /// Current threshold in milliseconds
    pub fn threshold_ms(&self) -> u64 {
        self.threshold_ms
    }

    /// Change the threshold
    pub fn set_threshold(&mut self, threshold_ms: u64) {
        self.threshold_ms = threshold_ms;
    }

    /// 1-based indices of events whose gap to the previous event strictly
    /// exceeds the threshold.
    ///
    /// Index `i` refers to the event at log position `i`, counting the
    /// first event as position zero with no gap of its own. Empty and
    /// single-event logs produce an empty set, as do backwards timestamps
    /// (negative gaps clamp to zero).
    pub fn highlight_indices(&self, log: &EventLog) -> BTreeSet<usize> {
        let events = log.events();
        let mut slow = BTreeSet::new();
        for i in 1..events.len() {
            let gap = events[i].timestamp.saturating_sub(events[i - 1].timestamp);
            if gap > self.threshold_ms {
                slow.insert(i);
            }
        }
        slow
    }

    /// Like `highlight_indices`, but keeps only indices that map onto a
    /// line of the rendered content.
    ///
    /// Highlight index `i` maps onto rendered line `i` (1-based). Logs
    /// longer than the rendered line count, as after deletions, silently
    /// drop the excess indices instead of pointing at lines that do not
    /// exist.
    pub fn visible_indices(&self, log: &EventLog, rendered: &str) -> BTreeSet<usize> {
        let line_count = rendered.split('\n').count();
        self.highlight_indices(log)
            .into_iter()
            .filter(|&index| index <= line_count)
            .collect()
    }
}

impl Default for LatencyAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_HIGHLIGHT_THRESHOLD_MS)
    }
}
