//! Session event log
//!
//! The core data structure: an ordered sequence of timestamped full-text
//! snapshots captured during one typing session.

use serde::{Deserialize, Serialize};

/// A single captured event: the complete editor content at one point in time.
///
/// `value` is a full snapshot rather than a diff, so replay never has to
/// reconstruct state from deltas. Space grows quadratically with the typed
/// length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Full content snapshot at capture time
    #[serde(default)]
    pub value: String,
    /// Wall-clock capture time in Unix milliseconds
    #[serde(default)]
    pub timestamp: u64,
}

impl Event {
    /// Create a new event
    pub fn new(value: impl Into<String>, timestamp: u64) -> Self {
        Self {
            value: value.into(),
            timestamp,
        }
    }
}

/// Ordered event sequence from one capture session.
///
/// Insertion order is capture order, and capture order is replay order.
/// Timestamps come from the capture clock and are expected to be
/// non-decreasing; consumers tolerate out-of-order stamps rather than
/// rejecting them (replay clamps negative gaps to zero).
///
/// Serializes as a bare JSON array of events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a log from an existing event sequence
    pub fn from_events(events: Vec<Event>) -> Self {
        Self { events }
    }

    /// Append a snapshot captured at the given time
    pub fn append(&mut self, value: impl Into<String>, timestamp: u64) {
        self.events.push(Event::new(value, timestamp));
    }

    /// Append an already-built event
    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Get the number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Get the event at an index
    pub fn get(&self, index: usize) -> Option<&Event> {
        self.events.get(index)
    }

    /// Get the first event
    pub fn first(&self) -> Option<&Event> {
        self.events.first()
    }

    /// Get the last event
    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    /// Iterate over events in capture order
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// Get all events as a slice
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Clear all events
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Total time covered by the log in milliseconds.
    ///
    /// Zero for logs with fewer than two events, and for logs whose last
    /// timestamp precedes the first.
    pub fn span_ms(&self) -> u64 {
        match (self.events.first(), self.events.last()) {
            (Some(first), Some(last)) => last.timestamp.saturating_sub(first.timestamp),
            _ => 0,
        }
    }

    /// Check that timestamps never decrease from one event to the next
    pub fn is_ordered(&self) -> bool {
        self.events
            .windows(2)
            .all(|pair| pair[0].timestamp <= pair[1].timestamp)
    }
}

impl IntoIterator for EventLog {
    type Item = Event;
    type IntoIter = std::vec::IntoIter<Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}
