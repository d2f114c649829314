//! Session file format
//!
//! Reads and writes the portable session interchange format: a bare JSON
//! array of `{"value", "timestamp"}` objects in chronological order, with
//! no wrapping object and no version field.

use std::fs;
use std::io;
use std::path::Path;

use serde_json::Value;
use thiserror::Error;

use crate::event::{Event, EventLog};

/// Suggested filename for exported sessions
pub const DEFAULT_SESSION_FILENAME: &str = "inputLog.json";

/// Errors raised while importing a session
#[derive(Error, Debug)]
pub enum SessionImportError {
    /// The input is not valid JSON at all
    #[error("Session data is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The input parsed, but the top-level value is not an array
    #[error("Session data must be a JSON array of events")]
    NotAnArray,

    /// The session file could not be read
    #[error("Failed to read session file: {0}")]
    Io(#[from] io::Error),
}

/// Serialize a log to pretty-printed JSON.
///
/// Output is a human-readable array in the log's insertion order, suitable
/// for download-style export.
pub fn to_json(log: &EventLog) -> serde_json::Result<String> {
    serde_json::to_string_pretty(log)
}

/// Deserialize a session from JSON text.
///
/// Any JSON array is accepted. Elements are read leniently: a missing or
/// mistyped `value` becomes the empty string and a missing or mistyped
/// `timestamp` becomes zero, so partially well-formed logs still replay as
/// far as their data allows. Unknown fields are ignored. A top-level
/// non-array is rejected without producing a log.
pub fn from_json(data: &str) -> Result<EventLog, SessionImportError> {
    let parsed: Value = serde_json::from_str(data)?;
    let items = parsed.as_array().ok_or(SessionImportError::NotAnArray)?;

    let events = items.iter().map(read_event).collect();
    let log = EventLog::from_events(events);
    tracing::debug!("imported session with {} events", log.len());
    Ok(log)
}

/// Read one array element under the lenient field policy
fn read_event(item: &Value) -> Event {
    let value = item
        .get("value")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let timestamp = item.get("timestamp").map(read_millis).unwrap_or(0);
    Event { value, timestamp }
}

/// Coerce a JSON number to integer milliseconds; anything else reads as zero
fn read_millis(value: &Value) -> u64 {
    if let Some(ms) = value.as_u64() {
        ms
    } else if let Some(ms) = value.as_f64() {
        if ms.is_finite() && ms > 0.0 {
            ms as u64
        } else {
            0
        }
    } else {
        0
    }
}

/// Write a session log to a JSON file
pub fn write_json_file<P: AsRef<Path>>(path: P, log: &EventLog) -> io::Result<()> {
    let content = to_json(log).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    fs::write(path, content)
}

/// Read a session log from a JSON file
pub fn read_json_file<P: AsRef<Path>>(path: P) -> Result<EventLog, SessionImportError> {
    let content = fs::read_to_string(path)?;
    from_json(&content)
}
