//! Demo mode - synthetic typing session generator
//!
//! Produces event logs with a realistic keystroke cadence for exercising
//! replay and analysis without a human typist. Simulates steady typing
//! with per-key jitter and occasional long "thinking" pauses.

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use crate::event::EventLog;

/// Base delay between keystrokes (ms)
const BASE_LATENCY_MS: u64 = 120;
/// Random jitter added per keystroke (ms)
const JITTER_MS: u64 = 140;
/// Chance of a thinking pause before a keystroke
const PAUSE_CHANCE: f64 = 0.04;
/// Extra delay of a thinking pause (ms); long enough to show up as a
/// highlight under the default analysis threshold
const PAUSE_MS: u64 = 3500;

/// Synthetic typing session generator
pub struct SessionSimulator {
    rng: StdRng,
}

impl SessionSimulator {
    /// Create a simulator with a random cadence
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a simulator with a fixed seed for reproducible sessions
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Type out the given text one character at a time.
    ///
    /// Returns a log with one full-snapshot event per character, starting
    /// from `start_ms` on the session clock. Timestamps are monotonically
    /// increasing.
    pub fn type_text(&mut self, text: &str, start_ms: u64) -> EventLog {
        let mut log = EventLog::new();
        let mut now = start_ms;
        let mut typed = String::new();

        for ch in text.chars() {
            if self.rng.gen_bool(PAUSE_CHANCE) {
                now += PAUSE_MS + self.rng.gen_range(0..JITTER_MS);
            }
            now += BASE_LATENCY_MS + self.rng.gen_range(0..JITTER_MS);
            typed.push(ch);
            log.append(typed.clone(), now);
        }
        log
    }
}

impl Default for SessionSimulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_event_per_character() {
        let mut sim = SessionSimulator::from_seed(7);
        let log = sim.type_text("fn main() {}", 0);

        assert_eq!(log.len(), "fn main() {}".chars().count());
        assert_eq!(log.last().unwrap().value, "fn main() {}");
        assert!(log.is_ordered());
    }

    #[test]
    fn test_seeded_sessions_are_reproducible() {
        let first = SessionSimulator::from_seed(42).type_text("hello world", 1000);
        let second = SessionSimulator::from_seed(42).type_text("hello world", 1000);
        assert_eq!(first, second);
    }

    #[test]
    fn test_snapshots_grow_monotonically() {
        let mut sim = SessionSimulator::from_seed(3);
        let log = sim.type_text("abc", 500);

        assert_eq!(log.get(0).unwrap().value, "a");
        assert_eq!(log.get(1).unwrap().value, "ab");
        assert_eq!(log.get(2).unwrap().value, "abc");
        assert!(log.first().unwrap().timestamp > 500);
    }
}
