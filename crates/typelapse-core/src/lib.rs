//! # Typelapse Core Library
//!
//! Capture-and-replay engine for timed typing sessions.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Timestamped full-snapshot event logs
//! - A portable JSON session interchange format with lenient import
//! - Time-bounded capture sessions driven by a countdown timer
//! - Variable-speed replay scheduling with live speed changes
//! - Inter-keystroke latency analysis for line highlighting
//!
//! The recorder and scheduler spawn tokio tasks and are written for a
//! current-thread runtime, where no event is delivered after a stop call
//! returns. A multi-thread runtime may still deliver an emission that was
//! in flight when its task was aborted.
//!
//! ## Example
//!
//! ```rust,ignore
//! use typelapse_core::recorder::{CaptureMode, Recorder};
//! use typelapse_core::playback::ReplayScheduler;
//!
//! // Capture a session
//! let (mut recorder, _signals) = Recorder::new(CaptureMode::Code);
//! recorder.start();
//! recorder.content_changed("f");
//! recorder.content_changed("fn");
//! recorder.stop();
//!
//! // Export, then replay at double speed
//! let json = recorder.export_json()?;
//! let log = typelapse_core::format::from_json(&json)?;
//! let (mut scheduler, mut frames) = ReplayScheduler::new();
//! scheduler.play(log, 2.0);
//! while let Some(event) = frames.recv().await {
//!     println!("{:?}", event);
//! }
//! ```

pub mod analysis;
pub mod demo;
pub mod event;
pub mod format;
pub mod playback;
pub mod recorder;
pub mod timer;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::analysis::{LatencyAnalyzer, DEFAULT_HIGHLIGHT_THRESHOLD_MS};
    pub use crate::event::{Event, EventLog};
    pub use crate::format::{from_json, to_json, SessionImportError};
    pub use crate::playback::{ReplayEvent, ReplayScheduler, ReplayState};
    pub use crate::recorder::{CaptureMode, CaptureSignal, Recorder, RecorderState, StopReason};
    pub use crate::timer::SessionTimer;
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
