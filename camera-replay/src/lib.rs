//! # Saorsa Camera Replay
//!
//! Replays JSON scenarios of camera and style requests against the headless
//! engine and reports what camera observers saw, in order.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p camera-replay -- --scenario tour.json --frame-ms 16
//! ```
//!
//! ## Scenario format
//!
//! ```json
//! {"name": "tour", "steps": [
//!   {"op": "set_style", "source": {"kind": "url", "value": "https://example.invalid/style.json"}},
//!   {"op": "ease", "update": {"type": "zoom_to", "zoom": 12.0}, "duration_ms": 250},
//!   {"op": "frames", "count": 20}
//! ]}
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod runner;
pub mod scenario;

pub use error::{ReplayError, ReplayResult};
pub use runner::{LogEntry, Replay, ReplayOptions, DEFAULT_FRAME};
pub use scenario::{Scenario, Step};

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for camera-replay.
#[derive(Debug, Clone, Parser)]
#[command(name = "camera-replay")]
#[command(about = "Replay camera and style scenarios against the headless engine")]
#[command(version)]
pub struct CliArgs {
    /// Scenario file (JSON)
    #[arg(long)]
    pub scenario: PathBuf,

    /// Camera configuration file (JSON)
    #[arg(long, env = "CAMERA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Escalate invariant violations to errors
    #[arg(long, env = "CAMERA_STRICT")]
    pub strict: bool,

    /// Virtual time per frame in milliseconds
    #[arg(long, default_value = "16")]
    pub frame_ms: u64,

    /// Sleep between frames instead of running as fast as possible
    #[arg(long)]
    pub realtime: bool,
}

impl CliArgs {
    /// Pacing derived from the flags.
    #[must_use]
    pub const fn options(&self) -> ReplayOptions {
        ReplayOptions {
            frame: std::time::Duration::from_millis(self.frame_ms),
            realtime: self.realtime,
        }
    }
}
