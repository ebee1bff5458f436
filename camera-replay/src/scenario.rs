//! Scenario files: an ordered list of camera and style requests.

use std::path::Path;

use camera_core::{CameraUpdate, Interpolation, MoveReason, StyleSource};
use serde::{Deserialize, Serialize};

use crate::error::ReplayResult;

/// A named sequence of steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Optional label, echoed in logs.
    #[serde(default)]
    pub name: Option<String>,
    /// Steps, run in order.
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Parse a scenario from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ReplayError::Scenario`] if the JSON does not describe
    /// a scenario.
    pub fn from_json_str(json: &str) -> ReplayResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a scenario from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ReplayError::Io`] if the file cannot be read, or
    /// [`crate::ReplayError::Scenario`] if it cannot be parsed.
    pub fn from_path(path: impl AsRef<Path>) -> ReplayResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

const fn default_true() -> bool {
    true
}

/// One request in a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Instantaneous move.
    Move {
        /// Target change.
        update: CameraUpdate,
        /// Whether running transitions are canceled first.
        #[serde(default = "default_true")]
        cancel_prior: bool,
        /// Attribute the move to a user gesture.
        #[serde(default)]
        gesture: bool,
    },
    /// Eased transition.
    Ease {
        /// Target change.
        update: CameraUpdate,
        /// Duration in milliseconds; `None` uses the configured default.
        #[serde(default)]
        duration_ms: Option<u64>,
        /// Timing curve.
        #[serde(default)]
        interpolation: Interpolation,
        /// Whether running transitions are canceled first.
        #[serde(default = "default_true")]
        cancel_prior: bool,
        /// Reported move reason.
        #[serde(default)]
        reason: Option<MoveReason>,
    },
    /// Flight transition.
    Animate {
        /// Target change.
        update: CameraUpdate,
        /// Duration in milliseconds; `None` uses the configured default.
        #[serde(default)]
        duration_ms: Option<u64>,
        /// Reported move reason.
        #[serde(default)]
        reason: Option<MoveReason>,
    },
    /// Cancel every running transition.
    Cancel,
    /// Cache padding for the next update.
    SetPadding {
        /// Left inset.
        left: f64,
        /// Top inset.
        top: f64,
        /// Right inset.
        right: f64,
        /// Bottom inset.
        bottom: f64,
    },
    /// Replace the style and wait for it with a primary callback.
    SetStyle {
        /// Style to load.
        source: StyleSource,
    },
    /// Register a passive style observer.
    GetStyle,
    /// Make the next style load fail.
    FailNextStyle {
        /// Reported failure reason.
        reason: String,
    },
    /// Render a number of frames.
    Frames {
        /// Frames to render.
        count: u32,
    },
    /// Resize the viewport.
    Resize {
        /// New width; out-of-range values are clamped.
        width: i64,
        /// New height; out-of-range values are clamped.
        height: i64,
    },
    /// Tear the camera down.
    Destroy,
}

impl Step {
    /// Short name used in log entries.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Move { .. } => "move",
            Self::Ease { .. } => "ease",
            Self::Animate { .. } => "animate",
            Self::Cancel => "cancel",
            Self::SetPadding { .. } => "set_padding",
            Self::SetStyle { .. } => "set_style",
            Self::GetStyle => "get_style",
            Self::FailNextStyle { .. } => "fail_next_style",
            Self::Frames { .. } => "frames",
            Self::Resize { .. } => "resize",
            Self::Destroy => "destroy",
        }
    }
}
