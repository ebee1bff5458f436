//! Error types for scenario replay.

use camera_core::CameraError;
use thiserror::Error;

/// Result type for replay operations.
pub type ReplayResult<T> = Result<T, ReplayError>;

/// Errors that stop a replay.
///
/// Rejected arguments inside a step are not errors: they are recorded in the
/// log and the replay continues.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The camera refused an operation.
    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    /// The scenario could not be parsed.
    #[error("Invalid scenario: {0}")]
    Scenario(#[from] serde_json::Error),

    /// Reading a scenario file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
