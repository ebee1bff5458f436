//! Error types for camera operations.

use std::thread::ThreadId;

use thiserror::Error;

/// Result type for camera operations.
pub type CameraResult<T> = Result<T, CameraError>;

/// Errors that can occur in camera and style operations.
///
/// Calls made after teardown have no variant here: they are absorbed and
/// reported through [`crate::Diagnostics`] instead.
#[derive(Debug, Error)]
pub enum CameraError {
    /// A timed transition was requested with a zero duration.
    #[error("Invalid animation duration for {operation}: duration must be strictly positive")]
    InvalidDuration {
        /// Name of the rejected operation.
        operation: &'static str,
    },

    /// A guarded operation was invoked from a thread other than the owner.
    #[error(
        "Map interactions must happen on the owning thread: `{operation}` invoked from {current:?}, owner is {owner:?}"
    )]
    WrongThread {
        /// Name of the rejected operation.
        operation: &'static str,
        /// Thread that constructed the component.
        owner: ThreadId,
        /// Thread the call was made from.
        current: ThreadId,
    },

    /// An internal invariant was breached while strict mode is enabled.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Configuration was rejected.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Configuration or scenario (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Reading a configuration file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CameraError {
    /// Whether this error is a thread-affinity violation.
    #[must_use]
    pub const fn is_threading_violation(&self) -> bool {
        matches!(self, Self::WrongThread { .. })
    }

    /// Whether this error is a rejected argument.
    #[must_use]
    pub const fn is_usage_error(&self) -> bool {
        matches!(self, Self::InvalidDuration { .. })
    }
}
