//! Soft-failure reporting.
//!
//! Invariant breaches that must not crash a production host are routed here:
//! they are logged, recorded, and only escalated to an error in strict mode.

use serde::Serialize;

use crate::{CameraError, CameraResult};

/// Upper bound on recorded violations; older entries are discarded first.
const MAX_RECORDED: usize = 256;

/// Category of a recorded violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Internal state did not match what an event required.
    InvariantViolation,
    /// A call arrived after teardown and was absorbed.
    PostDestructionCall,
}

/// A recorded violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Category.
    pub kind: ViolationKind,
    /// Human-readable description.
    pub message: String,
}

/// Violation log with an optional strict mode.
#[derive(Debug, Default)]
pub struct Diagnostics {
    strict: bool,
    recorded: Vec<Violation>,
}

impl Diagnostics {
    /// Create a diagnostics channel.
    #[must_use]
    pub fn new(strict: bool) -> Self {
        Self {
            strict,
            recorded: Vec::new(),
        }
    }

    /// Whether invariant violations escalate to errors.
    #[must_use]
    pub const fn is_strict(&self) -> bool {
        self.strict
    }

    /// Report an invariant violation.
    ///
    /// # Errors
    ///
    /// Returns [`CameraError::InvariantViolation`] in strict mode.
    pub fn invariant(&mut self, message: impl Into<String>) -> CameraResult<()> {
        let message = message.into();
        tracing::warn!("Invariant violation: {message}");
        self.record(ViolationKind::InvariantViolation, message.clone());
        if self.strict {
            Err(CameraError::InvariantViolation(message))
        } else {
            Ok(())
        }
    }

    /// Report a call that arrived after teardown. Never escalates.
    pub fn post_destruction(&mut self, operation: &str) {
        let message = format!(
            "`{operation}` called after the map was destroyed; was it invoked after `destroy()`?"
        );
        tracing::error!("{message}");
        self.record(ViolationKind::PostDestructionCall, message);
    }

    /// Recorded violations, oldest first.
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.recorded
    }

    /// Number of recorded violations of `kind`.
    #[must_use]
    pub fn count(&self, kind: ViolationKind) -> usize {
        self.recorded.iter().filter(|v| v.kind == kind).count()
    }

    fn record(&mut self, kind: ViolationKind, message: String) {
        if self.recorded.len() == MAX_RECORDED {
            self.recorded.remove(0);
        }
        self.recorded.push(Violation { kind, message });
    }
}
