//! Owner-thread and lifecycle checks applied to every guarded call.

use std::thread::{self, ThreadId};

use crate::{CameraError, CameraResult};

/// Outcome of a successful guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Access {
    /// The component is live; proceed.
    Live,
    /// The component was torn down; return a default and touch nothing.
    Destroyed,
}

impl Access {
    /// Whether the caller should bail out with a default value.
    #[must_use]
    pub const fn is_destroyed(self) -> bool {
        matches!(self, Self::Destroyed)
    }
}

/// Validates thread affinity and the destroyed flag.
///
/// The owner is the thread that constructed the guard. Destruction is
/// terminal.
#[derive(Debug)]
pub struct ThreadGuard {
    owner: ThreadId,
    destroyed: bool,
}

impl ThreadGuard {
    /// Create a guard owned by the current thread.
    #[must_use]
    pub fn new() -> Self {
        Self {
            owner: thread::current().id(),
            destroyed: false,
        }
    }

    /// The owning thread.
    #[must_use]
    pub const fn owner(&self) -> ThreadId {
        self.owner
    }

    /// Whether teardown has happened.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Check thread identity first, then the destroyed flag.
    ///
    /// # Errors
    ///
    /// Returns [`CameraError::WrongThread`] when called off the owning thread,
    /// whether or not the component was destroyed.
    pub fn check(&self, operation: &'static str) -> CameraResult<Access> {
        let current = thread::current().id();
        if current != self.owner {
            return Err(CameraError::WrongThread {
                operation,
                owner: self.owner,
                current,
            });
        }
        if self.destroyed {
            return Ok(Access::Destroyed);
        }
        Ok(Access::Live)
    }

    /// Mark the component destroyed. Idempotent.
    pub fn invalidate(&mut self) {
        if !self.destroyed {
            tracing::debug!("Thread guard invalidated");
        }
        self.destroyed = true;
    }
}

impl Default for ThreadGuard {
    fn default() -> Self {
        Self::new()
    }
}
