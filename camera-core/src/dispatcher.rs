//! Camera change lifecycle fan-out.
//!
//! Low-level engine notifications are folded into four observer events:
//! move started, move, move canceled and idle. A started event is only
//! delivered from idle; move and cancel only while a move is running; idle
//! closes the move.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::listener::{ListenerHandle, ListenerList};

/// Why the camera started moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveReason {
    /// A user gesture on the map.
    Gesture,
    /// An internal component animating on the caller's behalf.
    DeveloperAnimation,
    /// A direct API call.
    ApiAnimation,
}

impl MoveReason {
    /// Stable numeric code used by the platform bindings.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Gesture => 1,
            Self::DeveloperAnimation => 2,
            Self::ApiAnimation => 3,
        }
    }
}

/// Listener for move-started events.
pub type MoveStartedListener = dyn Fn(MoveReason) + Send + Sync;

/// Listener for argument-less camera events.
pub type CameraEventListener = dyn Fn() + Send + Sync;

/// Dispatcher phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePhase {
    /// No move in progress.
    Idle,
    /// A move started and has not reported idle yet.
    Moving {
        /// Why the move started.
        reason: MoveReason,
        /// Whether a cancellation was already delivered for this move.
        canceled: bool,
    },
}

/// Ordered observer fan-out for camera movement.
#[derive(Debug)]
pub struct CameraChangeDispatcher {
    phase: MovePhase,
    started: ListenerList<MoveStartedListener>,
    moving: ListenerList<CameraEventListener>,
    canceled: ListenerList<CameraEventListener>,
    idle: ListenerList<CameraEventListener>,
}

impl CameraChangeDispatcher {
    /// Create an idle dispatcher with no listeners.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: MovePhase::Idle,
            started: ListenerList::new(),
            moving: ListenerList::new(),
            canceled: ListenerList::new(),
            idle: ListenerList::new(),
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> MovePhase {
        self.phase
    }

    /// Whether no move is in progress.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self.phase, MovePhase::Idle)
    }

    /// Register a move-started listener.
    pub fn add_move_started_listener(&mut self, listener: Arc<MoveStartedListener>) -> ListenerHandle {
        self.started.add(listener)
    }

    /// Register a move listener.
    pub fn add_move_listener(&mut self, listener: Arc<CameraEventListener>) -> ListenerHandle {
        self.moving.add(listener)
    }

    /// Register a move-canceled listener.
    pub fn add_move_canceled_listener(&mut self, listener: Arc<CameraEventListener>) -> ListenerHandle {
        self.canceled.add(listener)
    }

    /// Register an idle listener.
    pub fn add_idle_listener(&mut self, listener: Arc<CameraEventListener>) -> ListenerHandle {
        self.idle.add(listener)
    }

    /// Remove a move-started listener.
    pub fn remove_move_started_listener(&mut self, handle: &ListenerHandle) -> bool {
        self.started.remove(handle)
    }

    /// Remove a move listener.
    pub fn remove_move_listener(&mut self, handle: &ListenerHandle) -> bool {
        self.moving.remove(handle)
    }

    /// Remove a move-canceled listener.
    pub fn remove_move_canceled_listener(&mut self, handle: &ListenerHandle) -> bool {
        self.canceled.remove(handle)
    }

    /// Remove an idle listener.
    pub fn remove_idle_listener(&mut self, handle: &ListenerHandle) -> bool {
        self.idle.remove(handle)
    }

    /// A move begins. Ignored unless idle.
    pub fn on_camera_move_started(&mut self, reason: MoveReason) {
        if !self.is_idle() {
            return;
        }
        tracing::debug!(?reason, code = reason.code(), "Camera move started");
        self.phase = MovePhase::Moving {
            reason,
            canceled: false,
        };
        self.started.dispatch("camera move started", |l| l(reason));
    }

    /// The camera changed during a move. Ignored when idle.
    pub fn on_camera_move(&mut self) {
        if self.is_idle() {
            return;
        }
        self.moving.dispatch("camera move", |l| l());
    }

    /// The running move was preempted. Delivered at most once per move.
    pub fn on_camera_move_canceled(&mut self) {
        let MovePhase::Moving { reason, canceled } = self.phase else {
            return;
        };
        if canceled {
            return;
        }
        tracing::debug!(?reason, "Camera move canceled");
        self.phase = MovePhase::Moving {
            reason,
            canceled: true,
        };
        self.canceled.dispatch("camera move canceled", |l| l());
    }

    /// The camera settled. Ignored when already idle.
    pub fn on_camera_idle(&mut self) {
        if self.is_idle() {
            return;
        }
        tracing::debug!("Camera idle");
        self.phase = MovePhase::Idle;
        self.idle.dispatch("camera idle", |l| l());
    }

    /// Drop every listener and return to idle without notifying.
    pub fn clear(&mut self) {
        self.phase = MovePhase::Idle;
        self.started.clear();
        self.moving.clear();
        self.canceled.clear();
        self.idle.clear();
    }
}

impl Default for CameraChangeDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
