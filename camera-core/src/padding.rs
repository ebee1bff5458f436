//! Lazily applied padding.
//!
//! A padding change requested outside a transition is parked here instead of
//! being pushed to the engine. The next jump, ease or flight consumes it; until
//! then it is the authoritative padding reported to callers.

use crate::geo::EdgeInsets;
use crate::position::CameraPosition;

/// Single-slot edge-inset override.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PaddingCache {
    pending: Option<EdgeInsets>,
}

impl PaddingCache {
    /// Create an empty cache.
    #[must_use]
    pub const fn new() -> Self {
        Self { pending: None }
    }

    /// Park an override for the next transform.
    pub fn set(&mut self, padding: EdgeInsets) {
        tracing::debug!(?padding, "Padding cached until next camera transform");
        self.pending = Some(padding);
    }

    /// Padding for a transform about to be applied.
    ///
    /// Caller-supplied padding wins over the cached override. The cache is
    /// emptied either way.
    pub fn consume_for_animation(&mut self, explicit: Option<EdgeInsets>) -> Option<EdgeInsets> {
        let cached = self.pending.take();
        explicit.or(cached)
    }

    /// The cached override, or the padding of the engine's last snapshot.
    #[must_use]
    pub fn get(&self, engine_camera: &CameraPosition) -> EdgeInsets {
        self.pending.unwrap_or(engine_camera.padding)
    }

    /// The cached override, if any.
    #[must_use]
    pub const fn pending(&self) -> Option<EdgeInsets> {
        self.pending
    }

    /// Overlay the cached override on an engine snapshot.
    #[must_use]
    pub fn overlay(&self, engine_camera: CameraPosition) -> CameraPosition {
        match self.pending {
            Some(padding) => engine_camera.with_padding(padding),
            None => engine_camera,
        }
    }
}
