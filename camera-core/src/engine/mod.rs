//! Contract with the rendering engine.
//!
//! The engine runs on a thread the camera does not control. Calls into it are
//! fire-and-forget; progress and completion come back as [`EngineEvent`]s
//! posted through an [`EventSender`] and drained on the owning thread.

mod headless;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::config::CameraLimits;
use crate::easing::Easing;
use crate::geo::{EdgeInsets, LatLng, Size};
use crate::position::CameraPosition;

pub use headless::HeadlessEngine;

/// Absolute camera target handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraOptions {
    /// Geographic centre.
    pub center: LatLng,
    /// Zoom level.
    pub zoom: f64,
    /// Bearing in degrees.
    pub bearing: f64,
    /// Pitch in degrees.
    pub pitch: f64,
    /// Padding to apply; `None` keeps the engine's current padding.
    pub padding: Option<EdgeInsets>,
}

impl CameraOptions {
    /// Build options from a target position and an optional padding.
    #[must_use]
    pub const fn from_position(position: &CameraPosition, padding: Option<EdgeInsets>) -> Self {
        Self {
            center: position.target,
            zoom: position.zoom,
            bearing: position.bearing,
            pitch: position.tilt,
            padding,
        }
    }
}

/// Where a style is loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum StyleSource {
    /// Remote or asset URL.
    Url(String),
    /// Inline style JSON.
    Json(String),
    /// A blank style.
    #[default]
    Empty,
}

/// Per-frame render timings.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameStats {
    /// Monotonic frame counter.
    pub frame: u64,
    /// Time spent encoding the frame, in milliseconds.
    pub encoding_ms: f64,
    /// Time spent rendering the frame, in milliseconds.
    pub rendering_ms: f64,
    /// Whether every visible tile was drawn.
    pub fully_rendered: bool,
}

/// Notification from the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    /// A camera change is about to start.
    CameraWillChange {
        /// Whether the change is a timed transition.
        animated: bool,
    },
    /// The camera changed during a transition or jump.
    CameraIsChanging,
    /// A camera change ended.
    CameraDidChange {
        /// Whether the change was a timed transition.
        animated: bool,
    },
    /// The current style finished loading.
    StyleFinishedLoading,
    /// The current style failed to load.
    StyleLoadFailed {
        /// Engine-provided reason.
        error: String,
    },
    /// A frame was rendered.
    FrameRendered(FrameStats),
}

/// Create a connected sender and queue.
#[must_use]
pub fn event_channel() -> (EventSender, EventQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, EventQueue { rx })
}

/// Posting side of the engine event channel. Usable from any thread.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<EngineEvent>,
}

impl EventSender {
    /// Post an event. Returns `false` if the receiving side is gone.
    pub fn send(&self, event: EngineEvent) -> bool {
        if self.tx.send(event).is_err() {
            tracing::debug!("Engine event dropped: receiver closed");
            return false;
        }
        true
    }

    /// Whether the receiving side is gone.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving side of the engine event channel, held by the owning thread.
#[derive(Debug)]
pub struct EventQueue {
    rx: mpsc::UnboundedReceiver<EngineEvent>,
}

impl EventQueue {
    /// Take the next queued event without waiting.
    pub fn try_next(&mut self) -> Option<EngineEvent> {
        self.rx.try_recv().ok()
    }

    /// Stop accepting events; already queued events stay readable.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

/// Operations the camera core needs from a rendering engine.
///
/// Timed transitions report progress asynchronously: `CameraWillChange`,
/// then `CameraIsChanging` per frame, then `CameraDidChange`. Starting a
/// transition, jumping or cancelling while one runs ends the running one
/// with `CameraDidChange { animated: true }`.
pub trait MapEngine {
    /// Move instantly.
    fn jump_to(&mut self, options: &CameraOptions);

    /// Start a timed transition along a timing curve.
    fn ease_to(&mut self, options: &CameraOptions, duration: Duration, easing: Easing);

    /// Start a timed zoom-out-and-in flight.
    fn fly_to(&mut self, options: &CameraOptions, duration: Duration);

    /// Stop any running transition where it is.
    fn cancel_transitions(&mut self);

    /// Last rendered camera.
    fn camera_position(&self) -> CameraPosition;

    /// Replace the style. Completion is reported by event.
    fn load_style(&mut self, source: &StyleSource);

    /// Resize the render surface.
    fn resize(&mut self, size: Size);

    /// Apply zoom and pitch preferences.
    fn set_limits(&mut self, limits: CameraLimits);

    /// Render one frame after `elapsed` wall time.
    fn advance(&mut self, elapsed: Duration);

    /// Release engine resources. No events follow.
    fn destroy(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_events_marshal_across_threads_in_order() {
        let (sender, mut queue) = event_channel();
        let worker = thread::spawn(move || {
            for frame in 0..3 {
                sender.send(EngineEvent::FrameRendered(FrameStats {
                    frame,
                    ..FrameStats::default()
                }));
            }
        });
        worker.join().expect("join");

        let frames: Vec<u64> = std::iter::from_fn(|| queue.try_next())
            .filter_map(|e| match e {
                EngineEvent::FrameRendered(stats) => Some(stats.frame),
                _ => None,
            })
            .collect();
        assert_eq!(frames, vec![0, 1, 2]);
    }

    #[test]
    fn test_send_after_close_reports_failure() {
        let (sender, queue) = event_channel();
        drop(queue);
        assert!(sender.is_closed());
        assert!(!sender.send(EngineEvent::CameraIsChanging));
    }
}
