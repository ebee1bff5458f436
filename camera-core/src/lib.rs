//! # Saorsa Camera Core
//!
//! Camera transform and style-load coordination for a map renderer.
//! Owns the map's viewpoint, arbitrates between jumps, eased transitions and
//! flights, and delivers style readiness exactly once.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                  MapCamera                  │
//! │         (owning thread, ThreadGuard)        │
//! ├─────────────────────────────────────────────┤
//! │  TransformController │  StyleLoadCoordinator│
//! │  - PaddingCache      │  - Primary callback  │
//! │  - Pending FIFO      │  - Deferred queue    │
//! ├─────────────────────────────────────────────┤
//! │  ChangeDispatcher    │  Diagnostics         │
//! ├─────────────────────────────────────────────┤
//! │  MapEngine ──EngineEvent (mpsc)──▶ pump     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! [`MapCamera`] is the only guarded entry point; the transform and style
//! controllers it composes are crate-internal.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod diagnostics;
pub mod dispatcher;
pub mod easing;
pub mod engine;
pub mod error;
pub mod flight;
pub mod geo;
pub mod listener;
pub mod map;
pub mod padding;
pub mod position;
pub mod projection;
pub mod style;
pub mod thread_guard;
pub mod transform;
pub mod update;

pub use config::{CameraConfig, CameraLimits};
pub use diagnostics::{Diagnostics, Violation, ViolationKind};
pub use dispatcher::{CameraChangeDispatcher, MovePhase, MoveReason};
pub use easing::{Easing, UnitBezier};
pub use engine::{
    event_channel, CameraOptions, EngineEvent, EventQueue, EventSender, FrameStats,
    HeadlessEngine, MapEngine, StyleSource,
};
pub use error::{CameraError, CameraResult};
pub use geo::{EdgeInsets, LatLng, LatLngBounds, ScreenPoint, Size};
pub use listener::{ListenerHandle, ListenerId};
pub use map::MapCamera;
pub use padding::PaddingCache;
pub use position::CameraPosition;
pub use style::{Style, StyleCallback, StyleState};
pub use thread_guard::{Access, ThreadGuard};
pub use transform::{AnimationRequest, Interpolation, TransitionCallback, TransitionOutcome};
pub use update::CameraUpdate;

/// Camera core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
