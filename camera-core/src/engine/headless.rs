//! Deterministic in-process engine driven by a virtual clock.

use std::time::Duration;

use crate::config::CameraLimits;
use crate::easing::{Easing, UnitBezier};
use crate::flight::FlightPath;
use crate::geo::{lerp, wrap, Size};
use crate::position::{normalize_bearing, CameraPosition};
use crate::projection::{world_size, MercatorPoint};

use super::{CameraOptions, EngineEvent, EventSender, FrameStats, MapEngine, StyleSource};

/// Solver precision for timing curves.
const EASE_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy)]
enum Motion {
    Ease(UnitBezier),
    Fly(FlightPath),
}

#[derive(Debug, Clone, Copy)]
struct Transition {
    from: CameraPosition,
    to: CameraPosition,
    duration: Duration,
    elapsed: Duration,
    motion: Motion,
}

impl Transition {
    fn progress(&self) -> f64 {
        (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    fn sample(&self, t: f64) -> CameraPosition {
        if t >= 1.0 {
            return self.to;
        }
        let (travelled, k, zoom) = match self.motion {
            Motion::Ease(curve) => {
                let k = curve.solve(t, EASE_EPSILON);
                (k, k, lerp(self.from.zoom, self.to.zoom, k))
            }
            Motion::Fly(path) => {
                let k = UnitBezier::DEFAULT_EASE.solve(t, EASE_EPSILON);
                (path.travelled(k), k, path.zoom_at(k, self.to.zoom))
            }
        };

        let start = MercatorPoint::from_lat_lng(self.from.target);
        let end = MercatorPoint::from_lat_lng(self.to.target);
        let center = MercatorPoint {
            x: lerp(start.x, end.x, travelled),
            y: lerp(start.y, end.y, travelled),
        }
        .to_lat_lng();

        let bearing_delta = wrap(self.to.bearing - self.from.bearing, -180.0, 180.0);
        CameraPosition {
            target: center,
            zoom,
            bearing: normalize_bearing(self.from.bearing + bearing_delta * k),
            tilt: lerp(self.from.tilt, self.to.tilt, k),
            padding: self.from.padding.lerp(&self.to.padding, k),
        }
    }
}

/// A [`MapEngine`] that renders nothing.
///
/// Transitions advance only when [`MapEngine::advance`] is called, so tests
/// and the replay tool control time exactly. Style loads settle on the next
/// frame.
#[derive(Debug)]
pub struct HeadlessEngine {
    events: EventSender,
    viewport: Size,
    limits: CameraLimits,
    camera: CameraPosition,
    transition: Option<Transition>,
    pending_style: Option<StyleSource>,
    fail_next_style: Option<String>,
    frame: u64,
    clock: Duration,
    destroyed: bool,
}

impl HeadlessEngine {
    /// Create an engine posting to `events`.
    #[must_use]
    pub fn new(events: EventSender, viewport: Size) -> Self {
        Self {
            events,
            viewport,
            limits: CameraLimits::default(),
            camera: CameraPosition::default(),
            transition: None,
            pending_style: None,
            fail_next_style: None,
            frame: 0,
            clock: Duration::ZERO,
            destroyed: false,
        }
    }

    /// Make the next style load fail with `reason`.
    pub fn fail_next_style_load(&mut self, reason: impl Into<String>) {
        self.fail_next_style = Some(reason.into());
    }

    /// Whether a timed transition is running.
    #[must_use]
    pub const fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// Whether a style load is waiting for the next frame.
    #[must_use]
    pub const fn is_loading_style(&self) -> bool {
        self.pending_style.is_some()
    }

    /// Current render surface size.
    #[must_use]
    pub const fn viewport(&self) -> Size {
        self.viewport
    }

    /// Limits currently applied.
    #[must_use]
    pub const fn limits(&self) -> CameraLimits {
        self.limits
    }

    /// Virtual time elapsed across all frames.
    #[must_use]
    pub const fn clock(&self) -> Duration {
        self.clock
    }

    /// Number of frames rendered.
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Whether [`MapEngine::destroy`] was called.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn target_for(&self, options: &CameraOptions) -> CameraPosition {
        let target = CameraPosition {
            target: options.center,
            zoom: options.zoom,
            bearing: options.bearing,
            tilt: options.pitch,
            padding: options.padding.unwrap_or(self.camera.padding),
        };
        self.limits.constrain(&target)
    }

    fn finish_running(&mut self) {
        if self.transition.take().is_some() {
            self.events.send(EngineEvent::CameraDidChange { animated: true });
        }
    }

    fn start(&mut self, options: &CameraOptions, duration: Duration, motion: Motion) {
        if self.destroyed {
            return;
        }
        self.finish_running();
        let to = self.target_for(options);
        self.events.send(EngineEvent::CameraWillChange { animated: true });
        if duration.is_zero() {
            self.camera = to;
            self.events.send(EngineEvent::CameraIsChanging);
            self.events.send(EngineEvent::CameraDidChange { animated: true });
            return;
        }
        self.transition = Some(Transition {
            from: self.camera,
            to,
            duration,
            elapsed: Duration::ZERO,
            motion,
        });
    }
}

impl MapEngine for HeadlessEngine {
    fn jump_to(&mut self, options: &CameraOptions) {
        if self.destroyed {
            return;
        }
        self.finish_running();
        self.events.send(EngineEvent::CameraWillChange { animated: false });
        self.camera = self.target_for(options);
        self.events.send(EngineEvent::CameraIsChanging);
        self.events.send(EngineEvent::CameraDidChange { animated: false });
    }

    fn ease_to(&mut self, options: &CameraOptions, duration: Duration, easing: Easing) {
        self.start(options, duration, Motion::Ease(easing.curve()));
    }

    fn fly_to(&mut self, options: &CameraOptions, duration: Duration) {
        let start = MercatorPoint::from_lat_lng(self.camera.target);
        let end = MercatorPoint::from_lat_lng(options.center);
        let distance_px =
            (end.x - start.x).hypot(end.y - start.y) * world_size(self.camera.zoom);
        let viewport_px = f64::from(self.viewport.width.max(self.viewport.height));
        let end_zoom = options
            .zoom
            .max(self.limits.min_zoom())
            .min(self.limits.max_zoom());
        let path = FlightPath::new(self.camera.zoom, end_zoom, distance_px, viewport_px);
        self.start(options, duration, Motion::Fly(path));
    }

    fn cancel_transitions(&mut self) {
        if self.destroyed {
            return;
        }
        self.finish_running();
    }

    fn camera_position(&self) -> CameraPosition {
        self.camera
    }

    fn load_style(&mut self, source: &StyleSource) {
        if self.destroyed {
            return;
        }
        tracing::debug!(?source, "Headless engine loading style");
        self.pending_style = Some(source.clone());
    }

    fn resize(&mut self, size: Size) {
        self.viewport = size;
    }

    fn set_limits(&mut self, limits: CameraLimits) {
        self.limits = limits;
        self.camera = limits.constrain(&self.camera);
    }

    fn advance(&mut self, elapsed: Duration) {
        if self.destroyed {
            return;
        }
        self.clock += elapsed;
        self.frame += 1;

        if self.pending_style.take().is_some() {
            match self.fail_next_style.take() {
                Some(error) => self.events.send(EngineEvent::StyleLoadFailed { error }),
                None => self.events.send(EngineEvent::StyleFinishedLoading),
            };
        }

        if let Some(mut transition) = self.transition.take() {
            transition.elapsed += elapsed;
            let t = transition.progress();
            self.camera = transition.sample(t);
            self.events.send(EngineEvent::CameraIsChanging);
            if t >= 1.0 {
                self.events.send(EngineEvent::CameraDidChange { animated: true });
            } else {
                self.transition = Some(transition);
            }
        }

        self.events.send(EngineEvent::FrameRendered(FrameStats {
            frame: self.frame,
            encoding_ms: 0.0,
            rendering_ms: elapsed.as_secs_f64() * 1000.0,
            fully_rendered: self.transition.is_none(),
        }));
    }

    fn destroy(&mut self) {
        tracing::debug!("Headless engine destroyed");
        self.destroyed = true;
        self.transition = None;
        self.pending_style = None;
    }
}
