//! Camera transform orchestration.
//!
//! The controller resolves a [`CameraUpdate`] against the live camera, picks
//! the padding to apply, and hands the absolute target to the engine as a
//! jump, an eased transition or a flight. Every timed transition owns one
//! slot in a FIFO of pending callbacks; engine completions pop the front slot,
//! cancellation drains the whole queue. Both paths run on the owning thread,
//! so a callback fires exactly once with either outcome.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::CameraLimits;
use crate::dispatcher::{CameraChangeDispatcher, MoveReason};
use crate::easing::Easing;
use crate::engine::{CameraOptions, EngineEvent, EventQueue, MapEngine};
use crate::geo::{EdgeInsets, LatLngBounds, Size};
use crate::listener::invoke_isolated;
use crate::padding::PaddingCache;
use crate::position::{normalize_bearing, CameraPosition, POSITION_EPSILON};
use crate::projection;
use crate::update::CameraUpdate;
use crate::{CameraError, CameraResult};

/// How a transition ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionOutcome {
    /// The camera reached its target.
    Finished,
    /// The transition was stopped before reaching its target.
    Canceled,
}

/// Single-shot completion callback for a camera transition.
pub type TransitionCallback = Box<dyn FnOnce(TransitionOutcome) + Send>;

/// Interpolation used by a timed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Constant velocity.
    Linear,
    /// Ease-out timing curve.
    #[default]
    Eased,
    /// Zoom-out-and-in flight path.
    Fly,
}

/// A timed camera transition request.
pub struct AnimationRequest {
    /// What to change.
    pub update: CameraUpdate,
    /// How long the transition takes. Must be non-zero.
    pub duration: Duration,
    /// Timing of the transition.
    pub interpolation: Interpolation,
    /// Cancel a running transition before starting.
    pub cancels_prior_transition: bool,
    /// Reported to move-started listeners.
    pub reason: MoveReason,
    callback: Option<TransitionCallback>,
}

impl AnimationRequest {
    /// An eased, prior-cancelling API transition with no callback.
    #[must_use]
    pub fn new(update: CameraUpdate, duration: Duration) -> Self {
        Self {
            update,
            duration,
            interpolation: Interpolation::Eased,
            cancels_prior_transition: true,
            reason: MoveReason::ApiAnimation,
            callback: None,
        }
    }

    /// Set the interpolation.
    #[must_use]
    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Choose whether a running transition is canceled first.
    #[must_use]
    pub fn with_cancels_prior_transition(mut self, cancels: bool) -> Self {
        self.cancels_prior_transition = cancels;
        self
    }

    /// Attribute the move to a different reason.
    #[must_use]
    pub fn with_reason(mut self, reason: MoveReason) -> Self {
        self.reason = reason;
        self
    }

    /// Attach a completion callback.
    #[must_use]
    pub fn with_callback(mut self, callback: impl FnOnce(TransitionOutcome) + Send + 'static) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Whether a callback is attached.
    #[must_use]
    pub const fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// Reject a zero duration.
    ///
    /// # Errors
    ///
    /// Returns [`CameraError::InvalidDuration`] when `duration` is zero.
    pub fn validate(&self, operation: &'static str) -> CameraResult<()> {
        if self.duration.is_zero() {
            return Err(CameraError::InvalidDuration { operation });
        }
        Ok(())
    }
}

impl fmt::Debug for AnimationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationRequest")
            .field("update", &self.update)
            .field("duration", &self.duration)
            .field("interpolation", &self.interpolation)
            .field("cancels_prior_transition", &self.cancels_prior_transition)
            .field("reason", &self.reason)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

enum Prepared {
    Ready(CameraOptions),
    Unchanged,
    Unresolvable,
}

/// Applies camera updates to an engine and tracks transitions in flight.
pub(crate) struct TransformController<E: MapEngine> {
    engine: E,
    events: EventQueue,
    padding: PaddingCache,
    limits: CameraLimits,
    viewport: Size,
    pending: VecDeque<Option<TransitionCallback>>,
    next_reason: Option<MoveReason>,
    unrouted: Vec<EngineEvent>,
}

impl<E: MapEngine> TransformController<E> {
    /// Take ownership of an engine and the queue it posts to.
    pub fn new(mut engine: E, events: EventQueue, limits: CameraLimits, viewport: Size) -> Self {
        engine.set_limits(limits);
        engine.resize(viewport);
        Self {
            engine,
            events,
            padding: PaddingCache::new(),
            limits,
            viewport,
            pending: VecDeque::new(),
            next_reason: None,
            unrouted: Vec::new(),
        }
    }

    /// The engine.
    #[must_use]
    pub const fn engine(&self) -> &E {
        &self.engine
    }

    /// The engine, mutably.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Camera with any cached padding overlaid.
    #[must_use]
    pub fn camera_position(&self) -> CameraPosition {
        self.padding.overlay(self.engine.camera_position())
    }

    /// Cached padding, or the engine's padding.
    #[must_use]
    pub fn padding(&self) -> EdgeInsets {
        self.padding.get(&self.engine.camera_position())
    }

    /// Cache padding for the next transform without touching the engine.
    pub fn set_padding(&mut self, padding: EdgeInsets) {
        self.padding.set(padding);
    }

    /// Zoom and pitch preferences.
    #[must_use]
    pub const fn limits(&self) -> CameraLimits {
        self.limits
    }

    /// Replace the preferences and forward them to the engine.
    pub fn set_limits(&mut self, limits: CameraLimits) {
        self.limits = limits;
        self.engine.set_limits(limits);
    }

    /// Logical viewport size.
    #[must_use]
    pub const fn viewport(&self) -> Size {
        self.viewport
    }

    /// Resize the viewport.
    pub fn resize(&mut self, size: Size) {
        self.viewport = size;
        self.engine.resize(size);
    }

    /// Camera that shows `bounds` inside the viewport inset by `padding`,
    /// without moving. Bearing and tilt default to the current camera.
    ///
    /// Returns `None` when the padding leaves no room or the result is not
    /// finite.
    #[must_use]
    pub fn camera_for_bounds(
        &self,
        bounds: &LatLngBounds,
        padding: EdgeInsets,
        bearing: Option<f64>,
        tilt: Option<f64>,
    ) -> Option<CameraPosition> {
        let current = self.camera_position();
        let bearing = normalize_bearing(bearing.unwrap_or(current.bearing));
        let (center, zoom) =
            projection::fit_bounds(bounds, padding, self.viewport, bearing, self.limits.max_zoom())?;
        let camera = self.limits.constrain(&CameraPosition {
            target: center,
            zoom,
            bearing,
            tilt: tilt.unwrap_or(current.tilt),
            padding,
        });
        camera.is_finite().then_some(camera)
    }

    /// Number of timed transitions awaiting an outcome.
    #[must_use]
    pub fn pending_transitions(&self) -> usize {
        self.pending.len()
    }

    /// Apply an update instantly.
    ///
    /// The callback fires with [`TransitionOutcome::Finished`] before this
    /// returns, or with [`TransitionOutcome::Canceled`] when the update
    /// cannot be resolved.
    pub fn jump(
        &mut self,
        update: &CameraUpdate,
        reason: MoveReason,
        cancel_prior: bool,
        callback: Option<TransitionCallback>,
        dispatcher: &mut CameraChangeDispatcher,
    ) {
        let options = match self.prepare(update) {
            Prepared::Ready(options) => options,
            Prepared::Unchanged => return complete(callback, TransitionOutcome::Finished),
            Prepared::Unresolvable => return complete(callback, TransitionOutcome::Canceled),
        };
        if cancel_prior {
            self.cancel_all(dispatcher);
        }
        dispatcher.on_camera_move_started(reason);
        self.next_reason = Some(reason);
        self.engine.jump_to(&options);
        self.drain(dispatcher);
        self.next_reason = None;
        complete(callback, TransitionOutcome::Finished);
    }

    /// Start an eased transition or a flight.
    ///
    /// # Errors
    ///
    /// Returns [`CameraError::InvalidDuration`] for a zero duration; the
    /// callback is dropped without being invoked and the engine is untouched.
    pub fn animate(
        &mut self,
        request: AnimationRequest,
        operation: &'static str,
        dispatcher: &mut CameraChangeDispatcher,
    ) -> CameraResult<()> {
        request.validate(operation)?;
        let AnimationRequest {
            update,
            duration,
            interpolation,
            cancels_prior_transition,
            reason,
            callback,
        } = request;

        let options = match self.prepare(&update) {
            Prepared::Ready(options) => options,
            Prepared::Unchanged => {
                complete(callback, TransitionOutcome::Finished);
                return Ok(());
            }
            Prepared::Unresolvable => {
                complete(callback, TransitionOutcome::Canceled);
                return Ok(());
            }
        };
        if cancels_prior_transition {
            self.cancel_all(dispatcher);
        }
        dispatcher.on_camera_move_started(reason);
        self.next_reason = Some(reason);
        self.pending.push_back(callback);
        match interpolation {
            Interpolation::Linear => self.engine.ease_to(&options, duration, Easing::Linear),
            Interpolation::Eased => self.engine.ease_to(&options, duration, Easing::Eased),
            Interpolation::Fly => self.engine.fly_to(&options, duration),
        }
        self.drain(dispatcher);
        self.next_reason = None;
        Ok(())
    }

    /// Stop every transition in flight, reporting each as canceled.
    ///
    /// Idempotent when nothing is in flight.
    pub fn cancel_all(&mut self, dispatcher: &mut CameraChangeDispatcher) {
        let callbacks: Vec<_> = self.pending.drain(..).collect();
        if !callbacks.is_empty() {
            tracing::debug!("Canceling {} camera transition(s)", callbacks.len());
        }
        dispatcher.on_camera_move_canceled();
        for callback in callbacks {
            complete(callback, TransitionOutcome::Canceled);
        }
        self.engine.cancel_transitions();
        self.drain(dispatcher);
        dispatcher.on_camera_idle();
    }

    /// Drain engine events, routing camera events to `dispatcher` and
    /// pending callbacks. Other events are kept for [`Self::take_unrouted`].
    pub fn drain(&mut self, dispatcher: &mut CameraChangeDispatcher) {
        while let Some(event) = self.events.try_next() {
            match event {
                EngineEvent::CameraWillChange { .. } => {
                    dispatcher.on_camera_move_started(self.next_reason.unwrap_or(MoveReason::Gesture));
                }
                EngineEvent::CameraIsChanging => dispatcher.on_camera_move(),
                EngineEvent::CameraDidChange { animated } => {
                    if animated {
                        if let Some(callback) = self.pending.pop_front() {
                            complete(callback, TransitionOutcome::Finished);
                        }
                    }
                    if self.pending.is_empty() {
                        dispatcher.on_camera_idle();
                    }
                }
                other => self.unrouted.push(other),
            }
        }
    }

    /// Non-camera events collected by the last drains, oldest first.
    pub fn take_unrouted(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.unrouted)
    }

    /// Tear down: pending callbacks are dropped uninvoked and the engine is
    /// destroyed.
    pub fn destroy(&mut self) {
        if self.pending_transitions() > 0 {
            tracing::debug!(
                "Dropping {} pending camera callback(s) on teardown",
                self.pending_transitions()
            );
        }
        self.pending.clear();
        self.unrouted.clear();
        self.engine.destroy();
        self.events.close();
        while self.events.try_next().is_some() {}
    }

    fn prepare(&mut self, update: &CameraUpdate) -> Prepared {
        let current = self.camera_position();
        let Some(resolved) = update.resolve(&current, self.viewport, self.limits.max_zoom()) else {
            tracing::warn!(?update, "Camera update could not be resolved, ignoring");
            return Prepared::Unresolvable;
        };
        let target = self.limits.constrain(&resolved.target);
        // The cache is consumed even when the target is already rendered.
        let padding = self.padding.consume_for_animation(resolved.explicit_padding);
        if target.approx_eq(&self.engine.camera_position(), POSITION_EPSILON) {
            return Prepared::Unchanged;
        }
        Prepared::Ready(CameraOptions::from_position(&target, padding))
    }
}

impl<E: MapEngine + fmt::Debug> fmt::Debug for TransformController<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformController")
            .field("engine", &self.engine)
            .field("padding", &self.padding)
            .field("limits", &self.limits)
            .field("viewport", &self.viewport)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

fn complete(callback: Option<TransitionCallback>, outcome: TransitionOutcome) {
    if let Some(callback) = callback {
        invoke_isolated("camera transition callback", || callback(outcome));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{event_channel, HeadlessEngine};
    use crate::geo::LatLng;
    use std::sync::{Arc, Mutex};

    fn controller() -> TransformController<HeadlessEngine> {
        let (tx, rx) = event_channel();
        TransformController::new(
            HeadlessEngine::new(tx, Size::default()),
            rx,
            CameraLimits::default(),
            Size::default(),
        )
    }

    fn recorder() -> (Arc<Mutex<Vec<TransitionOutcome>>>, impl FnOnce(TransitionOutcome) + Send) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        (log, move |outcome| sink.lock().expect("lock").push(outcome))
    }

    fn ease_to(lng: f64) -> AnimationRequest {
        AnimationRequest::new(
            CameraUpdate::lat_lng_zoom(LatLng::new(0.0, lng), 4.0),
            Duration::from_millis(200),
        )
    }

    #[test]
    fn test_jump_reaches_target() {
        let mut transform = controller();
        let mut dispatcher = CameraChangeDispatcher::new();
        let (log, callback) = recorder();
        transform.jump(
            &CameraUpdate::lat_lng_zoom(LatLng::new(12.0, 34.0), 6.0),
            MoveReason::ApiAnimation,
            true,
            Some(Box::new(callback)),
            &mut dispatcher,
        );
        let camera = transform.camera_position();
        assert!(camera.target.approx_eq(&LatLng::new(12.0, 34.0), 1e-9));
        assert!((camera.zoom - 6.0).abs() < 1e-9);
        assert_eq!(*log.lock().expect("lock"), vec![TransitionOutcome::Finished]);
        assert!(dispatcher.is_idle());
    }

    #[test]
    fn test_zero_duration_rejected_without_callback() {
        let mut transform = controller();
        let mut dispatcher = CameraChangeDispatcher::new();
        let (log, callback) = recorder();
        let mut request = ease_to(10.0).with_callback(callback);
        request.duration = Duration::ZERO;

        let err = transform
            .animate(request, "ease_camera", &mut dispatcher)
            .expect_err("zero duration");
        assert!(err.is_usage_error());
        assert!(log.lock().expect("lock").is_empty());
        assert!(!transform.engine().is_transitioning());
    }

    #[test]
    fn test_cancel_prior_reports_canceled_once() {
        let mut transform = controller();
        let mut dispatcher = CameraChangeDispatcher::new();
        let (first, first_cb) = recorder();
        let (second, second_cb) = recorder();

        transform
            .animate(ease_to(10.0).with_callback(first_cb), "ease_camera", &mut dispatcher)
            .expect("first");
        transform
            .animate(ease_to(20.0).with_callback(second_cb), "ease_camera", &mut dispatcher)
            .expect("second");
        assert_eq!(*first.lock().expect("lock"), vec![TransitionOutcome::Canceled]);

        transform.engine_mut().advance(Duration::from_millis(250));
        transform.drain(&mut dispatcher);
        assert_eq!(*first.lock().expect("lock"), vec![TransitionOutcome::Canceled]);
        assert_eq!(*second.lock().expect("lock"), vec![TransitionOutcome::Finished]);
        assert!(dispatcher.is_idle());
    }

    #[test]
    fn test_without_cancel_prior_superseded_finishes() {
        let mut transform = controller();
        let mut dispatcher = CameraChangeDispatcher::new();
        let (first, first_cb) = recorder();
        let (second, second_cb) = recorder();

        transform
            .animate(ease_to(10.0).with_callback(first_cb), "ease_camera", &mut dispatcher)
            .expect("first");
        transform
            .animate(
                ease_to(20.0)
                    .with_callback(second_cb)
                    .with_cancels_prior_transition(false),
                "ease_camera",
                &mut dispatcher,
            )
            .expect("second");
        assert_eq!(*first.lock().expect("lock"), vec![TransitionOutcome::Finished]);
        assert!(second.lock().expect("lock").is_empty());
        assert!(!dispatcher.is_idle());
        assert_eq!(transform.pending_transitions(), 1);
    }

    #[test]
    fn test_cancel_all_is_idempotent() {
        let mut transform = controller();
        let mut dispatcher = CameraChangeDispatcher::new();
        let (log, callback) = recorder();
        transform
            .animate(ease_to(10.0).with_callback(callback), "ease_camera", &mut dispatcher)
            .expect("ease");
        transform.cancel_all(&mut dispatcher);
        transform.cancel_all(&mut dispatcher);
        assert_eq!(*log.lock().expect("lock"), vec![TransitionOutcome::Canceled]);
        assert_eq!(transform.pending_transitions(), 0);
    }

    #[test]
    fn test_cached_padding_applied_then_cleared() {
        let mut transform = controller();
        let mut dispatcher = CameraChangeDispatcher::new();
        let padding = EdgeInsets::new(10.0, 20.0, 30.0, 40.0);
        transform.set_padding(padding);
        assert_eq!(transform.engine().camera_position().padding, EdgeInsets::ZERO);

        transform.jump(
            &CameraUpdate::zoom_by(1.0),
            MoveReason::ApiAnimation,
            true,
            None,
            &mut dispatcher,
        );
        assert_eq!(transform.engine().camera_position().padding, padding);
        assert_eq!(transform.padding(), padding);
    }

    #[test]
    fn test_unchanged_target_finishes_without_engine() {
        let mut transform = controller();
        let mut dispatcher = CameraChangeDispatcher::new();
        let (log, callback) = recorder();
        transform
            .animate(
                AnimationRequest::new(CameraUpdate::ZoomTo { zoom: 0.0 }, Duration::from_millis(100))
                    .with_callback(callback),
                "ease_camera",
                &mut dispatcher,
            )
            .expect("ease");
        assert_eq!(*log.lock().expect("lock"), vec![TransitionOutcome::Finished]);
        assert!(!transform.engine().is_transitioning());
    }

    #[test]
    fn test_explicit_padding_equal_to_rendered_clears_cache() {
        let mut transform = controller();
        let mut dispatcher = CameraChangeDispatcher::new();
        let cached = EdgeInsets::new(50.0, 50.0, 50.0, 50.0);
        transform.set_padding(cached);

        let (log, callback) = recorder();
        transform.jump(
            &CameraUpdate::PaddingTo {
                padding: EdgeInsets::ZERO,
            },
            MoveReason::ApiAnimation,
            true,
            Some(Box::new(callback)),
            &mut dispatcher,
        );
        assert_eq!(*log.lock().expect("lock"), vec![TransitionOutcome::Finished]);
        assert_eq!(transform.padding(), EdgeInsets::ZERO);

        transform.jump(
            &CameraUpdate::zoom_by(1.0),
            MoveReason::ApiAnimation,
            true,
            None,
            &mut dispatcher,
        );
        assert_eq!(transform.engine().camera_position().padding, EdgeInsets::ZERO);
    }

    #[test]
    fn test_destroy_drops_pending_callbacks() {
        let mut transform = controller();
        let mut dispatcher = CameraChangeDispatcher::new();
        let (log, callback) = recorder();
        transform
            .animate(ease_to(10.0).with_callback(callback), "ease_camera", &mut dispatcher)
            .expect("ease");
        transform.destroy();
        assert!(log.lock().expect("lock").is_empty());
        assert!(transform.engine().is_destroyed());
    }
}
