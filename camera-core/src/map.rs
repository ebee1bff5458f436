//! The owning-thread facade over camera and style coordination.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{
    CameraConfig, CameraLimits, ABSOLUTE_MAX_PITCH, ABSOLUTE_MAX_ZOOM, ABSOLUTE_MIN_PITCH,
    ABSOLUTE_MIN_ZOOM, MAX_VIEWPORT_DIMENSION,
};
use crate::diagnostics::Diagnostics;
use crate::dispatcher::{CameraChangeDispatcher, CameraEventListener, MoveReason};
use crate::engine::{
    event_channel, EngineEvent, EventSender, FrameStats, HeadlessEngine, MapEngine, StyleSource,
};
use crate::geo::{EdgeInsets, LatLngBounds, Size};
use crate::listener::{ListenerHandle, ListenerList};
use crate::position::CameraPosition;
use crate::style::{Style, StyleCallback, StyleLoadCoordinator};
use crate::thread_guard::{Access, ThreadGuard};
use crate::transform::{AnimationRequest, Interpolation, TransformController, TransitionCallback};
use crate::update::CameraUpdate;
use crate::CameraResult;

/// Listener for marshaled frame statistics.
pub type FrameRenderedListener = dyn Fn(&FrameStats) + Send + Sync;

/// Camera and style controller bound to the thread that created it.
///
/// Every method checks the calling thread first and fails with
/// [`crate::CameraError::WrongThread`] off the owning thread. After
/// [`MapCamera::destroy`] calls return defaults and are recorded as
/// post-destruction diagnostics.
pub struct MapCamera<E: MapEngine> {
    guard: ThreadGuard,
    diagnostics: Diagnostics,
    transform: TransformController<E>,
    dispatcher: CameraChangeDispatcher,
    styles: StyleLoadCoordinator,
    developer_animation: ListenerList<CameraEventListener>,
    frame_rendered: ListenerList<FrameRenderedListener>,
    events: EventSender,
    default_duration: Duration,
}

impl MapCamera<HeadlessEngine> {
    /// Create a camera over a [`HeadlessEngine`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::Config`] if `config` is invalid.
    pub fn headless(config: &CameraConfig) -> CameraResult<Self> {
        let viewport = config.viewport();
        Self::with_engine(config, |events| HeadlessEngine::new(events, viewport))
    }

    /// Make the next style load fail with `reason`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread.
    pub fn fail_next_style_load(&mut self, reason: impl Into<String>) -> CameraResult<()> {
        if self.enter("fail_next_style_load")? {
            self.transform.engine_mut().fail_next_style_load(reason);
        }
        Ok(())
    }
}

impl<E: MapEngine> MapCamera<E> {
    /// Create a camera, building the engine around the event sender it must
    /// post to.
    ///
    /// The calling thread becomes the owning thread.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::Config`] if `config` is invalid.
    pub fn with_engine(
        config: &CameraConfig,
        build: impl FnOnce(EventSender) -> E,
    ) -> CameraResult<Self> {
        config.validate()?;
        let (sender, queue) = event_channel();
        let engine = build(sender.clone());
        tracing::debug!(?config, "Creating map camera");
        Ok(Self {
            guard: ThreadGuard::new(),
            diagnostics: Diagnostics::new(config.strict_mode),
            transform: TransformController::new(engine, queue, config.limits(), config.viewport()),
            dispatcher: CameraChangeDispatcher::new(),
            styles: StyleLoadCoordinator::new(),
            developer_animation: ListenerList::new(),
            frame_rendered: ListenerList::new(),
            events: sender,
            default_duration: config.default_animation_duration(),
        })
    }

    // Camera

    /// Move the camera instantly, cancelling any running transition.
    ///
    /// # Errors
    ///
    /// See [`MapCamera::move_camera_with`].
    pub fn move_camera(&mut self, update: &CameraUpdate) -> CameraResult<()> {
        self.move_camera_with(update, true, None)
    }

    /// Move the camera instantly.
    ///
    /// Developer-animation listeners are notified before the engine is
    /// touched. The callback, if any, reports the outcome before this
    /// returns.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread, or
    /// [`crate::CameraError::InvariantViolation`] in strict mode if an event
    /// drained during the call breaks an invariant.
    pub fn move_camera_with(
        &mut self,
        update: &CameraUpdate,
        cancel_prior: bool,
        callback: Option<TransitionCallback>,
    ) -> CameraResult<()> {
        if !self.enter("move_camera")? {
            return Ok(());
        }
        self.notify_developer_animation();
        self.transform.jump(
            update,
            MoveReason::ApiAnimation,
            cancel_prior,
            callback,
            &mut self.dispatcher,
        );
        self.route_events()
    }

    /// Move the camera instantly on behalf of a user gesture.
    ///
    /// Developer-animation listeners are not notified.
    ///
    /// # Errors
    ///
    /// Same as [`MapCamera::move_camera_with`].
    pub fn gesture_move(&mut self, update: &CameraUpdate) -> CameraResult<()> {
        if !self.enter("gesture_move")? {
            return Ok(());
        }
        self.transform
            .jump(update, MoveReason::Gesture, true, None, &mut self.dispatcher);
        self.route_events()
    }

    /// Start an eased transition.
    ///
    /// A request asking for [`Interpolation::Fly`] is eased instead; use
    /// [`MapCamera::animate_camera`] for flights.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::InvalidDuration`] for a zero duration
    /// before any listener or the engine is touched, and otherwise the same
    /// errors as [`MapCamera::move_camera_with`].
    pub fn ease_camera(&mut self, mut request: AnimationRequest) -> CameraResult<()> {
        if request.interpolation == Interpolation::Fly {
            request.interpolation = Interpolation::Eased;
        }
        self.start_transition("ease_camera", request)
    }

    /// Start a flight.
    ///
    /// # Errors
    ///
    /// Same as [`MapCamera::ease_camera`].
    pub fn animate_camera(&mut self, request: AnimationRequest) -> CameraResult<()> {
        self.start_transition("animate_camera", request.with_interpolation(Interpolation::Fly))
    }

    /// Ease over the configured default duration.
    ///
    /// # Errors
    ///
    /// Same as [`MapCamera::ease_camera`].
    pub fn ease_camera_default(&mut self, update: CameraUpdate) -> CameraResult<()> {
        let request = AnimationRequest::new(update, self.default_duration);
        self.ease_camera(request)
    }

    /// Fly over the configured default duration.
    ///
    /// # Errors
    ///
    /// Same as [`MapCamera::ease_camera`].
    pub fn animate_camera_default(&mut self, update: CameraUpdate) -> CameraResult<()> {
        let request = AnimationRequest::new(update, self.default_duration);
        self.animate_camera(request)
    }

    /// Stop any running transition, reporting it as canceled.
    ///
    /// # Errors
    ///
    /// Same as [`MapCamera::move_camera_with`].
    pub fn cancel_transitions(&mut self) -> CameraResult<()> {
        if !self.enter("cancel_transitions")? {
            return Ok(());
        }
        self.transform.cancel_all(&mut self.dispatcher);
        self.route_events()
    }

    /// Current camera, with cached padding overlaid.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread.
    pub fn camera_position(&mut self) -> CameraResult<CameraPosition> {
        if !self.enter("camera_position")? {
            return Ok(CameraPosition::default());
        }
        Ok(self.transform.camera_position())
    }

    /// Cache padding for the next camera transform.
    ///
    /// The rendered padding is unchanged until then.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread.
    pub fn set_padding(&mut self, left: f64, top: f64, right: f64, bottom: f64) -> CameraResult<()> {
        if self.enter("set_padding")? {
            self.transform
                .set_padding(EdgeInsets::new(left, top, right, bottom));
        }
        Ok(())
    }

    /// Cached padding, or the engine's padding.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread.
    pub fn padding(&mut self) -> CameraResult<EdgeInsets> {
        if !self.enter("padding")? {
            return Ok(EdgeInsets::ZERO);
        }
        Ok(self.transform.padding())
    }

    /// Resize the viewport. Each dimension is clamped to `[0, 65535]`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread.
    pub fn resize_view(&mut self, width: i64, height: i64) -> CameraResult<()> {
        if self.enter("resize_view")? {
            let size = Size::new(clamp_dimension("width", width), clamp_dimension("height", height));
            self.transform.resize(size);
        }
        Ok(())
    }

    /// Logical viewport size.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread.
    pub fn viewport(&mut self) -> CameraResult<Size> {
        if !self.enter("viewport")? {
            return Ok(Size::new(0, 0));
        }
        Ok(self.transform.viewport())
    }

    // Preferences

    /// Set the minimum zoom preference, clamped to `[0, 25.5]`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread.
    pub fn set_min_zoom_preference(&mut self, zoom: f64) -> CameraResult<()> {
        self.update_limits("set_min_zoom_preference", |l| l.set_min_zoom(zoom))
    }

    /// Set the maximum zoom preference, clamped to `[0, 25.5]`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread.
    pub fn set_max_zoom_preference(&mut self, zoom: f64) -> CameraResult<()> {
        self.update_limits("set_max_zoom_preference", |l| l.set_max_zoom(zoom))
    }

    /// Set the minimum pitch preference, clamped to `[0, 60]`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread.
    pub fn set_min_pitch_preference(&mut self, pitch: f64) -> CameraResult<()> {
        self.update_limits("set_min_pitch_preference", |l| l.set_min_pitch(pitch))
    }

    /// Set the maximum pitch preference, clamped to `[0, 60]`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread.
    pub fn set_max_pitch_preference(&mut self, pitch: f64) -> CameraResult<()> {
        self.update_limits("set_max_pitch_preference", |l| l.set_max_pitch(pitch))
    }

    /// Minimum zoom preference.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread.
    pub fn min_zoom_preference(&mut self) -> CameraResult<f64> {
        self.read_limit("min_zoom_preference", ABSOLUTE_MIN_ZOOM, CameraLimits::min_zoom)
    }

    /// Maximum zoom preference.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread.
    pub fn max_zoom_preference(&mut self) -> CameraResult<f64> {
        self.read_limit("max_zoom_preference", ABSOLUTE_MAX_ZOOM, CameraLimits::max_zoom)
    }

    /// Minimum pitch preference.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread.
    pub fn min_pitch_preference(&mut self) -> CameraResult<f64> {
        self.read_limit("min_pitch_preference", ABSOLUTE_MIN_PITCH, CameraLimits::min_pitch)
    }

    /// Maximum pitch preference.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread.
    pub fn max_pitch_preference(&mut self) -> CameraResult<f64> {
        self.read_limit("max_pitch_preference", ABSOLUTE_MAX_PITCH, CameraLimits::max_pitch)
    }

    /// Keep the camera target within `bounds`; `None` lifts the restriction.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread.
    pub fn set_lat_lng_bounds_for_camera_target(
        &mut self,
        bounds: Option<LatLngBounds>,
    ) -> CameraResult<()> {
        self.update_limits("set_lat_lng_bounds_for_camera_target", |l| {
            l.set_target_bounds(bounds);
        })
    }

    /// Bounds the camera target is kept within, if any.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread.
    pub fn lat_lng_bounds_for_camera_target(&mut self) -> CameraResult<Option<LatLngBounds>> {
        if !self.enter("lat_lng_bounds_for_camera_target")? {
            return Ok(None);
        }
        Ok(self.transform.limits().target_bounds())
    }

    /// Camera that would show `bounds` with `padding`, without moving.
    ///
    /// `bearing` and `tilt` default to the current camera. Returns `None`
    /// when the padding leaves no room for the bounds.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread.
    pub fn camera_for_lat_lng_bounds(
        &mut self,
        bounds: &LatLngBounds,
        padding: EdgeInsets,
        bearing: Option<f64>,
        tilt: Option<f64>,
    ) -> CameraResult<Option<CameraPosition>> {
        if !self.enter("camera_for_lat_lng_bounds")? {
            return Ok(None);
        }
        Ok(self
            .transform
            .camera_for_bounds(bounds, padding, bearing, tilt))
    }

    // Style

    /// Replace the style. The previous style is released first and any
    /// earlier, unfired style callback is discarded.
    ///
    /// # Errors
    ///
    /// Same as [`MapCamera::move_camera_with`].
    pub fn set_style(&mut self, source: StyleSource, callback: Option<StyleCallback>) -> CameraResult<()> {
        if !self.enter("set_style")? {
            return Ok(());
        }
        self.styles.request_load(source.clone(), callback);
        self.transform.engine_mut().load_style(&source);
        self.route_events()
    }

    /// Run `callback` with the style once it is loaded; immediately if it
    /// already is.
    ///
    /// Returns `true` when the callback ran before returning.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread.
    pub fn get_style_async(&mut self, callback: StyleCallback) -> CameraResult<bool> {
        if !self.enter("get_style_async")? {
            return Ok(false);
        }
        Ok(self.styles.register_passive_observer(callback))
    }

    /// The style, if it finished loading.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread.
    pub fn style_if_loaded(&mut self) -> CameraResult<Option<Style>> {
        if !self.enter("style_if_loaded")? {
            return Ok(None);
        }
        Ok(self.styles.style_if_loaded().cloned())
    }

    // Frames and events

    /// Advance the engine one frame and deliver the events it produced.
    ///
    /// # Errors
    ///
    /// Same as [`MapCamera::move_camera_with`].
    pub fn render_frame(&mut self, elapsed: Duration) -> CameraResult<()> {
        if !self.enter("render_frame")? {
            return Ok(());
        }
        self.transform.engine_mut().advance(elapsed);
        self.route_events()
    }

    /// Deliver events posted to the engine channel since the last call.
    ///
    /// # Errors
    ///
    /// Same as [`MapCamera::move_camera_with`].
    pub fn pump_events(&mut self) -> CameraResult<()> {
        if !self.enter("pump_events")? {
            return Ok(());
        }
        self.route_events()
    }

    /// A sender other threads can post engine events through. Events are
    /// delivered on the owning thread by the next pump.
    #[must_use]
    pub fn event_sender(&self) -> EventSender {
        self.events.clone()
    }

    // Listeners

    /// Register an idle listener.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread.
    pub fn add_on_camera_idle_listener(
        &mut self,
        listener: impl Fn() + Send + Sync + 'static,
    ) -> CameraResult<ListenerHandle> {
        if !self.enter("add_on_camera_idle_listener")? {
            return Ok(ListenerHandle::inert());
        }
        Ok(self.dispatcher.add_idle_listener(Arc::new(listener)))
    }

    /// Remove an idle listener.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread.
    pub fn remove_on_camera_idle_listener(&mut self, handle: &ListenerHandle) -> CameraResult<bool> {
        if !self.enter("remove_on_camera_idle_listener")? {
            return Ok(false);
        }
        Ok(self.dispatcher.remove_idle_listener(handle))
    }

    /// Register a move-started listener.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread.
    pub fn add_on_camera_move_started_listener(
        &mut self,
        listener: impl Fn(MoveReason) + Send + Sync + 'static,
    ) -> CameraResult<ListenerHandle> {
        if !self.enter("add_on_camera_move_started_listener")? {
            return Ok(ListenerHandle::inert());
        }
        Ok(self.dispatcher.add_move_started_listener(Arc::new(listener)))
    }

    /// Remove a move-started listener.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread.
    pub fn remove_on_camera_move_started_listener(
        &mut self,
        handle: &ListenerHandle,
    ) -> CameraResult<bool> {
        if !self.enter("remove_on_camera_move_started_listener")? {
            return Ok(false);
        }
        Ok(self.dispatcher.remove_move_started_listener(handle))
    }

    /// Register a move listener.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread.
    pub fn add_on_camera_move_listener(
        &mut self,
        listener: impl Fn() + Send + Sync + 'static,
    ) -> CameraResult<ListenerHandle> {
        if !self.enter("add_on_camera_move_listener")? {
            return Ok(ListenerHandle::inert());
        }
        Ok(self.dispatcher.add_move_listener(Arc::new(listener)))
    }

    /// Remove a move listener.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread.
    pub fn remove_on_camera_move_listener(&mut self, handle: &ListenerHandle) -> CameraResult<bool> {
        if !self.enter("remove_on_camera_move_listener")? {
            return Ok(false);
        }
        Ok(self.dispatcher.remove_move_listener(handle))
    }

    /// Register a move-canceled listener.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread.
    pub fn add_on_camera_move_cancel_listener(
        &mut self,
        listener: impl Fn() + Send + Sync + 'static,
    ) -> CameraResult<ListenerHandle> {
        if !self.enter("add_on_camera_move_cancel_listener")? {
            return Ok(ListenerHandle::inert());
        }
        Ok(self.dispatcher.add_move_canceled_listener(Arc::new(listener)))
    }

    /// Remove a move-canceled listener.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread.
    pub fn remove_on_camera_move_cancel_listener(
        &mut self,
        handle: &ListenerHandle,
    ) -> CameraResult<bool> {
        if !self.enter("remove_on_camera_move_cancel_listener")? {
            return Ok(false);
        }
        Ok(self.dispatcher.remove_move_canceled_listener(handle))
    }

    /// Register a listener told when a caller-driven transform begins,
    /// before the engine is touched.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread.
    pub fn add_on_developer_animation_listener(
        &mut self,
        listener: impl Fn() + Send + Sync + 'static,
    ) -> CameraResult<ListenerHandle> {
        if !self.enter("add_on_developer_animation_listener")? {
            return Ok(ListenerHandle::inert());
        }
        Ok(self.developer_animation.add(Arc::new(listener)))
    }

    /// Remove a developer-animation listener.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread.
    pub fn remove_on_developer_animation_listener(
        &mut self,
        handle: &ListenerHandle,
    ) -> CameraResult<bool> {
        if !self.enter("remove_on_developer_animation_listener")? {
            return Ok(false);
        }
        Ok(self.developer_animation.remove(handle))
    }

    /// Register a hook run every time a style finishes loading.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread.
    pub fn add_on_did_finish_loading_style_listener(
        &mut self,
        listener: impl Fn(&Style) + Send + Sync + 'static,
    ) -> CameraResult<ListenerHandle> {
        if !self.enter("add_on_did_finish_loading_style_listener")? {
            return Ok(ListenerHandle::inert());
        }
        Ok(self.styles.add_finished_listener(Arc::new(listener)))
    }

    /// Remove a style-finished hook.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread.
    pub fn remove_on_did_finish_loading_style_listener(
        &mut self,
        handle: &ListenerHandle,
    ) -> CameraResult<bool> {
        if !self.enter("remove_on_did_finish_loading_style_listener")? {
            return Ok(false);
        }
        Ok(self.styles.remove_finished_listener(handle))
    }

    /// Register a style failure listener.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread.
    pub fn add_on_did_fail_loading_style_listener(
        &mut self,
        listener: impl Fn(&str) + Send + Sync + 'static,
    ) -> CameraResult<ListenerHandle> {
        if !self.enter("add_on_did_fail_loading_style_listener")? {
            return Ok(ListenerHandle::inert());
        }
        Ok(self.styles.add_failed_listener(Arc::new(listener)))
    }

    /// Remove a style failure listener.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread.
    pub fn remove_on_did_fail_loading_style_listener(
        &mut self,
        handle: &ListenerHandle,
    ) -> CameraResult<bool> {
        if !self.enter("remove_on_did_fail_loading_style_listener")? {
            return Ok(false);
        }
        Ok(self.styles.remove_failed_listener(handle))
    }

    /// Register a frame statistics listener.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread.
    pub fn add_on_frame_rendered_listener(
        &mut self,
        listener: impl Fn(&FrameStats) + Send + Sync + 'static,
    ) -> CameraResult<ListenerHandle> {
        if !self.enter("add_on_frame_rendered_listener")? {
            return Ok(ListenerHandle::inert());
        }
        Ok(self.frame_rendered.add(Arc::new(listener)))
    }

    /// Remove a frame statistics listener.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread.
    pub fn remove_on_frame_rendered_listener(
        &mut self,
        handle: &ListenerHandle,
    ) -> CameraResult<bool> {
        if !self.enter("remove_on_frame_rendered_listener")? {
            return Ok(false);
        }
        Ok(self.frame_rendered.remove(handle))
    }

    // Lifecycle

    /// Tear down. Pending callbacks are dropped without being invoked, the
    /// style is released, listeners are cleared and the engine is destroyed.
    /// Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CameraError::WrongThread`] off the owning thread.
    pub fn destroy(&mut self) -> CameraResult<()> {
        if self.guard.check("destroy")?.is_destroyed() {
            return Ok(());
        }
        tracing::info!("Destroying map camera");
        self.transform.destroy();
        self.styles.destroy();
        self.dispatcher.clear();
        self.developer_animation.clear();
        self.frame_rendered.clear();
        self.guard.invalidate();
        Ok(())
    }

    /// Whether [`MapCamera::destroy`] was called.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.guard.is_destroyed()
    }

    /// Recorded soft violations.
    #[must_use]
    pub const fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// The engine, read-only.
    #[must_use]
    pub const fn engine(&self) -> &E {
        self.transform.engine()
    }

    fn enter(&mut self, operation: &'static str) -> CameraResult<bool> {
        match self.guard.check(operation)? {
            Access::Live => Ok(true),
            Access::Destroyed => {
                self.diagnostics.post_destruction(operation);
                Ok(false)
            }
        }
    }

    fn start_transition(&mut self, operation: &'static str, request: AnimationRequest) -> CameraResult<()> {
        if !self.enter(operation)? {
            return Ok(());
        }
        request.validate(operation)?;
        self.notify_developer_animation();
        self.transform
            .animate(request, operation, &mut self.dispatcher)?;
        self.route_events()
    }

    fn notify_developer_animation(&mut self) {
        self.developer_animation.dispatch("developer animation", |l| l());
    }

    fn update_limits(
        &mut self,
        operation: &'static str,
        apply: impl FnOnce(&mut CameraLimits),
    ) -> CameraResult<()> {
        if self.enter(operation)? {
            let mut limits = self.transform.limits();
            apply(&mut limits);
            self.transform.set_limits(limits);
        }
        Ok(())
    }

    fn read_limit(
        &mut self,
        operation: &'static str,
        default: f64,
        read: impl FnOnce(&CameraLimits) -> f64,
    ) -> CameraResult<f64> {
        if !self.enter(operation)? {
            return Ok(default);
        }
        Ok(read(&self.transform.limits()))
    }

    fn route_events(&mut self) -> CameraResult<()> {
        self.transform.drain(&mut self.dispatcher);
        let mut result = Ok(());
        for event in self.transform.take_unrouted() {
            match event {
                EngineEvent::StyleFinishedLoading => {
                    if let Err(e) = self.styles.on_load_succeeded(&mut self.diagnostics) {
                        if result.is_ok() {
                            result = Err(e);
                        }
                    }
                }
                EngineEvent::StyleLoadFailed { error } => self.styles.on_load_failed(&error),
                EngineEvent::FrameRendered(stats) => {
                    self.frame_rendered.dispatch("frame rendered", |l| l(&stats));
                }
                EngineEvent::CameraWillChange { .. }
                | EngineEvent::CameraIsChanging
                | EngineEvent::CameraDidChange { .. } => {}
            }
        }
        result
    }
}

impl<E: MapEngine + fmt::Debug> fmt::Debug for MapCamera<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapCamera")
            .field("guard", &self.guard)
            .field("transform", &self.transform)
            .field("dispatcher", &self.dispatcher)
            .field("styles", &self.styles)
            .finish_non_exhaustive()
    }
}

fn clamp_dimension(name: &str, value: i64) -> u32 {
    let max = i64::from(MAX_VIEWPORT_DIMENSION);
    let clamped = value.clamp(0, max);
    if clamped != value {
        tracing::warn!("Viewport {name} {value} outside [0, {max}], clamped to {clamped}");
    }
    u32::try_from(clamped).unwrap_or(MAX_VIEWPORT_DIMENSION)
}
