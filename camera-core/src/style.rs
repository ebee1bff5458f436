//! Style swap lifecycle.
//!
//! One style is active at a time. A load request tears the previous style
//! down before the engine starts loading the new one. Completion is delivered
//! to two distinct slots: a single primary callback owned by the latest
//! request, and a queue of passive observers. Both are consumed once, on
//! success. A failure consumes only the primary slot.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::diagnostics::Diagnostics;
use crate::engine::StyleSource;
use crate::listener::{invoke_isolated, ListenerHandle, ListenerList};
use crate::CameraResult;

/// Loading state of a [`Style`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleState {
    /// The engine is fetching or parsing the style.
    Loading,
    /// The style is ready for use.
    Loaded,
    /// The engine reported a failure.
    Failed,
}

/// The active style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Style {
    source: StyleSource,
    generation: u64,
    state: StyleState,
}

impl Style {
    /// Where the style was loaded from.
    #[must_use]
    pub const fn source(&self) -> &StyleSource {
        &self.source
    }

    /// Monotonic load counter; each request gets a new generation.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Loading state.
    #[must_use]
    pub const fn state(&self) -> StyleState {
        self.state
    }

    /// Whether the style finished loading.
    #[must_use]
    pub const fn is_fully_loaded(&self) -> bool {
        matches!(self.state, StyleState::Loaded)
    }
}

/// Single-shot style-ready callback.
pub type StyleCallback = Box<dyn FnOnce(&Style) + Send>;

/// Multi-shot listener invoked whenever a style finishes loading.
pub type StyleLoadedListener = dyn Fn(&Style) + Send + Sync;

/// Multi-shot listener invoked whenever a style fails to load.
pub type StyleFailedListener = dyn Fn(&str) + Send + Sync;

/// Exactly-once delivery of style readiness.
#[derive(Default)]
pub(crate) struct StyleLoadCoordinator {
    active: Option<Style>,
    primary: Option<StyleCallback>,
    deferred: Vec<StyleCallback>,
    generation: u64,
    finished: ListenerList<StyleLoadedListener>,
    failed: ListenerList<StyleFailedListener>,
}

impl StyleLoadCoordinator {
    /// Create a coordinator with no style.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The active style in any state.
    #[must_use]
    pub const fn active(&self) -> Option<&Style> {
        self.active.as_ref()
    }

    /// The active style if it finished loading.
    #[must_use]
    pub fn style_if_loaded(&self) -> Option<&Style> {
        self.active().filter(|s| s.is_fully_loaded())
    }

    /// Whether a primary callback is waiting.
    #[must_use]
    pub const fn has_primary_callback(&self) -> bool {
        self.primary.is_some()
    }

    /// Number of queued passive observers.
    #[must_use]
    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    /// Begin a new load.
    ///
    /// The previous style is released first. A primary callback from an
    /// earlier request that has not fired is discarded uninvoked.
    pub fn request_load(&mut self, source: StyleSource, primary: Option<StyleCallback>) -> &Style {
        if let Some(previous) = self.active.take() {
            tracing::debug!(
                generation = previous.generation,
                "Releasing previous style before loading a new one"
            );
        }
        if self.primary.take().is_some() {
            tracing::debug!("Superseded style callback discarded");
        }
        self.generation += 1;
        self.primary = primary;
        tracing::info!(generation = self.generation, ?source, "Loading style");
        self.active.insert(Style {
            source,
            generation: self.generation,
            state: StyleState::Loading,
        })
    }

    /// Deliver `callback` now if the style is loaded, otherwise queue it.
    ///
    /// Returns `true` when the callback ran synchronously.
    pub fn register_passive_observer(&mut self, callback: StyleCallback) -> bool {
        if let Some(style) = self.active.as_ref().filter(|s| s.is_fully_loaded()) {
            invoke_isolated("style observer", || callback(style));
            return true;
        }
        self.deferred.push(callback);
        false
    }

    /// The engine failed to load the active style.
    ///
    /// The primary callback is dropped uninvoked. Queued passive observers
    /// stay queued for the next successful load.
    pub fn on_load_failed(&mut self, error: &str) {
        tracing::warn!("Style failed to load: {error}");
        if let Some(style) = self.active.as_mut() {
            style.state = StyleState::Failed;
        }
        self.primary = None;
        self.failed.dispatch("style load failed", |l| l(error));
    }

    /// The engine finished loading the active style.
    ///
    /// Runs the finished hooks, then the primary callback, then queued
    /// observers in registration order, and clears both slots.
    ///
    /// # Errors
    ///
    /// In strict mode, returns [`crate::CameraError::InvariantViolation`]
    /// when no style is active. Both slots are cleared regardless.
    pub fn on_load_succeeded(&mut self, diagnostics: &mut Diagnostics) -> CameraResult<()> {
        let primary = self.primary.take();
        let deferred = std::mem::take(&mut self.deferred);

        let Some(style) = self.active.as_mut() else {
            drop(primary);
            drop(deferred);
            return diagnostics.invariant("No style to provide.");
        };
        style.state = StyleState::Loaded;
        tracing::info!(generation = style.generation, "Style finished loading");

        let style: &Style = style;
        self.finished.dispatch("style finished loading", |l| l(style));
        if let Some(callback) = primary {
            invoke_isolated("style callback", || callback(style));
        }
        for callback in deferred {
            invoke_isolated("style observer", || callback(style));
        }
        Ok(())
    }

    /// Register a hook run on every successful load.
    pub fn add_finished_listener(&mut self, listener: Arc<StyleLoadedListener>) -> ListenerHandle {
        self.finished.add(listener)
    }

    /// Remove a finished hook.
    pub fn remove_finished_listener(&mut self, handle: &ListenerHandle) -> bool {
        self.finished.remove(handle)
    }

    /// Register a failure listener.
    pub fn add_failed_listener(&mut self, listener: Arc<StyleFailedListener>) -> ListenerHandle {
        self.failed.add(listener)
    }

    /// Remove a failure listener.
    pub fn remove_failed_listener(&mut self, handle: &ListenerHandle) -> bool {
        self.failed.remove(handle)
    }

    /// Release the style and drop every callback uninvoked.
    pub fn destroy(&mut self) {
        if self.has_primary_callback() || self.deferred_len() > 0 {
            tracing::debug!(
                primary = self.has_primary_callback(),
                deferred = self.deferred_len(),
                "Dropping pending style callbacks on teardown"
            );
        }
        self.active = None;
        self.primary = None;
        self.deferred.clear();
        self.finished.clear();
        self.failed.clear();
    }
}

impl fmt::Debug for StyleLoadCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleLoadCoordinator")
            .field("active", &self.active())
            .field("has_primary", &self.has_primary_callback())
            .field("deferred", &self.deferred_len())
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::ViolationKind;
    use std::sync::Mutex;

    fn tagged(log: &Arc<Mutex<Vec<String>>>, tag: &str) -> StyleCallback {
        let log = Arc::clone(log);
        let tag = tag.to_string();
        Box::new(move |style: &Style| {
            log.lock()
                .expect("lock")
                .push(format!("{tag}@{}", style.generation()));
        })
    }

    #[test]
    fn test_success_delivery_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut styles = StyleLoadCoordinator::new();
        let hook_log = Arc::clone(&log);
        styles.add_finished_listener(Arc::new(move |_style: &Style| {
            hook_log.lock().expect("lock").push("hook".into());
        }));

        styles.request_load(StyleSource::Empty, Some(tagged(&log, "primary")));
        assert!(!styles.register_passive_observer(tagged(&log, "a")));
        assert!(!styles.register_passive_observer(tagged(&log, "b")));
        styles
            .on_load_succeeded(&mut Diagnostics::new(true))
            .expect("style active");

        assert_eq!(
            *log.lock().expect("lock"),
            vec!["hook", "primary@1", "a@1", "b@1"]
        );
        assert_eq!(styles.deferred_len(), 0);
        assert!(!styles.has_primary_callback());
    }

    #[test]
    fn test_observer_after_load_runs_synchronously_once() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut styles = StyleLoadCoordinator::new();
        styles.request_load(StyleSource::Empty, None);
        styles
            .on_load_succeeded(&mut Diagnostics::new(false))
            .expect("style active");

        assert!(styles.register_passive_observer(tagged(&log, "late")));
        assert_eq!(*log.lock().expect("lock"), vec!["late@1"]);
        styles
            .on_load_succeeded(&mut Diagnostics::new(false))
            .expect("style active");
        assert_eq!(log.lock().expect("lock").len(), 1);
    }

    #[test]
    fn test_superseded_primary_never_fires() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut styles = StyleLoadCoordinator::new();
        styles.request_load(StyleSource::Url("first".into()), Some(tagged(&log, "first")));
        let second = styles.request_load(StyleSource::Url("second".into()), Some(tagged(&log, "second")));
        assert_eq!(second.generation(), 2);
        styles
            .on_load_succeeded(&mut Diagnostics::new(false))
            .expect("style active");
        assert_eq!(*log.lock().expect("lock"), vec!["second@2"]);
    }

    #[test]
    fn test_failure_drops_primary_but_keeps_deferred_observers() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut styles = StyleLoadCoordinator::new();
        styles.request_load(StyleSource::Empty, Some(tagged(&log, "primary")));
        styles.register_passive_observer(tagged(&log, "waiting"));

        styles.on_load_failed("404");
        assert!(!styles.has_primary_callback());
        assert_eq!(styles.deferred_len(), 1);
        assert_eq!(styles.active().map(Style::state), Some(StyleState::Failed));

        styles.request_load(StyleSource::Empty, None);
        styles
            .on_load_succeeded(&mut Diagnostics::new(false))
            .expect("style active");
        assert_eq!(*log.lock().expect("lock"), vec!["waiting@2"]);
    }

    #[test]
    fn test_loaded_event_without_style_is_invariant_violation() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut styles = StyleLoadCoordinator::new();
        styles.register_passive_observer(tagged(&log, "orphan"));

        let mut lenient = Diagnostics::new(false);
        styles.on_load_succeeded(&mut lenient).expect("lenient");
        assert_eq!(lenient.count(ViolationKind::InvariantViolation), 1);
        assert_eq!(styles.deferred_len(), 0);
        assert!(log.lock().expect("lock").is_empty());

        let mut strict = Diagnostics::new(true);
        assert!(styles.on_load_succeeded(&mut strict).is_err());
    }

    #[test]
    fn test_failure_listener_receives_reason() {
        let reasons = Arc::new(Mutex::new(Vec::new()));
        let mut styles = StyleLoadCoordinator::new();
        let sink = Arc::clone(&reasons);
        styles.add_failed_listener(Arc::new(move |error: &str| {
            sink.lock().expect("lock").push(error.to_string());
        }));
        styles.request_load(StyleSource::Empty, None);
        styles.on_load_failed("timeout");
        assert_eq!(*reasons.lock().expect("lock"), vec!["timeout"]);
    }
}
