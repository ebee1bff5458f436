//! Style Load Integration Tests
//!
//! Tests the style swap flow through `MapCamera`:
//! - Primary callback supersession
//! - Passive observers before and after load
//! - Failure channel and deferred observer retention
//! - Strict mode invariant reporting

use camera_core::{
    CameraConfig, CameraError, CameraLimits, CameraOptions, CameraPosition, Easing, EngineEvent,
    EventSender, HeadlessEngine, MapCamera, MapEngine, Size, Style, StyleCallback, StyleSource,
    StyleState, ViolationKind,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Log = Arc<Mutex<Vec<String>>>;

const FRAME: Duration = Duration::from_millis(16);

fn map_with(strict: bool) -> MapCamera<HeadlessEngine> {
    let config = CameraConfig {
        strict_mode: strict,
        ..CameraConfig::default()
    };
    MapCamera::headless(&config).expect("config")
}

fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().expect("lock").clone()
}

fn tagged(log: &Log, tag: &'static str) -> StyleCallback {
    let l = Arc::clone(log);
    Box::new(move |style: &Style| {
        l.lock()
            .expect("lock")
            .push(format!("{tag}@{}", style.generation()));
    })
}

fn url(name: &str) -> StyleSource {
    StyleSource::Url(format!("https://tiles.example.invalid/{name}.json"))
}

#[test]
fn test_observer_after_load_fires_synchronously_once() {
    let mut map = map_with(false);
    let log = new_log();
    map.set_style(url("streets"), None).expect("set style");
    map.render_frame(FRAME).expect("frame");
    assert!(map.style_if_loaded().expect("owner").is_some());

    let ran_now = map
        .get_style_async(tagged(&log, "late"))
        .expect("owner");
    assert!(ran_now);
    assert_eq!(entries(&log), vec!["late@1"]);

    map.render_frame(FRAME).expect("frame");
    map.set_style(url("outdoors"), None).expect("set style");
    map.render_frame(FRAME).expect("frame");
    assert_eq!(entries(&log), vec!["late@1"]);
}

#[test]
fn test_observer_before_load_is_deferred() {
    let mut map = map_with(false);
    let log = new_log();
    map.set_style(url("streets"), Some(tagged(&log, "primary")))
        .expect("set style");
    assert!(!map.get_style_async(tagged(&log, "a")).expect("owner"));
    assert!(!map.get_style_async(tagged(&log, "b")).expect("owner"));
    assert!(map.style_if_loaded().expect("owner").is_none());

    map.render_frame(FRAME).expect("frame");
    assert_eq!(entries(&log), vec!["primary@1", "a@1", "b@1"]);
}

#[test]
fn test_second_request_supersedes_first_callback() {
    let mut map = map_with(false);
    let log = new_log();
    map.set_style(url("first"), Some(tagged(&log, "first")))
        .expect("set style");
    map.set_style(url("second"), Some(tagged(&log, "second")))
        .expect("set style");
    for _ in 0..4 {
        map.render_frame(FRAME).expect("frame");
    }

    assert_eq!(entries(&log), vec!["second@2"]);
    let style = map
        .style_if_loaded()
        .expect("owner")
        .expect("loaded");
    assert_eq!(style.source(), &url("second"));
    assert_eq!(style.state(), StyleState::Loaded);
}

#[test]
fn test_finished_hook_runs_before_primary_on_every_load() {
    let mut map = map_with(false);
    let log = new_log();
    let l = Arc::clone(&log);
    map.add_on_did_finish_loading_style_listener(move |style: &Style| {
        l.lock()
            .expect("lock")
            .push(format!("hook@{}", style.generation()));
    })
    .expect("owner");

    map.set_style(url("one"), Some(tagged(&log, "primary")))
        .expect("set style");
    map.render_frame(FRAME).expect("frame");
    map.set_style(url("two"), None).expect("set style");
    map.render_frame(FRAME).expect("frame");

    assert_eq!(entries(&log), vec!["hook@1", "primary@1", "hook@2"]);
}

#[test]
fn test_failure_clears_primary_and_reports_error() {
    let mut map = map_with(false);
    let log = new_log();
    let l = Arc::clone(&log);
    map.add_on_did_fail_loading_style_listener(move |error: &str| {
        l.lock().expect("lock").push(format!("failed:{error}"));
    })
    .expect("owner");

    map.fail_next_style_load("HTTP 404").expect("owner");
    map.set_style(url("missing"), Some(tagged(&log, "primary")))
        .expect("set style");
    map.render_frame(FRAME).expect("frame");

    assert_eq!(entries(&log), vec!["failed:HTTP 404"]);
    assert!(map.style_if_loaded().expect("owner").is_none());
}

#[test]
fn test_deferred_observers_retained_after_failed_load() {
    let mut map = map_with(false);
    let log = new_log();

    map.fail_next_style_load("timeout").expect("owner");
    map.set_style(url("flaky"), Some(tagged(&log, "primary")))
        .expect("set style");
    map.get_style_async(tagged(&log, "waiting"))
        .expect("owner");
    map.render_frame(FRAME).expect("frame");
    assert!(entries(&log).is_empty());

    // The observer stays queued and is served by the next successful load.
    map.set_style(url("stable"), None).expect("set style");
    map.render_frame(FRAME).expect("frame");
    assert_eq!(entries(&log), vec!["waiting@2"]);
}

#[test]
fn test_loaded_event_without_style_is_soft_by_default() {
    let mut map = map_with(false);
    map.event_sender().send(EngineEvent::StyleFinishedLoading);
    map.pump_events().expect("lenient");
    assert_eq!(
        map.diagnostics().count(ViolationKind::InvariantViolation),
        1
    );
    assert_eq!(
        map.diagnostics().violations()[0].message,
        "No style to provide."
    );
}

#[test]
fn test_loaded_event_without_style_fails_in_strict_mode() {
    let mut map = map_with(true);
    map.event_sender().send(EngineEvent::StyleFinishedLoading);
    let err = map.pump_events().expect_err("strict");
    assert!(matches!(err, CameraError::InvariantViolation(_)));
}

#[test]
fn test_destroy_drops_pending_style_callbacks() {
    let mut map = map_with(false);
    let log = new_log();
    map.set_style(url("streets"), Some(tagged(&log, "primary")))
        .expect("set style");
    map.get_style_async(tagged(&log, "observer"))
        .expect("owner");
    map.destroy().expect("owner");
    map.render_frame(FRAME).expect("absorbed");
    map.pump_events().expect("absorbed");

    assert!(entries(&log).is_empty());
    assert!(!map.get_style_async(tagged(&log, "late")).expect("absorbed"));
    assert!(entries(&log).is_empty());
}

/// Engine that reports a style as loaded from inside `load_style`.
struct EagerStyleEngine {
    inner: HeadlessEngine,
    events: EventSender,
}

impl MapEngine for EagerStyleEngine {
    fn jump_to(&mut self, options: &CameraOptions) {
        self.inner.jump_to(options);
    }

    fn ease_to(&mut self, options: &CameraOptions, duration: Duration, easing: Easing) {
        self.inner.ease_to(options, duration, easing);
    }

    fn fly_to(&mut self, options: &CameraOptions, duration: Duration) {
        self.inner.fly_to(options, duration);
    }

    fn cancel_transitions(&mut self) {
        self.inner.cancel_transitions();
    }

    fn camera_position(&self) -> CameraPosition {
        self.inner.camera_position()
    }

    fn load_style(&mut self, _source: &StyleSource) {
        self.events.send(EngineEvent::StyleFinishedLoading);
    }

    fn resize(&mut self, size: Size) {
        self.inner.resize(size);
    }

    fn set_limits(&mut self, limits: CameraLimits) {
        self.inner.set_limits(limits);
    }

    fn advance(&mut self, elapsed: Duration) {
        self.inner.advance(elapsed);
    }

    fn destroy(&mut self) {
        self.inner.destroy();
    }
}

#[test]
fn test_synchronous_load_delivers_the_new_style() {
    let config = CameraConfig {
        strict_mode: true,
        ..CameraConfig::default()
    };
    let mut map = MapCamera::with_engine(&config, |events| EagerStyleEngine {
        inner: HeadlessEngine::new(events.clone(), config.viewport()),
        events,
    })
    .expect("config");
    let log = new_log();

    map.set_style(url("first"), Some(tagged(&log, "first")))
        .expect("set style");
    map.set_style(url("second"), Some(tagged(&log, "second")))
        .expect("set style");

    assert_eq!(entries(&log), vec!["first@1", "second@2"]);
    let style = map
        .style_if_loaded()
        .expect("owner")
        .expect("loaded");
    assert_eq!(style.source(), &url("second"));
    assert!(map.diagnostics().violations().is_empty());
}
