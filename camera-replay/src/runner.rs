//! Drives a [`MapCamera`] through a scenario and records what observers see.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use camera_core::{
    AnimationRequest, CameraConfig, CameraPosition, CameraResult, CameraUpdate, HeadlessEngine,
    MapCamera, MoveReason, Style, StyleCallback, TransitionCallback, TransitionOutcome, Violation,
};
use serde::Serialize;

use crate::error::ReplayResult;
use crate::scenario::{Scenario, Step};

/// Default frame interval.
pub const DEFAULT_FRAME: Duration = Duration::from_millis(16);

/// One observer notification, in delivery order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEntry {
    /// A move started.
    MoveStarted {
        /// Why it started.
        reason: MoveReason,
    },
    /// The camera changed.
    Move,
    /// The running move was preempted.
    MoveCanceled,
    /// The camera settled.
    Idle,
    /// An internal component is about to move the camera.
    DeveloperAnimation,
    /// A step's transition callback fired.
    TransitionEnded {
        /// Index of the step that started the transition.
        step: usize,
        /// How it ended.
        outcome: TransitionOutcome,
    },
    /// A step's style callback fired.
    StyleReady {
        /// Index of the step that registered the callback.
        step: usize,
        /// Generation of the style delivered.
        generation: u64,
    },
    /// A style finished loading.
    StyleLoaded {
        /// Generation of the loaded style.
        generation: u64,
    },
    /// A style failed to load.
    StyleFailed {
        /// Engine-provided reason.
        error: String,
    },
    /// A step's arguments were rejected; the replay continued.
    Rejected {
        /// Index of the rejected step.
        step: usize,
        /// Operation name.
        op: &'static str,
        /// Rejection message.
        error: String,
    },
    /// Final state after the last step.
    Finished {
        /// Frames rendered.
        frames: u64,
        /// Camera after the last step.
        position: CameraPosition,
        /// Soft violations recorded along the way.
        violations: Vec<Violation>,
    },
}

/// Replay pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayOptions {
    /// Virtual time advanced per frame.
    pub frame: Duration,
    /// Sleep for `frame` between frames.
    pub realtime: bool,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            frame: DEFAULT_FRAME,
            realtime: false,
        }
    }
}

type Log = Arc<Mutex<Vec<LogEntry>>>;

fn push(log: &Log, entry: LogEntry) {
    log.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(entry);
}

/// Scenario runner over a headless camera.
#[derive(Debug)]
pub struct Replay {
    map: MapCamera<HeadlessEngine>,
    log: Log,
    frames: Arc<AtomicU64>,
    options: ReplayOptions,
    default_duration: Duration,
}

impl Replay {
    /// Build a headless camera from `config` and attach recording observers.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ReplayError::Camera`] if `config` is invalid.
    pub fn new(config: &CameraConfig, options: ReplayOptions) -> ReplayResult<Self> {
        let mut map = MapCamera::headless(config)?;
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let frames = Arc::new(AtomicU64::new(0));

        let l = Arc::clone(&log);
        map.add_on_camera_move_started_listener(move |reason| {
            push(&l, LogEntry::MoveStarted { reason });
        })?;
        let l = Arc::clone(&log);
        map.add_on_camera_move_listener(move || push(&l, LogEntry::Move))?;
        let l = Arc::clone(&log);
        map.add_on_camera_move_cancel_listener(move || push(&l, LogEntry::MoveCanceled))?;
        let l = Arc::clone(&log);
        map.add_on_camera_idle_listener(move || push(&l, LogEntry::Idle))?;
        let l = Arc::clone(&log);
        map.add_on_developer_animation_listener(move || push(&l, LogEntry::DeveloperAnimation))?;
        let l = Arc::clone(&log);
        map.add_on_did_finish_loading_style_listener(move |style: &Style| {
            push(
                &l,
                LogEntry::StyleLoaded {
                    generation: style.generation(),
                },
            );
        })?;
        let l = Arc::clone(&log);
        map.add_on_did_fail_loading_style_listener(move |error: &str| {
            push(
                &l,
                LogEntry::StyleFailed {
                    error: error.to_string(),
                },
            );
        })?;
        let counter = Arc::clone(&frames);
        map.add_on_frame_rendered_listener(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        })?;

        Ok(Self {
            map,
            log,
            frames,
            options,
            default_duration: config.default_animation_duration(),
        })
    }

    /// The camera being driven.
    #[must_use]
    pub const fn map(&self) -> &MapCamera<HeadlessEngine> {
        &self.map
    }

    /// Run every step and return the log, ending with a
    /// [`LogEntry::Finished`] summary.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ReplayError::Camera`] for any camera error other than
    /// a rejected argument, which is logged as [`LogEntry::Rejected`].
    pub async fn run(&mut self, scenario: &Scenario) -> ReplayResult<Vec<LogEntry>> {
        tracing::info!(
            name = scenario.name.as_deref().unwrap_or("unnamed"),
            steps = scenario.steps.len(),
            "Replaying scenario"
        );
        for (index, step) in scenario.steps.iter().enumerate() {
            tracing::debug!(index, op = step.name(), "Applying step");
            let result = match step {
                Step::Frames { count } => self.render(*count).await,
                other => self.apply(index, other),
            };
            match result {
                Ok(()) => {}
                Err(e) if e.is_usage_error() => {
                    tracing::warn!(index, op = step.name(), "Step rejected: {}", e);
                    push(
                        &self.log,
                        LogEntry::Rejected {
                            step: index,
                            op: step.name(),
                            error: e.to_string(),
                        },
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        let position = if self.map.is_destroyed() {
            CameraPosition::default()
        } else {
            self.map.camera_position()?
        };
        push(
            &self.log,
            LogEntry::Finished {
                frames: self.frames.load(Ordering::Relaxed),
                position,
                violations: self.map.diagnostics().violations().to_vec(),
            },
        );
        let entries = std::mem::take(&mut *self.log.lock().unwrap_or_else(PoisonError::into_inner));
        Ok(entries)
    }

    async fn render(&mut self, count: u32) -> CameraResult<()> {
        for _ in 0..count {
            self.map.render_frame(self.options.frame)?;
            if self.options.realtime {
                tokio::time::sleep(self.options.frame).await;
            }
        }
        Ok(())
    }

    fn apply(&mut self, index: usize, step: &Step) -> CameraResult<()> {
        match step {
            Step::Move {
                update,
                cancel_prior,
                gesture,
            } => {
                if *gesture {
                    self.map.gesture_move(update)
                } else {
                    let callback = self.transition_callback(index);
                    self.map.move_camera_with(update, *cancel_prior, Some(callback))
                }
            }
            Step::Ease {
                update,
                duration_ms,
                interpolation,
                cancel_prior,
                reason,
            } => {
                let request = self
                    .request(index, update.clone(), *duration_ms, *reason)
                    .with_interpolation(*interpolation)
                    .with_cancels_prior_transition(*cancel_prior);
                self.map.ease_camera(request)
            }
            Step::Animate {
                update,
                duration_ms,
                reason,
            } => {
                let request = self.request(index, update.clone(), *duration_ms, *reason);
                self.map.animate_camera(request)
            }
            Step::Cancel => self.map.cancel_transitions(),
            Step::SetPadding {
                left,
                top,
                right,
                bottom,
            } => self.map.set_padding(*left, *top, *right, *bottom),
            Step::SetStyle { source } => {
                let callback = self.style_callback(index);
                self.map.set_style(source.clone(), Some(callback))
            }
            Step::GetStyle => {
                let callback = self.style_callback(index);
                self.map.get_style_async(callback).map(|_| ())
            }
            Step::FailNextStyle { reason } => self.map.fail_next_style_load(reason.clone()),
            Step::Resize { width, height } => self.map.resize_view(*width, *height),
            Step::Destroy => self.map.destroy(),
            Step::Frames { .. } => Ok(()),
        }
    }

    fn request(
        &self,
        index: usize,
        update: CameraUpdate,
        duration_ms: Option<u64>,
        reason: Option<MoveReason>,
    ) -> AnimationRequest {
        let duration = duration_ms.map_or(self.default_duration, Duration::from_millis);
        let log = Arc::clone(&self.log);
        AnimationRequest::new(update, duration)
            .with_reason(reason.unwrap_or(MoveReason::ApiAnimation))
            .with_callback(move |outcome| {
                push(
                    &log,
                    LogEntry::TransitionEnded {
                        step: index,
                        outcome,
                    },
                );
            })
    }

    fn transition_callback(&self, index: usize) -> TransitionCallback {
        let log = Arc::clone(&self.log);
        Box::new(move |outcome| {
            push(
                &log,
                LogEntry::TransitionEnded {
                    step: index,
                    outcome,
                },
            );
        })
    }

    fn style_callback(&self, index: usize) -> StyleCallback {
        let log = Arc::clone(&self.log);
        Box::new(move |style: &Style| {
            push(
                &log,
                LogEntry::StyleReady {
                    step: index,
                    generation: style.generation(),
                },
            );
        })
    }
}
