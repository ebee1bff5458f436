//! Camera configuration and bounds.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::geo::{LatLng, LatLngBounds, Size};
use crate::position::{normalize_bearing, CameraPosition};
use crate::{CameraError, CameraResult};

/// Lowest zoom level any camera may reach.
pub const ABSOLUTE_MIN_ZOOM: f64 = 0.0;

/// Highest zoom level any camera may reach.
pub const ABSOLUTE_MAX_ZOOM: f64 = 25.5;

/// Lowest pitch any camera may reach, in degrees.
pub const ABSOLUTE_MIN_PITCH: f64 = 0.0;

/// Highest pitch any camera may reach, in degrees.
pub const ABSOLUTE_MAX_PITCH: f64 = 60.0;

/// Duration used when a caller does not supply one.
pub const DEFAULT_ANIMATION_DURATION_MS: u64 = 300;

/// Largest viewport dimension accepted by [`crate::MapCamera::resize_view`].
pub const MAX_VIEWPORT_DIMENSION: u32 = 65_535;

/// Zoom, pitch and target-bounds preferences applied to every camera target.
///
/// Each value is clamped to its absolute range when set. Ordering between a
/// minimum and its maximum is left to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraLimits {
    min_zoom: f64,
    max_zoom: f64,
    min_pitch: f64,
    max_pitch: f64,
    #[serde(default)]
    target_bounds: Option<LatLngBounds>,
}

impl Default for CameraLimits {
    fn default() -> Self {
        Self {
            min_zoom: ABSOLUTE_MIN_ZOOM,
            max_zoom: ABSOLUTE_MAX_ZOOM,
            min_pitch: ABSOLUTE_MIN_PITCH,
            max_pitch: ABSOLUTE_MAX_PITCH,
            target_bounds: None,
        }
    }
}

impl CameraLimits {
    /// Minimum zoom preference.
    #[must_use]
    pub const fn min_zoom(&self) -> f64 {
        self.min_zoom
    }

    /// Maximum zoom preference.
    #[must_use]
    pub const fn max_zoom(&self) -> f64 {
        self.max_zoom
    }

    /// Minimum pitch preference.
    #[must_use]
    pub const fn min_pitch(&self) -> f64 {
        self.min_pitch
    }

    /// Maximum pitch preference.
    #[must_use]
    pub const fn max_pitch(&self) -> f64 {
        self.max_pitch
    }

    /// Set the minimum zoom, clamped to the absolute zoom range.
    pub fn set_min_zoom(&mut self, zoom: f64) {
        self.min_zoom = clamp_logged("min_zoom", zoom, ABSOLUTE_MIN_ZOOM, ABSOLUTE_MAX_ZOOM);
    }

    /// Set the maximum zoom, clamped to the absolute zoom range.
    pub fn set_max_zoom(&mut self, zoom: f64) {
        self.max_zoom = clamp_logged("max_zoom", zoom, ABSOLUTE_MIN_ZOOM, ABSOLUTE_MAX_ZOOM);
    }

    /// Set the minimum pitch, clamped to the absolute pitch range.
    pub fn set_min_pitch(&mut self, pitch: f64) {
        self.min_pitch = clamp_logged("min_pitch", pitch, ABSOLUTE_MIN_PITCH, ABSOLUTE_MAX_PITCH);
    }

    /// Set the maximum pitch, clamped to the absolute pitch range.
    pub fn set_max_pitch(&mut self, pitch: f64) {
        self.max_pitch = clamp_logged("max_pitch", pitch, ABSOLUTE_MIN_PITCH, ABSOLUTE_MAX_PITCH);
    }

    /// Bounds the camera target is kept within, if any.
    #[must_use]
    pub const fn target_bounds(&self) -> Option<LatLngBounds> {
        self.target_bounds
    }

    /// Restrict the camera target to `bounds`; `None` lifts the restriction.
    /// Bounds with a non-finite corner are ignored.
    pub fn set_target_bounds(&mut self, bounds: Option<LatLngBounds>) {
        match bounds {
            Some(b) if !b.is_finite() => {
                tracing::warn!(?b, "Ignoring non-finite camera target bounds");
            }
            _ => self.target_bounds = bounds,
        }
    }

    /// Bring a position within the configured bounds.
    ///
    /// When a minimum exceeds its maximum the maximum wins.
    #[must_use]
    pub fn constrain(&self, position: &CameraPosition) -> CameraPosition {
        let mut target = LatLng::new(
            position.target.latitude.max(-90.0).min(90.0),
            position.target.longitude,
        )
        .wrapped();
        if let Some(bounds) = &self.target_bounds {
            target = bounds.clamp(target);
        }
        CameraPosition {
            target,
            zoom: position.zoom.max(self.min_zoom).min(self.max_zoom),
            bearing: normalize_bearing(position.bearing),
            tilt: position.tilt.max(self.min_pitch).min(self.max_pitch),
            padding: position.padding,
        }
    }
}

fn clamp_logged(name: &str, value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        tracing::warn!("Ignoring NaN {name}, using {min}");
        return min;
    }
    let clamped = value.max(min).min(max);
    if (clamped - value).abs() > f64::EPSILON {
        tracing::warn!("{name} {value} outside [{min}, {max}], clamped to {clamped}");
    }
    clamped
}

/// Construction-time configuration for a [`crate::MapCamera`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Initial minimum zoom preference.
    pub min_zoom: f64,
    /// Initial maximum zoom preference.
    pub max_zoom: f64,
    /// Initial minimum pitch preference.
    pub min_pitch: f64,
    /// Initial maximum pitch preference.
    pub max_pitch: f64,
    /// Duration for transitions requested without one.
    pub default_animation_duration_ms: u64,
    /// Initial viewport width in logical pixels.
    pub viewport_width: u32,
    /// Initial viewport height in logical pixels.
    pub viewport_height: u32,
    /// Turn invariant violations into hard errors.
    pub strict_mode: bool,
    /// Initial bounds for the camera target.
    pub target_bounds: Option<LatLngBounds>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            min_zoom: ABSOLUTE_MIN_ZOOM,
            max_zoom: ABSOLUTE_MAX_ZOOM,
            min_pitch: ABSOLUTE_MIN_PITCH,
            max_pitch: ABSOLUTE_MAX_PITCH,
            default_animation_duration_ms: DEFAULT_ANIMATION_DURATION_MS,
            viewport_width: Size::default().width,
            viewport_height: Size::default().height,
            strict_mode: false,
            target_bounds: None,
        }
    }
}

impl CameraConfig {
    /// Parse and validate a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or fails validation.
    pub fn from_json_str(json: &str) -> CameraResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or fails validation.
    pub fn from_path(path: impl AsRef<Path>) -> CameraResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&contents)
    }

    /// Check that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`CameraError::Config`] describing the first rejected field.
    pub fn validate(&self) -> CameraResult<()> {
        for (name, value) in [
            ("min_zoom", self.min_zoom),
            ("max_zoom", self.max_zoom),
            ("min_pitch", self.min_pitch),
            ("max_pitch", self.max_pitch),
        ] {
            if !value.is_finite() {
                return Err(CameraError::Config(format!("{name} must be finite")));
            }
        }
        if self.default_animation_duration_ms == 0 {
            return Err(CameraError::Config(
                "default_animation_duration_ms must be strictly positive".into(),
            ));
        }
        if self.target_bounds.is_some_and(|b| !b.is_finite()) {
            return Err(CameraError::Config("target_bounds must be finite".into()));
        }
        if self.viewport_width == 0 || self.viewport_height == 0 {
            return Err(CameraError::Config("viewport must not be empty".into()));
        }
        Ok(())
    }

    /// Limits derived from the configured preferences.
    #[must_use]
    pub fn limits(&self) -> CameraLimits {
        let mut limits = CameraLimits::default();
        limits.set_min_zoom(self.min_zoom);
        limits.set_max_zoom(self.max_zoom);
        limits.set_min_pitch(self.min_pitch);
        limits.set_max_pitch(self.max_pitch);
        limits.set_target_bounds(self.target_bounds);
        limits
    }

    /// Initial viewport.
    #[must_use]
    pub const fn viewport(&self) -> Size {
        Size::new(self.viewport_width, self.viewport_height)
    }

    /// Default transition duration.
    #[must_use]
    pub const fn default_animation_duration(&self) -> Duration {
        Duration::from_millis(self.default_animation_duration_ms)
    }
}
