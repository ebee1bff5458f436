//! Immutable camera snapshots.

use serde::{Deserialize, Serialize};

use crate::geo::{EdgeInsets, LatLng};

/// Tolerance used when comparing camera positions.
pub const POSITION_EPSILON: f64 = 1e-9;

/// A snapshot of the camera's viewpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPosition {
    /// Coordinate at the centre of the padded frame.
    pub target: LatLng,
    /// Zero-based zoom level.
    pub zoom: f64,
    /// Bearing in degrees clockwise from north, in `[0, 360)`.
    pub bearing: f64,
    /// Pitch towards the horizon in degrees.
    pub tilt: f64,
    /// Padding that offsets the frame of reference for `target`.
    #[serde(default)]
    pub padding: EdgeInsets,
}

impl CameraPosition {
    /// Create a north-up, untilted position.
    #[must_use]
    pub const fn new(target: LatLng, zoom: f64) -> Self {
        Self {
            target,
            zoom,
            bearing: 0.0,
            tilt: 0.0,
            padding: EdgeInsets::ZERO,
        }
    }

    /// Set the bearing, normalised into `[0, 360)`.
    #[must_use]
    pub fn with_bearing(mut self, bearing: f64) -> Self {
        self.bearing = normalize_bearing(bearing);
        self
    }

    /// Set the tilt.
    #[must_use]
    pub const fn with_tilt(mut self, tilt: f64) -> Self {
        self.tilt = tilt;
        self
    }

    /// Set the padding.
    #[must_use]
    pub const fn with_padding(mut self, padding: EdgeInsets) -> Self {
        self.padding = padding;
        self
    }

    /// Whether every numeric field is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.target.is_finite()
            && self.zoom.is_finite()
            && self.bearing.is_finite()
            && self.tilt.is_finite()
            && self.padding.to_array().iter().all(|v| v.is_finite())
    }

    /// Equality within `tolerance` on every field.
    #[must_use]
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        let bearing_delta = (self.bearing - other.bearing).abs();
        self.target.approx_eq(&other.target, tolerance)
            && (self.zoom - other.zoom).abs() <= tolerance
            && bearing_delta.min(360.0 - bearing_delta) <= tolerance
            && (self.tilt - other.tilt).abs() <= tolerance
            && self
                .padding
                .to_array()
                .iter()
                .zip(other.padding.to_array())
                .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

impl Default for CameraPosition {
    fn default() -> Self {
        Self::new(LatLng::default(), 0.0)
    }
}

/// Normalise a bearing into `[0, 360)`.
#[must_use]
pub fn normalize_bearing(bearing: f64) -> f64 {
    let wrapped = bearing.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_builder_normalizes_bearing() {
        let position = CameraPosition::new(LatLng::new(1.0, 2.0), 5.0).with_bearing(-90.0);
        assert!((position.bearing - 270.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_approx_eq_wraps_bearing() {
        let a = CameraPosition::new(LatLng::default(), 1.0).with_bearing(359.999_999_999_9);
        let b = CameraPosition::new(LatLng::default(), 1.0).with_bearing(0.0);
        assert!(a.approx_eq(&b, 1e-6));
    }

    #[test]
    fn test_serde_defaults_padding() {
        let json = r#"{"target":{"latitude":1.0,"longitude":2.0},"zoom":3.0,"bearing":0.0,"tilt":0.0}"#;
        let position: CameraPosition = serde_json::from_str(json).expect("parse");
        assert_eq!(position.padding, EdgeInsets::ZERO);
    }

    proptest! {
        #[test]
        fn prop_normalized_bearing_in_range(bearing in -1.0e6f64..1.0e6) {
            let normalized = normalize_bearing(bearing);
            prop_assert!((0.0..360.0).contains(&normalized));
        }
    }
}
