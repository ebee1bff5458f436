//! Camera update requests and their resolution against the current camera.

use serde::{Deserialize, Serialize};

use crate::geo::{EdgeInsets, LatLng, LatLngBounds, ScreenPoint, Size};
use crate::position::{normalize_bearing, CameraPosition};
use crate::projection;

/// A requested change to the camera, consumed once per invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CameraUpdate {
    /// Move to an exact position, including its padding.
    SetPosition {
        /// Target position.
        position: CameraPosition,
    },
    /// Centre on a coordinate at a zoom level, keeping bearing and tilt.
    LatLngZoom {
        /// New centre.
        target: LatLng,
        /// New zoom level.
        zoom: f64,
    },
    /// Shift the centre of view by a number of screen pixels.
    ScrollBy {
        /// Horizontal shift, positive to the right.
        dx: f64,
        /// Vertical shift, positive downwards.
        dy: f64,
    },
    /// Change zoom by `delta`, optionally keeping a screen point fixed.
    ZoomBy {
        /// Zoom levels to add (negative zooms out).
        delta: f64,
        /// Screen point that stays put while zooming.
        #[serde(default)]
        focal_point: Option<ScreenPoint>,
    },
    /// Set an absolute zoom level.
    ZoomTo {
        /// New zoom level.
        zoom: f64,
    },
    /// Rotate the map by a number of degrees.
    RotateBy {
        /// Degrees to add to the bearing.
        degrees: f64,
    },
    /// Set an absolute bearing.
    BearingTo {
        /// New bearing in degrees.
        bearing: f64,
    },
    /// Set an absolute tilt.
    TiltTo {
        /// New tilt in degrees.
        tilt: f64,
    },
    /// Fit a geographic rectangle inside the padded viewport.
    Bounds {
        /// Rectangle to show.
        bounds: LatLngBounds,
        /// Padding around the rectangle.
        #[serde(default)]
        padding: EdgeInsets,
    },
    /// Apply new padding without moving the target.
    PaddingTo {
        /// New padding.
        padding: EdgeInsets,
    },
}

/// A [`CameraUpdate`] resolved into an absolute target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedUpdate {
    /// Absolute target; its padding is the current padding until a padding
    /// source is chosen.
    pub target: CameraPosition,
    /// Padding the update itself carries, if any.
    pub explicit_padding: Option<EdgeInsets>,
}

impl CameraUpdate {
    /// Build a [`CameraUpdate::SetPosition`].
    #[must_use]
    pub const fn position(position: CameraPosition) -> Self {
        Self::SetPosition { position }
    }

    /// Build a [`CameraUpdate::LatLngZoom`].
    #[must_use]
    pub const fn lat_lng_zoom(target: LatLng, zoom: f64) -> Self {
        Self::LatLngZoom { target, zoom }
    }

    /// Build a [`CameraUpdate::ScrollBy`].
    #[must_use]
    pub const fn scroll_by(dx: f64, dy: f64) -> Self {
        Self::ScrollBy { dx, dy }
    }

    /// Build a [`CameraUpdate::ZoomBy`] around the frame centre.
    #[must_use]
    pub const fn zoom_by(delta: f64) -> Self {
        Self::ZoomBy {
            delta,
            focal_point: None,
        }
    }

    /// Build a [`CameraUpdate::RotateBy`].
    #[must_use]
    pub const fn rotate_by(degrees: f64) -> Self {
        Self::RotateBy { degrees }
    }

    /// Build a [`CameraUpdate::Bounds`].
    #[must_use]
    pub const fn bounds(bounds: LatLngBounds, padding: EdgeInsets) -> Self {
        Self::Bounds { bounds, padding }
    }

    /// Resolve against the current camera and viewport.
    ///
    /// Returns `None` when the update cannot produce a finite target (for
    /// example bounds that do not fit the padded viewport).
    #[must_use]
    pub fn resolve(
        &self,
        current: &CameraPosition,
        viewport: Size,
        max_zoom: f64,
    ) -> Option<ResolvedUpdate> {
        let mut target = *current;
        let mut explicit_padding = None;

        match *self {
            Self::SetPosition { position } => {
                target = position.with_bearing(position.bearing);
                explicit_padding = Some(position.padding);
            }
            Self::LatLngZoom { target: center, zoom } => {
                target.target = center;
                target.zoom = zoom;
            }
            Self::ScrollBy { dx, dy } => {
                target.target = projection::scroll_center(
                    current.target,
                    current.zoom,
                    current.bearing,
                    ScreenPoint::new(dx, dy),
                );
            }
            Self::ZoomBy { delta, focal_point } => {
                target.target = projection::zoom_center(
                    current.target,
                    current.zoom,
                    current.bearing,
                    delta,
                    focal_point,
                    viewport,
                    current.padding,
                );
                target.zoom = current.zoom + delta;
            }
            Self::ZoomTo { zoom } => target.zoom = zoom,
            Self::RotateBy { degrees } => {
                target.bearing = normalize_bearing(current.bearing + degrees);
            }
            Self::BearingTo { bearing } => target.bearing = normalize_bearing(bearing),
            Self::TiltTo { tilt } => target.tilt = tilt,
            Self::Bounds { bounds, padding } => {
                let (center, zoom) =
                    projection::fit_bounds(&bounds, padding, viewport, current.bearing, max_zoom)?;
                target.target = center;
                target.zoom = zoom;
                explicit_padding = Some(padding);
            }
            Self::PaddingTo { padding } => explicit_padding = Some(padding),
        }

        if let Some(padding) = explicit_padding {
            target.padding = padding;
        }
        target.is_finite().then_some(ResolvedUpdate {
            target,
            explicit_padding,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current() -> CameraPosition {
        CameraPosition::new(LatLng::new(10.0, 20.0), 5.0)
            .with_bearing(30.0)
            .with_tilt(15.0)
            .with_padding(EdgeInsets::new(1.0, 2.0, 3.0, 4.0))
    }

    #[test]
    fn test_set_position_carries_explicit_padding() {
        let position = CameraPosition::new(LatLng::new(1.0, 1.0), 3.0)
            .with_padding(EdgeInsets::new(5.0, 5.0, 5.0, 5.0));
        let resolved = CameraUpdate::position(position)
            .resolve(&current(), Size::default(), 25.5)
            .expect("resolves");
        assert_eq!(resolved.explicit_padding, Some(EdgeInsets::new(5.0, 5.0, 5.0, 5.0)));
        assert_eq!(resolved.target.target, LatLng::new(1.0, 1.0));
    }

    #[test]
    fn test_relative_updates_carry_no_padding() {
        for update in [
            CameraUpdate::scroll_by(10.0, 0.0),
            CameraUpdate::zoom_by(1.0),
            CameraUpdate::rotate_by(10.0),
            CameraUpdate::ZoomTo { zoom: 3.0 },
            CameraUpdate::TiltTo { tilt: 0.0 },
            CameraUpdate::lat_lng_zoom(LatLng::new(0.0, 0.0), 2.0),
        ] {
            let resolved = update
                .resolve(&current(), Size::default(), 25.5)
                .expect("resolves");
            assert!(resolved.explicit_padding.is_none(), "{update:?}");
            assert_eq!(resolved.target.padding, current().padding);
        }
    }

    #[test]
    fn test_rotate_by_normalizes() {
        let resolved = CameraUpdate::rotate_by(350.0)
            .resolve(&current(), Size::default(), 25.5)
            .expect("resolves");
        assert!((resolved.target.bearing - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_by_without_focal_keeps_center() {
        let resolved = CameraUpdate::zoom_by(-2.0)
            .resolve(&current(), Size::default(), 25.5)
            .expect("resolves");
        assert!((resolved.target.zoom - 3.0).abs() < f64::EPSILON);
        assert_eq!(resolved.target.target, current().target);
    }

    #[test]
    fn test_bounds_that_do_not_fit_resolve_to_none() {
        let bounds = LatLngBounds::from_corners(LatLng::new(0.0, 0.0), LatLng::new(1.0, 1.0));
        let update = CameraUpdate::bounds(bounds, EdgeInsets::new(0.0, 400.0, 0.0, 400.0));
        assert!(update.resolve(&current(), Size::default(), 25.5).is_none());
    }

    #[test]
    fn test_update_json_shape() {
        let update: CameraUpdate =
            serde_json::from_str(r#"{"type":"zoom_by","delta":1.5}"#).expect("parse");
        assert_eq!(update, CameraUpdate::zoom_by(1.5));
    }
}
