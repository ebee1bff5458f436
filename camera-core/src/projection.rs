//! Web Mercator projection helpers used to resolve relative camera updates.
//!
//! World coordinates are normalised to `[0, 1]` on both axes, origin at the
//! north-west corner; one world spans `TILE_SIZE * 2^zoom` pixels.

use std::f64::consts::PI;

use crate::geo::{EdgeInsets, LatLng, LatLngBounds, ScreenPoint, Size, MAX_MERCATOR_LATITUDE};

/// Size of one tile in logical pixels.
pub const TILE_SIZE: f64 = 512.0;

/// A point in normalised Mercator space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MercatorPoint {
    /// Horizontal position, 0 at -180° and 1 at +180°.
    pub x: f64,
    /// Vertical position, 0 at the northern limit and 1 at the southern limit.
    pub y: f64,
}

impl MercatorPoint {
    /// Project a geographic coordinate.
    #[must_use]
    pub fn from_lat_lng(point: LatLng) -> Self {
        let lat = point
            .latitude
            .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE)
            .to_radians();
        Self {
            x: (point.longitude + 180.0) / 360.0,
            y: (1.0 - (PI / 4.0 + lat / 2.0).tan().ln() / PI) / 2.0,
        }
    }

    /// Unproject back to a geographic coordinate.
    #[must_use]
    pub fn to_lat_lng(self) -> LatLng {
        let lat = (PI * (1.0 - 2.0 * self.y)).sinh().atan().to_degrees();
        LatLng::new(lat, self.x * 360.0 - 180.0)
    }

    /// Offset by a world-pixel delta at the given zoom.
    #[must_use]
    pub fn offset_by_pixels(self, delta: ScreenPoint, zoom: f64) -> Self {
        let world = world_size(zoom);
        Self {
            x: self.x + delta.x / world,
            y: self.y + delta.y / world,
        }
    }
}

/// Width of the world in pixels at `zoom`.
#[must_use]
pub fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * zoom.exp2()
}

/// Rotate a screen-space offset into world orientation for a map bearing.
#[must_use]
pub fn rotate_to_world(offset: ScreenPoint, bearing_degrees: f64) -> ScreenPoint {
    let (sin, cos) = bearing_degrees.to_radians().sin_cos();
    ScreenPoint::new(
        offset.x * cos - offset.y * sin,
        offset.x * sin + offset.y * cos,
    )
}

/// New centre after shifting the view by `delta` screen pixels.
#[must_use]
pub fn scroll_center(center: LatLng, zoom: f64, bearing: f64, delta: ScreenPoint) -> LatLng {
    MercatorPoint::from_lat_lng(center)
        .offset_by_pixels(rotate_to_world(delta, bearing), zoom)
        .to_lat_lng()
        .wrapped()
}

/// New centre after zooming by `delta` levels while keeping `focal` fixed on screen.
///
/// Without a focal point the centre is unchanged.
#[must_use]
pub fn zoom_center(
    center: LatLng,
    zoom: f64,
    bearing: f64,
    delta: f64,
    focal: Option<ScreenPoint>,
    viewport: Size,
    padding: EdgeInsets,
) -> LatLng {
    let Some(focal) = focal else {
        return center;
    };
    let frame = viewport.center();
    let shift = padding.center_offset();
    let offset = rotate_to_world(
        ScreenPoint::new(focal.x - frame.x - shift.x, focal.y - frame.y - shift.y),
        bearing,
    );
    let anchor = MercatorPoint::from_lat_lng(center).offset_by_pixels(offset, zoom);
    anchor
        .offset_by_pixels(ScreenPoint::new(-offset.x, -offset.y), zoom + delta)
        .to_lat_lng()
        .wrapped()
}

/// Centre and zoom that fit `bounds` inside the padded viewport at `bearing`.
///
/// Returns `None` when the padding leaves no room to fit anything.
#[must_use]
pub fn fit_bounds(
    bounds: &LatLngBounds,
    padding: EdgeInsets,
    viewport: Size,
    bearing: f64,
    max_zoom: f64,
) -> Option<(LatLng, f64)> {
    let available_w = f64::from(viewport.width) - padding.left - padding.right;
    let available_h = f64::from(viewport.height) - padding.top - padding.bottom;
    if available_w <= 0.0 || available_h <= 0.0 {
        return None;
    }

    let sw = MercatorPoint::from_lat_lng(bounds.south_west);
    let ne = MercatorPoint::from_lat_lng(bounds.north_east);
    let center = MercatorPoint {
        x: (sw.x + ne.x) / 2.0,
        y: (sw.y + ne.y) / 2.0,
    }
    .to_lat_lng();

    let (sin, cos) = bearing.to_radians().sin_cos();
    let w = (ne.x - sw.x).abs();
    let h = (sw.y - ne.y).abs();
    let rotated_w = (w * cos).abs() + (h * sin).abs();
    let rotated_h = (w * sin).abs() + (h * cos).abs();
    if rotated_w <= f64::EPSILON && rotated_h <= f64::EPSILON {
        return Some((center, max_zoom));
    }

    let scale_w = if rotated_w > f64::EPSILON {
        available_w / rotated_w
    } else {
        f64::INFINITY
    };
    let scale_h = if rotated_h > f64::EPSILON {
        available_h / rotated_h
    } else {
        f64::INFINITY
    };
    let zoom = (scale_w.min(scale_h) / TILE_SIZE).log2().min(max_zoom);
    Some((center, zoom))
}
