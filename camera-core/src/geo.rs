//! Geographic and screen-space value types.

use serde::{Deserialize, Serialize};

/// Largest latitude representable in Web Mercator.
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_806_59;

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude in degrees, positive north.
    pub latitude: f64,
    /// Longitude in degrees, positive east.
    pub longitude: f64,
}

impl LatLng {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Return a copy with the longitude wrapped into `[-180, 180)`.
    #[must_use]
    pub fn wrapped(self) -> Self {
        Self {
            latitude: self.latitude,
            longitude: wrap(self.longitude, -180.0, 180.0),
        }
    }

    /// Whether both components are finite numbers.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Approximate equality with an absolute tolerance in degrees.
    #[must_use]
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        (self.latitude - other.latitude).abs() <= tolerance
            && (self.longitude - other.longitude).abs() <= tolerance
    }
}

/// A geographic rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
    /// South-west corner.
    pub south_west: LatLng,
    /// North-east corner.
    pub north_east: LatLng,
}

impl LatLngBounds {
    /// Create bounds from any two opposite corners.
    #[must_use]
    pub fn from_corners(a: LatLng, b: LatLng) -> Self {
        Self {
            south_west: LatLng::new(a.latitude.min(b.latitude), a.longitude.min(b.longitude)),
            north_east: LatLng::new(a.latitude.max(b.latitude), a.longitude.max(b.longitude)),
        }
    }

    /// Whether the point lies within the bounds (edges inclusive).
    #[must_use]
    pub fn contains(&self, point: LatLng) -> bool {
        point.latitude >= self.south_west.latitude
            && point.latitude <= self.north_east.latitude
            && point.longitude >= self.south_west.longitude
            && point.longitude <= self.north_east.longitude
    }

    /// The point inside the bounds closest to `point`, per axis.
    #[must_use]
    pub fn clamp(&self, point: LatLng) -> LatLng {
        LatLng::new(
            point
                .latitude
                .max(self.south_west.latitude)
                .min(self.north_east.latitude),
            point
                .longitude
                .max(self.south_west.longitude)
                .min(self.north_east.longitude),
        )
    }

    /// Whether both corners are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.south_west.is_finite() && self.north_east.is_finite()
    }
}

/// Insets from each edge of the viewport, in logical pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeInsets {
    /// Left inset.
    pub left: f64,
    /// Top inset.
    pub top: f64,
    /// Right inset.
    pub right: f64,
    /// Bottom inset.
    pub bottom: f64,
}

impl EdgeInsets {
    /// No insets.
    pub const ZERO: Self = Self {
        left: 0.0,
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
    };

    /// Create insets in left, top, right, bottom order.
    #[must_use]
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// The insets as a `[left, top, right, bottom]` array.
    #[must_use]
    pub const fn to_array(self) -> [f64; 4] {
        [self.left, self.top, self.right, self.bottom]
    }

    /// Offset of the padded frame's centre from the viewport centre.
    #[must_use]
    pub fn center_offset(&self) -> ScreenPoint {
        ScreenPoint::new(
            (self.left - self.right) / 2.0,
            (self.top - self.bottom) / 2.0,
        )
    }

    /// Linear interpolation towards `other`.
    #[must_use]
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        Self {
            left: lerp(self.left, other.left, t),
            top: lerp(self.top, other.top, t),
            right: lerp(self.right, other.right, t),
            bottom: lerp(self.bottom, other.bottom, t),
        }
    }
}

impl From<[f64; 4]> for EdgeInsets {
    fn from(values: [f64; 4]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }
}

/// A point in screen space, origin at the top-left of the viewport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    /// Horizontal position in logical pixels.
    pub x: f64,
    /// Vertical position in logical pixels.
    pub y: f64,
}

impl ScreenPoint {
    /// Create a new screen point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Viewport dimensions in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    /// Create a new size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Centre of the viewport.
    #[must_use]
    pub fn center(&self) -> ScreenPoint {
        ScreenPoint::new(f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }

    /// Whether either dimension is zero.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

/// Wrap `value` into the half-open range `[min, max)`.
#[must_use]
pub fn wrap(value: f64, min: f64, max: f64) -> f64 {
    let d = max - min;
    let w = ((value - min) % d + d) % d + min;
    if w >= max {
        min
    } else {
        w
    }
}

/// Linear interpolation between two scalars.
#[must_use]
pub fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}
