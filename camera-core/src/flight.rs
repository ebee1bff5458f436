//! Optimal zoom-and-pan flight path (van Wijk & Nuij, "Smooth and efficient
//! zooming and panning").
//!
//! The camera zooms out while it travels and zooms back in on arrival, so
//! long hops read as continuous motion instead of a blur of tiles.

/// Curvature of the flight; higher values zoom out further.
pub const DEFAULT_CURVE: f64 = 1.42;

/// Precomputed flight between two camera frames.
#[derive(Debug, Clone, Copy)]
pub struct FlightPath {
    rho: f64,
    w0: f64,
    u1: f64,
    r0: f64,
    length: f64,
    is_close: bool,
    zooming_in: bool,
    start_zoom: f64,
}

impl FlightPath {
    /// Plan a flight.
    ///
    /// `distance_px` is the distance between start and end centres measured
    /// in world pixels at `start_zoom`; `viewport_px` is the larger viewport
    /// dimension.
    #[must_use]
    pub fn new(start_zoom: f64, end_zoom: f64, distance_px: f64, viewport_px: f64) -> Self {
        let rho = DEFAULT_CURVE;
        let rho2 = rho * rho;
        let w0 = viewport_px.max(1.0);
        let w1 = w0 / (end_zoom - start_zoom).exp2();
        let u1 = distance_px;

        let r = |end: bool| {
            let b = (w1 * w1 - w0 * w0 + if end { -1.0 } else { 1.0 } * rho2 * rho2 * u1 * u1)
                / (2.0 * if end { w1 } else { w0 } * rho2 * u1);
            ((b * b + 1.0).sqrt() - b).ln()
        };

        let r0 = if u1 == 0.0 { f64::INFINITY } else { r(false) };
        let r1 = if u1 == 0.0 { f64::INFINITY } else { r(true) };
        let is_close = u1.abs() < 1e-6 || !r0.is_finite() || !r1.is_finite();
        let length = if is_close {
            (w1 / w0).ln().abs() / rho
        } else {
            (r1 - r0) / rho
        };

        Self {
            rho,
            w0,
            u1,
            r0,
            length,
            is_close,
            zooming_in: w1 < w0,
            start_zoom,
        }
    }

    /// Path length in the flight's own units.
    #[must_use]
    pub const fn length(&self) -> f64 {
        self.length
    }

    /// Fraction of the horizontal distance covered at progress `k` in `[0, 1]`.
    #[must_use]
    pub fn travelled(&self, k: f64) -> f64 {
        if k >= 1.0 {
            return 1.0;
        }
        if self.is_close {
            return k;
        }
        let s = k * self.length;
        let rho2 = self.rho * self.rho;
        self.w0 * (self.r0.cosh() * (self.r0 + self.rho * s).tanh() - self.r0.sinh()) / rho2 / self.u1
    }

    /// Zoom level at progress `k` in `[0, 1]`.
    #[must_use]
    pub fn zoom_at(&self, k: f64, end_zoom: f64) -> f64 {
        if k >= 1.0 {
            return end_zoom;
        }
        let s = k * self.length;
        let w = if self.is_close {
            (if self.zooming_in { -1.0 } else { 1.0 } * self.rho * s).exp()
        } else {
            self.r0.cosh() / (self.r0 + self.rho * s).cosh()
        };
        self.start_zoom + (1.0 / w).log2()
    }
}
