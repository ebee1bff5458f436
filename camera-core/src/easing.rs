//! Timing curves for eased camera transitions.

use serde::{Deserialize, Serialize};

/// Easing selection for [`crate::MapEngine::ease_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Easing {
    /// Constant velocity.
    Linear,
    /// Default ease-out curve.
    #[default]
    Eased,
}

impl Easing {
    /// The cubic bezier implementing this easing.
    #[must_use]
    pub const fn curve(self) -> UnitBezier {
        match self {
            Self::Linear => UnitBezier::LINEAR,
            Self::Eased => UnitBezier::DEFAULT_EASE,
        }
    }
}

/// A cubic bezier timing curve through `(0, 0)` and `(1, 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitBezier {
    cx: f64,
    bx: f64,
    ax: f64,
    cy: f64,
    by: f64,
    ay: f64,
}

impl UnitBezier {
    /// Identity timing.
    pub const LINEAR: Self = Self::new(0.0, 0.0, 1.0, 1.0);

    /// Default ease used by camera transitions.
    pub const DEFAULT_EASE: Self = Self::new(0.0, 0.0, 0.25, 1.0);

    /// Create a curve from its two control points.
    #[must_use]
    pub const fn new(p1x: f64, p1y: f64, p2x: f64, p2y: f64) -> Self {
        let cx = 3.0 * p1x;
        let bx = 3.0 * (p2x - p1x) - cx;
        let ax = 1.0 - cx - bx;
        let cy = 3.0 * p1y;
        let by = 3.0 * (p2y - p1y) - cy;
        let ay = 1.0 - cy - by;
        Self {
            cx,
            bx,
            ax,
            cy,
            by,
            ay,
        }
    }

    fn sample_x(&self, t: f64) -> f64 {
        ((self.ax * t + self.bx) * t + self.cx) * t
    }

    fn sample_y(&self, t: f64) -> f64 {
        ((self.ay * t + self.by) * t + self.cy) * t
    }

    fn sample_derivative_x(&self, t: f64) -> f64 {
        (3.0 * self.ax * t + 2.0 * self.bx) * t + self.cx
    }

    /// Parametric `t` for a given `x`, Newton first and bisection as fallback.
    fn solve_x(&self, x: f64, epsilon: f64) -> f64 {
        let mut t = x;
        for _ in 0..8 {
            let err = self.sample_x(t) - x;
            if err.abs() < epsilon {
                return t;
            }
            let d = self.sample_derivative_x(t);
            if d.abs() < 1e-6 {
                break;
            }
            t -= err / d;
        }

        let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
        t = x.clamp(lo, hi);
        while lo < hi {
            let v = self.sample_x(t);
            if (v - x).abs() < epsilon {
                return t;
            }
            if x > v {
                lo = t;
            } else {
                hi = t;
            }
            if hi - lo < epsilon {
                break;
            }
            t = (hi - lo) / 2.0 + lo;
        }
        t
    }

    /// Eased progress for linear progress `x` in `[0, 1]`.
    #[must_use]
    pub fn solve(&self, x: f64, epsilon: f64) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        if x >= 1.0 {
            return 1.0;
        }
        self.sample_y(self.solve_x(x, epsilon))
    }
}
