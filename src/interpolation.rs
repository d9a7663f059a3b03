// One-dimensional interpolation rules used by the cross section tables
use serde::{Deserialize, Serialize};

/// Interpolation rule between two tabulated points.
///
/// The first half of the name is the independent (energy) axis, the second
/// the dependent axis, so `LinLog` is linear in energy and logarithmic in
/// the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Interpolation {
    #[default]
    LinLin,
    LinLog,
    LogLin,
    LogLog,
}

impl Interpolation {
    #[inline]
    pub fn is_log_independent(self) -> bool {
        matches!(self, Interpolation::LogLin | Interpolation::LogLog)
    }

    #[inline]
    pub fn is_log_dependent(self) -> bool {
        matches!(self, Interpolation::LinLog | Interpolation::LogLog)
    }

    /// Interpolate between `(x0, y0)` and `(x1, y1)` at `x`.
    ///
    /// A logarithmic axis falls back to linear when one of its end points is
    /// not positive, which happens in the first bin above a threshold where
    /// the tabulated value is zero.
    #[inline]
    pub fn interpolate(self, x0: f64, x1: f64, y0: f64, y1: f64, x: f64) -> f64 {
        let log_x = self.is_log_independent() && x0 > 0.0;
        let log_y = self.is_log_dependent() && y0 > 0.0 && y1 > 0.0;

        let t = if log_x {
            (x / x0).ln() / (x1 / x0).ln()
        } else {
            (x - x0) / (x1 - x0)
        };

        if log_y {
            y0 * ((y1 / y0).ln() * t).exp()
        } else {
            y0 + t * (y1 - y0)
        }
    }

    /// The point halfway between `x0` and `x1` on this rule's independent axis.
    #[inline]
    pub fn midpoint(self, x0: f64, x1: f64) -> f64 {
        if self.is_log_independent() && x0 > 0.0 {
            (x0 * x1).sqrt()
        } else {
            0.5 * (x0 + x1)
        }
    }
}

/// The fractional position of `x` in `[x0, x1]`, optionally in log space.
#[inline]
pub(crate) fn fraction(x0: f64, x1: f64, x: f64, logarithmic: bool) -> f64 {
    if logarithmic {
        (x / x0).ln() / (x1 / x0).ln()
    } else {
        (x - x0) / (x1 - x0)
    }
}

/// `a + beta * (b - a)`
#[inline(always)]
pub(crate) fn lerp(beta: f64, a: f64, b: f64) -> f64 {
    a + beta * (b - a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_lin_lin() {
        let y = Interpolation::LinLin.interpolate(1.0, 2.0, 10.0, 20.0, 1.5);
        assert_eq!(y, 15.0);
    }

    #[test]
    fn test_log_log_power_law_is_exact() {
        // y = x^-2
        let y = Interpolation::LogLog.interpolate(1.0, 10.0, 1.0, 0.01, 3.0);
        assert_relative_eq!(y, 1.0 / 9.0, max_relative = 1e-12);
    }

    #[test]
    fn test_lin_log_and_log_lin() {
        // lin-log: y = exp(2x)
        let y = Interpolation::LinLog.interpolate(0.0, 2.0, 1.0, 2f64.exp() * 2f64.exp(), 1.0);
        assert_relative_eq!(y, 2f64.exp(), max_relative = 1e-12);
        // log-lin: y = ln(x)
        let y = Interpolation::LogLin.interpolate(1.0, 100.0, 0.0, 100f64.ln(), 10.0);
        assert_relative_eq!(y, 10f64.ln(), max_relative = 1e-12);
    }

    #[test]
    fn test_log_dependent_falls_back_on_zero() {
        let y = Interpolation::LogLog.interpolate(1.0, 4.0, 0.0, 2.0, 2.0);
        assert!(y.is_finite());
        assert!(y > 0.0 && y < 2.0);
    }

    #[test]
    fn test_values_stay_between_end_points() {
        for rule in [
            Interpolation::LinLin,
            Interpolation::LinLog,
            Interpolation::LogLin,
            Interpolation::LogLog,
        ] {
            for i in 1..100 {
                let x = 1e-3 + (20.0 - 1e-3) * i as f64 / 100.0;
                let y = rule.interpolate(1e-3, 20.0, 2.80490e6, 1.30221e4, x);
                assert!(y <= 2.80490e6 && y >= 1.30221e4, "{:?} gave {}", rule, y);
            }
        }
    }

    #[test]
    fn test_midpoint() {
        assert_eq!(Interpolation::LinLin.midpoint(1.0, 3.0), 2.0);
        assert_relative_eq!(Interpolation::LogLog.midpoint(1.0, 100.0), 10.0);
    }
}
