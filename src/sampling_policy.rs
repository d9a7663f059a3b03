// Interpolation between two tabulated secondary distributions
//
// Each policy answers pdf, cdf and inverse-cdf queries at a primary energy
// strictly between two tabulated primary energies. They hold no state and
// only read the bracketing distributions.

use crate::config::EvaluationTolerances;
use crate::error::{Result, TableError};
use crate::interpolation::{fraction, lerp};
use crate::tabular::TabularDistribution;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SamplingPolicy {
    /// Sample one of the two bracketing distributions, the upper one with
    /// probability `beta`. The pdf and cdf interpolate the two at a fixed
    /// secondary value.
    Stochastic,
    /// Like [`Stochastic`](Self::Stochastic), but the chosen distribution is
    /// sampled in its unit-base variable and mapped through the
    /// interpolated support.
    UnitBase,
    /// Interpolate the secondary values the same random number gives in
    /// both bracketing distributions.
    Correlated,
    /// Correlated sampling in the unit-base (normalised) secondary variable,
    /// mapped back through the interpolated support.
    UnitBaseCorrelated,
    /// Interpolate the cumulative distributions at a fixed secondary value
    /// and invert numerically.
    Exact,
}

/// The two tabulated distributions around a primary energy.
#[derive(Debug, Clone, Copy)]
pub struct Bracket<'a> {
    /// Fractional position of the primary energy between the two.
    pub beta: f64,
    pub lower: &'a TabularDistribution,
    pub upper: &'a TabularDistribution,
    /// Interpolate secondary values in ln(y) instead of y. Only the
    /// correlated and unit-base policies read it; every secondary value
    /// must then be positive.
    pub log_secondary: bool,
}

impl<'a> Bracket<'a> {
    pub fn new(
        lower_energy: f64,
        lower: &'a TabularDistribution,
        upper_energy: f64,
        upper: &'a TabularDistribution,
        primary: f64,
        logarithmic: bool,
    ) -> Self {
        Bracket {
            beta: fraction(lower_energy, upper_energy, primary, logarithmic),
            lower,
            upper,
            log_secondary: false,
        }
    }

    pub fn with_log_secondary(mut self, log_secondary: bool) -> Self {
        self.log_secondary = log_secondary;
        self
    }

    #[inline]
    fn process(&self, y: f64) -> f64 {
        if self.log_secondary {
            y.ln()
        } else {
            y
        }
    }

    #[inline]
    fn unprocess(&self, p: f64) -> f64 {
        if self.log_secondary {
            p.exp()
        } else {
            p
        }
    }

    /// dy/dp at `y`.
    #[inline]
    fn jacobian(&self, y: f64) -> f64 {
        if self.log_secondary {
            y
        } else {
            1.0
        }
    }

    #[inline]
    fn processed_length(&self, dist: &TabularDistribution) -> f64 {
        self.process(dist.upper_bound()) - self.process(dist.lower_bound())
    }

    /// Position of `dist`'s inverse at `u` within its processed support.
    #[inline]
    fn unit_base(&self, dist: &TabularDistribution, u: f64) -> f64 {
        (self.process(dist.sample_with_random_number(u)) - self.process(dist.lower_bound()))
            / self.processed_length(dist)
    }

    /// The value of `dist` at unit-base position `eta`.
    #[inline]
    fn at_unit_base(&self, dist: &TabularDistribution, eta: f64) -> f64 {
        let p = self.process(dist.lower_bound()) + eta * self.processed_length(dist);
        self.unprocess(p).min(dist.upper_bound())
    }

    /// Interpolated processed support `(min, max)`.
    #[inline]
    fn processed_support(&self) -> (f64, f64) {
        (
            lerp(
                self.beta,
                self.process(self.lower.lower_bound()),
                self.process(self.upper.lower_bound()),
            ),
            lerp(
                self.beta,
                self.process(self.lower.upper_bound()),
                self.process(self.upper.upper_bound()),
            ),
        )
    }

    /// Distribution picked by `u` with probability `1 - beta` for the lower
    /// one, and the fraction left over for sampling it.
    #[inline]
    fn choose(&self, u: f64) -> (&'a TabularDistribution, f64) {
        let beta = self.beta;
        if u < beta {
            (self.upper, u / beta)
        } else if beta < 1.0 {
            (self.lower, ((u - beta) / (1.0 - beta)).min(1.0))
        } else {
            (self.upper, u)
        }
    }
}

/// Find `x` in `[lo, hi]` with `f(x) ~= target` for a non-decreasing `f`.
pub(crate) fn bisect<F>(
    f: F,
    target: f64,
    mut lo: f64,
    mut hi: f64,
    tolerances: &EvaluationTolerances,
) -> Result<f64>
where
    F: Fn(f64) -> f64,
{
    for _ in 0..tolerances.max_iterations {
        let mid = 0.5 * (lo + hi);
        if mid <= lo || mid >= hi {
            return Ok(mid);
        }
        let estimate = f(mid);
        if tolerances.accepts(estimate, target) {
            return Ok(mid);
        }
        if estimate < target {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    log::warn!(
        "bisection for {} stopped in [{}, {}] after {} iterations",
        target,
        lo,
        hi,
        tolerances.max_iterations
    );
    Err(TableError::NoConvergence {
        iterations: tolerances.max_iterations,
    })
}

/// Density of a correlated mixture: `1 / ((1 - beta) / f0 + beta / f1)`.
#[inline]
fn harmonic_mix(beta: f64, f0: f64, f1: f64) -> f64 {
    if f0 == f1 {
        return f0;
    }
    let denominator = lerp(beta, f1, f0);
    if denominator <= 0.0 {
        0.0
    } else {
        f0 * f1 / denominator
    }
}

impl SamplingPolicy {
    /// Whether sampling picks one bracketing distribution at random.
    pub fn is_stochastic(self) -> bool {
        matches!(self, SamplingPolicy::Stochastic | SamplingPolicy::UnitBase)
    }

    fn interpolates_support(self) -> bool {
        !matches!(self, SamplingPolicy::Stochastic | SamplingPolicy::Exact)
    }

    pub fn lower_bound(self, bracket: &Bracket) -> f64 {
        if self.interpolates_support() {
            bracket.unprocess(bracket.processed_support().0)
        } else {
            bracket.lower.lower_bound().min(bracket.upper.lower_bound())
        }
    }

    pub fn upper_bound(self, bracket: &Bracket) -> f64 {
        if self.interpolates_support() {
            bracket.unprocess(bracket.processed_support().1)
        } else {
            bracket.lower.upper_bound().max(bracket.upper.upper_bound())
        }
    }

    /// Secondary value for the random number `u` in `[0, 1)`.
    ///
    /// The stochastic policies split `u`: its position below or above `beta`
    /// picks the distribution and the remainder samples it.
    pub fn sample_with_random_number(
        self,
        bracket: &Bracket,
        u: f64,
        tolerances: &EvaluationTolerances,
    ) -> Result<f64> {
        let beta = bracket.beta;
        match self {
            SamplingPolicy::Stochastic => {
                let (dist, rest) = bracket.choose(u);
                Ok(dist.sample_with_random_number(rest))
            }
            SamplingPolicy::UnitBase => {
                let (dist, rest) = bracket.choose(u);
                let eta = bracket.unit_base(dist, rest);
                let (min, max) = bracket.processed_support();
                Ok(bracket.unprocess(min + eta * (max - min)))
            }
            SamplingPolicy::Correlated => {
                let y0 = bracket.lower.sample_with_random_number(u);
                let y1 = bracket.upper.sample_with_random_number(u);
                if y0 == y1 {
                    Ok(y0)
                } else {
                    Ok(bracket.unprocess(lerp(beta, bracket.process(y0), bracket.process(y1))))
                }
            }
            SamplingPolicy::UnitBaseCorrelated => {
                let eta = lerp(
                    beta,
                    bracket.unit_base(bracket.lower, u),
                    bracket.unit_base(bracket.upper, u),
                );
                let (min, max) = bracket.processed_support();
                Ok(bracket.unprocess(min + eta * (max - min)))
            }
            SamplingPolicy::Exact => {
                let min = self.lower_bound(bracket);
                if u <= 0.0 {
                    return Ok(min);
                }
                let cdf = |y: f64| {
                    lerp(
                        beta,
                        bracket.lower.evaluate_cdf(y),
                        bracket.upper.evaluate_cdf(y),
                    )
                };
                bisect(cdf, u, min, self.upper_bound(bracket), tolerances)
            }
        }
    }

    /// The interpolated CDF. For the correlated policies this is the random
    /// number that [`sample_with_random_number`](Self::sample_with_random_number)
    /// maps to `secondary`.
    pub fn evaluate_cdf(
        self,
        bracket: &Bracket,
        secondary: f64,
        tolerances: &EvaluationTolerances,
    ) -> Result<f64> {
        let beta = bracket.beta;
        if !self.interpolates_support() {
            return Ok(lerp(
                beta,
                bracket.lower.evaluate_cdf(secondary),
                bracket.upper.evaluate_cdf(secondary),
            ));
        }

        let min = self.lower_bound(bracket);
        let max = self.upper_bound(bracket);
        if !(secondary > min) {
            return Ok(0.0);
        }
        if secondary >= max {
            return Ok(1.0);
        }
        if let SamplingPolicy::UnitBase = self {
            let eta = unit_base_position(bracket, secondary);
            return Ok(lerp(
                beta,
                bracket.lower.evaluate_cdf(bracket.at_unit_base(bracket.lower, eta)),
                bracket.upper.evaluate_cdf(bracket.at_unit_base(bracket.upper, eta)),
            ));
        }
        self.correlated_random_number(bracket, secondary, tolerances)
    }

    pub fn evaluate_pdf(
        self,
        bracket: &Bracket,
        secondary: f64,
        tolerances: &EvaluationTolerances,
    ) -> Result<f64> {
        let beta = bracket.beta;
        if !self.interpolates_support() {
            return Ok(lerp(
                beta,
                bracket.lower.evaluate_pdf(secondary),
                bracket.upper.evaluate_pdf(secondary),
            ));
        }

        let min = self.lower_bound(bracket);
        let max = self.upper_bound(bracket);
        if !(secondary >= min && secondary <= max) {
            return Ok(0.0);
        }
        let (lower, upper) = (bracket.lower, bracket.upper);
        let (pmin, pmax) = bracket.processed_support();
        let outer = (pmax - pmin) * bracket.jacobian(secondary);

        if let SamplingPolicy::UnitBase = self {
            let eta = if secondary == min {
                0.0
            } else if secondary == max {
                1.0
            } else {
                unit_base_position(bracket, secondary)
            };
            let (y0, y1) = (bracket.at_unit_base(lower, eta), bracket.at_unit_base(upper, eta));
            let p0 = bracket.processed_length(lower) * lower.evaluate_pdf(y0) * bracket.jacobian(y0);
            let p1 = bracket.processed_length(upper) * upper.evaluate_pdf(y1) * bracket.jacobian(y1);
            return Ok(lerp(beta, p0, p1) / outer);
        }

        let u = if secondary == min {
            0.0
        } else if secondary == max {
            1.0
        } else {
            self.correlated_random_number(bracket, secondary, tolerances)?
        };

        let y0 = lower.sample_with_random_number(u);
        let y1 = upper.sample_with_random_number(u);
        let f0 = lower.evaluate_pdf(y0) * bracket.jacobian(y0);
        let f1 = upper.evaluate_pdf(y1) * bracket.jacobian(y1);
        match self {
            SamplingPolicy::UnitBaseCorrelated => {
                let p0 = bracket.processed_length(lower) * f0;
                let p1 = bracket.processed_length(upper) * f1;
                Ok(harmonic_mix(beta, p0, p1) / outer)
            }
            _ => Ok(harmonic_mix(beta, f0, f1) / bracket.jacobian(secondary)),
        }
    }

    /// Invert the correlated map from random number to secondary value.
    fn correlated_random_number(
        self,
        bracket: &Bracket,
        secondary: f64,
        tolerances: &EvaluationTolerances,
    ) -> Result<f64> {
        let beta = bracket.beta;
        match self {
            SamplingPolicy::UnitBaseCorrelated => {
                let eta = unit_base_position(bracket, secondary);
                let map = |u: f64| {
                    lerp(
                        beta,
                        bracket.unit_base(bracket.lower, u),
                        bracket.unit_base(bracket.upper, u),
                    )
                };
                bisect(map, eta, 0.0, 1.0, tolerances)
            }
            _ => {
                let map = |u: f64| {
                    lerp(
                        beta,
                        bracket.process(bracket.lower.sample_with_random_number(u)),
                        bracket.process(bracket.upper.sample_with_random_number(u)),
                    )
                };
                bisect(map, bracket.process(secondary), 0.0, 1.0, tolerances)
            }
        }
    }
}

/// Unit-base position of `secondary` in the interpolated support.
#[inline]
fn unit_base_position(bracket: &Bracket, secondary: f64) -> f64 {
    let (min, max) = bracket.processed_support();
    (bracket.process(secondary) - min) / (max - min)
}
