// Global configuration for table construction defaults
use crate::grid_searcher::HashScale;
use crate::sampling_policy::SamplingPolicy;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};

// Defaults read by constructors that are not handed explicit settings
pub static CONFIG: Lazy<Mutex<Config>> = Lazy::new(|| Mutex::new(Config::new()));

/// Tolerances used by every numerical inversion (bisection) in the crate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationTolerances {
    /// Relative error accepted between the target and the estimate.
    pub relative_error: f64,
    /// Absolute error accepted when the target is at or near zero.
    pub absolute_error: f64,
    pub max_iterations: usize,
}

impl EvaluationTolerances {
    pub const fn new(relative_error: f64, absolute_error: f64, max_iterations: usize) -> Self {
        EvaluationTolerances {
            relative_error,
            absolute_error,
            max_iterations,
        }
    }

    /// Whether `estimate` is close enough to `target`.
    #[inline]
    pub fn accepts(&self, estimate: f64, target: f64) -> bool {
        let diff = (estimate - target).abs();
        diff <= self.absolute_error || diff <= self.relative_error * target.abs()
    }
}

impl Default for EvaluationTolerances {
    fn default() -> Self {
        EvaluationTolerances::new(1e-7, 1e-15, 500)
    }
}

/// Global configuration container for table construction.
///
/// Tables, searchers and distributions copy what they need from the
/// configuration when they are built, so changing it afterwards never
/// affects an object that already exists. A single global instance is
/// exposed via the `CONFIG` static; obtain a guard with [`Config::global`].
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Hash partitions per grid are `grid.len() / hash_grid_divisor + 1`.
    pub hash_grid_divisor: usize,
    /// Axis on which hash partitions are laid out.
    pub hash_scale: HashScale,
    pub tolerances: EvaluationTolerances,
    /// Policy for secondary distributions built without an explicit one.
    pub default_policy: SamplingPolicy,
    /// Relative convergence tolerance used by the grid generator.
    pub grid_convergence_tolerance: f64,
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Config {
            hash_grid_divisor: 10,
            hash_scale: HashScale::Logarithmic,
            tolerances: EvaluationTolerances::default(),
            default_policy: SamplingPolicy::UnitBaseCorrelated,
            grid_convergence_tolerance: 1e-3,
        }
    }

    /// Lock the global configuration, recovering from a poisoned lock.
    pub fn global() -> MutexGuard<'static, Config> {
        CONFIG.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of hash partitions used for a grid of `grid_len` points.
    pub fn hash_bins_for(&self, grid_len: usize) -> usize {
        grid_len / self.hash_grid_divisor.max(1) + 1
    }

    pub fn set_hash_grid_divisor(&mut self, divisor: usize) {
        if divisor == 0 {
            log::warn!("ignoring hash grid divisor of zero");
            return;
        }
        self.hash_grid_divisor = divisor;
    }

    pub fn set_hash_scale(&mut self, scale: HashScale) {
        self.hash_scale = scale;
    }

    pub fn set_tolerances(&mut self, tolerances: EvaluationTolerances) {
        self.tolerances = tolerances;
    }

    pub fn set_default_policy(&mut self, policy: SamplingPolicy) {
        self.default_policy = policy;
    }

    pub fn set_grid_convergence_tolerance(&mut self, tolerance: f64) {
        self.grid_convergence_tolerance = tolerance;
    }

    /// Restore every field to its default
    pub fn reset(&mut self) {
        *self = Config::new();
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_bins_match_grid_size() {
        let config = Config::new();
        assert_eq!(config.hash_bins_for(3), 1);
        assert_eq!(config.hash_bins_for(10), 2);
        assert_eq!(config.hash_bins_for(1005), 101);
    }

    #[test]
    fn test_setters_and_reset() {
        let mut config = Config::new();
        config.set_hash_grid_divisor(4);
        config.set_hash_scale(HashScale::Linear);
        config.set_default_policy(SamplingPolicy::Exact);
        config.set_tolerances(EvaluationTolerances::new(1e-9, 1e-18, 100));
        config.set_grid_convergence_tolerance(1e-5);
        assert_eq!(config.hash_bins_for(8), 3);
        assert_eq!(config.default_policy, SamplingPolicy::Exact);
        assert_eq!(config.tolerances.max_iterations, 100);

        config.set_hash_grid_divisor(0);
        assert_eq!(config.hash_grid_divisor, 4);

        config.reset();
        assert_eq!(config, Config::new());
    }

    #[test]
    fn test_tolerance_acceptance() {
        let tol = EvaluationTolerances::default();
        assert!(tol.accepts(1.0 + 1e-8, 1.0));
        assert!(!tol.accepts(1.0 + 1e-6, 1.0));
        assert!(tol.accepts(1e-16, 0.0));
    }

    #[test]
    fn test_global_is_readable() {
        let config = Config::global();
        assert!(config.hash_grid_divisor > 0);
    }
}
