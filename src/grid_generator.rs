// Energy grid densification
use crate::config::Config;
use crate::energy_grid::EnergyGrid;
use crate::error::{Result, TableError};
use crate::interpolation::Interpolation;
use crate::threshold_table::ThresholdIndexedTable;

/// Refines an energy grid until an interpolation rule reproduces a function
/// at the midpoint of every bin.
///
/// A bin is accepted once the interpolated and evaluated midpoint values
/// agree to the relative convergence tolerance or to the absolute
/// difference tolerance, or once the bin is narrower (relative to its lower
/// edge) than the distance tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGenerator {
    interpolation: Interpolation,
    convergence_tolerance: f64,
    absolute_difference_tolerance: f64,
    distance_tolerance: f64,
}

impl GridGenerator {
    pub fn new(interpolation: Interpolation) -> Self {
        GridGenerator {
            interpolation,
            convergence_tolerance: Config::global().grid_convergence_tolerance,
            absolute_difference_tolerance: 1e-12,
            distance_tolerance: 1e-9,
        }
    }

    pub fn with_tolerances(
        mut self,
        convergence: f64,
        absolute_difference: f64,
        distance: f64,
    ) -> Result<Self> {
        for (name, value) in [
            ("convergence", convergence),
            ("absolute difference", absolute_difference),
            ("distance", distance),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(TableError::Construction(format!(
                    "grid generator {} tolerance must be positive, got {}",
                    name, value
                )));
            }
        }
        self.convergence_tolerance = convergence;
        self.absolute_difference_tolerance = absolute_difference;
        self.distance_tolerance = distance;
        Ok(self)
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    fn converged(&self, x0: f64, x1: f64, estimate: f64, exact: f64) -> bool {
        let diff = (estimate - exact).abs();
        diff <= self.absolute_difference_tolerance
            || diff <= self.convergence_tolerance * exact.abs()
            || (x1 - x0) / x0 <= self.distance_tolerance
    }

    /// Densify `initial` for `f` and return the grid with `f` evaluated on it.
    pub fn generate<F>(&self, initial: &[f64], f: F) -> Result<(Vec<f64>, Vec<f64>)>
    where
        F: Fn(f64) -> f64,
    {
        let initial = EnergyGrid::new(initial.to_vec())?;
        let evaluate = |x: f64| -> Result<f64> {
            let y = f(x);
            if y.is_finite() {
                Ok(y)
            } else {
                Err(TableError::Construction(format!(
                    "function is not finite at {} ({})",
                    x, y
                )))
            }
        };

        let mut grid = vec![initial.front()];
        let mut values = vec![evaluate(initial.front())?];
        for &upper in &initial.as_slice()[1..] {
            let mut pending = vec![(upper, evaluate(upper)?)];
            while let Some(&(x1, y1)) = pending.last() {
                let x0 = grid[grid.len() - 1];
                let y0 = values[values.len() - 1];
                let mid = self.interpolation.midpoint(x0, x1);
                if mid <= x0 || mid >= x1 {
                    grid.push(x1);
                    values.push(y1);
                    pending.pop();
                    continue;
                }
                let exact = evaluate(mid)?;
                let estimate = self.interpolation.interpolate(x0, x1, y0, y1, mid);
                if self.converged(x0, x1, estimate, exact) {
                    grid.push(x1);
                    values.push(y1);
                    pending.pop();
                } else {
                    pending.push((mid, exact));
                }
            }
        }

        log::debug!(
            "densified grid from {} to {} points",
            initial.len(),
            grid.len()
        );
        Ok((grid, values))
    }

    /// Densify and build a table active over the whole generated grid.
    pub fn generate_table<F>(&self, initial: &[f64], f: F) -> Result<ThresholdIndexedTable>
    where
        F: Fn(f64) -> f64,
    {
        let (grid, values) = self.generate(initial, f)?;
        ThresholdIndexedTable::new(EnergyGrid::new(grid)?, 0, values, self.interpolation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_function_needs_no_points() {
        let generator = GridGenerator::new(Interpolation::LinLin);
        let (grid, values) = generator.generate(&[1.0, 10.0], |x| 3.0 * x + 1.0).unwrap();
        assert_eq!(grid, vec![1.0, 10.0]);
        assert_eq!(values, vec![4.0, 31.0]);
    }

    #[test]
    fn test_power_law_is_exact_in_log_log() {
        let generator = GridGenerator::new(Interpolation::LogLog);
        let (grid, _) = generator.generate(&[1e-5, 20.0], |x| x.powf(-1.5)).unwrap();
        assert_eq!(grid.len(), 2);
    }

    #[test]
    fn test_curved_function_is_reproduced() {
        let generator = GridGenerator::new(Interpolation::LinLin)
            .with_tolerances(1e-4, 1e-14, 1e-12)
            .unwrap();
        let f = |x: f64| (x * 0.7).sin() + 2.0;
        let table = generator.generate_table(&[0.1, 5.0, 10.0], f).unwrap();
        assert!(table.grid().len() > 10);
        for i in 0..500 {
            let x = 0.1 + 9.9 * i as f64 / 500.0;
            let y = table.evaluate(x).unwrap();
            assert!((y - f(x)).abs() <= 2e-3 * f(x), "x = {}: {} vs {}", x, y, f(x));
        }
    }

    #[test]
    fn test_invalid_inputs() {
        let generator = GridGenerator::new(Interpolation::LinLin);
        assert!(generator.with_tolerances(0.0, 1e-12, 1e-9).is_err());
        assert!(generator.generate(&[2.0, 1.0], |x| x).is_err());
        assert!(generator.generate(&[1.0, 2.0], |_| f64::NAN).is_err());
    }
}
