use crate::energy_grid::EnergyGrid;
use crate::error::{Result, TableError};
use crate::grid_searcher::HashBasedGridSearcher;
use crate::interpolation::Interpolation;
use std::sync::Arc;

/// A scalar quantity (usually a cross section in barns) tabulated on an
/// energy grid from a threshold index upwards.
///
/// Below `grid[threshold_index]` the quantity is exactly zero. At and above
/// it, `values[i - threshold_index]` belongs to `grid[i]` and points in
/// between are interpolated with the table's rule. Energies outside the
/// grid are an error; nothing is extrapolated.
#[derive(Debug, Clone)]
pub struct ThresholdIndexedTable {
    searcher: Arc<HashBasedGridSearcher>,
    threshold_index: usize,
    values: Vec<f64>,
    interpolation: Interpolation,
}

impl ThresholdIndexedTable {
    /// Build a table with its own searcher over `grid`.
    pub fn new(
        grid: EnergyGrid,
        threshold_index: usize,
        values: Vec<f64>,
        interpolation: Interpolation,
    ) -> Result<Self> {
        let searcher = Arc::new(HashBasedGridSearcher::from_grid(grid));
        Self::with_searcher(searcher, threshold_index, values, interpolation)
    }

    /// Build a table that shares an existing searcher (and so its grid).
    pub fn with_searcher(
        searcher: Arc<HashBasedGridSearcher>,
        threshold_index: usize,
        values: Vec<f64>,
        interpolation: Interpolation,
    ) -> Result<Self> {
        let grid_len = searcher.grid().len();
        if threshold_index >= grid_len {
            return Err(TableError::Construction(format!(
                "threshold index {} must be below the grid length {}",
                threshold_index, grid_len
            )));
        }
        if values.len() != grid_len - threshold_index {
            return Err(TableError::Construction(format!(
                "expected {} values for a grid of {} points with threshold index {}, got {}",
                grid_len - threshold_index,
                grid_len,
                threshold_index,
                values.len()
            )));
        }
        if let Some(i) = values.iter().position(|v| !v.is_finite() || *v < 0.0) {
            return Err(TableError::Construction(format!(
                "table value {} is not a non-negative finite number ({})",
                i, values[i]
            )));
        }

        Ok(ThresholdIndexedTable {
            searcher,
            threshold_index,
            values,
            interpolation,
        })
    }

    #[inline]
    pub fn grid(&self) -> &EnergyGrid {
        self.searcher.grid()
    }

    pub fn searcher(&self) -> &Arc<HashBasedGridSearcher> {
        &self.searcher
    }

    #[inline]
    pub fn threshold_index(&self) -> usize {
        self.threshold_index
    }

    #[inline]
    pub fn threshold_energy(&self) -> f64 {
        self.grid()[self.threshold_index]
    }

    #[inline]
    pub fn max_energy(&self) -> f64 {
        self.grid().back()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// Value of the table at `energy`.
    pub fn evaluate(&self, energy: f64) -> Result<f64> {
        let bin = self.searcher.lower_bin_index(energy)?;
        Ok(self.value_in_bin(energy, bin))
    }

    /// Value of the table at `energy` for a caller that already holds its
    /// grid bin. A bin that does not contain `energy` is an `OutOfRange`
    /// error carrying the bin's edges.
    pub fn evaluate_in_bin(&self, energy: f64, bin: usize) -> Result<f64> {
        let grid = self.grid().as_slice();
        if bin >= grid.len() - 1 {
            return Err(TableError::out_of_range(energy, grid[0], grid[grid.len() - 1]));
        }
        if !(energy >= grid[bin] && energy <= grid[bin + 1]) {
            return Err(TableError::out_of_range(energy, grid[bin], grid[bin + 1]));
        }
        Ok(self.value_in_bin(energy, bin))
    }

    #[inline]
    fn value_in_bin(&self, energy: f64, bin: usize) -> f64 {
        let grid = self.grid().as_slice();
        let t = self.threshold_index;

        if energy < grid[t] {
            return 0.0;
        }
        if energy == grid[bin + 1] {
            return self.values[bin + 1 - t];
        }
        if energy == grid[bin] {
            return self.values[bin - t];
        }

        let lower = self.values[bin - t];
        let upper = self.values[bin + 1 - t];
        self.interpolation
            .interpolate(grid[bin], grid[bin + 1], lower, upper, energy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid_searcher::HashScale;
    use approx::assert_relative_eq;

    fn grid() -> EnergyGrid {
        EnergyGrid::new(vec![1e-5, 1e-3, 20.0]).unwrap()
    }

    #[test]
    fn test_full_range_table() {
        let table = ThresholdIndexedTable::new(
            grid(),
            0,
            vec![2.74896e8, 2.80490e6, 1.30221e4],
            Interpolation::LogLog,
        )
        .unwrap();
        assert_eq!(table.threshold_energy(), 1e-5);
        assert_eq!(table.evaluate(1e-5).unwrap(), 2.74896e8);
        assert_eq!(table.evaluate(1e-3).unwrap(), 2.80490e6);
        assert_eq!(table.evaluate(20.0).unwrap(), 1.30221e4);

        // log-log between the first two points
        let expected = 2.74896e8 * ((2.80490e6f64 / 2.74896e8).ln() * 0.5).exp();
        assert_relative_eq!(table.evaluate(1e-4).unwrap(), expected, max_relative = 1e-12);
    }

    #[test]
    fn test_zero_below_threshold() {
        let table =
            ThresholdIndexedTable::new(grid(), 1, vec![5.0, 7.0], Interpolation::LinLin).unwrap();
        assert_eq!(table.threshold_energy(), 1e-3);
        assert_eq!(table.evaluate(1e-5).unwrap(), 0.0);
        assert_eq!(table.evaluate(9.99e-4).unwrap(), 0.0);
        assert_eq!(table.evaluate(1e-3).unwrap(), 5.0);
        assert_eq!(table.evaluate(20.0).unwrap(), 7.0);
    }

    #[test]
    fn test_threshold_at_last_point() {
        let table = ThresholdIndexedTable::new(grid(), 2, vec![3.0], Interpolation::LogLog).unwrap();
        assert_eq!(table.evaluate(19.999).unwrap(), 0.0);
        assert_eq!(table.evaluate(20.0).unwrap(), 3.0);
    }

    #[test]
    fn test_construction_errors() {
        let err = ThresholdIndexedTable::new(grid(), 3, vec![], Interpolation::LinLin).unwrap_err();
        assert!(err.is_construction());
        let err =
            ThresholdIndexedTable::new(grid(), 0, vec![1.0, 2.0], Interpolation::LinLin).unwrap_err();
        assert!(err.is_construction());
        let err = ThresholdIndexedTable::new(grid(), 1, vec![1.0, -2.0], Interpolation::LinLin)
            .unwrap_err();
        assert!(err.is_construction());
    }

    #[test]
    fn test_out_of_range_is_an_error() {
        let table =
            ThresholdIndexedTable::new(grid(), 0, vec![1.0, 2.0, 3.0], Interpolation::LinLin).unwrap();
        assert!(table.evaluate(9e-6).unwrap_err().is_out_of_range());
        assert!(table.evaluate(20.5).unwrap_err().is_out_of_range());
    }

    #[test]
    fn test_evaluate_in_bin_checks_the_bin() {
        let table =
            ThresholdIndexedTable::new(grid(), 1, vec![5.0, 7.0], Interpolation::LinLin).unwrap();
        assert_eq!(table.evaluate_in_bin(1e-4, 0).unwrap(), 0.0);
        assert_eq!(table.evaluate_in_bin(1e-3, 0).unwrap(), 5.0);
        assert_eq!(table.evaluate_in_bin(10.0, 1).unwrap(), table.evaluate(10.0).unwrap());

        // a bin that does not hold the energy
        assert!(table.evaluate_in_bin(10.0, 0).unwrap_err().is_out_of_range());
        assert!(table.evaluate_in_bin(1e-4, 1).unwrap_err().is_out_of_range());
        // past the last bin
        assert!(table.evaluate_in_bin(20.0, 2).unwrap_err().is_out_of_range());
        assert!(table.evaluate_in_bin(20.0, usize::MAX).unwrap_err().is_out_of_range());
        assert!(table.evaluate_in_bin(f64::NAN, 1).unwrap_err().is_out_of_range());
    }

    #[test]
    fn test_zero_value_in_first_bin_with_log_log() {
        let table =
            ThresholdIndexedTable::new(grid(), 1, vec![0.0, 8.0], Interpolation::LogLog).unwrap();
        let value = table.evaluate(10.0).unwrap();
        assert!(value > 0.0 && value < 8.0);
    }

    #[test]
    fn test_tables_share_a_searcher() {
        let searcher = Arc::new(HashBasedGridSearcher::new(grid(), 2, HashScale::Linear).unwrap());
        let a = ThresholdIndexedTable::with_searcher(
            searcher.clone(),
            0,
            vec![1.0, 2.0, 3.0],
            Interpolation::LinLin,
        )
        .unwrap();
        let b = ThresholdIndexedTable::with_searcher(searcher, 1, vec![4.0, 5.0], Interpolation::LinLin)
            .unwrap();
        assert!(a.grid().shares_storage_with(b.grid()));
        assert!(Arc::ptr_eq(a.searcher(), b.searcher()));
    }
}
