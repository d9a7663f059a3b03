// Hash-accelerated bin lookup over an energy grid

use crate::config::Config;
use crate::energy_grid::EnergyGrid;
use crate::error::{Result, TableError};
use serde::{Deserialize, Serialize};

/// Spans at most this wide are scanned linearly, wider ones are bisected.
const LINEAR_SCAN_LIMIT: usize = 8;

/// Axis on which the hash partitions are equally wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashScale {
    Linear,
    /// Equal width in ln(E), suited to grids spanning several decades.
    Logarithmic,
}

impl HashScale {
    #[inline(always)]
    fn process(self, energy: f64) -> f64 {
        match self {
            HashScale::Linear => energy,
            HashScale::Logarithmic => energy.ln(),
        }
    }
}

/// Finds the grid bin containing an energy in O(1) on average.
///
/// The range `[grid.front(), grid.back()]` is cut into equal-width
/// partitions and each stores the lowest bin overlapping it. A query
/// computes its partition directly and then only searches the bins between
/// that partition's start and the next one's.
#[derive(Debug, Clone)]
pub struct HashBasedGridSearcher {
    grid: EnergyGrid,
    scale: HashScale,
    hash_front: f64,
    hash_width: f64,
    /// One entry per partition edge, including the upper edge of the last partition.
    partition_starts: Vec<usize>,
}

impl HashBasedGridSearcher {
    pub fn new(grid: EnergyGrid, partitions: usize, scale: HashScale) -> Result<Self> {
        if partitions == 0 {
            return Err(TableError::Construction(
                "a grid searcher needs at least one hash partition".to_string(),
            ));
        }
        Ok(Self::build(grid, partitions, scale))
    }

    /// Build with the partition count and scale from the global configuration.
    pub fn from_grid(grid: EnergyGrid) -> Self {
        let (partitions, scale) = {
            let config = Config::global();
            (config.hash_bins_for(grid.len()), config.hash_scale)
        };
        Self::build(grid, partitions, scale)
    }

    fn build(grid: EnergyGrid, partitions: usize, scale: HashScale) -> Self {
        let hash_front = scale.process(grid.front());
        let hash_back = scale.process(grid.back());
        let hash_width = (hash_back - hash_front) / partitions as f64;
        let last_bin = grid.len() - 2;

        let mut partition_starts = Vec::with_capacity(partitions + 1);
        let mut bin = 0;
        for k in 0..=partitions {
            let edge = if k == partitions {
                hash_back
            } else {
                hash_front + k as f64 * hash_width
            };
            while bin < last_bin && scale.process(grid[bin + 1]) <= edge {
                bin += 1;
            }
            partition_starts.push(bin);
        }

        log::debug!(
            "built grid searcher with {} partitions over {} grid points",
            partitions,
            grid.len()
        );

        HashBasedGridSearcher {
            grid,
            scale,
            hash_front,
            hash_width,
            partition_starts,
        }
    }

    #[inline]
    pub fn grid(&self) -> &EnergyGrid {
        &self.grid
    }

    #[inline]
    pub fn scale(&self) -> HashScale {
        self.scale
    }

    pub fn number_of_partitions(&self) -> usize {
        self.partition_starts.len() - 1
    }

    #[inline]
    pub fn is_within_bounds(&self, energy: f64) -> bool {
        self.grid.contains(energy)
    }

    /// Index `i` of the bin with `grid[i] <= energy < grid[i + 1]`.
    ///
    /// `energy == grid.back()` belongs to the last bin, `grid.len() - 2`.
    pub fn lower_bin_index(&self, energy: f64) -> Result<usize> {
        if !self.is_within_bounds(energy) {
            return Err(TableError::out_of_range(
                energy,
                self.grid.front(),
                self.grid.back(),
            ));
        }
        Ok(self.lower_bin_index_unchecked(energy))
    }

    /// Same as [`lower_bin_index`](Self::lower_bin_index) without the bounds
    /// check. The energy must lie in `[grid.front(), grid.back()]`.
    #[inline]
    pub fn lower_bin_index_unchecked(&self, energy: f64) -> usize {
        let grid = self.grid.as_slice();
        let last_bin = grid.len() - 2;
        if energy >= grid[last_bin + 1] {
            return last_bin;
        }

        let partitions = self.partition_starts.len() - 1;
        let offset = (self.scale.process(energy) - self.hash_front) / self.hash_width;
        let k = (offset.max(0.0) as usize).min(partitions - 1);

        let mut lo = self.partition_starts[k];
        let mut hi = self.partition_starts[k + 1];
        // Rounding in the processed domain can put the energy one partition off
        if grid[lo] > energy {
            lo = 0;
        }
        if hi < last_bin && grid[hi + 1] <= energy {
            hi = last_bin;
        }

        if hi - lo <= LINEAR_SCAN_LIMIT {
            while lo < hi && grid[lo + 1] <= energy {
                lo += 1;
            }
            lo
        } else {
            lo + grid[lo + 1..=hi].partition_point(|&e| e <= energy)
        }
    }
}
