use crate::error::{Result, TableError};
use serde::{Deserialize, Serialize};
use std::ops::Index;
use std::sync::Arc;

/// An immutable, strictly increasing sequence of positive energies (MeV).
///
/// Cloning an `EnergyGrid` is cheap and keeps the same backing storage, which
/// is what it means for two tables to share a grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct EnergyGrid {
    points: Arc<[f64]>,
}

impl EnergyGrid {
    pub fn new(points: Vec<f64>) -> Result<Self> {
        if points.len() < 2 {
            return Err(TableError::Construction(format!(
                "an energy grid needs at least 2 points, got {}",
                points.len()
            )));
        }
        for (i, &e) in points.iter().enumerate() {
            if !e.is_finite() || e <= 0.0 {
                return Err(TableError::Construction(format!(
                    "energy grid point {} is not a positive finite value ({})",
                    i, e
                )));
            }
        }
        if let Some(i) = points.windows(2).position(|w| w[0] >= w[1]) {
            return Err(TableError::Construction(format!(
                "energy grid is not strictly increasing at index {} ({} >= {})",
                i,
                points[i],
                points[i + 1]
            )));
        }
        Ok(EnergyGrid {
            points: points.into(),
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; a grid holds at least two points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn front(&self) -> f64 {
        self.points[0]
    }

    #[inline]
    pub fn back(&self) -> f64 {
        self.points[self.points.len() - 1]
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.points
    }

    #[inline]
    pub fn contains(&self, energy: f64) -> bool {
        energy >= self.front() && energy <= self.back()
    }

    /// Identity comparison: true only when both grids use the same storage.
    #[inline]
    pub fn shares_storage_with(&self, other: &EnergyGrid) -> bool {
        Arc::ptr_eq(&self.points, &other.points)
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.points.to_vec()
    }
}

impl Index<usize> for EnergyGrid {
    type Output = f64;

    #[inline]
    fn index(&self, index: usize) -> &f64 {
        &self.points[index]
    }
}

impl TryFrom<Vec<f64>> for EnergyGrid {
    type Error = TableError;

    fn try_from(points: Vec<f64>) -> Result<Self> {
        EnergyGrid::new(points)
    }
}

impl From<EnergyGrid> for Vec<f64> {
    fn from(grid: EnergyGrid) -> Self {
        grid.to_vec()
    }
}
