// Saving and loading reaction data as JSON
//
// The records below are plain data. Runtime objects are rebuilt from them
// with the `build*` functions and turned back into records with the
// `from_*` functions.

use crate::collision::ReactionSet;
use crate::config::EvaluationTolerances;
use crate::energy_grid::EnergyGrid;
use crate::error::{Result, TableError};
use crate::grid_searcher::HashBasedGridSearcher;
use crate::interpolation::Interpolation;
use crate::reaction::{Reaction, ReactionKind, Subshell};
use crate::sampling_policy::SamplingPolicy;
use crate::secondary::{PrimaryScale, SecondaryScale, TabularSecondaryDistribution};
use crate::tabular::{TabularDistribution, TabularShape};
use crate::threshold_table::ThresholdIndexedTable;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Distribution1DRecord {
    /// Written with the normalised `cdf`, which rebuilds the distribution
    /// exactly. Hand-written records may leave it out and are normalised on
    /// build.
    LinLin {
        values: Vec<f64>,
        pdf: Vec<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cdf: Option<Vec<f64>>,
    },
    Histogram { values: Vec<f64>, cdf: Vec<f64> },
}

impl Distribution1DRecord {
    pub fn from_distribution(dist: &TabularDistribution) -> Self {
        match dist.shape() {
            TabularShape::LinLin => Distribution1DRecord::LinLin {
                values: dist.values().to_vec(),
                pdf: dist.pdf_values().to_vec(),
                cdf: Some(dist.cdf_values().to_vec()),
            },
            TabularShape::Histogram => Distribution1DRecord::Histogram {
                values: dist.values().to_vec(),
                cdf: dist.cdf_values().to_vec(),
            },
        }
    }

    pub fn build(&self) -> Result<TabularDistribution> {
        match self {
            Distribution1DRecord::LinLin {
                values,
                pdf,
                cdf: Some(cdf),
            } => TabularDistribution::lin_lin_normalized(values.clone(), pdf.clone(), cdf.clone()),
            Distribution1DRecord::LinLin {
                values,
                pdf,
                cdf: None,
            } => TabularDistribution::lin_lin(values.clone(), pdf.clone()),
            Distribution1DRecord::Histogram { values, cdf } => {
                TabularDistribution::from_cdf(values.clone(), cdf.clone())
            }
        }
    }
}

/// Nested map of primary energy to secondary distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondaryDistributionRecord {
    pub policy: SamplingPolicy,
    #[serde(default)]
    pub primary_scale: PrimaryScale,
    #[serde(default)]
    pub secondary_scale: SecondaryScale,
    /// Falls back to the global configuration when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerances: Option<EvaluationTolerances>,
    pub primary_energies: Vec<f64>,
    pub distributions: Vec<Distribution1DRecord>,
}

impl SecondaryDistributionRecord {
    pub fn from_distribution(dist: &TabularSecondaryDistribution) -> Self {
        SecondaryDistributionRecord {
            policy: dist.policy(),
            primary_scale: dist.primary_scale(),
            secondary_scale: dist.secondary_scale(),
            tolerances: Some(*dist.tolerances()),
            primary_energies: dist.primary_grid().to_vec(),
            distributions: dist
                .distributions()
                .iter()
                .map(Distribution1DRecord::from_distribution)
                .collect(),
        }
    }

    pub fn build(&self) -> Result<TabularSecondaryDistribution> {
        let distributions = self
            .distributions
            .iter()
            .map(Distribution1DRecord::build)
            .collect::<Result<Vec<_>>>()?;
        let dist = TabularSecondaryDistribution::with_policy(
            self.primary_energies.clone(),
            distributions,
            self.policy,
        )?
        .with_primary_scale(self.primary_scale)
        .with_secondary_scale(self.secondary_scale)?;
        Ok(match self.tolerances {
            Some(tolerances) => dist.with_tolerances(tolerances),
            None => dist,
        })
    }
}

/// One reaction, keyed by its kind and subshell. `grid` indexes
/// [`ReactionLibrary::grids`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionRecord {
    pub kind: ReactionKind,
    #[serde(default)]
    pub subshell: Subshell,
    pub grid: usize,
    pub threshold_index: usize,
    pub cross_section: Vec<f64>,
    #[serde(default)]
    pub interpolation: Interpolation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution: Option<SecondaryDistributionRecord>,
}

/// Everything needed to rebuild a set of reactions. Records that name the
/// same grid index share one grid (and searcher) once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReactionLibrary {
    pub grids: Vec<Vec<f64>>,
    pub reactions: Vec<ReactionRecord>,
}

impl ReactionLibrary {
    /// Record `reactions`, storing each distinct shared grid once.
    pub fn from_reactions(reactions: &[Reaction]) -> Self {
        let mut grids: Vec<EnergyGrid> = Vec::new();
        let mut records = Vec::with_capacity(reactions.len());
        for reaction in reactions {
            let table = reaction.cross_section_table();
            let grid = table.grid();
            let index = match grids.iter().position(|g| g.shares_storage_with(grid)) {
                Some(index) => index,
                None => {
                    grids.push(grid.clone());
                    grids.len() - 1
                }
            };
            records.push(ReactionRecord {
                kind: reaction.kind(),
                subshell: reaction.subshell(),
                grid: index,
                threshold_index: table.threshold_index(),
                cross_section: table.values().to_vec(),
                interpolation: table.interpolation(),
                distribution: reaction
                    .distribution()
                    .map(|dist| SecondaryDistributionRecord::from_distribution(dist)),
            });
        }
        ReactionLibrary {
            grids: grids.iter().map(EnergyGrid::to_vec).collect(),
            reactions: records,
        }
    }

    pub fn find(&self, kind_label: &str, subshell: Subshell) -> Option<&ReactionRecord> {
        self.reactions
            .iter()
            .find(|r| r.kind.label() == kind_label && r.subshell == subshell)
    }

    pub fn build_reactions(&self) -> Result<Vec<Reaction>> {
        let searchers = self
            .grids
            .iter()
            .map(|points| -> Result<Arc<HashBasedGridSearcher>> {
                let grid = EnergyGrid::new(points.clone())?;
                Ok(Arc::new(HashBasedGridSearcher::from_grid(grid)))
            })
            .collect::<Result<Vec<_>>>()?;

        let reactions = self
            .reactions
            .iter()
            .map(|record| -> Result<Reaction> {
                let searcher = searchers.get(record.grid).ok_or_else(|| {
                    TableError::Construction(format!(
                        "{} reaction refers to grid {} but the library has {}",
                        record.kind.label(),
                        record.grid,
                        searchers.len()
                    ))
                })?;
                let table = ThresholdIndexedTable::with_searcher(
                    searcher.clone(),
                    record.threshold_index,
                    record.cross_section.clone(),
                    record.interpolation,
                )?;
                let distribution = match &record.distribution {
                    Some(dist) => Some(Arc::new(dist.build()?)),
                    None => None,
                };
                Ok(Reaction::new(record.kind, Arc::new(table), distribution)?
                    .with_subshell(record.subshell))
            })
            .collect::<Result<Vec<_>>>()?;

        log::info!(
            "built {} reactions over {} shared energy grids",
            reactions.len(),
            searchers.len()
        );
        Ok(reactions)
    }

    pub fn build_reaction_set(&self) -> Result<ReactionSet> {
        Ok(self.build_reactions()?.into_iter().collect())
    }
}

pub fn serialize(library: &ReactionLibrary) -> Result<String> {
    Ok(serde_json::to_string_pretty(library)?)
}

pub fn deserialize(json: &str) -> Result<ReactionLibrary> {
    Ok(serde_json::from_str(json)?)
}

pub fn save_library<P: AsRef<Path>>(library: &ReactionLibrary, path: P) -> Result<()> {
    fs::write(path, serialize(library)?)?;
    Ok(())
}

pub fn load_library<P: AsRef<Path>>(path: P) -> Result<ReactionLibrary> {
    let json = fs::read_to_string(path)?;
    deserialize(&json)
}
