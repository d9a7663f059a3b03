// Secondary distributions tabulated on a primary energy grid
use crate::config::{Config, EvaluationTolerances};
use crate::energy_grid::EnergyGrid;
use crate::error::{Result, TableError};
use crate::grid_searcher::HashBasedGridSearcher;
use crate::sampling_policy::{Bracket, SamplingPolicy};
use crate::tabular::TabularDistribution;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Axis on which the fractional position between two primary energies is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PrimaryScale {
    #[default]
    Lin,
    Log,
}

/// Axis on which the correlated and unit-base policies interpolate the
/// secondary value. A logarithmic axis needs strictly positive supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SecondaryScale {
    #[default]
    Lin,
    Log,
}

enum Location<'a> {
    Tabulated(&'a TabularDistribution),
    Between(Bracket<'a>),
}

/// A family of one-dimensional distributions of a secondary observable
/// (scattering cosine, outgoing or lost energy) indexed by primary energy.
///
/// At a tabulated primary energy every query goes straight to that energy's
/// distribution. Between two tabulated energies the distribution's
/// [`SamplingPolicy`] decides, and evaluation and sampling always use the
/// same policy.
#[derive(Debug, Clone)]
pub struct TabularSecondaryDistribution {
    searcher: HashBasedGridSearcher,
    distributions: Vec<TabularDistribution>,
    policy: SamplingPolicy,
    primary_scale: PrimaryScale,
    secondary_scale: SecondaryScale,
    tolerances: EvaluationTolerances,
}

impl TabularSecondaryDistribution {
    /// Build with the default policy and tolerances of the global configuration.
    pub fn new(primary_energies: Vec<f64>, distributions: Vec<TabularDistribution>) -> Result<Self> {
        let policy = Config::global().default_policy;
        Self::with_policy(primary_energies, distributions, policy)
    }

    pub fn with_policy(
        primary_energies: Vec<f64>,
        distributions: Vec<TabularDistribution>,
        policy: SamplingPolicy,
    ) -> Result<Self> {
        if primary_energies.len() != distributions.len() {
            return Err(TableError::Construction(format!(
                "{} primary energies but {} secondary distributions",
                primary_energies.len(),
                distributions.len()
            )));
        }
        let grid = EnergyGrid::new(primary_energies)?;
        let tolerances = Config::global().tolerances;
        Ok(TabularSecondaryDistribution {
            searcher: HashBasedGridSearcher::from_grid(grid),
            distributions,
            policy,
            primary_scale: PrimaryScale::Lin,
            secondary_scale: SecondaryScale::Lin,
            tolerances,
        })
    }

    pub fn with_primary_scale(mut self, scale: PrimaryScale) -> Self {
        self.primary_scale = scale;
        self
    }

    pub fn with_secondary_scale(mut self, scale: SecondaryScale) -> Result<Self> {
        if scale == SecondaryScale::Log {
            if let Some(dist) = self.distributions.iter().find(|d| d.lower_bound() <= 0.0) {
                return Err(TableError::Construction(format!(
                    "log secondary scale needs positive supports, one starts at {}",
                    dist.lower_bound()
                )));
            }
        }
        self.secondary_scale = scale;
        Ok(self)
    }

    pub fn with_tolerances(mut self, tolerances: EvaluationTolerances) -> Self {
        self.tolerances = tolerances;
        self
    }

    pub fn policy(&self) -> SamplingPolicy {
        self.policy
    }

    pub fn primary_scale(&self) -> PrimaryScale {
        self.primary_scale
    }

    pub fn secondary_scale(&self) -> SecondaryScale {
        self.secondary_scale
    }

    pub fn tolerances(&self) -> &EvaluationTolerances {
        &self.tolerances
    }

    pub fn primary_grid(&self) -> &EnergyGrid {
        self.searcher.grid()
    }

    pub fn distributions(&self) -> &[TabularDistribution] {
        &self.distributions
    }

    pub fn lower_bound_of_primary(&self) -> f64 {
        self.primary_grid().front()
    }

    pub fn upper_bound_of_primary(&self) -> f64 {
        self.primary_grid().back()
    }

    fn locate(&self, primary: f64) -> Result<Location<'_>> {
        let bin = self.searcher.lower_bin_index(primary)?;
        let grid = self.primary_grid();
        if primary == grid[bin] {
            return Ok(Location::Tabulated(&self.distributions[bin]));
        }
        if primary == grid[bin + 1] {
            return Ok(Location::Tabulated(&self.distributions[bin + 1]));
        }
        Ok(Location::Between(Bracket::new(
            grid[bin],
            &self.distributions[bin],
            grid[bin + 1],
            &self.distributions[bin + 1],
            primary,
            self.primary_scale == PrimaryScale::Log,
        )
        .with_log_secondary(self.secondary_scale == SecondaryScale::Log)))
    }

    pub fn lower_bound_of_secondary(&self, primary: f64) -> Result<f64> {
        Ok(match self.locate(primary)? {
            Location::Tabulated(dist) => dist.lower_bound(),
            Location::Between(bracket) => self.policy.lower_bound(&bracket),
        })
    }

    pub fn upper_bound_of_secondary(&self, primary: f64) -> Result<f64> {
        Ok(match self.locate(primary)? {
            Location::Tabulated(dist) => dist.upper_bound(),
            Location::Between(bracket) => self.policy.upper_bound(&bracket),
        })
    }

    pub fn evaluate_pdf(&self, primary: f64, secondary: f64) -> Result<f64> {
        match self.locate(primary)? {
            Location::Tabulated(dist) => Ok(dist.evaluate_pdf(secondary)),
            Location::Between(bracket) => {
                self.policy.evaluate_pdf(&bracket, secondary, &self.tolerances)
            }
        }
    }

    pub fn evaluate_cdf(&self, primary: f64, secondary: f64) -> Result<f64> {
        match self.locate(primary)? {
            Location::Tabulated(dist) => Ok(dist.evaluate_cdf(secondary)),
            Location::Between(bracket) => {
                self.policy.evaluate_cdf(&bracket, secondary, &self.tolerances)
            }
        }
    }

    /// Secondary value at `primary` for the random number `u` in `[0, 1)`.
    pub fn sample_with_random_number(&self, primary: f64, u: f64) -> Result<f64> {
        match self.locate(primary)? {
            Location::Tabulated(dist) => Ok(dist.sample_with_random_number(u)),
            Location::Between(bracket) => {
                self.policy
                    .sample_with_random_number(&bracket, u, &self.tolerances)
            }
        }
    }

    /// Draws exactly one random number from `rng`.
    pub fn sample<R: Rng + ?Sized>(&self, primary: f64, rng: &mut R) -> Result<f64> {
        let u = rng.gen::<f64>();
        self.sample_with_random_number(primary, u)
    }

    pub fn sample_and_record_trials<R: Rng + ?Sized>(
        &self,
        primary: f64,
        rng: &mut R,
        trials: &mut u64,
    ) -> Result<f64> {
        *trials += 1;
        self.sample(primary, rng)
    }
}
