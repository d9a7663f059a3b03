mod bank;
mod collision;
mod config;
mod energy_grid;
mod error;
mod fast_rng;
mod grid_generator;
mod grid_searcher;
mod interpolation;
mod kinematics;
mod particle;
pub mod persistence;
mod reaction;
mod sampling_policy;
mod secondary;
mod tabular;
mod threshold_table;

pub use bank::ParticleBank;
pub use collision::{CollisionOutcome, ReactionSet};
pub use config::{Config, EvaluationTolerances, CONFIG};
pub use energy_grid::EnergyGrid;
pub use error::{Result, TableError};
pub use fast_rng::{FastRng, ScriptedRng, HISTORY_STRIDE};
pub use grid_generator::GridGenerator;
pub use grid_searcher::{HashBasedGridSearcher, HashScale};
pub use interpolation::Interpolation;
pub use kinematics::{
    binary_collision_cosine, compton_scattered_energy, dipole_photon_cosine, rotate_direction,
    ELECTRON_REST_MASS_ENERGY,
};
pub use particle::{Particle, ParticleType};
pub use persistence::{
    Distribution1DRecord, ReactionLibrary, ReactionRecord, SecondaryDistributionRecord,
};
pub use reaction::{Reaction, ReactionKind, Subshell};
pub use sampling_policy::{Bracket, SamplingPolicy};
pub use secondary::{PrimaryScale, SecondaryScale, TabularSecondaryDistribution};
pub use tabular::{TabularDistribution, TabularShape};
pub use threshold_table::ThresholdIndexedTable;
