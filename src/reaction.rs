use crate::bank::ParticleBank;
use crate::error::{Result, TableError};
use crate::kinematics::{
    binary_collision_cosine, compton_scattered_energy, dipole_photon_cosine, rotate_direction,
    sample_azimuthal_angle,
};
use crate::particle::{Particle, ParticleType};
use crate::secondary::TabularSecondaryDistribution;
use crate::threshold_table::ThresholdIndexedTable;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::sync::Arc;

/// Atomic subshell a reaction is tied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Subshell {
    /// The reaction is not associated with a specific subshell.
    #[default]
    Unknown,
    /// ENDF subshell designator (1 = K, 3 = L1, 5 = L2, ...).
    Designator(u32),
}

impl Subshell {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Subshell::Unknown)
    }
}

/// What a reaction does to the particle once it has been selected.
///
/// Each kind fixes the meaning of the sampled secondary value and how many
/// particles the reaction emits. Everything else is shared by [`Reaction`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ReactionKind {
    /// Removes the particle; has no secondary distribution.
    Absorption,
    /// Secondary is the scattering cosine; the energy is unchanged. Covers
    /// cutoff, hybrid and moment-preserving tables alike.
    ElasticScatter,
    /// Secondary is the energy lost to the atom.
    AtomicExcitation,
    /// Secondary is the energy gained from the atom.
    AdjointAtomicExcitation,
    /// Secondary is the emitted photon energy.
    Bremsstrahlung { emit_photon: bool },
    /// Secondary is the energy gained.
    AdjointBremsstrahlung,
    /// Secondary is the knock-on electron energy. The primary also loses
    /// the subshell binding energy.
    Electroionization {
        binding_energy: f64,
        emit_knock_on: bool,
    },
    /// Secondary is the scattering cosine; the energy is unchanged.
    CoherentScatter,
    /// Secondary is the scattering cosine; the energy follows Compton kinematics.
    IncoherentScatter,
}

impl ReactionKind {
    pub fn requires_distribution(&self) -> bool {
        !matches!(self, ReactionKind::Absorption)
    }

    pub fn emitted_photons(&self) -> u32 {
        match self {
            ReactionKind::Bremsstrahlung { emit_photon: true } => 1,
            _ => 0,
        }
    }

    pub fn emitted_electrons(&self) -> u32 {
        match self {
            ReactionKind::Electroionization {
                emit_knock_on: true,
                ..
            } => 1,
            _ => 0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReactionKind::Absorption => "absorption",
            ReactionKind::ElasticScatter => "elastic",
            ReactionKind::AtomicExcitation => "atomic_excitation",
            ReactionKind::AdjointAtomicExcitation => "adjoint_atomic_excitation",
            ReactionKind::Bremsstrahlung { .. } => "bremsstrahlung",
            ReactionKind::AdjointBremsstrahlung => "adjoint_bremsstrahlung",
            ReactionKind::Electroionization { .. } => "electroionization",
            ReactionKind::CoherentScatter => "coherent",
            ReactionKind::IncoherentScatter => "incoherent",
        }
    }
}

/// One interaction channel: a cross section, an optional secondary
/// distribution and the kind that says how the particle changes.
///
/// Tables are shared through `Arc` and never modified, so a `Reaction` can
/// be used from any number of histories at once. All per-history state lives
/// in the particle, the bank and the random number stream passed to
/// [`react`](Reaction::react).
#[derive(Debug, Clone)]
pub struct Reaction {
    kind: ReactionKind,
    subshell: Subshell,
    cross_section: Arc<ThresholdIndexedTable>,
    distribution: Option<Arc<TabularSecondaryDistribution>>,
}

impl Reaction {
    pub fn new(
        kind: ReactionKind,
        cross_section: Arc<ThresholdIndexedTable>,
        distribution: Option<Arc<TabularSecondaryDistribution>>,
    ) -> Result<Self> {
        match (&distribution, kind.requires_distribution()) {
            (None, true) => {
                return Err(TableError::Construction(format!(
                    "{} reaction needs a secondary distribution",
                    kind.label()
                )))
            }
            (Some(_), false) => {
                return Err(TableError::Construction(format!(
                    "{} reaction takes no secondary distribution",
                    kind.label()
                )))
            }
            _ => {}
        }

        if let ReactionKind::Electroionization { binding_energy, .. } = kind {
            if !binding_energy.is_finite() || binding_energy < 0.0 {
                return Err(TableError::Construction(format!(
                    "binding energy {} is not a non-negative finite number",
                    binding_energy
                )));
            }
        }

        if let Some(dist) = &distribution {
            let threshold = cross_section.threshold_energy();
            let max = cross_section.max_energy();
            if dist.lower_bound_of_primary() > threshold || dist.upper_bound_of_primary() < max {
                return Err(TableError::Construction(format!(
                    "{} distribution covers [{}, {}] but the cross section is active on [{}, {}]",
                    kind.label(),
                    dist.lower_bound_of_primary(),
                    dist.upper_bound_of_primary(),
                    threshold,
                    max
                )));
            }
        }

        Ok(Reaction {
            kind,
            subshell: Subshell::Unknown,
            cross_section,
            distribution,
        })
    }

    pub fn with_subshell(mut self, subshell: Subshell) -> Self {
        self.subshell = subshell;
        self
    }

    pub fn kind(&self) -> ReactionKind {
        self.kind
    }

    pub fn subshell(&self) -> Subshell {
        self.subshell
    }

    pub fn cross_section_table(&self) -> &Arc<ThresholdIndexedTable> {
        &self.cross_section
    }

    pub fn distribution(&self) -> Option<&Arc<TabularSecondaryDistribution>> {
        self.distribution.as_ref()
    }

    #[inline]
    pub fn threshold_energy(&self) -> f64 {
        self.cross_section.threshold_energy()
    }

    #[inline]
    pub fn max_energy(&self) -> f64 {
        self.cross_section.max_energy()
    }

    /// Cross section in barns; exactly zero below the threshold energy.
    #[inline]
    pub fn cross_section(&self, energy: f64) -> Result<f64> {
        self.cross_section.evaluate(energy)
    }

    /// Cross section at `energy` in bin `bin` of the table's grid; an
    /// `OutOfRange` error when the bin does not hold `energy`.
    #[inline]
    pub fn cross_section_in_bin(&self, energy: f64, bin: usize) -> Result<f64> {
        self.cross_section.evaluate_in_bin(energy, bin)
    }

    pub fn number_of_emitted_photons(&self, energy: f64) -> Result<u32> {
        Ok(if self.cross_section(energy)? > 0.0 {
            self.kind.emitted_photons()
        } else {
            0
        })
    }

    pub fn number_of_emitted_electrons(&self, energy: f64) -> Result<u32> {
        Ok(if self.cross_section(energy)? > 0.0 {
            self.kind.emitted_electrons()
        } else {
            0
        })
    }

    /// Particles banked per interaction at `energy`; zero where the reaction
    /// cannot occur.
    pub fn number_of_emitted_secondaries(&self, energy: f64) -> Result<u32> {
        Ok(self.number_of_emitted_photons(energy)? + self.number_of_emitted_electrons(energy)?)
    }

    fn sample_secondary<R: Rng + ?Sized>(&self, energy: f64, rng: &mut R) -> Result<f64> {
        match &self.distribution {
            Some(dist) => dist.sample(energy, rng),
            None => Err(TableError::Construction(format!(
                "{} reaction has no secondary distribution",
                self.kind.label()
            ))),
        }
    }

    /// Carry out the reaction on `particle`.
    ///
    /// Updates the particle in place, pushes any emitted particles onto
    /// `bank` and returns the subshell the reaction is tied to. The particle
    /// energy must lie in `[threshold_energy(), max_energy()]`. On error the
    /// particle and the bank are left as they were.
    pub fn react<R: Rng + ?Sized>(
        &self,
        particle: &mut Particle,
        bank: &mut ParticleBank,
        rng: &mut R,
    ) -> Result<Subshell> {
        let energy = particle.energy;
        let (threshold, max) = (self.threshold_energy(), self.max_energy());
        if !(energy >= threshold && energy <= max) {
            return Err(TableError::out_of_range(energy, threshold, max));
        }

        match self.kind {
            ReactionKind::Absorption => {
                particle.alive = false;
            }
            ReactionKind::ElasticScatter | ReactionKind::CoherentScatter => {
                let mu = self.sample_secondary(energy, rng)?;
                let phi = sample_azimuthal_angle(rng);
                particle.rotate(mu, phi);
            }
            ReactionKind::IncoherentScatter => {
                let mu = self.sample_secondary(energy, rng)?;
                let phi = sample_azimuthal_angle(rng);
                particle.rotate(mu, phi);
                particle.set_energy(compton_scattered_energy(energy, mu));
            }
            ReactionKind::AtomicExcitation => {
                let loss = self.sample_secondary(energy, rng)?;
                particle.set_energy(energy - loss);
            }
            ReactionKind::AdjointAtomicExcitation | ReactionKind::AdjointBremsstrahlung => {
                let gain = self.sample_secondary(energy, rng)?;
                particle.set_energy(energy + gain);
            }
            ReactionKind::Bremsstrahlung { emit_photon } => {
                let photon_energy = self.sample_secondary(energy, rng)?;
                if emit_photon {
                    let mu = dipole_photon_cosine(energy, rng.gen::<f64>());
                    let phi = sample_azimuthal_angle(rng);
                    let direction = rotate_direction(&particle.direction, mu, phi);
                    bank.push(particle.secondary(
                        ParticleType::Photon,
                        photon_energy,
                        direction,
                    ));
                }
                particle.set_energy(energy - photon_energy);
            }
            ReactionKind::Electroionization {
                binding_energy,
                emit_knock_on,
            } => {
                let knock_on_energy = self.sample_secondary(energy, rng)?;
                let available = energy - binding_energy;
                if !(knock_on_energy >= 0.0 && knock_on_energy <= available) {
                    return Err(TableError::out_of_range(knock_on_energy, 0.0, available));
                }
                let outgoing_energy = available - knock_on_energy;
                let phi = sample_azimuthal_angle(rng);

                if emit_knock_on && knock_on_energy > 0.0 {
                    let mu = binary_collision_cosine(energy, knock_on_energy);
                    let direction = rotate_direction(&particle.direction, mu, phi + PI);
                    bank.push(particle.secondary(
                        ParticleType::Electron,
                        knock_on_energy,
                        direction,
                    ));
                }
                if outgoing_energy > 0.0 {
                    particle.rotate(binary_collision_cosine(energy, outgoing_energy), phi);
                }
                particle.set_energy(outgoing_energy);
            }
        }

        particle.collision_number += 1;
        Ok(self.subshell)
    }
}
