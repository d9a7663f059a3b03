// Competition between the reactions available to a particle
use crate::bank::ParticleBank;
use crate::error::Result;
use crate::particle::Particle;
use crate::reaction::{Reaction, Subshell};
use rand::Rng;

/// Result of one collision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollisionOutcome {
    /// Every reaction has zero cross section at the particle's energy; the
    /// particle is left unchanged.
    NoInteraction,
    /// The reaction at `reaction` in the set was carried out.
    Interacted { reaction: usize, subshell: Subshell },
}

/// A homogeneous collection of reactions of any kind, sampled in
/// proportion to their cross sections.
#[derive(Debug, Clone, Default)]
pub struct ReactionSet {
    reactions: Vec<Reaction>,
}

impl ReactionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, reaction: Reaction) {
        self.reactions.push(reaction);
    }

    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    pub fn len(&self) -> usize {
        self.reactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reactions.is_empty()
    }

    pub fn total_cross_section(&self, energy: f64) -> Result<f64> {
        let mut total = 0.0;
        for reaction in &self.reactions {
            total += reaction.cross_section(energy)?;
        }
        Ok(total)
    }

    /// Index of a reaction chosen with probability proportional to its cross
    /// section, or None when no reaction can occur at `energy`.
    ///
    /// Draws one random number when the total cross section is positive and
    /// none otherwise.
    pub fn sample_reaction<R: Rng + ?Sized>(&self, energy: f64, rng: &mut R) -> Result<Option<usize>> {
        let cross_sections = self
            .reactions
            .iter()
            .map(|reaction| reaction.cross_section(energy))
            .collect::<Result<Vec<f64>>>()?;
        let total: f64 = cross_sections.iter().sum();
        if total <= 0.0 {
            return Ok(None);
        }

        let xi = rng.gen::<f64>() * total;
        let mut accum = 0.0;
        let mut last_active = None;
        for (index, &xs) in cross_sections.iter().enumerate() {
            if xs <= 0.0 {
                continue;
            }
            accum += xs;
            last_active = Some(index);
            if xi < accum {
                return Ok(Some(index));
            }
        }
        // xi can round up to the total
        Ok(last_active)
    }

    /// Select a reaction at the particle's energy and carry it out.
    pub fn collide<R: Rng + ?Sized>(
        &self,
        particle: &mut Particle,
        bank: &mut ParticleBank,
        rng: &mut R,
    ) -> Result<CollisionOutcome> {
        match self.sample_reaction(particle.energy, rng)? {
            None => Ok(CollisionOutcome::NoInteraction),
            Some(index) => {
                let subshell = self.reactions[index].react(particle, bank, rng)?;
                Ok(CollisionOutcome::Interacted {
                    reaction: index,
                    subshell,
                })
            }
        }
    }
}

impl FromIterator<Reaction> for ReactionSet {
    fn from_iter<I: IntoIterator<Item = Reaction>>(iter: I) -> Self {
        ReactionSet {
            reactions: iter.into_iter().collect(),
        }
    }
}
