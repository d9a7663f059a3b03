// Secondaries waiting to be transported in one history
//
// Reactions push emitted photons and electrons here. The bank also keeps a
// running count of everything a history emitted, so a caller can check
// secondary yields without walking the queue.

use crate::particle::{Particle, ParticleType};
use std::collections::VecDeque;

const PARTICLE_TYPES: usize = 5;

fn slot(particle_type: ParticleType) -> usize {
    match particle_type {
        ParticleType::Photon => 0,
        ParticleType::Electron => 1,
        ParticleType::Positron => 2,
        ParticleType::AdjointPhoton => 3,
        ParticleType::AdjointElectron => 4,
    }
}

/// First-in first-out store of particles owned by one history.
///
/// Source particles (generation 0) are queued but not counted as emitted.
#[derive(Debug, Clone, Default)]
pub struct ParticleBank {
    pending: VecDeque<Particle>,
    emitted: [usize; PARTICLE_TYPES],
    deepest_generation: u32,
}

impl ParticleBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        ParticleBank {
            pending: VecDeque::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Queue `particle`. Anything past generation 0 counts as emitted.
    pub fn push(&mut self, particle: Particle) {
        if particle.generation > 0 {
            self.emitted[slot(particle.particle_type)] += 1;
            self.deepest_generation = self.deepest_generation.max(particle.generation);
        }
        self.pending.push_back(particle);
    }

    /// Oldest queued particle, or None once the history is finished.
    pub fn pop_next(&mut self) -> Option<Particle> {
        self.pending.pop_front()
    }

    /// Most recently queued particle.
    pub fn last_banked(&self) -> Option<&Particle> {
        self.pending.back()
    }

    pub fn pending(&self) -> impl Iterator<Item = &Particle> {
        self.pending.iter()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Particles of `particle_type` emitted so far, popped or not.
    pub fn emitted(&self, particle_type: ParticleType) -> usize {
        self.emitted[slot(particle_type)]
    }

    pub fn total_emitted(&self) -> usize {
        self.emitted.iter().sum()
    }

    /// Highest generation ever queued; 0 while only source particles were.
    pub fn deepest_generation(&self) -> u32 {
        self.deepest_generation
    }

    /// Drop queued particles below `cutoff` and return how many went.
    /// Emission counts are kept.
    pub fn discard_below(&mut self, cutoff: f64) -> usize {
        let before = self.pending.len();
        self.pending.retain(|p| p.energy >= cutoff);
        let discarded = before - self.pending.len();
        if discarded > 0 {
            log::trace!("discarded {} banked particles below {} MeV", discarded, cutoff);
        }
        discarded
    }

    /// Empty the bank for the next history.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.emitted = [0; PARTICLE_TYPES];
        self.deepest_generation = 0;
    }
}
