use crate::kinematics::rotate_direction;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticleType {
    #[serde(rename = "photon")]
    Photon,
    #[serde(rename = "electron")]
    Electron,
    #[serde(rename = "positron")]
    Positron,
    #[serde(rename = "adjoint_photon")]
    AdjointPhoton,
    #[serde(rename = "adjoint_electron")]
    AdjointElectron,
}

/// State of one particle during a history. Energies are in MeV.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub particle_type: ParticleType,
    pub position: [f64; 3],
    pub direction: [f64; 3],
    pub energy: f64,
    pub alive: bool,
    /// 0 for source particles, parent + 1 for secondaries.
    pub generation: u32,
    pub collision_number: u32,
}

impl Particle {
    pub fn new(
        particle_type: ParticleType,
        position: [f64; 3],
        direction: [f64; 3],
        energy: f64,
    ) -> Self {
        Self {
            particle_type,
            position,
            direction,
            energy,
            alive: true,
            generation: 0,
            collision_number: 0,
        }
    }

    /// A new particle born at this particle's position.
    pub fn secondary(&self, particle_type: ParticleType, energy: f64, direction: [f64; 3]) -> Self {
        Self {
            particle_type,
            position: self.position,
            direction,
            energy,
            alive: true,
            generation: self.generation + 1,
            collision_number: 0,
        }
    }

    /// Set the energy, killing the particle when nothing is left.
    pub fn set_energy(&mut self, energy: f64) {
        if energy > 0.0 {
            self.energy = energy;
        } else {
            log::debug!(
                "{:?} killed with outgoing energy {} after {} collisions",
                self.particle_type,
                energy,
                self.collision_number
            );
            self.energy = 0.0;
            self.alive = false;
        }
    }

    /// Turn the direction by polar cosine `mu` and azimuth `phi`.
    pub fn rotate(&mut self, mu: f64, phi: f64) {
        self.direction = rotate_direction(&self.direction, mu, phi);
    }
}
