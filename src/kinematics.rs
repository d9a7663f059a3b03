// Two-body kinematics shared by the reaction kinds

use nalgebra::Vector3;
use rand::Rng;

/// Electron rest mass energy in MeV (CODATA 2018)
pub const ELECTRON_REST_MASS_ENERGY: f64 = 0.51099895;

/// Rotate a direction to a new one with cosine `mu` relative to it and
/// azimuth `phi` around it.
pub fn rotate_direction_3d(u_old: &Vector3<f64>, mu: f64, phi: f64) -> Vector3<f64> {
    let sin_theta = (1.0 - mu * mu).max(0.0).sqrt();

    // Find a perpendicular vector to u_old
    let perp = if u_old.x.abs() < 0.99 {
        Vector3::new(1.0, 0.0, 0.0).cross(u_old).normalize()
    } else {
        Vector3::new(0.0, 1.0, 0.0).cross(u_old).normalize()
    };
    let ortho = u_old.cross(&perp);

    mu * u_old + sin_theta * phi.cos() * perp + sin_theta * phi.sin() * ortho
}

pub fn rotate_direction(direction: &[f64; 3], mu: f64, phi: f64) -> [f64; 3] {
    let u = Vector3::from_row_slice(direction);
    let rotated = rotate_direction_3d(&u, mu, phi).normalize();
    [rotated.x, rotated.y, rotated.z]
}

#[inline]
pub fn sample_azimuthal_angle<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    2.0 * std::f64::consts::PI * rng.gen::<f64>()
}

/// Cosine between an incoming electron of `incoming_energy` and a free
/// electron leaving a binary collision with `outgoing_energy`.
pub fn binary_collision_cosine(incoming_energy: f64, outgoing_energy: f64) -> f64 {
    let ratio = outgoing_energy / incoming_energy;
    let scaled = incoming_energy / ELECTRON_REST_MASS_ENERGY;
    (ratio * (scaled + 2.0) / (ratio * scaled + 2.0)).max(0.0).sqrt().min(1.0)
}

/// Energy of a photon after Compton scattering through cosine `mu` off a
/// free electron at rest.
#[inline]
pub fn compton_scattered_energy(energy: f64, mu: f64) -> f64 {
    energy / (1.0 + energy / ELECTRON_REST_MASS_ENERGY * (1.0 - mu))
}

/// Dipole (Tsai) emission cosine of a bremsstrahlung photon relative to an
/// electron of kinetic `energy`, for a random number `u`.
pub fn dipole_photon_cosine(energy: f64, u: f64) -> f64 {
    let total = energy + ELECTRON_REST_MASS_ENERGY;
    let beta = (energy * (energy + 2.0 * ELECTRON_REST_MASS_ENERGY)).sqrt() / total;
    let scaled = 2.0 * u - 1.0;
    (scaled + beta) / (scaled * beta + 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn norm(v: &[f64; 3]) -> f64 {
        (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
    }

    #[test]
    fn test_rotation_keeps_cosine_and_norm() {
        for dir in [[0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.6, 0.0, 0.8]] {
            for (mu, phi) in [(0.5, 0.3), (-0.9, 2.0), (1.0, 1.0), (-1.0, 4.0)] {
                let out = rotate_direction(&dir, mu, phi);
                assert_relative_eq!(norm(&out), 1.0, epsilon = 1e-12);
                let cosine = out[0] * dir[0] + out[1] * dir[1] + out[2] * dir[2];
                assert_relative_eq!(cosine, mu, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_binary_collision_limits() {
        // all energy transferred: forward
        assert_relative_eq!(binary_collision_cosine(1.0, 1.0), 1.0);
        assert_eq!(binary_collision_cosine(1.0, 0.0), 0.0);
        let mu = binary_collision_cosine(1.0, 0.25);
        assert!(mu > 0.0 && mu < 1.0);
    }

    #[test]
    fn test_compton_energy() {
        assert_eq!(compton_scattered_energy(1.0, 1.0), 1.0);
        let back = compton_scattered_energy(ELECTRON_REST_MASS_ENERGY, -1.0);
        assert_relative_eq!(back, ELECTRON_REST_MASS_ENERGY / 3.0, max_relative = 1e-12);
    }

    #[test]
    fn test_dipole_cosine_range() {
        assert_relative_eq!(dipole_photon_cosine(1.0, 0.0), -1.0, epsilon = 1e-12);
        assert_relative_eq!(dipole_photon_cosine(1.0, 1.0), 1.0, epsilon = 1e-12);
        let mu = dipole_photon_cosine(10.0, 0.5);
        let total = 10.0 + ELECTRON_REST_MASS_ENERGY;
        let beta = (10.0f64 * (10.0 + 2.0 * ELECTRON_REST_MASS_ENERGY)).sqrt() / total;
        assert_relative_eq!(mu, beta, max_relative = 1e-12);
    }
}
