//! Initial-state generators and run-setup heuristics.

use std::f64::consts::PI;

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};

use crate::error::ConfigError;
use crate::observables::mean_kinetic_energy;
use crate::thermostat::temperature;

/// Place `n_particles` on a simple cubic lattice filling a box of side `box_length`.
///
/// The lattice has the smallest number of sites per side that fits every
/// particle; sites sit at the cell centres and are filled in row-major order,
/// so the last layer may be partially occupied.
pub fn simple_cubic(ndim: usize, n_particles: usize, box_length: f64) -> DMatrix<f64> {
    let per_side = sites_per_side(ndim, n_particles);
    let spacing = box_length / per_side as f64;

    let mut positions = DMatrix::zeros(ndim, n_particles);
    for (p, mut column) in positions.column_iter_mut().enumerate() {
        let mut index = p;
        for d in (0..ndim).rev() {
            column[d] = (index % per_side) as f64 * spacing + 0.5 * spacing;
            index /= per_side;
        }
    }
    positions
}

fn sites_per_side(ndim: usize, n_particles: usize) -> usize {
    let mut k = (n_particles as f64).powf(1.0 / ndim as f64).round().max(1.0) as usize;
    while k.checked_pow(ndim as u32).is_some_and(|sites| sites < n_particles) {
        k += 1;
    }
    while k > 1 && (k - 1).pow(ndim as u32) >= n_particles {
        k -= 1;
    }
    k
}

/// Maxwell-Boltzmann velocities at `target_temperature`.
///
/// Components are drawn from a normal distribution with variance `kB T / m`,
/// the centre-of-mass drift is removed and the result is rescaled so that
/// [`temperature`] reports exactly the target. A `None` seed draws from
/// system entropy.
pub fn maxwell_boltzmann(
    ndim: usize,
    n_particles: usize,
    mass: f64,
    target_temperature: f64,
    k_boltzmann: f64,
    seed: Option<u64>,
) -> DMatrix<f64> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let sigma = (k_boltzmann * target_temperature / mass).sqrt();

    let mut velocities = DMatrix::from_fn(ndim, n_particles, |_, _| {
        let z: f64 = StandardNormal.sample(&mut rng);
        z * sigma
    });

    if n_particles > 1 {
        let drift = velocities.column_mean();
        for mut column in velocities.column_iter_mut() {
            column -= &drift;
        }
    }

    let current = temperature(mean_kinetic_energy(&velocities, mass), k_boltzmann);
    if current > 0.0 {
        velocities *= (target_temperature / current).sqrt();
    }
    velocities
}

/// Integration timestep for particles of `radius` moving at `mean_speed`:
/// one twentieth of the time needed to cross a radius.
pub fn suggest_timestep(radius: f64, mean_speed: f64) -> f64 {
    if mean_speed > 0.0 {
        0.05 * radius / mean_speed
    } else {
        0.05 * radius
    }
}

/// Mean particle speed, the average of the column norms.
pub fn mean_speed(velocities: &DMatrix<f64>) -> f64 {
    let n = velocities.ncols();
    if n == 0 {
        return 0.0;
    }
    velocities.column_iter().map(|v| v.norm()).sum::<f64>() / n as f64
}

/// Volume of a `ndim`-dimensional ball of radius `radius`.
pub fn ball_volume(ndim: usize, radius: f64) -> f64 {
    // V_0 = 1, V_1 = 2r, V_d = V_{d-2} * 2 pi r^2 / d
    let mut volume = if ndim % 2 == 0 { 1.0 } else { 2.0 * radius };
    let mut d = if ndim % 2 == 0 { 2 } else { 3 };
    while d <= ndim {
        volume *= 2.0 * PI * radius * radius / d as f64;
        d += 2;
    }
    volume
}

/// Side of the cubic box in which `n_particles` spheres of `radius`
/// occupy the given volume fraction.
pub fn box_length_for_volume_fraction(
    ndim: usize,
    n_particles: usize,
    radius: f64,
    volume_fraction: f64,
) -> Result<f64, ConfigError> {
    if !(volume_fraction > 0.0 && volume_fraction <= 1.0) {
        return Err(ConfigError::VolumeFraction(volume_fraction));
    }
    if ndim == 0 {
        return Err(ConfigError::NoDimensions);
    }
    let occupied = n_particles as f64 * ball_volume(ndim, radius);
    Ok((occupied / volume_fraction).powf(1.0 / ndim as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observables::total_momentum;
    use approx::assert_relative_eq;

    #[test]
    fn test_simple_cubic_fills_box() {
        let positions = simple_cubic(3, 27, 6.0);
        assert_eq!(positions.shape(), (3, 27));
        for &x in positions.iter() {
            assert!(x > 0.0 && x < 6.0);
        }
        // first two sites differ by one lattice spacing along the last axis
        assert_relative_eq!(positions[(2, 1)] - positions[(2, 0)], 2.0);
        assert_relative_eq!(positions[(0, 0)], 1.0);
    }

    #[test]
    fn test_simple_cubic_partial_lattice() {
        assert_eq!(sites_per_side(2, 5), 3);
        assert_eq!(sites_per_side(3, 8), 2);
        assert_eq!(sites_per_side(1, 4), 4);

        let positions = simple_cubic(2, 5, 3.0);
        for i in 0..5 {
            for j in (i + 1)..5 {
                let d = (positions.column(i) - positions.column(j)).norm();
                assert!(d >= 1.0 - 1e-12);
            }
        }
    }

    #[test]
    fn test_maxwell_boltzmann_hits_target() {
        let v = maxwell_boltzmann(3, 64, 2.0, 1.5, 1.0, Some(42));
        assert_eq!(v.shape(), (3, 64));
        assert_relative_eq!(
            temperature(mean_kinetic_energy(&v, 2.0), 1.0),
            1.5,
            epsilon = 1e-10
        );
        assert!(total_momentum(&v, 2.0).norm() < 1e-10);
    }

    #[test]
    fn test_maxwell_boltzmann_is_reproducible() {
        let a = maxwell_boltzmann(2, 10, 1.0, 1.0, 1.0, Some(7));
        let b = maxwell_boltzmann(2, 10, 1.0, 1.0, 1.0, Some(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_cold_start_has_no_motion() {
        let v = maxwell_boltzmann(3, 8, 1.0, 0.0, 1.0, Some(1));
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_timestep_heuristic() {
        assert_relative_eq!(suggest_timestep(0.5, 2.0), 0.0125);
        assert_relative_eq!(suggest_timestep(0.5, 0.0), 0.025);
        let v = DMatrix::from_row_slice(2, 2, &[3.0, 0.0, 4.0, 2.0]);
        assert_relative_eq!(mean_speed(&v), 3.5);
    }

    #[test]
    fn test_volume_fraction_box() {
        assert_relative_eq!(ball_volume(2, 1.0), PI);
        assert_relative_eq!(ball_volume(3, 1.0), 4.0 / 3.0 * PI);
        let l = box_length_for_volume_fraction(1, 10, 0.5, 0.5).unwrap();
        assert_relative_eq!(l, 20.0);
        assert!(box_length_for_volume_fraction(3, 10, 0.5, 0.0).is_err());
    }
}
