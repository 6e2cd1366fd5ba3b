//! Scalar observables of a particle configuration.

use nalgebra::{DMatrix, DVector};
use tracing::warn;

use crate::error::{Degeneracy, Quantity};
use crate::geometry::{minimum_image, PairGeometry};
use crate::pairs::PairIndex;
use crate::potential::Potential;
use crate::thermostat::temperature;

/// Mean kinetic energy per particle, `0.5 * m * <v·v>`.
pub fn mean_kinetic_energy(velocities: &DMatrix<f64>, mass: f64) -> f64 {
    let n = velocities.ncols();
    if n == 0 {
        return 0.0;
    }
    0.5 * mass * velocities.norm_squared() / n as f64
}

/// Total pair potential of the pairs in `geometry`, divided by `n_particles`.
pub fn mean_potential_energy<P: Potential + ?Sized>(
    geometry: &PairGeometry,
    potential: &P,
    pairs: &PairIndex,
    n_particles: usize,
) -> Result<f64, Degeneracy> {
    let mut total = 0.0;
    for (&k, &r) in geometry.selected_pairs.iter().zip(&geometry.distances) {
        let v = potential.potential(r);
        if !v.is_finite() {
            let (a, b) = pairs.pair(k);
            return Err(Degeneracy {
                pair: k,
                a,
                b,
                quantity: Quantity::Potential,
                distance: r,
            });
        }
        total += v;
    }
    Ok(total / n_particles as f64)
}

/// Energies and temperature of one configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Energies {
    pub mean_ke: f64,
    pub mean_pe: f64,
    pub temperature: f64,
}

impl Energies {
    pub fn total(&self) -> f64 {
        self.mean_ke + self.mean_pe
    }
}

/// Recomputes [`Energies`] from a configuration with fixed mass and `k_B`.
#[derive(Debug, Clone, Copy)]
pub struct EnergyTracker {
    pub mass: f64,
    pub k_boltzmann: f64,
}

impl EnergyTracker {
    pub fn new(mass: f64, k_boltzmann: f64) -> Self {
        EnergyTracker { mass, k_boltzmann }
    }

    pub fn measure<P: Potential + ?Sized>(
        &self,
        velocities: &DMatrix<f64>,
        geometry: &PairGeometry,
        potential: &P,
        pairs: &PairIndex,
    ) -> Result<Energies, Degeneracy> {
        let mean_ke = mean_kinetic_energy(velocities, self.mass);
        let mean_pe =
            mean_potential_energy(geometry, potential, pairs, velocities.ncols())?;
        Ok(Energies {
            mean_ke,
            mean_pe,
            temperature: temperature(mean_ke, self.k_boltzmann),
        })
    }
}

/// Total momentum, one component per axis.
pub fn total_momentum(velocities: &DMatrix<f64>, mass: f64) -> DVector<f64> {
    velocities.column_sum() * mass
}

/// Centre of mass of equal-mass particles.
///
/// There is no unique centre in a periodic box, so `None` is returned there.
pub fn center_of_mass(positions: &DMatrix<f64>, periodic: bool) -> Option<DVector<f64>> {
    if periodic {
        warn!("Centre of mass is not defined under periodic boundaries");
        return None;
    }
    if positions.ncols() == 0 {
        return None;
    }
    Some(positions.column_mean())
}

/// Root mean square distance of the particles from their mean position.
///
/// Under periodic boundaries each offset is minimum-image corrected against
/// the arithmetic mean of the stored coordinates.
pub fn radius_of_gyration(positions: &DMatrix<f64>, box_length: f64, periodic: bool) -> f64 {
    let n = positions.ncols();
    if n == 0 {
        return 0.0;
    }
    let center = positions.column_mean();
    let mut sum_sq = 0.0;
    for column in positions.column_iter() {
        for (&x, &c) in column.iter().zip(center.iter()) {
            let mut dx = x - c;
            if periodic {
                dx = minimum_image(dx, box_length);
            }
            sum_sq += dx * dx;
        }
    }
    (sum_sq / n as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::compute_distances;
    use crate::potential::{Harmonic, LennardJones};
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_kinetic_energy() {
        // |v|^2 = 1, 4 and 25
        let v = DMatrix::from_row_slice(2, 3, &[1.0, 0.0, 3.0, 0.0, 2.0, 4.0]);
        assert_relative_eq!(mean_kinetic_energy(&v, 2.0), 10.0);
    }

    #[test]
    fn test_mean_potential_energy_per_particle() {
        let positions = DMatrix::from_row_slice(1, 3, &[0.0, 1.0, 3.0]);
        let pairs = PairIndex::build(3).unwrap();
        let geom = compute_distances(&positions, &pairs, 100.0, false, None).unwrap();
        let pe = mean_potential_energy(&geom, &Harmonic::new(2.0, 0.0), &pairs, 3).unwrap();
        // (1 + 9 + 4) / 3
        assert_relative_eq!(pe, 14.0 / 3.0);
    }

    #[test]
    fn test_energy_tracker_measures_temperature() {
        let positions = DMatrix::from_row_slice(1, 2, &[0.0, 2f64.powf(1.0 / 6.0)]);
        let velocities = DMatrix::from_row_slice(1, 2, &[1.0, -1.0]);
        let pairs = PairIndex::build(2).unwrap();
        let geom = compute_distances(&positions, &pairs, 10.0, false, None).unwrap();

        let energies = EnergyTracker::new(1.0, 1.0)
            .measure(&velocities, &geom, &LennardJones::new(1.0, 1.0), &pairs)
            .unwrap();
        assert_relative_eq!(energies.mean_ke, 0.5);
        assert_relative_eq!(energies.mean_pe, -0.5, epsilon = 1e-12);
        assert_relative_eq!(energies.temperature, 1.0 / 3.0);
        assert_relative_eq!(energies.total(), 0.0, epsilon = 1e-12);
    }

    struct Singular;

    impl Potential for Singular {
        fn force(&self, _r: f64) -> f64 {
            0.0
        }
        fn potential(&self, r: f64) -> f64 {
            (r - 2.0).ln()
        }
    }

    #[test]
    fn test_non_finite_potential_is_reported() {
        let positions = DMatrix::from_row_slice(1, 2, &[0.0, 1.0]);
        let pairs = PairIndex::build(2).unwrap();
        let geom = compute_distances(&positions, &pairs, 10.0, false, None).unwrap();
        let err = mean_potential_energy(&geom, &Singular, &pairs, 2).unwrap_err();
        assert_eq!(err.quantity, Quantity::Potential);
        assert_eq!((err.a, err.b), (0, 1));
    }

    #[test]
    fn test_center_of_mass_and_gyration() {
        let positions = DMatrix::from_row_slice(2, 2, &[1.0, 3.0, 2.0, 2.0]);
        let com = center_of_mass(&positions, false).unwrap();
        assert_relative_eq!(com[0], 2.0);
        assert_relative_eq!(com[1], 2.0);
        assert!(center_of_mass(&positions, true).is_none());
        assert_relative_eq!(radius_of_gyration(&positions, 10.0, false), 1.0);
    }

    #[test]
    fn test_gyration_uses_minimum_image() {
        // mean is 11/3, so 9.5 sits more than half a box away from it
        let positions = DMatrix::from_row_slice(1, 3, &[0.5, 1.0, 9.5]);
        assert_relative_eq!(
            radius_of_gyration(&positions, 10.0, false),
            (1842.0f64 / 108.0).sqrt(),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            radius_of_gyration(&positions, 10.0, true),
            11.5f64.sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_total_momentum() {
        let v = DMatrix::from_row_slice(2, 2, &[1.0, -3.0, 2.0, 0.5]);
        let p = total_momentum(&v, 2.0);
        assert_relative_eq!(p[0], -4.0);
        assert_relative_eq!(p[1], 5.0);
    }
}
