use itertools::izip;
use nalgebra::DMatrix;

use crate::error::{Degeneracy, Quantity};
use crate::geometry::{compute_distances, Cutoff, PairGeometry};
use crate::pairs::PairIndex;
use crate::potential::Potential;

/// Something that can turn particle positions into accelerations.
pub trait ForceField {
    fn accelerations(&mut self, positions: &DMatrix<f64>) -> Result<DMatrix<f64>, Degeneracy>;
}

/// Brute-force pair forces over every pair of a [`PairIndex`].
///
/// Keeps the geometry of the most recent evaluation so energies can be
/// computed from the same pairs without another distance pass.
pub struct PairForces<'a, P: Potential + ?Sized> {
    pub pairs: &'a PairIndex,
    pub potential: &'a P,
    pub mass: f64,
    pub box_length: f64,
    pub periodic: bool,
    pub cutoff: Option<Cutoff>,
    last_geometry: Option<PairGeometry>,
}

impl<'a, P: Potential + ?Sized> PairForces<'a, P> {
    pub fn new(
        pairs: &'a PairIndex,
        potential: &'a P,
        mass: f64,
        box_length: f64,
        periodic: bool,
        cutoff: Option<Cutoff>,
    ) -> Self {
        PairForces {
            pairs,
            potential,
            mass,
            box_length,
            periodic,
            cutoff,
            last_geometry: None,
        }
    }

    pub fn geometry(&mut self, positions: &DMatrix<f64>) -> Result<&PairGeometry, Degeneracy> {
        let geometry = compute_distances(
            positions,
            self.pairs,
            self.box_length,
            self.periodic,
            self.cutoff,
        )?;
        Ok(self.last_geometry.insert(geometry))
    }

    pub fn last_geometry(&self) -> Option<&PairGeometry> {
        self.last_geometry.as_ref()
    }

    pub fn into_last_geometry(self) -> Option<PairGeometry> {
        self.last_geometry
    }
}

impl<P: Potential + ?Sized> ForceField for PairForces<'_, P> {
    fn accelerations(&mut self, positions: &DMatrix<f64>) -> Result<DMatrix<f64>, Degeneracy> {
        let (ndim, n_particles) = positions.shape();
        let (potential, mass, pairs) = (self.potential, self.mass, self.pairs);
        let geometry = self.geometry(positions)?;
        compute_accelerations(geometry, potential, mass, pairs, n_particles, ndim)
    }
}

/// Turn the pair forces of `geometry` into per-particle accelerations.
///
/// Every selected pair contributes `unit * force(r) / mass` to its first
/// member and the opposite amount to its second member. Contributions are
/// summed into an owned `[ndim, n_particles]` array indexed by particle id,
/// so particles that only ever appear as the second member of a pair still
/// receive their full share.
pub fn compute_accelerations<P: Potential + ?Sized>(
    geometry: &PairGeometry,
    potential: &P,
    mass: f64,
    pairs: &PairIndex,
    n_particles: usize,
    ndim: usize,
) -> Result<DMatrix<f64>, Degeneracy> {
    let mut acc = DMatrix::<f64>::zeros(ndim, n_particles);
    let inv_mass = 1.0 / mass;

    for (s, (&k, &r)) in izip!(&geometry.selected_pairs, &geometry.distances).enumerate() {
        let (a, b) = pairs.pair(k);
        let f_mag = potential.force(r);
        if !f_mag.is_finite() {
            return Err(Degeneracy {
                pair: k,
                a,
                b,
                quantity: Quantity::Force,
                distance: r,
            });
        }

        let scale = f_mag * inv_mass;
        let unit = geometry.unit_vectors.column(s);
        for d in 0..ndim {
            let contrib = unit[d] * scale;
            acc[(d, a)] += contrib;
            acc[(d, b)] -= contrib;
        }
    }

    Ok(acc)
}
