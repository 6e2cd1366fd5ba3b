//! Pairwise separations, minimum-image correction and cutoff selection.

use std::fmt;
use std::str::FromStr;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Degeneracy, Quantity};
use crate::pairs::PairIndex;

/// Which side of the cutoff radius a pair must be on to be kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CutoffMode {
    /// Keep pairs closer than the radius.
    #[default]
    Inside,
    /// Keep pairs further apart than the radius.
    Outside,
}

impl FromStr for CutoffMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "inside" => Ok(CutoffMode::Inside),
            "outside" => Ok(CutoffMode::Outside),
            _ => Err(ConfigError::UnknownCutoffMode(s.to_string())),
        }
    }
}

impl fmt::Display for CutoffMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CutoffMode::Inside => f.write_str("inside"),
            CutoffMode::Outside => f.write_str("outside"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cutoff {
    pub radius: f64,
    pub mode: CutoffMode,
}

impl Cutoff {
    pub fn inside(radius: f64) -> Self {
        Self {
            radius,
            mode: CutoffMode::Inside,
        }
    }

    pub fn outside(radius: f64) -> Self {
        Self {
            radius,
            mode: CutoffMode::Outside,
        }
    }

    #[inline]
    pub fn keeps(&self, distance: f64) -> bool {
        match self.mode {
            CutoffMode::Inside => distance < self.radius,
            CutoffMode::Outside => distance > self.radius,
        }
    }
}

/// Shortest periodic image of a single separation component.
#[inline]
pub fn minimum_image(component: f64, box_length: f64) -> f64 {
    component - box_length * (component / box_length).round()
}

/// Geometry of the pairs that survived selection, recomputed on every query.
///
/// `distances[s]` and `unit_vectors.column(s)` belong to pair
/// `selected_pairs[s]` of the [`PairIndex`] the geometry was built from. The
/// unit vectors point from the first member of a pair towards the second.
#[derive(Debug, Clone, PartialEq)]
pub struct PairGeometry {
    pub distances: Vec<f64>,
    pub unit_vectors: DMatrix<f64>,
    pub selected_pairs: Vec<usize>,
    pub mask: Vec<bool>,
}

impl PairGeometry {
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }
}

/// Compute separations for every pair in `pairs` and keep those accepted by
/// `cutoff` (all of them when no cutoff is given).
///
/// A selected pair at zero separation has no direction; it is reported as a
/// [`Degeneracy`] instead of producing NaN unit vectors.
pub fn compute_distances(
    positions: &DMatrix<f64>,
    pairs: &PairIndex,
    box_length: f64,
    periodic: bool,
    cutoff: Option<Cutoff>,
) -> Result<PairGeometry, Degeneracy> {
    let ndim = positions.nrows();
    let mut separation = DVector::<f64>::zeros(ndim);

    let mut distances = Vec::with_capacity(pairs.len());
    let mut units = Vec::with_capacity(pairs.len() * ndim);
    let mut selected_pairs = Vec::with_capacity(pairs.len());
    let mut mask = Vec::with_capacity(pairs.len());

    for (k, (a, b)) in pairs.iter().enumerate() {
        separation.copy_from(&positions.column(b));
        separation -= positions.column(a);
        if periodic {
            separation
                .iter_mut()
                .for_each(|d| *d = minimum_image(*d, box_length));
        }
        let distance = separation.norm();

        let keep = cutoff.map_or(true, |c| c.keeps(distance));
        mask.push(keep);
        if !keep {
            continue;
        }

        let degenerate = |quantity| Degeneracy {
            pair: k,
            a,
            b,
            quantity,
            distance,
        };
        if !(distance > 0.0) || !distance.is_finite() {
            return Err(degenerate(Quantity::Distance));
        }
        let start = units.len();
        units.extend(separation.iter().map(|d| d / distance));
        if units[start..].iter().any(|u| !u.is_finite()) {
            return Err(degenerate(Quantity::UnitVector));
        }

        distances.push(distance);
        selected_pairs.push(k);
    }

    let unit_vectors = DMatrix::from_vec(ndim, distances.len(), units);
    Ok(PairGeometry {
        distances,
        unit_vectors,
        selected_pairs,
        mask,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn line(xs: &[f64]) -> DMatrix<f64> {
        DMatrix::from_row_slice(1, xs.len(), xs)
    }

    #[test]
    fn test_minimum_image_idempotent() {
        let l = 10.0;
        for &d in &[-23.7, -9.9, -5.1, -0.3, 0.0, 0.3, 4.9, 5.1, 9.9, 17.2, 31.0] {
            let once = minimum_image(d, l);
            assert!(once.abs() <= 0.5 * l + 1e-12);
            assert_relative_eq!(minimum_image(once, l), once, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_minimum_image_across_the_box() {
        let positions = line(&[0.5, 9.5]);
        let pairs = PairIndex::build(2).unwrap();

        let periodic = compute_distances(&positions, &pairs, 10.0, true, None).unwrap();
        assert_relative_eq!(periodic.distances[0], 1.0, epsilon = 1e-12);
        // 9.5 - 0.5 wraps to -1, so the direction flips
        assert_relative_eq!(periodic.unit_vectors[(0, 0)], -1.0);

        let open = compute_distances(&positions, &pairs, 10.0, false, None).unwrap();
        assert_relative_eq!(open.distances[0], 9.0, epsilon = 1e-12);
        assert_relative_eq!(open.unit_vectors[(0, 0)], 1.0);
    }

    #[test]
    fn test_unit_vectors_point_from_first_to_second() {
        let positions = DMatrix::from_column_slice(2, 3, &[0.0, 0.0, 3.0, 4.0, 0.0, 2.0]);
        let pairs = PairIndex::build(3).unwrap();
        let geom = compute_distances(&positions, &pairs, 100.0, false, None).unwrap();

        assert_eq!(geom.selected_pairs, vec![0, 1, 2]);
        assert_relative_eq!(geom.distances[0], 5.0);
        assert_relative_eq!(geom.unit_vectors[(0, 0)], 0.6);
        assert_relative_eq!(geom.unit_vectors[(1, 0)], 0.8);
        assert_relative_eq!(geom.distances[1], 2.0);
        assert_relative_eq!(geom.unit_vectors[(1, 1)], 1.0);
        for s in 0..geom.len() {
            assert_relative_eq!(geom.unit_vectors.column(s).norm(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_cutoff_modes_partition_pairs() {
        let positions = line(&[0.0, 1.0, 5.0]);
        let pairs = PairIndex::build(3).unwrap();

        let inside =
            compute_distances(&positions, &pairs, 100.0, false, Some(Cutoff::inside(2.0))).unwrap();
        assert_eq!(inside.selected_pairs, vec![0]);
        assert_eq!(inside.mask, vec![true, false, false]);
        assert_eq!(inside.unit_vectors.ncols(), 1);

        let outside =
            compute_distances(&positions, &pairs, 100.0, false, Some(Cutoff::outside(2.0)))
                .unwrap();
        assert_eq!(outside.selected_pairs, vec![1, 2]);
        assert_eq!(outside.distances, vec![5.0, 4.0]);
    }

    #[test]
    fn test_empty_selection() {
        let positions = line(&[0.0, 5.0]);
        let pairs = PairIndex::build(2).unwrap();
        let geom =
            compute_distances(&positions, &pairs, 100.0, false, Some(Cutoff::inside(1.0))).unwrap();
        assert!(geom.is_empty());
        assert_eq!(geom.unit_vectors.shape(), (1, 0));
    }

    #[test]
    fn test_coincident_particles_are_reported() {
        let positions = DMatrix::from_column_slice(2, 3, &[1.0, 1.0, 2.0, 2.0, 1.0, 1.0]);
        let pairs = PairIndex::build(3).unwrap();
        let err = compute_distances(&positions, &pairs, 10.0, false, None).unwrap_err();
        assert_eq!(err.pair, 1);
        assert_eq!((err.a, err.b), (0, 2));
        assert_eq!(err.quantity, Quantity::Distance);
    }

    #[test]
    fn test_coincident_pair_filtered_out_is_ignored() {
        let positions = line(&[1.0, 1.0]);
        let pairs = PairIndex::build(2).unwrap();
        let geom =
            compute_distances(&positions, &pairs, 10.0, false, Some(Cutoff::outside(0.5))).unwrap();
        assert!(geom.is_empty());
    }

    #[test]
    fn test_cutoff_mode_parsing() {
        assert_eq!("inside".parse::<CutoffMode>().unwrap(), CutoffMode::Inside);
        assert_eq!("Outside".parse::<CutoffMode>().unwrap(), CutoffMode::Outside);
        assert_eq!(
            "between".parse::<CutoffMode>(),
            Err(ConfigError::UnknownCutoffMode("between".to_string()))
        );
    }
}
