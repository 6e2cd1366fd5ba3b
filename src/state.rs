use nalgebra::DMatrix;

use crate::error::ConfigError;
use crate::observables::Energies;

/// Positions, velocities and the observables of the last completed step.
///
/// Arrays are `[ndim, n_particles]`, one column per particle.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleState {
    pub positions: DMatrix<f64>,
    pub velocities: DMatrix<f64>,
    pub step: usize,
    pub temperature: f64,
    pub mean_ke: f64,
    pub mean_pe: f64,
}

impl ParticleState {
    /// Wrap initial positions and velocities. Both must have the same shape.
    pub fn new(positions: DMatrix<f64>, velocities: DMatrix<f64>) -> Result<Self, ConfigError> {
        if positions.shape() != velocities.shape() {
            return Err(ConfigError::ShapeMismatch {
                name: "velocities",
                expected: positions.shape(),
                found: velocities.shape(),
            });
        }
        Ok(ParticleState {
            positions,
            velocities,
            step: 0,
            temperature: 0.0,
            mean_ke: 0.0,
            mean_pe: 0.0,
        })
    }

    /// State with every particle at rest.
    pub fn at_rest(positions: DMatrix<f64>) -> Self {
        let velocities = DMatrix::zeros(positions.nrows(), positions.ncols());
        ParticleState {
            positions,
            velocities,
            step: 0,
            temperature: 0.0,
            mean_ke: 0.0,
            mean_pe: 0.0,
        }
    }

    pub fn ndim(&self) -> usize {
        self.positions.nrows()
    }

    pub fn n_particles(&self) -> usize {
        self.positions.ncols()
    }

    pub fn energies(&self) -> Energies {
        Energies {
            mean_ke: self.mean_ke,
            mean_pe: self.mean_pe,
            temperature: self.temperature,
        }
    }

    pub(crate) fn set_energies(&mut self, energies: Energies) {
        self.mean_ke = energies.mean_ke;
        self.mean_pe = energies.mean_pe;
        self.temperature = energies.temperature;
    }

    /// Check the arrays against the configured `[ndim, n_particles]` shape.
    pub fn check_shape(&self, ndim: usize, n_particles: usize) -> Result<(), ConfigError> {
        let expected = (ndim, n_particles);
        if self.positions.shape() != expected {
            return Err(ConfigError::ShapeMismatch {
                name: "positions",
                expected,
                found: self.positions.shape(),
            });
        }
        if self.velocities.shape() != expected {
            return Err(ConfigError::ShapeMismatch {
                name: "velocities",
                expected,
                found: self.velocities.shape(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_mismatched_arrays() {
        let err = ParticleState::new(DMatrix::zeros(3, 4), DMatrix::zeros(3, 5)).unwrap_err();
        assert_eq!(
            err,
            ConfigError::ShapeMismatch {
                name: "velocities",
                expected: (3, 4),
                found: (3, 5),
            }
        );
    }

    #[test]
    fn test_check_shape() {
        let state = ParticleState::at_rest(DMatrix::zeros(2, 6));
        assert_eq!(state.ndim(), 2);
        assert_eq!(state.n_particles(), 6);
        assert!(state.check_shape(2, 6).is_ok());
        assert!(matches!(
            state.check_shape(3, 6),
            Err(ConfigError::ShapeMismatch { name: "positions", .. })
        ));
    }
}
