use std::fmt;
use std::str::FromStr;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Degeneracy};
use crate::forces::ForceField;

/// Time-integration scheme, picked once before the run starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    /// Drift with the current velocity, then a half kick with the
    /// acceleration of the pre-drift positions.
    Simple,
    /// Velocity Verlet: half kick, drift, recompute forces, half kick.
    #[default]
    VelocityVerlet,
}

impl FromStr for Algorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simple" => Ok(Algorithm::Simple),
            "verlet" | "velocity-verlet" | "velocity_verlet" => Ok(Algorithm::VelocityVerlet),
            _ => Err(ConfigError::UnknownAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Simple => f.write_str("simple"),
            Algorithm::VelocityVerlet => f.write_str("verlet"),
        }
    }
}

impl Algorithm {
    /// Advance `positions` and `velocities` by `dt`.
    ///
    /// Forces are always evaluated at the positions handed in, so any
    /// boundary correction applied before the call is taken into account.
    /// Velocity Verlet evaluates the field twice per step, the simple scheme
    /// once.
    pub fn step<F: ForceField + ?Sized>(
        &self,
        positions: &mut DMatrix<f64>,
        velocities: &mut DMatrix<f64>,
        dt: f64,
        field: &mut F,
    ) -> Result<(), Degeneracy> {
        let half_dt = 0.5 * dt;
        match self {
            Algorithm::Simple => {
                let acc = field.accelerations(positions)?;
                *positions += &*velocities * dt;
                *velocities += acc * half_dt;
            }
            Algorithm::VelocityVerlet => {
                let acc = field.accelerations(positions)?;
                *velocities += acc * half_dt;
                *positions += &*velocities * dt;
                let acc = field.accelerations(positions)?;
                *velocities += acc * half_dt;
            }
        }
        Ok(())
    }
}
