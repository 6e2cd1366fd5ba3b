//! Error types for the simulation core.

use std::fmt;
use thiserror::Error;

/// Problems detected while validating a run, before any step executes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("unknown integration algorithm '{0}', expected one of (simple, verlet)")]
    UnknownAlgorithm(String),

    #[error("'{0}' is not a valid cutoff mode, try 'inside' or 'outside' instead")]
    UnknownCutoffMode(String),

    #[error("at least two particles are needed for pair interactions, found {0}")]
    TooFewParticles(usize),

    #[error("number of dimensions must be at least 1")]
    NoDimensions,

    #[error("{name} must be positive, found {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error("{name} must not be negative, found {value}")]
    Negative { name: &'static str, value: f64 },

    #[error("restitution coefficient must lie in [0, 1], found {0}")]
    Restitution(f64),

    #[error("particle diameter {diameter} does not fit in a box of length {box_length}")]
    ParticleTooLarge { diameter: f64, box_length: f64 },

    #[error("volume fraction must lie in (0, 1], found {0}")]
    VolumeFraction(f64),

    #[error("invalid potential: {0}")]
    Potential(String),

    #[error("{name} has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        name: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },
}

/// The per-pair quantity that turned out non-finite or singular.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Distance,
    UnitVector,
    Force,
    Potential,
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Quantity::Distance => "distance",
            Quantity::UnitVector => "unit vector",
            Quantity::Force => "force",
            Quantity::Potential => "potential energy",
        };
        f.write_str(name)
    }
}

/// A single pair whose geometry or interaction could not be evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("{quantity} is degenerate for pair #{pair} (particles {a} and {b}, distance {distance})")]
pub struct Degeneracy {
    pub pair: usize,
    pub a: usize,
    pub b: usize,
    pub quantity: Quantity,
    pub distance: f64,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("step {step}: {source}")]
    Numerical {
        step: usize,
        #[source]
        source: Degeneracy,
    },

    #[error(
        "step {step}: particle {particle} left the periodic box by more than one box length \
         along axis {axis} (coordinate {coordinate}); reduce the timestep"
    )]
    Displacement {
        step: usize,
        particle: usize,
        axis: usize,
        coordinate: f64,
    },

    #[error("step {step}: failed to record state")]
    Sink {
        step: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("the run has already finished after {steps} steps")]
    Finished { steps: usize },
}

impl Error {
    /// Step index the error is attached to, if it happened inside a step.
    pub fn step(&self) -> Option<usize> {
        match self {
            Error::Numerical { step, .. }
            | Error::Displacement { step, .. }
            | Error::Sink { step, .. } => Some(*step),
            Error::Config(_) | Error::Finished { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
