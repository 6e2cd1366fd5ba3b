use std::fs;
use std::path::Path;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::boundary::Boundary;
use crate::error::ConfigError;
use crate::geometry::{Cutoff, CutoffMode};
use crate::init;
use crate::integrator::Algorithm;
use crate::potential::{BoundedMie, Harmonic, Ideal, LennardJones, Mie, Potential};
use crate::state::ParticleState;
use crate::thermostat::Quench;

/// Physical system and run parameters, fixed for the whole run.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SystemConfig {
    /// Number of spatial dimensions
    pub ndim: usize,
    /// Number of particles
    pub num_particles: usize,
    /// Side length of the cubic box
    #[serde(default)]
    pub box_length: f64,
    /// Particle radius
    pub radius: f64,
    /// Mass of every particle
    #[serde(default = "default_mass")]
    pub mass: f64,
    /// Initial (and isothermal target) temperature
    pub temperature: f64,
    /// Boltzmann constant (default: 1.0 for reduced units)
    #[serde(default = "default_kb")]
    pub k_boltzmann: f64,
    /// Whether to use periodic boundary conditions
    #[serde(default = "default_periodic")]
    pub periodic: bool,
    /// Total number of steps
    pub steps: usize,
    /// Time step, derived from the initial velocities when absent
    #[serde(default)]
    pub timestep: Option<f64>,
    /// Scheduled instantaneous temperature changes
    #[serde(default)]
    pub quench: Vec<Quench>,
    /// Integration algorithm name
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    /// Velocity factor applied on wall contact under reflective boundaries
    #[serde(default = "default_restitution")]
    pub restitution: f64,
    /// Rescale to the initial temperature after every step
    #[serde(default)]
    pub isothermal: bool,
    /// Constant acceleration along the last axis, pointing down
    #[serde(default)]
    pub field: Option<f64>,
    /// Pair selection radius
    #[serde(default)]
    pub cutoff: Option<f64>,
    /// Keep pairs `inside` or `outside` the cutoff radius
    #[serde(default = "default_cutoff_mode")]
    pub cutoff_mode: String,
}

fn default_mass() -> f64 {
    1.0
}
fn default_kb() -> f64 {
    1.0
}
fn default_periodic() -> bool {
    true
}
fn default_algorithm() -> String {
    "verlet".to_string()
}
fn default_restitution() -> f64 {
    1.0
}
fn default_cutoff_mode() -> String {
    "inside".to_string()
}

impl SystemConfig {
    /// A periodic system with defaults for everything optional.
    pub fn new(ndim: usize, num_particles: usize, box_length: f64, steps: usize) -> Self {
        SystemConfig {
            ndim,
            num_particles,
            box_length,
            radius: 0.5,
            mass: default_mass(),
            temperature: 1.0,
            k_boltzmann: default_kb(),
            periodic: default_periodic(),
            steps,
            timestep: None,
            quench: Vec::new(),
            algorithm: default_algorithm(),
            restitution: default_restitution(),
            isothermal: false,
            field: None,
            cutoff: None,
            cutoff_mode: default_cutoff_mode(),
        }
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ndim == 0 {
            return Err(ConfigError::NoDimensions);
        }
        if self.num_particles < 2 {
            return Err(ConfigError::TooFewParticles(self.num_particles));
        }

        positive("box length", self.box_length)?;
        positive("mass", self.mass)?;
        positive("Boltzmann constant", self.k_boltzmann)?;
        non_negative("particle radius", self.radius)?;
        non_negative("temperature", self.temperature)?;
        if let Some(dt) = self.timestep {
            positive("timestep", dt)?;
        }
        if let Some(cutoff) = self.cutoff {
            positive("cutoff radius", cutoff)?;
        }
        for quench in &self.quench {
            non_negative("quench temperature", quench.temperature)?;
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(ConfigError::Restitution(self.restitution));
        }
        if 2.0 * self.radius > self.box_length {
            return Err(ConfigError::ParticleTooLarge {
                diameter: 2.0 * self.radius,
                box_length: self.box_length,
            });
        }

        self.algorithm()?;
        self.cutoff()?;
        Ok(())
    }

    pub fn algorithm(&self) -> Result<Algorithm, ConfigError> {
        self.algorithm.parse()
    }

    pub fn cutoff(&self) -> Result<Option<Cutoff>, ConfigError> {
        let mode: CutoffMode = self.cutoff_mode.parse()?;
        Ok(self.cutoff.map(|radius| Cutoff { radius, mode }))
    }

    pub fn boundary(&self) -> Boundary {
        if self.periodic {
            Boundary::Periodic {
                box_length: self.box_length,
            }
        } else {
            Boundary::Reflective {
                box_length: self.box_length,
                radius: self.radius,
                restitution: self.restitution,
            }
        }
    }

    pub fn isothermal_target(&self) -> Option<f64> {
        self.isothermal.then_some(self.temperature)
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Negative { name, value })
    }
}

/// Pair potential selection
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PotentialConfig {
    /// No interaction
    Ideal,
    /// Lennard-Jones 12-6 potential
    LennardJones { epsilon: f64, sigma: f64 },
    /// Generalised Mie m-n potential
    Mie {
        epsilon: f64,
        sigma: f64,
        m: f64,
        n: f64,
    },
    /// Mie potential at the softened distance sqrt(r^2 + a^2)
    BoundedMie {
        a: f64,
        epsilon: f64,
        sigma: f64,
        m: f64,
        n: f64,
    },
    /// Harmonic spring with rest length r0
    Harmonic { k: f64, r0: f64 },
}

impl PotentialConfig {
    pub fn build(&self) -> Result<Box<dyn Potential>, ConfigError> {
        Ok(match *self {
            PotentialConfig::Ideal => Box::new(Ideal),
            PotentialConfig::LennardJones { epsilon, sigma } => {
                positive("Lennard-Jones sigma", sigma)?;
                Box::new(LennardJones::new(epsilon, sigma))
            }
            PotentialConfig::Mie {
                epsilon,
                sigma,
                m,
                n,
            } => Box::new(Mie::new(epsilon, sigma, m, n)?),
            PotentialConfig::BoundedMie {
                a,
                epsilon,
                sigma,
                m,
                n,
            } => Box::new(BoundedMie::new(a, epsilon, sigma, m, n)?),
            PotentialConfig::Harmonic { k, r0 } => Box::new(Harmonic::new(k, r0)),
        })
    }
}

/// Initial position options
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PositionConfig {
    /// Simple cubic lattice filling the box
    SimpleCubic,
    /// One coordinate list per particle
    Explicit { coords: Vec<Vec<f64>> },
}

/// Initial velocity options
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VelocityConfig {
    /// Maxwell-Boltzmann distribution at the system temperature
    MaxwellBoltzmann {
        /// Optional random seed
        #[serde(default)]
        seed: Option<u64>,
    },
    /// Every particle at rest
    Zero,
    /// One velocity list per particle
    Explicit { velocities: Vec<Vec<f64>> },
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct InitialConfig {
    #[serde(default = "default_positions")]
    pub positions: PositionConfig,
    #[serde(default = "default_velocities")]
    pub velocities: VelocityConfig,
    /// Derive the box length from this volume fraction instead
    #[serde(default)]
    pub volume_fraction: Option<f64>,
}

fn default_positions() -> PositionConfig {
    PositionConfig::SimpleCubic
}
fn default_velocities() -> VelocityConfig {
    VelocityConfig::MaxwellBoltzmann { seed: None }
}

impl Default for InitialConfig {
    fn default() -> Self {
        InitialConfig {
            positions: default_positions(),
            velocities: default_velocities(),
            volume_fraction: None,
        }
    }
}

/// Output settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct OutputConfig {
    /// CSV file receiving the per-step observables
    #[serde(default)]
    pub csv: Option<String>,
    /// Write every n-th step only
    #[serde(default = "default_stride")]
    pub stride: usize,
}

fn default_stride() -> usize {
    1
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            csv: None,
            stride: default_stride(),
        }
    }
}

/// A complete run description as read from a YAML file.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RunConfig {
    pub system: SystemConfig,
    #[serde(default = "default_potential")]
    pub potential: PotentialConfig,
    /// Cutoff as a multiple of the potential's equilibrium distance,
    /// used when `system.cutoff` is not given
    #[serde(default)]
    pub cutoff_factor: Option<f64>,
    #[serde(default)]
    pub initial: InitialConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_potential() -> PotentialConfig {
    PotentialConfig::Ideal
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read configuration file")]
    Io(#[from] std::io::Error),
    #[error("failed to parse configuration")]
    Yaml(#[from] serde_yml::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl RunConfig {
    /// Load and resolve a configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, LoadError> {
        let mut config: RunConfig = serde_yml::from_str(content)?;
        config.resolve()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), LoadError> {
        let content = serde_yml::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Fill in derived parameters and validate the result.
    pub fn resolve(&mut self) -> Result<(), ConfigError> {
        if let Some(fraction) = self.initial.volume_fraction {
            self.system.box_length = init::box_length_for_volume_fraction(
                self.system.ndim,
                self.system.num_particles,
                self.system.radius,
                fraction,
            )?;
        }
        if self.system.cutoff.is_none() {
            if let Some(factor) = self.cutoff_factor {
                let potential = self.potential.build()?;
                let r_eq = potential.equilibrium_distance().ok_or_else(|| {
                    ConfigError::Potential(
                        "cutoff_factor needs a potential with an equilibrium distance".to_string(),
                    )
                })?;
                self.system.cutoff = Some(factor * r_eq);
            }
        }
        self.system.validate()?;
        self.potential.build()?;
        Ok(())
    }

    /// Generate the initial particle state
    pub fn initial_state(&self) -> Result<ParticleState, ConfigError> {
        let sys = &self.system;
        let positions = match &self.initial.positions {
            PositionConfig::SimpleCubic => {
                init::simple_cubic(sys.ndim, sys.num_particles, sys.box_length)
            }
            PositionConfig::Explicit { coords } => to_matrix("positions", coords, sys.ndim)?,
        };
        let velocities = match &self.initial.velocities {
            VelocityConfig::MaxwellBoltzmann { seed } => init::maxwell_boltzmann(
                sys.ndim,
                sys.num_particles,
                sys.mass,
                sys.temperature,
                sys.k_boltzmann,
                *seed,
            ),
            VelocityConfig::Zero => DMatrix::zeros(sys.ndim, sys.num_particles),
            VelocityConfig::Explicit { velocities } => {
                to_matrix("velocities", velocities, sys.ndim)?
            }
        };
        let state = ParticleState::new(positions, velocities)?;
        state.check_shape(sys.ndim, sys.num_particles)?;
        Ok(state)
    }

    /// Seed of the velocity generator, if any
    pub fn seed(&self) -> Option<u64> {
        match self.initial.velocities {
            VelocityConfig::MaxwellBoltzmann { seed } => seed,
            _ => None,
        }
    }
}

fn to_matrix(name: &'static str, rows: &[Vec<f64>], ndim: usize) -> Result<DMatrix<f64>, ConfigError> {
    if let Some(bad) = rows.iter().find(|row| row.len() != ndim) {
        return Err(ConfigError::ShapeMismatch {
            name,
            expected: (ndim, rows.len()),
            found: (bad.len(), rows.len()),
        });
    }
    Ok(DMatrix::from_fn(ndim, rows.len(), |d, p| rows[p][d]))
}
