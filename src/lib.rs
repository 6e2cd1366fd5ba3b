pub mod boundary;
pub mod config;
pub mod error;
pub mod forces;
pub mod geometry;
pub mod init;
pub mod integrator;
pub mod observables;
pub mod pairs;
pub mod potential;
pub mod progress;
pub mod simulation;
pub mod sink;
pub mod state;
pub mod thermostat;

pub use boundary::Boundary;
pub use config::{RunConfig, SystemConfig};
pub use error::{ConfigError, Degeneracy, Error, Result};
pub use forces::{ForceField, PairForces};
pub use geometry::{Cutoff, CutoffMode, PairGeometry};
pub use integrator::Algorithm;
pub use observables::{Energies, EnergyTracker};
pub use pairs::PairIndex;
pub use progress::ProgressReporter;
pub use potential::{BoundedMie, Harmonic, Ideal, LennardJones, Mie, Potential};
pub use simulation::{Phase, RunSummary, Simulation};
pub use sink::{CsvSink, Frame, MemorySink, NullSink, StateSink};
pub use state::ParticleState;
pub use thermostat::{Quench, Thermostat};
