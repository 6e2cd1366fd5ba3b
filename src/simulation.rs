//! The step engine: one [`Simulation`] owns the particle state of a run and
//! advances it step by step, handing every completed step to a [`StateSink`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use nalgebra::DVector;
use tracing::{debug, info, warn};

use crate::boundary::{Boundary, Escape};
use crate::config::SystemConfig;
use crate::error::{Degeneracy, Error, Result};
use crate::forces::PairForces;
use crate::geometry::{compute_distances, Cutoff};
use crate::init::{mean_speed, suggest_timestep};
use crate::integrator::Algorithm;
use crate::observables::{self, Energies, EnergyTracker};
use crate::pairs::PairIndex;
use crate::potential::Potential;
use crate::progress::ProgressReporter;
use crate::sink::{Frame, StateSink};
use crate::state::ParticleState;
use crate::thermostat::{Quench, Thermostat};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Finished,
}

/// Outcome of [`Simulation::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub steps_completed: usize,
    pub cancelled: bool,
    pub unconsumed_quenches: Vec<Quench>,
    pub duration: Duration,
}

pub struct Simulation<P: Potential> {
    config: SystemConfig,
    potential: P,
    pairs: PairIndex,
    boundary: Boundary,
    algorithm: Algorithm,
    cutoff: Option<Cutoff>,
    dt: f64,
    thermostat: Thermostat,
    tracker: EnergyTracker,
    state: ParticleState,
    phase: Phase,
}

impl<P: Potential> Simulation<P> {
    /// Validate `config` against `state` and prepare the run.
    ///
    /// The energies of the initial configuration are computed here, so a
    /// degenerate starting geometry is rejected before any step runs.
    pub fn new(config: SystemConfig, potential: P, mut state: ParticleState) -> Result<Self> {
        config.validate()?;
        state.check_shape(config.ndim, config.num_particles)?;

        let pairs = PairIndex::build(config.num_particles)?;
        let algorithm = config.algorithm()?;
        let cutoff = config.cutoff()?;
        let boundary = config.boundary();

        let dt = match config.timestep {
            Some(dt) => dt,
            None => {
                let dt = suggest_timestep(config.radius, mean_speed(&state.velocities));
                info!("No timestep configured, using {:.6e}", dt);
                dt
            }
        };

        let thermostat =
            Thermostat::new(config.isothermal_target(), config.quench.clone(), state.step);
        let tracker = EnergyTracker::new(config.mass, config.k_boltzmann);

        let energies = compute_distances(
            &state.positions,
            &pairs,
            config.box_length,
            config.periodic,
            cutoff,
        )
        .and_then(|geometry| tracker.measure(&state.velocities, &geometry, &potential, &pairs))
        .map_err(|source| Error::Numerical {
            step: state.step,
            source,
        })?;
        state.set_energies(energies);

        info!(
            "Prepared {} particles in {}D: {} pairs, {} integrator, {} boundaries, dt = {}",
            config.num_particles,
            config.ndim,
            pairs.len(),
            algorithm,
            if boundary.is_periodic() { "periodic" } else { "reflective" },
            dt
        );

        Ok(Simulation {
            config,
            potential,
            pairs,
            boundary,
            algorithm,
            cutoff,
            dt,
            thermostat,
            tracker,
            state,
            phase: Phase::Idle,
        })
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn state(&self) -> &ParticleState {
        &self.state
    }

    pub fn into_state(self) -> ParticleState {
        self.state
    }

    pub fn potential(&self) -> &P {
        &self.potential
    }

    pub fn pairs(&self) -> &PairIndex {
        &self.pairs
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn boundary(&self) -> Boundary {
        self.boundary
    }

    pub fn timestep(&self) -> f64 {
        self.dt
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn energies(&self) -> Energies {
        self.state.energies()
    }

    /// Quenches that have not fired, including ones whose step was missed.
    pub fn unconsumed_quenches(&self) -> Vec<Quench> {
        self.thermostat.unconsumed()
    }

    pub fn total_momentum(&self) -> DVector<f64> {
        observables::total_momentum(&self.state.velocities, self.config.mass)
    }

    pub fn center_of_mass(&self) -> Option<DVector<f64>> {
        observables::center_of_mass(&self.state.positions, self.config.periodic)
    }

    pub fn radius_of_gyration(&self) -> f64 {
        observables::radius_of_gyration(
            &self.state.positions,
            self.config.box_length,
            self.config.periodic,
        )
    }

    /// Run one step and hand the result to `sink`.
    ///
    /// The step works on copies of the state; nothing is committed, and the
    /// sink is not called, unless every stage succeeds.
    pub fn advance<S: StateSink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
        if self.phase == Phase::Finished || self.state.step >= self.config.steps {
            self.phase = Phase::Finished;
            return Err(Error::Finished {
                steps: self.state.step,
            });
        }
        self.phase = Phase::Running;

        let step = self.state.step;
        let numerical = |source: Degeneracy| Error::Numerical { step, source };

        let mut positions = self.state.positions.clone();
        let mut velocities = self.state.velocities.clone();
        let mut thermostat = self.thermostat.clone();

        self.boundary
            .apply(&mut positions, &mut velocities)
            .map_err(|escape: Escape| Error::Displacement {
                step,
                particle: escape.particle,
                axis: escape.axis,
                coordinate: escape.coordinate,
            })?;

        let mut field = PairForces::new(
            &self.pairs,
            &self.potential,
            self.config.mass,
            self.config.box_length,
            self.config.periodic,
            self.cutoff,
        );
        self.algorithm
            .step(&mut positions, &mut velocities, self.dt, &mut field)
            .map_err(numerical)?;

        if let Some(g) = self.config.field {
            let last_axis = self.config.ndim - 1;
            velocities.row_mut(last_axis).add_scalar_mut(-g * self.dt);
        }

        thermostat.apply(step, &mut velocities, self.config.mass, self.config.k_boltzmann);

        // Verlet leaves the geometry of the final positions behind
        let geometry = match (self.algorithm, field.into_last_geometry()) {
            (Algorithm::VelocityVerlet, Some(geometry)) => geometry,
            _ => compute_distances(
                &positions,
                &self.pairs,
                self.config.box_length,
                self.config.periodic,
                self.cutoff,
            )
            .map_err(numerical)?,
        };
        let energies = self
            .tracker
            .measure(&velocities, &geometry, &self.potential, &self.pairs)
            .map_err(numerical)?;

        sink.record(&Frame {
            step,
            positions: &positions,
            velocities: &velocities,
            mean_pe: energies.mean_pe,
            mean_ke: energies.mean_ke,
            temperature: energies.temperature,
        })
        .map_err(|e| Error::Sink {
            step,
            source: Box::new(e),
        })?;

        self.state.positions = positions;
        self.state.velocities = velocities;
        self.state.set_energies(energies);
        self.thermostat = thermostat;
        self.state.step += 1;
        debug!(
            "Step {} done: T = {:.6}, <E> = {:.6}",
            step,
            energies.temperature,
            energies.total()
        );

        if self.state.step >= self.config.steps {
            self.phase = Phase::Finished;
        }
        Ok(())
    }

    /// Run every remaining step, logging progress every tenth of the run.
    pub fn run<S: StateSink + ?Sized>(&mut self, sink: &mut S) -> Result<RunSummary> {
        let progress = ProgressReporter::new(self.config.steps);
        self.run_with(sink, &AtomicBool::new(false), progress)
    }

    /// Run every remaining step, checking `stop` before each one and
    /// reporting through `progress`, which is finished when the run ends.
    ///
    /// When there is nothing left to run the current state is recorded once,
    /// so every run leaves at least one frame behind.
    pub fn run_with<S: StateSink + ?Sized>(
        &mut self,
        sink: &mut S,
        stop: &AtomicBool,
        mut progress: ProgressReporter,
    ) -> Result<RunSummary> {
        if self.phase == Phase::Finished {
            return Err(Error::Finished {
                steps: self.state.step,
            });
        }

        progress.start(self.config.num_particles, self.config.ndim);

        if self.state.step >= self.config.steps {
            self.record_current(sink)?;
            self.phase = Phase::Finished;
        }

        let mut completed = 0;
        let mut cancelled = false;
        while self.state.step < self.config.steps {
            if stop.load(Ordering::Relaxed) {
                warn!("Run cancelled before step {}", self.state.step);
                cancelled = true;
                break;
            }
            self.advance(sink)?;
            completed += 1;
            progress.log_progress(self.state.step, &self.state.energies());
        }

        let unconsumed_quenches = self.thermostat.unconsumed();
        if !unconsumed_quenches.is_empty() && !cancelled {
            warn!(
                "{} quench(es) were never applied: {:?}",
                unconsumed_quenches.len(),
                unconsumed_quenches
            );
        }

        Ok(RunSummary {
            steps_completed: completed,
            cancelled,
            unconsumed_quenches,
            duration: progress.finish(self.state.step),
        })
    }

    fn record_current<S: StateSink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        let step = self.state.step;
        sink.record(&Frame {
            step,
            positions: &self.state.positions,
            velocities: &self.state.velocities,
            mean_pe: self.state.mean_pe,
            mean_ke: self.state.mean_ke,
            temperature: self.state.temperature,
        })
        .map_err(|e| Error::Sink {
            step,
            source: Box::new(e),
        })
    }
}
