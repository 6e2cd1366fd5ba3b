mod args;
mod output;

pub use args::Args;
pub use output::setup_output;

use std::fs::{self, File};
use std::io::{BufWriter, Write};

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use pairwise_md::config::VelocityConfig;
use pairwise_md::{CsvSink, NullSink, Potential, RunConfig, RunSummary, Simulation, StateSink};
use tracing::{info, warn};

pub struct MdApplication {
    args: Args,
    config: RunConfig,
}

impl MdApplication {
    pub fn from_cli() -> Result<Self> {
        let args = Args::parse();
        let config = load_config(&args)?;
        Ok(Self { args, config })
    }

    pub fn run(self) -> Result<()> {
        setup_output(self.args.output.as_ref())?;
        info!("Configuration loaded:\n{:?}", self.config);

        let potential = self
            .config
            .potential
            .build()
            .wrap_err("Failed to build pair potential")?;
        let state = self
            .config
            .initial_state()
            .wrap_err("Failed to generate initial state")?;
        let mut simulation = Simulation::new(self.config.system.clone(), potential, state)
            .wrap_err("Failed to set up simulation")?;

        let summary = match &self.config.output.csv {
            Some(path) => {
                info!("Writing per-step energies to {}", path);
                let file = File::create(path)
                    .wrap_err_with(|| format!("Unable to create CSV file: {}", path))?;
                let mut sink =
                    CsvSink::with_stride(BufWriter::new(file), self.config.output.stride);
                let summary = run_to_end(&mut simulation, &mut sink)?;
                sink.into_inner()
                    .flush()
                    .wrap_err("Failed to flush CSV output")?;
                summary
            }
            None => run_to_end(&mut simulation, &mut NullSink)?,
        };

        report_summary(&simulation, &summary);
        Ok(())
    }
}

fn run_to_end<P: Potential, S: StateSink>(
    simulation: &mut Simulation<P>,
    sink: &mut S,
) -> Result<RunSummary> {
    simulation.run(sink).wrap_err("Simulation aborted")
}

fn report_summary<P: Potential>(simulation: &Simulation<P>, summary: &RunSummary) {
    let energies = simulation.energies();
    info!("Final state after {} steps:", simulation.state().step);
    info!("    Temperature:     {:.8}", energies.temperature);
    info!("    Mean KE:         {:.8}", energies.mean_ke);
    info!("    Mean PE:         {:.8}", energies.mean_pe);
    info!("    Total momentum:  {:.3e}", simulation.total_momentum().norm());
    info!("    Gyration radius: {:.6}", simulation.radius_of_gyration());
    if let Some(com) = simulation.center_of_mass() {
        info!("    Centre of mass:  {:?}", com.as_slice());
    }
    if summary.cancelled {
        warn!("Run was cancelled after {} steps", summary.steps_completed);
    }
    for quench in &summary.unconsumed_quenches {
        warn!(
            "Quench to T = {} at step {} was never applied",
            quench.temperature, quench.step
        );
    }
}

/// Read the YAML file, apply command-line overrides and resolve derived values.
pub fn load_config(args: &Args) -> Result<RunConfig> {
    let content = fs::read_to_string(&args.config_file)
        .wrap_err_with(|| format!("Unable to read configuration file: {}", args.config_file))?;
    let mut config: RunConfig =
        serde_yml::from_str(&content).wrap_err("Failed to parse configuration file")?;

    apply_overrides(&mut config, args);
    config.resolve().wrap_err("Configuration is not valid")?;
    Ok(config)
}

fn apply_overrides(config: &mut RunConfig, args: &Args) {
    let system = &mut config.system;
    system.steps = args.steps.unwrap_or(system.steps);
    system.timestep = args.timestep.or(system.timestep);
    system.isothermal = args.isothermal || system.isothermal;
    if let Some(algorithm) = &args.algorithm {
        system.algorithm = algorithm.clone();
    }

    config.output.csv = args.csv.clone().or(config.output.csv.take());
    config.output.stride = args.stride.unwrap_or(config.output.stride);

    if let VelocityConfig::MaxwellBoltzmann { seed } = &mut config.initial.velocities {
        *seed = args.seed.or(*seed);
    }
}
