//! Command-line argument parsing

use clap::Parser;

/// Pairwise molecular dynamics with YAML configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    pub config_file: String,

    /// Override log output file: (default stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Override CSV file receiving per-step energies
    #[arg(long)]
    pub csv: Option<String>,

    /// Override CSV stride (write every n-th step)
    #[arg(long)]
    pub stride: Option<usize>,

    /// Override total number of steps
    #[arg(long)]
    pub steps: Option<usize>,

    /// Override integration timestep
    #[arg(long)]
    pub timestep: Option<f64>,

    /// Override integration algorithm (simple or verlet)
    #[arg(long)]
    pub algorithm: Option<String>,

    /// Override random seed for Maxwell-Boltzmann velocities
    #[arg(long)]
    pub seed: Option<u64>,

    /// Hold the initial temperature throughout the run
    #[arg(long)]
    pub isothermal: bool,
}
