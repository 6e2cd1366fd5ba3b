//! Pairwise molecular dynamics command-line interface
//!
//! Reads a YAML run description, integrates the system and writes the
//! per-step energies to CSV.

use color_eyre::eyre::Result;

mod cli;

use cli::MdApplication;

fn main() -> Result<()> {
    color_eyre::install()?;
    MdApplication::from_cli()?.run()
}
