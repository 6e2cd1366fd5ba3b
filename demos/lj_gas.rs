//! Lennard-Jones gas on a periodic simple cubic lattice, energies printed
//! every 100 steps.

use pairwise_md::init::{maxwell_boltzmann, simple_cubic};
use pairwise_md::{LennardJones, MemorySink, ParticleState, Potential, Simulation, SystemConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let (ndim, n_side) = (3, 4);
    let n_particles = n_side * n_side * n_side;
    let lj = LennardJones::new(1.0, 1.0);
    let r_min = lj.equilibrium_distance().unwrap_or(1.0);
    let box_length = n_side as f64 * 1.5;

    let mut config = SystemConfig::new(ndim, n_particles, box_length, 1000);
    config.radius = 0.5;
    config.temperature = 0.8;
    config.timestep = Some(0.002);
    config.cutoff = Some(2.5 * r_min);

    let state = ParticleState::new(
        simple_cubic(ndim, n_particles, box_length),
        maxwell_boltzmann(ndim, n_particles, config.mass, config.temperature, 1.0, Some(42)),
    )?;

    let mut simulation = Simulation::new(config, lj, state)?;
    let mut sink = MemorySink::new();
    let summary = simulation.run(&mut sink)?;

    println!("{:>6} {:>12} {:>12} {:>12} {:>12}", "step", "T", "<KE>", "<PE>", "<E>");
    for frame in sink.frames.iter().step_by(100) {
        println!(
            "{:>6} {:>12.6} {:>12.6} {:>12.6} {:>12.6}",
            frame.step,
            frame.temperature,
            frame.mean_ke,
            frame.mean_pe,
            frame.mean_ke + frame.mean_pe
        );
    }
    println!(
        "{} steps in {:.3} s, |P| = {:.3e}",
        summary.steps_completed,
        summary.duration.as_secs_f64(),
        simulation.total_momentum().norm()
    );
    Ok(())
}
