//! A soft-sphere fluid in a closed box, quenched twice during the run.

use pairwise_md::init::{box_length_for_volume_fraction, maxwell_boltzmann, simple_cubic};
use pairwise_md::{BoundedMie, MemorySink, ParticleState, Quench, Simulation, SystemConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let ndim = 2;
    let n_particles = 25;
    let radius = 0.5;
    let box_length = box_length_for_volume_fraction(ndim, n_particles, radius, 0.2)?;

    let mut config = SystemConfig::new(ndim, n_particles, box_length, 600);
    config.radius = radius;
    config.temperature = 2.0;
    config.periodic = false;
    config.restitution = 0.9;
    config.quench = vec![
        Quench {
            step: 200,
            temperature: 0.5,
        },
        Quench {
            step: 400,
            temperature: 0.1,
        },
    ];

    let state = ParticleState::new(
        simple_cubic(ndim, n_particles, box_length),
        maxwell_boltzmann(ndim, n_particles, config.mass, config.temperature, 1.0, Some(7)),
    )?;

    let potential = BoundedMie::new(0.2, 1.0, 1.0, 12.0, 6.0)?;
    let mut simulation = Simulation::new(config, potential, state)?;
    println!("timestep: {:.5}", simulation.timestep());

    let mut sink = MemorySink::new();
    simulation.run(&mut sink)?;

    for frame in sink.frames.iter().step_by(50) {
        println!("{:>5} T = {:.4}", frame.step, frame.temperature);
    }
    println!("radius of gyration: {:.4}", simulation.radius_of_gyration());
    Ok(())
}
