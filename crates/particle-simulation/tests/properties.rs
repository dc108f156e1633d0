use glam::Vec2;
use particle_physics::{ConfigError, InteractionParams, Particle, World};
use particle_simulation::{ParticleSimulation, SimulationConfig, SimulationError};

/// Crowded world so every regime (core, type rule, pressure) is exercised
fn crowded_config(seed: u64) -> SimulationConfig {
    SimulationConfig {
        world: World::new(400.0, 300.0),
        particle_count: 300,
        initial_speed: 8.0,
        seed: Some(seed),
        ..Default::default()
    }
}

/// No type forces, no pressure: only damping and the speed cap remain
fn inert_config(world: World) -> SimulationConfig {
    let mut config = SimulationConfig {
        world,
        particle_count: 0,
        seed: Some(0),
        interaction: InteractionParams {
            density_threshold: u32::MAX,
            ..Default::default()
        },
        ..Default::default()
    };
    config.force_matrix = vec![vec![0.0; config.types.len()]; config.types.len()];
    config
}

fn particle(
    sim: &ParticleSimulation,
    position: Vec2,
    velocity: Vec2,
    particle_type: usize,
) -> Particle {
    Particle::new(position, velocity, particle_type, sim.catalog(), 15.0)
}

// ==================================================================================
// Invariants after every completed step
// ==================================================================================

#[test]
fn positions_stay_inside_world() {
    let mut sim = ParticleSimulation::new(&crowded_config(5)).unwrap();
    let world = *sim.world();

    for _ in 0..60 {
        sim.step();

        for p in sim.particles() {
            assert!(world.contains(p.position), "escaped: {:?}", p.position);
        }
        for xyz in sim.render_buffers().positions.chunks(3) {
            assert_eq!(xyz[2], 0.0);
        }
    }
}

#[test]
fn speed_never_exceeds_max() {
    let mut sim = ParticleSimulation::new(&crowded_config(6)).unwrap();
    let max_speed = sim.params().max_speed;

    for _ in 0..60 {
        sim.step();
        for p in sim.particles() {
            assert!(p.speed() <= max_speed * (1.0 + 1e-5), "speed {}", p.speed());
        }
    }
}

#[test]
fn types_and_masses_stay_consistent() {
    let mut sim = ParticleSimulation::new(&crowded_config(7)).unwrap();
    for _ in 0..10 {
        sim.step();
    }
    sim.reset();
    sim.step();

    for p in sim.particles() {
        assert!(p.particle_type < sim.catalog().len());
        assert_eq!(p.mass, sim.catalog().lookup(p.particle_type).mass);
    }
}

// ==================================================================================
// Reset
// ==================================================================================

/// Pearson chi-square statistic against a uniform distribution
fn chi_square_uniform(counts: &[usize]) -> f64 {
    let total: usize = counts.iter().sum();
    let expected = total as f64 / counts.len() as f64;
    counts
        .iter()
        .map(|&c| {
            let d = c as f64 - expected;
            d * d / expected
        })
        .sum()
}

#[test]
fn reset_keeps_count_and_uniform_types() {
    let config = SimulationConfig {
        particle_count: 6000,
        seed: Some(2024),
        ..Default::default()
    };
    let mut sim = ParticleSimulation::new(&config).unwrap();

    // 5 degrees of freedom, p = 0.001
    const CRITICAL: f64 = 20.515;

    assert!(chi_square_uniform(&sim.type_census()) < CRITICAL);

    sim.reset();
    assert_eq!(sim.particle_count(), 6000);
    assert_eq!(sim.render_buffers().positions.len(), 18000);
    assert_eq!(sim.render_buffers().colors.len(), 18000);
    assert!(chi_square_uniform(&sim.type_census()) < CRITICAL);
}

// ==================================================================================
// Concrete scenarios
// ==================================================================================

#[test]
fn wraps_across_edges_during_step() {
    let world = World::new(1000.0, 500.0);
    let mut sim = ParticleSimulation::new(&inert_config(world)).unwrap();
    sim.load_particles(vec![
        particle(&sim, Vec2::new(499.5, 0.0), Vec2::new(1.5, 0.0), 0),
        particle(&sim, Vec2::new(0.0, -249.5), Vec2::new(0.0, -1.6), 1),
    ]);

    sim.step();

    assert_eq!(sim.particles()[0].position.x, -500.0);
    assert_eq!(sim.particles()[1].position.y, 250.0);
    assert_eq!(&sim.render_buffers().positions[0..3], &[-500.0, 0.0, 0.0]);
}

#[test]
fn overlapping_particles_separate() {
    let mut sim = ParticleSimulation::new(&SimulationConfig {
        particle_count: 0,
        seed: Some(1),
        ..Default::default()
    })
    .unwrap();
    // Purple is strongly attracted to Green, but they start inside the core
    sim.load_particles(vec![
        particle(&sim, Vec2::new(0.0, 0.0), Vec2::ZERO, 4),
        particle(&sim, Vec2::new(10.0, 0.0), Vec2::ZERO, 1),
    ]);

    sim.step();

    let [a, b] = [sim.particles()[0], sim.particles()[1]];
    assert!(a.velocity.x < 0.0);
    assert!(b.velocity.x > 0.0);
    assert!(b.position.x - a.position.x > 10.0);
}

#[test]
fn isolated_velocity_decays_geometrically() {
    let mut sim = ParticleSimulation::new(&inert_config(World::new(8000.0, 4000.0))).unwrap();
    let v0 = Vec2::new(10.0, 0.0);
    sim.load_particles(vec![particle(&sim, Vec2::ZERO, v0, 2)]);
    let damping = sim.params().damping;

    for n in 1..=30 {
        sim.step();
        let expected = v0.x * damping.powi(n);
        assert!((sim.particles()[0].velocity.x - expected).abs() < 1e-4);
    }
}

#[test]
fn crowded_near_stationary_particle_stays_finite() {
    let mut config = inert_config(World::new(1000.0, 500.0));
    config.interaction.density_threshold = 3;
    let mut sim = ParticleSimulation::new(&config).unwrap();
    let world = *sim.world();

    let mut particles = vec![particle(&sim, Vec2::ZERO, Vec2::new(1e-30, 0.0), 0)];
    for (x, y) in [(30.0, 0.0), (-30.0, 0.0), (0.0, 30.0), (0.0, -30.0)] {
        particles.push(particle(&sim, Vec2::new(x, y), Vec2::ZERO, 0));
    }
    sim.load_particles(particles);

    for _ in 0..5 {
        sim.step();
        for p in sim.particles() {
            assert!(p.velocity.is_finite(), "velocity {:?}", p.velocity);
            assert!(world.contains(p.position), "escaped: {:?}", p.position);
        }
    }
}

#[test]
fn malformed_matrix_fails_at_startup() {
    let mut config = SimulationConfig::default();
    config.force_matrix[5].push(0.2);

    match ParticleSimulation::new(&config) {
        Err(SimulationError::Config(ConfigError::MatrixRowLength { row, len, expected })) => {
            assert_eq!((row, len, expected), (5, 7, 6));
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("malformed matrix accepted"),
    }
}
