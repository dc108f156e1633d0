//! Pairwise type-rule forces, crowd pressure and velocity update
//!
//! Every particle is scanned against every other particle (O(n²)). The pass
//! only writes velocities; positions are read as a frame-stable snapshot and
//! are advanced afterwards by the caller.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::ConfigError;
use crate::force_matrix::ForceMatrix;
use crate::particle::Particle;

/// Tuning constants for the interaction pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionParams {
    /// Below this distance pure repulsion overrides the type rule
    pub repulsion_radius: f32,
    /// Beyond this distance particles do not interact
    pub interaction_radius: f32,
    /// Neighbors closer than this count toward crowding
    pub local_density_radius: f32,
    /// Neighbor count above which braking is applied
    pub density_threshold: u32,
    /// Braking force per excess neighbor
    pub pressure_factor: f32,
    /// Multiplicative velocity decay per step, in (0, 1]
    pub damping: f32,
    /// Velocity magnitude cap after damping
    pub max_speed: f32,
    /// Scale of the hard-core overlap push
    pub core_repulsion: f32,
}

impl Default for InteractionParams {
    fn default() -> Self {
        Self {
            repulsion_radius: REPULSION_RADIUS,
            interaction_radius: INTERACTION_RADIUS,
            local_density_radius: LOCAL_DENSITY_RADIUS,
            density_threshold: DENSITY_THRESHOLD,
            pressure_factor: PRESSURE_FACTOR,
            damping: DAMPING,
            max_speed: MAX_SPEED,
            core_repulsion: CORE_REPULSION,
        }
    }
}

impl InteractionParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            ("repulsion_radius", self.repulsion_radius),
            ("interaction_radius", self.interaction_radius),
            ("local_density_radius", self.local_density_radius),
            ("pressure_factor", self.pressure_factor),
            ("damping", self.damping),
            ("max_speed", self.max_speed),
            ("core_repulsion", self.core_repulsion),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(ConfigError::param(name, "must be finite"));
            }
        }

        if self.repulsion_radius < 0.0 {
            return Err(ConfigError::param("repulsion_radius", "must be >= 0"));
        }
        if self.interaction_radius <= self.repulsion_radius {
            return Err(ConfigError::param(
                "interaction_radius",
                format!(
                    "must exceed repulsion_radius ({} <= {})",
                    self.interaction_radius, self.repulsion_radius
                ),
            ));
        }
        if self.local_density_radius < 0.0 {
            return Err(ConfigError::param("local_density_radius", "must be >= 0"));
        }
        if self.pressure_factor < 0.0 {
            return Err(ConfigError::param("pressure_factor", "must be >= 0"));
        }
        if !(self.damping > 0.0 && self.damping <= 1.0) {
            return Err(ConfigError::param("damping", "must be in (0, 1]"));
        }
        if self.max_speed <= 0.0 {
            return Err(ConfigError::param("max_speed", "must be > 0"));
        }
        Ok(())
    }
}

/// Force one particle receives from another, and the distance between them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairInteraction {
    pub force: Vec2,
    pub distance: f32,
}

/// Force exerted on `p1` by `p2`.
///
/// Returns `None` when the pair is skipped: coincident particles (no defined
/// direction) or particles farther apart than the interaction radius.
pub fn pair_interaction(
    p1: &Particle,
    p2: &Particle,
    matrix: &ForceMatrix,
    params: &InteractionParams,
) -> Option<PairInteraction> {
    let delta = p2.position - p1.position;
    let distance = delta.length();

    if distance == 0.0 || distance > params.interaction_radius {
        return None;
    }

    let direction = delta / distance;

    let force = if distance < params.repulsion_radius {
        // Hard core: always away from p2, lighter particles pushed harder
        let overlap = params.repulsion_radius - distance;
        direction * (-overlap * params.core_repulsion / p1.mass)
    } else {
        // Linear falloff: 1 at the repulsion edge, 0 at the interaction edge
        let t = 1.0
            - (distance - params.repulsion_radius)
                / (params.interaction_radius - params.repulsion_radius);
        direction * (matrix.coefficient(p1.particle_type, p2.particle_type) * t)
    };

    Some(PairInteraction { force, distance })
}

/// Braking force opposing `velocity`, proportional to crowding above the
/// threshold. Zero when uncrowded or when there is no direction to brake.
pub fn pressure_force(velocity: Vec2, neighbors: u32, params: &InteractionParams) -> Vec2 {
    if neighbors <= params.density_threshold {
        return Vec2::ZERO;
    }
    // Velocities too small to normalize in f32 have no usable direction
    let Some(direction) = velocity.try_normalize() else {
        return Vec2::ZERO;
    };

    let pressure = (neighbors - params.density_threshold) as f32 * params.pressure_factor;
    -direction * pressure
}

/// Per-type-pair force law applied across the whole particle set.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionEngine {
    matrix: ForceMatrix,
    params: InteractionParams,
}

impl InteractionEngine {
    pub fn new(matrix: ForceMatrix, params: InteractionParams) -> Self {
        Self { matrix, params }
    }

    pub fn matrix(&self) -> &ForceMatrix {
        &self.matrix
    }

    pub fn params(&self) -> &InteractionParams {
        &self.params
    }

    /// Net force on `particles[index]` from all others, pressure included.
    /// Pressure braking uses the particle's velocity before this frame's update.
    pub fn net_force(&self, particles: &[Particle], index: usize) -> Vec2 {
        let p1 = &particles[index];
        let mut force = Vec2::ZERO;
        let mut neighbors = 0u32;

        for (j, p2) in particles.iter().enumerate() {
            if j == index {
                continue;
            }

            let Some(pair) = pair_interaction(p1, p2, &self.matrix, &self.params) else {
                continue;
            };

            if pair.distance < self.params.local_density_radius {
                neighbors += 1;
            }
            force += pair.force;
        }

        force + pressure_force(p1.velocity, neighbors, &self.params)
    }

    /// `velocity += force / mass`, then damping, then the speed cap.
    #[inline]
    pub fn apply_force(&self, particle: &mut Particle, force: Vec2) {
        particle.velocity += force / particle.mass;
        particle.velocity *= self.params.damping;
        particle.velocity = particle.velocity.clamp_length_max(self.params.max_speed);
    }

    /// Update every particle's velocity. Positions are not touched, so each
    /// force sum sees the same snapshot regardless of iteration order.
    pub fn compute_forces(&self, particles: &mut [Particle]) {
        for i in 0..particles.len() {
            let force = self.net_force(particles, i);
            self.apply_force(&mut particles[i], force);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle_type::{TypeCatalog, TypeDefinition};

    const RED: usize = 0;
    const GREEN: usize = 1;

    fn particle(x: f32, y: f32, particle_type: usize, catalog: &TypeCatalog) -> Particle {
        Particle::new(Vec2::new(x, y), Vec2::ZERO, particle_type, catalog, PARTICLE_RADIUS)
    }

    fn quiet_params() -> InteractionParams {
        InteractionParams {
            density_threshold: u32::MAX,
            ..Default::default()
        }
    }

    #[test]
    fn red_is_pushed_away_from_green_at_mid_range() {
        let catalog = TypeCatalog::default();
        let matrix = ForceMatrix::default();
        let params = InteractionParams::default();
        let red = particle(0.0, 0.0, RED, &catalog);
        let green = particle(100.0, 0.0, GREEN, &catalog);

        let pair = pair_interaction(&red, &green, &matrix, &params).unwrap();

        let t = 1.0 - 75.0 / 255.0;
        assert!((t - 0.7059_f32).abs() < 1e-4);
        assert!((pair.force.length() - 0.8 * t).abs() < 1e-5);
        // negative coefficient: directed away from green
        assert!(pair.force.x < 0.0);
        assert!(pair.force.y.abs() < 1e-6);
        assert_eq!(pair.distance, 100.0);
    }

    #[test]
    fn hard_core_pushes_both_apart() {
        let catalog = TypeCatalog::default();
        // Purple attracts Green strongly; the core must still win
        let matrix = ForceMatrix::default();
        let params = InteractionParams::default();
        let a = particle(0.0, 0.0, 4, &catalog);
        let b = particle(0.0, 10.0, GREEN, &catalog);

        let on_a = pair_interaction(&a, &b, &matrix, &params).unwrap().force;
        let on_b = pair_interaction(&b, &a, &matrix, &params).unwrap().force;

        assert!(on_a.y < 0.0);
        assert!(on_b.y > 0.0);

        // overlap 15, core 0.7, a.mass 3
        assert!((on_a.length() - 15.0 * 0.7 / 3.0).abs() < 1e-5);
        assert!((on_b.length() - 15.0 * 0.7 / 1.0).abs() < 1e-5);
    }

    #[test]
    fn skips_coincident_and_distant_pairs() {
        let catalog = TypeCatalog::default();
        let matrix = ForceMatrix::default();
        let params = InteractionParams::default();
        let a = particle(5.0, 5.0, RED, &catalog);

        let same = particle(5.0, 5.0, GREEN, &catalog);
        assert!(pair_interaction(&a, &same, &matrix, &params).is_none());

        let far = particle(5.0 + 280.5, 5.0, GREEN, &catalog);
        assert!(pair_interaction(&a, &far, &matrix, &params).is_none());

        let edge = particle(5.0 + 280.0, 5.0, GREEN, &catalog);
        let pair = pair_interaction(&a, &edge, &matrix, &params).unwrap();
        assert!(pair.force.length() < 1e-5);
    }

    #[test]
    fn pressure_opposes_velocity() {
        let params = InteractionParams::default();
        let v = Vec2::new(3.0, 4.0);

        assert_eq!(pressure_force(v, 30, &params), Vec2::ZERO);

        let f = pressure_force(v, 35, &params);
        assert!((f.length() - 0.5).abs() < 1e-6);
        assert!(f.dot(v) < 0.0);

        assert_eq!(pressure_force(Vec2::ZERO, 100, &params), Vec2::ZERO);
    }

    #[test]
    fn crowded_particle_is_braked() {
        let catalog = TypeCatalog::new(vec![TypeDefinition::from_hex(0xffffff, 1.0)]).unwrap();
        let params = InteractionParams {
            density_threshold: 2,
            pressure_factor: 1.0,
            ..Default::default()
        };
        let engine = InteractionEngine::new(ForceMatrix::zeros(1), params);

        let mut particles = vec![particle(0.0, 0.0, 0, &catalog)];
        particles[0].velocity = Vec2::new(2.0, 0.0);
        // Four neighbors on a ring inside the density radius but outside the core
        for (x, y) in [(30.0, 0.0), (-30.0, 0.0), (0.0, 30.0), (0.0, -30.0)] {
            particles.push(particle(x, y, 0, &catalog));
        }

        // Ring is symmetric so pair forces cancel; only braking remains
        let force = engine.net_force(&particles, 0);
        assert!((force - Vec2::new(-2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn vanishing_velocity_is_not_braked() {
        let params = InteractionParams {
            density_threshold: 3,
            ..Default::default()
        };
        assert_eq!(pressure_force(Vec2::new(1e-30, 0.0), 4, &params), Vec2::ZERO);

        let catalog = TypeCatalog::new(vec![TypeDefinition::from_hex(0xffffff, 1.0)]).unwrap();
        let engine = InteractionEngine::new(ForceMatrix::zeros(1), params);

        let mut particles = vec![particle(0.0, 0.0, 0, &catalog)];
        particles[0].velocity = Vec2::new(1e-30, 0.0);
        for (x, y) in [(30.0, 0.0), (-30.0, 0.0), (0.0, 30.0), (0.0, -30.0)] {
            particles.push(particle(x, y, 0, &catalog));
        }

        engine.compute_forces(&mut particles);
        for p in &particles {
            assert!(p.velocity.is_finite(), "velocity {:?}", p.velocity);
            assert!(p.speed() <= params.max_speed);
        }
    }

    #[test]
    fn velocity_is_clamped_to_max_speed() {
        let catalog = TypeCatalog::default();
        let engine = InteractionEngine::new(ForceMatrix::default(), InteractionParams::default());
        let mut p = particle(0.0, 0.0, RED, &catalog);

        engine.apply_force(&mut p, Vec2::new(1000.0, -1000.0));

        assert!((p.speed() - MAX_SPEED).abs() < 1e-4);
        assert!(p.velocity.x > 0.0 && p.velocity.y < 0.0);
    }

    #[test]
    fn isolated_velocities_decay_geometrically() {
        let catalog = TypeCatalog::default();
        let engine = InteractionEngine::new(ForceMatrix::zeros(6), quiet_params());
        let mut particles = vec![
            particle(-1000.0, 0.0, RED, &catalog),
            particle(1000.0, 0.0, GREEN, &catalog),
        ];
        let v0 = Vec2::new(4.0, -2.0);
        particles[0].velocity = v0;

        for n in 1..=20 {
            engine.compute_forces(&mut particles);
            let expected = v0 * DAMPING.powi(n);
            assert!((particles[0].velocity - expected).length() < 1e-4);
        }
        assert_eq!(particles[1].velocity, Vec2::ZERO);
    }

    #[test]
    fn pass_does_not_move_particles() {
        let catalog = TypeCatalog::default();
        let engine = InteractionEngine::new(ForceMatrix::default(), InteractionParams::default());
        let mut particles: Vec<Particle> = (0..10)
            .map(|i| particle(i as f32 * 20.0, (i % 3) as f32 * 15.0, i % 6, &catalog))
            .collect();
        let before: Vec<Vec2> = particles.iter().map(|p| p.position).collect();

        engine.compute_forces(&mut particles);

        let after: Vec<Vec2> = particles.iter().map(|p| p.position).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn result_is_independent_of_iteration_order() {
        let catalog = TypeCatalog::default();
        let engine = InteractionEngine::new(ForceMatrix::default(), InteractionParams::default());
        let mut forward: Vec<Particle> = (0..12)
            .map(|i| particle((i * 37 % 200) as f32, (i * 53 % 150) as f32, i % 6, &catalog))
            .collect();
        let mut reversed: Vec<Particle> = forward.iter().rev().copied().collect();

        engine.compute_forces(&mut forward);
        engine.compute_forces(&mut reversed);
        reversed.reverse();

        for (a, b) in forward.iter().zip(&reversed) {
            assert!((a.velocity - b.velocity).length() < 1e-4);
        }
    }

    #[test]
    fn params_validation() {
        assert!(InteractionParams::default().validate().is_ok());

        let bad_damping = InteractionParams {
            damping: 0.0,
            ..Default::default()
        };
        assert!(bad_damping.validate().is_err());

        let inverted = InteractionParams {
            interaction_radius: 10.0,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());
    }
}
