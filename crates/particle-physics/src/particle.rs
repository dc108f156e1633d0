//! Particle state for the planar particle life simulation

use glam::Vec2;
use rand::Rng;

use crate::boundary::World;
use crate::particle_type::TypeCatalog;

/// A single point particle.
///
/// Dynamics are planar; the particle is rendered at z = 0. `mass` is copied
/// from the type catalog at creation and never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Index into the [`TypeCatalog`]
    pub particle_type: usize,
    pub mass: f32,
    pub radius: f32,
}

impl Particle {
    /// Create a particle of the given type, taking its mass from the catalog.
    pub fn new(
        position: Vec2,
        velocity: Vec2,
        particle_type: usize,
        catalog: &TypeCatalog,
        radius: f32,
    ) -> Self {
        Self {
            position,
            velocity,
            particle_type,
            mass: catalog.lookup(particle_type).mass,
            radius,
        }
    }

    /// Uniformly random type and position; each velocity axis in
    /// `[-initial_speed / 2, initial_speed / 2)`.
    pub fn random<R: Rng + ?Sized>(
        rng: &mut R,
        world: &World,
        catalog: &TypeCatalog,
        initial_speed: f32,
        radius: f32,
    ) -> Self {
        let particle_type = rng.random_range(0..catalog.len());
        let position = world.sample_position(rng);
        let velocity = Vec2::new(
            (rng.random::<f32>() - 0.5) * initial_speed,
            (rng.random::<f32>() - 0.5) * initial_speed,
        );
        Self::new(position, velocity, particle_type, catalog, radius)
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Position as (x, y, z) with z pinned to zero
    pub fn position_xyz(&self) -> [f32; 3] {
        [self.position.x, self.position.y, 0.0]
    }

    /// Advance position by one frame of velocity.
    #[inline]
    pub fn integrate(&mut self) {
        self.position += self.velocity;
    }
}
