//! Particle ownership and the flat buffers mirrored to the renderer

use particle_physics::{Particle, TypeCatalog, World};
use rand::Rng;

/// How freshly spawned particles are initialised.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnSettings {
    pub initial_speed: f32,
    pub radius: f32,
}

impl Default for SpawnSettings {
    fn default() -> Self {
        Self {
            initial_speed: particle_physics::INITIAL_SPEED,
            radius: particle_physics::PARTICLE_RADIUS,
        }
    }
}

/// Flat (x, y, z) and (r, g, b) buffers, stride 3, indexed like the particles.
///
/// The dirty flags tell the renderer which buffer changed since it last
/// uploaded; it clears them with the `take_*` methods.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderBuffers {
    pub positions: Vec<f32>,
    pub colors: Vec<f32>,
    positions_dirty: bool,
    colors_dirty: bool,
}

impl RenderBuffers {
    pub fn positions_dirty(&self) -> bool {
        self.positions_dirty
    }

    pub fn colors_dirty(&self) -> bool {
        self.colors_dirty
    }

    /// Returns whether positions changed, clearing the flag.
    pub fn take_positions_dirty(&mut self) -> bool {
        std::mem::take(&mut self.positions_dirty)
    }

    /// Returns whether colors changed, clearing the flag.
    pub fn take_colors_dirty(&mut self) -> bool {
        std::mem::take(&mut self.colors_dirty)
    }

    fn write_positions(&mut self, particles: &[Particle]) {
        self.positions.clear();
        self.positions
            .extend(particles.iter().flat_map(|p| p.position_xyz()));
        self.positions_dirty = true;
    }

    fn write_colors(&mut self, particles: &[Particle], catalog: &TypeCatalog) {
        self.colors.clear();
        self.colors
            .extend(particles.iter().flat_map(|p| catalog.lookup(p.particle_type).color));
        self.colors_dirty = true;
    }
}

/// Owns the live particle array and its render mirror.
#[derive(Debug, Clone, Default)]
pub struct ParticleStore {
    particles: Vec<Particle>,
    buffers: RenderBuffers,
    types_changed: bool,
}

impl ParticleStore {
    /// Spawn `count` particles with uniformly random type and position, and
    /// fill both mirror buffers.
    pub fn initialize<R: Rng + ?Sized>(
        count: usize,
        world: &World,
        catalog: &TypeCatalog,
        rng: &mut R,
        spawn: &SpawnSettings,
    ) -> Self {
        let mut store = Self::default();
        store.particles = spawn_particles(count, world, catalog, rng, spawn);
        store.types_changed = true;
        store.sync_render_buffers(catalog);
        store
    }

    /// Build from prepared particles. Every type must exist in `catalog`.
    pub fn from_particles(particles: Vec<Particle>, catalog: &TypeCatalog) -> Self {
        let mut store = Self {
            particles,
            buffers: RenderBuffers::default(),
            types_changed: true,
        };
        store.sync_render_buffers(catalog);
        store
    }

    /// Replace every particle with a fresh random set of the same size.
    pub fn reset<R: Rng + ?Sized>(
        &mut self,
        world: &World,
        catalog: &TypeCatalog,
        rng: &mut R,
        spawn: &SpawnSettings,
    ) {
        let count = self.particles.len();
        self.particles = spawn_particles(count, world, catalog, rng, spawn);
        self.types_changed = true;
        self.sync_render_buffers(catalog);
    }

    /// Copy positions into the mirror (and colors, if types changed since
    /// the last sync) and flag them for upload.
    pub fn sync_render_buffers(&mut self, catalog: &TypeCatalog) {
        self.buffers.write_positions(&self.particles);
        if std::mem::take(&mut self.types_changed) {
            self.buffers.write_colors(&self.particles, catalog);
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Mutable access for the physics pass. Types must not be changed
    /// through this; replace the set with [`ParticleStore::reset`] instead.
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn render_buffers(&self) -> &RenderBuffers {
        &self.buffers
    }

    pub fn render_buffers_mut(&mut self) -> &mut RenderBuffers {
        &mut self.buffers
    }
}

fn spawn_particles<R: Rng + ?Sized>(
    count: usize,
    world: &World,
    catalog: &TypeCatalog,
    rng: &mut R,
    spawn: &SpawnSettings,
) -> Vec<Particle> {
    (0..count)
        .map(|_| Particle::random(rng, world, catalog, spawn.initial_speed, spawn.radius))
        .collect()
}
