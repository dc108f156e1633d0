//! Default constants for the particle life simulation
//!
//! These are the boot-time values used when no configuration file overrides
//! them. Distances and speeds are in world units, speeds per frame.

/// Width of the toroidal world
pub const WORLD_WIDTH: f32 = 8000.0;

/// Height of the toroidal world
pub const WORLD_HEIGHT: f32 = 4000.0;

/// Number of particles spawned at init and on every reset
pub const PARTICLE_COUNT: usize = 1200;

/// Hard cap on velocity magnitude after damping
pub const MAX_SPEED: f32 = 15.0;

/// Scale of the random initial velocity on each axis
pub const INITIAL_SPEED: f32 = 1.0;

/// Multiplicative velocity decay per step
pub const DAMPING: f32 = 0.95;

/// Below this distance pure short-range repulsion overrides the type rule
pub const REPULSION_RADIUS: f32 = 25.0;

/// Beyond this distance particles do not interact
pub const INTERACTION_RADIUS: f32 = 280.0;

/// Neighbors closer than this count toward local crowding
pub const LOCAL_DENSITY_RADIUS: f32 = 50.0;

/// Neighbor count above which pressure braking kicks in
pub const DENSITY_THRESHOLD: u32 = 30;

/// Braking force per excess neighbor
pub const PRESSURE_FACTOR: f32 = 0.1;

/// Strength of the hard-core overlap push
pub const CORE_REPULSION: f32 = 0.7;

/// Particle radius (also the rendered sprite size)
pub const PARTICLE_RADIUS: f32 = 15.0;
