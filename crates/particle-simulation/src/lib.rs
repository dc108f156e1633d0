//! # Particle Life Simulation
//!
//! Owned simulation state: the particle store with its render mirror
//! buffers, boot-time configuration and the per-frame step.

pub mod error;
pub mod params;
pub mod simulation;
pub mod store;

pub use error::*;
pub use params::*;
pub use simulation::*;
pub use store::*;
