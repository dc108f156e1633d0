//! # Particle Life Physics
//!
//! CPU kernel for "particle life" dynamics: typed point particles attracting
//! and repelling each other through an asymmetric force matrix, with crowd
//! pressure, damping, a speed cap and toroidal world bounds.

pub mod boundary;
pub mod constants;
pub mod error;
pub mod force_matrix;
pub mod forces;
pub mod particle;
pub mod particle_type;

pub use boundary::*;
pub use constants::*;
pub use error::*;
pub use force_matrix::*;
pub use forces::*;
pub use particle::*;
pub use particle_type::*;
