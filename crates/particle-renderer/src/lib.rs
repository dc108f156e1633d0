//! # Particle Renderer
//!
//! Draws particles as instanced circular point sprites from flat position
//! and color buffers, seen through a pan/zoom camera.

pub mod camera;
pub mod renderer;
pub mod sprite;

pub use camera::*;
pub use renderer::*;
pub use sprite::*;
