//! World rectangle and toroidal wraparound

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// The fixed rectangle `[-width/2, width/2] x [-height/2, height/2]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct World {
    pub width: f32,
    pub height: f32,
}

impl Default for World {
    fn default() -> Self {
        Self::new(crate::constants::WORLD_WIDTH, crate::constants::WORLD_HEIGHT)
    }
}

impl World {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(ConfigError::param("world.width", "must be > 0"));
        }
        if !(self.height.is_finite() && self.height > 0.0) {
            return Err(ConfigError::param("world.height", "must be > 0"));
        }
        Ok(())
    }

    #[inline]
    pub fn half_extents(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    pub fn contains(&self, position: Vec2) -> bool {
        let half = self.half_extents();
        position.x >= -half.x && position.x <= half.x && position.y >= -half.y && position.y <= half.y
    }

    /// Uniformly random point inside the rectangle.
    pub fn sample_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec2 {
        let x = rng.random::<f32>() * self.width - self.width * 0.5;
        let y = rng.random::<f32>() * self.height - self.height * 0.5;
        Vec2::new(x, y)
    }

    /// Teleport a coordinate that left the rectangle to the opposite edge.
    ///
    /// Single wrap, not modulo: only valid while per-frame displacement stays
    /// below one world dimension (max speed is far smaller than the world).
    #[inline]
    pub fn wrap(&self, position: &mut Vec2) {
        let half = self.half_extents();

        if position.x < -half.x {
            position.x = half.x;
        } else if position.x > half.x {
            position.x = -half.x;
        }

        if position.y < -half.y {
            position.y = half.y;
        } else if position.y > half.y {
            position.y = -half.y;
        }
    }
}
