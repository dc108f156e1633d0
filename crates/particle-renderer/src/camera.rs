//! Camera looking straight down at the simulation plane

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};

/// World units the camera moves per frame while a pan key is held
pub const PAN_SPEED: f32 = 30.0;

/// Distance multiplier for one zoom-in wheel event
pub const ZOOM_IN_FACTOR: f32 = 0.9;

/// Distance multiplier for one zoom-out wheel event
pub const ZOOM_OUT_FACTOR: f32 = 1.1;

/// Camera uniform for GPU
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub position: [f32; 3],
    pub particle_size: f32,
}

/// Perspective camera above the z = 0 plane, looking down -z.
pub struct Camera {
    pub position: Vec3,
    pub aspect: f32,
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 1500.0),
            aspect: width as f32 / height.max(1) as f32,
            fovy: 90.0_f32.to_radians(),
            znear: 0.1,
            zfar: 5000.0,
        }
    }

    pub fn pan(&mut self, delta: Vec2) {
        self.position.x += delta.x;
        self.position.y += delta.y;
    }

    /// Only the sign of `scroll` matters: positive zooms in.
    pub fn zoom(&mut self, scroll: f32) {
        if scroll > 0.0 {
            self.position.z *= ZOOM_IN_FACTOR;
        } else if scroll < 0.0 {
            self.position.z *= ZOOM_OUT_FACTOR;
        }
    }

    pub fn build_view_projection_matrix(&self) -> Mat4 {
        let target = self.position - Vec3::Z;
        let view = Mat4::look_at_rh(self.position, target, Vec3::Y);
        let proj = Mat4::perspective_rh(self.fovy, self.aspect, self.znear, self.zfar);
        proj * view
    }

    pub fn to_uniform(&self, particle_size: f32) -> CameraUniform {
        CameraUniform {
            view_proj: self.build_view_projection_matrix().to_cols_array_2d(),
            position: self.position.to_array(),
            particle_size,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }
}
