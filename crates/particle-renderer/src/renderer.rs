//! Particle rendering system

use std::borrow::Cow;

use crate::camera::{Camera, CameraUniform};
use crate::sprite::{circle_mask, SPRITE_TEXTURE_SIZE};

/// Bytes per particle in each instance buffer (three f32)
const STRIDE: u64 = 3 * std::mem::size_of::<f32>() as u64;

pub struct ParticleRenderer {
    render_pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    position_buffer: wgpu::Buffer,
    color_buffer: wgpu::Buffer,
    capacity: u64,
    instance_count: u32,
    clear_color: wgpu::Color,
    /// Surface applies the sRGB encoding on write, so colors go in linear
    srgb_surface: bool,
}

impl ParticleRenderer {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, format: wgpu::TextureFormat) -> Self {
        // Create camera buffer
        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Buffer"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Upload the circle mask used as the point sprite
        let sprite_extent = wgpu::Extent3d {
            width: SPRITE_TEXTURE_SIZE,
            height: SPRITE_TEXTURE_SIZE,
            depth_or_array_layers: 1,
        };
        let sprite_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Particle Sprite Texture"),
            size: sprite_extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &sprite_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &circle_mask(SPRITE_TEXTURE_SIZE),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(SPRITE_TEXTURE_SIZE),
                rows_per_image: Some(SPRITE_TEXTURE_SIZE),
            },
            sprite_extent,
        );
        let sprite_view = sprite_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sprite_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Particle Sprite Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        // Load shader
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Particle Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/particle.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Particle Bind Group Layout"),
            entries: &[
                // Camera (Uniform) - Binding 0
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Sprite texture - Binding 1
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // Sprite sampler - Binding 2
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Particle Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&sprite_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sprite_sampler),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Render Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        // One instance per particle, fed from the two flat mirror buffers
        let position_attributes = wgpu::vertex_attr_array![0 => Float32x3];
        let color_attributes = wgpu::vertex_attr_array![1 => Float32x3];
        let instance_layouts = [
            wgpu::VertexBufferLayout {
                array_stride: STRIDE,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &position_attributes,
            },
            wgpu::VertexBufferLayout {
                array_stride: STRIDE,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &color_attributes,
            },
        ];

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Particle Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vertex"),
                buffers: &instance_layouts,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fragment"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let (position_buffer, color_buffer) = Self::create_instance_buffers(device, 1);

        Self {
            render_pipeline,
            camera_buffer,
            bind_group,
            position_buffer,
            color_buffer,
            capacity: 1,
            instance_count: 0,
            clear_color: mocha_base(format.is_srgb()),
            srgb_surface: format.is_srgb(),
        }
    }

    fn create_instance_buffers(
        device: &wgpu::Device,
        capacity: u64,
    ) -> (wgpu::Buffer, wgpu::Buffer) {
        let descriptor = |label: &'static str| wgpu::BufferDescriptor {
            label: Some(label),
            size: capacity * STRIDE,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        };
        (
            device.create_buffer(&descriptor("Particle Position Buffer")),
            device.create_buffer(&descriptor("Particle Color Buffer")),
        )
    }

    /// Grow the instance buffers when the particle count exceeds capacity.
    /// Returns true if the buffers were recreated (their contents are lost).
    fn ensure_capacity(&mut self, device: &wgpu::Device, count: u64) -> bool {
        if count <= self.capacity {
            return false;
        }

        let (position_buffer, color_buffer) = Self::create_instance_buffers(device, count);
        self.position_buffer = position_buffer;
        self.color_buffer = color_buffer;
        self.capacity = count;
        log::debug!("Particle instance buffers resized to {} particles", count);
        true
    }

    /// Upload a flat (x, y, z) buffer, stride 3.
    pub fn upload_positions(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        positions: &[f32],
    ) {
        let count = (positions.len() / 3) as u64;
        if self.ensure_capacity(device, count) {
            log::warn!("Instance buffers grew during a position upload; colors must be re-sent");
        }
        queue.write_buffer(&self.position_buffer, 0, bytemuck::cast_slice(positions));
        self.instance_count = count as u32;
    }

    /// Upload a flat (r, g, b) buffer, stride 3, in sRGB.
    pub fn upload_colors(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, colors: &[f32]) {
        self.ensure_capacity(device, (colors.len() / 3) as u64);
        let colors = surface_colors(colors, self.srgb_surface);
        queue.write_buffer(&self.color_buffer, 0, bytemuck::cast_slice(&*colors));
    }

    pub fn instance_count(&self) -> u32 {
        self.instance_count
    }

    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_view: &wgpu::TextureView,
        camera: &Camera,
        particle_size: f32,
    ) {
        // Update camera
        queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[camera.to_uniform(particle_size)]),
        );

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: surface_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if self.instance_count > 0 {
                render_pass.set_pipeline(&self.render_pipeline);
                render_pass.set_bind_group(0, &self.bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.position_buffer.slice(..));
                render_pass.set_vertex_buffer(1, self.color_buffer.slice(..));
                render_pass.draw(0..6, 0..self.instance_count);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }
}

/// Catppuccin Mocha base as a clear color for the given surface encoding
fn mocha_base(srgb_surface: bool) -> wgpu::Color {
    let base = catppuccin::PALETTE.mocha.colors.base.rgb;
    let channel = |c: u8| {
        let c = c as f64 / 255.0;
        if srgb_surface {
            srgb_to_linear(c)
        } else {
            c
        }
    };
    wgpu::Color {
        r: channel(base.r),
        g: channel(base.g),
        b: channel(base.b),
        a: 1.0,
    }
}

/// sRGB colors as the surface expects them: linearised for an sRGB surface,
/// passed through otherwise.
fn surface_colors(colors: &[f32], srgb_surface: bool) -> Cow<'_, [f32]> {
    if srgb_surface {
        Cow::Owned(
            colors
                .iter()
                .map(|&c| srgb_to_linear(c as f64) as f32)
                .collect(),
        )
    } else {
        Cow::Borrowed(colors)
    }
}

fn srgb_to_linear(c: f64) -> f64 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}
