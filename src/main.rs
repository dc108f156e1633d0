//! Particle Life
//!
//! Typed particles attracting and repelling each other through an asymmetric
//! force matrix, rendered as point sprites in a wraparound world.

mod input;

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use input::{Command, InputState};
use particle_renderer::{Camera, ParticleRenderer};
use particle_simulation::{ParticleSimulation, SimulationConfig};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    window::{Window, WindowId},
};

#[derive(Parser, Debug)]
#[command(name = "particle-life")]
#[command(about = "Particle life simulation", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML file overriding the built-in configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Number of particles
    #[arg(long)]
    particles: Option<usize>,

    /// Run this many steps without a window and exit
    #[arg(long, value_name = "STEPS")]
    headless: Option<u64>,
}

fn load_config(cli: &Cli) -> Result<SimulationConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            log::info!("Loading configuration from {}", path.display());
            SimulationConfig::load(path)?
        }
        None => SimulationConfig::default(),
    };

    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if let Some(count) = cli.particles {
        config.particle_count = count;
    }

    Ok(config)
}

fn run_headless(mut simulation: ParticleSimulation, steps: u64) {
    let started = Instant::now();

    for _ in 0..steps {
        simulation.step();

        if simulation.frame() % 100 == 0 {
            log::info!(
                "frame {:>6}: mean speed {:.3}, kinetic energy {:.1}",
                simulation.frame(),
                simulation.mean_speed(),
                simulation.kinetic_energy()
            );
        }
    }

    let elapsed = started.elapsed().as_secs_f32();
    log::info!(
        "✓ {} steps of {} particles in {:.2}s ({:.1} steps/s)",
        steps,
        simulation.particle_count(),
        elapsed,
        steps as f32 / elapsed.max(f32::EPSILON)
    );
    log::info!("  type census: {:?}", simulation.type_census());
}

struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    renderer: ParticleRenderer,
    camera: Camera,
    particle_size: f32,

    frame_times: VecDeque<f32>,
    last_frame_time: Instant,
}

impl GpuState {
    async fn new(window: Arc<Window>, particle_size: f32) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable GPU adapter")?;

        log::info!("✓ Using GPU: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to open GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = ParticleRenderer::new(&device, &queue, config.format);
        log::info!("✓ Renderer initialized");

        let camera = Camera::new(config.width, config.height);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            renderer,
            camera,
            particle_size,
            frame_times: VecDeque::with_capacity(100),
            last_frame_time: Instant::now(),
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.camera.resize(new_size.width, new_size.height);
        }
    }

    /// Upload whichever mirror buffers the simulation flagged since last frame.
    fn sync(&mut self, simulation: &mut ParticleSimulation) {
        let buffers = simulation.render_buffers_mut();

        // Colors first: a capacity change recreates both instance buffers
        if buffers.take_colors_dirty() {
            self.renderer
                .upload_colors(&self.device, &self.queue, &buffers.colors);
        }
        if buffers.take_positions_dirty() {
            self.renderer
                .upload_positions(&self.device, &self.queue, &buffers.positions);
        }
    }

    /// Draw one frame; returns (fps, average frame time in ms).
    fn render(&mut self) -> Result<(f32, f32), wgpu::SurfaceError> {
        let now = Instant::now();
        let frame_time = (now - self.last_frame_time).as_secs_f32() * 1000.0;
        self.last_frame_time = now;

        self.frame_times.push_back(frame_time);
        if self.frame_times.len() > 100 {
            self.frame_times.pop_front();
        }
        let avg_frame_time = self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32;
        let fps = 1000.0 / avg_frame_time.max(f32::EPSILON);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.renderer.render(
            &self.device,
            &self.queue,
            &view,
            &self.camera,
            self.particle_size,
        );

        output.present();
        Ok((fps, avg_frame_time))
    }
}

struct App {
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    simulation: ParticleSimulation,
    input: InputState,
    particle_size: f32,
    is_paused: bool,
    step_one_frame: bool,
    startup_error: Option<anyhow::Error>,
}

impl App {
    fn new(simulation: ParticleSimulation, particle_size: f32) -> Self {
        Self {
            window: None,
            gpu_state: None,
            simulation,
            input: InputState::default(),
            particle_size,
            is_paused: false,
            step_one_frame: false,
            startup_error: None,
        }
    }

    fn handle_command(&mut self, command: Command, event_loop: &ActiveEventLoop) {
        match command {
            Command::Reset => self.simulation.reset(),
            Command::TogglePause => {
                self.is_paused = !self.is_paused;
                log::info!("{}", if self.is_paused { "Paused" } else { "Resumed" });
            }
            Command::StepOnce => {
                if self.is_paused {
                    self.step_one_frame = true;
                }
            }
            Command::Exit => event_loop.exit(),
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(window), Some(gpu_state)) = (&self.window, &mut self.gpu_state) else {
            return;
        };

        gpu_state.camera.pan(self.input.pan_delta());

        if !self.is_paused || self.step_one_frame {
            self.simulation.step();
            self.step_one_frame = false;
        }
        gpu_state.sync(&mut self.simulation);

        match gpu_state.render() {
            Ok((fps, frame_time)) => {
                window.set_title(&format!(
                    "Particle Life - {:.0} FPS ({:.2}ms) - {} particles{}",
                    fps,
                    frame_time,
                    self.simulation.particle_count(),
                    if self.is_paused { " - paused" } else { "" }
                ));
            }
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost, reconfiguring");
                gpu_state.resize(window.inner_size());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory");
                event_loop.exit();
            }
            Err(e) => log::warn!("Render error: {:?}", e),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title("Particle Life")
            .with_inner_size(winit::dpi::LogicalSize::new(1920, 1080));

        let started = event_loop
            .create_window(window_attributes)
            .context("failed to create window")
            .and_then(|window| {
                let window = Arc::new(window);
                let gpu_state = pollster::block_on(GpuState::new(window.clone(), self.particle_size))?;
                Ok((window, gpu_state))
            });

        match started {
            Ok((window, gpu_state)) => {
                self.window = Some(window);
                self.gpu_state = Some(gpu_state);
            }
            Err(e) => {
                log::error!("Startup failed: {:#}", e);
                self.startup_error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(physical_size) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size);
                }
            }

            WindowEvent::Focused(false) => self.input.clear(),

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key_code),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => {
                let pressed = state == ElementState::Pressed;
                if let Some(command) = self.input.handle_key(key_code, pressed, repeat) {
                    self.handle_command(command, event_loop);
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_x, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32,
                };

                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.camera.zoom(scroll);
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    // Initialize logger (RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let simulation = ParticleSimulation::new(&config)?;

    if let Some(steps) = cli.headless {
        run_headless(simulation, steps);
        return Ok(());
    }

    log::info!("Controls: WASD/arrows pan, wheel zooms, R resets, Space pauses, N steps");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(simulation, config.particle_radius);
    event_loop.run_app(&mut app)?;

    match app.startup_error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
