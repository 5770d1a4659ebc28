use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::{Directive, LevelFilter};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use glam::Vec2;

mod cli;
mod config;
mod error;
mod renderer;
mod scene;
mod terrain;
mod ui;

use config::{SceneConfig, ShadingBackend};
use renderer::post::PostSettings;
use renderer::{Camera, GpuState, TerrainUniform};
use scene::sparkles::SparkleInstance;
use scene::{Lighting, Orb, SparkleField};
use terrain::{FrameClock, PlaneGeometry, TerrainEngine};
use ui::{SceneStats, UiActions, UiState, apply_theme, draw_help_overlay, draw_side_panel};

#[derive(Default)]
struct InputState {
    dragging: bool,
    mouse_delta: Vec2,
}

struct App {
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    egui_state: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
    egui_ctx: egui::Context,

    config: SceneConfig,
    plane: PlaneGeometry,
    orb: Orb,
    sparkles: SparkleField,
    sparkle_instances: Vec<SparkleInstance>,
    lighting: Lighting,
    camera: Camera,
    clock: FrameClock,
    // Spawned the first time the CPU backend is selected.
    engine: Option<TerrainEngine>,
    shaded_time: f32,

    ui_state: UiState,
    input: InputState,

    frame_count: u32,
    fps_timer: Instant,
    fps: f32,

    last_vsync_state: bool,
    last_backend: ShadingBackend,
    last_frame_time: Instant,

    failed: bool,
}

impl App {
    fn new(config: SceneConfig) -> Self {
        let terrain = &config.terrain;
        let plane = PlaneGeometry::new(terrain.width, terrain.height, terrain.segments, terrain.segments);
        info!(
            "terrain plane {}x{} with {} vertices",
            terrain.width,
            terrain.height,
            plane.len()
        );

        let sparkles = SparkleField::from_config(&config.sparkles);
        let ui_state = UiState::from_config(&config);

        Self {
            window: None,
            gpu: None,
            egui_state: None,
            egui_renderer: None,
            egui_ctx: egui::Context::default(),

            orb: Orb::from_config(&config.orb),
            sparkle_instances: Vec::with_capacity(sparkles.len()),
            sparkles,
            lighting: Lighting::from_config(&config.lighting),
            camera: Camera::from_config(&config.camera),
            clock: FrameClock::start(),
            engine: None,
            shaded_time: 0.0,
            plane,

            last_vsync_state: ui_state.vsync_enabled,
            last_backend: ui_state.backend,
            ui_state,
            input: InputState::default(),

            frame_count: 0,
            fps_timer: Instant::now(),
            fps: 0.0,

            last_frame_time: Instant::now(),

            failed: false,
            config,
        }
    }

    fn init_gpu(&mut self, window: Arc<Window>) -> Result<(), error::RenderError> {
        let gpu = pollster::block_on(GpuState::new(
            window.clone(),
            &self.plane,
            &self.orb,
            &self.sparkles,
            self.ui_state.vsync_enabled,
            PostSettings::with_enabled(self.ui_state.post_effects),
        ))?;
        gpu.update_lighting(&self.lighting);

        let size = window.inner_size();
        self.camera.set_aspect(size.width as f32, size.height as f32);

        let egui_state = egui_winit::State::new(
            self.egui_ctx.clone(),
            self.egui_ctx.viewport_id(),
            &window,
            Some(window.scale_factor() as f32),
            None,
            Some(2048),
        );

        let egui_renderer =
            egui_wgpu::Renderer::new(&gpu.device, gpu.config.format, None, 1, false);

        apply_theme(&self.egui_ctx);

        self.window = Some(window);
        self.gpu = Some(gpu);
        self.egui_state = Some(egui_state);
        self.egui_renderer = Some(egui_renderer);
        Ok(())
    }

    fn engine(&mut self) -> &TerrainEngine {
        self.engine.get_or_insert_with(|| {
            info!("starting CPU terrain worker");
            TerrainEngine::new(self.plane.points.clone(), self.plane.uvs.clone())
        })
    }

    fn update(&mut self) {
        self.frame_count += 1;
        if self.fps_timer.elapsed().as_secs_f32() >= 1.0 {
            self.fps = self.frame_count as f32 / self.fps_timer.elapsed().as_secs_f32();
            self.frame_count = 0;
            self.fps_timer = Instant::now();
        }

        if self.input.dragging {
            self.camera.process_mouse_movement(self.input.mouse_delta);
        }
        self.input.mouse_delta = Vec2::ZERO;
    }

    fn scene_stats(&self, t: f32) -> SceneStats {
        let mut stats = SceneStats {
            fps: self.fps,
            time: t,
            clock_paused: self.clock.is_paused(),
            vertex_count: self.plane.len() as u32,
            ..Default::default()
        };
        if let Some(engine) = &self.engine {
            let engine_stats = engine.stats();
            stats.cpu_frames = engine_stats.frames_evaluated.load(Ordering::Relaxed);
            stats.cpu_skipped = engine_stats.skipped_requests.load(Ordering::Relaxed);
            stats.cpu_dropped = engine_stats.dropped_frames.load(Ordering::Relaxed);
            stats.cpu_eval_ms = *engine_stats.avg_eval_ms.lock();
            stats.cpu_lag_ms = ((t - self.shaded_time) * 1000.0).max(0.0);
        }
        stats
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        if self.ui_state.fps_cap_enabled {
            let frame_duration = Duration::from_secs_f64(1.0 / self.ui_state.fps_cap as f64);
            let elapsed = self.last_frame_time.elapsed();
            if elapsed < frame_duration {
                std::thread::sleep(frame_duration - elapsed);
            }
        }
        self.last_frame_time = Instant::now();

        // Every consumer this frame sees the same time.
        let t = self.clock.elapsed();
        let stats = self.scene_stats(t);

        let (Some(window), Some(egui_state)) = (&self.window, &mut self.egui_state) else {
            return Ok(());
        };

        let raw_input = egui_state.take_egui_input(window);

        let distance = self.camera.orbital_distance;
        let zoom_enabled = self.camera.enable_zoom;

        let mut ui_actions = UiActions::default();

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            ui_actions = draw_side_panel(ctx, &mut self.ui_state, &stats);
            draw_help_overlay(ctx, distance, zoom_enabled);
        });

        self.handle_ui_actions(ui_actions);

        let params = self.ui_state.shader_parameters();
        let backend = self.ui_state.backend;
        if backend != self.last_backend {
            debug!("shading backend switched to {:?}", backend);
            self.last_backend = backend;
        }

        let latest_frame = if backend == ShadingBackend::Cpu {
            let engine = self.engine();
            engine.evaluate(t, params);
            engine.try_recv_latest()
        } else {
            None
        };

        if self.ui_state.show_sparkles && !self.sparkles.is_empty() {
            self.sparkles.instances_into(t, &mut self.sparkle_instances);
        } else {
            self.sparkle_instances.clear();
        }

        let Some(gpu) = &mut self.gpu else { return Ok(()) };
        let Some(window) = &self.window else { return Ok(()) };
        let Some(egui_state) = &mut self.egui_state else {
            return Ok(());
        };
        let Some(egui_renderer) = &mut self.egui_renderer else {
            return Ok(());
        };

        egui_state.handle_platform_output(window, full_output.platform_output);

        if self.ui_state.vsync_enabled != self.last_vsync_state {
            gpu.set_vsync(self.ui_state.vsync_enabled);
            self.last_vsync_state = self.ui_state.vsync_enabled;
        }

        gpu.post.settings.enabled = self.ui_state.post_effects;
        gpu.update_terrain(&TerrainUniform::new(t, &params));
        match latest_frame {
            Some(frame) => {
                gpu.terrain_buffers.upload_shaded(&gpu.queue, &frame.vertices);
                self.shaded_time = frame.t;
            }
            // A stale CPU frame must not reappear after switching back.
            None if backend == ShadingBackend::Gpu => gpu.terrain_buffers.shaded_ready = false,
            None => {}
        }
        gpu.sparkle_buffers.upload(&gpu.queue, &self.sparkle_instances);

        let output = match gpu.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.resize(gpu.size);
                return Ok(());
            }
            Err(e @ wgpu::SurfaceError::OutOfMemory) => return Err(e),
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("surface timeout, skipping frame");
                return Ok(());
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        gpu.update_camera(&self.camera);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, delta) in full_output.textures_delta.set {
            egui_renderer.update_texture(&gpu.device, &gpu.queue, id, &delta);
        }

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Main Encoder"),
            });

        egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        gpu.render_scene(
            &view,
            &mut encoder,
            backend,
            self.config.render.background,
            self.ui_state.show_orb,
        );

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let mut render_pass = render_pass.forget_lifetime();
            egui_renderer.render(&mut render_pass, &paint_jobs, &screen_descriptor);
        }

        for id in full_output.textures_delta.free {
            egui_renderer.free_texture(&id);
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        window.request_redraw();
        Ok(())
    }

    fn toggle_clock(&mut self) {
        if self.clock.is_paused() {
            self.clock.resume();
        } else {
            self.clock.pause();
        }
    }

    fn reset_camera(&mut self) {
        let aspect = self.camera.aspect;
        self.camera = Camera::from_config(&self.config.camera);
        self.camera.aspect = aspect;
    }

    fn handle_ui_actions(&mut self, actions: UiActions) {
        if actions.toggle_clock {
            self.toggle_clock();
        }

        if actions.restart_clock {
            let paused = self.clock.is_paused();
            self.clock = FrameClock::start();
            if paused {
                self.clock.pause();
            }
        }

        if actions.reset_camera {
            self.reset_camera();
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Space => self.toggle_clock(),
            KeyCode::KeyR => self.reset_camera(),
            _ => {}
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title("Glass Terrain")
            .with_inner_size(PhysicalSize::new(1600, 900));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("failed to create window: {e}");
                self.failed = true;
                event_loop.exit();
                return;
            }
        };

        if let Err(e) = self.init_gpu(window) {
            error!("{e}");
            self.failed = true;
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Some(egui_state) = &mut self.egui_state {
            if let Some(window) = &self.window {
                let response = egui_state.on_window_event(window, &event);
                if response.consumed {
                    return;
                }
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                if let Some(engine) = &self.engine {
                    engine.stop();
                }
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(size);
                    self.camera
                        .set_aspect(size.width as f32, size.height as f32);
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    if let PhysicalKey::Code(key) = event.physical_key {
                        self.handle_key(key);
                    }
                }
            }

            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                self.input.dragging = state == ElementState::Pressed;
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    winit::event::MouseScrollDelta::LineDelta(_, y) => y,
                    winit::event::MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 50.0,
                };
                self.camera.process_scroll(scroll);
            }

            WindowEvent::RedrawRequested => {
                self.update();
                if let Err(e) = self.render() {
                    error!("render failed: {e}");
                    event_loop.exit();
                }
            }

            _ => {}
        }
    }

    fn device_event(&mut self, _: &ActiveEventLoop, _: winit::event::DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.input.dragging {
                self.input.mouse_delta.x += delta.0 as f32;
                self.input.mouse_delta.y += delta.1 as f32;
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() {
    let args = cli::parse();

    let log_directive = args.log_level.as_deref().unwrap_or("glass_terrain=info");
    let directive: Directive = log_directive.parse().unwrap_or_else(|_| {
        eprintln!("invalid log directive {log_directive:?}, using info");
        LevelFilter::INFO.into()
    });
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .init();

    info!("glass-terrain v{} starting", env!("CARGO_PKG_VERSION"));

    let mut config = config::load_or_default(args.config.as_deref());
    args.apply_overrides(&mut config);
    info!(
        "backend {:?}, {} segments, distort {}",
        config.render.backend, config.terrain.segments, config.terrain.distort
    );

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            error!("failed to create event loop: {e}");
            std::process::exit(1);
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    if let Err(e) = event_loop.run_app(&mut app) {
        error!("event loop error: {e}");
        std::process::exit(1);
    }
    if app.failed {
        std::process::exit(1);
    }
    info!("shutdown complete");
}
