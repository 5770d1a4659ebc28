use std::sync::Arc;

use tracing::info;
use wgpu::util::DeviceExt;

use crate::config::ShadingBackend;
use crate::error::RenderError;
use crate::renderer::buffers::{
    OrbBuffers, OrbUniform, SparkleBuffers, TerrainBuffers, TerrainUniform, orb_vertex_layout,
    shaded_vertex_layout, sparkle_instance_layout, terrain_vertex_layout,
};
use crate::renderer::camera::{Camera, CameraUniform};
use crate::renderer::post::{HDR_FORMAT, PostPipeline, PostSettings};
use crate::scene::lighting::{Lighting, LightUniform, fresnel_schlick};
use crate::scene::{Orb, SparkleField};
use crate::terrain::{PlaneGeometry, Rgb};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

pub struct GpuState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,

    pub pipeline_terrain_gpu: wgpu::RenderPipeline,
    pub pipeline_terrain_cpu: wgpu::RenderPipeline,
    pub pipeline_orb: wgpu::RenderPipeline,
    pub pipeline_sparkles: wgpu::RenderPipeline,

    pub camera_buffer: wgpu::Buffer,
    pub light_buffer: wgpu::Buffer,
    pub scene_bind_group: wgpu::BindGroup,

    pub terrain_uniform_buffer: wgpu::Buffer,
    pub terrain_bind_group: wgpu::BindGroup,
    pub orb_bind_group: wgpu::BindGroup,

    pub terrain_buffers: TerrainBuffers,
    pub orb_buffers: OrbBuffers,
    pub sparkle_buffers: SparkleBuffers,

    pub depth_texture: wgpu::TextureView,
    pub post: PostPipeline,
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn depth_state(write: bool) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: write,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

const ADDITIVE_BLENDING: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::Zero,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

impl GpuState {
    pub async fn new(
        window: Arc<winit::window::Window>,
        plane: &PlaneGeometry,
        orb: &Orb,
        sparkles: &SparkleField,
        vsync: bool,
        post_settings: PostSettings,
    ) -> Result<Self, RenderError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;

        info!("using adapter {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await?;

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
            present_mode: if vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let terrain_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Terrain Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/terrain.wgsl").into()),
        });
        let orb_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Orb Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/orb.wgsl").into()),
        });
        let sparkle_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Sparkle Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/sparkles.wgsl").into()),
        });

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Buffer"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let light_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Light Buffer"),
            size: std::mem::size_of::<LightUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let terrain_uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Terrain Uniform Buffer"),
            size: std::mem::size_of::<TerrainUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let orb_uniform = OrbUniform {
            model: orb.model_matrix().to_cols_array_2d(),
            tint: [0.85, 0.95, 1.0, 1.0],
            f0: fresnel_schlick(1.0, orb.ior),
            opacity: 0.6,
            _pad: [0.0; 2],
        };
        let orb_uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Orb Uniform Buffer"),
            contents: bytemuck::cast_slice(&[orb_uniform]),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let scene_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Scene Bind Group Layout"),
                entries: &[uniform_entry(0), uniform_entry(1)],
            });

        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Bind Group"),
            layout: &scene_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: light_buffer.as_entire_binding(),
                },
            ],
        });

        let object_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Object Bind Group Layout"),
                entries: &[uniform_entry(0)],
            });

        let terrain_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Terrain Bind Group"),
            layout: &object_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: terrain_uniform_buffer.as_entire_binding(),
            }],
        });

        let orb_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Orb Bind Group"),
            layout: &object_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: orb_uniform_buffer.as_entire_binding(),
            }],
        });

        let object_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Object Pipeline Layout"),
            bind_group_layouts: &[&scene_bind_group_layout, &object_bind_group_layout],
            push_constant_ranges: &[],
        });

        let scene_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&scene_bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline_terrain_gpu = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Terrain GPU Pipeline"),
            layout: Some(&object_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &terrain_shader,
                entry_point: Some("vs_gpu"),
                buffers: &[terrain_vertex_layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &terrain_shader,
                entry_point: Some("fs_gpu"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: HDR_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(depth_state(true)),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let pipeline_terrain_cpu = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Terrain CPU Pipeline"),
            layout: Some(&object_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &terrain_shader,
                entry_point: Some("vs_cpu"),
                buffers: &[shaded_vertex_layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &terrain_shader,
                entry_point: Some("fs_cpu"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: HDR_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(depth_state(true)),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let pipeline_orb = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Orb Pipeline"),
            layout: Some(&object_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &orb_shader,
                entry_point: Some("vs_orb"),
                buffers: &[orb_vertex_layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &orb_shader,
                entry_point: Some("fs_orb"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: HDR_FORMAT,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(depth_state(false)),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let pipeline_sparkles = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Sparkle Pipeline"),
            layout: Some(&scene_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &sparkle_shader,
                entry_point: Some("vs_sparkle"),
                buffers: &[sparkle_instance_layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &sparkle_shader,
                entry_point: Some("fs_sparkle"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: HDR_FORMAT,
                    blend: Some(ADDITIVE_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(depth_state(false)),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let terrain_buffers = TerrainBuffers::new(&device, plane);
        let orb_buffers = OrbBuffers::new(&device, &orb.mesh);
        let sparkle_buffers = SparkleBuffers::new(&device, sparkles.len());
        let depth_texture = Self::create_depth_texture(&device, &config);
        let post = PostPipeline::new(&device, config.format, config.width, config.height, post_settings);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            pipeline_terrain_gpu,
            pipeline_terrain_cpu,
            pipeline_orb,
            pipeline_sparkles,
            camera_buffer,
            light_buffer,
            scene_bind_group,
            terrain_uniform_buffer,
            terrain_bind_group,
            orb_bind_group,
            terrain_buffers,
            orb_buffers,
            sparkle_buffers,
            depth_texture,
            post,
        })
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
    ) -> wgpu::TextureView {
        let size = wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = Self::create_depth_texture(&self.device, &self.config);
            self.post.resize(&self.device, self.config.width, self.config.height);
        }
    }

    pub fn update_camera(&self, camera: &Camera) {
        let viewport = [self.config.width as f32, self.config.height as f32];
        let uniform = CameraUniform::from_camera(camera, viewport);
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    pub fn update_lighting(&self, lighting: &Lighting) {
        self.queue.write_buffer(
            &self.light_buffer,
            0,
            bytemuck::cast_slice(&[lighting.to_uniform()]),
        );
    }

    pub fn update_terrain(&self, uniform: &TerrainUniform) {
        self.queue.write_buffer(
            &self.terrain_uniform_buffer,
            0,
            bytemuck::cast_slice(std::slice::from_ref(uniform)),
        );
    }

    pub fn set_vsync(&mut self, enabled: bool) {
        self.config.present_mode = if enabled {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };
        self.surface.configure(&self.device, &self.config);
    }

    /// Draws the scene into the HDR target, then bloom and aberration into `view`.
    pub fn render_scene(
        &self,
        view: &wgpu::TextureView,
        encoder: &mut wgpu::CommandEncoder,
        backend: ShadingBackend,
        background: Rgb,
        show_orb: bool,
    ) {
        self.draw_scene(encoder, backend, background, show_orb);
        self.post.render(&self.queue, encoder, view);
    }

    fn draw_scene(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        backend: ShadingBackend,
        background: Rgb,
        show_orb: bool,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: self.post.hdr_view(),
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: background.r as f64,
                        g: background.g as f64,
                        b: background.b as f64,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_texture,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_bind_group(0, &self.scene_bind_group, &[]);

        let terrain = &self.terrain_buffers;
        match backend {
            ShadingBackend::Gpu => {
                render_pass.set_pipeline(&self.pipeline_terrain_gpu);
                render_pass.set_vertex_buffer(0, terrain.base_vertex_buffer.slice(..));
            }
            ShadingBackend::Cpu if terrain.shaded_ready => {
                render_pass.set_pipeline(&self.pipeline_terrain_cpu);
                render_pass.set_vertex_buffer(0, terrain.shaded_vertex_buffer.slice(..));
            }
            // First CPU frame not back from the worker yet.
            ShadingBackend::Cpu => {
                render_pass.set_pipeline(&self.pipeline_terrain_gpu);
                render_pass.set_vertex_buffer(0, terrain.base_vertex_buffer.slice(..));
            }
        }
        render_pass.set_bind_group(1, &self.terrain_bind_group, &[]);
        render_pass.set_index_buffer(terrain.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..terrain.index_count, 0, 0..1);

        if self.sparkle_buffers.instance_count > 0 {
            render_pass.set_pipeline(&self.pipeline_sparkles);
            render_pass.set_vertex_buffer(0, self.sparkle_buffers.instance_buffer.slice(..));
            render_pass.draw(0..6, 0..self.sparkle_buffers.instance_count);
        }

        if !show_orb {
            return;
        }

        // Drawn last: it blends over terrain and sparkles without writing depth.
        render_pass.set_pipeline(&self.pipeline_orb);
        render_pass.set_bind_group(1, &self.orb_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.orb_buffers.vertex_buffer.slice(..));
        render_pass.set_index_buffer(
            self.orb_buffers.index_buffer.slice(..),
            wgpu::IndexFormat::Uint32,
        );
        render_pass.draw_indexed(0..self.orb_buffers.index_count, 0, 0..1);
    }
}
