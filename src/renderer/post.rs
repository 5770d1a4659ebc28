//! Bloom and chromatic aberration over an HDR offscreen target.
//!
//! The scene renders into `hdr_view`. Bright areas are thresholded into a
//! half-resolution texture, blurred horizontally then vertically (ping-pong,
//! `blur_passes` times), and the composite adds the glow back over the scene
//! with a small per-channel offset before writing to the surface.

use bytemuck::{Pod, Zeroable};

pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostSettings {
    pub enabled: bool,
    /// Luminance where the bloom starts.
    pub luminance_threshold: f32,
    /// Width of the soft knee above the threshold.
    pub luminance_smoothing: f32,
    pub intensity: f32,
    /// UV offset of the red and blue channels.
    pub aberration_offset: [f32; 2],
    pub blur_passes: u32,
}

impl Default for PostSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            luminance_threshold: 0.2,
            luminance_smoothing: 0.9,
            intensity: 1.5,
            aberration_offset: [0.001, 0.001],
            blur_passes: 2,
        }
    }
}

impl PostSettings {
    pub fn with_enabled(enabled: bool) -> Self {
        Self {
            enabled,
            ..Default::default()
        }
    }

    /// Uniform for one frame. Disabled effects keep the composite pass but
    /// contribute nothing.
    pub fn to_uniform(&self, bloom_width: u32, bloom_height: u32) -> PostUniform {
        let (intensity, aberration) = if self.enabled {
            (self.intensity, self.aberration_offset)
        } else {
            (0.0, [0.0; 2])
        };
        PostUniform {
            texel_size: [1.0 / bloom_width.max(1) as f32, 1.0 / bloom_height.max(1) as f32],
            aberration,
            threshold: self.luminance_threshold,
            smoothing: self.luminance_smoothing,
            intensity,
            _pad: 0.0,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct PostUniform {
    pub texel_size: [f32; 2],
    pub aberration: [f32; 2],
    pub threshold: f32,
    pub smoothing: f32,
    pub intensity: f32,
    pub _pad: f32,
}

/// Half resolution, never zero.
pub fn bloom_extent(width: u32, height: u32) -> (u32, u32) {
    ((width / 2).max(1), (height / 2).max(1))
}

struct Targets {
    hdr_view: wgpu::TextureView,
    bright_view: wgpu::TextureView,
    blur_a_view: wgpu::TextureView,
    blur_b_view: wgpu::TextureView,
    threshold_bind_group: wgpu::BindGroup,
    from_bright: wgpu::BindGroup,
    from_blur_a: wgpu::BindGroup,
    from_blur_b: wgpu::BindGroup,
    composite_bind_group: wgpu::BindGroup,
    bloom_size: (u32, u32),
}

pub struct PostPipeline {
    pipeline_threshold: wgpu::RenderPipeline,
    pipeline_blur_h: wgpu::RenderPipeline,
    pipeline_blur_v: wgpu::RenderPipeline,
    pipeline_composite: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    targets: Targets,
    pub settings: PostSettings,
}

impl PostPipeline {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        settings: PostSettings,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Post Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/post.wgsl").into()),
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Post Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Post Uniform Buffer"),
            size: std::mem::size_of::<PostUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Post Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: std::num::NonZeroU64::new(
                            std::mem::size_of::<PostUniform>() as u64,
                        ),
                    },
                    count: None,
                },
                texture_entry(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                texture_entry(3),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Post Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let create_pipeline = |label: &str, entry_point: &str, format: wgpu::TextureFormat| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(entry_point),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };

        let pipeline_threshold = create_pipeline("Bloom Threshold Pipeline", "fs_threshold", HDR_FORMAT);
        let pipeline_blur_h = create_pipeline("Bloom Blur H Pipeline", "fs_blur_h", HDR_FORMAT);
        let pipeline_blur_v = create_pipeline("Bloom Blur V Pipeline", "fs_blur_v", HDR_FORMAT);
        let pipeline_composite = create_pipeline("Composite Pipeline", "fs_composite", surface_format);

        let targets = Targets::new(device, &bind_group_layout, &uniform_buffer, &sampler, width, height);

        Self {
            pipeline_threshold,
            pipeline_blur_h,
            pipeline_blur_v,
            pipeline_composite,
            uniform_buffer,
            bind_group_layout,
            sampler,
            targets,
            settings,
        }
    }

    /// Where the scene pass draws.
    pub fn hdr_view(&self) -> &wgpu::TextureView {
        &self.targets.hdr_view
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.targets = Targets::new(
            device,
            &self.bind_group_layout,
            &self.uniform_buffer,
            &self.sampler,
            width,
            height,
        );
    }

    pub fn render(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        output: &wgpu::TextureView,
    ) {
        let (bw, bh) = self.targets.bloom_size;
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&self.settings.to_uniform(bw, bh)),
        );

        let t = &self.targets;
        if self.settings.enabled {
            fullscreen_pass(encoder, "Bloom Threshold Pass", &t.bright_view, &self.pipeline_threshold, &t.threshold_bind_group);
            let mut source = &t.from_bright;
            for _ in 0..self.settings.blur_passes.clamp(1, 5) {
                fullscreen_pass(encoder, "Bloom Blur H Pass", &t.blur_a_view, &self.pipeline_blur_h, source);
                fullscreen_pass(encoder, "Bloom Blur V Pass", &t.blur_b_view, &self.pipeline_blur_v, &t.from_blur_a);
                source = &t.from_blur_b;
            }
        }
        fullscreen_pass(encoder, "Composite Pass", output, &self.pipeline_composite, &t.composite_bind_group);
    }
}

fn fullscreen_pass(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    target: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    bind_group: &wgpu::BindGroup,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, bind_group, &[]);
    pass.draw(0..3, 0..1);
}

impl Targets {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        uniform_buffer: &wgpu::Buffer,
        sampler: &wgpu::Sampler,
        width: u32,
        height: u32,
    ) -> Self {
        let bloom_size = bloom_extent(width, height);
        let hdr_view = create_target(device, "HDR Scene Texture", width.max(1), height.max(1));
        let bright_view = create_target(device, "Bloom Bright Texture", bloom_size.0, bloom_size.1);
        let blur_a_view = create_target(device, "Bloom Blur A Texture", bloom_size.0, bloom_size.1);
        let blur_b_view = create_target(device, "Bloom Blur B Texture", bloom_size.0, bloom_size.1);

        let bind = |label: &str, source: &wgpu::TextureView, bloom: &wgpu::TextureView| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(source),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(bloom),
                    },
                ],
            })
        };

        // Binding 3 is only read by the composite; the other passes repeat
        // their source there so no pass samples its own attachment.
        let threshold_bind_group = bind("Bloom Threshold Bind Group", &hdr_view, &hdr_view);
        let from_bright = bind("Bloom From Bright Bind Group", &bright_view, &bright_view);
        let from_blur_a = bind("Bloom From A Bind Group", &blur_a_view, &blur_a_view);
        let from_blur_b = bind("Bloom From B Bind Group", &blur_b_view, &blur_b_view);
        let composite_bind_group = bind("Composite Bind Group", &hdr_view, &blur_b_view);

        Self {
            hdr_view,
            bright_view,
            blur_a_view,
            blur_b_view,
            threshold_bind_group,
            from_bright,
            from_blur_a,
            from_blur_b,
            composite_bind_group,
            bloom_size,
        }
    }
}

fn create_target(device: &wgpu::Device, label: &str, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: HDR_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_uniform_matches_wgsl_layout() {
        assert_eq!(std::mem::size_of::<PostUniform>(), 32);
    }

    #[test]
    fn defaults_match_hero_scene() {
        let s = PostSettings::default();
        assert!(s.enabled);
        assert_eq!(s.luminance_threshold, 0.2);
        assert_eq!(s.luminance_smoothing, 0.9);
        assert_eq!(s.intensity, 1.5);
        assert_eq!(s.aberration_offset, [0.001, 0.001]);
        assert_eq!(s.blur_passes, 2);
    }

    #[test]
    fn uniform_carries_settings_and_half_res_texels() {
        let u = PostSettings::default().to_uniform(800, 450);
        assert_eq!(u.texel_size, [1.0 / 800.0, 1.0 / 450.0]);
        assert_eq!(u.threshold, 0.2);
        assert_eq!(u.smoothing, 0.9);
        assert_eq!(u.intensity, 1.5);
        assert_eq!(u.aberration, [0.001, 0.001]);
    }

    #[test]
    fn disabled_effects_pass_the_scene_through() {
        let u = PostSettings::with_enabled(false).to_uniform(1, 1);
        assert_eq!(u.intensity, 0.0);
        assert_eq!(u.aberration, [0.0, 0.0]);
    }

    #[test]
    fn bloom_extent_halves_and_never_hits_zero() {
        assert_eq!(bloom_extent(1600, 900), (800, 450));
        assert_eq!(bloom_extent(1, 1), (1, 1));
        assert_eq!(bloom_extent(0, 3), (1, 1));
    }
}
