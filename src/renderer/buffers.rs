use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::scene::orb::{OrbVertex, SphereMesh};
use crate::scene::sparkles::SparkleInstance;
use crate::terrain::{PlaneGeometry, ShadedVertex, ShaderParameters, terrain_model_matrix};

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct TerrainVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct TerrainUniform {
    pub model: [[f32; 4]; 4],
    pub time: f32,
    pub distort: f32,
    pub mix_mode: u32,
    pub _pad: f32,
    pub color_a: [f32; 4],
    pub color_b: [f32; 4],
}

impl TerrainUniform {
    /// Packs one frame's time and parameter snapshot for the terrain shaders.
    pub fn new(t: f32, params: &ShaderParameters) -> Self {
        Self {
            model: terrain_model_matrix().to_cols_array_2d(),
            time: t,
            distort: params.distort_amount,
            mix_mode: params.mix_mode.as_u32(),
            _pad: 0.0,
            color_a: params.color_a.to_vec4(),
            color_b: params.color_b.to_vec4(),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct OrbUniform {
    pub model: [[f32; 4]; 4],
    pub tint: [f32; 4],
    /// Reflectance at normal incidence.
    pub f0: f32,
    pub opacity: f32,
    pub _pad: [f32; 2],
}

pub struct TerrainBuffers {
    pub base_vertex_buffer: wgpu::Buffer,
    pub shaded_vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub vertex_count: u32,
    pub index_count: u32,
    pub shaded_ready: bool,
}

impl TerrainBuffers {
    pub fn new(device: &wgpu::Device, plane: &PlaneGeometry) -> Self {
        let base: Vec<TerrainVertex> = plane
            .points
            .iter()
            .zip(&plane.uvs)
            .map(|(p, uv)| TerrainVertex {
                position: p.position.to_array(),
                uv: uv.to_array(),
            })
            .collect();

        let base_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Terrain Base Vertex Buffer"),
            contents: bytemuck::cast_slice(&base),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let shaded_vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Terrain Shaded Vertex Buffer"),
            size: (base.len().max(1) * std::mem::size_of::<ShadedVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Terrain Index Buffer"),
            contents: bytemuck::cast_slice(&plane.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            base_vertex_buffer,
            shaded_vertex_buffer,
            index_buffer,
            vertex_count: base.len() as u32,
            index_count: plane.indices.len() as u32,
            shaded_ready: false,
        }
    }

    pub fn upload_shaded(&mut self, queue: &wgpu::Queue, vertices: &[ShadedVertex]) {
        let count = vertices.len().min(self.vertex_count as usize);
        if count == 0 {
            return;
        }
        queue.write_buffer(
            &self.shaded_vertex_buffer,
            0,
            bytemuck::cast_slice(&vertices[..count]),
        );
        self.shaded_ready = count == self.vertex_count as usize;
    }
}

pub struct OrbBuffers {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl OrbBuffers {
    pub fn new(device: &wgpu::Device, mesh: &SphereMesh) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Orb Vertex Buffer"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Orb Index Buffer"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        }
    }
}

pub struct SparkleBuffers {
    pub instance_buffer: wgpu::Buffer,
    pub capacity: usize,
    pub instance_count: u32,
}

impl SparkleBuffers {
    pub fn new(device: &wgpu::Device, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Sparkle Instance Buffer"),
            size: (capacity * std::mem::size_of::<SparkleInstance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            instance_buffer,
            capacity,
            instance_count: 0,
        }
    }

    pub fn upload(&mut self, queue: &wgpu::Queue, instances: &[SparkleInstance]) {
        let count = instances.len().min(self.capacity);
        if count > 0 {
            queue.write_buffer(
                &self.instance_buffer,
                0,
                bytemuck::cast_slice(&instances[..count]),
            );
        }
        self.instance_count = count as u32;
    }
}

pub fn terrain_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<TerrainVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    }
}

pub fn shaded_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<ShadedVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
        ],
    }
}

pub fn orb_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<OrbVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
        ],
    }
}

pub fn sparkle_instance_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<SparkleInstance>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32,
            },
            wgpu::VertexAttribute {
                offset: 16,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32,
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_sizes_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<TerrainUniform>(), 112);
        assert_eq!(std::mem::size_of::<OrbUniform>(), 96);
        assert_eq!(std::mem::size_of::<TerrainVertex>(), 20);
        assert_eq!(std::mem::size_of::<ShadedVertex>(), 24);
        assert_eq!(std::mem::size_of::<SparkleInstance>(), 20);
    }

    #[test]
    fn terrain_uniform_carries_snapshot() {
        let params = ShaderParameters::default();
        let uniform = TerrainUniform::new(2.5, &params);
        assert_eq!(uniform.time, 2.5);
        assert_eq!(uniform.distort, params.distort_amount);
        assert_eq!(uniform.mix_mode, params.mix_mode.as_u32());
        assert_eq!(uniform.color_a, params.color_a.to_vec4());
        assert_eq!(uniform.color_b[3], 1.0);
        assert_eq!(uniform.model, terrain_model_matrix().to_cols_array_2d());
    }
}
