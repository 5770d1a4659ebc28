//! Glass orb geometry.
//!
//! A UV sphere with smooth normals and a shared index buffer. The glass look
//! comes from the orb shader: Fresnel reflectance from the index of refraction,
//! a specular highlight from the directional light, and alpha blending.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::config::OrbConfig;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct OrbVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

pub struct SphereMesh {
    pub vertices: Vec<OrbVertex>,
    pub indices: Vec<u32>,
}

/// Unit sphere, north pole at +Y. `segments` longitude columns and
/// `rings` latitude rows.
pub fn generate_sphere(segments: u32, rings: u32) -> SphereMesh {
    let segments = segments.max(3);
    let rings = rings.max(2);
    let columns = segments + 1;

    let mut vertices = Vec::with_capacity((columns * (rings + 1)) as usize);
    for ring in 0..=rings {
        let theta = std::f32::consts::PI * ring as f32 / rings as f32;
        for seg in 0..=segments {
            let phi = std::f32::consts::TAU * seg as f32 / segments as f32;
            let p = Vec3::new(-phi.cos() * theta.sin(), theta.cos(), phi.sin() * theta.sin());
            vertices.push(OrbVertex {
                position: p.to_array(),
                normal: p.to_array(),
            });
        }
    }

    let mut indices = Vec::with_capacity((segments * rings * 6) as usize);
    for ring in 0..rings {
        for seg in 0..segments {
            let a = ring * columns + seg;
            let b = a + columns;
            let c = b + 1;
            let d = a + 1;

            // The pole rows collapse one triangle of each quad.
            if ring != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if ring != rings - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    SphereMesh { vertices, indices }
}

pub struct Orb {
    pub center: Vec3,
    pub radius: f32,
    pub ior: f32,
    pub mesh: SphereMesh,
}

impl Orb {
    pub fn from_config(config: &OrbConfig) -> Self {
        Self {
            center: Vec3::from(config.position),
            radius: config.radius,
            ior: config.ior,
            mesh: generate_sphere(config.segments, config.segments),
        }
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.center) * Mat4::from_scale(Vec3::splat(self.radius))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_vertices_lie_on_unit_sphere() {
        let mesh = generate_sphere(16, 8);
        assert_eq!(mesh.vertices.len(), 17 * 9);
        for v in &mesh.vertices {
            let p = Vec3::from(v.position);
            assert!((p.length() - 1.0).abs() < 1e-5);
            assert_eq!(v.position, v.normal);
        }
    }

    #[test]
    fn sphere_indices_skip_degenerate_pole_triangles() {
        let mesh = generate_sphere(16, 8);
        // Every ring contributes two triangles per segment except the two pole rings.
        assert_eq!(mesh.indices.len(), (16 * 8 * 2 - 2 * 16) * 3);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
    }

    #[test]
    fn orb_model_matrix_places_and_scales() {
        let orb = Orb::from_config(&OrbConfig {
            radius: 2.0,
            segments: 8,
            ..Default::default()
        });
        let top = orb.model_matrix().transform_point3(Vec3::Y);
        assert!((top - Vec3::new(0.0, 3.5, 0.0)).length() < 1e-6);
    }
}
