use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::config::LightingConfig;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lighting {
    pub ambient: f32,
    /// Unit vector pointing from the surface towards the light.
    pub direction: Vec3,
    pub intensity: f32,
}

impl Lighting {
    pub fn from_config(config: &LightingConfig) -> Self {
        let position = Vec3::from(config.directional_position);
        Self {
            ambient: config.ambient,
            direction: position.try_normalize().unwrap_or(Vec3::Y),
            intensity: config.directional_intensity,
        }
    }

    pub fn to_uniform(&self) -> LightUniform {
        LightUniform {
            direction: self.direction.to_array(),
            ambient: self.ambient,
            intensity: self.intensity,
            _padding: [0.0; 3],
        }
    }
}

/// Schlick's approximation with base reflectance derived from `ior`.
pub fn fresnel_schlick(cos_theta: f32, ior: f32) -> f32 {
    let f0 = ((ior - 1.0) / (ior + 1.0)).powi(2);
    f0 + (1.0 - f0) * (1.0 - cos_theta.clamp(0.0, 1.0)).powi(5)
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct LightUniform {
    pub direction: [f32; 3],
    pub ambient: f32,
    pub intensity: f32,
    pub _padding: [f32; 3],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_light_points_along_diagonal() {
        let light = Lighting::from_config(&LightingConfig::default());
        let d = 1.0 / 3.0_f32.sqrt();
        assert!((light.direction - Vec3::splat(d)).length() < 1e-6);
        assert_eq!(light.ambient, 0.5);
    }

    #[test]
    fn uniform_packs_light() {
        let light = Lighting::from_config(&LightingConfig::default());
        let u = light.to_uniform();
        assert_eq!(u.direction, light.direction.to_array());
        assert_eq!(u.ambient, 0.5);
        assert_eq!(u.intensity, 1.0);
        assert_eq!(std::mem::size_of::<LightUniform>(), 32);
    }

    #[test]
    fn degenerate_light_position_falls_back_to_up() {
        let config = LightingConfig {
            directional_position: [0.0, 0.0, 0.0],
            ..Default::default()
        };
        assert_eq!(Lighting::from_config(&config).direction, Vec3::Y);
    }

    #[test]
    fn glass_fresnel_spans_four_percent_to_one() {
        assert!((fresnel_schlick(1.0, 1.5) - 0.04).abs() < 1e-6);
        assert!((fresnel_schlick(0.0, 1.5) - 1.0).abs() < 1e-6);
        assert!(fresnel_schlick(0.5, 1.5) < fresnel_schlick(0.2, 1.5));
    }
}
