use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SparklesConfig;

const BOB_HEIGHT: f32 = 0.15;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sparkle {
    pub origin: Vec3,
    pub phase: f32,
    pub speed: f32,
}

impl Sparkle {
    pub fn twinkle(&self, t: f32) -> f32 {
        0.5 + 0.5 * (t * self.speed + self.phase).sin()
    }

    pub fn position(&self, t: f32) -> Vec3 {
        self.origin + Vec3::Y * (BOB_HEIGHT * (t * self.speed * 0.5 + self.phase).sin())
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SparkleInstance {
    pub position: [f32; 3],
    pub size: f32,
    pub brightness: f32,
}

pub struct SparkleField {
    pub sparkles: Vec<Sparkle>,
    pub size: f32,
}

impl SparkleField {
    /// Scatters `count` sparkles in a box of `scale` centred on the origin.
    pub fn from_config(config: &SparklesConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed as u64);
        let scale = Vec3::from(config.scale);

        let sparkles = (0..config.count)
            .map(|_| {
                let unit = Vec3::new(
                    rng.gen_range(-0.5..0.5),
                    rng.gen_range(-0.5..0.5),
                    rng.gen_range(-0.5..0.5),
                );
                Sparkle {
                    origin: unit * scale,
                    phase: rng.gen_range(0.0..std::f32::consts::TAU),
                    speed: config.speed * rng.gen_range(0.5..1.5),
                }
            })
            .collect();

        Self {
            sparkles,
            size: config.size,
        }
    }

    pub fn len(&self) -> usize {
        self.sparkles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sparkles.is_empty()
    }

    pub fn instances_into(&self, t: f32, out: &mut Vec<SparkleInstance>) {
        out.clear();
        out.extend(self.sparkles.iter().map(|s| SparkleInstance {
            position: s.position(t).to_array(),
            size: self.size,
            brightness: s.twinkle(t),
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_deterministic_per_seed() {
        let config = SparklesConfig::default();
        let a = SparkleField::from_config(&config);
        let b = SparkleField::from_config(&config);
        assert_eq!(a.sparkles, b.sparkles);
        assert_eq!(a.len(), 50);

        let other = SparkleField::from_config(&SparklesConfig {
            seed: 7,
            ..Default::default()
        });
        assert_ne!(a.sparkles, other.sparkles);
    }

    #[test]
    fn sparkles_stay_inside_scaled_box() {
        let field = SparkleField::from_config(&SparklesConfig {
            count: 500,
            scale: [10.0, 4.0, 2.0],
            ..Default::default()
        });
        for s in &field.sparkles {
            assert!(s.origin.x.abs() <= 5.0);
            assert!(s.origin.y.abs() <= 2.0);
            assert!(s.origin.z.abs() <= 1.0);
            for t in [0.0, 1.3, 9.9] {
                let p = s.position(t);
                assert!((p.y - s.origin.y).abs() <= BOB_HEIGHT + 1e-6);
                let b = s.twinkle(t);
                assert!((0.0..=1.0).contains(&b));
            }
        }
    }

    #[test]
    fn zero_seed_still_produces_variety() {
        let field = SparkleField::from_config(&SparklesConfig {
            seed: 0,
            count: 4,
            ..Default::default()
        });
        assert_ne!(field.sparkles[0].origin, field.sparkles[1].origin);
    }

    #[test]
    fn speeds_spread_around_configured_speed() {
        let field = SparkleField::from_config(&SparklesConfig {
            count: 200,
            speed: 2.0,
            ..Default::default()
        });
        for s in &field.sparkles {
            assert!((1.0..3.0).contains(&s.speed));
            assert!((0.0..std::f32::consts::TAU).contains(&s.phase));
        }
    }

    #[test]
    fn instances_follow_time() {
        let field = SparkleField::from_config(&SparklesConfig::default());
        let mut out = Vec::new();
        field.instances_into(2.0, &mut out);
        assert_eq!(out.len(), field.len());
        assert_eq!(out[0].size, 6.0);
        assert_eq!(out[0].brightness, field.sparkles[0].twinkle(2.0));
        assert_eq!(out[0].position, field.sparkles[0].position(2.0).to_array());
    }
}
