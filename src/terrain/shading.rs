//! Displacement and gradient color for the terrain surface.
//!
//! Everything here is a pure function of its arguments. The renderer evaluates
//! the same formulas in `renderer/shaders/terrain.wgsl`; keep the two in sync.

use std::fmt;
use std::str::FromStr;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::ColorError;
use crate::terrain::mesh::SurfacePoint;

pub const WAVE_AMPLITUDE: f32 = 0.3;
pub const WAVE_FREQUENCY: f32 = 3.0;

pub const GRADIENT_SWAY: f32 = 0.5;
pub const GRADIENT_FREQUENCY: f32 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const CYAN: Rgb = Rgb::new(0.0, 1.0, 1.0);
    pub const MAGENTA: Rgb = Rgb::new(1.0, 0.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn from_hex(hex: u32) -> Self {
        Self::new(
            ((hex >> 16) & 0xff) as f32 / 255.0,
            ((hex >> 8) & 0xff) as f32 / 255.0,
            (hex & 0xff) as f32 / 255.0,
        )
    }

    /// Linear interpolation. `t` outside `[0, 1]` extrapolates along the segment.
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        Rgb::from(Vec3::from(self).lerp(Vec3::from(other), t))
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    pub fn to_vec4(self) -> [f32; 4] {
        [self.r, self.g, self.b, 1.0]
    }
}

impl From<Vec3> for Rgb {
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<Rgb> for Vec3 {
    fn from(c: Rgb) -> Self {
        Vec3::new(c.r, c.g, c.b)
    }
}

impl FromStr for Rgb {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| ColorError::MissingHash(s.to_string()))?;
        if digits.len() != 6 {
            return Err(ColorError::BadLength(s.to_string()));
        }
        // from_str_radix would also take a leading sign.
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ColorError::BadDigits(s.to_string()));
        }
        let hex = u32::from_str_radix(digits, 16).map_err(|_| ColorError::BadDigits(s.to_string()))?;
        Ok(Rgb::from_hex(hex))
    }
}

impl TryFrom<String> for Rgb {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(c: Rgb) -> Self {
        c.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        write!(f, "#{:02x}{:02x}{:02x}", channel(self.r), channel(self.g), channel(self.b))
    }
}

/// How the gradient mix factor is treated before interpolation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MixMode {
    /// Use the raw factor; colors may leave the `color_a..color_b` segment.
    #[default]
    Extrapolate,
    /// Clamp the factor to `[0, 1]`.
    Clamp,
}

impl MixMode {
    pub fn apply(self, factor: f32) -> f32 {
        match self {
            MixMode::Extrapolate => factor,
            MixMode::Clamp => factor.clamp(0.0, 1.0),
        }
    }

    pub fn as_u32(self) -> u32 {
        match self {
            MixMode::Extrapolate => 0,
            MixMode::Clamp => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShaderParameters {
    pub distort_amount: f32,
    pub color_a: Rgb,
    pub color_b: Rgb,
    pub mix_mode: MixMode,
}

impl Default for ShaderParameters {
    fn default() -> Self {
        Self {
            distort_amount: 1.0,
            color_a: Rgb::CYAN,
            color_b: Rgb::MAGENTA,
            mix_mode: MixMode::Extrapolate,
        }
    }
}

#[inline]
pub fn wave_noise(x: f32, y: f32, t: f32) -> f32 {
    WAVE_AMPLITUDE * (WAVE_FREQUENCY * x + t).sin()
        + WAVE_AMPLITUDE * (WAVE_FREQUENCY * y + t).cos()
}

/// Height of `point` at time `t`.
#[inline]
pub fn compute_displacement(point: SurfacePoint, t: f32, distort_amount: f32) -> f32 {
    let p = point.position;
    p.z + wave_noise(p.x, p.y, t) * distort_amount
}

#[inline]
pub fn mix_factor(uv: Vec2, t: f32) -> f32 {
    uv.y + GRADIENT_SWAY * (t + uv.x * GRADIENT_FREQUENCY).sin()
}

pub fn compute_color(uv: Vec2, t: f32, color_a: Rgb, color_b: Rgb, mode: MixMode) -> Rgb {
    color_a.lerp(color_b, mode.apply(mix_factor(uv, t)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn at(x: f32, y: f32, z: f32) -> SurfacePoint {
        SurfacePoint::new(Vec3::new(x, y, z))
    }

    fn close(a: Rgb, b: Rgb) -> bool {
        (a.r - b.r).abs() < EPS && (a.g - b.g).abs() < EPS && (a.b - b.b).abs() < EPS
    }

    #[test]
    fn origin_displacement_matches_reference_value() {
        let z = compute_displacement(at(0.0, 0.0, 0.0), 0.0, 1.5);
        assert!((z - 0.45).abs() < EPS, "got {z}");
    }

    #[test]
    fn origin_displacement_follows_closed_form() {
        for &t in &[0.0_f32, 0.7, 2.0, 13.5] {
            let d = 2.25;
            let base_z = -0.4;
            let expected = base_z + d * (0.3 * t.sin() + 0.3 * t.cos());
            let z = compute_displacement(at(0.0, 0.0, base_z), t, d);
            assert!((z - expected).abs() < EPS);
        }
    }

    #[test]
    fn displacement_is_deterministic() {
        let p = at(1.23, -4.56, 0.5);
        let a = compute_displacement(p, 3.3, 1.5);
        let b = compute_displacement(p, 3.3, 1.5);
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn noise_is_bounded() {
        for i in 0..200 {
            let x = -50.0 + i as f32 * 0.53;
            let y = 30.0 - i as f32 * 0.91;
            let t = i as f32 * 0.37;
            let n = wave_noise(x, y, t);
            assert!(n.abs() <= 0.6 + EPS);

            let d = 2.7;
            let z = compute_displacement(at(x, y, 1.0), t, d);
            assert!((z - 1.0).abs() <= 0.6 * d + EPS);
        }
    }

    #[test]
    fn zero_distortion_leaves_height_unchanged() {
        for &t in &[0.0_f32, 1.0, 100.0, 12345.0] {
            let z = compute_displacement(at(3.0, -2.0, 0.75), t, 0.0);
            assert_eq!(z, 0.75);
        }
    }

    #[test]
    fn top_edge_at_time_zero_is_color_b() {
        let a = Rgb::new(0.1, 0.2, 0.3);
        let b = Rgb::new(0.9, 0.4, 0.6);
        for mode in [MixMode::Extrapolate, MixMode::Clamp] {
            let c = compute_color(Vec2::new(0.0, 1.0), 0.0, a, b, mode);
            assert!(close(c, b), "{mode:?}: {c:?}");
        }
    }

    #[test]
    fn bottom_edge_at_time_zero_is_color_a() {
        let a = Rgb::CYAN;
        let b = Rgb::MAGENTA;
        let c = compute_color(Vec2::ZERO, 0.0, a, b, MixMode::Extrapolate);
        assert!(close(c, a));
    }

    #[test]
    fn extrapolate_leaves_gradient_segment() {
        // uv.y = 1 and sin(pi/2) = 1 push the factor to 1.5.
        let t = std::f32::consts::FRAC_PI_2;
        let f = mix_factor(Vec2::new(0.0, 1.0), t);
        assert!((f - 1.5).abs() < EPS);

        let a = Rgb::new(0.0, 0.0, 0.0);
        let b = Rgb::new(0.5, 0.5, 0.5);
        let c = compute_color(Vec2::new(0.0, 1.0), t, a, b, MixMode::Extrapolate);
        assert!(close(c, Rgb::new(0.75, 0.75, 0.75)));

        let clamped = compute_color(Vec2::new(0.0, 1.0), t, a, b, MixMode::Clamp);
        assert!(close(clamped, b));
    }

    #[test]
    fn clamp_mode_stays_inside_segment() {
        let a = Rgb::new(0.2, 0.0, 0.4);
        let b = Rgb::new(0.8, 1.0, 0.6);
        for i in 0..50 {
            let uv = Vec2::new((i % 7) as f32 / 6.0, (i % 5) as f32 / 4.0);
            let c = compute_color(uv, i as f32 * 0.29, a, b, MixMode::Clamp);
            assert!(c.r >= 0.2 - EPS && c.r <= 0.8 + EPS);
            assert!(c.g >= 0.0 - EPS && c.g <= 1.0 + EPS);
            assert!(c.b >= 0.4 - EPS && c.b <= 0.6 + EPS);
        }
    }

    #[test]
    fn hex_colors_parse_and_print() {
        let c: Rgb = "#00ffff".parse().unwrap();
        assert_eq!(c, Rgb::CYAN);
        assert_eq!(Rgb::MAGENTA.to_string(), "#ff00ff");
        assert!(matches!("00ffff".parse::<Rgb>(), Err(ColorError::MissingHash(_))));
        assert!(matches!("#0ff".parse::<Rgb>(), Err(ColorError::BadLength(_))));
        assert!(matches!("#zzzzzz".parse::<Rgb>(), Err(ColorError::BadDigits(_))));
        assert!(matches!("#+fffff".parse::<Rgb>(), Err(ColorError::BadDigits(_))));
        assert!(matches!("#-00000".parse::<Rgb>(), Err(ColorError::BadDigits(_))));
    }

    fn wgsl_const(source: &str, name: &str) -> String {
        let prefix = format!("const {name}:");
        let line = source
            .lines()
            .map(str::trim)
            .find(|l| l.starts_with(&prefix))
            .unwrap_or_else(|| panic!("{name} missing from terrain.wgsl"));
        let value = line.split('=').nth(1).unwrap().trim().trim_end_matches(';');
        value.trim_end_matches('u').to_string()
    }

    #[test]
    fn terrain_shader_constants_match() {
        let source = include_str!("../renderer/shaders/terrain.wgsl");
        let float = |name| wgsl_const(source, name).parse::<f32>().unwrap();
        assert_eq!(float("WAVE_AMPLITUDE"), WAVE_AMPLITUDE);
        assert_eq!(float("WAVE_FREQUENCY"), WAVE_FREQUENCY);
        assert_eq!(float("GRADIENT_SWAY"), GRADIENT_SWAY);
        assert_eq!(float("GRADIENT_FREQUENCY"), GRADIENT_FREQUENCY);
        let clamp: u32 = wgsl_const(source, "MIX_CLAMP").parse().unwrap();
        assert_eq!(clamp, MixMode::Clamp.as_u32());
    }
}
