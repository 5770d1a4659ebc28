//! Scene configuration loaded from TOML.
//!
//! Every struct uses `serde(default)`, so a partial file only overrides the
//! fields it names. The defaults reproduce the hero scene as designed.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::terrain::{MixMode, Rgb, ShaderParameters};

pub const MAX_SEGMENTS: u32 = 1000;
pub const MAX_ORB_SEGMENTS: u32 = 512;
pub const MAX_SPARKLES: u32 = 100_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ShadingBackend {
    /// Displacement and gradient run in the terrain shaders.
    #[default]
    Gpu,
    /// A worker thread evaluates each frame and the vertices are re-uploaded.
    Cpu,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub terrain: TerrainConfig,
    pub orb: OrbConfig,
    pub sparkles: SparklesConfig,
    pub lighting: LightingConfig,
    pub camera: CameraConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub width: f32,
    pub height: f32,
    pub segments: u32,
    pub distort: f32,
    pub color_a: Rgb,
    pub color_b: Rgb,
    pub mix_mode: MixMode,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            width: 10.0,
            height: 10.0,
            segments: 200,
            distort: 1.5,
            color_a: Rgb::CYAN,
            color_b: Rgb::MAGENTA,
            mix_mode: MixMode::Extrapolate,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbConfig {
    pub position: [f32; 3],
    pub radius: f32,
    pub ior: f32,
    pub segments: u32,
}

impl Default for OrbConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 1.5, 0.0],
            radius: 1.0,
            ior: 1.5,
            segments: 64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SparklesConfig {
    pub count: u32,
    pub size: f32,
    pub scale: [f32; 3],
    pub speed: f32,
    pub seed: u32,
}

impl Default for SparklesConfig {
    fn default() -> Self {
        Self {
            count: 50,
            size: 6.0,
            scale: [10.0, 10.0, 10.0],
            speed: 1.0,
            seed: 0x5eed_1e55,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    pub ambient: f32,
    pub directional_position: [f32; 3],
    pub directional_intensity: f32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient: 0.5,
            directional_position: [5.0, 5.0, 5.0],
            directional_intensity: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub fov_degrees: f32,
    pub enable_zoom: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 2.0, 5.0],
            fov_degrees: 60.0,
            enable_zoom: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub vsync: bool,
    pub backend: ShadingBackend,
    /// Bloom and chromatic aberration.
    pub post_effects: bool,
    pub background: Rgb,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            vsync: true,
            backend: ShadingBackend::Gpu,
            post_effects: true,
            background: Rgb::from_hex(0x140b1c),
        }
    }
}

impl SceneConfig {
    pub fn shader_parameters(&self) -> ShaderParameters {
        ShaderParameters {
            distort_amount: self.terrain.distort,
            color_a: self.terrain.color_a,
            color_b: self.terrain.color_b,
            mix_mode: self.terrain.mix_mode,
        }
    }
}

pub fn validate(config: &SceneConfig) -> Result<(), ConfigError> {
    let t = &config.terrain;
    if !(t.width.is_finite() && t.height.is_finite() && t.width > 0.0 && t.height > 0.0) {
        return Err(ConfigError::Validation(format!(
            "terrain size must be positive, got {}x{}",
            t.width, t.height
        )));
    }
    if t.segments == 0 || t.segments > MAX_SEGMENTS {
        return Err(ConfigError::Validation(format!(
            "terrain.segments must be in 1..={MAX_SEGMENTS}, got {}",
            t.segments
        )));
    }
    if !t.distort.is_finite() {
        return Err(ConfigError::Validation("terrain.distort must be finite".into()));
    }
    if !(config.orb.radius > 0.0) || config.orb.ior < 1.0 {
        return Err(ConfigError::Validation(format!(
            "orb needs radius > 0 and ior >= 1, got radius {} ior {}",
            config.orb.radius, config.orb.ior
        )));
    }
    if !(3..=MAX_ORB_SEGMENTS).contains(&config.orb.segments) {
        return Err(ConfigError::Validation(format!(
            "orb.segments must be in 3..={MAX_ORB_SEGMENTS}, got {}",
            config.orb.segments
        )));
    }
    let sparkles = &config.sparkles;
    if sparkles.count > MAX_SPARKLES {
        return Err(ConfigError::Validation(format!(
            "sparkles.count must be at most {MAX_SPARKLES}, got {}",
            sparkles.count
        )));
    }
    let finite_non_negative = |v: f32| v.is_finite() && v >= 0.0;
    if !sparkles.scale.iter().all(|s| finite_non_negative(*s)) || !finite_non_negative(sparkles.size) {
        return Err(ConfigError::Validation(
            "sparkles.size and sparkles.scale must be finite and not negative".into(),
        ));
    }
    let fov = config.camera.fov_degrees;
    if !(fov > 0.0 && fov < 180.0) {
        return Err(ConfigError::Validation(format!(
            "camera.fov_degrees must be in (0, 180), got {fov}"
        )));
    }
    Ok(())
}

pub fn load_from_path(path: &Path) -> Result<SceneConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let config: SceneConfig = toml::from_str(&content)?;
    validate(&config)?;

    info!("loaded scene config from {}", path.display());
    Ok(config)
}

/// Loads `path` when given, falling back to defaults on any error.
pub fn load_or_default(path: Option<&Path>) -> SceneConfig {
    let Some(path) = path else {
        return SceneConfig::default();
    };

    match load_from_path(path) {
        Ok(config) => config,
        Err(e) => {
            warn!("{e}");
            warn!("falling back to default scene config");
            SceneConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.toml");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn defaults_describe_hero_scene() {
        let config = SceneConfig::default();
        assert_eq!(config.terrain.segments, 200);
        assert_eq!(config.terrain.distort, 1.5);
        assert_eq!(config.terrain.color_a, Rgb::CYAN);
        assert_eq!(config.terrain.color_b, Rgb::MAGENTA);
        assert_eq!(config.terrain.mix_mode, MixMode::Extrapolate);
        assert_eq!(config.sparkles.count, 50);
        assert_eq!(config.camera.position, [0.0, 2.0, 5.0]);
        assert!(!config.camera.enable_zoom);
        assert!(config.render.post_effects);
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let (_dir, path) = write_config(
            r##"
[terrain]
distort = 0.5
color_a = "#102030"
mix_mode = "clamp"

[render]
backend = "cpu"
"##,
        );

        let config = load_from_path(&path).unwrap();
        assert_eq!(config.terrain.distort, 0.5);
        assert_eq!(config.terrain.color_a, Rgb::from_hex(0x102030));
        assert_eq!(config.terrain.color_b, Rgb::MAGENTA);
        assert_eq!(config.terrain.mix_mode, MixMode::Clamp);
        assert_eq!(config.render.backend, ShadingBackend::Cpu);
        assert_eq!(config.terrain.segments, 200);

        let params = config.shader_parameters();
        assert_eq!(params.distort_amount, 0.5);
        assert_eq!(params.mix_mode, MixMode::Clamp);
    }

    #[test]
    fn missing_file_is_not_found() {
        let result = load_from_path(Path::new("/tmp/does-not-exist-glass-terrain.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let (_dir, path) = write_config("this is not [valid toml");
        assert!(matches!(load_from_path(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn bad_color_is_parse_error() {
        let (_dir, path) = write_config("[terrain]\ncolor_b = \"magenta\"\n");
        assert!(matches!(load_from_path(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn out_of_range_values_fail_validation() {
        let (_dir, path) = write_config("[terrain]\nsegments = 0\n");
        assert!(matches!(load_from_path(&path), Err(ConfigError::Validation(_))));

        let mut config = SceneConfig::default();
        config.camera.fov_degrees = 180.0;
        assert!(validate(&config).is_err());

        let mut config = SceneConfig::default();
        config.orb.ior = 0.5;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn oversized_meshes_fail_validation() {
        let (_dir, path) = write_config("[orb]\nsegments = 4000000000\n");
        assert!(matches!(load_from_path(&path), Err(ConfigError::Validation(_))));

        let (_dir, path) = write_config("[sparkles]\ncount = 4000000000\n");
        assert!(matches!(load_from_path(&path), Err(ConfigError::Validation(_))));

        let mut config = SceneConfig::default();
        config.orb.segments = MAX_ORB_SEGMENTS;
        config.sparkles.count = MAX_SPARKLES;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn non_finite_sizes_fail_validation() {
        let (_dir, path) = write_config("[terrain]\nwidth = inf\n");
        assert!(matches!(load_from_path(&path), Err(ConfigError::Validation(_))));

        let (_dir, path) = write_config("[terrain]\nheight = nan\n");
        assert!(matches!(load_from_path(&path), Err(ConfigError::Validation(_))));

        let (_dir, path) = write_config("[sparkles]\nscale = [10.0, inf, 10.0]\n");
        assert!(matches!(load_from_path(&path), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn load_or_default_recovers() {
        let (_dir, path) = write_config("[terrain]\nsegments = 5000\n");
        let config = load_or_default(Some(&path));
        assert_eq!(config.terrain.segments, 200);
        assert_eq!(load_or_default(None).terrain.segments, 200);
    }

    #[test]
    fn config_round_trips_through_toml() {
        let mut config = SceneConfig::default();
        config.terrain.color_a = Rgb::from_hex(0xff8800);
        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("#ff8800"));
        let back: SceneConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.terrain.color_a, config.terrain.color_a);
    }
}
