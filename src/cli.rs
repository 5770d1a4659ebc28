use std::path::PathBuf;

use clap::Parser;

use crate::config::{MAX_SEGMENTS, SceneConfig, ShadingBackend};

/// Animated glass terrain with an orbiting camera.
#[derive(Parser, Debug, Default)]
#[command(name = "glass-terrain", version, about)]
pub struct Args {
    /// Scene config file (TOML).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log filter directive, e.g. `debug` or `glass_terrain=trace`.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Where displacement and gradient are evaluated.
    #[arg(long, value_enum)]
    pub backend: Option<ShadingBackend>,

    /// Plane subdivisions per side.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_SEGMENTS as i64))]
    pub segments: Option<u32>,
}

impl Args {
    /// Command-line values win over the config file.
    pub fn apply_overrides(&self, config: &mut SceneConfig) {
        if let Some(backend) = self.backend {
            config.render.backend = backend;
        }
        if let Some(segments) = self.segments {
            config.terrain.segments = segments;
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_parse() {
        let args = Args::try_parse_from([
            "glass-terrain",
            "--config",
            "scene.toml",
            "--backend",
            "cpu",
            "--segments",
            "64",
        ])
        .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("scene.toml")));
        assert_eq!(args.backend, Some(ShadingBackend::Cpu));
        assert_eq!(args.segments, Some(64));
    }

    #[test]
    fn segments_out_of_range_rejected() {
        assert!(Args::try_parse_from(["glass-terrain", "--segments", "0"]).is_err());
        assert!(Args::try_parse_from(["glass-terrain", "--segments", "5000"]).is_err());
    }

    #[test]
    fn overrides_replace_config_values() {
        let mut config = SceneConfig::default();
        let args = Args {
            backend: Some(ShadingBackend::Cpu),
            segments: Some(32),
            ..Default::default()
        };
        args.apply_overrides(&mut config);
        assert_eq!(config.render.backend, ShadingBackend::Cpu);
        assert_eq!(config.terrain.segments, 32);
        assert_eq!(config.terrain.distort, 1.5);
    }

    #[test]
    fn no_flags_leave_config_alone() {
        let mut config = SceneConfig::default();
        Args::default().apply_overrides(&mut config);
        assert_eq!(config.render.backend, ShadingBackend::Gpu);
        assert_eq!(config.terrain.segments, 200);
    }
}
