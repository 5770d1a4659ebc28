use crate::terrain::shading::Rgb;

pub struct TerrainPreset {
    pub name: &'static str,
    pub description: &'static str,
    pub distort: f32,
    pub color_a: Rgb,
    pub color_b: Rgb,
}

pub const TERRAIN_PRESETS: &[TerrainPreset] = &[
    TerrainPreset {
        name: "Neon",
        description: "Cyan to magenta, the hero default.",
        distort: 1.5,
        color_a: Rgb::new(0.0, 1.0, 1.0),
        color_b: Rgb::new(1.0, 0.0, 1.0),
    },
    TerrainPreset {
        name: "Sunset",
        description: "Warm dunes under an evening sky.",
        distort: 1.0,
        color_a: Rgb::new(1.0, 0.45, 0.1),
        color_b: Rgb::new(0.35, 0.05, 0.45),
    },
    TerrainPreset {
        name: "Glacier",
        description: "Pale ice with a deep blue base.",
        distort: 0.6,
        color_a: Rgb::new(0.05, 0.15, 0.45),
        color_b: Rgb::new(0.85, 0.95, 1.0),
    },
    TerrainPreset {
        name: "Still",
        description: "No displacement; only the gradient moves.",
        distort: 0.0,
        color_a: Rgb::new(0.1, 0.1, 0.12),
        color_b: Rgb::new(0.6, 0.6, 0.7),
    },
    TerrainPreset {
        name: "Storm",
        description: "Strong waves, high contrast.",
        distort: 3.0,
        color_a: Rgb::new(0.02, 0.02, 0.05),
        color_b: Rgb::new(0.55, 0.7, 1.0),
    },
];
