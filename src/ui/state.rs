use crate::config::{SceneConfig, ShadingBackend};
use crate::terrain::{MixMode, Rgb, ShaderParameters, TERRAIN_PRESETS};

pub struct UiState {
    pub selected_preset: Option<usize>,

    pub distort: f32,
    pub color_a: [f32; 3],
    pub color_b: [f32; 3],
    pub mix_mode: MixMode,

    pub backend: ShadingBackend,
    pub show_sparkles: bool,
    pub show_orb: bool,
    pub post_effects: bool,

    pub vsync_enabled: bool,
    pub show_stats: bool,
    pub fps_cap_enabled: bool,
    pub fps_cap: u32,
}

impl Default for UiState {
    fn default() -> Self {
        Self::from_config(&SceneConfig::default())
    }
}

impl UiState {
    pub fn from_config(config: &SceneConfig) -> Self {
        let params = config.shader_parameters();
        Self {
            selected_preset: None,

            distort: params.distort_amount,
            color_a: params.color_a.to_array(),
            color_b: params.color_b.to_array(),
            mix_mode: params.mix_mode,

            backend: config.render.backend,
            show_sparkles: true,
            show_orb: true,
            post_effects: config.render.post_effects,

            vsync_enabled: config.render.vsync,
            show_stats: true,
            fps_cap_enabled: false,
            fps_cap: 144,
        }
    }

    /// Snapshot taken once per frame and handed to the shading code.
    pub fn shader_parameters(&self) -> ShaderParameters {
        let [ar, ag, ab] = self.color_a;
        let [br, bg, bb] = self.color_b;
        ShaderParameters {
            distort_amount: self.distort,
            color_a: Rgb::new(ar, ag, ab),
            color_b: Rgb::new(br, bg, bb),
            mix_mode: self.mix_mode,
        }
    }

    pub fn apply_preset(&mut self, index: usize) {
        let Some(preset) = TERRAIN_PRESETS.get(index) else {
            return;
        };
        self.selected_preset = Some(index);
        self.distort = preset.distort;
        self.color_a = preset.color_a.to_array();
        self.color_b = preset.color_b.to_array();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameters_mirror_config() {
        let config = SceneConfig::default();
        let state = UiState::from_config(&config);
        assert_eq!(state.shader_parameters(), config.shader_parameters());
    }

    #[test]
    fn state_tracks_edited_config() {
        let mut config = SceneConfig::default();
        config.terrain.distort = 0.25;
        config.terrain.color_a = Rgb::from_hex(0x336699);
        config.terrain.mix_mode = MixMode::Clamp;
        let params = UiState::from_config(&config).shader_parameters();
        assert_eq!(params.distort_amount, 0.25);
        assert_eq!(params.color_a, Rgb::from_hex(0x336699));
        assert_eq!(params.mix_mode, MixMode::Clamp);

        config.render.post_effects = false;
        assert!(!UiState::from_config(&config).post_effects);
    }

    #[test]
    fn preset_overrides_distort_and_colors() {
        let mut state = UiState::default();
        state.apply_preset(1);
        let params = state.shader_parameters();
        assert_eq!(state.selected_preset, Some(1));
        assert_eq!(params.distort_amount, TERRAIN_PRESETS[1].distort);
        assert_eq!(params.color_a, TERRAIN_PRESETS[1].color_a);
        assert_eq!(params.color_b, TERRAIN_PRESETS[1].color_b);
    }

    #[test]
    fn unknown_preset_is_ignored() {
        let mut state = UiState::default();
        state.apply_preset(TERRAIN_PRESETS.len());
        assert_eq!(state.selected_preset, None);
        assert_eq!(state.distort, 1.5);
    }
}
