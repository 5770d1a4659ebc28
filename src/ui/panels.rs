use egui::{Color32, Context, RichText, ScrollArea, Ui};

use crate::config::ShadingBackend;
use crate::terrain::{MixMode, TERRAIN_PRESETS};
use crate::ui::state::UiState;
use crate::ui::theme::*;

#[derive(Default)]
pub struct UiActions {
    pub toggle_clock: bool,
    pub restart_clock: bool,
    pub reset_camera: bool,
}

/// Read-only numbers shown in the statistics block.
#[derive(Default)]
pub struct SceneStats {
    pub fps: f32,
    pub time: f32,
    pub clock_paused: bool,
    pub vertex_count: u32,
    pub cpu_eval_ms: f32,
    /// How far the displayed CPU frame trails the clock.
    pub cpu_lag_ms: f32,
    pub cpu_frames: u64,
    pub cpu_skipped: u64,
    pub cpu_dropped: u64,
}

pub fn draw_side_panel(ctx: &Context, state: &mut UiState, stats: &SceneStats) -> UiActions {
    let mut actions = UiActions::default();

    egui::SidePanel::right("control_panel")
        .min_width(300.0)
        .max_width(400.0)
        .default_width(320.0)
        .frame(egui::Frame::default().fill(BG_PANEL).inner_margin(16.0))
        .show(ctx, |ui| {
            ScrollArea::vertical().show(ui, |ui| {
                ui.heading(RichText::new("Glass Terrain").strong());
                ui.add_space(4.0);
                ui.label(RichText::new("Animated displacement & gradient").color(TEXT_MUTED).size(11.0));
                ui.add_space(16.0);

                ui.horizontal(|ui| {
                    let (text, color) = if stats.clock_paused {
                        ("Resume", ACCENT_GREEN)
                    } else {
                        ("Pause", ACCENT_ORANGE)
                    };
                    if ui.add(egui::Button::new(RichText::new(text).color(BG_PURE_BLACK))
                        .fill(color).min_size(egui::vec2(80.0, 32.0))).clicked() {
                        actions.toggle_clock = true;
                    }
                    if ui.button("Restart").clicked() {
                        actions.restart_clock = true;
                    }
                    if ui.button("Reset view").clicked() {
                        actions.reset_camera = true;
                    }
                });
                ui.add_space(16.0);

                section_header(ui, "PRESET");
                let selected = state
                    .selected_preset
                    .and_then(|i| TERRAIN_PRESETS.get(i))
                    .map_or("Custom", |p| p.name);
                let mut picked = None;
                egui::ComboBox::from_id_salt("terrain_presets")
                    .selected_text(selected)
                    .width(ui.available_width())
                    .show_ui(ui, |ui| {
                        for (i, preset) in TERRAIN_PRESETS.iter().enumerate() {
                            if ui.selectable_label(state.selected_preset == Some(i), preset.name).clicked() {
                                picked = Some(i);
                            }
                        }
                    });
                if let Some(i) = picked {
                    state.apply_preset(i);
                }
                if let Some(preset) = state.selected_preset.and_then(|i| TERRAIN_PRESETS.get(i)) {
                    ui.add_space(4.0);
                    ui.label(RichText::new(preset.description).color(TEXT_MUTED).size(11.0).italics());
                }
                ui.add_space(16.0);

                section_header(ui, "SURFACE");
                let mut edited = false;
                ui.horizontal(|ui| {
                    ui.label("Distort:");
                    edited |= ui.add(egui::Slider::new(&mut state.distort, 0.0..=3.0).step_by(0.05)).changed();
                });
                ui.horizontal(|ui| {
                    ui.label("Color A:");
                    edited |= ui.color_edit_button_rgb(&mut state.color_a).changed();
                    ui.add_space(12.0);
                    ui.label("Color B:");
                    edited |= ui.color_edit_button_rgb(&mut state.color_b).changed();
                });
                if edited {
                    state.selected_preset = None;
                }
                ui.horizontal(|ui| {
                    ui.label("Gradient:");
                    ui.selectable_value(&mut state.mix_mode, MixMode::Extrapolate, "Extrapolate");
                    ui.selectable_value(&mut state.mix_mode, MixMode::Clamp, "Clamp");
                });
                ui.add_space(16.0);

                section_header(ui, "SCENE");
                ui.horizontal(|ui| {
                    ui.label("Shading:");
                    ui.selectable_value(&mut state.backend, ShadingBackend::Gpu, "GPU");
                    ui.selectable_value(&mut state.backend, ShadingBackend::Cpu, "CPU");
                });
                ui.horizontal(|ui| {
                    ui.checkbox(&mut state.show_orb, "Orb");
                    ui.checkbox(&mut state.show_sparkles, "Sparkles");
                    ui.checkbox(&mut state.post_effects, "Bloom");
                });
                ui.add_space(16.0);

                perf_controls(ui, state);
                ui.add_space(16.0);

                ui.separator();
                ui.add_space(12.0);

                if state.show_stats {
                    stats_panel(ui, stats, state.backend);
                }
            });
        });

    actions
}

fn section_header(ui: &mut Ui, text: &str) {
    ui.label(RichText::new(text).color(TEXT_MUTED).size(11.0).strong());
    ui.add_space(4.0);
}

fn perf_controls(ui: &mut Ui, state: &mut UiState) {
    section_header(ui, "PERFORMANCE");
    ui.horizontal(|ui| {
        ui.checkbox(&mut state.vsync_enabled, "VSync");
        ui.checkbox(&mut state.show_stats, "Stats");
    });
    ui.horizontal(|ui| {
        ui.checkbox(&mut state.fps_cap_enabled, "FPS Cap:");
        ui.add_enabled(state.fps_cap_enabled,
            egui::DragValue::new(&mut state.fps_cap).range(30..=500).suffix(" fps"));
    });
}

fn stats_panel(ui: &mut Ui, stats: &SceneStats, backend: ShadingBackend) {
    section_header(ui, "STATISTICS");
    egui::Frame::default()
        .fill(BG_WIDGET)
        .stroke(egui::Stroke::new(1.0, BORDER_SUBTLE))
        .rounding(6.0)
        .inner_margin(12.0)
        .show(ui, |ui| {
            ui.style_mut().override_font_id = Some(egui::FontId::new(11.0, egui::FontFamily::Monospace));

            let fps_color = if stats.fps >= 60.0 { ACCENT_GREEN } else if stats.fps >= 30.0 { ACCENT_ORANGE } else { ACCENT_RED };

            egui::Grid::new("stats").num_columns(2).spacing([20.0, 4.0]).show(ui, |ui| {
                ui.label(RichText::new("FPS").color(TEXT_MUTED));
                ui.label(RichText::new(format!("{:.0}", stats.fps)).color(fps_color));
                ui.end_row();

                ui.label(RichText::new("Time").color(TEXT_MUTED));
                ui.label(RichText::new(format!("{:.2}s", stats.time)).color(ACCENT_CYAN));
                ui.end_row();

                ui.label(RichText::new("Vertices").color(TEXT_MUTED));
                ui.label(RichText::new(fmt_num(stats.vertex_count as usize)).color(TEXT_PRIMARY));
                ui.end_row();

                if backend == ShadingBackend::Cpu {
                    ui.label(RichText::new("Eval ms").color(TEXT_MUTED));
                    ui.label(RichText::new(format!("{:.2}", stats.cpu_eval_ms)).color(ACCENT_MAGENTA));
                    ui.end_row();

                    ui.label(RichText::new("Lag ms").color(TEXT_MUTED));
                    ui.label(RichText::new(format!("{:.1}", stats.cpu_lag_ms)).color(TEXT_PRIMARY));
                    ui.end_row();

                    ui.label(RichText::new("Frames").color(TEXT_MUTED));
                    ui.label(RichText::new(fmt_num(stats.cpu_frames as usize)).color(TEXT_PRIMARY));
                    ui.end_row();

                    ui.label(RichText::new("Skipped").color(TEXT_MUTED));
                    ui.label(RichText::new(fmt_num(stats.cpu_skipped as usize)).color(TEXT_PRIMARY));
                    ui.end_row();

                    ui.label(RichText::new("Dropped").color(TEXT_MUTED));
                    ui.label(RichText::new(fmt_num(stats.cpu_dropped as usize)).color(TEXT_PRIMARY));
                    ui.end_row();
                }
            });

            ui.add_space(8.0);

            let status = if stats.clock_paused {
                RichText::new("PAUSED").color(ACCENT_ORANGE).strong()
            } else {
                RichText::new("Animating").color(ACCENT_GREEN)
            };
            ui.horizontal(|ui| {
                ui.label(RichText::new("Status:").color(TEXT_MUTED));
                ui.label(status);
            });
        });
}

pub fn draw_help_overlay(ctx: &Context, distance: f32, zoom_enabled: bool) {
    egui::Area::new(egui::Id::new("help_overlay"))
        .anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(12.0, -12.0))
        .show(ctx, |ui| {
            egui::Frame::default()
                .fill(Color32::from_black_alpha(180))
                .rounding(6.0)
                .inner_margin(10.0)
                .show(ui, |ui| {
                    ui.style_mut().override_font_id = Some(egui::FontId::new(11.0, egui::FontFamily::Monospace));
                    let zoom = if zoom_enabled { "Scroll - Zoom" } else { "Zoom locked" };
                    ui.label(RichText::new(format!("LMB+Drag - Orbit | {zoom} | Space - Pause")).color(TEXT_MUTED));
                    ui.label(RichText::new(format!("Distance: {:.2}", distance)).color(TEXT_MUTED));
                });
        });
}

fn fmt_num(n: usize) -> String {
    if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::fmt_num;

    #[test]
    fn numbers_are_abbreviated() {
        assert_eq!(fmt_num(950), "950");
        assert_eq!(fmt_num(40_401), "40.4K");
        assert_eq!(fmt_num(2_500_000), "2.50M");
    }
}
