use egui::{Color32, FontFamily, FontId, Rounding, Stroke, TextStyle, Visuals};

pub const BG_PURE_BLACK: Color32 = Color32::from_rgb(0, 0, 0);
pub const BG_PANEL: Color32 = Color32::from_rgb(10, 7, 14);
pub const BG_WIDGET: Color32 = Color32::from_rgb(22, 16, 30);
pub const BG_WIDGET_HOVER: Color32 = Color32::from_rgb(34, 24, 46);

pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(176, 170, 184);
pub const TEXT_MUTED: Color32 = Color32::from_rgb(112, 104, 120);
pub const TEXT_BRIGHT: Color32 = Color32::from_rgb(228, 224, 234);

pub const ACCENT_CYAN: Color32 = Color32::from_rgb(0, 214, 214);
pub const ACCENT_MAGENTA: Color32 = Color32::from_rgb(214, 0, 214);
pub const ACCENT_GREEN: Color32 = Color32::from_rgb(46, 172, 35);
pub const ACCENT_ORANGE: Color32 = Color32::from_rgb(172, 117, 35);
pub const ACCENT_RED: Color32 = Color32::from_rgb(172, 35, 35);

pub const BORDER_SUBTLE: Color32 = Color32::from_rgba_premultiplied(70, 40, 90, 77);

pub fn apply_theme(ctx: &egui::Context) {
    let mut visuals = Visuals::dark();
    visuals.override_text_color = Some(TEXT_PRIMARY);
    visuals.panel_fill = BG_PANEL;
    visuals.window_fill = BG_PANEL;
    visuals.extreme_bg_color = BG_PURE_BLACK;
    visuals.faint_bg_color = BG_PANEL;
    visuals.window_rounding = Rounding::same(6.0);
    visuals.window_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    visuals.selection.bg_fill = ACCENT_MAGENTA.gamma_multiply(0.4);
    visuals.selection.stroke = Stroke::new(1.0, ACCENT_MAGENTA);
    visuals.hyperlink_color = ACCENT_CYAN;
    visuals.warn_fg_color = ACCENT_ORANGE;
    visuals.error_fg_color = ACCENT_RED;
    visuals.slider_trailing_fill = true;

    for widget in [
        &mut visuals.widgets.noninteractive,
        &mut visuals.widgets.inactive,
        &mut visuals.widgets.hovered,
        &mut visuals.widgets.active,
        &mut visuals.widgets.open,
    ] {
        widget.rounding = Rounding::same(4.0);
        widget.bg_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    }
    visuals.widgets.inactive.bg_fill = BG_WIDGET;
    visuals.widgets.inactive.weak_bg_fill = BG_WIDGET;
    visuals.widgets.hovered.bg_fill = BG_WIDGET_HOVER;
    visuals.widgets.hovered.weak_bg_fill = BG_WIDGET_HOVER;
    visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, TEXT_BRIGHT);
    visuals.widgets.active.bg_stroke = Stroke::new(2.0, ACCENT_CYAN);

    let mut style = (*ctx.style()).clone();
    style.visuals = visuals;
    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.button_padding = egui::vec2(8.0, 4.0);
    style.spacing.slider_width = 180.0;
    style.text_styles = [
        (TextStyle::Small, FontId::new(11.0, FontFamily::Proportional)),
        (TextStyle::Body, FontId::new(14.0, FontFamily::Proportional)),
        (TextStyle::Button, FontId::new(14.0, FontFamily::Proportional)),
        (TextStyle::Heading, FontId::new(18.0, FontFamily::Proportional)),
        (TextStyle::Monospace, FontId::new(13.0, FontFamily::Monospace)),
    ]
    .into();

    ctx.set_style(style);
}
