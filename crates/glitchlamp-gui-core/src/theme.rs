//! Visual styling for the glitchlamp editor.

use egui::{Color32, CornerRadius, Stroke, Style, Visuals};

use glitchlamp_core::EffectKind;

/// Theme colors for the editor.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Stage background color.
    pub background: Color32,
    /// Panel/window background color.
    pub panel_bg: Color32,
    /// Node card body color.
    pub card_bg: Color32,
    /// Node card header color.
    pub card_header: Color32,
    /// Card border color.
    pub card_border: Color32,
    /// Primary accent color for active elements.
    pub accent: Color32,
    /// Dimmed accent color for inactive elements.
    pub accent_dim: Color32,
    /// Primary text color.
    pub text_primary: Color32,
    /// Secondary/muted text color.
    pub text_secondary: Color32,
    /// Header tint of source nodes.
    pub source: Color32,
    /// Header tint of generator nodes.
    pub generator: Color32,
    /// Header tint of file-level effects (mix, chopper, ...).
    pub file_level: Color32,
    /// Unconnected port fill.
    pub port: Color32,
    /// Connected port fill.
    pub port_connected: Color32,
    /// Connection curve color.
    pub connection: Color32,
    /// Glow of the node being processed.
    pub glow_processing: Color32,
    /// Glow of nodes already processed.
    pub glow_processed: Color32,
    /// Info toast border.
    pub toast_info: Color32,
    /// Warning toast border.
    pub toast_warning: Color32,
    /// Error toast border.
    pub toast_error: Color32,
    /// Stage grid dot color.
    pub grid: Color32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color32::from_rgb(18, 16, 24),
            panel_bg: Color32::from_rgb(30, 28, 38),
            card_bg: Color32::from_rgb(38, 36, 48),
            card_header: Color32::from_rgb(52, 48, 66),
            card_border: Color32::from_rgb(70, 66, 88),
            accent: Color32::from_rgb(255, 64, 160),
            accent_dim: Color32::from_rgb(140, 50, 100),
            text_primary: Color32::from_rgb(232, 228, 240),
            text_secondary: Color32::from_rgb(150, 146, 165),
            source: Color32::from_rgb(60, 150, 220),
            generator: Color32::from_rgb(140, 110, 230),
            file_level: Color32::from_rgb(230, 170, 60),
            port: Color32::from_rgb(90, 86, 110),
            port_connected: Color32::from_rgb(0, 220, 200),
            connection: Color32::from_rgb(0, 200, 190),
            glow_processing: Color32::from_rgb(255, 200, 40),
            glow_processed: Color32::from_rgb(80, 210, 110),
            toast_info: Color32::from_rgb(80, 210, 110),
            toast_warning: Color32::from_rgb(240, 180, 50),
            toast_error: Color32::from_rgb(230, 70, 80),
            grid: Color32::from_rgb(40, 38, 52),
        }
    }
}

impl Theme {
    /// Apply the theme to an egui context.
    pub fn apply(&self, ctx: &egui::Context) {
        let mut style = Style::default();
        let mut visuals = Visuals::dark();

        visuals.window_fill = self.panel_bg;
        visuals.panel_fill = self.panel_bg;
        visuals.extreme_bg_color = self.background;
        visuals.faint_bg_color = self.card_bg;

        visuals.widgets.noninteractive.bg_fill = self.panel_bg;
        visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, self.text_secondary);
        visuals.widgets.noninteractive.corner_radius = CornerRadius::same(4);

        visuals.widgets.inactive.bg_fill = Color32::from_rgb(50, 46, 62);
        visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, self.text_primary);
        visuals.widgets.inactive.corner_radius = CornerRadius::same(4);

        visuals.widgets.hovered.bg_fill = Color32::from_rgb(62, 58, 78);
        visuals.widgets.hovered.fg_stroke = Stroke::new(1.5, self.accent);
        visuals.widgets.hovered.corner_radius = CornerRadius::same(4);

        visuals.widgets.active.bg_fill = Color32::from_rgb(74, 68, 92);
        visuals.widgets.active.fg_stroke = Stroke::new(2.0, self.accent);
        visuals.widgets.active.corner_radius = CornerRadius::same(4);

        visuals.selection.bg_fill = self.accent.gamma_multiply(0.3);
        visuals.selection.stroke = Stroke::new(1.0, self.accent);

        visuals.override_text_color = Some(self.text_primary);
        style.visuals = visuals;

        style.spacing.item_spacing = egui::vec2(8.0, 6.0);
        style.spacing.window_margin = egui::Margin::same(12);
        style.spacing.button_padding = egui::vec2(8.0, 4.0);
        // Big enough to hit with a finger in the list view.
        style.spacing.interact_size.y = 24.0;

        ctx.set_style(style);
    }

    /// Header tint for a node of `kind`.
    pub fn kind_color(&self, kind: EffectKind) -> Color32 {
        match kind {
            EffectKind::Source => self.source,
            EffectKind::Generator => self.generator,
            EffectKind::File => self.file_level,
            EffectKind::Frame => self.card_header,
        }
    }
}
