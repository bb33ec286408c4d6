//! Application theme and color definitions.
//!
//! Light and dark palettes in sea tones, following the system preference.

use std::sync::atomic::{AtomicBool, Ordering};

use eframe::egui::{self, Color32, FontFamily, FontId, Rounding, Stroke, TextStyle, Theme, Visuals};

/// Dark palette.
pub mod dark {
    use eframe::egui::Color32;

    pub const BG_DEEP: Color32 = Color32::from_rgb(0x10, 0x18, 0x20);
    pub const BG_PANEL: Color32 = Color32::from_rgb(0x16, 0x20, 0x2a);
    pub const BG_HEADER: Color32 = Color32::from_rgb(0x1c, 0x28, 0x34);
    pub const BG_INPUT: Color32 = Color32::from_rgb(0x22, 0x30, 0x3d);

    pub const BORDER: Color32 = Color32::from_rgb(0x2c, 0x3b, 0x49);

    pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(0xdd, 0xe6, 0xee);
    pub const TEXT_MUTED: Color32 = Color32::from_rgb(0x86, 0x97, 0xa6);

    pub const BUTTON_HOVER: Color32 = Color32::from_rgb(0x2a, 0x3a, 0x49);
}

/// Light palette.
pub mod light {
    use eframe::egui::Color32;

    pub const BG_DEEP: Color32 = Color32::from_rgb(0xee, 0xf3, 0xf6);
    pub const BG_PANEL: Color32 = Color32::from_rgb(0xfb, 0xfd, 0xfe);
    pub const BG_HEADER: Color32 = Color32::from_rgb(0xe4, 0xec, 0xf1);
    pub const BG_INPUT: Color32 = Color32::from_rgb(0xf0, 0xf4, 0xf7);

    pub const BORDER: Color32 = Color32::from_rgb(0xc6, 0xd2, 0xdb);

    pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(0x14, 0x22, 0x2e);
    pub const TEXT_MUTED: Color32 = Color32::from_rgb(0x5a, 0x6b, 0x78);

    pub const BUTTON_HOVER: Color32 = Color32::from_rgb(0xdb, 0xe5, 0xec);
}

/// Accent colors shared by both themes.
pub mod accent {
    use eframe::egui::Color32;

    pub const BLUE: Color32 = Color32::from_rgb(0x1f, 0x8f, 0xd6);
    pub const GREEN: Color32 = Color32::from_rgb(0x10, 0xb9, 0x81);
    pub const ORANGE: Color32 = Color32::from_rgb(0xf5, 0x9e, 0x0b);
    pub const RED: Color32 = Color32::from_rgb(0xef, 0x44, 0x44);
}

/// Theme-aware color accessor.
#[derive(Clone, Copy)]
pub struct ThemeColors {
    pub bg_header: Color32,
    pub border: Color32,
    pub text_muted: Color32,
}

impl ThemeColors {
    pub fn from_ctx(ctx: &egui::Context) -> Self {
        Self::from_dark_mode(ctx.style().visuals.dark_mode)
    }

    pub fn from_ui(ui: &egui::Ui) -> Self {
        Self::from_dark_mode(ui.visuals().dark_mode)
    }

    pub fn from_dark_mode(is_dark: bool) -> Self {
        if is_dark {
            Self {
                bg_header: dark::BG_HEADER,
                border: dark::BORDER,
                text_muted: dark::TEXT_MUTED,
            }
        } else {
            Self {
                bg_header: light::BG_HEADER,
                border: light::BORDER,
                text_muted: light::TEXT_MUTED,
            }
        }
    }
}

struct Palette {
    bg_deep: Color32,
    bg_panel: Color32,
    bg_input: Color32,
    border: Color32,
    text_primary: Color32,
    text_muted: Color32,
    button_hover: Color32,
}

const DARK: Palette = Palette {
    bg_deep: dark::BG_DEEP,
    bg_panel: dark::BG_PANEL,
    bg_input: dark::BG_INPUT,
    border: dark::BORDER,
    text_primary: dark::TEXT_PRIMARY,
    text_muted: dark::TEXT_MUTED,
    button_hover: dark::BUTTON_HOVER,
};

const LIGHT: Palette = Palette {
    bg_deep: light::BG_DEEP,
    bg_panel: light::BG_PANEL,
    bg_input: light::BG_INPUT,
    border: light::BORDER,
    text_primary: light::TEXT_PRIMARY,
    text_muted: light::TEXT_MUTED,
    button_hover: light::BUTTON_HOVER,
};

fn build_visuals(mut visuals: Visuals, palette: &Palette) -> Visuals {
    let rounding = Rounding::same(3.0);

    visuals.window_fill = palette.bg_panel;
    visuals.panel_fill = palette.bg_panel;
    visuals.faint_bg_color = palette.bg_deep;
    visuals.extreme_bg_color = palette.bg_input;

    let widgets = &mut visuals.widgets;
    widgets.noninteractive.bg_fill = palette.bg_input;
    widgets.noninteractive.fg_stroke = Stroke::new(1.0, palette.text_muted);
    widgets.noninteractive.bg_stroke = Stroke::new(1.0, palette.border);
    widgets.noninteractive.rounding = rounding;

    widgets.inactive.bg_fill = palette.bg_input;
    widgets.inactive.fg_stroke = Stroke::new(1.0, palette.text_primary);
    widgets.inactive.bg_stroke = Stroke::new(1.0, palette.border);
    widgets.inactive.rounding = rounding;

    widgets.hovered.bg_fill = palette.button_hover;
    widgets.hovered.fg_stroke = Stroke::new(1.0, palette.text_primary);
    widgets.hovered.bg_stroke = Stroke::new(1.0, accent::BLUE);
    widgets.hovered.rounding = rounding;

    widgets.active.bg_fill = accent::BLUE;
    widgets.active.fg_stroke = Stroke::new(1.0, Color32::WHITE);
    widgets.active.bg_stroke = Stroke::new(1.0, accent::BLUE);
    widgets.active.rounding = rounding;

    widgets.open.bg_fill = palette.bg_input;
    widgets.open.fg_stroke = Stroke::new(1.0, palette.text_primary);
    widgets.open.bg_stroke = Stroke::new(1.0, palette.border);
    widgets.open.rounding = rounding;

    visuals.selection.bg_fill = accent::BLUE.gamma_multiply(0.3);
    visuals.selection.stroke = Stroke::new(1.0, accent::BLUE);
    visuals
}

/// Configure egui style for the given theme.
pub fn configure_style_for_theme(ctx: &egui::Context, theme: Theme) {
    let visuals = match theme {
        Theme::Dark => build_visuals(Visuals::dark(), &DARK),
        Theme::Light => build_visuals(Visuals::light(), &LIGHT),
    };
    ctx.set_visuals(visuals);

    let mut style = (*ctx.style()).clone();
    style.text_styles = [
        (TextStyle::Small, FontId::new(10.0, FontFamily::Proportional)),
        (TextStyle::Body, FontId::new(13.0, FontFamily::Proportional)),
        (TextStyle::Button, FontId::new(13.0, FontFamily::Proportional)),
        (TextStyle::Heading, FontId::new(16.0, FontFamily::Proportional)),
        (TextStyle::Monospace, FontId::new(12.0, FontFamily::Monospace)),
    ]
    .into();
    style.spacing.item_spacing = egui::vec2(8.0, 5.0);
    style.spacing.button_padding = egui::vec2(8.0, 4.0);
    ctx.set_style(style);
}

/// Configure style based on current visuals (dark/light mode).
pub fn configure_style(ctx: &egui::Context) {
    let theme = if ctx.style().visuals.dark_mode {
        Theme::Dark
    } else {
        Theme::Light
    };
    configure_style_for_theme(ctx, theme);
}

static LAST_DARK_MODE: AtomicBool = AtomicBool::new(true);
static THEME_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Re-applies the style when the system switches between light and dark.
pub fn apply_system_theme(ctx: &egui::Context) {
    let is_dark = ctx.style().visuals.dark_mode;
    let was_initialized = THEME_INITIALIZED.swap(true, Ordering::Relaxed);
    let last_dark = LAST_DARK_MODE.swap(is_dark, Ordering::Relaxed);
    if !was_initialized || last_dark != is_dark {
        configure_style(ctx);
    }
}

/// The confirm button of panels and the downloader.
pub fn primary_button(text: &str) -> egui::Button<'_> {
    egui::Button::new(egui::RichText::new(text).color(Color32::WHITE))
        .fill(accent::GREEN)
        .rounding(Rounding::same(3.0))
}

/// Small upper-case caption above a form field.
pub fn form_label(text: &str) -> egui::RichText {
    egui::RichText::new(text.to_uppercase()).size(10.0)
}

/// Header of a side panel section.
pub fn section_header(text: &str) -> egui::RichText {
    egui::RichText::new(text).size(13.0).strong()
}
