//! Light/dark palettes for the smoke-test window

use egui::Color32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThemeMode {
    Light,
    Dark,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Theme {
    pub window: Color32,
    pub banner: Color32,
    pub banner_text: Color32,
    pub text: Color32,
    pub text_dim: Color32,
    pub console_bg: Color32,
    pub console_text: Color32,
    pub accent: Color32,
    pub danger: Color32,
    pub ready: Color32,
    pub busy: Color32,
}

impl Theme {
    pub const LIGHT: Self = Self {
        window: Color32::from_rgb(0xf5, 0xf6, 0xfa),
        banner: Color32::from_rgb(0xec, 0xf0, 0xf1),
        banner_text: Color32::from_rgb(0x2c, 0x3e, 0x50),
        text: Color32::from_rgb(0x2a, 0x2a, 0x2a),
        text_dim: Color32::from_rgb(0x88, 0x88, 0x88),
        console_bg: Color32::from_rgb(0x2c, 0x3e, 0x50),
        console_text: Color32::from_rgb(0xec, 0xf0, 0xf1),
        accent: Color32::from_rgb(0x34, 0x98, 0xdb),
        danger: Color32::from_rgb(0xe7, 0x4c, 0x3c),
        ready: Color32::from_rgb(0x27, 0xae, 0x60),
        busy: Color32::from_rgb(0xe6, 0x7e, 0x22),
    };

    pub const DARK: Self = Self {
        window: Color32::from_rgb(0x1a, 0x1a, 0x1a),
        banner: Color32::from_rgb(0x22, 0x22, 0x22),
        banner_text: Color32::from_rgb(0xe0, 0xe0, 0xe0),
        text: Color32::from_rgb(0xe0, 0xe0, 0xe0),
        text_dim: Color32::from_rgb(0x5c, 0x5c, 0x5c),
        console_bg: Color32::from_rgb(0x0f, 0x0f, 0x0f),
        console_text: Color32::from_rgb(0xe0, 0xe0, 0xe0),
        accent: Color32::from_rgb(0x00, 0xbc, 0xd4), // Cyan
        danger: Color32::from_rgb(0xf4, 0x43, 0x36),
        ready: Color32::from_rgb(0x4c, 0xaf, 0x50),
        busy: Color32::from_rgb(0xff, 0x98, 0x00),
    };

    pub fn from_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Light => Self::LIGHT,
            ThemeMode::Dark => Self::DARK,
        }
    }
}

/// Apply theme to egui visuals
pub fn apply_theme(ctx: &egui::Context, mode: ThemeMode, theme: &Theme) {
    let mut visuals = match mode {
        ThemeMode::Light => egui::Visuals::light(),
        ThemeMode::Dark => egui::Visuals::dark(),
    };

    visuals.panel_fill = theme.window;
    visuals.extreme_bg_color = theme.console_bg;
    visuals.widgets.noninteractive.fg_stroke.color = theme.text;
    visuals.selection.bg_fill = theme.accent;

    ctx.set_visuals(visuals);
}

/// Follow the Windows app theme (`AppsUseLightTheme`: 0 = dark, 1 = light)
#[cfg(target_os = "windows")]
pub fn detect_system_theme() -> ThemeMode {
    use winreg::enums::HKEY_CURRENT_USER;
    use winreg::RegKey;

    let light: Option<u32> = RegKey::predef(HKEY_CURRENT_USER)
        .open_subkey(r"Software\Microsoft\Windows\CurrentVersion\Themes\Personalize")
        .and_then(|key| key.get_value("AppsUseLightTheme"))
        .ok();

    match light {
        Some(0) => ThemeMode::Dark,
        Some(_) => ThemeMode::Light,
        None => ThemeMode::Dark,
    }
}

#[cfg(not(target_os = "windows"))]
pub fn detect_system_theme() -> ThemeMode {
    ThemeMode::Light
}
