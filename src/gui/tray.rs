//! System tray icon whose menu drives [`TrayAction`]s.
//!
//! The tray exists on Windows and macOS. Elsewhere [`SystemTray::install`]
//! returns `None` and the window falls back to an in-window menu.

use super::state::TrayAction;
use eframe::egui;
use std::sync::mpsc::Receiver;

/// Edge length of the generated icon, in pixels
pub const ICON_SIZE: u32 = 32;
const ICON_COLOR: [u8; 3] = [37, 99, 235];

/// A round RGBA icon, transparent outside the circle
#[cfg_attr(not(any(windows, target_os = "macos")), allow(dead_code))]
fn icon_pixels(size: u32) -> Vec<u8> {
    let center = (size as f32 - 1.0) / 2.0;
    let radius = size as f32 / 2.0;
    let mut rgba = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let (dx, dy) = (x as f32 - center, y as f32 - center);
            let alpha = if dx * dx + dy * dy <= radius * radius { 255 } else { 0 };
            rgba.extend_from_slice(&[ICON_COLOR[0], ICON_COLOR[1], ICON_COLOR[2], alpha]);
        }
    }
    rgba
}

pub struct SystemTray {
    actions: Receiver<TrayAction>,
    #[cfg(any(windows, target_os = "macos"))]
    _icon: tray_icon::TrayIcon,
}

impl SystemTray {
    /// Next menu action not yet handled
    pub fn poll(&self) -> Option<TrayAction> {
        self.actions.try_recv().ok()
    }

    /// Put the icon in the tray.
    ///
    /// Menu clicks are forwarded to [`SystemTray::poll`] and wake `ctx`.
    /// A hidden window gets no frames, so Show and Quit also make it
    /// visible from the menu handler.
    #[cfg(any(windows, target_os = "macos"))]
    pub fn install(ctx: &egui::Context, tooltip: &str) -> Option<Self> {
        use tray_icon::menu::{Menu, MenuEvent, MenuItem};
        use tray_icon::{Icon, TrayIconBuilder};
        use tracing::warn;

        let show = MenuItem::new("Show", true, None);
        let hide = MenuItem::new("Hide", true, None);
        let quit = MenuItem::new("Quit", true, None);
        let menu = Menu::new();
        if let Err(e) = menu.append_items(&[&show, &hide, &quit]) {
            warn!("Could not build tray menu: {}", e);
            return None;
        }

        let icon = match Icon::from_rgba(icon_pixels(ICON_SIZE), ICON_SIZE, ICON_SIZE) {
            Ok(icon) => icon,
            Err(e) => {
                warn!("Could not build tray icon: {}", e);
                return None;
            }
        };

        let tray = TrayIconBuilder::new()
            .with_menu(Box::new(menu))
            .with_tooltip(tooltip)
            .with_icon(icon)
            .build();
        let tray = match tray {
            Ok(tray) => tray,
            Err(e) => {
                warn!("Could not create tray icon: {}", e);
                return None;
            }
        };

        let entries = [
            (show.id().clone(), TrayAction::Show),
            (hide.id().clone(), TrayAction::Hide),
            (quit.id().clone(), TrayAction::Quit),
        ];
        let (tx, rx) = std::sync::mpsc::channel();
        let ctx = ctx.clone();
        MenuEvent::set_event_handler(Some(move |event: MenuEvent| {
            let Some((_, action)) = entries.iter().find(|(id, _)| *id == event.id) else {
                return;
            };
            if *action != TrayAction::Hide {
                ctx.send_viewport_cmd(egui::ViewportCommand::Visible(true));
            }
            let _ = tx.send(*action);
            ctx.request_repaint();
        }));

        Some(Self {
            actions: rx,
            _icon: tray,
        })
    }

    #[cfg(not(any(windows, target_os = "macos")))]
    pub fn install(_ctx: &egui::Context, _tooltip: &str) -> Option<Self> {
        tracing::debug!("No system tray on this platform");
        None
    }
}
