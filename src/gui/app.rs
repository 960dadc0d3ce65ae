//! eframe front end over [`SmokeState`]

use super::notify;
use super::state::{CloseDecision, SmokeState, TrayAction, PROGRESS_MAX, TICK_INTERVAL};
use super::theme::{apply_theme, detect_system_theme, Theme, ThemeMode};
use super::tray::SystemTray;
use eframe::egui;
use std::time::Instant;
use tracing::{debug, info};

pub const WINDOW_TITLE: &str = "PyQt6 Test";
const TRAY_TOOLTIP: &str = "PyQt6 Test Application";
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Viewport commands carrying out a tray action.
///
/// Without a tray icon nothing could bring a hidden window back, so hiding
/// only minimizes.
fn window_commands(action: TrayAction, has_tray: bool) -> Vec<egui::ViewportCommand> {
    use egui::ViewportCommand as Cmd;
    match (action, has_tray) {
        (TrayAction::Show, true) => vec![Cmd::Visible(true), Cmd::Focus],
        (TrayAction::Show, false) => vec![Cmd::Minimized(false), Cmd::Focus],
        (TrayAction::Hide, true) => vec![Cmd::Visible(false)],
        (TrayAction::Hide, false) => vec![Cmd::Minimized(true)],
        (TrayAction::Quit, _) => vec![Cmd::Close],
    }
}

pub struct SmokeApp {
    state: SmokeState,
    theme_mode: ThemeMode,
    theme: Theme,
    last_tick: Instant,
    tray: Option<SystemTray>,
}

impl SmokeApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let theme_mode = detect_system_theme();
        let tray = SystemTray::install(&cc.egui_ctx, TRAY_TOOLTIP);
        if tray.is_some() {
            info!("Tray icon installed");
        }
        Self {
            state: SmokeState::new(),
            theme_mode,
            theme: Theme::from_mode(theme_mode),
            last_tick: Instant::now(),
            tray,
        }
    }

    fn send_commands(&self, ctx: &egui::Context, action: TrayAction) {
        for cmd in window_commands(action, self.tray.is_some()) {
            ctx.send_viewport_cmd(cmd);
        }
    }

    fn toggle_theme(&mut self) {
        self.theme_mode = self.theme_mode.toggled();
        self.theme = Theme::from_mode(self.theme_mode);
    }

    /// Catch up on timer periods missed since the last frame
    fn advance_timer(&mut self, ctx: &egui::Context) {
        if !self.state.timer_running() {
            return;
        }
        while self.state.timer_running() && self.last_tick.elapsed() >= TICK_INTERVAL {
            self.state.tick();
            self.last_tick += TICK_INTERVAL;
        }
        if self.state.timer_running() {
            ctx.request_repaint_after(TICK_INTERVAL);
        } else {
            info!("Operation completed after {} clicks", self.state.clicks);
        }
    }

    fn handle_close(&mut self, ctx: &egui::Context) {
        if !ctx.input(|i| i.viewport().close_requested()) {
            return;
        }
        match self.state.close_requested() {
            CloseDecision::Exit => info!("Quitting"),
            CloseDecision::Hide => {
                ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
                self.send_commands(ctx, TrayAction::Hide);
            }
        }
    }

    fn apply_tray(&mut self, ctx: &egui::Context, action: TrayAction) {
        debug!("Tray action {:?}", action);
        self.state.tray(action);
        self.send_commands(ctx, action);
    }

    fn poll_tray(&mut self, ctx: &egui::Context) {
        loop {
            let Some(action) = self.tray.as_ref().and_then(SystemTray::poll) else {
                break;
            };
            self.apply_tray(ctx, action);
        }
    }

    fn dispatch_notifications(&mut self) {
        for note in self.state.take_notifications() {
            notify::show(WINDOW_TITLE, note);
        }
    }

    fn render_menu(&mut self, ctx: &egui::Context) {
        let mut action = None;
        egui::TopBottomPanel::top("menu").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                // Stands in for the tray menu where there is no tray
                if self.tray.is_none() {
                    ui.menu_button("Window", |ui| {
                        for (label, tray) in [
                            ("Show", TrayAction::Show),
                            ("Hide", TrayAction::Hide),
                            ("Quit", TrayAction::Quit),
                        ] {
                            if ui.button(label).clicked() {
                                action = Some(tray);
                                ui.close_menu();
                            }
                        }
                    });
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let btn_text = match self.theme_mode {
                        ThemeMode::Light => "DARK",
                        ThemeMode::Dark => "LIGHT",
                    };
                    if ui.small_button(btn_text).clicked() {
                        self.toggle_theme();
                    }
                });
            });
        });

        if let Some(action) = action {
            self.apply_tray(ctx, action);
        }
    }

    fn render_footer(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    egui::RichText::new("Application ready")
                        .size(10.0)
                        .color(self.theme.text_dim),
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(
                        egui::RichText::new(format!("v{}", VERSION))
                            .size(10.0)
                            .family(egui::FontFamily::Monospace)
                            .color(self.theme.text_dim),
                    );
                });
            });
        });
    }

    fn render_body(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(10.0);
            ui.spacing_mut().item_spacing.y = 15.0;

            egui::Frame::none()
                .fill(self.theme.banner)
                .rounding(8.0)
                .inner_margin(10.0)
                .show(ui, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.label(
                            egui::RichText::new("GUI toolkit is working!")
                                .size(24.0)
                                .strong()
                                .color(self.theme.banner_text),
                        );
                    });
                });

            let status_color = if self.state.status.is_busy() {
                self.theme.busy
            } else {
                self.theme.ready
            };
            ui.label(
                egui::RichText::new(self.state.status.text())
                    .size(14.0)
                    .color(status_color),
            );

            ui.add(
                egui::ProgressBar::new(self.state.progress as f32 / PROGRESS_MAX as f32)
                    .show_percentage(),
            );

            let width = ui.available_width();
            let test_button = egui::Button::new(
                egui::RichText::new("Test Button")
                    .size(16.0)
                    .strong()
                    .color(egui::Color32::WHITE),
            )
            .fill(self.theme.accent)
            .rounding(5.0)
            .min_size(egui::vec2(width, 48.0));
            if ui.add(test_button).clicked() {
                self.state.click();
                self.last_tick = Instant::now();
                info!("Button clicked {} times", self.state.clicks);
            }

            egui::Frame::none()
                .fill(self.theme.console_bg)
                .rounding(5.0)
                .inner_margin(10.0)
                .show(ui, |ui| {
                    ui.set_min_width(ui.available_width());
                    egui::ScrollArea::vertical()
                        .max_height(100.0)
                        .stick_to_bottom(true)
                        .show(ui, |ui| {
                            ui.label(
                                egui::RichText::new(self.state.debug_text())
                                    .family(egui::FontFamily::Monospace)
                                    .color(self.theme.console_text),
                            );
                        });
                });

            let reset_button = egui::Button::new(
                egui::RichText::new("Reset").color(egui::Color32::WHITE),
            )
            .fill(self.theme.danger)
            .rounding(5.0)
            .min_size(egui::vec2(width, 36.0));
            if ui.add(reset_button).clicked() {
                self.state.request_reset();
            }
        });
    }

    fn render_reset_prompt(&mut self, ctx: &egui::Context) {
        if !self.state.confirming_reset {
            return;
        }

        let mut answer = None;
        egui::Window::new("Reset Confirmation")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label("Are you sure you want to reset the application?");
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Yes").clicked() {
                        answer = Some(true);
                    }
                    // Default answer
                    if ui.button("No").clicked() || ui.input(|i| i.key_pressed(egui::Key::Escape)) {
                        answer = Some(false);
                    }
                });
            });

        if let Some(yes) = answer {
            self.state.confirm_reset(yes);
            if yes {
                info!("Application reset");
            }
        }
    }
}

impl eframe::App for SmokeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        apply_theme(ctx, self.theme_mode, &self.theme);

        // Tray first, so a Quit is known before the close request it sends
        self.poll_tray(ctx);
        self.handle_close(ctx);
        self.advance_timer(ctx);

        self.render_menu(ctx);
        self.render_footer(ctx);
        self.render_body(ctx);
        self.render_reset_prompt(ctx);
        self.dispatch_notifications();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::ViewportCommand;

    #[test]
    fn tray_hides_and_restores_visibility() {
        assert_eq!(
            window_commands(TrayAction::Hide, true),
            vec![ViewportCommand::Visible(false)]
        );
        assert_eq!(
            window_commands(TrayAction::Show, true),
            vec![ViewportCommand::Visible(true), ViewportCommand::Focus]
        );
    }

    #[test]
    fn without_tray_hiding_minimizes() {
        assert_eq!(
            window_commands(TrayAction::Hide, false),
            vec![ViewportCommand::Minimized(true)]
        );
        assert_eq!(
            window_commands(TrayAction::Show, false),
            vec![ViewportCommand::Minimized(false), ViewportCommand::Focus]
        );
    }

    #[test]
    fn quit_closes_either_way() {
        for has_tray in [true, false] {
            assert_eq!(window_commands(TrayAction::Quit, has_tray), vec![ViewportCommand::Close]);
        }
    }
}
