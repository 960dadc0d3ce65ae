//! Smoke-test window state, independent of rendering.

use std::time::Duration;

/// Period of the progress timer
pub const TICK_INTERVAL: Duration = Duration::from_millis(50);
/// Progress added per tick
pub const PROGRESS_STEP: u8 = 5;
pub const PROGRESS_MAX: u8 = 100;
/// How long a desktop notification stays up
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(2);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Ready,
    Processing(u32),
    Completed,
}

impl Status {
    pub fn text(&self) -> String {
        match self {
            Status::Ready => "System Status: Ready".to_string(),
            Status::Processing(n) => format!("Processing click {}...", n),
            Status::Completed => "Operation completed!".to_string(),
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, Status::Processing(_))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub timeout: Duration,
}

/// Entries of the tray icon's menu
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrayAction {
    Show,
    Hide,
    Quit,
}

/// What the window should do after a close request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseDecision {
    /// Keep running, window hidden
    Hide,
    Exit,
}

#[derive(Clone, Debug)]
pub struct SmokeState {
    pub clicks: u32,
    pub progress: u8,
    pub status: Status,
    pub debug_log: Vec<String>,
    pub visible: bool,
    /// Reset asked for, waiting on Yes/No
    pub confirming_reset: bool,
    timer_running: bool,
    quit_requested: bool,
    /// Raised but not yet handed to the desktop
    pending: Vec<Notification>,
}

impl Default for SmokeState {
    fn default() -> Self {
        Self {
            clicks: 0,
            progress: 0,
            status: Status::Ready,
            debug_log: Vec::new(),
            visible: true,
            confirming_reset: false,
            timer_running: false,
            quit_requested: false,
            pending: Vec::new(),
        }
    }
}

impl SmokeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timer_running(&self) -> bool {
        self.timer_running
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Test button: count, log, restart the progress animation
    pub fn click(&mut self) {
        self.clicks += 1;
        self.debug_log.push(format!("Button clicked {} times", self.clicks));
        self.status = Status::Processing(self.clicks);
        self.progress = 0;
        self.timer_running = true;
        self.notify(
            "Button Clicked",
            &format!("Button has been clicked {} times", self.clicks),
        );
    }

    /// One timer period elapsed.
    ///
    /// Progress stops at 100; the tick after that ends the operation.
    pub fn tick(&mut self) {
        if !self.timer_running {
            return;
        }
        if self.progress < PROGRESS_MAX {
            self.progress = (self.progress + PROGRESS_STEP).min(PROGRESS_MAX);
        } else {
            self.timer_running = false;
            self.status = Status::Completed;
        }
    }

    pub fn request_reset(&mut self) {
        self.confirming_reset = true;
    }

    /// Answer to the reset prompt; only `true` clears anything
    pub fn confirm_reset(&mut self, yes: bool) {
        self.confirming_reset = false;
        if yes {
            self.clicks = 0;
            self.progress = 0;
            self.debug_log.clear();
            self.status = Status::Ready;
            self.timer_running = false;
        }
    }

    /// The window's close button never exits
    pub fn close_requested(&mut self) -> CloseDecision {
        if self.quit_requested {
            return CloseDecision::Exit;
        }
        self.visible = false;
        self.notify(
            "Application Minimized",
            "Application is still running in the system tray",
        );
        CloseDecision::Hide
    }

    pub fn tray(&mut self, action: TrayAction) {
        match action {
            TrayAction::Show => self.visible = true,
            TrayAction::Hide => self.visible = false,
            TrayAction::Quit => self.quit_requested = true,
        }
    }

    fn notify(&mut self, title: &str, message: &str) {
        self.pending.push(Notification {
            title: title.to_string(),
            message: message.to_string(),
            timeout: NOTIFICATION_TTL,
        });
    }

    /// Notifications raised since the last call, oldest first
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.pending)
    }

    pub fn debug_text(&self) -> String {
        self.debug_log.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_to_completion(state: &mut SmokeState) -> usize {
        let mut ticks = 0;
        while state.timer_running() {
            state.tick();
            ticks += 1;
            assert!(ticks < 100, "timer never stopped");
        }
        ticks
    }

    #[test]
    fn click_starts_processing() {
        let mut state = SmokeState::new();

        state.click();

        assert_eq!(state.clicks, 1);
        assert_eq!(state.status.text(), "Processing click 1...");
        assert_eq!(state.debug_log, vec!["Button clicked 1 times"]);
        assert!(state.timer_running());
        let notes = state.take_notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Button Clicked");
        assert_eq!(notes[0].message, "Button has been clicked 1 times");
    }

    #[test]
    fn progress_runs_to_one_hundred_then_completes() {
        let mut state = SmokeState::new();
        state.click();

        for _ in 0..20 {
            state.tick();
        }
        assert_eq!(state.progress, 100);
        assert!(state.status.is_busy());

        state.tick();
        assert!(!state.timer_running());
        assert_eq!(state.status, Status::Completed);
        assert_eq!(state.status.text(), "Operation completed!");
    }

    #[test]
    fn second_click_restarts_progress() {
        let mut state = SmokeState::new();
        state.click();
        state.tick();
        state.tick();

        state.click();

        assert_eq!(state.progress, 0);
        assert_eq!(state.debug_log.len(), 2);
        assert_eq!(state.debug_log[1], "Button clicked 2 times");
        assert_eq!(run_to_completion(&mut state), 21);
    }

    #[test]
    fn tick_without_timer_does_nothing() {
        let mut state = SmokeState::new();
        state.tick();

        assert_eq!(state.progress, 0);
        assert_eq!(state.status, Status::Ready);
    }

    #[test]
    fn declined_reset_keeps_everything() {
        let mut state = SmokeState::new();
        state.click();
        state.request_reset();
        assert!(state.confirming_reset);

        state.confirm_reset(false);

        assert!(!state.confirming_reset);
        assert_eq!(state.clicks, 1);
        assert_eq!(state.debug_log.len(), 1);
    }

    #[test]
    fn accepted_reset_clears_state() {
        let mut state = SmokeState::new();
        state.click();
        state.tick();
        state.request_reset();

        state.confirm_reset(true);

        assert_eq!(state.clicks, 0);
        assert_eq!(state.progress, 0);
        assert!(state.debug_log.is_empty());
        assert_eq!(state.status, Status::Ready);
        assert!(!state.timer_running());
    }

    #[test]
    fn close_hides_and_notifies() {
        let mut state = SmokeState::new();

        assert_eq!(state.close_requested(), CloseDecision::Hide);
        assert!(!state.visible);
        let notes = state.take_notifications();
        assert_eq!(notes[0].title, "Application Minimized");
        assert_eq!(notes[0].message, "Application is still running in the system tray");
    }

    #[test]
    fn only_quit_exits() {
        let mut state = SmokeState::new();
        state.tray(TrayAction::Hide);
        assert!(!state.visible);
        state.tray(TrayAction::Show);
        assert!(state.visible);

        state.tray(TrayAction::Quit);
        assert_eq!(state.close_requested(), CloseDecision::Exit);
    }

    #[test]
    fn notifications_are_handed_out_once() {
        let mut state = SmokeState::new();
        state.click();
        state.click();

        let notes = state.take_notifications();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[1].message, "Button has been clicked 2 times");
        assert!(notes.iter().all(|n| n.timeout == Duration::from_secs(2)));
        assert!(state.take_notifications().is_empty());
    }
}
