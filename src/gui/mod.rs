//! Sample window proving the GUI stack can open a window, take input and
//! repaint on a timer.

mod app;
mod notify;
pub mod state;
pub mod theme;
pub mod tray;

pub use app::{SmokeApp, WINDOW_TITLE};
pub use state::SmokeState;
