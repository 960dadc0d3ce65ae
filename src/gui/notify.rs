//! Desktop notifications

use super::state::Notification;
use tracing::{debug, warn};

/// Hand `note` to the desktop's notification service.
///
/// Runs on its own thread so a slow or missing service never stalls a
/// frame. Failures are only logged.
pub fn show(app_name: &'static str, note: Notification) {
    std::thread::spawn(move || {
        let timeout = u32::try_from(note.timeout.as_millis()).unwrap_or(u32::MAX);
        let shown = notify_rust::Notification::new()
            .appname(app_name)
            .summary(&note.title)
            .body(&note.message)
            .timeout(notify_rust::Timeout::Milliseconds(timeout))
            .show();
        match shown {
            Ok(_) => debug!("Notified: {}", note.title),
            Err(e) => warn!("Could not show notification '{}': {}", note.title, e),
        }
    });
}
