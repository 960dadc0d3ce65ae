//! Requirements installer
//!
//! Installs the troubleshooter's Python requirements into the configured
//! interpreter. Exits with 1 when the interpreter is too old or any package
//! could not be installed.

use pydoctor::command::SystemRunner;
use pydoctor::installer::Installer;
use pydoctor::settings::{TroubleshootSettings, SETTINGS_FILE};
use pydoctor::workspace::BASE_DIR_NAME;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pydoctor=info")),
        )
        .with_target(false)
        .init();

    // Same settings file the troubleshooter reads; defaults when absent
    let settings = dirs::home_dir()
        .map(|home| TroubleshootSettings::load(&home.join(BASE_DIR_NAME).join(SETTINGS_FILE)))
        .unwrap_or_default();
    let runner = SystemRunner::new(settings.command_timeout());

    match Installer::new(&runner, &settings.python).run() {
        Ok(summary) => ExitCode::from(summary.exit_status()),
        // Already reported by the installer
        Err(_) => ExitCode::FAILURE,
    }
}
