//! GUI toolkit reinstall and post-repair verification.

use crate::command::{display_command, run_logged};
use crate::error::{DoctorError, Result};
use crate::repair::env_path::find_executable;
use crate::repair::RepairContext;
use std::ffi::OsStr;
use tracing::{error, info, warn};

/// Remove the toolkit and everything it drags in
pub fn uninstall(ctx: &RepairContext<'_>) -> Result<()> {
    let mut args = vec!["uninstall"];
    args.extend(ctx.settings.repair.toolkit_uninstall.iter().map(String::as_str));
    args.push("-y");
    run_logged(ctx.runner, &ctx.settings.python.pip, &args).map(|_| ())
}

pub fn install(ctx: &RepairContext<'_>) -> Result<()> {
    run_logged(
        ctx.runner,
        &ctx.settings.python.pip,
        &["install", ctx.settings.repair.toolkit_package.as_str()],
    )
    .map(|_| ())
}

/// Import the toolkit and look for its companion executables.
///
/// Only a failed import makes this step fail; missing executables are
/// warnings.
pub fn verify_installation(ctx: &RepairContext<'_>) -> Result<()> {
    let python = &ctx.settings.python.python;
    let probe = ctx.settings.repair.toolkit_version_probe.as_str();
    let package = &ctx.settings.repair.toolkit_package;

    let import = ctx
        .runner
        .run(python, &["-c", probe])
        .and_then(|out| out.require_success(&display_command(python, &["-c", probe])));

    let result = match import {
        Ok(out) => {
            info!("{} version: {}", package, out.stdout.trim());
            Ok(())
        }
        Err(e) => {
            error!("{} import failed: {}", package, e);
            Err(DoctorError::Unavailable {
                what: package.clone(),
                message: e.to_string(),
            })
        }
    };

    let search_path = ctx.session.get("PATH").unwrap_or_default();
    for name in &ctx.settings.repair.companion_executables {
        match find_executable(name, OsStr::new(&search_path)) {
            Some(path) => info!("Found {} at: {}", name, path.display()),
            None => warn!("Could not find {}", name),
        }
    }

    info!(
        "PYTHONPATH: {}",
        ctx.session
            .get("PYTHONPATH")
            .unwrap_or_else(|| "Not set".to_string())
    );

    result
}
