//! Package-manager maintenance: backup, self-upgrade, cache purge.

use crate::command::{display_command, run_logged};
use crate::error::{DoctorError, Result};
use crate::repair::RepairContext;
use chrono::{DateTime, Local};
use std::path::PathBuf;
use tracing::info;

/// `pip_list_20240131_120000.txt`
pub fn backup_file_name(started: &DateTime<Local>) -> String {
    format!("pip_list_{}.txt", started.format("%Y%m%d_%H%M%S"))
}

/// Write `pip freeze` to a timestamped file in the backup directory
pub fn backup_packages(ctx: &RepairContext<'_>) -> Result<PathBuf> {
    let pip = &ctx.settings.python.pip;
    let output = ctx
        .runner
        .run(pip, &["freeze"])?
        .require_success(&display_command(pip, &["freeze"]))?;

    let path = ctx.backup_dir.join(backup_file_name(&ctx.started));
    std::fs::write(&path, output.stdout).map_err(|source| DoctorError::Workspace {
        path: path.clone(),
        source,
    })?;

    info!("Saved installed package list to {}", path.display());
    Ok(path)
}

pub fn upgrade_pip(ctx: &RepairContext<'_>) -> Result<()> {
    run_logged(
        ctx.runner,
        &ctx.settings.python.python,
        &["-m", "pip", "install", "--upgrade", "pip"],
    )
    .map(|_| ())
}

pub fn upgrade_auxiliary(ctx: &RepairContext<'_>) -> Result<()> {
    let mut args = vec!["install", "--upgrade"];
    args.extend(ctx.settings.repair.auxiliary_packages.iter().map(String::as_str));
    run_logged(ctx.runner, &ctx.settings.python.pip, &args).map(|_| ())
}

pub fn purge_cache(ctx: &RepairContext<'_>) -> Result<()> {
    run_logged(ctx.runner, &ctx.settings.python.pip, &["cache", "purge"]).map(|_| ())
}
