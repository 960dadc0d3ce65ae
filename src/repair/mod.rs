//! Best-effort repair of the Python environment
//!
//! Every step runs regardless of how the previous one went. Failures are
//! logged and recorded in the [`RepairSummary`]; nothing is rolled back.

pub mod env_path;
pub mod env_store;
pub mod pip;
pub mod toolkit;

use crate::command::CommandRunner;
use crate::diagnostics::python;
use crate::error::{CheckFailure, Outcome, Result};
use crate::logging::RunLog;
use crate::settings::TroubleshootSettings;
use chrono::{DateTime, Local};
use self::env_store::{PersistentEnv, SessionEnv};
use std::path::{Path, PathBuf};
use tracing::error;

/// What the repair steps act on
pub struct RepairContext<'a> {
    pub runner: &'a dyn CommandRunner,
    pub session: &'a dyn SessionEnv,
    pub store: &'a dyn PersistentEnv,
    pub settings: &'a TroubleshootSettings,
    pub backup_dir: &'a Path,
    /// Start of the run; names the package backup
    pub started: DateTime<Local>,
    pub home: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct RepairStep {
    pub name: &'static str,
    pub outcome: Outcome<()>,
}

#[derive(Clone, Debug, Default)]
pub struct RepairSummary {
    pub steps: Vec<RepairStep>,
    pub backup_file: Option<PathBuf>,
}

impl RepairSummary {
    fn record(&mut self, name: &'static str, result: Result<()>) {
        let outcome = result.map_err(|e| {
            error!("Repair step '{}' failed: {}", name, e);
            CheckFailure::from(e)
        });
        self.steps.push(RepairStep { name, outcome });
    }

    pub fn failed(&self) -> impl Iterator<Item = &RepairStep> {
        self.steps.iter().filter(|s| s.outcome.is_err())
    }

    pub fn succeeded(&self) -> bool {
        self.failed().next().is_none()
    }

    pub fn status_line(&self) -> String {
        let failed = self.failed().count();
        if failed == 0 {
            "Successful".to_string()
        } else {
            format!("Completed with {} of {} steps failed", failed, self.steps.len())
        }
    }
}

/// Backup, upgrade pip and helpers, purge the cache
pub fn fix_pip(ctx: &RepairContext<'_>, log: &RunLog, summary: &mut RepairSummary) {
    log.status("Fixing pip installation...");

    log.status("Creating pip packages backup...");
    let backup = pip::backup_packages(ctx);
    if let Ok(path) = &backup {
        summary.backup_file = Some(path.clone());
    }
    summary.record("backup packages", backup.map(|_| ()));

    log.status("Updating pip to latest version...");
    summary.record("upgrade pip", pip::upgrade_pip(ctx));

    log.status(&format!(
        "Installing/Upgrading {}...",
        ctx.settings.repair.auxiliary_packages.join(" and ")
    ));
    summary.record("upgrade auxiliary packages", pip::upgrade_auxiliary(ctx));

    log.status("Cleaning pip cache...");
    summary.record("purge pip cache", pip::purge_cache(ctx));
}

/// Run every repair step in order
pub fn repair_environment(ctx: &RepairContext<'_>, log: &RunLog) -> RepairSummary {
    let mut summary = RepairSummary::default();
    log.status("Starting environment repair...");

    fix_pip(ctx, log, &mut summary);

    let package = &ctx.settings.repair.toolkit_package;
    log.status(&format!("Repairing {} installation...", package));
    summary.record("uninstall toolkit", toolkit::uninstall(ctx));
    summary.record("install toolkit", toolkit::install(ctx));

    log.status("Setting up environment variables...");
    let env_result = python::introspect(ctx.runner, &ctx.settings.python.python).and_then(|interp| {
        env_path::setup_environment_variables(
            &interp,
            ctx.home.as_deref(),
            ctx.session,
            ctx.store,
            &ctx.settings.repair.companion_executables,
        )
    });
    summary.record("environment variables", env_result);

    log.status("Verifying installation...");
    summary.record("verify installation", toolkit::verify_installation(ctx));

    summary
}
