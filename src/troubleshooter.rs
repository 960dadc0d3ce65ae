//! One troubleshooting run: diagnose, then repair.

use crate::command::{CommandRunner, SystemRunner};
use crate::diagnostics::network::{check_network_connectivity, LiveNetwork, NetworkProbe};
use crate::diagnostics::python::check_python_environment;
use crate::diagnostics::resources::{check_system_resources, ResourceProbe, SysinfoProbe};
use crate::diagnostics::{analyze_results, DiagnosticReport};
use crate::error::Result;
use crate::logging::RunLog;
use crate::repair::env_store::{platform_store, PersistentEnv, ProcessEnv, SessionEnv};
use crate::repair::{self, RepairContext, RepairSummary};
use crate::settings::TroubleshootSettings;
use crate::system_info::SystemSnapshot;
use crate::workspace::Workspace;
use chrono::{DateTime, Local};
use std::path::PathBuf;
use tracing::info;

/// The OS facilities a run talks to
pub struct Backends {
    pub runner: Box<dyn CommandRunner>,
    pub resources: Box<dyn ResourceProbe>,
    pub network: Box<dyn NetworkProbe>,
    pub session: Box<dyn SessionEnv>,
    pub store: Box<dyn PersistentEnv>,
}

impl Backends {
    pub fn live(settings: &TroubleshootSettings) -> Self {
        Self {
            runner: Box::new(SystemRunner::new(settings.command_timeout())),
            resources: Box::new(SysinfoProbe),
            network: Box::new(LiveNetwork),
            session: Box::new(ProcessEnv),
            store: platform_store(),
        }
    }
}

pub struct Troubleshooter {
    pub workspace: Workspace,
    pub settings: TroubleshootSettings,
    pub snapshot: SystemSnapshot,
    pub home: Option<PathBuf>,
    started: DateTime<Local>,
    backends: Backends,
    log: RunLog,
}

impl Troubleshooter {
    /// Start a session logging into `workspace`
    pub fn new(workspace: Workspace, settings: TroubleshootSettings, backends: Backends) -> Result<Self> {
        let log = RunLog::open(&workspace.log_file)?;
        Ok(Self::start(workspace, log, settings, backends))
    }

    /// Session in `~/python_troubleshooter` against the live system
    pub fn open_default() -> Result<Self> {
        let workspace = Workspace::default_location()?;
        let log = RunLog::open(&workspace.log_file)?;
        // Loaded after the log is up so a bad file gets reported
        let settings = TroubleshootSettings::load(&workspace.settings_file());
        let backends = Backends::live(&settings);
        Ok(Self::start(workspace, log, settings, backends))
    }

    fn start(workspace: Workspace, log: RunLog, settings: TroubleshootSettings, backends: Backends) -> Self {
        info!("{}", "=".repeat(80));
        info!("Starting new troubleshooting session");

        let snapshot = SystemSnapshot::capture(
            backends.resources.as_ref(),
            backends.runner.as_ref(),
            &settings.python.python,
        );
        snapshot.log();

        Self {
            workspace,
            settings,
            snapshot,
            home: dirs::home_dir(),
            started: Local::now(),
            backends,
            log,
        }
    }

    /// Where script directories under the user profile are looked for
    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        self.home = home;
        self
    }

    pub fn log(&self) -> &RunLog {
        &self.log
    }

    pub fn started(&self) -> DateTime<Local> {
        self.started
    }

    /// Resources, network, then the Python environment
    pub fn run_all_checks(&self) -> DiagnosticReport {
        let settings = &self.settings;
        self.log.status("Starting system diagnostics...");

        self.log.header("System Resources Check");
        let system_checks = check_system_resources(self.backends.resources.as_ref(), settings.cpu_sample());

        self.log.header("Network Connectivity Check");
        let network_checks = check_network_connectivity(self.backends.network.as_ref(), &settings.network);

        self.log.header("Python Environment Check");
        let python_checks = check_python_environment(self.backends.runner.as_ref(), &settings.python);

        let issues_found = analyze_results(&system_checks, &network_checks, settings.disk_threshold_percent);
        info!("Issues found: {}", issues_found);

        let mut recommendations = Vec::new();
        if let Ok(disk) = &system_checks.disk {
            if disk.percent > settings.disk_threshold_percent {
                recommendations.push("Free up disk space on the system drive".to_string());
            }
        }
        recommendations.extend(network_checks.recommendations(settings.network.high_latency_secs));
        if matches!(python_checks.interpreter_supported, Ok(false)) {
            let (major, minor) = settings.python.min_version;
            recommendations.push(format!("Upgrade Python to {}.{} or newer", major, minor));
        }

        DiagnosticReport {
            timestamp: Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
            system_checks,
            network_checks,
            python_checks,
            issues_found,
            recommendations,
        }
    }

    pub fn repair_environment(&self) -> RepairSummary {
        let ctx = RepairContext {
            runner: self.backends.runner.as_ref(),
            session: self.backends.session.as_ref(),
            store: self.backends.store.as_ref(),
            settings: &self.settings,
            backup_dir: &self.workspace.backup_dir,
            started: self.started,
            home: self.home.clone(),
        };
        let summary = repair::repair_environment(&ctx, &self.log);
        info!("Repair status: {}", summary.status_line());
        summary
    }

    /// Diagnose, then repair regardless of what was found
    pub fn run(&self) -> (DiagnosticReport, RepairSummary) {
        let report = self.run_all_checks();
        let summary = self.repair_environment();
        (report, summary)
    }
}
