//! Requirements installer
//!
//! Upgrades pip, then installs every configured requirement at or above its
//! minimum version and checks what actually ended up installed. Unlike the
//! troubleshooter's repair, a package that can't be installed or verified
//! makes the whole run fail.

use crate::command::{display_command, run_logged, CommandOutput, CommandRunner};
use crate::diagnostics::python::{self, parse_package_list, InstalledPackage, Interpreter};
use crate::diagnostics::requirements;
use crate::error::{CheckFailure, DoctorError, FailureKind, Outcome, Result};
use crate::settings::{PythonSettings, Requirement};
use console::Style;

/// Installer colors
#[derive(Debug, Clone)]
pub struct InstallerTheme {
    pub header: Style,
    pub info: Style,
    pub success: Style,
    pub warning: Style,
    pub error: Style,
}

impl Default for InstallerTheme {
    fn default() -> Self {
        Self::new()
    }
}

impl InstallerTheme {
    pub fn new() -> Self {
        Self {
            header: Style::new().magenta().bold(),
            info: Style::new().blue(),
            success: Style::new().green(),
            warning: Style::new().yellow(),
            error: Style::new().red(),
        }
    }

    /// No colors, for tests and redirected output
    pub fn plain() -> Self {
        Self {
            header: Style::new(),
            info: Style::new(),
            success: Style::new(),
            warning: Style::new(),
            error: Style::new(),
        }
    }
}

/// One requirement and what installing it came to. `Ok` holds the
/// version found afterwards.
#[derive(Clone, Debug)]
pub struct PackageInstall {
    pub requirement: Requirement,
    pub outcome: Outcome<String>,
}

#[derive(Clone, Debug)]
pub struct InstallSummary {
    /// A failed pip upgrade is reported but doesn't fail the run
    pub pip_upgrade: Outcome<()>,
    pub packages: Vec<PackageInstall>,
}

impl InstallSummary {
    /// Names of the packages that failed, in install order
    pub fn failed(&self) -> Vec<&str> {
        self.packages
            .iter()
            .filter(|p| p.outcome.is_err())
            .map(|p| p.requirement.name.as_str())
            .collect()
    }

    pub fn succeeded(&self) -> bool {
        self.packages.iter().all(|p| p.outcome.is_ok())
    }

    /// Process exit status: 0 when every package is in place, else 1
    pub fn exit_status(&self) -> u8 {
        if self.succeeded() {
            0
        } else {
            1
        }
    }
}

/// Refuse interpreters older than `minimum`
pub fn check_python_version(interp: &Interpreter, minimum: (u32, u32)) -> Result<()> {
    if (interp.major, interp.minor) < minimum {
        return Err(DoctorError::UnsupportedPython {
            required: format!("{}.{}", minimum.0, minimum.1),
            found: format!("{}.{}", interp.major, interp.minor),
        });
    }
    Ok(())
}

pub struct Installer<'a> {
    runner: &'a dyn CommandRunner,
    settings: &'a PythonSettings,
    theme: InstallerTheme,
}

impl<'a> Installer<'a> {
    pub fn new(runner: &'a dyn CommandRunner, settings: &'a PythonSettings) -> Self {
        Self {
            runner,
            settings,
            theme: InstallerTheme::new(),
        }
    }

    pub fn with_theme(mut self, theme: InstallerTheme) -> Self {
        self.theme = theme;
        self
    }

    fn say(&self, style: &Style, text: &str) {
        println!("{}", style.apply_to(text));
    }

    /// `python -m pip <args>` through the logged runner
    fn pip(&self, args: &[&str]) -> Result<CommandOutput> {
        let mut full = vec!["-m", "pip"];
        full.extend_from_slice(args);
        run_logged(self.runner, &self.settings.python, &full)
    }

    fn installed_packages(&self) -> Result<Vec<InstalledPackage>> {
        let args = ["-m", "pip", "list"];
        let output = self
            .runner
            .run(&self.settings.python, &args)?
            .require_success(&display_command(&self.settings.python, &args))?;
        Ok(parse_package_list(&output.stdout, self.settings.list_header_lines))
    }

    /// Introspect the interpreter and make sure it is new enough
    pub fn check_python(&self) -> Result<Interpreter> {
        let checked = python::introspect(self.runner, &self.settings.python)
            .and_then(|interp| check_python_version(&interp, self.settings.min_version).map(|_| interp));
        if let Err(e) = &checked {
            self.say(&self.theme.error, &format!("Error: {}", e));
        }
        checked
    }

    pub fn upgrade_pip(&self) -> Outcome<()> {
        self.say(&self.theme.info, "\nUpgrading pip to latest version...");
        match self.pip(&["install", "--upgrade", "pip"]) {
            Ok(_) => {
                self.say(&self.theme.success, "Pip upgrade successful!");
                Ok(())
            }
            Err(e) => {
                self.say(&self.theme.error, &format!("Failed to upgrade pip: {}", e));
                Err(e.into())
            }
        }
    }

    /// Compare what pip reports against the requirement's minimum
    pub fn verify(&self, req: &Requirement) -> Outcome<String> {
        let installed = match self.installed_packages() {
            Ok(installed) => installed,
            Err(e) => {
                self.say(&self.theme.error, &format!("Error verifying {}: {}", req.name, e));
                return Err(e.into());
            }
        };

        let status = requirements::evaluate(std::slice::from_ref(req), &installed)
            .into_iter()
            .next()
            .ok_or_else(|| CheckFailure::new(FailureKind::Environment, format!("{} not evaluated", req.name)))?;

        match (&status.installed, status.satisfied) {
            (Some(version), true) => {
                self.say(
                    &self.theme.success,
                    &format!("✓ {} {} installed successfully", req.name, version),
                );
                Ok(version.clone())
            }
            (Some(_), false) => {
                let message = status.describe();
                self.say(&self.theme.warning, &format!("Warning: {}", message));
                Err(CheckFailure::new(FailureKind::Environment, message))
            }
            (None, _) => {
                let message = status.describe();
                self.say(&self.theme.error, &message);
                Err(CheckFailure::new(FailureKind::Environment, message))
            }
        }
    }

    /// `python -m pip install "<name>>=<minimum>" --upgrade`, then verify
    pub fn install(&self, req: &Requirement) -> Outcome<String> {
        self.say(
            &self.theme.info,
            &format!("\nInstalling {} (>={})...", req.name, req.minimum),
        );
        let spec = format!("{}>={}", req.name, req.minimum);
        if let Err(e) = self.pip(&["install", spec.as_str(), "--upgrade"]) {
            self.say(&self.theme.error, &format!("Failed to install {}: {}", req.name, e));
            return Err(e.into());
        }
        self.verify(req)
    }

    /// Check the interpreter, upgrade pip and install every requirement.
    ///
    /// Only an unusable interpreter is an `Err`; package failures are in
    /// the summary.
    pub fn run(&self) -> Result<InstallSummary> {
        self.check_python()?;

        self.say(&self.theme.header, "\n=== PyDoctor Requirements Installer ===");
        let pip_upgrade = self.upgrade_pip();

        self.say(&self.theme.info, "\nInstalling required packages...");
        let packages = self
            .settings
            .requirements
            .iter()
            .map(|req| PackageInstall {
                requirement: req.clone(),
                outcome: self.install(req),
            })
            .collect();

        let summary = InstallSummary {
            pip_upgrade,
            packages,
        };
        self.print_summary(&summary);
        Ok(summary)
    }

    fn print_summary(&self, summary: &InstallSummary) {
        self.say(&self.theme.header, "\n=== Installation Summary ===");
        let failed = summary.failed();
        if failed.is_empty() {
            self.say(&self.theme.success, "\nAll requirements installed successfully!");
            self.say(
                &self.theme.info,
                "\nYou can now run the troubleshooter with: pydoctor",
            );
        } else {
            self.say(
                &self.theme.error,
                &format!(
                    "\nFailed to install the following packages: {}",
                    failed.join(", ")
                ),
            );
            self.say(
                &self.theme.warning,
                "Please try installing these packages manually or check your internet connection.",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    /// Plays pip against an in-memory package table
    struct ScriptedPip {
        minor: u32,
        calls: RefCell<Vec<String>>,
        packages: RefCell<BTreeMap<String, String>>,
        /// Installs of these names exit non-zero
        broken: Vec<&'static str>,
        /// Installs of these names leave this version behind
        stale: Vec<(&'static str, &'static str)>,
    }

    impl ScriptedPip {
        fn new(minor: u32) -> Self {
            Self {
                minor,
                calls: RefCell::default(),
                packages: RefCell::default(),
                broken: Vec::new(),
                stale: Vec::new(),
            }
        }

        fn exit(code: i32, stdout: String) -> CommandOutput {
            CommandOutput {
                exit_code: Some(code),
                stdout,
                stderr: if code == 0 { String::new() } else { "ERROR: no matching distribution".to_string() },
                ..Default::default()
            }
        }
    }

    impl CommandRunner for ScriptedPip {
        fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
            if args.first() == Some(&"-c") {
                self.calls.borrow_mut().push(format!("{} -c <introspect>", program));
                let json = serde_json::json!({
                    "version": format!("3.{}.0", self.minor),
                    "major": 3,
                    "minor": self.minor,
                    "executable": "/usr/bin/python3",
                    "site_packages": [],
                });
                return Ok(Self::exit(0, json.to_string()));
            }

            self.calls.borrow_mut().push(display_command(program, args));
            match args {
                ["-m", "pip", "list"] => {
                    let mut out = String::from("Package Version\n------- -------\n");
                    for (name, version) in self.packages.borrow().iter() {
                        out.push_str(&format!("{} {}\n", name, version));
                    }
                    Ok(Self::exit(0, out))
                }
                ["-m", "pip", "install", "--upgrade", "pip"] => {
                    let code = if self.broken.iter().any(|b| *b == "pip") { 1 } else { 0 };
                    Ok(Self::exit(code, String::new()))
                }
                ["-m", "pip", "install", spec, "--upgrade"] => {
                    let (name, minimum) = spec.split_once(">=").unwrap_or((*spec, "0"));
                    if self.broken.iter().any(|b| *b == name) {
                        return Ok(Self::exit(1, String::new()));
                    }
                    let version = self
                        .stale
                        .iter()
                        .find(|(stale, _)| *stale == name)
                        .map(|(_, v)| v.to_string())
                        .unwrap_or_else(|| minimum.to_string());
                    self.packages.borrow_mut().insert(name.to_string(), version);
                    Ok(Self::exit(0, format!("Successfully installed {}\n", name)))
                }
                _ => Ok(Self::exit(0, String::new())),
            }
        }
    }

    fn settings(requirements: Vec<Requirement>) -> PythonSettings {
        PythonSettings {
            python: "python".to_string(),
            requirements,
            ..Default::default()
        }
    }

    fn installer<'a>(runner: &'a ScriptedPip, settings: &'a PythonSettings) -> Installer<'a> {
        Installer::new(runner, settings).with_theme(InstallerTheme::plain())
    }

    #[test]
    fn installs_each_requirement_with_its_minimum() {
        let runner = ScriptedPip::new(12);
        let settings = settings(vec![
            Requirement::new("psutil", "5.8.0"),
            Requirement::new("PyQt6", "6.0.0"),
        ]);

        let summary = installer(&runner, &settings).run().unwrap();

        let calls = runner.calls.borrow();
        let installs: Vec<&str> = calls
            .iter()
            .map(String::as_str)
            .filter(|c| c.contains(" install "))
            .collect();
        assert_eq!(
            installs,
            vec![
                "python -m pip install --upgrade pip",
                "python -m pip install psutil>=5.8.0 --upgrade",
                "python -m pip install PyQt6>=6.0.0 --upgrade",
            ]
        );
        assert!(summary.pip_upgrade.is_ok());
        assert!(summary.failed().is_empty());
        assert_eq!(summary.exit_status(), 0);
        assert_eq!(summary.packages[1].outcome.as_deref(), Ok("6.0.0"));
    }

    #[test]
    fn failed_and_stale_installs_are_listed() {
        let mut runner = ScriptedPip::new(12);
        runner.broken.push("PyQt6");
        runner.stale.push(("wheel", "0.30.0"));
        let settings = settings(vec![
            Requirement::new("psutil", "5.8.0"),
            Requirement::new("PyQt6", "6.0.0"),
            Requirement::new("wheel", "0.37.0"),
        ]);

        let summary = installer(&runner, &settings).run().unwrap();

        assert_eq!(summary.failed(), vec!["PyQt6", "wheel"]);
        assert_eq!(summary.exit_status(), 1);
        assert_eq!(
            summary.packages[1].outcome.as_ref().unwrap_err().kind,
            FailureKind::Command
        );
        assert!(summary.packages[2]
            .outcome
            .as_ref()
            .unwrap_err()
            .message
            .contains("older than required"));
    }

    #[test]
    fn old_interpreter_stops_before_any_install() {
        let runner = ScriptedPip::new(6);
        let settings = settings(vec![Requirement::new("psutil", "5.8.0")]);

        let err = installer(&runner, &settings).run().unwrap_err();

        assert!(matches!(err, DoctorError::UnsupportedPython { .. }));
        assert_eq!(
            err.to_string(),
            "Python 3.7 or higher is required. You are using Python 3.6"
        );
        assert_eq!(runner.calls.borrow().len(), 1);
    }

    #[test]
    fn pip_upgrade_failure_does_not_stop_installs() {
        let mut runner = ScriptedPip::new(12);
        runner.broken.push("pip");
        let settings = settings(vec![Requirement::new("psutil", "5.8.0")]);

        let summary = installer(&runner, &settings).run().unwrap();

        assert_eq!(
            summary.pip_upgrade.as_ref().unwrap_err().kind,
            FailureKind::Command
        );
        assert_eq!(summary.packages.len(), 1);
        assert_eq!(summary.exit_status(), 0);
    }
}
