//! Interpreter and package-manager health

use crate::command::{display_command, CommandRunner};
use crate::diagnostics::requirements::{self, RequirementStatus};
use crate::error::{CheckFailure, DoctorError, FailureKind, Outcome, Result};
use crate::settings::PythonSettings;
use serde::Deserialize;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use walkdir::WalkDir;

/// Printed by the interpreter as one JSON line
const INTROSPECT_SCRIPT: &str = "import json, site, sys; \
print(json.dumps({'version': sys.version, 'major': sys.version_info[0], \
'minor': sys.version_info[1], 'executable': sys.executable, \
'site_packages': site.getsitepackages() if hasattr(site, 'getsitepackages') else []}))";

/// What the interpreter says about itself
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Interpreter {
    pub version: String,
    pub major: u32,
    pub minor: u32,
    pub executable: PathBuf,
    #[serde(default)]
    pub site_packages: Vec<PathBuf>,
}

impl Interpreter {
    /// `Python312`, as used in per-user install directories
    pub fn dir_tag(&self) -> String {
        format!("Python{}{}", self.major, self.minor)
    }

    /// First real `site-packages` entry, else whatever came first
    pub fn primary_site_packages(&self) -> Option<PathBuf> {
        self.site_packages_dirs()
            .into_iter()
            .next()
            .or_else(|| self.site_packages.first().cloned())
    }

    /// Only the entries that really are `site-packages` directories
    pub fn site_packages_dirs(&self) -> Vec<PathBuf> {
        self.site_packages
            .iter()
            .filter(|p| p.to_string_lossy().contains("site-packages"))
            .cloned()
            .collect()
    }
}

/// Ask the interpreter for its version, executable and site-packages
pub fn introspect(runner: &dyn CommandRunner, python: &str) -> Result<Interpreter> {
    let args = ["-c", INTROSPECT_SCRIPT];
    let command = display_command(python, &["-c", "<introspect>"]);
    let output = runner.run(python, &args)?.require_success(&command)?;

    let line = output
        .stdout
        .lines()
        .rev()
        .find(|l| l.trim_start().starts_with('{'))
        .unwrap_or_default();

    serde_json::from_str(line).map_err(|e| DoctorError::Parse {
        command,
        message: e.to_string(),
    })
}

/// `pip --version` output
pub fn pip_version(runner: &dyn CommandRunner, pip: &str) -> Result<String> {
    let output = runner
        .run(pip, &["--version"])?
        .require_success(&display_command(pip, &["--version"]))?;
    Ok(output.stdout.trim().to_string())
}

#[derive(Clone, Debug, PartialEq)]
pub struct InstalledPackage {
    pub name: String,
    pub version: String,
}

/// Parse `pip list` output, skipping the column header rows
pub fn parse_package_list(stdout: &str, header_lines: usize) -> Vec<InstalledPackage> {
    stdout
        .lines()
        .skip(header_lines)
        .filter_map(|line| {
            let mut cols = line.split_whitespace();
            let name = cols.next()?;
            let version = cols.next().unwrap_or_default();
            Some(InstalledPackage {
                name: name.to_string(),
                version: version.to_string(),
            })
        })
        .collect()
}

pub fn installed_packages(
    runner: &dyn CommandRunner,
    pip: &str,
    header_lines: usize,
) -> Result<Vec<InstalledPackage>> {
    let output = runner
        .run(pip, &["list"])?
        .require_success(&display_command(pip, &["list"]))?;
    Ok(parse_package_list(&output.stdout, header_lines))
}

#[derive(Clone, Debug, PartialEq)]
pub struct SitePackages {
    pub path: PathBuf,
    pub exists: bool,
    pub writable: bool,
    pub size_bytes: u64,
}

/// Inspect a site-packages directory
pub fn check_site_packages(path: &Path) -> SitePackages {
    let exists = path.is_dir();
    SitePackages {
        path: path.to_path_buf(),
        exists,
        writable: exists && is_writable(path),
        size_bytes: if exists { directory_size(path) } else { 0 },
    }
}

/// Whether a file can be created (and removed) in `dir`
pub fn is_writable(dir: &Path) -> bool {
    let probe = dir.join(".pydoctor-write-probe");
    match OpenOptions::new().write(true).create_new(true).open(&probe) {
        Ok(file) => {
            drop(file);
            let _ = std::fs::remove_file(&probe);
            true
        }
        // A leftover probe still proves we could write here once
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            std::fs::remove_file(&probe).is_ok()
        }
        Err(_) => false,
    }
}

/// Total size of the files under `dir`; unreadable entries are skipped
pub fn directory_size(dir: &Path) -> u64 {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|meta| meta.len())
        .sum()
}

/// Interpreter/package section of the report
#[derive(Clone, Debug)]
pub struct PythonReport {
    pub interpreter: Outcome<Interpreter>,
    pub pip_version: Outcome<String>,
    pub site_packages: Outcome<SitePackages>,
    pub installed_packages: Outcome<Vec<InstalledPackage>>,
    /// Interpreter meets the minimum version
    pub interpreter_supported: Outcome<bool>,
    pub requirements: Vec<RequirementStatus>,
}

impl PythonReport {
    pub fn python_version(&self) -> Option<&str> {
        self.interpreter.as_ref().ok().map(|i| i.version.as_str())
    }
}

pub fn check_python_environment(runner: &dyn CommandRunner, cfg: &PythonSettings) -> PythonReport {
    let interpreter = introspect(runner, &cfg.python);
    match &interpreter {
        Ok(interp) => info!("Python version: {}", interp.version.replace('\n', " ")),
        Err(e) => error!("Error inspecting the Python interpreter: {}", e),
    }

    let pip_version = pip_version(runner, &cfg.pip);
    match &pip_version {
        Ok(version) => info!("pip version: {}", version),
        Err(e) => error!("Error getting pip version: {}", e),
    }

    let site_packages = match &interpreter {
        Ok(interp) => match interp.primary_site_packages() {
            Some(path) => {
                let status = check_site_packages(&path);
                info!(
                    "site-packages: {} (exists: {}, writable: {}, size: {} bytes)",
                    status.path.display(),
                    status.exists,
                    status.writable,
                    status.size_bytes
                );
                Ok(status)
            }
            None => Err(DoctorError::Unavailable {
                what: "site-packages".to_string(),
                message: "interpreter reported no site-packages directory".to_string(),
            }),
        },
        Err(e) => Err(DoctorError::Unavailable {
            what: "site-packages".to_string(),
            message: e.to_string(),
        }),
    };
    if let Err(e) = &site_packages {
        error!("Error checking site-packages: {}", e);
    }

    let installed = installed_packages(runner, &cfg.pip, cfg.list_header_lines);
    match &installed {
        Ok(packages) => info!("Installed packages: {}", packages.len()),
        Err(e) => error!("Error getting installed packages: {}", e),
    }

    let interpreter_supported = interpreter
        .as_ref()
        .map(|interp| {
            let supported = (interp.major, interp.minor) >= cfg.min_version;
            if !supported {
                warn!(
                    "Python {}.{} or higher is required, found {}.{}",
                    cfg.min_version.0, cfg.min_version.1, interp.major, interp.minor
                );
            }
            supported
        })
        .map_err(|e| CheckFailure::new(FailureKind::Unavailable, e.to_string()));

    let requirements = match &installed {
        Ok(packages) => requirements::evaluate(&cfg.requirements, packages),
        Err(_) => Vec::new(),
    };
    for status in requirements.iter().filter(|s| !s.satisfied) {
        warn!("{}", status.describe());
    }

    PythonReport {
        interpreter: interpreter.map_err(Into::into),
        pip_version: pip_version.map_err(Into::into),
        site_packages: site_packages.map_err(Into::into),
        installed_packages: installed.map_err(Into::into),
        interpreter_supported,
        requirements,
    }
}
