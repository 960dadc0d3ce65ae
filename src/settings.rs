//! Troubleshooter settings with serialization support

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Name of the optional settings file inside the working directory
pub const SETTINGS_FILE: &str = "settings.json";

/// An HTTPS endpoint probed by the network check
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HttpTarget {
    pub name: String,
    pub url: String,
}

impl HttpTarget {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
        }
    }
}

/// A package that must be installed at or above `minimum`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub name: String,
    pub minimum: String,
}

impl Requirement {
    pub fn new(name: &str, minimum: &str) -> Self {
        Self {
            name: name.to_string(),
            minimum: minimum.to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    // Raw reachability probe
    pub reachability_host: String,
    pub reachability_port: u16,
    pub socket_timeout_secs: u64,

    pub dns_host: String,

    // HTTPS probes
    pub http_targets: Vec<HttpTarget>,
    pub speed_test: HttpTarget,
    pub http_timeout_secs: u64,

    pub tls_host: String,
    pub tls_port: u16,
    pub tls_timeout_secs: u64,

    /// Latency above this (seconds) earns a recommendation
    pub high_latency_secs: f64,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            reachability_host: "8.8.8.8".to_string(),
            reachability_port: 53,
            socket_timeout_secs: 3,
            dns_host: "python.org".to_string(),
            http_targets: vec![
                HttpTarget::new("pypi", "https://pypi.org"),
                HttpTarget::new("github", "https://github.com"),
            ],
            speed_test: HttpTarget::new("google", "https://www.google.com"),
            http_timeout_secs: 5,
            tls_host: "python.org".to_string(),
            tls_port: 443,
            tls_timeout_secs: 5,
            high_latency_secs: 2.0,
        }
    }
}

impl NetworkSettings {
    pub fn socket_timeout(&self) -> Duration {
        Duration::from_secs(self.socket_timeout_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn tls_timeout(&self) -> Duration {
        Duration::from_secs(self.tls_timeout_secs)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PythonSettings {
    /// Interpreter command
    pub python: String,
    /// Package manager command
    pub pip: String,
    /// Header rows printed by `pip list` before the first package
    pub list_header_lines: usize,
    pub min_version: (u32, u32),
    /// Distributions `pip list` can report. Standard-library modules such as
    /// `typing` and `pathlib` never show up there and are left out.
    pub requirements: Vec<Requirement>,
}

impl Default for PythonSettings {
    fn default() -> Self {
        let (python, pip) = if cfg!(target_os = "windows") {
            ("python", "pip")
        } else {
            ("python3", "pip3")
        };

        Self {
            python: python.to_string(),
            pip: pip.to_string(),
            list_header_lines: 2,
            min_version: (3, 7),
            requirements: vec![
                Requirement::new("psutil", "5.8.0"),
                Requirement::new("requests", "2.25.0"),
                Requirement::new("PyQt6", "6.0.0"),
                Requirement::new("setuptools", "45.0.0"),
                Requirement::new("wheel", "0.37.0"),
                Requirement::new("pip", "21.0.0"),
            ],
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairSettings {
    /// Upgraded right after the package manager itself
    pub auxiliary_packages: Vec<String>,
    /// Umbrella package of the GUI toolkit
    pub toolkit_package: String,
    /// Everything removed before the umbrella package is reinstalled
    pub toolkit_uninstall: Vec<String>,
    /// Python statement printing the toolkit version once imported
    pub toolkit_version_probe: String,
    /// Executables shipped with the toolkit
    pub companion_executables: Vec<String>,
}

impl Default for RepairSettings {
    fn default() -> Self {
        Self {
            auxiliary_packages: vec!["setuptools".to_string(), "wheel".to_string()],
            toolkit_package: "PyQt6".to_string(),
            toolkit_uninstall: vec![
                "PyQt6".to_string(),
                "PyQt6-Qt6".to_string(),
                "PyQt6-sip".to_string(),
            ],
            toolkit_version_probe: "from PyQt6.QtCore import PYQT_VERSION_STR; print(PYQT_VERSION_STR)"
                .to_string(),
            companion_executables: vec!["pylupdate6".to_string(), "pyuic6".to_string()],
        }
    }
}

/// All knobs of a troubleshooting run
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TroubleshootSettings {
    pub cpu_sample_ms: u64,
    /// Disk utilization (percent) above which issues are reported
    pub disk_threshold_percent: f64,
    pub command_timeout_secs: u64,
    pub network: NetworkSettings,
    pub python: PythonSettings,
    pub repair: RepairSettings,
}

impl Default for TroubleshootSettings {
    fn default() -> Self {
        Self {
            cpu_sample_ms: 1000,
            disk_threshold_percent: 90.0,
            command_timeout_secs: 60,
            network: NetworkSettings::default(),
            python: PythonSettings::default(),
            repair: RepairSettings::default(),
        }
    }
}

impl TroubleshootSettings {
    /// Load settings from `path`, falling back to defaults when the file is
    /// missing or unreadable
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Could not read {}: {}; using defaults", path.display(), e);
                return Self::default();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring invalid settings in {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn cpu_sample(&self) -> Duration {
        Duration::from_millis(self.cpu_sample_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_targets() {
        let settings = TroubleshootSettings::default();

        assert_eq!(settings.disk_threshold_percent, 90.0);
        assert_eq!(settings.command_timeout(), Duration::from_secs(60));
        assert_eq!(settings.network.reachability_host, "8.8.8.8");
        assert_eq!(settings.network.reachability_port, 53);
        assert_eq!(settings.network.socket_timeout(), Duration::from_secs(3));
        assert_eq!(settings.network.http_targets.len(), 2);
        assert_eq!(settings.python.list_header_lines, 2);
        assert_eq!(settings.repair.toolkit_uninstall.len(), 3);
    }

    #[test]
    fn default_requirements_are_installable_distributions() {
        let names: Vec<String> = PythonSettings::default()
            .requirements
            .into_iter()
            .map(|r| r.name)
            .collect();

        assert_eq!(
            names,
            vec!["psutil", "requests", "PyQt6", "setuptools", "wheel", "pip"]
        );
        assert!(!names.iter().any(|n| n == "typing" || n == "pathlib"));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let temp = tempfile::TempDir::new().unwrap();
        let settings = TroubleshootSettings::load(&temp.path().join(SETTINGS_FILE));

        assert_eq!(settings.cpu_sample_ms, 1000);
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join(SETTINGS_FILE);
        std::fs::write(
            &path,
            r#"{ "disk_threshold_percent": 80.0, "network": { "dns_host": "example.org" } }"#,
        )
        .unwrap();

        let settings = TroubleshootSettings::load(&path);

        assert_eq!(settings.disk_threshold_percent, 80.0);
        assert_eq!(settings.network.dns_host, "example.org");
        assert_eq!(settings.network.reachability_port, 53);
        assert_eq!(settings.repair.toolkit_package, "PyQt6");
    }

    #[test]
    fn invalid_file_gives_defaults() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join(SETTINGS_FILE);
        std::fs::write(&path, "not json").unwrap();

        let settings = TroubleshootSettings::load(&path);

        assert_eq!(settings.disk_threshold_percent, 90.0);
    }
}
