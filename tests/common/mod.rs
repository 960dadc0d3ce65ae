//! Fake backends for driving a whole run without touching the host.

#![allow(dead_code)]

use pydoctor::command::{CommandOutput, CommandRunner};
use pydoctor::diagnostics::network::{HttpResponse, NetworkProbe};
use pydoctor::diagnostics::resources::{
    disk_usage, memory_usage, DiskUsage, HostDetails, MemoryUsage, ResourceProbe,
};
use pydoctor::error::{CheckFailure, DoctorError, FailureKind, Outcome, Result};
use pydoctor::repair::env_store::{MemoryEnv, PersistentEnv};
use pydoctor::settings::TroubleshootSettings;
use pydoctor::workspace::Workspace;
use pydoctor::{Backends, Troubleshooter};
use std::cell::RefCell;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;
use tempfile::TempDir;

pub const PIP_LIST: &str = "\
Package    Version
---------- -------
pip        24.0
PyQt6      6.6.1
requests   2.31.0
setuptools 69.0.3
wheel      0.42.0
";

pub type Calls = Rc<RefCell<Vec<String>>>;

/// Answers interpreter and pip commands from canned output
pub struct FakeRunner {
    pub calls: Calls,
    pub python_dir: PathBuf,
    pub site_packages: PathBuf,
    /// Every `python`/`pip` spawn fails
    pub broken: bool,
    /// Seen by each mutating command: was a backup already on disk?
    pub backup_dir: PathBuf,
    pub backup_seen: Rc<RefCell<Vec<bool>>>,
}

fn ok(stdout: &str) -> CommandOutput {
    CommandOutput {
        exit_code: Some(0),
        stdout: stdout.to_string(),
        ..Default::default()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        let line = if args.first() == Some(&"-c") {
            format!("{} -c {}", program, script_name(args.get(1).copied().unwrap_or_default()))
        } else {
            std::iter::once(program).chain(args.iter().copied()).collect::<Vec<_>>().join(" ")
        };
        self.calls.borrow_mut().push(line);

        if self.broken {
            return Err(DoctorError::Spawn {
                command: program.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            });
        }

        if args.contains(&"install") || args.contains(&"uninstall") {
            let has_backup = std::fs::read_dir(&self.backup_dir)
                .map(|mut entries| entries.next().is_some())
                .unwrap_or(false);
            self.backup_seen.borrow_mut().push(has_backup);
        }

        match args {
            ["-c", script] if script.contains("json.dumps") => Ok(ok(&format!(
                "{}\n",
                serde_json::json!({
                    "version": "3.12.1 (main, Dec  7 2023) [MSC v.1937 64 bit (AMD64)]",
                    "major": 3,
                    "minor": 12,
                    "executable": self.python_dir.join("python.exe"),
                    "site_packages": [self.python_dir.clone(), self.site_packages.clone()],
                })
            ))),
            ["-c", _] => Ok(ok("6.6.1\n")),
            ["--version"] => Ok(ok("pip 24.0 from /py/site-packages/pip (python 3.12)\n")),
            ["list"] => Ok(ok(PIP_LIST)),
            ["freeze"] => Ok(ok("PyQt6==6.6.1\nwheel==0.42.0\n")),
            _ => Ok(ok("")),
        }
    }
}

fn script_name(script: &str) -> &'static str {
    if script.contains("json.dumps") {
        "<introspect>"
    } else {
        "<probe>"
    }
}

pub struct FakeResources {
    pub disk_percent: Option<f64>,
}

impl ResourceProbe for FakeResources {
    fn cpu_percent(&self, _: Duration) -> Outcome<f64> {
        Ok(12.5)
    }

    fn memory(&self) -> Outcome<MemoryUsage> {
        memory_usage(16 << 30, 8 << 30)
    }

    fn disk(&self) -> Outcome<DiskUsage> {
        match self.disk_percent {
            Some(percent) => disk_usage(1000, (1000.0 - percent * 10.0) as u64),
            None => Err(CheckFailure::new(FailureKind::Io, "volume not readable")),
        }
    }

    fn host_details(&self) -> HostDetails {
        HostDetails {
            platform: "Windows-10-10.0.19045-SP0".to_string(),
            architecture: "x86_64".to_string(),
            processor: "Test CPU".to_string(),
        }
    }
}

pub struct FakeNetwork {
    pub online: bool,
}

impl FakeNetwork {
    fn check(&self, what: &str) -> Result<()> {
        if self.online {
            Ok(())
        } else {
            Err(DoctorError::Connect {
                addr: what.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NetworkUnreachable, "unreachable"),
            })
        }
    }
}

impl NetworkProbe for FakeNetwork {
    fn connect(&self, host: &str, _: u16, _: Duration) -> Result<()> {
        self.check(host)
    }

    fn resolve(&self, host: &str) -> Result<IpAddr> {
        if self.online {
            Ok(IpAddr::from([151, 101, 0, 223]))
        } else {
            Err(DoctorError::Resolve {
                host: host.to_string(),
                message: "no such host".to_string(),
            })
        }
    }

    fn http_get(&self, url: &str, _: Duration) -> Result<HttpResponse> {
        self.check(url).map(|_| HttpResponse {
            status: 200,
            elapsed: Duration::from_millis(120),
        })
    }

    fn tls_handshake(&self, host: &str, _: u16, _: Duration) -> Result<()> {
        self.check(host)
    }
}

#[derive(Clone, Default)]
pub struct RecordingStore {
    pub writes: Rc<RefCell<Vec<(String, String)>>>,
}

impl PersistentEnv for RecordingStore {
    fn persist(&self, name: &str, value: &str) -> Result<()> {
        self.writes
            .borrow_mut()
            .push((name.to_string(), value.to_string()));
        Ok(())
    }
}

/// Knobs of a fake host
pub struct Scenario {
    pub disk_percent: Option<f64>,
    pub online: bool,
    pub python_broken: bool,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            disk_percent: Some(50.0),
            online: true,
            python_broken: false,
        }
    }
}

/// A scratch workspace plus the handles tests inspect after a run
pub struct Harness {
    pub temp: TempDir,
    pub workspace: Workspace,
    pub python_dir: PathBuf,
    pub site_packages: PathBuf,
    pub calls: Calls,
    pub backup_seen: Rc<RefCell<Vec<bool>>>,
    pub store: RecordingStore,
}

impl Harness {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let workspace = Workspace::create(&temp.path().join("python_troubleshooter")).unwrap();

        let python_dir = temp.path().join("Python312");
        let site_packages = python_dir.join("Lib").join("site-packages");
        std::fs::create_dir_all(python_dir.join("Scripts")).unwrap();
        std::fs::create_dir_all(&site_packages).unwrap();
        std::fs::write(site_packages.join("six.py"), "# six\n").unwrap();

        Self {
            temp,
            workspace,
            python_dir,
            site_packages,
            calls: Rc::default(),
            backup_seen: Rc::default(),
            store: RecordingStore::default(),
        }
    }

    pub fn settings() -> TroubleshootSettings {
        let mut settings = TroubleshootSettings::default();
        settings.cpu_sample_ms = 0;
        settings.python.python = "python".to_string();
        settings.python.pip = "pip".to_string();
        settings
    }

    pub fn home(&self) -> &Path {
        self.temp.path()
    }

    pub fn troubleshooter(&self, scenario: Scenario) -> Troubleshooter {
        let backends = Backends {
            runner: Box::new(FakeRunner {
                calls: self.calls.clone(),
                python_dir: self.python_dir.clone(),
                site_packages: self.site_packages.clone(),
                broken: scenario.python_broken,
                backup_dir: self.workspace.backup_dir.clone(),
                backup_seen: self.backup_seen.clone(),
            }),
            resources: Box::new(FakeResources {
                disk_percent: scenario.disk_percent,
            }),
            network: Box::new(FakeNetwork {
                online: scenario.online,
            }),
            session: Box::new(MemoryEnv::new([("PATH", "/usr/bin")])),
            store: Box::new(self.store.clone()),
        };

        Troubleshooter::new(self.workspace.clone(), Self::settings(), backends)
            .unwrap()
            .with_home(Some(self.home().to_path_buf()))
    }

    pub fn log_contents(&self) -> String {
        std::fs::read_to_string(&self.workspace.log_file).unwrap()
    }
}
