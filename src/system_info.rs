//! Snapshot of the host taken once at startup

use crate::command::CommandRunner;
use crate::diagnostics::python;
use crate::diagnostics::resources::{format_gib, MemoryUsage, ResourceProbe};
use tracing::{info, warn};

#[derive(Clone, Debug)]
pub struct SystemSnapshot {
    pub python_version: Option<String>,
    pub platform: String,
    pub architecture: String,
    pub processor: String,
    pub memory: Option<MemoryUsage>,
}

impl SystemSnapshot {
    pub fn capture(probe: &dyn ResourceProbe, runner: &dyn CommandRunner, python: &str) -> Self {
        let host = probe.host_details();

        let python_version = match python::introspect(runner, python) {
            Ok(interp) => Some(interp.version),
            Err(e) => {
                warn!("Could not get Python version: {}", e);
                None
            }
        };

        let memory = match probe.memory() {
            Ok(mem) => Some(mem),
            Err(e) => {
                warn!("Could not get memory info: {}", e);
                None
            }
        };

        Self {
            python_version,
            platform: host.platform,
            architecture: host.architecture,
            processor: host.processor,
            memory,
        }
    }

    /// `key: value` lines, in a fixed order
    pub fn lines(&self) -> Vec<(&'static str, String)> {
        vec![
            (
                "python_version",
                self.python_version
                    .as_deref()
                    .and_then(|v| v.lines().next())
                    .unwrap_or("Unknown")
                    .to_string(),
            ),
            ("platform", self.platform.clone()),
            ("architecture", self.architecture.clone()),
            ("processor", self.processor.clone()),
            (
                "memory",
                self.memory
                    .map(|m| {
                        format!(
                            "{:.1}% used, {} available",
                            m.percent,
                            format_gib(m.available_bytes)
                        )
                    })
                    .unwrap_or_else(|| "Unknown".to_string()),
            ),
        ]
    }

    pub fn log(&self) {
        for (key, value) in self.lines() {
            info!("System {}: {}", key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_fields_render_as_unknown() {
        let snapshot = SystemSnapshot {
            python_version: None,
            platform: "Windows 11".to_string(),
            architecture: "x86_64".to_string(),
            processor: String::new(),
            memory: None,
        };

        let lines = snapshot.lines();
        assert_eq!(lines[0], ("python_version", "Unknown".to_string()));
        assert_eq!(lines[1].1, "Windows 11");
        assert_eq!(lines[4], ("memory", "Unknown".to_string()));
    }

    #[test]
    fn python_version_keeps_first_line() {
        let snapshot = SystemSnapshot {
            python_version: Some("3.12.1 (main)\n[MSC v.1937 64 bit]".to_string()),
            platform: String::new(),
            architecture: String::new(),
            processor: String::new(),
            memory: None,
        };

        assert_eq!(snapshot.lines()[0].1, "3.12.1 (main)");
    }
}
