//! Diagnostics: resource, network and interpreter checks
//!
//! Checks the chain: [Local resources] -> [Network] -> [Python environment]

pub mod network;
pub mod python;
pub mod requirements;
pub mod resources;

use crate::error::Outcome;
use network::NetworkReport;
use python::PythonReport;
use resources::{format_gib, ResourceReport};
use tracing::warn;

/// Status of a report section
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CheckStatus::Ok => "OK",
            CheckStatus::Warning => "WARN",
            CheckStatus::Error => "ERROR",
        }
    }

    fn icon(&self) -> &'static str {
        match self {
            CheckStatus::Ok => "[OK]",
            CheckStatus::Warning => "[!!]",
            CheckStatus::Error => "[XX]",
        }
    }
}

/// Everything one diagnostic run found
#[derive(Clone, Debug)]
pub struct DiagnosticReport {
    pub timestamp: String,
    pub system_checks: ResourceReport,
    pub network_checks: NetworkReport,
    pub python_checks: PythonReport,
    pub issues_found: bool,
    pub recommendations: Vec<String>,
}

/// Disk pressure or no basic connectivity.
///
/// A disk reading that failed is not counted as pressure.
pub fn analyze_results(resources: &ResourceReport, network: &NetworkReport, disk_threshold: f64) -> bool {
    let mut issues_found = false;

    if let Ok(disk) = &resources.disk {
        if disk.percent > disk_threshold {
            warn!("High disk usage detected");
            issues_found = true;
        }
    }

    if !network.internet_connection {
        warn!("No internet connection detected");
        issues_found = true;
    }

    issues_found
}

impl DiagnosticReport {
    pub fn resources_status(&self, disk_threshold: f64) -> CheckStatus {
        let r = &self.system_checks;
        match &r.disk {
            Ok(disk) if disk.percent > disk_threshold => CheckStatus::Error,
            _ if r.cpu_usage.is_err() || r.memory.is_err() || r.disk.is_err() => CheckStatus::Warning,
            _ => CheckStatus::Ok,
        }
    }

    pub fn network_status(&self) -> CheckStatus {
        let n = &self.network_checks;
        if !n.internet_connection {
            CheckStatus::Error
        } else if !n.errors.is_empty() {
            CheckStatus::Warning
        } else {
            CheckStatus::Ok
        }
    }

    pub fn python_status(&self) -> CheckStatus {
        let p = &self.python_checks;
        if p.interpreter.is_err() {
            return CheckStatus::Error;
        }
        let degraded = p.pip_version.is_err()
            || p.site_packages.is_err()
            || p.installed_packages.is_err()
            || matches!(p.interpreter_supported, Ok(false))
            || p.requirements.iter().any(|r| !r.satisfied);
        if degraded {
            CheckStatus::Warning
        } else {
            CheckStatus::Ok
        }
    }

    /// Human-readable summary for the console
    pub fn to_text_report(&self, disk_threshold: f64) -> String {
        let mut report = String::new();

        report.push_str("=== Python Troubleshooter Report ===\n");
        report.push_str(&format!("Time: {}\n\n", self.timestamp));

        let r = &self.system_checks;
        let resources = [
            show(&r.cpu_usage, |cpu| format!("CPU: {:.1}%", cpu)),
            show(&r.memory, |mem| {
                format!("RAM: {:.1}% ({} free)", mem.percent, format_gib(mem.available_bytes))
            }),
            show(&r.disk, |disk| {
                format!("DISK: {:.1}% ({} free)", disk.percent, format_gib(disk.free_bytes))
            }),
        ];
        report.push_str(&format_section(
            "SYSTEM RESOURCES",
            self.resources_status(disk_threshold),
            &[resources.join(" :: ")],
        ));

        let n = &self.network_checks;
        let mut reach = vec![
            format!("internet: {}", tick(n.internet_connection)),
            format!("dns: {}", tick(n.dns_resolution)),
        ];
        for (name, &ok) in &n.endpoint_access {
            reach.push(format!("{}: {}", name, tick(ok)));
        }
        reach.push(format!("tls: {}", tick(n.ssl_working)));
        let latency: Vec<String> = n
            .latency
            .iter()
            .map(|(name, secs)| format!("{} {:.0}ms", name, secs * 1000.0))
            .collect();
        let mut lines = vec![reach.join(" :: ")];
        if !latency.is_empty() {
            lines.push(format!("latency: {}", latency.join(", ")));
        }
        for err in &n.errors {
            lines.push(format!("error: {}", err));
        }
        report.push_str(&format_section("NETWORK", self.network_status(), &lines));

        let p = &self.python_checks;
        let mut lines = vec![
            show(&p.interpreter, |i| format!("Python {}", first_line(&i.version))),
            show(&p.pip_version, |v| v.clone()),
            show(&p.installed_packages, |pkgs| format!("{} packages installed", pkgs.len())),
            show(&p.site_packages, |s| {
                format!(
                    "{} :: exists: {} :: writable: {} :: {}",
                    s.path.display(),
                    s.exists,
                    s.writable,
                    format_gib(s.size_bytes)
                )
            }),
        ];
        for req in p.requirements.iter().filter(|r| !r.satisfied) {
            lines.push(req.describe());
        }
        report.push_str(&format_section("PYTHON ENVIRONMENT", self.python_status(), &lines));

        report.push_str(&format!(
            "ISSUES FOUND: {}\n",
            if self.issues_found { "yes" } else { "no" }
        ));
        if !self.recommendations.is_empty() {
            report.push_str("\nRecommendations:\n");
            for rec in &self.recommendations {
                report.push_str(&format!("  - {}\n", rec));
            }
        }

        report
    }
}

fn show<T>(outcome: &Outcome<T>, f: impl Fn(&T) -> String) -> String {
    match outcome {
        Ok(value) => f(value),
        Err(e) => format!("unavailable ({})", e),
    }
}

fn tick(ok: bool) -> &'static str {
    if ok {
        "✓"
    } else {
        "✗"
    }
}

fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or_default()
}

fn format_section(name: &str, status: CheckStatus, lines: &[String]) -> String {
    let mut result = format!("{} {} ({})\n", status.icon(), name, status.label());
    for line in lines {
        result.push_str(&format!("     {}\n", line));
    }
    result.push('\n');
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CheckFailure, FailureKind};
    use resources::{DiskUsage, MemoryUsage};

    fn resources_at(disk_percent: f64) -> ResourceReport {
        ResourceReport {
            cpu_usage: Ok(10.0),
            memory: Ok(MemoryUsage {
                percent: 40.0,
                used_bytes: 4,
                available_bytes: 6,
            }),
            disk: Ok(DiskUsage {
                percent: disk_percent,
                free_bytes: 1024,
            }),
        }
    }

    fn online() -> NetworkReport {
        NetworkReport {
            internet_connection: true,
            ..Default::default()
        }
    }

    #[test]
    fn high_disk_is_an_issue_even_when_online() {
        assert!(analyze_results(&resources_at(95.0), &online(), 90.0));
    }

    #[test]
    fn healthy_disk_and_online_is_fine() {
        assert!(!analyze_results(&resources_at(50.0), &online(), 90.0));
    }

    #[test]
    fn threshold_is_exclusive() {
        assert!(!analyze_results(&resources_at(90.0), &online(), 90.0));
    }

    #[test]
    fn offline_is_an_issue() {
        assert!(analyze_results(&resources_at(50.0), &NetworkReport::default(), 90.0));
    }

    #[test]
    fn failed_disk_read_is_not_pressure() {
        let mut resources = resources_at(50.0);
        resources.disk = Err(CheckFailure::new(FailureKind::Io, "denied"));

        assert!(!analyze_results(&resources, &online(), 90.0));
    }
}
