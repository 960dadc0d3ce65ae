//! CPU, memory and disk readings

use crate::error::{CheckFailure, FailureKind, Outcome};
use std::path::{Path, PathBuf};
use std::time::Duration;
use sysinfo::{Disks, System};
use tracing::{error, info};

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MemoryUsage {
    pub percent: f64,
    pub used_bytes: u64,
    pub available_bytes: u64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiskUsage {
    pub percent: f64,
    pub free_bytes: u64,
}

/// Static facts about the host
#[derive(Clone, Debug, Default)]
pub struct HostDetails {
    pub platform: String,
    pub architecture: String,
    pub processor: String,
}

/// Source of resource readings
pub trait ResourceProbe {
    /// Global CPU utilization sampled over `interval`
    fn cpu_percent(&self, interval: Duration) -> Outcome<f64>;
    fn memory(&self) -> Outcome<MemoryUsage>;
    /// Utilization of the root volume
    fn disk(&self) -> Outcome<DiskUsage>;
    fn host_details(&self) -> HostDetails;
}

/// Readings from the live system via sysinfo
pub struct SysinfoProbe;

impl ResourceProbe for SysinfoProbe {
    fn cpu_percent(&self, interval: Duration) -> Outcome<f64> {
        let mut sys = System::new();
        sys.refresh_cpu_usage();

        // Need to wait a bit and refresh again for an actual reading
        std::thread::sleep(interval.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL));
        sys.refresh_cpu_usage();

        if sys.cpus().is_empty() {
            return Err(CheckFailure::new(FailureKind::Unavailable, "no CPUs reported"));
        }
        Ok(sys.global_cpu_usage() as f64)
    }

    fn memory(&self) -> Outcome<MemoryUsage> {
        let mut sys = System::new();
        sys.refresh_memory();
        memory_usage(sys.total_memory(), sys.available_memory())
    }

    fn disk(&self) -> Outcome<DiskUsage> {
        let root = root_volume();
        let disks = Disks::new_with_refreshed_list();
        let mounts: Vec<(PathBuf, u64, u64)> = disks
            .list()
            .iter()
            .map(|d| (d.mount_point().to_path_buf(), d.total_space(), d.available_space()))
            .collect();

        let (_, total, available) = pick_volume(&root, &mounts).ok_or_else(|| {
            CheckFailure::new(
                FailureKind::Unavailable,
                format!("no disk mounted at {}", root.display()),
            )
        })?;
        disk_usage(*total, *available)
    }

    fn host_details(&self) -> HostDetails {
        let mut sys = System::new();
        sys.refresh_cpu_all();

        HostDetails {
            platform: System::long_os_version().unwrap_or_else(|| std::env::consts::OS.to_string()),
            architecture: System::cpu_arch().unwrap_or_else(|| std::env::consts::ARCH.to_string()),
            processor: sys
                .cpus()
                .first()
                .map(|c| c.brand().trim().to_string())
                .unwrap_or_default(),
        }
    }
}

/// Root of the volume holding the current directory (`/` or `C:\`)
fn root_volume() -> PathBuf {
    std::env::current_dir()
        .ok()
        .and_then(|dir| dir.ancestors().last().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("/"))
}

/// The mount whose mount point is the longest prefix of `root`
fn pick_volume<'a>(root: &Path, mounts: &'a [(PathBuf, u64, u64)]) -> Option<&'a (PathBuf, u64, u64)> {
    mounts
        .iter()
        .filter(|(mount, _, _)| root.starts_with(mount))
        .max_by_key(|(mount, _, _)| mount.as_os_str().len())
}

pub fn memory_usage(total: u64, available: u64) -> Outcome<MemoryUsage> {
    if total == 0 {
        return Err(CheckFailure::new(FailureKind::Unavailable, "total memory reported as 0"));
    }
    let used = total.saturating_sub(available);
    Ok(MemoryUsage {
        percent: used as f64 / total as f64 * 100.0,
        used_bytes: used,
        available_bytes: available,
    })
}

pub fn disk_usage(total: u64, available: u64) -> Outcome<DiskUsage> {
    if total == 0 {
        return Err(CheckFailure::new(FailureKind::Unavailable, "disk size reported as 0"));
    }
    Ok(DiskUsage {
        percent: total.saturating_sub(available) as f64 / total as f64 * 100.0,
        free_bytes: available,
    })
}

/// `12.34 GB`
pub fn format_gib(bytes: u64) -> String {
    format!("{:.2} GB", bytes as f64 / GIB)
}

/// Resource section of the report
#[derive(Clone, Debug)]
pub struct ResourceReport {
    pub cpu_usage: Outcome<f64>,
    pub memory: Outcome<MemoryUsage>,
    pub disk: Outcome<DiskUsage>,
}

/// Read CPU, memory and disk; a failed read only affects its own field
pub fn check_system_resources(probe: &dyn ResourceProbe, cpu_sample: Duration) -> ResourceReport {
    let cpu_usage = probe.cpu_percent(cpu_sample);
    match &cpu_usage {
        Ok(cpu) => info!("CPU Usage: {:.1}", cpu),
        Err(e) => error!("Error reading CPU usage: {}", e),
    }

    let memory = probe.memory();
    match &memory {
        Ok(mem) => {
            info!("Memory Usage: {:.1}", mem.percent);
            info!("Available Memory: {}", format_gib(mem.available_bytes));
        }
        Err(e) => error!("Error reading memory usage: {}", e),
    }

    let disk = probe.disk();
    match &disk {
        Ok(disk) => {
            info!("Disk Usage: {:.1}", disk.percent);
            info!("Free Disk Space: {}", format_gib(disk.free_bytes));
        }
        Err(e) => error!("Error reading disk usage: {}", e),
    }

    ResourceReport {
        cpu_usage,
        memory,
        disk,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_percent_uses_available() {
        let mem = memory_usage(8 * 1024, 2 * 1024).unwrap();

        assert_eq!(mem.percent, 75.0);
        assert_eq!(mem.used_bytes, 6 * 1024);
        assert_eq!(mem.available_bytes, 2 * 1024);
    }

    #[test]
    fn zero_totals_are_failures() {
        assert!(memory_usage(0, 0).is_err());
        assert!(disk_usage(0, 0).is_err());
    }

    #[test]
    fn disk_percent() {
        let disk = disk_usage(200, 10).unwrap();

        assert_eq!(disk.percent, 95.0);
        assert_eq!(disk.free_bytes, 10);
    }

    #[test]
    fn gib_formatting() {
        assert_eq!(format_gib(3 * 1024 * 1024 * 1024 / 2), "1.50 GB");
    }

    #[test]
    fn longest_matching_mount_wins() {
        let mounts = vec![
            (PathBuf::from("/"), 100, 50),
            (PathBuf::from("/boot"), 10, 5),
        ];

        let picked = pick_volume(Path::new("/"), &mounts).unwrap();
        assert_eq!(picked.0, PathBuf::from("/"));
        assert!(pick_volume(Path::new("/nowhere"), &mounts[1..]).is_none());
    }

    struct Broken;

    impl ResourceProbe for Broken {
        fn cpu_percent(&self, _: Duration) -> Outcome<f64> {
            Err(CheckFailure::new(FailureKind::Unavailable, "cpu offline"))
        }
        fn memory(&self) -> Outcome<MemoryUsage> {
            memory_usage(100, 40)
        }
        fn disk(&self) -> Outcome<DiskUsage> {
            Err(CheckFailure::new(FailureKind::Io, "permission denied"))
        }
        fn host_details(&self) -> HostDetails {
            HostDetails::default()
        }
    }

    #[test]
    fn one_failed_read_keeps_the_others() {
        let report = check_system_resources(&Broken, Duration::ZERO);

        assert!(report.cpu_usage.is_err());
        assert_eq!(report.memory.unwrap().percent, 60.0);
        assert_eq!(report.disk.unwrap_err().kind, FailureKind::Io);
    }
}
