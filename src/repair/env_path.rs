//! `PATH` and `PYTHONPATH` repair.

use crate::diagnostics::python::Interpreter;
use crate::error::{DoctorError, Result};
use crate::repair::env_store::{PersistentEnv, SessionEnv};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Script directories an interpreter may install console scripts into
pub fn candidate_script_dirs(interp: &Interpreter, home: Option<&Path>) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(parent) = interp.executable.parent() {
        dirs.push(parent.join("Scripts"));
    }

    if let Some(home) = home {
        let tag = interp.dir_tag();
        let local = home.join("AppData").join("Local");
        let roaming = home.join("AppData").join("Roaming");
        dirs.push(local.join("Programs").join(&tag).join("Scripts"));
        dirs.push(roaming.join(&tag).join("Scripts"));
        dirs.push(roaming.join("Python").join(&tag).join("Scripts"));
    }

    dirs
}

/// Entries compare without trailing separators, and case-insensitively on
/// Windows
fn same_entry(a: &Path, b: &Path) -> bool {
    let norm = |p: &Path| {
        let s = p.to_string_lossy();
        let s = s.trim_end_matches(['/', '\\']).to_string();
        if cfg!(target_os = "windows") {
            s.to_lowercase()
        } else {
            s
        }
    };
    norm(a) == norm(b)
}

#[derive(Clone, Debug, PartialEq)]
pub struct PathExtension {
    pub value: String,
    pub added: Vec<PathBuf>,
}

#[cfg(windows)]
const SEPARATOR: char = ';';
#[cfg(not(windows))]
const SEPARATOR: char = ':';

/// Append each existing candidate that isn't already on `current`.
///
/// `current` is kept as is, empty entries included, and the new
/// directories go after it. Applying the result again with the same
/// candidates adds nothing.
pub fn extend_search_path(
    current: &str,
    candidates: &[PathBuf],
    exists: impl Fn(&Path) -> bool,
) -> Result<PathExtension> {
    let entries: Vec<PathBuf> = std::env::split_paths(current)
        .filter(|p| !p.as_os_str().is_empty())
        .collect();
    let mut added: Vec<PathBuf> = Vec::new();

    for candidate in candidates {
        let present = entries.iter().chain(&added).any(|e| same_entry(e, candidate));
        if exists(candidate) && !present {
            added.push(candidate.clone());
        }
    }

    if added.is_empty() {
        return Ok(PathExtension {
            value: current.to_string(),
            added,
        });
    }

    let tail = std::env::join_paths(&added).map_err(|e| DoctorError::Unavailable {
        what: "PATH".to_string(),
        message: e.to_string(),
    })?;
    let tail = tail.to_string_lossy();

    let value = if current.is_empty() {
        tail.into_owned()
    } else {
        format!("{}{}{}", current, SEPARATOR, tail)
    };

    Ok(PathExtension { value, added })
}

/// Locate `name` on a search path; `.exe` is implied on Windows
pub fn find_executable(name: &str, search_path: &OsStr) -> Option<PathBuf> {
    let file_name = if cfg!(target_os = "windows") && !name.to_lowercase().ends_with(".exe") {
        format!("{}.exe", name)
    } else {
        name.to_string()
    };

    std::env::split_paths(search_path)
        .map(|dir| dir.join(&file_name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Extend `PATH` with the interpreter's script directories and default
/// `PYTHONPATH` to its site-packages, persisting whatever changed.
pub fn setup_environment_variables(
    interp: &Interpreter,
    home: Option<&Path>,
    session: &dyn SessionEnv,
    store: &dyn PersistentEnv,
    companions: &[String],
) -> Result<()> {
    let current = session.get("PATH").unwrap_or_default();
    let candidates = candidate_script_dirs(interp, home);
    let extension = extend_search_path(&current, &candidates, Path::is_dir)?;

    if !extension.added.is_empty() {
        for dir in &extension.added {
            info!("Added to PATH: {}", dir.display());
        }
        session.set("PATH", &extension.value);
        match store.persist("PATH", &extension.value) {
            Ok(()) => info!("Updated user PATH permanently"),
            Err(e) => error!("Could not update user PATH permanently: {}", e),
        }
    }

    if session.get("PYTHONPATH").is_none() {
        let site_dirs = interp.site_packages_dirs();
        if site_dirs.is_empty() {
            warn!("No site-packages directory to put on PYTHONPATH");
        } else {
            let python_path = std::env::join_paths(&site_dirs)
                .map_err(|e| DoctorError::Unavailable {
                    what: "PYTHONPATH".to_string(),
                    message: e.to_string(),
                })?
                .to_string_lossy()
                .into_owned();

            session.set("PYTHONPATH", &python_path);
            info!("Set PYTHONPATH to: {}", python_path);
            match store.persist("PYTHONPATH", &python_path) {
                Ok(()) => info!("Set PYTHONPATH permanently"),
                Err(e) => error!("Could not set PYTHONPATH permanently: {}", e),
            }
        }
    }

    let search_path = session.get("PATH").unwrap_or_default();
    for name in companions {
        match find_executable(name, OsStr::new(&search_path)) {
            Some(path) => info!("Found {} in PATH at {}", name, path.display()),
            None => warn!("Could not find {} in PATH", name),
        }
    }

    Ok(())
}
