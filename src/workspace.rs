//! Per-user working directory holding the log and package backups.

use crate::error::{DoctorError, Result};
use std::path::{Path, PathBuf};

/// Directory created under the user's home
pub const BASE_DIR_NAME: &str = "python_troubleshooter";
pub const LOG_FILE_NAME: &str = "troubleshoot.log";
pub const BACKUP_DIR_NAME: &str = "backup";

#[derive(Clone, Debug)]
pub struct Workspace {
    pub base_dir: PathBuf,
    pub log_file: PathBuf,
    pub backup_dir: PathBuf,
}

impl Workspace {
    /// `~/python_troubleshooter`
    pub fn default_location() -> Result<Self> {
        let home = dirs::home_dir().ok_or(DoctorError::NoHomeDir)?;
        Self::create(&home.join(BASE_DIR_NAME))
    }

    /// Create (or reuse) the working directory and its backup folder
    pub fn create(base_dir: &Path) -> Result<Self> {
        let backup_dir = base_dir.join(BACKUP_DIR_NAME);
        for dir in [base_dir, backup_dir.as_path()] {
            std::fs::create_dir_all(dir).map_err(|source| DoctorError::Workspace {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        Ok(Self {
            base_dir: base_dir.to_path_buf(),
            log_file: base_dir.join(LOG_FILE_NAME),
            backup_dir,
        })
    }

    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join(crate::settings::SETTINGS_FILE)
    }
}
