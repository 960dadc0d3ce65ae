//! Environment variables of this process and of the user.
//!
//! Persistent variables live under `HKCU\Environment` on Windows; other
//! platforms have no equivalent store, so persistence is a logged no-op there.

use crate::error::Result;
use std::cell::RefCell;
use std::collections::HashMap;
use tracing::info;

/// Variables of the running process
pub trait SessionEnv {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&self, name: &str, value: &str);
}

/// The real process environment
pub struct ProcessEnv;

impl SessionEnv for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.is_empty())
    }

    fn set(&self, name: &str, value: &str) {
        std::env::set_var(name, value);
    }
}

/// An environment held in memory, seeded from pairs
#[derive(Default)]
pub struct MemoryEnv {
    vars: RefCell<HashMap<String, String>>,
}

impl MemoryEnv {
    pub fn new<'a>(vars: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            vars: RefCell::new(
                vars.into_iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
        }
    }
}

impl SessionEnv for MemoryEnv {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.borrow().get(name).cloned().filter(|v| !v.is_empty())
    }

    fn set(&self, name: &str, value: &str) {
        self.vars
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
    }
}

pub trait PersistentEnv {
    /// Store `name=value` so new sessions see it
    fn persist(&self, name: &str, value: &str) -> Result<()>;
}

/// The store for the current platform
pub fn platform_store() -> Box<dyn PersistentEnv> {
    #[cfg(target_os = "windows")]
    {
        Box::new(RegistryEnv)
    }
    #[cfg(not(target_os = "windows"))]
    {
        Box::new(NoopEnv)
    }
}

/// Leaves the persistent environment untouched
pub struct NoopEnv;

impl PersistentEnv for NoopEnv {
    fn persist(&self, name: &str, _value: &str) -> Result<()> {
        info!(
            "Persisting {} is not supported on {}; change applies to this session only",
            name,
            std::env::consts::OS
        );
        Ok(())
    }
}

#[cfg(target_os = "windows")]
pub use registry::RegistryEnv;

#[cfg(target_os = "windows")]
mod registry {
    use super::PersistentEnv;
    use crate::error::{DoctorError, Result};
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;
    use winreg::enums::{HKEY_CURRENT_USER, KEY_ALL_ACCESS, REG_EXPAND_SZ};
    use winreg::{RegKey, RegValue};

    /// Writes `REG_EXPAND_SZ` values under `HKCU\Environment`
    pub struct RegistryEnv;

    impl PersistentEnv for RegistryEnv {
        fn persist(&self, name: &str, value: &str) -> Result<()> {
            let err = |e: std::io::Error| DoctorError::PersistEnv {
                name: name.to_string(),
                message: e.to_string(),
            };

            let key = RegKey::predef(HKEY_CURRENT_USER)
                .open_subkey_with_flags("Environment", KEY_ALL_ACCESS)
                .map_err(err)?;

            // UTF-16LE, NUL terminated
            let bytes: Vec<u8> = OsStr::new(value)
                .encode_wide()
                .chain(std::iter::once(0))
                .flat_map(|unit| unit.to_le_bytes())
                .collect();

            key.set_raw_value(
                name,
                &RegValue {
                    bytes,
                    vtype: REG_EXPAND_SZ,
                },
            )
            .map_err(err)
        }
    }
}
