//! Python environment troubleshooter and GUI smoke test.

pub mod command;
pub mod diagnostics;
pub mod error;
pub mod gui;
pub mod installer;
pub mod logging;
pub mod repair;
pub mod settings;
pub mod system_info;
pub mod troubleshooter;
pub mod workspace;

pub use error::{DoctorError, Result};
pub use troubleshooter::{Backends, Troubleshooter};
