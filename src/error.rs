//! Error types.
//!
//! [`DoctorError`] is what fallible operations return. Reports never hold it
//! directly: each check converts its error into a [`CheckFailure`], a small
//! cloneable reason that survives in the report after the run.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DoctorError {
    #[error("Could not determine the home directory")]
    NoHomeDir,

    #[error("Could not create directory {path}: {source}")]
    Workspace {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not open log file {path}: {source}")]
    LogSetup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to launch `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Command timed out after {secs} seconds: {command}")]
    Timeout { command: String, secs: u64 },

    #[error("Command `{command}` exited with code {code:?}: {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Unexpected output from `{command}`: {message}")]
    Parse { command: String, message: String },

    #[error("Connection to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("Could not resolve {host}: {message}")]
    Resolve { host: String, message: String },

    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("TLS handshake with {host} failed: {message}")]
    Tls { host: String, message: String },

    #[error("{what} unavailable: {message}")]
    Unavailable { what: String, message: String },

    #[error("Could not persist {name}: {message}")]
    PersistEnv { name: String, message: String },

    #[error("Python {required} or higher is required. You are using Python {found}")]
    UnsupportedPython { required: String, found: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, DoctorError>;

/// Broad classification of a failed check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    Io,
    Command,
    Timeout,
    Network,
    Resolve,
    Tls,
    Parse,
    Unavailable,
    Environment,
}

impl FailureKind {
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::Io => "io",
            FailureKind::Command => "command",
            FailureKind::Timeout => "timeout",
            FailureKind::Network => "network",
            FailureKind::Resolve => "resolve",
            FailureKind::Tls => "tls",
            FailureKind::Parse => "parse",
            FailureKind::Unavailable => "unavailable",
            FailureKind::Environment => "environment",
        }
    }
}

/// Why a single check produced no value.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl CheckFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for CheckFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.label(), self.message)
    }
}

impl From<DoctorError> for CheckFailure {
    fn from(err: DoctorError) -> Self {
        let kind = match &err {
            DoctorError::NoHomeDir
            | DoctorError::PersistEnv { .. }
            | DoctorError::UnsupportedPython { .. } => FailureKind::Environment,
            DoctorError::Workspace { .. } | DoctorError::LogSetup { .. } | DoctorError::Io(_) => {
                FailureKind::Io
            }
            DoctorError::Spawn { .. } | DoctorError::CommandFailed { .. } => FailureKind::Command,
            DoctorError::Timeout { .. } => FailureKind::Timeout,
            DoctorError::Parse { .. } => FailureKind::Parse,
            DoctorError::Connect { .. } => FailureKind::Network,
            DoctorError::Http { source, .. } if source.is_timeout() => FailureKind::Timeout,
            DoctorError::Http { .. } => FailureKind::Network,
            DoctorError::Resolve { .. } => FailureKind::Resolve,
            DoctorError::Tls { .. } => FailureKind::Tls,
            DoctorError::Unavailable { .. } => FailureKind::Unavailable,
        };
        CheckFailure::new(kind, err.to_string())
    }
}

/// Result of a single check as stored in a report.
pub type Outcome<T> = std::result::Result<T, CheckFailure>;
