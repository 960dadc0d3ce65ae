//! Run log: the file and console sinks of one troubleshooting run.
//!
//! A [`RunLog`] installs itself as the current thread's default `tracing`
//! subscriber when opened and uninstalls itself when dropped, so its
//! lifetime is the lifetime of the run that owns it. The log file is only
//! ever appended to.

use crate::error::{DoctorError, Result};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::subscriber::DefaultGuard;
use tracing::{info, Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{self, FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const HEADER_WIDTH: usize = 60;

/// `2024-01-31 12:00:00 - INFO - message`
struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        write!(
            writer,
            "{} - {} - ",
            chrono::Local::now().format(TIME_FORMAT),
            event.metadata().level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

#[derive(Debug)]
pub struct RunLog {
    path: PathBuf,
    _guard: DefaultGuard,
}

impl RunLog {
    /// Open `path` for appending and route this thread's events to it and
    /// to stderr.
    ///
    /// The filter comes from `RUST_LOG`, defaulting to `pydoctor=info`.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| DoctorError::LogSetup {
                path: path.to_path_buf(),
                source,
            })?;

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pydoctor=info"));

        let subscriber = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .event_format(LineFormat)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .with(
                fmt::layer()
                    .event_format(LineFormat)
                    .with_writer(std::io::stderr),
            )
            .with(filter);

        let guard = tracing::subscriber::set_default(subscriber);

        Ok(Self {
            path: path.to_path_buf(),
            _guard: guard,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `[*] text` on stdout, plain text in the log
    pub fn status(&self, text: &str) {
        println!("[*] {}", text);
        info!("{}", text);
    }

    /// Centered banner on stdout, one line in the log
    pub fn header(&self, text: &str) {
        println!("{}", format_header(text));
        info!("{0} {1} {0}", "=".repeat(10), text);
    }
}

/// Text centered between two rules of `=`
pub fn format_header(text: &str) -> String {
    let rule = "=".repeat(HEADER_WIDTH);
    format!("\n{rule}\n{text:^width$}\n{rule}\n", width = HEADER_WIDTH)
}
