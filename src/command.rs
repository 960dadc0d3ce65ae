//! Process execution with a hard timeout.

use crate::error::{DoctorError, Result};
use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Output of a finished command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Turn a non-zero exit into [`DoctorError::CommandFailed`].
    pub fn require_success(self, command: &str) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(DoctorError::CommandFailed {
                command: command.to_string(),
                code: self.exit_code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Anything that can run a program to completion.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput>;
}

/// Runs real processes, killing them after `timeout`.
pub struct SystemRunner {
    timeout: Duration,
}

impl SystemRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        let command = display_command(program, args);
        debug!("Running {}", command);
        let start = Instant::now();

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| DoctorError::Spawn {
                command: command.clone(),
                source,
            })?;

        // Drain both pipes so a chatty child can't block on a full buffer
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match wait_until(&mut child, start + self.timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                return Err(DoctorError::Timeout {
                    command,
                    secs: self.timeout.as_secs(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        Ok(CommandOutput {
            exit_code: status.code(),
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
            duration: start.elapsed(),
        })
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// A running process that can be polled and killed
trait Reap {
    fn try_wait(&mut self) -> io::Result<Option<ExitStatus>>;
    fn kill(&mut self);
}

impl Reap for Child {
    fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        Child::try_wait(self)
    }

    fn kill(&mut self) {
        let _ = Child::kill(self);
        let _ = self.wait();
    }
}

/// Poll until the process exits. `Ok(None)` means the deadline passed.
///
/// The process is killed on timeout and when polling itself fails.
fn wait_until<P: Reap>(process: &mut P, deadline: Instant) -> io::Result<Option<ExitStatus>> {
    loop {
        match process.try_wait() {
            Ok(Some(status)) => return Ok(Some(status)),
            Ok(None) if Instant::now() >= deadline => {
                process.kill();
                return Ok(None);
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                process.kill();
                return Err(e);
            }
        }
    }
}

/// `program arg1 arg2` for log lines and errors
pub fn display_command(program: &str, args: &[&str]) -> String {
    let mut command = program.to_string();
    for arg in args {
        command.push(' ');
        command.push_str(arg);
    }
    command
}

/// Run a command and echo what it printed into the log.
///
/// Stdout goes in at INFO, stderr at ERROR, mirroring how a mutating step
/// would be read after the fact.
pub fn run_logged(runner: &dyn CommandRunner, program: &str, args: &[&str]) -> Result<CommandOutput> {
    let command = display_command(program, args);
    let output = match runner.run(program, args) {
        Ok(output) => output,
        Err(e) => {
            error!("Error running command '{}': {}", command, e);
            return Err(e);
        }
    };

    if !output.stdout.trim().is_empty() {
        info!("Command output:\n{}", output.stdout.trim_end());
    }
    if !output.stderr.trim().is_empty() {
        error!("Command errors:\n{}", output.stderr.trim_end());
    }

    output.require_success(&command)
}
