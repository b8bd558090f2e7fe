//! Uniform subprocess invocation for the external color tools.
//!
//! Every call goes through a [`CommandRunner`]. The production
//! [`SystemRunner`] enforces a timeout, captures stdout and stderr, and hands
//! back a [`ToolOutput`]; callers decide per tool whether a non-zero exit is
//! fatal. [`ScriptedRunner`] replays canned replies for tests.
//!
//! [`Tools`] resolves the configured command names to executable paths.

pub mod scripted;
mod tools;

pub use scripted::{Reply, ScriptedRunner};
pub use tools::{locate_tool, resolve_tool, Tools};

use cps_core::{Error, Result};
use log::{debug, warn};
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

/// How often a running child is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Result of one finished tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub program: String,
    pub args: Vec<String>,
    /// Exit code; `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Turn a non-zero exit into [`Error::ExternalTool`].
    pub fn checked(self) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(Error::ExternalTool {
                program: self.program,
                args: self.args,
                code: self.code,
                stderr: self.stderr,
            })
        }
    }
}

/// Runs an external program to completion.
///
/// Implementations must not interpret the exit status; that is the caller's
/// policy. `Err` is reserved for "could not run" and "ran too long".
pub trait CommandRunner: Send + Sync {
    fn run(&self, program: &Path, args: &[&str]) -> Result<ToolOutput>;
}

/// Spawns real processes with a per-call deadline.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    timeout: Duration,
}

impl SystemRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[&str]) -> Result<ToolOutput> {
        let name = program.display().to_string();
        debug!("exec: {} {}", name, args.join(" "));

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| Error::Spawn {
                program: name.clone(),
                source,
            })?;

        // Drain both pipes concurrently so a chatty child never blocks on a
        // full pipe while we wait for it.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    warn!("{} killed after {:?}", name, self.timeout);
                    return Err(Error::Timeout {
                        program: name,
                        timeout: self.timeout,
                    });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(source) => {
                    let _ = child.kill();
                    return Err(Error::Spawn {
                        program: name,
                        source,
                    });
                }
            }
        };

        // A background process can inherit the pipes and keep them open after
        // the child exits, so reading them is bounded by the same deadline.
        let (stdout, stderr) = match (collect(stdout, deadline), collect(stderr, deadline)) {
            (Some(stdout), Some(stderr)) => (stdout, stderr),
            _ => {
                warn!(
                    "{} exited but its output stayed open past {:?}",
                    name, self.timeout
                );
                return Err(Error::Timeout {
                    program: name,
                    timeout: self.timeout,
                });
            }
        };

        let output = ToolOutput {
            program: name,
            args: args.iter().map(|a| a.to_string()).collect(),
            code: status.code(),
            stdout,
            stderr,
        };
        debug!("exit: {} -> {:?}", output.program, output.code);
        Ok(output)
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send(buf);
    });
    rx
}

/// Wait for a drained pipe until `deadline`; `None` when it is still open.
fn collect(pipe: Option<Receiver<Vec<u8>>>, deadline: Instant) -> Option<String> {
    let Some(rx) = pipe else {
        return Some(String::new());
    };
    match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(RecvTimeoutError::Disconnected) => Some(String::new()),
        Err(RecvTimeoutError::Timeout) => None,
    }
}

#[cfg(test)]
#[path = "tests/exec_tests.rs"]
mod tests;
