//! Error taxonomy shared by every crate in the workspace.

use std::fmt;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// Colord call that failed after the loader had already changed the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyStage {
    EnableDevice,
    DisableDevice,
    MakeDefault,
}

impl fmt::Display for ApplyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ApplyStage::EnableDevice => "device-set-enabled True",
            ApplyStage::DisableDevice => "device-set-enabled False",
            ApplyStage::MakeDefault => "device-make-profile-default",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// The tool binary could not be started at all.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The tool ran past the configured deadline and was killed.
    #[error("{program} did not finish within {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    /// Non-zero exit on a call whose status is checked.
    #[error("`{program} {}` exited with {}: {}", .args.join(" "), describe_code(.code), .stderr.trim())]
    ExternalTool {
        program: String,
        args: Vec<String>,
        code: Option<i32>,
        stderr: String,
    },

    /// The device inventory output could not be parsed.
    #[error("malformed device inventory at line {line}: {reason}")]
    InventoryParse { line: usize, reason: String },

    /// The loader lists no monitor for this output name.
    #[error("no loader monitor index found for output \"{output}\"")]
    NotFound { output: String },

    #[error("no color-managed device with path {path}")]
    DeviceNotFound { path: String },

    #[error("device {device} has no profile \"{profile}\"")]
    ProfileNotFound { device: String, profile: String },

    /// The loader changed the display but a later colord call failed,
    /// leaving the two out of sync.
    #[error(
        "{stage} failed for {device} after the loader ran{}: {source}",
        rollback_note(.rolled_back)
    )]
    PartialApply {
        device: String,
        stage: ApplyStage,
        rolled_back: bool,
        #[source]
        source: Box<Error>,
    },

    /// The background apply worker has shut down.
    #[error("apply worker is no longer running")]
    WorkerStopped,

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True for the "no monitor index" case, which callers often report
    /// differently from tool failures.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

fn rollback_note(rolled_back: &bool) -> &'static str {
    if *rolled_back {
        " (loader state rolled back)"
    } else {
        ""
    }
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {}", c),
        None => "no status (killed by signal)".to_string(),
    }
}

#[cfg(test)]
#[path = "tests/error_tests.rs"]
mod tests;
