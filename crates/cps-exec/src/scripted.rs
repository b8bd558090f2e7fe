//! A [`CommandRunner`] that replays canned replies and records every call.
//!
//! Used by the parser and applier tests across the workspace.

use crate::{CommandRunner, ToolOutput};
use cps_core::{Error, Result};
use std::io;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

/// Canned behaviour for a matched invocation.
#[derive(Debug, Clone)]
pub enum Reply {
    Exit {
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    SpawnError,
    Timeout,
}

impl Reply {
    /// Exit 0 with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Reply::Exit {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Exit with `code` and the given stderr.
    pub fn stderr(code: i32, stderr: impl Into<String>) -> Self {
        Reply::Exit {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

struct Rule {
    program: String,
    prefix: Vec<String>,
    reply: Reply,
}

/// Matches calls by program file name and leading arguments; the first
/// matching rule wins. Unmatched calls exit 0 with empty output.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `reply` when `program` is run with arguments starting
    /// with `prefix`.
    pub fn on(self, program: &str, prefix: &[&str], reply: Reply) -> Self {
        if let Ok(mut rules) = self.rules.lock() {
            rules.push(Rule {
                program: program.to_string(),
                prefix: prefix.iter().map(|s| s.to_string()).collect(),
                reply,
            });
        }
        self
    }

    /// Every recorded call as `[program, args...]`, program by file name.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Recorded calls of one program, arguments only.
    pub fn calls_to(&self, program: &str) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|c| c.first().map(String::as_str) == Some(program))
            .map(|c| c[1..].to_vec())
            .collect()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &Path, args: &[&str]) -> Result<ToolOutput> {
        let name = program
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        let mut call = vec![name.clone()];
        call.extend(args.iter().map(|a| a.to_string()));
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }

        let reply = self.rules.lock().ok().and_then(|rules| {
            rules
                .iter()
                .find(|r| {
                    r.program == name
                        && r.prefix.len() <= args.len()
                        && r.prefix.iter().zip(args).all(|(p, a)| p == a)
                })
                .map(|r| r.reply.clone())
        });

        match reply.unwrap_or_else(|| Reply::ok("")) {
            Reply::Exit {
                code,
                stdout,
                stderr,
            } => Ok(ToolOutput {
                program: name,
                args: args.iter().map(|a| a.to_string()).collect(),
                code,
                stdout,
                stderr,
            }),
            Reply::SpawnError => Err(Error::Spawn {
                program: name,
                source: io::Error::new(io::ErrorKind::NotFound, "scripted spawn failure"),
            }),
            Reply::Timeout => Err(Error::Timeout {
                program: name,
                timeout: Duration::from_millis(1),
            }),
        }
    }
}
