use cps_core::config::Config;
use log::{debug, warn};
use std::env;
use std::path::{Path, PathBuf};

/// Resolved locations of the two external tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tools {
    pub colormgr: PathBuf,
    pub dispwin: PathBuf,
    /// Device kind passed to `get-devices-by-kind`.
    pub device_kind: String,
}

impl Tools {
    /// Resolve both tools from configuration, see [`resolve_tool`].
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            colormgr: resolve_tool(&cfg.colormgr_command, &cfg.tool_search_paths),
            dispwin: resolve_tool(&cfg.dispwin_command, &cfg.tool_search_paths),
            device_kind: cfg.device_kind.clone(),
        }
    }

    /// Use the given paths verbatim, querying `display` devices.
    pub fn new(colormgr: impl Into<PathBuf>, dispwin: impl Into<PathBuf>) -> Self {
        Self {
            colormgr: colormgr.into(),
            dispwin: dispwin.into(),
            device_kind: "display".to_string(),
        }
    }
}

/// Find an executable for `command`.
///
/// A command containing `/` is taken as a path and only checked for
/// existence. A bare name is looked up in `$PATH`, then in `search_paths`.
pub fn locate_tool(command: &str, search_paths: &[String]) -> Option<PathBuf> {
    if command.contains('/') {
        let path = PathBuf::from(command);
        return path.is_file().then_some(path);
    }

    let path_dirs: Vec<PathBuf> = env::var_os("PATH")
        .map(|p| env::split_paths(&p).collect())
        .unwrap_or_default();

    path_dirs
        .into_iter()
        .chain(search_paths.iter().map(PathBuf::from))
        .map(|dir| dir.join(command))
        .find(|candidate| candidate.is_file())
}

/// Like [`locate_tool`], but falls back to the command as given so the spawn
/// error names what the user configured.
pub fn resolve_tool(command: &str, search_paths: &[String]) -> PathBuf {
    match locate_tool(command, search_paths) {
        Some(path) => {
            debug!("{} resolved to {}", command, path.display());
            path
        }
        None => {
            warn!(
                "{} not found in $PATH or {:?}; invoking it as given",
                command, search_paths
            );
            Path::new(command).to_path_buf()
        }
    }
}

#[cfg(test)]
#[path = "tests/tools_tests.rs"]
mod tests;
