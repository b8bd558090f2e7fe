//! Configuration management: a TOML file with compiled-in defaults.
//!
//! Config file location: `$XDG_CONFIG_HOME/color-profile-switcher/config.toml`
//! (or `~/.config/...` when `XDG_CONFIG_HOME` is unset).
//! Falls back to compiled-in defaults if the file is missing or malformed.

use crate::error::{Error, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "color-profile-switcher";

/// Path to the config directory.
pub fn config_dir() -> PathBuf {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join(APP_DIR)
}

/// Full path to the config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Tool locations and invocation policy, with defaults for every field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name or path of the colord command-line client.
    pub colormgr_command: String,

    /// Name or path of the ArgyllCMS `dispwin` loader.
    pub dispwin_command: String,

    /// Directories searched after `$PATH` when a command is a bare name.
    pub tool_search_paths: Vec<String>,

    /// Device kind passed to `colormgr get-devices-by-kind`.
    pub device_kind: String,

    /// Upper bound for any single tool invocation (ms).
    pub command_timeout_ms: u64,

    /// Unload the loader profile again when a later colord call fails.
    pub rollback_on_failure: bool,

    /// Enable debug logging.
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            colormgr_command: "colormgr".to_string(),
            dispwin_command: "dispwin".to_string(),
            tool_search_paths: vec![
                "/usr/local/bin".to_string(),
                "/usr/bin".to_string(),
                "/opt/Argyll/bin".to_string(),
            ],
            device_kind: "display".to_string(),
            command_timeout_ms: 10_000,
            rollback_on_failure: false,
            verbose: false,
        }
    }
}

impl Config {
    /// Load config from the default location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    /// Load config from `path`, falling back to defaults.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(cfg) => {
                    info!("Config loaded from {}", path.display());
                    cfg
                }
                Err(e) => {
                    warn!(
                        "Config parse error in {}: {}; using defaults",
                        path.display(),
                        e
                    );
                    Self::default()
                }
            },
            Err(_) => {
                info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Per-invocation timeout as a `Duration`.
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    /// Write the default config to `path` (creates the directory if needed).
    pub fn write_default(path: &Path) -> Result<()> {
        Self::write_config(path, &Self::default())
    }

    /// Write a specific config to `path`.
    pub fn write_config(path: &Path, cfg: &Config) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                std::fs::create_dir_all(dir).map_err(|e| {
                    Error::Config(format!("cannot create {}: {}", dir.display(), e))
                })?;
            }
        }

        let toml_str = Self::to_toml_commented(cfg);
        std::fs::write(path, toml_str)
            .map_err(|e| Error::Config(format!("cannot write {}: {}", path.display(), e)))?;
        info!("Config written to {}", path.display());
        Ok(())
    }

    /// Serialize config to a TOML string with helpful comments.
    fn to_toml_commented(cfg: &Config) -> String {
        let search_paths = cfg
            .tool_search_paths
            .iter()
            .map(|p| format!("\"{}\"", escape_toml_string(p)))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            r##"# Color Profile Switcher configuration
# Location: $XDG_CONFIG_HOME/color-profile-switcher/config.toml
# Read on every start; the device inventory itself is never cached.

# ─── Tools ───────────────────────────────────────────────────────────
# colord command-line client.
colormgr_command = "{colormgr_command}"

# ArgyllCMS display profile loader.
dispwin_command = "{dispwin_command}"

# Searched after $PATH when a command above is a bare name.
tool_search_paths = [{search_paths}]

# Device kind queried from colord.
device_kind = "{device_kind}"

# ─── Invocation ──────────────────────────────────────────────────────
# A tool still running after this many ms is killed.
command_timeout_ms = {command_timeout_ms}

# Unload the loader profile if colord rejects the change afterwards.
rollback_on_failure = {rollback_on_failure}

# ─── Debug ───────────────────────────────────────────────────────────
# Log every tool invocation.
verbose = {verbose}
"##,
            colormgr_command = escape_toml_string(&cfg.colormgr_command),
            dispwin_command = escape_toml_string(&cfg.dispwin_command),
            search_paths = search_paths,
            device_kind = escape_toml_string(&cfg.device_kind),
            command_timeout_ms = cfg.command_timeout_ms,
            rollback_on_failure = cfg.rollback_on_failure,
            verbose = cfg.verbose,
        )
    }
}

/// Escape a string for safe inclusion inside a TOML basic string (`"..."`).
fn escape_toml_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
