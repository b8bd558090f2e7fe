//! Device inventory via `colormgr get-devices-by-kind display`.
//!
//! `colormgr` prints one block per device, each starting with an
//! `Object Path:` line followed by `Label:      value` lines. Profiles span
//! two lines: `Profile N:   <id>` and an indented line holding the file path.
//!
//! ```text
//! Object Path:   /org/freedesktop/ColorManager/devices/xrandr_eDP_1
//! Enabled:       Yes
//! Model:         0x1234
//! Device ID:     xrandr-eDP-1
//! Profile 1:     icc-9f1c...
//!                /home/me/.local/share/icc/edid-9f1c.icc
//! Metadata:      XRANDR_name=eDP-1
//! ```
//!
//! Labels are matched by prefix and values trimmed, so a change in column
//! width does not shift the extracted values.

use cps_core::{Device, Error, Profile, Result};
use cps_exec::{CommandRunner, Tools};
use log::{debug, info};
use std::collections::HashSet;

const OBJECT_PATH: &str = "Object Path:";
const MODEL: &str = "Model:";
const ENABLED: &str = "Enabled:";
const SERIAL: &str = "Serial:";
const DEVICE_ID: &str = "Device ID:";
const METADATA: &str = "Metadata:";
const XRANDR_NAME: &str = "XRANDR_name=";
const PROFILE: &str = "Profile ";

/// Query colord for the current device inventory.
///
/// A non-zero exit is fatal ([`Error::ExternalTool`]).
pub fn fetch_devices(runner: &dyn CommandRunner, tools: &Tools) -> Result<Vec<Device>> {
    let output = runner
        .run(
            &tools.colormgr,
            &["get-devices-by-kind", tools.device_kind.as_str()],
        )?
        .checked()?;

    let devices = parse_devices(&output.stdout)?;
    info!("colord reported {} {} device(s)", devices.len(), tools.device_kind);
    Ok(devices)
}

/// Parse `colormgr get-devices-by-kind` output into devices, in output order.
pub fn parse_devices(text: &str) -> Result<Vec<Device>> {
    let lines: Vec<&str> = text.lines().collect();
    let mut devices = Vec::new();
    let mut seen = HashSet::new();
    let mut current: Option<Device> = None;

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        let lineno = i + 1;
        i += 1;

        if let Some(path) = field(line, OBJECT_PATH) {
            if path.is_empty() {
                return Err(parse_error(lineno, "empty object path"));
            }
            if !seen.insert(path.to_string()) {
                return Err(parse_error(lineno, format!("duplicate object path {}", path)));
            }
            if let Some(done) = current.take() {
                devices.push(done);
            }
            current = Some(Device::new(path));
            continue;
        }

        let Some(device) = current.as_mut() else {
            if !line.trim().is_empty() {
                debug!("ignoring line {} outside a device block: {}", lineno, line);
            }
            continue;
        };

        if let Some(v) = field(line, MODEL) {
            device.model = v.to_string();
        } else if let Some(v) = field(line, ENABLED) {
            device.enabled = v == "Yes";
        } else if let Some(v) = field(line, SERIAL) {
            device.serial = v.to_string();
        } else if let Some(v) = field(line, DEVICE_ID) {
            device.device_id = v.to_string();
        } else if let Some(v) = field(line, METADATA) {
            if let Some(name) = v.strip_prefix(XRANDR_NAME) {
                device.xrandr_name = name.trim().to_string();
            }
        } else if let Some(id) = profile_id(line) {
            if id.is_empty() {
                return Err(parse_error(lineno, "profile line without an id"));
            }
            // The path sits on its own indented line; an unindented line is
            // the next label, meaning the profile record was cut short.
            let path = lines
                .get(i)
                .filter(|l| l.starts_with(char::is_whitespace))
                .map(|l| l.trim())
                .unwrap_or_default();
            if path.is_empty() {
                return Err(parse_error(
                    lineno,
                    format!("profile {} has no file path line", id),
                ));
            }
            device.profiles.push(Profile::new(id, path));
            i += 1;
        }
    }

    if let Some(done) = current.take() {
        devices.push(done);
    }
    Ok(devices)
}

/// Value of a `Label:   value` line, trimmed, if the line starts with `label`.
fn field<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    line.strip_prefix(label).map(str::trim)
}

/// Id from a `Profile N:   id` line.
fn profile_id(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(PROFILE)?;
    let (index, id) = rest.split_once(':')?;
    if index.is_empty() || !index.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(id.trim())
}

fn parse_error(line: usize, reason: impl Into<String>) -> Error {
    Error::InventoryParse {
        line,
        reason: reason.into(),
    }
}

#[cfg(test)]
#[path = "tests/device_tests.rs"]
mod tests;
