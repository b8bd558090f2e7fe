//! Menu model: what the interactive menu shows and what each entry does.
//!
//! Every entry carries a [`MenuCommand`] value; [`dispatch`] is the only
//! place commands turn into work.

use cps_core::{Device, Error, ProfileSelection, DISABLE_SENTINEL};
use cps_device::fetch_devices;
use cps_exec::{CommandRunner, Tools};
use cps_profile::{ApplyOutcome, ApplyRequest, ApplyTicket, ApplyWorker, LoaderStatus};
use log::warn;

/// Label of the top-level entry that leaves the menu.
pub const EXIT_LABEL: &str = "Exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuCommand {
    ApplyProfile {
        device_path: String,
        output_name: String,
        profile_id: String,
        profile_path: String,
    },
    Disable {
        device_path: String,
        output_name: String,
    },
    Exit,
}

impl MenuCommand {
    /// The apply request this command stands for; `None` for `Exit`.
    pub fn to_request(&self) -> Option<ApplyRequest> {
        match self {
            MenuCommand::ApplyProfile {
                device_path,
                output_name,
                profile_id,
                profile_path,
            } => Some(ApplyRequest {
                device_path: device_path.clone(),
                output_name: output_name.clone(),
                selection: ProfileSelection::from_id(profile_id, profile_path),
            }),
            MenuCommand::Disable {
                device_path,
                output_name,
            } => Some(ApplyRequest {
                device_path: device_path.clone(),
                output_name: output_name.clone(),
                selection: ProfileSelection::Disable,
            }),
            MenuCommand::Exit => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub label: String,
    /// Greyed-out entries are shown but cannot be selected.
    pub enabled: bool,
    pub command: MenuCommand,
}

impl MenuItem {
    fn new(label: &str, disabled: bool, command: MenuCommand) -> Self {
        Self {
            label: if disabled {
                format!("* {}", label)
            } else {
                label.to_string()
            },
            enabled: !disabled,
            command,
        }
    }

    fn exit() -> Self {
        Self::new(EXIT_LABEL, false, MenuCommand::Exit)
    }
}

/// One device's entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submenu {
    pub label: String,
    pub device_path: String,
    pub output_name: String,
    pub color_managed: bool,
    pub items: Vec<MenuItem>,
}

/// Device submenus followed by a separator and the `Exit` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    pub submenus: Vec<Submenu>,
    /// Set when the inventory could not be read.
    pub status: Option<String>,
    pub exit: MenuItem,
}

impl Default for Menu {
    fn default() -> Self {
        Self {
            submenus: Vec::new(),
            status: None,
            exit: MenuItem::exit(),
        }
    }
}

impl Menu {
    /// A menu that only reports why the device list is missing.
    pub fn unavailable(err: &Error) -> Self {
        Self {
            status: Some(format!("Color manager unavailable: {}", err)),
            ..Self::default()
        }
    }
}

/// Build the menu for an inventory snapshot.
///
/// The first profile of an enabled device is taken to be the active one and
/// greyed out; `Disable` is greyed out when the device is already disabled.
pub fn build_menu(devices: &[Device]) -> Menu {
    let submenus = devices
        .iter()
        .map(|device| {
            let mut items = Vec::with_capacity(device.profiles.len() + 1);
            let mut first = device.enabled;

            for profile in &device.profiles {
                items.push(MenuItem::new(
                    profile.file_name(),
                    first,
                    MenuCommand::ApplyProfile {
                        device_path: device.path.clone(),
                        output_name: device.xrandr_name.clone(),
                        profile_id: profile.id.clone(),
                        profile_path: profile.path.clone(),
                    },
                ));
                first = false;
            }

            items.push(MenuItem::new(
                DISABLE_SENTINEL,
                !device.enabled,
                MenuCommand::Disable {
                    device_path: device.path.clone(),
                    output_name: device.xrandr_name.clone(),
                },
            ));

            Submenu {
                label: device.display_name().to_string(),
                device_path: device.path.clone(),
                output_name: device.xrandr_name.clone(),
                color_managed: device.enabled,
                items,
            }
        })
        .collect();

    Menu {
        submenus,
        ..Menu::default()
    }
}

/// Fetch a fresh inventory and build the menu; failures become a status
/// entry instead of an error.
pub fn load_menu(runner: &dyn CommandRunner, tools: &Tools) -> Menu {
    match fetch_devices(runner, tools) {
        Ok(devices) => build_menu(&devices),
        Err(e) => {
            warn!("Device inventory failed: {}", e);
            Menu::unavailable(&e)
        }
    }
}

/// Result of handing a command to [`dispatch`].
pub enum Dispatch {
    Queued(ApplyTicket),
    /// The entry is greyed out.
    Ignored,
    Exit,
}

/// Route a selected entry to the apply worker.
pub fn dispatch(item: &MenuItem, worker: &ApplyWorker) -> Dispatch {
    if !item.enabled {
        return Dispatch::Ignored;
    }
    dispatch_command(&item.command, worker)
}

/// Route a command to the apply worker regardless of menu state.
pub fn dispatch_command(command: &MenuCommand, worker: &ApplyWorker) -> Dispatch {
    match command.to_request() {
        Some(request) => Dispatch::Queued(worker.submit(request)),
        None => Dispatch::Exit,
    }
}

/// One-line summary of a finished apply, plus a loader warning if any.
pub fn describe_outcome(outcome: &ApplyOutcome) -> (String, Option<String>) {
    let dry = outcome.loader == LoaderStatus::Skipped;
    let summary = match &outcome.selection {
        ProfileSelection::Profile { path, .. } => format!(
            "{} {} to {} (monitor {})",
            if dry { "Would apply" } else { "Applied" },
            path.rsplit('/').next().unwrap_or(path),
            outcome.output_name,
            outcome.monitor_index
        ),
        ProfileSelection::Disable => format!(
            "{} color management on {} (monitor {})",
            if dry { "Would disable" } else { "Disabled" },
            outcome.output_name,
            outcome.monitor_index
        ),
    };
    let warning = match &outcome.loader {
        LoaderStatus::Warning { code, stderr } => Some(format!(
            "dispwin exited with {}: {}",
            code.map_or_else(|| "a signal".to_string(), |c| format!("status {}", c)),
            stderr.trim()
        )),
        _ => None,
    };
    (summary, warning)
}

#[cfg(test)]
#[path = "tests/menu_tests.rs"]
mod tests;
