//! Inventory snapshot types.
//!
//! A [`Device`] list is rebuilt from `colormgr` output on every read; nothing
//! here is cached or persisted.

use std::path::Path;

/// Profile id that stands for "turn color correction off".
pub const DISABLE_SENTINEL: &str = "Disable";

/// One ICC profile attached to a device, as `colormgr` reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: String,
    pub path: String,
}

impl Profile {
    pub fn new(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
        }
    }

    /// File name component of the profile path, or the whole path if it
    /// has none.
    pub fn file_name(&self) -> &str {
        Path::new(&self.path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.path)
    }
}

/// A color-managed display device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Device {
    /// colord object path; non-empty and unique within a snapshot.
    pub path: String,
    pub model: String,
    pub serial: String,
    pub device_id: String,
    /// `true` exactly when colord printed `Enabled: Yes`.
    pub enabled: bool,
    /// Windowing-system output name (e.g. `eDP-1`), empty if unknown.
    pub xrandr_name: String,
    /// Profiles in the order colord reported them.
    pub profiles: Vec<Profile>,
}

impl Device {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Human-readable name: the device ID without its `xrandr-` prefix,
    /// falling back to the model and then the object path.
    pub fn display_name(&self) -> &str {
        if !self.device_id.is_empty() {
            return self
                .device_id
                .strip_prefix("xrandr-")
                .unwrap_or(&self.device_id);
        }
        if !self.model.is_empty() {
            return &self.model;
        }
        &self.path
    }

    pub fn find_profile(&self, id: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.id == id)
    }
}

/// What the user asked to do with a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileSelection {
    Profile { id: String, path: String },
    Disable,
}

impl ProfileSelection {
    /// Map a textual profile id to a selection; [`DISABLE_SENTINEL`] means
    /// [`ProfileSelection::Disable`] and the path is ignored.
    pub fn from_id(id: &str, path: &str) -> Self {
        if id == DISABLE_SENTINEL {
            ProfileSelection::Disable
        } else {
            ProfileSelection::Profile {
                id: id.to_string(),
                path: path.to_string(),
            }
        }
    }

    pub fn is_disable(&self) -> bool {
        matches!(self, ProfileSelection::Disable)
    }
}

#[cfg(test)]
#[path = "tests/model_tests.rs"]
mod tests;
