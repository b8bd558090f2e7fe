//! Apply or disable a color profile on one display.
//!
//! Sequence for a profile:
//!   1. `dispwin -d N -v -c -I <icc>`   (failure logged, not fatal)
//!   2. `colormgr device-set-enabled <dev> True`
//!   3. `colormgr device-make-profile-default <dev> <id>`
//!
//! Sequence for disable:
//!   1. `dispwin -d N -U`               (failure logged, not fatal)
//!   2. `colormgr device-set-enabled <dev> False`
//!
//! The two tools are not updated atomically. A colord failure after the
//! loader succeeded is returned as [`Error::PartialApply`], optionally after
//! clearing the loader again.

use crate::resolver::resolve_monitor_index;
use cps_core::error::ApplyStage;
use cps_core::{Error, ProfileSelection, Result};
use cps_exec::{CommandRunner, Tools};
use log::{info, warn};
use std::sync::{Arc, Mutex, PoisonError};

/// What happened at the loader step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderStatus {
    Applied,
    /// The loader ran but exited non-zero; the apply carried on.
    Warning { code: Option<i32>, stderr: String },
    /// Dry run, nothing was invoked.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub device_path: String,
    pub output_name: String,
    pub monitor_index: u32,
    pub selection: ProfileSelection,
    pub loader: LoaderStatus,
}

/// Drives `dispwin` and `colormgr` for one apply at a time.
pub struct ProfileApplier {
    runner: Arc<dyn CommandRunner>,
    tools: Tools,
    rollback_on_failure: bool,
    dry_run: bool,
    lock: Mutex<()>,
}

impl ProfileApplier {
    pub fn new(runner: Arc<dyn CommandRunner>, tools: Tools) -> Self {
        Self {
            runner,
            tools,
            rollback_on_failure: false,
            dry_run: false,
            lock: Mutex::new(()),
        }
    }

    /// Clear the loader again when colord rejects a profile change.
    pub fn with_rollback(mut self, enabled: bool) -> Self {
        self.rollback_on_failure = enabled;
        self
    }

    /// Resolve indices but skip every state-changing invocation.
    pub fn with_dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    pub fn tools(&self) -> &Tools {
        &self.tools
    }

    pub fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Apply `profile_id` (or disable, for the `"Disable"` sentinel) on the
    /// device driving `output_name`.
    pub fn apply_profile(
        &self,
        device_path: &str,
        profile_id: &str,
        output_name: &str,
        profile_path: &str,
    ) -> Result<ApplyOutcome> {
        let selection = ProfileSelection::from_id(profile_id, profile_path);
        self.apply(device_path, output_name, &selection)
    }

    pub fn apply(
        &self,
        device_path: &str,
        output_name: &str,
        selection: &ProfileSelection,
    ) -> Result<ApplyOutcome> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let monitor_index = resolve_monitor_index(self.runner(), &self.tools, output_name)?;
        let index = monitor_index.to_string();

        let loader = match selection {
            ProfileSelection::Disable => {
                let loader = self.run_loader(&["-d", &index, "-U"])?;
                self.colormgr(&["device-set-enabled", device_path, "False"])
                    .map_err(|e| {
                        let stage = ApplyStage::DisableDevice;
                        self.after_loader(&loader, device_path, &index, stage, e)
                    })?;
                loader
            }
            ProfileSelection::Profile { id, path } => {
                let loader = self.run_loader(&["-d", &index, "-v", "-c", "-I", path])?;
                self.colormgr(&["device-set-enabled", device_path, "True"])
                    .map_err(|e| {
                        let stage = ApplyStage::EnableDevice;
                        self.after_loader(&loader, device_path, &index, stage, e)
                    })?;
                self.colormgr(&["device-make-profile-default", device_path, id])
                    .map_err(|e| {
                        let stage = ApplyStage::MakeDefault;
                        self.after_loader(&loader, device_path, &index, stage, e)
                    })?;
                loader
            }
        };

        match selection {
            ProfileSelection::Disable => {
                info!("Color correction disabled for {} (display {})", output_name, index)
            }
            ProfileSelection::Profile { id, .. } => {
                info!("Profile {} applied to {} (display {})", id, output_name, index)
            }
        }

        Ok(ApplyOutcome {
            device_path: device_path.to_string(),
            output_name: output_name.to_string(),
            monitor_index,
            selection: selection.clone(),
            loader,
        })
    }

    /// Run `dispwin`; a non-zero exit is downgraded to a warning.
    fn run_loader(&self, args: &[&str]) -> Result<LoaderStatus> {
        if self.dry_run {
            info!("[dry run] would run {} {}", self.tools.dispwin.display(), args.join(" "));
            return Ok(LoaderStatus::Skipped);
        }

        let output = self.runner.run(&self.tools.dispwin, args)?;
        if output.success() {
            Ok(LoaderStatus::Applied)
        } else {
            warn!(
                "dispwin {} exited with {:?}: {}",
                args.join(" "),
                output.code,
                output.stderr.trim()
            );
            Ok(LoaderStatus::Warning {
                code: output.code,
                stderr: output.stderr,
            })
        }
    }

    /// Run `colormgr`; a non-zero exit is an error.
    fn colormgr(&self, args: &[&str]) -> Result<()> {
        if self.dry_run {
            info!("[dry run] would run {} {}", self.tools.colormgr.display(), args.join(" "));
            return Ok(());
        }
        self.runner.run(&self.tools.colormgr, args)?.checked()?;
        Ok(())
    }

    /// Classify a colord failure that happened after the loader step.
    fn after_loader(
        &self,
        loader: &LoaderStatus,
        device_path: &str,
        index: &str,
        stage: ApplyStage,
        source: Error,
    ) -> Error {
        if *loader != LoaderStatus::Applied {
            return source;
        }

        let rolled_back = self.rollback_on_failure
            && stage != ApplyStage::DisableDevice
            && self.roll_back(index);

        warn!(
            "{} failed for {} after dispwin changed display {}",
            stage, device_path, index
        );
        Error::PartialApply {
            device: device_path.to_string(),
            stage,
            rolled_back,
            source: Box::new(source),
        }
    }

    fn roll_back(&self, index: &str) -> bool {
        match self.run_loader(&["-d", index, "-U"]) {
            Ok(LoaderStatus::Applied) => {
                info!("Rolled back loader state on display {}", index);
                true
            }
            Ok(_) => false,
            Err(e) => {
                warn!("Rollback on display {} failed: {}", index, e);
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/applier_tests.rs"]
mod tests;
