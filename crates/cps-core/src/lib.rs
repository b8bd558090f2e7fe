//! Shared building blocks for the color profile switcher.
//!
//! - [`config`]: TOML configuration with compiled-in defaults.
//! - [`error`]: the single error type used across the workspace.
//! - [`model`]: devices, profiles and profile selections.

pub mod config;
pub mod error;
pub mod model;

pub use error::{Error, Result};
pub use model::{Device, Profile, ProfileSelection, DISABLE_SENTINEL};
