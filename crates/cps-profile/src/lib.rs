//! Color profile switching: resolve the loader's monitor index, load or
//! clear the profile with `dispwin`, and record the change in colord.
//!
//! - [`resolver`]: output name → `dispwin -d` index.
//! - [`applier`]: the apply / disable sequence and its failure policy.
//! - [`worker`]: runs applies one at a time off the caller's thread.

pub mod applier;
pub mod resolver;
pub mod worker;

pub use applier::{ApplyOutcome, LoaderStatus, ProfileApplier};
pub use resolver::{parse_monitor_index, resolve_monitor_index};
pub use worker::{ApplyRequest, ApplyTicket, ApplyWorker};
