//! Scheduler error type.

use bv_ir::OwnerKey;
use thiserror::Error;

/// Misuse of the scheduler API. Both cases are also logged as warnings
/// and leave the scheduler unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// The owner is gone or does not implement the visual-update capability.
    #[error("owner {0:?} does not implement the pulse visual interface")]
    MissingVisualCapability(OwnerKey),
    /// `force_tick` was called while the automatic frame driver is active.
    #[error("forced tick requested but use_forced_tick is disabled")]
    ForcedTickDisabled,
}
