//! Core pulse types for beatviz.
//!
//! This crate defines the data shared by the scheduler, the clock and
//! any host that receives visual updates: pulse settings, response
//! curves, per-instance runtime state and the entry snapshot handed to
//! owners on every callback.
//!
//! Designed to be `no_std` compatible; nothing here allocates.

#![cfg_attr(not(feature = "std"), no_std)]

mod curve;
mod entry;
mod payload;
mod runtime;
mod settings;

pub use curve::{interpolate, CurveKind, CurvePoint, ResponseCurve, MAX_CURVE_POINTS};
pub use entry::{interp_to, PulseEntry, PulseState};
pub use payload::{PulsePayload, Vec3};
pub use runtime::{OwnerKey, PulseRuntimeState};
pub use settings::{OutRange, PulseKey, PulseSettings, MAX_LABEL_LEN};
