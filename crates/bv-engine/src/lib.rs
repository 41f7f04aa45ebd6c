//! Pulse scheduler for beatviz.
//!
//! Binds pulses to a musical clock: grid ticks open, advance and retire
//! pulses, and frame ticks ease their output values. Entities are
//! reached through the `PulseHost` trait; `World` is a ready-made host.

mod clock;
mod config;
mod error;
mod host;
pub mod scheduler;
mod world;

pub use clock::{clock_name, ClockName, Quantization, QuantizationEvent, TempoSource, MAX_CLOCK_NAME_LEN};
pub use config::{SchedulerConfig, DEFAULT_REFERENCE_BPM};
pub use error::SchedulerError;
pub use host::{PulseHost, PulseVisual};
pub use scheduler::{AddOutcome, PulseScheduler, FINISH_BEAT_JUMP};
pub use world::{Actor, World};

// Re-export the pulse types so hosts don't need bv-ir directly.
pub use bv_ir::{OwnerKey, PulseEntry, PulseSettings, PulseState};
