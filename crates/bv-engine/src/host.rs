//! Owner-side contracts.
//!
//! The scheduler only holds `OwnerKey`s. Everything it needs to know
//! about the entities behind them goes through `PulseHost`, and the
//! entities themselves see pulses through `PulseVisual`.

use bv_ir::{OwnerKey, PulseEntry};

/// Visual-update capability of an entity.
///
/// Called when a pulse starts, on every frame while it runs, and once
/// when it finishes. The entry is a read-only snapshot.
pub trait PulseVisual {
    fn on_visual_update(&mut self, entry: &PulseEntry);
}

impl<F> PulseVisual for F
where
    F: FnMut(&PulseEntry),
{
    fn on_visual_update(&mut self, entry: &PulseEntry) {
        self(entry)
    }
}

/// The entity store a scheduler reports into.
pub trait PulseHost {
    /// Whether `owner` still names a live entity.
    fn is_valid(&self, owner: OwnerKey) -> bool;

    /// Whether `owner` is live and implements `PulseVisual`.
    fn supports_visuals(&self, owner: OwnerKey) -> bool;

    /// Deliver an update to `owner`. Unknown owners are ignored.
    fn on_visual_update(&mut self, owner: OwnerKey, entry: &PulseEntry);

    /// A paused host receives no frame updates.
    fn is_paused(&self) -> bool {
        false
    }

    /// Human-readable name for diagnostics.
    fn owner_name(&self, _owner: OwnerKey) -> Option<&str> {
        None
    }
}
