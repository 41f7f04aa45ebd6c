//! Shared tempo handle.

use std::cell::Cell;

use bv_engine::TempoSource;

/// Tempo shared between a clock and its listeners.
///
/// The clock owns an `Rc<SharedTempo>` and hands clones to schedulers,
/// so a tempo change is seen by everyone on the next query.
#[derive(Debug)]
pub struct SharedTempo {
    bpm: Cell<f32>,
}

impl SharedTempo {
    pub fn new(bpm: f32) -> Self {
        Self { bpm: Cell::new(bpm) }
    }

    pub fn get(&self) -> f32 {
        self.bpm.get()
    }

    pub fn set(&self, bpm: f32) {
        self.bpm.set(bpm);
    }
}

impl TempoSource for SharedTempo {
    fn beats_per_minute(&self) -> f32 {
        self.bpm.get()
    }
}
