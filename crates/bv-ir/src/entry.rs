//! The pulse entry: settings, counters and the values owners consume.

use core::fmt;

use crate::runtime::{OwnerKey, PulseRuntimeState};
use crate::settings::{PulseKey, PulseSettings};

/// Squared distance under which `interp_to` snaps to its target.
const SNAP_DISTANCE_SQ: f32 = 1e-8;

/// Lifecycle of a pulse. Only ever moves forward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum PulseState {
    /// Registered, window not yet open.
    #[default]
    ReadyToStart,
    /// The opening tick fired this pulse.
    Start,
    /// Receiving per-frame value updates.
    Updating,
    /// Terminated; the entry is about to be dropped.
    Finished,
}

/// Move `current` toward `target` at `speed` per second over `dt` seconds.
///
/// Non-positive speeds snap straight to the target, as do distances too
/// small to matter. The step fraction is clamped to 1, so a large `dt`
/// lands exactly on the target.
pub fn interp_to(current: f32, target: f32, dt: f32, speed: f32) -> f32 {
    if speed <= 0.0 {
        return target;
    }
    let dist = target - current;
    if dist * dist < SNAP_DISTANCE_SQ {
        return target;
    }
    current + dist * (dt * speed).clamp(0.0, 1.0)
}

/// A registered pulse as seen by its owner.
#[derive(Clone, Debug, PartialEq)]
pub struct PulseEntry {
    pub settings: PulseSettings,
    pub runtime: PulseRuntimeState,
    pub state: PulseState,
    /// Beat progress in [0, 1] as of the last value update.
    pub normalized_progress: f32,
    /// Smoothed, remapped output.
    pub out_value: f32,
}

impl PulseEntry {
    /// A fresh entry waiting for its window to open.
    pub fn new(settings: PulseSettings, runtime: PulseRuntimeState) -> Self {
        Self {
            settings,
            runtime,
            state: PulseState::ReadyToStart,
            normalized_progress: 0.0,
            out_value: 0.0,
        }
    }

    pub fn owner(&self) -> OwnerKey {
        self.runtime.owner
    }

    pub fn key(&self) -> PulseKey {
        self.settings.key()
    }

    /// Current beat progress (not the cached `normalized_progress`).
    pub fn beat_progress(&self) -> f32 {
        self.runtime.progress()
    }

    pub fn beats_remaining(&self) -> f32 {
        self.runtime.beats_remaining()
    }

    /// Whether this entry is the pulse `(index, index_filter)` on `owner`.
    pub fn matches(&self, index: i32, index_filter: i32, owner: OwnerKey) -> bool {
        self.settings.index == index
            && self.settings.index_filter == index_filter
            && self.runtime.owner == owner
    }

    /// Whether both entries occupy the same identity slot.
    pub fn same_slot(&self, other: &PulseEntry) -> bool {
        other.matches(self.settings.index, self.settings.index_filter, self.runtime.owner)
    }

    /// The target value for the current progress, before smoothing.
    pub fn target_value(&self) -> f32 {
        let progress = self.normalized_progress;
        let range = &self.settings.out_range;
        match &self.settings.curve {
            Some(curve) => {
                let shaped = curve.evaluate(progress);
                if range.is_unit() { shaped } else { range.lerp(shaped) }
            }
            None if !range.is_unit() => range.lerp(progress),
            None => progress,
        }
    }

    /// Refresh progress and ease the output toward its target.
    /// Timing-only pulses (`use_value == false`) are left untouched.
    pub fn update_value(&mut self, dt: f32) {
        if !self.settings.use_value {
            return;
        }
        self.normalized_progress = self.runtime.progress();
        let target = self.target_value();
        self.out_value = interp_to(self.out_value, target, dt, self.settings.interp_speed);
    }
}

impl fmt::Display for PulseEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Value: {:.2}", self.settings, self.out_value)
    }
}
