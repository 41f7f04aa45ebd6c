//! Per-instance beat counters of a pulse.

slotmap::new_key_type! {
    /// Generation-checked handle to the entity that owns a pulse.
    ///
    /// A key outlives the entity it names; the host decides whether it is
    /// still valid before any callback is made.
    pub struct OwnerKey;
}

/// Mutable timing state of a registered pulse.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PulseRuntimeState {
    /// Entity the pulse reports to. Observed, never owned.
    pub owner: OwnerKey,
    /// Quantization ticks counted since registration.
    pub current_beat_count: i32,
    /// Ticks to wait before the pulse window opens.
    pub beat_offset: i32,
    /// Length of the pulse window in ticks. Always at least 1.
    pub beat_duration: i32,
}

impl PulseRuntimeState {
    /// Create counters for a new pulse. The offset is clamped to zero and
    /// the duration to one so the progress formula is always defined.
    pub fn new(owner: OwnerKey, beat_duration: i32, beat_offset: i32) -> Self {
        Self {
            owner,
            current_beat_count: 0,
            beat_offset: beat_offset.max(0),
            beat_duration: beat_duration.max(1),
        }
    }

    /// Ticks elapsed inside the window, clamped to `0..=beat_duration`.
    fn elapsed(&self) -> i32 {
        self.current_beat_count
            .saturating_sub(self.beat_offset)
            .clamp(0, self.beat_duration)
    }

    /// Completion of the window in [0, 1].
    pub fn progress(&self) -> f32 {
        self.elapsed() as f32 / self.beat_duration as f32
    }

    /// Ticks left until the window closes, as a non-positive number
    /// (0 once finished, `-beat_duration` before it opens).
    pub fn beats_remaining(&self) -> f32 {
        (self.elapsed() - self.beat_duration) as f32
    }

    /// Whether this tick is the one that opens the window.
    pub fn is_opening_tick(&self) -> bool {
        self.current_beat_count.saturating_sub(self.beat_offset) == 0
    }
}
