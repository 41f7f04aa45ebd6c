//! Per-scheduler settings.

/// Tempo at which frame smoothing runs at wall-clock rate.
pub const DEFAULT_REFERENCE_BPM: f32 = 120.0;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SchedulerConfig {
    /// Emit debug traces on add/remove/finish and on every tick.
    #[cfg_attr(feature = "serde", serde(default))]
    pub verbose_logs: bool,
    /// Frames are driven by `force_tick` instead of `tick`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub use_forced_tick: bool,
    /// Tempo that maps to a smoothing multiplier of 1.0.
    #[cfg_attr(feature = "serde", serde(default = "SchedulerConfig::default_reference_bpm"))]
    pub reference_bpm: f32,
    /// Fire a Start callback before Finish when a pulse is cancelled
    /// before its window opened.
    #[cfg_attr(feature = "serde", serde(default))]
    pub start_skipped_pulses: bool,
}

impl SchedulerConfig {
    fn default_reference_bpm() -> f32 {
        DEFAULT_REFERENCE_BPM
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            verbose_logs: false,
            use_forced_tick: false,
            reference_bpm: Self::default_reference_bpm(),
            start_skipped_pulses: false,
        }
    }
}
