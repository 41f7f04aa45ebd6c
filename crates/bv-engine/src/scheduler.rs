//! Pulse scheduler: binds pulses to the clock and drives their values.
//!
//! Two external drivers feed a scheduler. The clock calls
//! `on_quantization` on every grid tick, which opens, advances and
//! retires pulses. The frame loop calls `tick` (or `force_tick`), which
//! eases each running pulse's output toward its target. Both run to
//! completion on the caller's thread and neither allocates.

use std::rc::Rc;

use bv_ir::{OwnerKey, PulseEntry, PulseRuntimeState, PulseSettings, PulseState};
use tracing::{debug, warn};

use crate::clock::{clock_name, ClockName, Quantization, QuantizationEvent, TempoSource};
use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::host::PulseHost;

/// Ticks added to a pulse's counter when it is forced to finish.
pub const FINISH_BEAT_JUMP: i32 = 1000;

/// Smoothing step applied on the opening tick.
const START_DELTA: f32 = 1.0;

/// Smoothing step applied when finishing; large enough to land on the target.
const FINISH_DELTA: f32 = 1000.0;

/// What `add_pulse` did with a valid request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new entry was appended.
    Added,
    /// An entry with the same identity was finished and replaced.
    Replaced,
    /// An entry with the same identity exists and `stop_if_exists` was set.
    AlreadyActive,
}

/// Beat-synchronized pulse scheduler. One per simulation context.
pub struct PulseScheduler {
    config: SchedulerConfig,
    /// Live pulses, in registration order.
    entries: Vec<PulseEntry>,
    /// Clock this scheduler listens to. `None` accepts every clock.
    clock: Option<ClockName>,
    tempo: Option<Rc<dyn TempoSource>>,
    /// Tempo-relative scale applied to frame deltas.
    delta_time_multiplier: f32,
    /// Beat within the bar of the last tick (0-based).
    current_beat: i32,
    /// Ticks accepted since subscribing; -1 before the first one.
    ticks_received: i64,
}

impl PulseScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            entries: Vec::new(),
            clock: None,
            tempo: None,
            delta_time_multiplier: 1.0,
            current_beat: 0,
            ticks_received: -1,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SchedulerConfig {
        &mut self.config
    }

    /// Listen to `clock` and read tempo from `tempo`. Resets the tick
    /// counters and returns the grid the clock should deliver on.
    pub fn subscribe(&mut self, clock: &str, tempo: Option<Rc<dyn TempoSource>>) -> Quantization {
        self.clock = Some(clock_name(clock));
        self.tempo = tempo;
        self.current_beat = 0;
        self.ticks_received = -1;
        if self.config.verbose_logs {
            debug!(clock, "subscribed to quantization");
        }
        Quantization::FINEST
    }

    /// Scale applied to frame deltas (bpm / reference bpm).
    pub fn tempo_multiplier(&self) -> f32 {
        self.delta_time_multiplier
    }

    pub fn current_beat(&self) -> i32 {
        self.current_beat
    }

    pub fn ticks_received(&self) -> i64 {
        self.ticks_received
    }

    pub fn entries(&self) -> &[PulseEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the pulse `(index, index_filter)` on `owner`.
    pub fn find(&self, index: i32, index_filter: i32, owner: OwnerKey) -> Option<&PulseEntry> {
        self.entries.iter().find(|e| e.matches(index, index_filter, owner))
    }

    // --- Management ---

    /// Register a pulse on `owner`.
    ///
    /// `beat_duration` is clamped to at least 1 and `beat_offset` to at
    /// least 0. If the owner already has a pulse with the same index and
    /// filter, it is kept when `stop_if_exists` is set, otherwise it is
    /// finished (its owner sees the terminal callback) and replaced.
    pub fn add_pulse<H: PulseHost + ?Sized>(
        &mut self,
        host: &mut H,
        owner: OwnerKey,
        settings: PulseSettings,
        beat_duration: i32,
        beat_offset: i32,
        stop_if_exists: bool,
    ) -> Result<AddOutcome, SchedulerError> {
        if !host.supports_visuals(owner) {
            warn!(?owner, pulse = %settings, "owner does not implement the pulse visual interface");
            return Err(SchedulerError::MissingVisualCapability(owner));
        }

        let entry = PulseEntry::new(settings, PulseRuntimeState::new(owner, beat_duration, beat_offset));
        let existing = self.entries.iter().position(|e| e.same_slot(&entry));

        match existing {
            Some(_) if stop_if_exists => Ok(AddOutcome::AlreadyActive),
            Some(i) => {
                if self.config.verbose_logs {
                    debug!(owner = host.owner_name(owner).unwrap_or("?"), pulse = %entry, "replace pulse");
                }
                finish_entry(&mut self.entries[i], host, &self.config);
                self.entries[i] = entry;
                Ok(AddOutcome::Replaced)
            }
            None => {
                if self.config.verbose_logs {
                    debug!(owner = host.owner_name(owner).unwrap_or("?"), pulse = %entry, "add pulse");
                }
                self.entries.push(entry);
                Ok(AddOutcome::Added)
            }
        }
    }

    /// Finish and remove the pulse `(index, index_filter)` on `owner`.
    pub fn remove_from_owner<H: PulseHost + ?Sized>(
        &mut self,
        host: &mut H,
        index: i32,
        index_filter: i32,
        owner: OwnerKey,
    ) -> usize {
        self.drain_where(host, |e| e.matches(index, index_filter, owner))
    }

    /// Finish and remove every pulse on `owner` whose filter is not in
    /// `exclude_filters`.
    pub fn remove_all_from_owner<H: PulseHost + ?Sized>(
        &mut self,
        host: &mut H,
        owner: OwnerKey,
        exclude_filters: &[i32],
    ) -> usize {
        self.drain_where(host, |e| {
            e.owner() == owner && !exclude_filters.contains(&e.settings.index_filter)
        })
    }

    /// Finish and remove every pulse.
    pub fn remove_all<H: PulseHost + ?Sized>(&mut self, host: &mut H) -> usize {
        self.drain_where(host, |_| true)
    }

    /// Finish and drop matching entries in one in-order pass. Returns
    /// how many were removed.
    fn drain_where<H, F>(&mut self, host: &mut H, mut matches: F) -> usize
    where
        H: PulseHost + ?Sized,
        F: FnMut(&PulseEntry) -> bool,
    {
        let config = &self.config;
        let before = self.entries.len();
        self.entries.retain_mut(|entry| {
            if !matches(entry) {
                return true;
            }
            finish_entry(entry, host, config);
            false
        });
        before - self.entries.len()
    }

    // --- Clock ---

    /// Handle one grid tick from the clock.
    ///
    /// Pulses whose window opens on this tick get their Start callback
    /// with the opening value already computed. Pulses that reached full
    /// progress, or whose owner is gone, are finished and removed.
    /// Every other pulse advances one tick.
    pub fn on_quantization<H: PulseHost + ?Sized>(&mut self, host: &mut H, event: &QuantizationEvent) {
        if let Some(clock) = &self.clock {
            if *clock != event.clock_name {
                if self.config.verbose_logs {
                    debug!(clock = event.clock_name.as_str(), "ignoring tick from another clock");
                }
                return;
            }
        }

        self.current_beat = event.beat - 1;
        self.ticks_received += 1;
        self.delta_time_multiplier = match &self.tempo {
            Some(tempo) if self.config.reference_bpm > 0.0 => {
                tempo.beats_per_minute() / self.config.reference_bpm
            }
            _ => 1.0,
        };

        if self.config.verbose_logs {
            debug!(beat = self.current_beat, tick = self.ticks_received, "visual beat count");
        }

        let config = &self.config;
        self.entries.retain_mut(|entry| {
            let owner = entry.owner();
            if entry.runtime.is_opening_tick() && host.is_valid(owner) {
                entry.update_value(START_DELTA);
                entry.state = PulseState::Start;
                host.on_visual_update(owner, entry);
            }

            if entry.beat_progress() >= 1.0 || !host.is_valid(owner) {
                finish_entry(entry, host, config);
                return false;
            }

            entry.runtime.current_beat_count += 1;
            true
        });
    }

    // --- Frames ---

    /// Automatic per-frame update. Does nothing when `use_forced_tick` is set.
    pub fn tick<H: PulseHost + ?Sized>(&mut self, host: &mut H, delta_seconds: f32) {
        if !self.config.use_forced_tick {
            self.update_entries(host, delta_seconds);
        }
    }

    /// Manual per-frame update for hosts that drive frames themselves.
    /// Only allowed when `use_forced_tick` is set.
    pub fn force_tick<H: PulseHost + ?Sized>(
        &mut self,
        host: &mut H,
        delta_seconds: f32,
    ) -> Result<(), SchedulerError> {
        if !self.config.use_forced_tick {
            warn!("trying to force tick pulse visuals without use_forced_tick enabled");
            return Err(SchedulerError::ForcedTickDisabled);
        }
        self.update_entries(host, delta_seconds);
        Ok(())
    }

    /// Ease every started pulse toward its target and report it.
    fn update_entries<H: PulseHost + ?Sized>(&mut self, host: &mut H, delta_seconds: f32) {
        if host.is_paused() {
            return;
        }

        let step = delta_seconds * self.delta_time_multiplier;
        for entry in &mut self.entries {
            let owner = entry.owner();
            if entry.state == PulseState::ReadyToStart || !host.is_valid(owner) {
                continue;
            }
            entry.update_value(step);
            entry.state = PulseState::Updating;
            host.on_visual_update(owner, entry);
        }
    }
}

impl Default for PulseScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

/// Saturate a pulse and send its terminal callback.
///
/// The counter jumps far enough that progress reads 1.0 whatever the
/// duration, and the output lands on its final target in one step. The
/// callback is skipped when the owner is already gone.
fn finish_entry<H: PulseHost + ?Sized>(entry: &mut PulseEntry, host: &mut H, config: &SchedulerConfig) {
    let owner = entry.owner();
    let live = host.is_valid(owner);

    if live && config.start_skipped_pulses && entry.state == PulseState::ReadyToStart {
        entry.runtime.current_beat_count = entry.runtime.beat_offset;
        entry.update_value(START_DELTA);
        entry.state = PulseState::Start;
        host.on_visual_update(owner, entry);
    }

    let runtime = &mut entry.runtime;
    let window_end = runtime.beat_offset.saturating_add(runtime.beat_duration);
    runtime.current_beat_count = runtime
        .current_beat_count
        .saturating_add(FINISH_BEAT_JUMP)
        .max(window_end);
    entry.update_value(FINISH_DELTA);
    entry.state = PulseState::Finished;

    if !live {
        if config.verbose_logs {
            debug!(pulse = %entry, "finish pulse of a missing owner");
        }
        return;
    }
    if config.verbose_logs {
        debug!(owner = host.owner_name(owner).unwrap_or("?"), pulse = %entry, "finish pulse");
    }
    host.on_visual_update(owner, entry);
}
