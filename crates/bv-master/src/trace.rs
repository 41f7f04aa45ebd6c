//! Recorded callbacks of a scenario run.

use std::fmt;

use bv_engine::{PulseEntry, PulseState};
use bv_ir::PulsePayload;

/// One visual update as seen by an actor.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceRecord {
    /// Last quantization tick delivered when the callback fired (-1 before the first).
    pub tick: i64,
    /// Clock time in seconds.
    pub seconds: f64,
    pub actor: String,
    pub label: String,
    pub index: i32,
    pub index_filter: i32,
    pub state: PulseState,
    pub progress: f32,
    pub value: f32,
    pub payload: PulsePayload,
}

impl TraceRecord {
    pub fn new(tick: i64, seconds: f64, actor: String, entry: &PulseEntry) -> Self {
        Self {
            tick,
            seconds,
            actor,
            label: entry.settings.label.to_string(),
            index: entry.settings.index,
            index_filter: entry.settings.index_filter,
            state: entry.state,
            progress: entry.normalized_progress,
            value: entry.out_value,
            payload: entry.settings.payload,
        }
    }
}

impl fmt::Display for TraceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tick {:>4} {:>8.3}s  {:<12} {} [{}/{}] {:<12} progress={:.3} value={:.3}",
            self.tick,
            self.seconds,
            self.actor,
            self.label,
            self.index,
            self.index_filter,
            format!("{:?}", self.state),
            self.progress,
            self.value,
        )
    }
}

/// Everything a scenario run produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trace {
    pub records: Vec<TraceRecord>,
    /// Quantization ticks delivered.
    pub ticks: i64,
    /// Frame updates delivered.
    pub frames: usize,
    /// Cues the scheduler refused.
    pub rejected: usize,
}

impl Trace {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records of one actor, in order.
    pub fn for_actor<'a>(&'a self, actor: &'a str) -> impl Iterator<Item = &'a TraceRecord> + 'a {
        self.records.iter().filter(move |r| r.actor == actor)
    }

    /// Records of one pulse on one actor, in order.
    pub fn for_pulse<'a>(
        &'a self,
        actor: &'a str,
        index: i32,
        index_filter: i32,
    ) -> impl Iterator<Item = &'a TraceRecord> + 'a {
        self.for_actor(actor)
            .filter(move |r| r.index == index && r.index_filter == index_filter)
    }

    pub fn count_state(&self, state: PulseState) -> usize {
        self.records.iter().filter(|r| r.state == state).count()
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for record in &self.records {
            writeln!(f, "{}", record)?;
        }
        write!(
            f,
            "{} callbacks, {} ticks, {} frames, {} rejected",
            self.records.len(),
            self.ticks,
            self.frames,
            self.rejected
        )
    }
}
