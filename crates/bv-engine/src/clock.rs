//! Clock contract: quantization events and tempo queries.
//!
//! The scheduler does not keep time itself. A clock (an audio metronome
//! in a real host, `bv_clock::Metronome` offline) delivers one
//! `QuantizationEvent` per crossed grid line and answers tempo queries.

use arrayvec::ArrayString;

/// Maximum length of a clock name.
pub const MAX_CLOCK_NAME_LEN: usize = 32;

/// Fixed-capacity clock identifier, so events can be built without allocating.
pub type ClockName = ArrayString<MAX_CLOCK_NAME_LEN>;

/// Build a `ClockName`, truncating names that do not fit.
pub fn clock_name(name: &str) -> ClockName {
    let mut out = ClockName::new();
    for c in name.chars() {
        if out.try_push(c).is_err() {
            break;
        }
    }
    out
}

/// Grid a clock can report on, finest first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Quantization {
    #[default]
    ThirtySecondNote,
    SixteenthNote,
    EighthNote,
    QuarterNote,
    HalfNote,
    WholeNote,
    /// One event per bar, whatever the time signature.
    Bar,
}

impl Quantization {
    /// The grid pulses subscribe at: the smallest unit a clock offers.
    pub const FINEST: Quantization = Quantization::ThirtySecondNote;

    /// Length of one grid step in beats (a beat is a quarter note).
    pub fn beats(self, beats_per_bar: u32) -> f64 {
        match self {
            Quantization::ThirtySecondNote => 0.125,
            Quantization::SixteenthNote => 0.25,
            Quantization::EighthNote => 0.5,
            Quantization::QuarterNote => 1.0,
            Quantization::HalfNote => 2.0,
            Quantization::WholeNote => 4.0,
            Quantization::Bar => beats_per_bar.max(1) as f64,
        }
    }
}

/// One clock event, delivered on every crossed grid line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuantizationEvent {
    /// Which clock fired.
    pub clock_name: ClockName,
    /// Grid the event was produced on.
    pub quantization: Quantization,
    /// Bar number, 1-based.
    pub num_bars: i32,
    /// Beat within the bar, 1-based.
    pub beat: i32,
    /// Position inside the beat, 0.0..1.0.
    pub beat_fraction: f32,
}

/// Anything that can report the current tempo.
pub trait TempoSource {
    fn beats_per_minute(&self) -> f32;
}

impl TempoSource for f32 {
    fn beats_per_minute(&self) -> f32 {
        *self
    }
}
