//! Simulated quantization clock for beatviz.
//!
//! Stands in for an audio-driven metronome when running offline: it
//! turns elapsed seconds into grid events at the current tempo.

mod metronome;
mod tempo;

pub use metronome::Metronome;
pub use tempo::SharedTempo;
