//! Metronome: a tempo-driven source of quantization events.

use std::rc::Rc;

use bv_engine::{clock_name, ClockName, Quantization, QuantizationEvent, DEFAULT_REFERENCE_BPM};
use tracing::{debug, warn};

use crate::tempo::SharedTempo;

/// Slack when comparing grid lines against the playhead, in beats.
const GRID_EPSILON: f64 = 1e-9;

/// Offline clock. Advance it by wall time and it reports every grid
/// line crossed, in order, with bar/beat/fraction filled in.
///
/// The playhead and grid are tracked in beats, so a tempo change takes
/// effect on the next `advance` without shifting the grid.
pub struct Metronome {
    name: ClockName,
    tempo: Rc<SharedTempo>,
    beats_per_bar: u32,
    resolution: Quantization,
    /// Playhead in beats since `start`.
    position: f64,
    /// Beat position of the next grid line to report.
    next_line: f64,
    running: bool,
}

impl Metronome {
    /// A stopped metronome at `bpm` with `beats_per_bar` beats per bar
    /// (at least 1), reporting on the finest grid. An invalid tempo falls
    /// back to the reference 120 BPM.
    pub fn new(name: &str, bpm: f32, beats_per_bar: u32) -> Self {
        let bpm = if valid_bpm(bpm) {
            bpm
        } else {
            warn!(clock = name, bpm, "invalid initial tempo, using {}", DEFAULT_REFERENCE_BPM);
            DEFAULT_REFERENCE_BPM
        };
        Self {
            name: clock_name(name),
            tempo: Rc::new(SharedTempo::new(bpm)),
            beats_per_bar: beats_per_bar.max(1),
            resolution: Quantization::FINEST,
            position: 0.0,
            next_line: 0.0,
            running: false,
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Handle to the tempo, for listeners that need `TempoSource`.
    pub fn tempo(&self) -> Rc<SharedTempo> {
        self.tempo.clone()
    }

    pub fn bpm(&self) -> f32 {
        self.tempo.get()
    }

    /// Change the tempo. Non-positive or non-finite values are ignored.
    pub fn set_bpm(&mut self, bpm: f32) {
        if !valid_bpm(bpm) {
            warn!(clock = self.name(), bpm, "ignoring invalid tempo");
            return;
        }
        self.tempo.set(bpm);
    }

    pub fn beats_per_bar(&self) -> u32 {
        self.beats_per_bar
    }

    pub fn resolution(&self) -> Quantization {
        self.resolution
    }

    /// Switch grids. The next reported line is the first one of the new
    /// grid at or after the playhead.
    pub fn set_resolution(&mut self, resolution: Quantization) {
        self.resolution = resolution;
        let step = self.step_beats();
        self.next_line = ((self.position / step) - GRID_EPSILON).ceil().max(0.0) * step;
    }

    /// Start from bar 1, beat 1. The downbeat is reported by the next `advance`.
    pub fn start(&mut self) {
        self.position = 0.0;
        self.next_line = 0.0;
        self.running = true;
        debug!(clock = self.name(), bpm = self.bpm(), "metronome started");
    }

    pub fn stop(&mut self) {
        self.running = false;
        debug!(clock = self.name(), beats = self.position, "metronome stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Playhead in beats since `start`.
    pub fn position_beats(&self) -> f64 {
        self.position
    }

    fn step_beats(&self) -> f64 {
        self.resolution.beats(self.beats_per_bar)
    }

    /// Move the playhead forward by `delta_seconds` and report every grid
    /// line reached, including one landing exactly on the new playhead.
    /// Returns the number of events emitted.
    pub fn advance<F>(&mut self, delta_seconds: f64, sink: &mut F) -> usize
    where
        F: FnMut(QuantizationEvent),
    {
        if !self.running {
            return 0;
        }
        if delta_seconds > 0.0 {
            self.position += delta_seconds * f64::from(self.tempo.get()) / 60.0;
        }

        let step = self.step_beats();
        let mut emitted = 0;
        while self.next_line <= self.position + GRID_EPSILON {
            sink(self.event_at(self.next_line));
            self.next_line += step;
            emitted += 1;
        }
        emitted
    }

    /// The event describing the grid line at `beats`.
    pub fn event_at(&self, beats: f64) -> QuantizationEvent {
        let per_bar = f64::from(self.beats_per_bar);
        let bar = (beats / per_bar).floor();
        let in_bar = beats - bar * per_bar;
        QuantizationEvent {
            clock_name: self.name,
            quantization: self.resolution,
            num_bars: bar as i32 + 1,
            beat: in_bar.floor() as i32 + 1,
            beat_fraction: beats.fract() as f32,
        }
    }
}

fn valid_bpm(bpm: f32) -> bool {
    bpm.is_finite() && bpm > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use bv_engine::TempoSource;

    fn collect(m: &mut Metronome, dt: f64) -> Vec<QuantizationEvent> {
        let mut out = Vec::new();
        m.advance(dt, &mut |e| out.push(e));
        out
    }

    #[test]
    fn stopped_metronome_is_silent() {
        let mut m = Metronome::new("main", 120.0, 4);
        assert!(!m.is_running());
        assert!(collect(&mut m, 1.0).is_empty());

        m.start();
        assert!(m.is_running());
        m.stop();
        assert!(!m.is_running());
        assert!(collect(&mut m, 1.0).is_empty());
    }

    #[test]
    fn invalid_initial_tempo_falls_back() {
        for bpm in [0.0, -120.0, f32::NAN, f32::INFINITY] {
            let mut m = Metronome::new("main", bpm, 4);
            assert_eq!(m.bpm(), 120.0);
            m.start();
            // One beat at 120 BPM: the downbeat plus eight 32nds.
            assert_eq!(collect(&mut m, 0.5).len(), 9);
        }
    }

    #[test]
    fn downbeat_fires_on_first_advance() {
        let mut m = Metronome::new("main", 120.0, 4);
        m.start();
        let events = collect(&mut m, 0.0);
        assert_eq!(events.len(), 1);
        let e = events[0];
        assert_eq!(e.clock_name.as_str(), "main");
        assert_eq!((e.num_bars, e.beat, e.beat_fraction), (1, 1, 0.0));
    }

    #[test]
    fn one_second_at_120_bpm_is_sixteen_thirty_seconds() {
        let mut m = Metronome::new("main", 120.0, 4);
        m.start();
        // Two beats: lines at 0, 0.125, ..., 2.0.
        assert_eq!(collect(&mut m, 1.0).len(), 17);
        assert_eq!(collect(&mut m, 0.0625).len(), 1);
        assert_eq!(m.position_beats(), 2.125);
    }

    #[test]
    fn small_frames_add_up_to_the_same_grid() {
        let mut m = Metronome::new("main", 120.0, 4);
        m.start();
        let mut total = 0;
        for _ in 0..60 {
            total += m.advance(1.0 / 60.0, &mut |_| {});
        }
        assert_eq!(total, 17);
    }

    #[test]
    fn bar_and_beat_arithmetic() {
        let m = Metronome::new("main", 120.0, 4);
        let e = m.event_at(1.0);
        assert_eq!((e.num_bars, e.beat, e.beat_fraction), (1, 2, 0.0));
        let e = m.event_at(4.125);
        assert_eq!((e.num_bars, e.beat, e.beat_fraction), (2, 1, 0.125));
        let e = m.event_at(7.5);
        assert_eq!((e.num_bars, e.beat, e.beat_fraction), (2, 4, 0.5));

        let waltz = Metronome::new("main", 120.0, 3);
        let e = waltz.event_at(3.0);
        assert_eq!((e.num_bars, e.beat), (2, 1));
    }

    #[test]
    fn tempo_change_through_shared_handle() {
        let mut m = Metronome::new("main", 120.0, 4);
        let handle = m.tempo();
        m.start();
        collect(&mut m, 0.0);
        m.set_bpm(240.0);
        assert_eq!(handle.beats_per_minute(), 240.0);
        assert_eq!(collect(&mut m, 0.5).len(), 16);
    }

    #[test]
    fn invalid_tempo_is_ignored() {
        let mut m = Metronome::new("main", 90.0, 4);
        m.set_bpm(0.0);
        m.set_bpm(f32::NAN);
        assert_eq!(m.bpm(), 90.0);
    }

    #[test]
    fn coarser_resolution() {
        let mut m = Metronome::new("main", 60.0, 4);
        m.set_resolution(Quantization::QuarterNote);
        m.start();
        let events = collect(&mut m, 4.0);
        let beats: Vec<i32> = events.iter().map(|e| e.beat).collect();
        assert_eq!(beats, vec![1, 2, 3, 4, 1]);
        assert!(events.iter().all(|e| e.quantization == Quantization::QuarterNote));
    }

    #[test]
    fn resolution_change_snaps_to_next_line() {
        let mut m = Metronome::new("main", 60.0, 4);
        m.start();
        collect(&mut m, 1.1);
        m.set_resolution(Quantization::QuarterNote);
        let events = collect(&mut m, 1.0);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].beat, 3);
    }
}
