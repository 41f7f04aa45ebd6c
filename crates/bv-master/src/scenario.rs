//! TOML scenario description.
//!
//! A scenario names a clock, a scheduler configuration, how long to run
//! and at what frame rate, the actors in the world, and the actions to
//! apply on given quantization ticks.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use bv_engine::{PulseSettings, SchedulerConfig};
use bv_ir::ResponseCurve;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to load or validate a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// The file could not be read.
    #[error("failed to read scenario {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The text is not a valid scenario.
    #[error("invalid scenario: {0}")]
    Parse(#[from] toml::de::Error),
    /// An action refers to an actor the scenario does not declare.
    #[error("unknown actor `{0}`")]
    UnknownActor(String),
    /// Two actors share a name.
    #[error("actor `{0}` is declared more than once")]
    DuplicateActor(String),
    /// Frame rate or run length out of range.
    #[error("invalid run settings: {0}")]
    InvalidRun(String),
    /// Tempo or time signature out of range.
    #[error("invalid clock settings: {0}")]
    InvalidClock(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    #[serde(default = "ClockConfig::default_name")]
    pub name: String,
    #[serde(default = "ClockConfig::default_bpm")]
    pub bpm: f32,
    #[serde(default = "ClockConfig::default_beats_per_bar")]
    pub beats_per_bar: u32,
}

impl ClockConfig {
    fn default_name() -> String {
        "main".to_owned()
    }
    fn default_bpm() -> f32 {
        120.0
    }
    fn default_beats_per_bar() -> u32 {
        4
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            name: Self::default_name(),
            bpm: Self::default_bpm(),
            beats_per_bar: Self::default_beats_per_bar(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Frames per second of the simulated host.
    #[serde(default = "RunConfig::default_frame_rate")]
    pub frame_rate: f64,
    /// Length of the run in seconds.
    #[serde(default = "RunConfig::default_seconds")]
    pub seconds: f64,
}

impl RunConfig {
    fn default_frame_rate() -> f64 {
        60.0
    }
    fn default_seconds() -> f64 {
        4.0
    }

    /// Number of frames the run covers.
    pub fn frame_count(&self) -> usize {
        (self.seconds * self.frame_rate).round().max(0.0) as usize
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            frame_rate: Self::default_frame_rate(),
            seconds: Self::default_seconds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorSpec {
    pub name: String,
    /// Whether the actor receives pulse updates.
    #[serde(default = "ActorSpec::default_visual")]
    pub visual: bool,
}

impl ActorSpec {
    fn default_visual() -> bool {
        true
    }
}

/// Register a pulse (`add_pulse`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CueSpec {
    pub at_tick: i64,
    pub actor: String,
    #[serde(default)]
    pub pulse: PulseSettings,
    #[serde(default = "CueSpec::default_beat_duration")]
    pub beat_duration: i32,
    #[serde(default)]
    pub beat_offset: i32,
    #[serde(default)]
    pub stop_if_exists: bool,
}

impl CueSpec {
    fn default_beat_duration() -> i32 {
        1
    }
}

/// Finish one pulse (`remove_from_owner`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelSpec {
    pub at_tick: i64,
    pub actor: String,
    #[serde(default)]
    pub index: i32,
    #[serde(default)]
    pub index_filter: i32,
}

/// Finish every pulse of an actor (`remove_all_from_owner`), or of the
/// whole world when `actor` is omitted (`remove_all`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearSpec {
    pub at_tick: i64,
    #[serde(default)]
    pub actor: Option<String>,
    #[serde(default)]
    pub exclude_filters: Vec<i32>,
}

/// Remove an actor from the world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DespawnSpec {
    pub at_tick: i64,
    pub actor: String,
}

/// Change the clock tempo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TempoChange {
    pub at_tick: i64,
    pub bpm: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub actors: Vec<ActorSpec>,
    #[serde(default)]
    pub cues: Vec<CueSpec>,
    #[serde(default)]
    pub cancels: Vec<CancelSpec>,
    #[serde(default)]
    pub clears: Vec<ClearSpec>,
    #[serde(default)]
    pub despawns: Vec<DespawnSpec>,
    #[serde(default)]
    pub tempo_changes: Vec<TempoChange>,
}

impl Scenario {
    /// Parse and validate a scenario.
    pub fn from_toml_str(text: &str) -> Result<Self, ScenarioError> {
        let mut scenario: Scenario = toml::from_str(text)?;
        // Curve points may be written in any order.
        for cue in &mut scenario.cues {
            if let Some(curve) = &cue.pulse.curve {
                cue.pulse.curve = Some(ResponseCurve::from_points(&curve.points));
            }
        }
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check actor names, clock and run settings.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if !(self.clock.bpm.is_finite() && self.clock.bpm > 0.0) {
            return Err(ScenarioError::InvalidClock(format!("bpm {}", self.clock.bpm)));
        }
        if self.clock.beats_per_bar == 0 {
            return Err(ScenarioError::InvalidClock("beats_per_bar 0".to_owned()));
        }
        if !(self.run.frame_rate.is_finite() && self.run.frame_rate > 0.0) {
            return Err(ScenarioError::InvalidRun(format!("frame_rate {}", self.run.frame_rate)));
        }
        if !(self.run.seconds.is_finite() && self.run.seconds >= 0.0) {
            return Err(ScenarioError::InvalidRun(format!("seconds {}", self.run.seconds)));
        }

        let mut names = HashSet::new();
        for actor in &self.actors {
            if !names.insert(actor.name.as_str()) {
                return Err(ScenarioError::DuplicateActor(actor.name.clone()));
            }
        }

        let referenced = self
            .cues
            .iter()
            .map(|c| c.actor.as_str())
            .chain(self.cancels.iter().map(|c| c.actor.as_str()))
            .chain(self.clears.iter().filter_map(|c| c.actor.as_deref()))
            .chain(self.despawns.iter().map(|d| d.actor.as_str()));
        for name in referenced {
            if !names.contains(name) {
                return Err(ScenarioError::UnknownActor(name.to_owned()));
            }
        }
        Ok(())
    }

    pub fn actor(&self, name: &str) -> Option<&ActorSpec> {
        self.actors.iter().find(|a| a.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bv_ir::CurveKind;

    #[test]
    fn empty_scenario_uses_defaults() {
        let s = Scenario::from_toml_str("").unwrap();
        assert_eq!(s.clock.name, "main");
        assert_eq!(s.clock.bpm, 120.0);
        assert_eq!(s.clock.beats_per_bar, 4);
        assert_eq!(s.run.frame_rate, 60.0);
        assert_eq!(s.run.frame_count(), 240);
        assert_eq!(s.scheduler, SchedulerConfig::default());
        assert!(s.actors.is_empty());
    }

    #[test]
    fn cue_defaults() {
        let s = Scenario::from_toml_str(
            r#"
            [[actors]]
            name = "lamp"

            [[cues]]
            at_tick = 2
            actor = "lamp"
            "#,
        )
        .unwrap();
        assert!(s.actors[0].visual);
        let cue = &s.cues[0];
        assert_eq!(cue.at_tick, 2);
        assert_eq!(cue.beat_duration, 1);
        assert_eq!(cue.beat_offset, 0);
        assert!(!cue.stop_if_exists);
        assert_eq!(cue.pulse, PulseSettings::default());
    }

    #[test]
    fn full_pulse_settings() {
        let s = Scenario::from_toml_str(
            r#"
            [scheduler]
            verbose_logs = true
            reference_bpm = 100.0

            [[actors]]
            name = "lamp"

            [[cues]]
            at_tick = 0
            actor = "lamp"
            beat_duration = 8

            [cues.pulse]
            label = "sweep"
            index = 3
            index_filter = 1
            interp_speed = 4.0
            out_range = { min = 10.0, max = 20.0 }
            payload = { float = 0.5, int = 7, vector = { x = 1.0, y = 2.0, z = 3.0 } }

            [cues.pulse.curve]
            points = [
                { time = 1.0, value = 1.0 },
                { time = 0.0, value = 0.0, kind = "sine_quarter" },
            ]
            "#,
        )
        .unwrap();

        assert!(s.scheduler.verbose_logs);
        assert_eq!(s.scheduler.reference_bpm, 100.0);
        let pulse = &s.cues[0].pulse;
        assert_eq!(pulse.label.as_str(), "sweep");
        assert_eq!((pulse.index, pulse.index_filter), (3, 1));
        assert_eq!(pulse.out_range.max, 20.0);
        assert_eq!(pulse.payload.int, 7);
        assert_eq!(pulse.payload.vector.z, 3.0);

        let curve = pulse.curve.as_ref().unwrap();
        assert_eq!(curve.points[0].time, 0.0);
        assert_eq!(curve.points[0].kind, CurveKind::SineQuarter);
        assert_eq!(curve.points[1].kind, CurveKind::Linear);
    }

    #[test]
    fn unknown_actor_is_rejected() {
        let err = Scenario::from_toml_str(
            r#"
            [[cancels]]
            at_tick = 0
            actor = "ghost"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ScenarioError::UnknownActor(name) if name == "ghost"));
    }

    #[test]
    fn duplicate_actor_is_rejected() {
        let err = Scenario::from_toml_str(
            r#"
            [[actors]]
            name = "lamp"
            [[actors]]
            name = "lamp"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ScenarioError::DuplicateActor(_)));
    }

    #[test]
    fn actor_lookup_by_name() {
        let s = Scenario::from_toml_str(
            r#"
            [[actors]]
            name = "lamp"
            [[actors]]
            name = "rock"
            visual = false
            "#,
        )
        .unwrap();
        assert!(s.actor("lamp").unwrap().visual);
        assert!(!s.actor("rock").unwrap().visual);
        assert!(s.actor("ghost").is_none());
    }

    #[test]
    fn world_wide_clear_needs_no_actor() {
        let s = Scenario::from_toml_str(
            r#"
            [[clears]]
            at_tick = 5
            "#,
        )
        .unwrap();
        assert!(s.clears[0].actor.is_none());
    }

    #[test]
    fn bad_frame_rate_is_rejected() {
        let err = Scenario::from_toml_str("[run]\nframe_rate = 0.0\n").unwrap_err();
        assert!(matches!(err, ScenarioError::InvalidRun(_)));
    }

    #[test]
    fn bad_tempo_is_rejected() {
        for bpm in ["0.0", "-120.0", "nan"] {
            let err = Scenario::from_toml_str(&format!("[clock]\nbpm = {}\n", bpm)).unwrap_err();
            assert!(matches!(err, ScenarioError::InvalidClock(_)), "bpm {} accepted", bpm);
        }
        let err = Scenario::from_toml_str("[clock]\nbeats_per_bar = 0\n").unwrap_err();
        assert!(matches!(err, ScenarioError::InvalidClock(_)));
    }

    #[test]
    fn syntax_errors_surface_as_parse() {
        let err = Scenario::from_toml_str("[[actors]\nname =").unwrap_err();
        assert!(matches!(err, ScenarioError::Parse(_)));
    }

    #[test]
    fn missing_file_is_io() {
        let err = Scenario::load("/nonexistent/scenario.toml").unwrap_err();
        assert!(matches!(err, ScenarioError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/scenario.toml"));
    }
}
