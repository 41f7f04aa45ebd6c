//! Headless controller for beatviz.
//!
//! Runs a `Scenario` offline: a metronome drives the scheduler's
//! quantization handler, a fixed-rate frame loop drives its frame
//! handler, and every callback an actor receives is recorded in a
//! `Trace`.

mod scenario;
mod trace;

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use bv_clock::Metronome;
use bv_engine::{OwnerKey, PulseEntry, PulseScheduler, QuantizationEvent, TempoSource, World};
use tracing::{debug, info};

pub use scenario::{
    ActorSpec, CancelSpec, ClearSpec, ClockConfig, CueSpec, DespawnSpec, RunConfig, Scenario,
    ScenarioError, TempoChange,
};
pub use trace::{Trace, TraceRecord};

/// Callbacks waiting to be stamped into the trace.
type Inbox = Rc<RefCell<Vec<(String, PulseEntry)>>>;

/// Owns a world, a scheduler and a metronome, and plays a scenario
/// through them.
pub struct Controller {
    scenario: Scenario,
    world: World,
    scheduler: PulseScheduler,
    metronome: Metronome,
    actors: HashMap<String, OwnerKey>,
    inbox: Inbox,
    /// Reused buffer for the events of one frame.
    events: Vec<QuantizationEvent>,
    /// Index of the last delivered tick, -1 before the first.
    last_tick: i64,
    seconds: f64,
    trace: Trace,
}

impl Controller {
    pub fn new(scenario: Scenario) -> Result<Self, ScenarioError> {
        scenario.validate()?;

        let inbox: Inbox = Rc::default();
        let mut world = World::new();
        let mut actors = HashMap::new();
        for spec in &scenario.actors {
            let key = if spec.visual {
                let sink = inbox.clone();
                let name = spec.name.clone();
                world.spawn_visual(&spec.name, move |entry: &PulseEntry| {
                    sink.borrow_mut().push((name.clone(), entry.clone()));
                })
            } else {
                world.spawn(&spec.name)
            };
            actors.insert(spec.name.clone(), key);
        }

        let clock = &scenario.clock;
        let mut metronome = Metronome::new(&clock.name, clock.bpm, clock.beats_per_bar);
        let mut scheduler = PulseScheduler::new(scenario.scheduler.clone());
        let tempo: Rc<dyn TempoSource> = metronome.tempo();
        let resolution = scheduler.subscribe(metronome.name(), Some(tempo));
        metronome.set_resolution(resolution);

        Ok(Self {
            scenario,
            world,
            scheduler,
            metronome,
            actors,
            inbox,
            events: Vec::new(),
            last_tick: -1,
            seconds: 0.0,
            trace: Trace::default(),
        })
    }

    /// Load a scenario file and build a controller for it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        Self::new(Scenario::load(path)?)
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn scheduler(&self) -> &PulseScheduler {
        &self.scheduler
    }

    pub fn actor(&self, name: &str) -> Option<OwnerKey> {
        self.actors.get(name).copied()
    }

    // --- Offline run ---

    /// Play the whole scenario and return its trace.
    ///
    /// The first frame delivers the downbeat; each later frame moves the
    /// clock forward by one frame period before the frame update runs.
    pub fn run(&mut self) -> Trace {
        let frame_rate = self.scenario.run.frame_rate;
        let frames = self.scenario.run.frame_count();
        let dt = 1.0 / frame_rate;

        info!(
            clock = self.metronome.name(),
            bpm = self.metronome.bpm(),
            frames,
            actors = self.actors.len(),
            "running scenario"
        );

        self.metronome.start();
        for frame in 0..frames {
            let clock_step = if frame == 0 { 0.0 } else { dt };
            self.step(clock_step, dt as f32);
        }
        self.metronome.stop();

        std::mem::take(&mut self.trace)
    }

    /// One host frame: deliver the grid lines crossed, then update values.
    fn step(&mut self, clock_step: f64, frame_dt: f32) {
        self.seconds += clock_step;

        let mut events = std::mem::take(&mut self.events);
        events.clear();
        self.metronome.advance(clock_step, &mut |e| events.push(e));
        for event in &events {
            self.last_tick += 1;
            self.apply_actions(self.last_tick);
            self.scheduler.on_quantization(&mut self.world, event);
            self.trace.ticks += 1;
            self.flush();
        }
        self.events = events;

        if self.scheduler.config().use_forced_tick {
            // Only fails when forced ticking is off, which was just checked.
            let _ = self.scheduler.force_tick(&mut self.world, frame_dt);
        } else {
            self.scheduler.tick(&mut self.world, frame_dt);
        }
        self.trace.frames += 1;
        self.flush();
    }

    /// Apply every action scheduled for `tick`: tempo changes, then cues,
    /// cancels, clears and despawns.
    fn apply_actions(&mut self, tick: i64) {
        for change in self.scenario.tempo_changes.iter().filter(|c| c.at_tick == tick) {
            self.metronome.set_bpm(change.bpm);
        }

        for cue in self.scenario.cues.iter().filter(|c| c.at_tick == tick) {
            let Some(&owner) = self.actors.get(&cue.actor) else { continue };
            let added = self.scheduler.add_pulse(
                &mut self.world,
                owner,
                cue.pulse.clone(),
                cue.beat_duration,
                cue.beat_offset,
                cue.stop_if_exists,
            );
            match added {
                Ok(outcome) => debug!(tick, actor = cue.actor.as_str(), ?outcome, "cue"),
                Err(_) => self.trace.rejected += 1,
            }
        }

        for cancel in self.scenario.cancels.iter().filter(|c| c.at_tick == tick) {
            let Some(&owner) = self.actors.get(&cancel.actor) else { continue };
            self.scheduler
                .remove_from_owner(&mut self.world, cancel.index, cancel.index_filter, owner);
        }

        for clear in self.scenario.clears.iter().filter(|c| c.at_tick == tick) {
            match &clear.actor {
                Some(name) => {
                    if let Some(&owner) = self.actors.get(name) {
                        self.scheduler
                            .remove_all_from_owner(&mut self.world, owner, &clear.exclude_filters);
                    }
                }
                None => {
                    self.scheduler.remove_all(&mut self.world);
                }
            }
        }

        for despawn in self.scenario.despawns.iter().filter(|d| d.at_tick == tick) {
            if let Some(&owner) = self.actors.get(&despawn.actor) {
                self.world.despawn(owner);
                debug!(tick, actor = despawn.actor.as_str(), "despawn");
            }
        }
    }

    /// Move pending callbacks into the trace, stamped with the current time.
    fn flush(&mut self) {
        let mut inbox = self.inbox.borrow_mut();
        for (actor, entry) in inbox.drain(..) {
            self.trace
                .records
                .push(TraceRecord::new(self.last_tick, self.seconds, actor, &entry));
        }
    }
}
