//! World: a minimal entity store implementing `PulseHost`.

use slotmap::SlotMap;

use bv_ir::{OwnerKey, PulseEntry};

use crate::host::{PulseHost, PulseVisual};

/// An entity in the world. Only entities spawned with a visual can own pulses.
pub struct Actor {
    pub name: String,
    visual: Option<Box<dyn PulseVisual>>,
}

impl Actor {
    /// Whether this actor implements the visual-update capability.
    pub fn has_visual(&self) -> bool {
        self.visual.is_some()
    }
}

/// Entity store keyed by generation-checked `OwnerKey`s.
///
/// Despawning frees the slot; keys handed out earlier stop validating
/// even if the slot is reused.
#[derive(Default)]
pub struct World {
    actors: SlotMap<OwnerKey, Actor>,
    paused: bool,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn an actor with no visual capability.
    pub fn spawn(&mut self, name: &str) -> OwnerKey {
        self.actors.insert(Actor { name: name.to_owned(), visual: None })
    }

    /// Spawn an actor that receives pulse updates.
    pub fn spawn_visual<V: PulseVisual + 'static>(&mut self, name: &str, visual: V) -> OwnerKey {
        self.actors.insert(Actor { name: name.to_owned(), visual: Some(Box::new(visual)) })
    }

    /// Remove an actor. Returns false if it was already gone.
    pub fn despawn(&mut self, key: OwnerKey) -> bool {
        self.actors.remove(key).is_some()
    }

    pub fn get(&self, key: OwnerKey) -> Option<&Actor> {
        self.actors.get(key)
    }

    /// Find a live actor by name.
    pub fn find(&self, name: &str) -> Option<OwnerKey> {
        self.actors.iter().find(|(_, a)| a.name == name).map(|(k, _)| k)
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }
}

impl PulseHost for World {
    fn is_valid(&self, owner: OwnerKey) -> bool {
        self.actors.contains_key(owner)
    }

    fn supports_visuals(&self, owner: OwnerKey) -> bool {
        self.actors.get(owner).is_some_and(Actor::has_visual)
    }

    fn on_visual_update(&mut self, owner: OwnerKey, entry: &PulseEntry) {
        if let Some(visual) = self.actors.get_mut(owner).and_then(|a| a.visual.as_mut()) {
            visual.on_visual_update(entry);
        }
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn owner_name(&self, owner: OwnerKey) -> Option<&str> {
        self.actors.get(owner).map(|a| a.name.as_str())
    }
}
