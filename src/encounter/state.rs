//! Shared encounter state
//!
//! The context every effect task receives. Holds the roster, the combat log,
//! the RNG, the dev flags and the audio sink.

use crate::combat::log::{CombatEventType, CombatLog, CombatLogEvent};
use crate::combat::rng::GameRng;
use crate::combat::targeting::{Candidate, Targeting};
use crate::combat::ActorId;

use super::actor::Actor;
use super::audio::AudioSink;

/// Developer toggles
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DevFlags {
    /// Party members take no health loss
    pub god_mode: bool,
    /// Spells ignore and never spend mana
    pub infinite_mana: bool,
}

pub struct EncounterState {
    /// Every actor ever fielded, indexed by `ActorId`. Removed actors stay here
    /// so log attribution keeps working.
    pub(crate) actors: Vec<Actor>,
    /// Fielded party members in fielding order
    pub(crate) party: Vec<ActorId>,
    /// Fielded enemies in fielding order
    pub(crate) enemies: Vec<ActorId>,
    pub(crate) log: CombatLog,
    pub(crate) rng: GameRng,
    pub(crate) flags: DevFlags,
    pub(crate) audio: Box<dyn AudioSink>,
}

impl EncounterState {
    pub(crate) fn new(rng: GameRng, audio: Box<dyn AudioSink>) -> Self {
        Self {
            actors: Vec::new(),
            party: Vec::new(),
            enemies: Vec::new(),
            log: CombatLog::default(),
            rng,
            flags: DevFlags::default(),
            audio,
        }
    }

    pub(crate) fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(id.0 as usize)
    }

    pub(crate) fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(id.0 as usize)
    }

    /// Whether `id` is still on the roster (dead actors stay fielded until removed)
    pub(crate) fn is_fielded(&self, id: ActorId) -> bool {
        self.party.contains(&id) || self.enemies.contains(&id)
    }

    pub(crate) fn is_alive(&self, id: ActorId) -> bool {
        self.is_fielded(id) && self.actor(id).is_some_and(Actor::is_alive)
    }

    fn candidates(&self) -> Vec<Candidate> {
        self.party
            .iter()
            .chain(self.enemies.iter())
            .filter_map(|id| self.actor(*id))
            .map(|actor| Candidate {
                id: actor.id,
                faction: actor.faction,
                role: actor.role,
                alive: actor.is_alive(),
            })
            .collect()
    }

    /// Resolve the current target of `id` against the live roster.
    ///
    /// Automatic strategies remember what they picked. A manual assignment is
    /// left alone even when it falls back, so the player's choice survives.
    pub(crate) fn resolve_target(&mut self, id: ActorId) -> Option<ActorId> {
        let resolved = self.pick_target(id);
        self.remember_target(id, resolved);
        resolved
    }

    /// Resolve the target of `id` without storing it on the actor
    pub(crate) fn pick_target(&mut self, id: ActorId) -> Option<ActorId> {
        let candidates = self.candidates();
        let actor = self.actor(id)?;
        let seeker = actor.seeker();
        let targeting = actor.targeting;
        targeting.resolve(&seeker, &candidates, &mut self.rng)
    }

    /// Store a resolved target, unless `id` is targeted manually
    pub(crate) fn remember_target(&mut self, id: ActorId, target: Option<ActorId>) {
        if let Some(actor) = self.actor_mut(id) {
            if !matches!(actor.targeting, Targeting::Manual(_)) {
                actor.current_target = target;
            }
        }
    }

    /// Start a log event with `source` filled in from the roster
    pub(crate) fn event_from(&self, event_type: CombatEventType, source: ActorId) -> CombatLogEvent {
        let event = CombatLogEvent::new(event_type);
        match self.actor(source) {
            Some(actor) => event.source(actor.id, actor.name.clone()),
            None => event,
        }
    }

    /// Fill in `target` of an event from the roster
    pub(crate) fn with_target(&self, event: CombatLogEvent, target: ActorId) -> CombatLogEvent {
        match self.actor(target) {
            Some(actor) => event.target(actor.id, actor.name.clone()),
            None => event,
        }
    }
}
