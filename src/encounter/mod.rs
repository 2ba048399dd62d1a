//! Encounter Orchestrator
//!
//! Owns the actors and the task tree, advances the simulation once per frame and
//! derives the terminal condition.
//!
//! ## Tree layout
//! ```text
//! root
//! ├── Tank          (actor container)
//! │   ├── Shield Bash
//! │   └── Renew     (heal-over-time cast on the tank)
//! ├── Player
//! │   ├── global cooldown
//! │   └── Heal      (cast in flight)
//! └── Tiny wolf
//!     ├── Heavy Blow
//!     └── Quick Stab
//! ```
//! Party containers come first, so within one frame the party acts before the
//! enemies. Cancelling an actor's container removes everything it owns.

use bevy::prelude::*;
use std::time::Duration;

pub mod actor;
pub mod audio;
pub mod definitions;
pub mod effects;
pub mod snapshot;
pub mod spell;
pub mod state;

pub use actor::Actor;
pub use audio::{AudioHandle, AudioSink, RecordingAudio, SilentAudio};
pub use definitions::{ActorTemplate, AttackDef, EncounterDefinition, HotDef, SpellDef};
pub use snapshot::{ActorSnapshot, CastProgress, EffectView, EncounterSnapshot, Outcome};
pub use state::DevFlags;

use crate::combat::constants::{FIZZLE_CUE, GLOBAL_COOLDOWN};
use crate::combat::log::{CombatEventType, CombatLog, CombatLogEvent, SubscriptionId};
use crate::combat::resources::ResourceKind;
use crate::combat::rng::GameRng;
use crate::combat::{ActorId, Faction};
use crate::error::{CastError, ConfigError};
use crate::scheduler::{Repeat, TaskId, TaskTree, Timing};

use effects::{Effect, GlobalCooldown, PeriodicDamage};
use spell::SpellCast;
use state::EncounterState;

/// A running encounter.
#[derive(Resource)]
pub struct Encounter {
    tree: TaskTree<Effect>,
    state: EncounterState,
    /// Simulated time since the encounter started
    clock: Duration,
    paused: bool,
    outcome: Option<Outcome>,
    player: Option<ActorId>,
}

impl Encounter {
    /// Field every actor of `definition` with a muted audio sink.
    pub fn new(definition: &EncounterDefinition, seed: Option<u64>) -> Result<Self, ConfigError> {
        Self::with_audio(definition, seed, Box::new(SilentAudio))
    }

    /// Field every actor of `definition`, party first, and log `ENCOUNTER_START`.
    pub fn with_audio(
        definition: &EncounterDefinition,
        seed: Option<u64>,
        audio: Box<dyn AudioSink>,
    ) -> Result<Self, ConfigError> {
        definition.validate()?;

        let rng = GameRng::new(seed);
        match rng.seed {
            Some(seed) => info!("Using deterministic RNG with seed: {}", seed),
            None => info!("Using non-deterministic RNG (no seed provided)"),
        }

        let mut encounter = Self {
            tree: TaskTree::new(),
            state: EncounterState::new(rng, audio),
            clock: Duration::ZERO,
            paused: false,
            outcome: None,
            player: None,
        };

        for template in definition.templates() {
            encounter.field(definition, template)?;
        }
        encounter.player = encounter
            .state
            .party
            .iter()
            .copied()
            .find(|id| encounter.state.actor(*id).is_some_and(Actor::is_player))
            .or_else(|| {
                encounter
                    .state
                    .party
                    .iter()
                    .copied()
                    .find(|id| encounter.state.actor(*id).is_some_and(|a| !a.spellbook.is_empty()))
            });

        encounter.state.log.append(CombatLogEvent::new(CombatEventType::EncounterStart));
        info!(
            "Encounter started: {} party vs {} enemies",
            encounter.state.party.len(),
            encounter.state.enemies.len()
        );
        Ok(encounter)
    }

    fn field(&mut self, definition: &EncounterDefinition, template: &ActorTemplate) -> Result<(), ConfigError> {
        let id = ActorId(self.state.actors.len() as u32);
        let spellbook = template
            .spellbook
            .iter()
            .filter_map(|name| definition.spell(name).cloned())
            .collect();
        self.state.actors.push(Actor::from_template(id, template, spellbook));
        match template.faction {
            Faction::Party => self.state.party.push(id),
            Faction::Enemy => self.state.enemies.push(id),
        }

        let node = self
            .tree
            .spawn_container(TaskId::ROOT, Effect::Actor(id), &mut self.state)
            .ok_or_else(|| ConfigError::Invalid(format!("could not field '{}'", template.name)))?;
        if let Some(actor) = self.state.actor_mut(id) {
            actor.node = node;
        }

        for name in &template.attacks {
            let attack = definition
                .attack(name)
                .ok_or_else(|| ConfigError::Invalid(format!("unknown attack '{}'", name)))?;
            self.tree.spawn(
                node,
                attack.timing(),
                Effect::Attack(PeriodicDamage::new(id, attack.clone())),
                &mut self.state,
            );
        }
        Ok(())
    }

    // ========================================================================
    // Simulation
    // ========================================================================

    /// Advance the encounter by one frame. Does nothing while paused or over.
    pub fn advance(&mut self, delta: Duration) {
        if self.paused || self.outcome.is_some() {
            return;
        }
        self.clock += delta;
        self.state.log.set_time(self.clock);
        self.tree.advance(delta, &mut self.state);
        self.check_outcome();
    }

    fn check_outcome(&mut self) {
        if self.outcome.is_some() {
            return;
        }
        let outcome = if self.is_party_defeated() {
            Outcome::Defeat
        } else if self.are_enemies_defeated() {
            Outcome::Victory
        } else {
            return;
        };
        self.outcome = Some(outcome);
        self.state
            .log
            .append(CombatLogEvent::new(CombatEventType::EncounterEnd).extra(outcome.tag()));
        info!("Encounter over after {:.1}s: {}", self.clock.as_secs_f32(), outcome.tag());
    }

    /// True when no party member is alive
    pub fn is_party_defeated(&self) -> bool {
        !self.state.party.iter().any(|id| self.state.is_alive(*id))
    }

    /// True when enemies were fielded and none is alive. An empty roster is not a win.
    pub fn are_enemies_defeated(&self) -> bool {
        !self.state.enemies.is_empty() && !self.state.enemies.iter().any(|id| self.state.is_alive(*id))
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn time(&self) -> Duration {
        self.clock
    }

    pub fn pause(&mut self) {
        if !self.paused {
            info!("Encounter paused at {:.1}s", self.clock.as_secs_f32());
        }
        self.paused = true;
    }

    pub fn resume(&mut self) {
        if self.paused {
            info!("Encounter resumed");
        }
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    // ========================================================================
    // Casting
    // ========================================================================

    /// Start casting `spell` as `caster`.
    ///
    /// On success the global cooldown starts, the cast task is mounted and
    /// `SPELL_CAST_START` is logged. A rejected cast changes nothing.
    pub fn cast_spell(&mut self, caster: ActorId, spell: &str) -> Result<TaskId, CastError> {
        let result = self.try_cast(caster, spell);
        if let Err(err) = &result {
            warn!("{} can't cast {}: {}", caster, spell, err);
        }
        result
    }

    /// Cast as the player character
    pub fn player_cast(&mut self, spell: &str) -> Result<TaskId, CastError> {
        let player = self.player.ok_or(CastError::CasterDead)?;
        self.cast_spell(player, spell)
    }

    fn try_cast(&mut self, caster: ActorId, name: &str) -> Result<TaskId, CastError> {
        let actor = self.state.actor(caster).ok_or(CastError::UnknownActor(caster))?;
        if !self.state.is_alive(caster) {
            return Err(CastError::CasterDead);
        }
        if actor.gcd.is_some() {
            return Err(CastError::GlobalCooldown);
        }
        if actor.cast.is_some() {
            return Err(CastError::AlreadyCasting);
        }
        let spell = actor
            .spell(name)
            .cloned()
            .ok_or_else(|| CastError::UnknownSpell(name.to_string()))?;
        if !self.state.flags.infinite_mana {
            if let Some(mana) = &actor.mana {
                if spell.cost > mana.current() {
                    return Err(CastError::NotEnoughMana {
                        cost: spell.cost,
                        available: mana.current(),
                    });
                }
            }
        }
        let node = actor.node;

        // Last check, so rejections leave the target and the RNG untouched
        let target = self.state.pick_target(caster).ok_or(CastError::NoTarget)?;
        self.state.remember_target(caster, Some(target));

        self.tree.spawn(
            node,
            Timing::once(GLOBAL_COOLDOWN),
            Effect::GlobalCooldown(GlobalCooldown::new(caster)),
            &mut self.state,
        );
        let cast_time = spell.cast_time();
        let id = self
            .tree
            .spawn(node, Timing::once(cast_time), Effect::Spell(SpellCast::new(caster, spell)), &mut self.state)
            .ok_or(CastError::CasterDead)?;
        info!("{} begins casting {} ({:?})", caster, name, cast_time);
        Ok(id)
    }

    /// Player cancel: silence the cast, drop the cast and the global cooldown.
    ///
    /// Both references are cleared on the caster before the cast's teardown logs
    /// `SPELL_CAST_INTERRUPTED`. Returns `false` if there was nothing to cancel.
    pub fn cancel_cast(&mut self, caster: ActorId) -> bool {
        let Some(actor) = self.state.actor_mut(caster) else {
            return false;
        };
        let cast = actor.cast.take();
        let gcd = actor.gcd.take();
        if cast.is_none() && gcd.is_none() {
            return false;
        }

        if let Some(Effect::Spell(spell)) = cast.and_then(|id| self.tree.task_mut(id)) {
            spell.stop_sounds(self.state.audio.as_mut());
        }
        self.state.audio.play(FIZZLE_CUE, false);
        if let Some(gcd) = gcd {
            self.tree.cancel(gcd, &mut self.state);
        }
        if let Some(cast) = cast {
            self.tree.cancel(cast, &mut self.state);
        }
        info!("{} cancelled casting", caster);
        true
    }

    /// Interrupt from outside (a kick, a stun): the cast is lost but the
    /// global cooldown runs to its natural expiry.
    pub fn interrupt_cast(&mut self, caster: ActorId) -> bool {
        let Some(cast) = self.state.actor(caster).and_then(|actor| actor.cast) else {
            return false;
        };
        self.tree.cancel(cast, &mut self.state)
    }

    /// Assign the current target of `actor`. `None` clears it.
    ///
    /// Returns `false` if either actor is not on the roster.
    pub fn set_target(&mut self, actor: ActorId, target: Option<ActorId>) -> bool {
        if target.is_some_and(|target| !self.state.is_fielded(target)) {
            return false;
        }
        match self.state.actor_mut(actor) {
            Some(actor) => {
                actor.current_target = target;
                true
            }
            None => false,
        }
    }

    // ========================================================================
    // Developer commands
    // ========================================================================

    /// Remove every enemy and everything it owns. Returns how many were removed.
    pub fn remove_all_enemies(&mut self) -> usize {
        let enemies = std::mem::take(&mut self.state.enemies);
        for id in &enemies {
            if let Some(node) = self.state.actor(*id).map(|actor| actor.node) {
                self.tree.cancel(node, &mut self.state);
            }
        }
        info!("Removed {} enemies", enemies.len());
        enemies.len()
    }

    /// Refill the health of every living party member
    pub fn heal_party_to_full(&mut self) {
        let party = self.state.party.clone();
        for id in party {
            if !self.state.is_alive(id) {
                continue;
            }
            let restored = match self.state.actor_mut(id) {
                Some(actor) => actor.health.fill(),
                None => continue,
            };
            if restored > 0.0 {
                let event = self
                    .state
                    .event_from(CombatEventType::ResourceChange, id)
                    .value(restored)
                    .extra(ResourceKind::Health.tag());
                self.state.log.append(event);
            }
        }
    }

    pub fn flags(&self) -> DevFlags {
        self.state.flags
    }

    pub fn set_god_mode(&mut self, enabled: bool) {
        self.state.flags.god_mode = enabled;
        info!("God mode {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Enabling infinite mana also refills the player's mana.
    pub fn set_infinite_mana(&mut self, enabled: bool) {
        self.state.flags.infinite_mana = enabled;
        info!("Infinite mana {}", if enabled { "enabled" } else { "disabled" });
        if !enabled {
            return;
        }
        let Some(player) = self.player else {
            return;
        };
        let restored = self
            .state
            .actor_mut(player)
            .and_then(|actor| actor.mana.as_mut())
            .map(|mana| mana.fill())
            .unwrap_or(0.0);
        if restored > 0.0 {
            let event = self
                .state
                .event_from(CombatEventType::ResourceChange, player)
                .value(restored)
                .extra(ResourceKind::Mana.tag());
            self.state.log.append(event);
        }
    }

    pub fn toggle_god_mode(&mut self) -> bool {
        let enabled = !self.state.flags.god_mode;
        self.set_god_mode(enabled);
        enabled
    }

    pub fn toggle_infinite_mana(&mut self) -> bool {
        let enabled = !self.state.flags.infinite_mana;
        self.set_infinite_mana(enabled);
        enabled
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.state.actor(id)
    }

    /// Look up a fielded actor by name (case-insensitive)
    pub fn find_actor(&self, name: &str) -> Option<&Actor> {
        self.state
            .party
            .iter()
            .chain(self.state.enemies.iter())
            .filter_map(|id| self.state.actor(*id))
            .find(|actor| actor.name.eq_ignore_ascii_case(name))
    }

    pub fn party(&self) -> impl Iterator<Item = &Actor> {
        self.state.party.iter().filter_map(|id| self.state.actor(*id))
    }

    pub fn enemies(&self) -> impl Iterator<Item = &Actor> {
        self.state.enemies.iter().filter_map(|id| self.state.actor(*id))
    }

    /// The actor driven by console input and the autopilot
    pub fn player(&self) -> Option<&Actor> {
        self.player.and_then(|id| self.state.actor(id))
    }

    pub fn player_id(&self) -> Option<ActorId> {
        self.player
    }

    pub fn is_alive(&self, id: ActorId) -> bool {
        self.state.is_alive(id)
    }

    pub fn combat_log(&self) -> &CombatLog {
        &self.state.log
    }

    /// Register a callback invoked for every appended log event
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&CombatLogEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.state.log.on_append(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.state.log.unsubscribe(id)
    }

    pub fn clear_log(&mut self) {
        self.state.log.clear();
    }

    /// Number of live scheduler nodes (actor containers included)
    pub fn task_count(&self) -> usize {
        self.tree.len()
    }

    /// Spell being cast by `id` and how far along it is
    pub fn casting(&self, id: ActorId) -> Option<CastProgress> {
        let cast = self.state.actor(id)?.cast?;
        let info = self.tree.info(cast)?;
        let Some(Effect::Spell(spell)) = self.tree.task(cast) else {
            return None;
        };
        Some(CastProgress {
            spell: spell.spell().name.clone(),
            elapsed: info.elapsed,
            cast_time: spell.spell().cast_time(),
        })
    }

    /// Remaining share of the global cooldown of `id`, 0.0 when not on cooldown
    pub fn gcd_remaining_fraction(&self, id: ActorId) -> f32 {
        let Some(remaining) = self
            .state
            .actor(id)
            .and_then(|actor| actor.gcd)
            .and_then(|gcd| self.tree.info(gcd))
            .and_then(|info| info.remaining())
        else {
            return 0.0;
        };
        remaining.as_secs_f32() / GLOBAL_COOLDOWN.as_secs_f32()
    }

    /// Periodic effects applied to `id`, in application order
    pub fn active_effects(&self, id: ActorId) -> Vec<EffectView> {
        let Some(actor) = self.state.actor(id) else {
            return Vec::new();
        };
        actor
            .effects
            .iter()
            .filter_map(|effect| {
                let info = self.tree.info(*effect)?;
                let (name, caster) = match self.tree.task(*effect)? {
                    Effect::HealOverTime(hot) => (hot.def.name.clone(), hot.caster),
                    Effect::Attack(attack) => (attack.def.name.clone(), attack.attacker),
                    _ => return None,
                };
                let ticks_total = match info.timing.map(|timing| timing.repeat) {
                    Some(Repeat::Times(times)) => times,
                    _ => 0,
                };
                Some(EffectView {
                    name,
                    caster,
                    ticks_done: info.cycles,
                    ticks_total,
                    next_tick_in: info.remaining().unwrap_or_default(),
                })
            })
            .collect()
    }

    fn actor_snapshot(&self, actor: &Actor) -> ActorSnapshot {
        ActorSnapshot {
            id: actor.id,
            name: actor.name.clone(),
            faction: actor.faction,
            role: actor.role,
            health: actor.health.current(),
            max_health: actor.health.max(),
            mana: actor.mana.as_ref().map(|mana| mana.current()),
            max_mana: actor.mana.as_ref().map(|mana| mana.max()),
            alive: actor.is_alive(),
            target: actor.current_target,
            casting: self.casting(actor.id),
            gcd_remaining_fraction: self.gcd_remaining_fraction(actor.id),
            effects: self.active_effects(actor.id),
        }
    }

    /// Serializable copy of the whole encounter state
    pub fn snapshot(&self) -> EncounterSnapshot {
        EncounterSnapshot {
            time: self.clock,
            paused: self.paused,
            outcome: self.outcome,
            god_mode: self.state.flags.god_mode,
            infinite_mana: self.state.flags.infinite_mana,
            party: self.party().map(|actor| self.actor_snapshot(actor)).collect(),
            enemies: self.enemies().map(|actor| self.actor_snapshot(actor)).collect(),
        }
    }
}

// ============================================================================
// Bevy integration
// ============================================================================

/// Drives an [`Encounter`] resource from the app clock.
pub struct EncounterPlugin {
    pub definition: EncounterDefinition,
    pub seed: Option<u64>,
}

impl Plugin for EncounterPlugin {
    fn build(&self, app: &mut App) {
        match Encounter::new(&self.definition, self.seed) {
            Ok(encounter) => {
                app.insert_resource(encounter);
            }
            Err(err) => error!("Failed to start encounter: {}", err),
        }
        app.add_systems(Update, advance_encounter);
    }
}

/// Advance the encounter by the frame delta
pub fn advance_encounter(time: Res<Time>, encounter: Option<ResMut<Encounter>>) {
    if let Some(mut encounter) = encounter {
        encounter.advance(time.delta());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Count the player's outstanding cooldown and cast nodes
    fn outstanding(encounter: &Encounter, id: ActorId) -> (usize, usize) {
        let node = encounter.state.actor(id).map(|actor| actor.node).unwrap_or(TaskId::ROOT);
        let tree = &encounter.tree;
        let cooldowns = tree
            .children(node)
            .iter()
            .filter(|child| matches!(tree.task(**child), Some(Effect::GlobalCooldown(_))))
            .count();
        let casts = tree
            .children(node)
            .iter()
            .filter(|child| matches!(tree.task(**child), Some(Effect::Spell(_))))
            .count();
        (cooldowns, casts)
    }

    #[test]
    fn test_one_cooldown_and_one_cast_at_most() {
        let definition = EncounterDefinition::builtin().unwrap();
        let mut encounter = Encounter::new(&definition, Some(21)).unwrap();
        encounter.set_god_mode(true);
        let player = encounter.player_id().unwrap();
        let spells = ["Heal", "Flash Heal", "Greater Heal", "Renew"];
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..2000 {
            match rng.gen_range(0..10) {
                0..=4 => {
                    let _ = encounter.cast_spell(player, spells[rng.gen_range(0..spells.len())]);
                }
                5 => {
                    encounter.interrupt_cast(player);
                }
                6 => {
                    encounter.cancel_cast(player);
                }
                _ => encounter.advance(Duration::from_millis(rng.gen_range(0..400))),
            }

            let (cooldowns, casts) = outstanding(&encounter, player);
            let actor = encounter.actor(player).unwrap();
            assert!(cooldowns <= 1, "{} cooldowns outstanding", cooldowns);
            assert!(casts <= 1, "{} casts outstanding", casts);
            assert_eq!(cooldowns == 1, actor.on_global_cooldown());
            assert_eq!(casts == 1, actor.is_casting());
        }
    }
}
