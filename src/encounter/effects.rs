//! Effect tasks
//!
//! Every recurring or one-shot combat action is a scheduler node running one
//! [`Effect`]. Attacks and heals-over-time are parameterized by their table rows;
//! no effect has its own type per ability.

use bevy::log::{debug, info};

use crate::combat::log::CombatEventType;
use crate::combat::{ActorId, Faction};
use crate::scheduler::{Task, TaskContext};

use super::definitions::{AttackDef, HotDef};
use super::spell::SpellCast;
use super::state::EncounterState;

pub type EffectContext<'a> = TaskContext<'a, Effect>;

/// Behavior of one scheduler node in an encounter
pub enum Effect {
    /// Container grouping every task owned by one actor
    Actor(ActorId),
    Attack(PeriodicDamage),
    HealOverTime(HealOverTime),
    GlobalCooldown(GlobalCooldown),
    Spell(SpellCast),
}

impl Task for Effect {
    type Context = EncounterState;

    fn mount(&mut self, cx: &mut EffectContext<'_>) {
        match self {
            Effect::Actor(_) => {}
            Effect::Attack(attack) => attack.mount(cx),
            Effect::HealOverTime(hot) => hot.mount(cx),
            Effect::GlobalCooldown(gcd) => gcd.mount(cx),
            Effect::Spell(spell) => spell.mount(cx),
        }
    }

    fn should_tick(&mut self, ctx: &mut EncounterState) -> bool {
        match self {
            Effect::Actor(_) => false,
            Effect::Attack(attack) => attack.should_tick(ctx),
            Effect::HealOverTime(hot) => hot.should_tick(ctx),
            Effect::GlobalCooldown(_) | Effect::Spell(_) => true,
        }
    }

    fn tick(&mut self, cx: &mut EffectContext<'_>) {
        match self {
            Effect::Actor(_) | Effect::GlobalCooldown(_) => {}
            Effect::Attack(attack) => attack.tick(cx),
            Effect::HealOverTime(hot) => hot.tick(cx),
            Effect::Spell(spell) => spell.tick(cx),
        }
    }

    fn teardown(&mut self, cx: &mut EffectContext<'_>) {
        match self {
            Effect::Actor(id) => debug!("{} left the encounter", id),
            Effect::Attack(attack) => attack.teardown(cx),
            Effect::HealOverTime(hot) => hot.teardown(cx),
            Effect::GlobalCooldown(gcd) => gcd.teardown(cx),
            Effect::Spell(spell) => spell.teardown(cx),
        }
    }
}

/// Damage `target` by `amount` on behalf of `source` and log it.
///
/// The logged value is the rolled amount, even when god mode or the health
/// floor absorbs part of it. A target brought to zero by this hit is logged as
/// died and every task it owns is cancelled.
pub(crate) fn apply_damage(
    cx: &mut EffectContext<'_>,
    source: ActorId,
    target: ActorId,
    spell: &str,
    event_type: CombatEventType,
    amount: f32,
) {
    let god_mode = cx.ctx.flags.god_mode;
    let Some(victim) = cx.ctx.actor_mut(target) else {
        return;
    };
    let was_alive = victim.is_alive();
    if !(god_mode && victim.faction == Faction::Party) {
        victim.health.damage(amount);
    }
    let died = was_alive && !victim.is_alive();
    let victim_node = victim.node;

    let event = cx.ctx.event_from(event_type, source).spell(spell).value(amount);
    let event = cx.ctx.with_target(event, target);
    cx.ctx.log.append(event);

    if died {
        let event = cx.ctx.event_from(CombatEventType::UnitDied, source).spell(spell);
        let event = cx.ctx.with_target(event, target);
        cx.ctx.log.append(event);
        if let Some(victim) = cx.ctx.actor(target) {
            info!("{} died to {}", victim.name, spell);
        }
        cx.cancel_children(victim_node);
    }
}

/// A recurring attack of one actor
pub struct PeriodicDamage {
    pub(crate) attacker: ActorId,
    pub(crate) def: AttackDef,
    /// Target picked by the guard for the pending hit
    target: Option<ActorId>,
}

impl PeriodicDamage {
    pub fn new(attacker: ActorId, def: AttackDef) -> Self {
        Self {
            attacker,
            def,
            target: None,
        }
    }

    fn mount(&mut self, cx: &mut EffectContext<'_>) {
        let id = cx.id();
        if let Some(attacker) = cx.ctx.actor_mut(self.attacker) {
            attacker.effects.push(id);
        }
    }

    /// Fire only while the attacker lives and has a living target.
    fn should_tick(&mut self, ctx: &mut EncounterState) -> bool {
        if !ctx.is_alive(self.attacker) {
            return false;
        }
        self.target = ctx.resolve_target(self.attacker);
        self.target.is_some_and(|target| ctx.is_alive(target))
    }

    fn tick(&mut self, cx: &mut EffectContext<'_>) {
        let Some(target) = self.target.take() else {
            return;
        };
        let amount = cx.ctx.rng.roll(self.def.min_damage, self.def.max_damage) as f32;
        if let Some(sound) = &self.def.sound {
            cx.ctx.audio.play(sound, false);
        }
        apply_damage(cx, self.attacker, target, &self.def.name, self.def.event_type, amount);
    }

    fn teardown(&mut self, cx: &mut EffectContext<'_>) {
        let id = cx.id();
        if let Some(attacker) = cx.ctx.actor_mut(self.attacker) {
            attacker.effects.retain(|effect| *effect != id);
        }
    }
}

/// A heal split evenly over a fixed number of cycles
pub struct HealOverTime {
    pub(crate) caster: ActorId,
    pub(crate) target: ActorId,
    pub(crate) def: HotDef,
}

impl HealOverTime {
    pub fn new(caster: ActorId, target: ActorId, def: HotDef) -> Self {
        Self { caster, target, def }
    }

    fn mount(&mut self, cx: &mut EffectContext<'_>) {
        let id = cx.id();
        if let Some(target) = cx.ctx.actor_mut(self.target) {
            target.effects.push(id);
        }
        let event = cx
            .ctx
            .event_from(CombatEventType::SpellAuraApplied, self.caster)
            .spell(self.def.name.as_str());
        let event = cx.ctx.with_target(event, self.target);
        cx.ctx.log.append(event);
    }

    /// Ticks keep landing after the caster dies. Only a dead target pauses them.
    fn should_tick(&mut self, ctx: &mut EncounterState) -> bool {
        ctx.is_alive(self.target)
    }

    fn tick(&mut self, cx: &mut EffectContext<'_>) {
        let amount = self.def.per_tick();
        let applied = match cx.ctx.actor_mut(self.target) {
            Some(target) => target.health.heal(amount),
            None => return,
        };
        let event = cx
            .ctx
            .event_from(CombatEventType::PeriodicSpellHeal, self.caster)
            .spell(self.def.name.as_str())
            .value(applied);
        let event = cx.ctx.with_target(event, self.target);
        cx.ctx.log.append(event);
    }

    fn teardown(&mut self, cx: &mut EffectContext<'_>) {
        let id = cx.id();
        if let Some(target) = cx.ctx.actor_mut(self.target) {
            target.effects.retain(|effect| *effect != id);
        }
        let event = cx
            .ctx
            .event_from(CombatEventType::SpellAuraRemoved, self.caster)
            .spell(self.def.name.as_str());
        let event = cx.ctx.with_target(event, self.target);
        cx.ctx.log.append(event);
    }
}

/// Lockout started by every accepted cast
pub struct GlobalCooldown {
    pub(crate) caster: ActorId,
}

impl GlobalCooldown {
    pub fn new(caster: ActorId) -> Self {
        Self { caster }
    }

    fn mount(&mut self, cx: &mut EffectContext<'_>) {
        let id = cx.id();
        if let Some(caster) = cx.ctx.actor_mut(self.caster) {
            caster.gcd = Some(id);
        }
    }

    fn teardown(&mut self, cx: &mut EffectContext<'_>) {
        let id = cx.id();
        if let Some(caster) = cx.ctx.actor_mut(self.caster) {
            if caster.gcd == Some(id) {
                caster.gcd = None;
            }
        }
    }
}
