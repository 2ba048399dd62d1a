//! Spell casting
//!
//! A cast is a one-shot scheduler node whose delay is the spell's cast time.
//!
//! ## Lifecycle
//! - Mount: the cast is registered on the caster and `SPELL_CAST_START` is logged.
//! - Tick (cast time elapsed): `SPELL_CAST_SUCCESS`, then the heal lands on the
//!   caster's current target and any heal-over-time is attached to it.
//! - Teardown: a completed cast pays its mana cost. A cast destroyed before it
//!   completed logs `SPELL_CAST_INTERRUPTED` and costs nothing.

use bevy::log::info;
use smallvec::SmallVec;

use crate::combat::constants::{CAST_CUE, PRECAST_CUE};
use crate::combat::log::CombatEventType;
use crate::combat::resources::ResourceKind;
use crate::combat::ActorId;

use super::audio::{AudioHandle, AudioSink};
use super::definitions::SpellDef;
use super::effects::{Effect, EffectContext, HealOverTime};

pub struct SpellCast {
    pub(crate) caster: ActorId,
    pub(crate) spell: SpellDef,
    /// Cues to silence when the cast ends
    sounds: SmallVec<[AudioHandle; 2]>,
}

impl SpellCast {
    pub fn new(caster: ActorId, spell: SpellDef) -> Self {
        Self {
            caster,
            spell,
            sounds: SmallVec::new(),
        }
    }

    pub fn spell(&self) -> &SpellDef {
        &self.spell
    }

    pub(crate) fn stop_sounds(&mut self, audio: &mut dyn AudioSink) {
        for handle in self.sounds.drain(..) {
            audio.stop(handle);
        }
    }

    pub(super) fn mount(&mut self, cx: &mut EffectContext<'_>) {
        let id = cx.id();
        if let Some(caster) = cx.ctx.actor_mut(self.caster) {
            caster.cast = Some(id);
        }
        let event = cx
            .ctx
            .event_from(CombatEventType::SpellCastStart, self.caster)
            .spell(self.spell.name.as_str())
            .value(self.spell.cast_time_ms as f32);
        cx.ctx.log.append(event);

        if self.spell.cast_time_ms > 0 {
            if let Some(handle) = cx.ctx.audio.play(PRECAST_CUE, true) {
                self.sounds.push(handle);
            }
        }
    }

    pub(super) fn tick(&mut self, cx: &mut EffectContext<'_>) {
        let event = cx
            .ctx
            .event_from(CombatEventType::SpellCastSuccess, self.caster)
            .spell(self.spell.name.as_str());
        cx.ctx.log.append(event);

        self.stop_sounds(cx.ctx.audio.as_mut());
        cx.ctx.audio.play(CAST_CUE, false);
        if let Some(sound) = &self.spell.sound {
            cx.ctx.audio.play(sound, false);
        }

        let Some(target) = cx.ctx.resolve_target(self.caster) else {
            info!("{} completed with no target", self.spell.name);
            return;
        };

        if self.spell.heal > 0.0 {
            let applied = match cx.ctx.actor_mut(target) {
                Some(actor) => actor.health.heal(self.spell.heal),
                None => 0.0,
            };
            let event = cx
                .ctx
                .event_from(CombatEventType::SpellHeal, self.caster)
                .spell(self.spell.name.as_str())
                .value(applied);
            let event = cx.ctx.with_target(event, target);
            cx.ctx.log.append(event);
        }

        if let Some(hot) = &self.spell.hot {
            if let Some(node) = cx.ctx.actor(target).map(|actor| actor.node) {
                cx.spawn(
                    node,
                    hot.timing(),
                    Effect::HealOverTime(HealOverTime::new(self.caster, target, hot.clone())),
                );
            }
        }
    }

    pub(super) fn teardown(&mut self, cx: &mut EffectContext<'_>) {
        let id = cx.id();
        let completed = cx.cycles() > 0;
        self.stop_sounds(cx.ctx.audio.as_mut());

        let infinite_mana = cx.ctx.flags.infinite_mana;
        let Some(caster) = cx.ctx.actor_mut(self.caster) else {
            return;
        };
        if caster.cast == Some(id) {
            caster.cast = None;
        }

        if !completed {
            let event = cx
                .ctx
                .event_from(CombatEventType::SpellCastInterrupted, self.caster)
                .spell(self.spell.name.as_str());
            cx.ctx.log.append(event);
            return;
        }

        if infinite_mana || self.spell.cost <= 0.0 {
            return;
        }
        let Some(spent) = caster.mana.as_mut().map(|mana| mana.spend(self.spell.cost)) else {
            return;
        };
        let event = cx
            .ctx
            .event_from(CombatEventType::ResourceChange, self.caster)
            .spell(self.spell.name.as_str())
            .value(-spent)
            .extra(ResourceKind::Mana.tag());
        cx.ctx.log.append(event);
    }
}
