//! Actors
//!
//! A participant in the encounter: identity, resources, targeting and the ids of
//! the scheduler nodes it owns. Fields are crate-private; outside code reads them
//! through accessors and changes them through [`super::Encounter`] operations.

use smallvec::SmallVec;

use crate::combat::resources::ResourcePool;
use crate::combat::targeting::{Seeker, Targeting};
use crate::combat::{ActorId, Faction, Role};
use crate::scheduler::TaskId;

use super::definitions::{ActorTemplate, SpellDef};

#[derive(Clone, Debug)]
pub struct Actor {
    pub(crate) id: ActorId,
    pub(crate) name: String,
    pub(crate) faction: Faction,
    pub(crate) role: Role,
    pub(crate) health: ResourcePool,
    pub(crate) mana: Option<ResourcePool>,
    pub(crate) targeting: Targeting,
    /// Last resolved or explicitly assigned target
    pub(crate) current_target: Option<ActorId>,
    pub(crate) spellbook: Vec<SpellDef>,
    /// Container node owning every task of this actor
    pub(crate) node: TaskId,
    /// Periodic effects currently applied to this actor
    pub(crate) effects: SmallVec<[TaskId; 4]>,
    /// Cast in progress, if any
    pub(crate) cast: Option<TaskId>,
    /// Running global cooldown, if any
    pub(crate) gcd: Option<TaskId>,
    pub(crate) is_player: bool,
}

impl Actor {
    /// Build an actor from its template. The spellbook is resolved by the caller.
    pub(crate) fn from_template(id: ActorId, template: &ActorTemplate, spellbook: Vec<SpellDef>) -> Self {
        Self {
            id,
            name: template.name.clone(),
            faction: template.faction,
            role: template.role,
            health: ResourcePool::health(template.health),
            mana: template.mana.map(ResourcePool::mana),
            targeting: template.targeting,
            current_target: None,
            spellbook,
            node: TaskId::ROOT,
            effects: SmallVec::new(),
            cast: None,
            gcd: None,
            is_player: template.player,
        }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn faction(&self) -> Faction {
        self.faction
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn health(&self) -> &ResourcePool {
        &self.health
    }

    pub fn mana(&self) -> Option<&ResourcePool> {
        self.mana.as_ref()
    }

    pub fn targeting(&self) -> Targeting {
        self.targeting
    }

    pub fn current_target(&self) -> Option<ActorId> {
        self.current_target
    }

    pub fn spellbook(&self) -> &[SpellDef] {
        &self.spellbook
    }

    pub fn spell(&self, name: &str) -> Option<&SpellDef> {
        self.spellbook.iter().find(|spell| spell.name == name)
    }

    pub fn is_alive(&self) -> bool {
        !self.health.is_depleted()
    }

    pub fn is_casting(&self) -> bool {
        self.cast.is_some()
    }

    pub fn on_global_cooldown(&self) -> bool {
        self.gcd.is_some()
    }

    pub fn is_player(&self) -> bool {
        self.is_player
    }

    /// Number of periodic effects currently applied
    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    pub(crate) fn seeker(&self) -> Seeker {
        Seeker {
            id: self.id,
            faction: self.faction,
            current: self.current_target,
        }
    }
}
