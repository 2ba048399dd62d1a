//! Target selection
//!
//! Picks the actor an attack or heal lands on. Resolution happens every time a
//! target is needed, so a dead target is replaced (or dropped) on the next access.

use serde::{Deserialize, Serialize};

use super::rng::GameRng;
use super::{ActorId, Faction, Role};

/// Snapshot of one fielded actor as seen by the resolver
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub id: ActorId,
    pub faction: Faction,
    pub role: Role,
    pub alive: bool,
}

/// The actor asking for a target
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Seeker {
    pub id: ActorId,
    pub faction: Faction,
    /// Target chosen on a previous access, if any
    pub current: Option<ActorId>,
}

/// Where a manually targeted actor falls back to when nothing valid is selected
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManualFallback {
    /// Target yourself
    Caster,
    /// Target the first living ally with this role, else yourself
    Ally(Role),
}

/// Target selection strategy of an actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Targeting {
    /// Random living opponent, kept until it dies
    RandomOpponent,
    /// Living opponent with this role if there is one, otherwise random
    PreferRole(Role),
    /// Explicit assignment by the player
    Manual(ManualFallback),
}

impl Targeting {
    /// Resolve the target for `seeker` against the fielded `candidates`.
    ///
    /// Returns `None` when no valid target is alive.
    pub fn resolve(
        &self,
        seeker: &Seeker,
        candidates: &[Candidate],
        rng: &mut GameRng,
    ) -> Option<ActorId> {
        let living = |id: ActorId| candidates.iter().find(|c| c.id == id && c.alive);

        match self {
            Targeting::RandomOpponent => {
                let opposing = seeker.faction.opposing();
                if let Some(current) = seeker.current.and_then(living) {
                    if current.faction == opposing {
                        return Some(current.id);
                    }
                }
                random_of(candidates, opposing, rng)
            }
            Targeting::PreferRole(role) => {
                let opposing = seeker.faction.opposing();
                candidates
                    .iter()
                    .find(|c| c.alive && c.faction == opposing && c.role == *role)
                    .map(|c| c.id)
                    .or_else(|| {
                        seeker
                            .current
                            .and_then(living)
                            .filter(|c| c.faction == opposing)
                            .map(|c| c.id)
                    })
                    .or_else(|| random_of(candidates, opposing, rng))
            }
            Targeting::Manual(fallback) => {
                if let Some(current) = seeker.current.and_then(living) {
                    return Some(current.id);
                }
                let ally = match fallback {
                    ManualFallback::Caster => None,
                    ManualFallback::Ally(role) => candidates
                        .iter()
                        .find(|c| c.alive && c.faction == seeker.faction && c.role == *role)
                        .map(|c| c.id),
                };
                ally.or_else(|| living(seeker.id).map(|c| c.id))
            }
        }
    }
}

fn random_of(candidates: &[Candidate], faction: Faction, rng: &mut GameRng) -> Option<ActorId> {
    let pool: Vec<ActorId> = candidates
        .iter()
        .filter(|c| c.alive && c.faction == faction)
        .map(|c| c.id)
        .collect();
    rng.pick_index(pool.len()).map(|i| pool[i])
}
