//! Combat primitives
//!
//! Building blocks the encounter is assembled from:
//! - Resource pools (health, mana)
//! - Target selection
//! - Combat logging
//! - Seedable randomness

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod constants;
pub mod log;
pub mod resources;
pub mod rng;
pub mod targeting;

/// Stable identity of an actor for the lifetime of an encounter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u32);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor-{}", self.0)
    }
}

/// Which side an actor fights on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    Party,
    Enemy,
}

impl Faction {
    pub fn opposing(&self) -> Faction {
        match self {
            Faction::Party => Faction::Enemy,
            Faction::Enemy => Faction::Party,
        }
    }
}

/// Combat role, used by role-priority targeting and the healer autopilot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Tank,
    Healer,
    Damage,
}
