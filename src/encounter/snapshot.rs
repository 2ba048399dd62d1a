//! Read-only views of an encounter
//!
//! Plain serializable copies for display layers and reports. Holding one never
//! keeps anything in the encounter alive.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::combat::{ActorId, Faction, Role};

/// How an encounter ended
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// Every enemy died
    Victory,
    /// Every party member died
    Defeat,
}

impl Outcome {
    pub fn tag(&self) -> &'static str {
        match self {
            Outcome::Victory => "VICTORY",
            Outcome::Defeat => "DEFEAT",
        }
    }
}

/// Progress of a cast in flight
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CastProgress {
    pub spell: String,
    pub elapsed: Duration,
    pub cast_time: Duration,
}

impl CastProgress {
    /// Completed share of the cast time, 1.0 for instant casts
    pub fn fraction(&self) -> f32 {
        if self.cast_time.is_zero() {
            1.0
        } else {
            (self.elapsed.as_secs_f32() / self.cast_time.as_secs_f32()).min(1.0)
        }
    }
}

/// A periodic effect applied to an actor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectView {
    pub name: String,
    pub caster: ActorId,
    pub ticks_done: u32,
    pub ticks_total: u32,
    /// Time until the next tick is due
    pub next_tick_in: Duration,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActorSnapshot {
    pub id: ActorId,
    pub name: String,
    pub faction: Faction,
    pub role: Role,
    pub health: f32,
    pub max_health: f32,
    pub mana: Option<f32>,
    pub max_mana: Option<f32>,
    pub alive: bool,
    pub target: Option<ActorId>,
    pub casting: Option<CastProgress>,
    pub gcd_remaining_fraction: f32,
    pub effects: Vec<EffectView>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncounterSnapshot {
    pub time: Duration,
    pub paused: bool,
    pub outcome: Option<Outcome>,
    pub god_mode: bool,
    pub infinite_mana: bool,
    pub party: Vec<ActorSnapshot>,
    pub enemies: Vec<ActorSnapshot>,
}
