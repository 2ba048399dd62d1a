//! Data-Driven Encounter Definitions
//!
//! Attacks, spells and actors are table rows, not types. One generic effect
//! executor runs every row. The built-in encounter lives in
//! `assets/config/encounter.ron`.
//!
//! ## Usage
//! ```ignore
//! let definition = EncounterDefinition::builtin()?;
//! let heal = definition.spell("Heal").unwrap();
//! println!("Heal cast time: {:?}", heal.cast_time());
//! ```

use bevy::log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crate::combat::log::CombatEventType;
use crate::combat::targeting::Targeting;
use crate::combat::{Faction, Role};
use crate::error::ConfigError;
use crate::scheduler::Timing;

/// The demo encounter shipped with the crate
pub const BUILTIN_ENCOUNTER: &str = include_str!("../../assets/config/encounter.ron");

fn default_attack_event() -> CombatEventType {
    CombatEventType::SwingDamage
}

/// A recurring attack. Runs until its owner dies or is removed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttackDef {
    pub name: String,
    /// Time before the first swing
    #[serde(default)]
    pub delay_ms: u64,
    /// Time between swings
    pub interval_ms: u64,
    pub min_damage: u32,
    pub max_damage: u32,
    /// Event type logged for each hit
    #[serde(default = "default_attack_event")]
    pub event_type: CombatEventType,
    /// Audio cue played on each hit
    #[serde(default)]
    pub sound: Option<String>,
}

impl AttackDef {
    pub fn timing(&self) -> Timing {
        Timing::forever(
            Duration::from_millis(self.delay_ms),
            Duration::from_millis(self.interval_ms),
        )
    }
}

/// A heal-over-time: `total_heal` split evenly over `ticks` cycles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HotDef {
    pub name: String,
    pub total_heal: f32,
    pub interval_ms: u64,
    pub ticks: u32,
    #[serde(default)]
    pub delay_ms: u64,
}

impl HotDef {
    /// Heal applied on each cycle
    pub fn per_tick(&self) -> f32 {
        if self.ticks == 0 {
            0.0
        } else {
            self.total_heal / self.ticks as f32
        }
    }

    pub fn timing(&self) -> Timing {
        Timing::times(
            Duration::from_millis(self.delay_ms),
            Duration::from_millis(self.interval_ms),
            self.ticks,
        )
    }
}

/// A castable spell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpellDef {
    pub name: String,
    /// Mana paid when the cast completes
    #[serde(default)]
    pub cost: f32,
    /// Direct heal applied when the cast completes
    #[serde(default)]
    pub heal: f32,
    /// Cast time in milliseconds (0 = instant)
    #[serde(default)]
    pub cast_time_ms: u64,
    /// Heal-over-time applied to the target when the cast completes
    #[serde(default)]
    pub hot: Option<HotDef>,
    /// Extra audio cue played when the cast completes
    #[serde(default)]
    pub sound: Option<String>,
}

impl SpellDef {
    pub fn cast_time(&self) -> Duration {
        Duration::from_millis(self.cast_time_ms)
    }
}

/// One actor to field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActorTemplate {
    pub name: String,
    pub faction: Faction,
    pub role: Role,
    pub health: f32,
    #[serde(default)]
    pub mana: Option<f32>,
    pub targeting: Targeting,
    /// Names of rows in the attack table
    #[serde(default)]
    pub attacks: Vec<String>,
    /// Names of rows in the spell table
    #[serde(default)]
    pub spellbook: Vec<String>,
    /// The actor driven by console input and the autopilot
    #[serde(default)]
    pub player: bool,
}

/// Root structure of an encounter RON file
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncounterDefinition {
    #[serde(default)]
    pub attacks: Vec<AttackDef>,
    #[serde(default)]
    pub spells: Vec<SpellDef>,
    pub party: Vec<ActorTemplate>,
    #[serde(default)]
    pub enemies: Vec<ActorTemplate>,
    /// Validated like fielded actors but never fielded. Move one into
    /// `enemies` (or `party`) to bring it into the encounter.
    #[serde(default)]
    pub reserves: Vec<ActorTemplate>,
}

impl EncounterDefinition {
    /// The built-in demo encounter
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_ron_str(BUILTIN_ENCOUNTER)
    }

    /// Parse and validate a RON definition
    pub fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        let definition: EncounterDefinition = ron::from_str(contents)?;
        definition.validate()?;
        Ok(definition)
    }

    /// Load, parse and validate a RON definition from disk
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let definition = Self::from_ron_str(&contents)?;
        info!(
            "Loaded encounter from {:?}: {} party, {} enemies",
            path,
            definition.party.len(),
            definition.enemies.len()
        );
        Ok(definition)
    }

    pub fn attack(&self, name: &str) -> Option<&AttackDef> {
        self.attacks.iter().find(|a| a.name == name)
    }

    pub fn spell(&self, name: &str) -> Option<&SpellDef> {
        self.spells.iter().find(|s| s.name == name)
    }

    /// Templates in fielding order: party first, then enemies
    pub fn templates(&self) -> impl Iterator<Item = &ActorTemplate> {
        self.party.iter().chain(self.enemies.iter())
    }

    /// Look up a template by name, reserves included
    pub fn template(&self, name: &str) -> Option<&ActorTemplate> {
        self.templates().chain(self.reserves.iter()).find(|t| t.name == name)
    }

    /// Check table consistency and actor sanity
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| Err(ConfigError::Invalid(message));

        if self.party.is_empty() {
            return invalid("party must have at least one member".to_string());
        }

        let mut names = HashSet::new();
        for attack in &self.attacks {
            if !names.insert(attack.name.as_str()) {
                return invalid(format!("duplicate attack '{}'", attack.name));
            }
            if attack.interval_ms == 0 {
                return invalid(format!("attack '{}' must have a positive interval", attack.name));
            }
            if attack.min_damage > attack.max_damage {
                return invalid(format!(
                    "attack '{}' has min_damage {} above max_damage {}",
                    attack.name, attack.min_damage, attack.max_damage
                ));
            }
            if !attack.event_type.is_damage() {
                return invalid(format!(
                    "attack '{}' must log a damage event, not {}",
                    attack.name, attack.event_type
                ));
            }
        }

        names.clear();
        for spell in &self.spells {
            if !names.insert(spell.name.as_str()) {
                return invalid(format!("duplicate spell '{}'", spell.name));
            }
            if spell.cost < 0.0 || spell.heal < 0.0 {
                return invalid(format!("spell '{}' has a negative cost or heal", spell.name));
            }
            if let Some(hot) = &spell.hot {
                if hot.ticks == 0 {
                    return invalid(format!("heal-over-time '{}' must tick at least once", hot.name));
                }
                if hot.ticks > 1 && hot.interval_ms == 0 {
                    return invalid(format!("heal-over-time '{}' must have a positive interval", hot.name));
                }
            }
        }

        let mut players = 0;
        for template in self.templates().chain(self.reserves.iter()) {
            if !(template.health > 0.0) {
                return invalid(format!("'{}' must have positive health", template.name));
            }
            if template.mana.is_some_and(|mana| mana < 0.0) {
                return invalid(format!("'{}' has negative mana", template.name));
            }
            for attack in &template.attacks {
                if self.attack(attack).is_none() {
                    return invalid(format!("'{}' uses unknown attack '{}'", template.name, attack));
                }
            }
            for spell in &template.spellbook {
                if self.spell(spell).is_none() {
                    return invalid(format!("'{}' knows unknown spell '{}'", template.name, spell));
                }
            }
            if template.player {
                players += 1;
                if template.faction != Faction::Party {
                    return invalid(format!("player '{}' must be in the party", template.name));
                }
            }
        }
        if players > 1 {
            return invalid(format!("at most one player actor allowed, found {}", players));
        }

        Ok(())
    }
}
