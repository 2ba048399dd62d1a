//! HealSim - Healer Encounter Simulator
//!
//! A real-time healer-versus-enemies combat encounter: actors exchange timed
//! attacks and heals while the player casts spells under cooldown and mana
//! constraints.
//!
//! This library exposes the simulation core for testing and reuse.

pub mod cli;
pub mod combat;
pub mod console;
pub mod encounter;
pub mod error;
pub mod headless;
pub mod interactive;
pub mod scheduler;

// Re-export commonly used types
pub use combat::log::{CombatEventType, CombatLog, CombatLogEvent};
pub use combat::ActorId;
pub use encounter::{Encounter, EncounterDefinition};
pub use error::{CastError, CommandError, ConfigError};
pub use headless::HeadlessConfig;
