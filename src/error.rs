//! Error types
//!
//! Expected rejections are plain values. Nothing here is raised for control flow.

use std::path::PathBuf;

use thiserror::Error;

use crate::combat::ActorId;

/// Why a cast attempt was rejected. A rejected cast changes no state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CastError {
    #[error("no actor with id {0}")]
    UnknownActor(ActorId),
    #[error("can't cast while dead")]
    CasterDead,
    #[error("can't cast during global cooldown")]
    GlobalCooldown,
    #[error("can't cast while casting")]
    AlreadyCasting,
    #[error("can't cast without a target")]
    NoTarget,
    #[error("spell {0} not found in spellbook")]
    UnknownSpell(String),
    #[error("not enough mana ({available} available, {cost} needed)")]
    NotEnoughMana { cost: f32, available: f32 },
}

/// Failure to load or validate encounter and headless configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse RON: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Failure to parse or run a console command.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command: {0}. Type /help for available commands.")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("no actor named {0}")]
    UnknownActor(String),
    #[error("no player character in this encounter")]
    NoPlayer,
    #[error(transparent)]
    Cast(#[from] CastError),
}
