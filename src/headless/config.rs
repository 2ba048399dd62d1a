//! JSON configuration parsing for headless mode
//!
//! Parses JSON run configurations and resolves the encounter definition they name.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::console::Command;
use crate::encounter::EncounterDefinition;
use crate::error::ConfigError;

/// Longest run a configuration may ask for (one day of encounter time)
pub const MAX_DURATION_SECS: f32 = 86_400.0;

/// A console command issued at a fixed encounter time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledCommand {
    /// Encounter time in seconds at which the command runs
    pub at_secs: f32,
    /// Console input, e.g. `"cast Flash Heal"` or `"godmode"`
    pub command: String,
}

/// Headless run configuration loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadlessConfig {
    /// Encounter RON file (default: the built-in demo encounter)
    #[serde(default)]
    pub encounter: Option<String>,
    /// Maximum encounter duration in seconds (default: 300)
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f32,
    /// Random seed for deterministic encounter reproduction
    /// If provided, the encounter will use a seeded RNG for reproducible results
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Simulated frame length in milliseconds (default: 16)
    #[serde(default = "default_frame_ms")]
    pub frame_ms: u64,
    #[serde(default)]
    pub god_mode: bool,
    #[serde(default)]
    pub infinite_mana: bool,
    /// Let the healer autopilot play the player character (default: true)
    #[serde(default = "default_autopilot")]
    pub autopilot: bool,
    /// Scripted console commands, run in time order
    #[serde(default)]
    pub commands: Vec<ScheduledCommand>,
    /// Custom output path for the combat log (optional)
    #[serde(default)]
    pub output_path: Option<String>,
}

fn default_max_duration() -> f32 {
    300.0
}

fn default_frame_ms() -> u64 {
    16
}

fn default_autopilot() -> bool {
    true
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            encounter: None,
            max_duration_secs: default_max_duration(),
            random_seed: None,
            frame_ms: default_frame_ms(),
            god_mode: false,
            infinite_mana: false,
            autopilot: default_autopilot(),
            commands: Vec::new(),
            output_path: None,
        }
    }
}

impl HeadlessConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let config: HeadlessConfig = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| Err(ConfigError::Invalid(message));

        if !(self.max_duration_secs > 0.0 && self.max_duration_secs <= MAX_DURATION_SECS) {
            return invalid(format!(
                "max_duration_secs must be in (0, {}], got {}",
                MAX_DURATION_SECS, self.max_duration_secs
            ));
        }
        if self.frame_ms == 0 {
            return invalid("frame_ms must be positive".to_string());
        }

        for scheduled in &self.commands {
            if !(scheduled.at_secs >= 0.0 && scheduled.at_secs <= MAX_DURATION_SECS) {
                return invalid(format!(
                    "command '{}' has time {} outside [0, {}]",
                    scheduled.command, scheduled.at_secs, MAX_DURATION_SECS
                ));
            }
            if let Err(e) = scheduled.command.parse::<Command>() {
                return invalid(format!("invalid command '{}': {}", scheduled.command, e));
            }
        }

        Ok(())
    }

    pub fn frame(&self) -> Duration {
        Duration::from_millis(self.frame_ms)
    }

    /// Run time limit. Zero for an out-of-range value, which ends the run at once.
    pub fn max_duration(&self) -> Duration {
        Duration::try_from_secs_f32(self.max_duration_secs).unwrap_or(Duration::ZERO)
    }

    /// Load the encounter this configuration names
    pub fn load_encounter(&self) -> Result<EncounterDefinition, ConfigError> {
        match &self.encounter {
            Some(path) => EncounterDefinition::load_from_file(Path::new(path)),
            None => EncounterDefinition::builtin(),
        }
    }

    /// Scripted commands sorted by time, parsed. Entries that fail validation are dropped.
    pub fn schedule(&self) -> Vec<(Duration, Command)> {
        let mut schedule: Vec<(Duration, Command)> = self
            .commands
            .iter()
            .filter_map(|scheduled| {
                let at = Duration::try_from_secs_f32(scheduled.at_secs).ok()?;
                let command = scheduled.command.parse().ok()?;
                Some((at, command))
            })
            .collect();
        schedule.sort_by_key(|(at, _)| *at);
        schedule
    }
}
