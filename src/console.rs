//! Text command console
//!
//! Parses one line of input into a [`Command`] and runs it against an encounter.
//! A leading `/` is optional, so `/heal` and `heal` are the same command.

use std::fmt;
use std::str::FromStr;

use crate::encounter::Encounter;
use crate::error::CommandError;

pub const HELP_TEXT: &str = "\
Available commands:
  help                 show this list
  cast <spell>         cast a spell from the player's spellbook
  target <name>|clear  select the player's target
  interrupt            cancel the player's cast
  pause | resume       stop or restart the simulation clock
  enemies removeall    remove every enemy from the encounter
  heal                 heal the party to full
  godmode              toggle party invulnerability
  infinitemana         toggle free spells (refills mana)";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Cast(String),
    /// `None` clears the target
    Target(Option<String>),
    Interrupt,
    Pause,
    Resume,
    RemoveAllEnemies,
    HealParty,
    GodMode,
    InfiniteMana,
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        let input = input.strip_prefix('/').unwrap_or(input);
        let mut words = input.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(CommandError::Empty);
        };
        let rest = words.collect::<Vec<_>>().join(" ");

        match verb.to_ascii_lowercase().as_str() {
            "help" => Ok(Command::Help),
            "cast" if rest.is_empty() => Err(CommandError::Usage("cast <spell>")),
            "cast" => Ok(Command::Cast(rest)),
            "target" if rest.is_empty() => Err(CommandError::Usage("target <name>|clear")),
            "target" if rest.eq_ignore_ascii_case("clear") => Ok(Command::Target(None)),
            "target" => Ok(Command::Target(Some(rest))),
            "interrupt" => Ok(Command::Interrupt),
            "pause" => Ok(Command::Pause),
            "resume" => Ok(Command::Resume),
            "enemies" if rest.eq_ignore_ascii_case("removeall") => Ok(Command::RemoveAllEnemies),
            "enemies" => Err(CommandError::Usage("enemies removeall")),
            "heal" => Ok(Command::HealParty),
            "godmode" => Ok(Command::GodMode),
            "infinitemana" => Ok(Command::InfiniteMana),
            _ => Err(CommandError::Unknown(verb.to_string())),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Help => f.write_str("help"),
            Command::Cast(spell) => write!(f, "cast {}", spell),
            Command::Target(Some(name)) => write!(f, "target {}", name),
            Command::Target(None) => f.write_str("target clear"),
            Command::Interrupt => f.write_str("interrupt"),
            Command::Pause => f.write_str("pause"),
            Command::Resume => f.write_str("resume"),
            Command::RemoveAllEnemies => f.write_str("enemies removeall"),
            Command::HealParty => f.write_str("heal"),
            Command::GodMode => f.write_str("godmode"),
            Command::InfiniteMana => f.write_str("infinitemana"),
        }
    }
}

impl Command {
    /// Run the command and describe what happened.
    pub fn execute(&self, encounter: &mut Encounter) -> Result<String, CommandError> {
        match self {
            Command::Help => Ok(HELP_TEXT.to_string()),
            Command::Cast(name) => {
                let player = encounter.player().ok_or(CommandError::NoPlayer)?;
                // Console input is case-insensitive; the spellbook is not
                let spell = player
                    .spellbook()
                    .iter()
                    .find(|spell| spell.name.eq_ignore_ascii_case(name))
                    .map(|spell| spell.name.clone())
                    .unwrap_or_else(|| name.clone());
                let id = player.id();
                encounter.cast_spell(id, &spell)?;
                Ok(format!("Casting {}", spell))
            }
            Command::Target(name) => {
                let player = encounter.player_id().ok_or(CommandError::NoPlayer)?;
                let target = match name {
                    Some(name) => Some(
                        encounter
                            .find_actor(name)
                            .map(|actor| actor.id())
                            .ok_or_else(|| CommandError::UnknownActor(name.clone()))?,
                    ),
                    None => None,
                };
                encounter.set_target(player, target);
                Ok(match name {
                    Some(name) => format!("Target set to {}", name),
                    None => "Target cleared".to_string(),
                })
            }
            Command::Interrupt => {
                let player = encounter.player_id().ok_or(CommandError::NoPlayer)?;
                Ok(if encounter.cancel_cast(player) {
                    "Cast interrupted".to_string()
                } else {
                    "Nothing to interrupt".to_string()
                })
            }
            Command::Pause => {
                encounter.pause();
                Ok("Paused".to_string())
            }
            Command::Resume => {
                encounter.resume();
                Ok("Resumed".to_string())
            }
            Command::RemoveAllEnemies => {
                let removed = encounter.remove_all_enemies();
                Ok(format!("Removed {} enemies", removed))
            }
            Command::HealParty => {
                encounter.heal_party_to_full();
                Ok("Party healed to full".to_string())
            }
            Command::GodMode => Ok(format!("God mode {}", on_off(encounter.toggle_god_mode()))),
            Command::InfiniteMana => Ok(format!(
                "Infinite mana {}",
                on_off(encounter.toggle_infinite_mana())
            )),
        }
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

/// Parse and run one line of console input
pub fn run_command(encounter: &mut Encounter, input: &str) -> Result<String, CommandError> {
    input.parse::<Command>()?.execute(encounter)
}
