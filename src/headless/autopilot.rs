//! Healer Autopilot
//!
//! Plays the player character when nobody is at the keyboard.
//!
//! ## Priority Order
//! 1. Flash Heal (lowest party member under 40% health)
//! 2. Greater Heal (lowest party member under 60% health, if affordable)
//! 3. Heal (lowest party member under 85% health)
//! 4. Renew (keep it rolling on the tank)

use bevy::prelude::*;

use crate::combat::constants::{EMERGENCY_HEAL_THRESHOLD, HEAVY_HEAL_THRESHOLD, TOP_UP_THRESHOLD};
use crate::combat::{ActorId, Role};
use crate::encounter::{Actor, Encounter};

/// Decide and start the player's next cast.
///
/// Returns the spell started this frame, if any.
pub fn autopilot_step(encounter: &mut Encounter) -> Option<String> {
    let player = encounter.player()?;
    if !player.is_alive() || player.is_casting() || player.on_global_cooldown() {
        return None;
    }
    let player_id = player.id();

    let (lowest, fraction) = lowest_party_member(encounter)?;

    // Priority 1: Flash Heal (emergency)
    if fraction < EMERGENCY_HEAL_THRESHOLD && try_cast(encounter, player_id, lowest, "Flash Heal") {
        return Some("Flash Heal".to_string());
    }

    // Priority 2: Greater Heal (big deficit, only when we can pay for it)
    if fraction < HEAVY_HEAL_THRESHOLD && try_cast(encounter, player_id, lowest, "Greater Heal") {
        return Some("Greater Heal".to_string());
    }

    // Priority 3: Heal (efficient top-up)
    if fraction < TOP_UP_THRESHOLD && try_cast(encounter, player_id, lowest, "Heal") {
        return Some("Heal".to_string());
    }

    // Priority 4: Renew on the tank
    if try_renew_tank(encounter, player_id) {
        return Some("Renew".to_string());
    }

    None
}

/// Living party member with the lowest health fraction
fn lowest_party_member(encounter: &Encounter) -> Option<(ActorId, f32)> {
    encounter
        .party()
        .filter(|actor| actor.is_alive())
        .map(|actor| (actor.id(), actor.health().fraction()))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

fn can_afford(player: &Actor, spell: &str, free: bool) -> bool {
    let Some(def) = player.spell(spell) else {
        return false;
    };
    free || player.mana().map_or(true, |mana| mana.current() >= def.cost)
}

fn try_cast(encounter: &mut Encounter, player: ActorId, target: ActorId, spell: &str) -> bool {
    let free = encounter.flags().infinite_mana;
    if !encounter.actor(player).is_some_and(|actor| can_afford(actor, spell, free)) {
        return false;
    }
    encounter.set_target(player, Some(target));
    match encounter.cast_spell(player, spell) {
        Ok(_) => {
            debug!("Autopilot: {} on {}", spell, target);
            true
        }
        Err(_) => false,
    }
}

fn try_renew_tank(encounter: &mut Encounter, player: ActorId) -> bool {
    let Some(tank) = encounter
        .party()
        .find(|actor| actor.is_alive() && actor.role() == Role::Tank)
        .map(|actor| actor.id())
    else {
        return false;
    };
    let has_renew = encounter
        .active_effects(tank)
        .iter()
        .any(|effect| effect.name == "Renew");
    if has_renew {
        return false;
    }
    try_cast(encounter, player, tank, "Renew")
}
