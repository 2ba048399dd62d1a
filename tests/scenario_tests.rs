//! Integration tests for encounter simulation
//!
//! These tests drive a full encounter through its public API and verify:
//! - Spell casts settle mana, cooldown and logging on completion and interruption
//! - Damage, death and heal-over-time bookkeeping
//! - Cast exclusivity and logging completeness under long runs
//! - Developer toggles (god mode, infinite mana, roster commands)

use healsim::combat::log::CombatEventType;
use healsim::combat::targeting::{ManualFallback, Targeting};
use healsim::combat::{ActorId, Faction, Role};
use healsim::encounter::{
    ActorTemplate, AttackDef, Encounter, EncounterDefinition, HotDef, Outcome, RecordingAudio, SpellDef,
};
use healsim::headless::autopilot_step;
use healsim::CastError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

// =============================================================================
// Helpers
// =============================================================================

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

fn attack(name: &str, delay_ms: u64, interval_ms: u64, min: u32, max: u32) -> AttackDef {
    AttackDef {
        name: name.to_string(),
        delay_ms,
        interval_ms,
        min_damage: min,
        max_damage: max,
        event_type: CombatEventType::SwingDamage,
        sound: None,
    }
}

fn spell(name: &str, cost: f32, heal: f32, cast_time_ms: u64) -> SpellDef {
    SpellDef {
        name: name.to_string(),
        cost,
        heal,
        cast_time_ms,
        hot: None,
        sound: None,
    }
}

fn actor(name: &str, faction: Faction, role: Role, health: f32, targeting: Targeting) -> ActorTemplate {
    ActorTemplate {
        name: name.to_string(),
        faction,
        role,
        health,
        mana: None,
        targeting,
        attacks: Vec::new(),
        spellbook: Vec::new(),
        player: false,
    }
}

fn healer(health: f32, mana: f32, spells: &[&str]) -> ActorTemplate {
    ActorTemplate {
        mana: Some(mana),
        spellbook: spells.iter().map(|s| s.to_string()).collect(),
        player: true,
        ..actor("Player", Faction::Party, Role::Healer, health, Targeting::Manual(ManualFallback::Caster))
    }
}

/// Healer with 100 mana and a 50-mana, 2-second heal
fn casting_setup() -> Encounter {
    let definition = EncounterDefinition {
        reserves: Vec::new(),
        attacks: Vec::new(),
        spells: vec![spell("Heal", 50.0, 30.0, 2000)],
        party: vec![healer(100.0, 100.0, &["Heal"])],
        enemies: Vec::new(),
    };
    Encounter::new(&definition, Some(1)).unwrap()
}

fn advance_by(encounter: &mut Encounter, step: Duration, frames: u32) {
    for _ in 0..frames {
        encounter.advance(step);
    }
}

fn mana_of(encounter: &Encounter, id: ActorId) -> f32 {
    encounter.actor(id).unwrap().mana().unwrap().current()
}

// =============================================================================
// Spell Cast Tests
// =============================================================================

#[test]
fn test_completed_cast_spends_mana_and_logs_once() {
    let mut encounter = casting_setup();
    let player = encounter.player_id().unwrap();

    encounter.cast_spell(player, "Heal").unwrap();
    assert!(encounter.actor(player).unwrap().is_casting());
    assert!(encounter.actor(player).unwrap().on_global_cooldown());

    advance_by(&mut encounter, ms(100), 15);
    assert!(
        !encounter.actor(player).unwrap().on_global_cooldown(),
        "Global cooldown expires after its own fixed duration"
    );
    assert!(encounter.actor(player).unwrap().is_casting());
    assert_eq!(mana_of(&encounter, player), 100.0, "Mana is paid on completion only");

    advance_by(&mut encounter, ms(100), 5);
    let log = encounter.combat_log();
    assert_eq!(mana_of(&encounter, player), 50.0);
    assert_eq!(log.count_of(CombatEventType::SpellCastStart), 1);
    assert_eq!(log.count_of(CombatEventType::SpellCastSuccess), 1);
    assert_eq!(log.count_of(CombatEventType::SpellHeal), 1);
    assert!(!encounter.actor(player).unwrap().is_casting());

    let change = log.events_of(CombatEventType::ResourceChange);
    assert_eq!(change.len(), 1);
    assert_eq!(change[0].value, Some(-50.0));
    assert_eq!(change[0].extra_info.as_deref(), Some("MANA"));

    let order: Vec<CombatEventType> = log.entries().iter().map(|e| e.event_type).collect();
    assert_eq!(
        order,
        vec![
            CombatEventType::EncounterStart,
            CombatEventType::SpellCastStart,
            CombatEventType::SpellCastSuccess,
            CombatEventType::SpellHeal,
            CombatEventType::ResourceChange,
        ]
    );
}

#[test]
fn test_interrupted_cast_keeps_mana_and_cooldown() {
    let mut encounter = casting_setup();
    let player = encounter.player_id().unwrap();

    encounter.cast_spell(player, "Heal").unwrap();
    advance_by(&mut encounter, ms(100), 10);
    assert!(encounter.interrupt_cast(player));

    let log = encounter.combat_log();
    assert_eq!(mana_of(&encounter, player), 100.0);
    assert_eq!(log.count_of(CombatEventType::SpellCastInterrupted), 1);
    assert_eq!(log.count_of(CombatEventType::ResourceChange), 0);
    assert!(encounter.casting(player).is_none());

    // The global cooldown is neither refunded nor shortened
    let remaining = encounter.gcd_remaining_fraction(player);
    assert!((remaining - 1.0 / 3.0).abs() < 1e-4, "remaining fraction {}", remaining);
    assert_eq!(encounter.cast_spell(player, "Heal"), Err(CastError::GlobalCooldown));

    advance_by(&mut encounter, ms(100), 4);
    assert!(encounter.actor(player).unwrap().on_global_cooldown());
    advance_by(&mut encounter, ms(100), 1);
    assert!(!encounter.actor(player).unwrap().on_global_cooldown());

    advance_by(&mut encounter, ms(100), 30);
    assert_eq!(encounter.combat_log().count_of(CombatEventType::SpellCastSuccess), 0);
    assert_eq!(mana_of(&encounter, player), 100.0);
}

#[test]
fn test_player_cancel_clears_cooldown_and_silences_cast() {
    let definition = EncounterDefinition {
        reserves: Vec::new(),
        attacks: Vec::new(),
        spells: vec![spell("Heal", 50.0, 30.0, 2000)],
        party: vec![healer(100.0, 100.0, &["Heal"])],
        enemies: Vec::new(),
    };
    let audio = RecordingAudio::default();
    let mut encounter = Encounter::with_audio(&definition, Some(1), Box::new(audio.clone())).unwrap();
    let player = encounter.player_id().unwrap();

    encounter.cast_spell(player, "Heal").unwrap();
    advance_by(&mut encounter, ms(100), 5);
    assert!(encounter.cancel_cast(player));
    assert!(!encounter.cancel_cast(player), "Nothing left to cancel");

    let journal = audio.journal();
    assert_eq!(journal.played, vec!["spell.precast", "spell.fizzle"]);
    assert_eq!(journal.stopped.len(), 1, "Precast loop is stopped");
    assert_eq!(encounter.combat_log().count_of(CombatEventType::SpellCastInterrupted), 1);

    // Player cancel drops the cooldown, so a new cast is accepted right away
    assert!(!encounter.actor(player).unwrap().on_global_cooldown());
    assert!(encounter.cast_spell(player, "Heal").is_ok());
}

#[test]
fn test_attacks_play_their_cue() {
    let definition = EncounterDefinition::builtin().unwrap();
    let audio = RecordingAudio::default();
    let mut encounter = Encounter::with_audio(&definition, Some(1), Box::new(audio.clone())).unwrap();

    encounter.advance(ms(16));
    let played = audio.journal().played;
    assert!(played.iter().any(|cue| cue == "combat.air_hit"), "Quick Stab cue: {:?}", played);
    assert!(played.iter().any(|cue| cue == "combat.sword_hit"), "Shield Bash cue: {:?}", played);
}

#[test]
fn test_cast_rejections_change_nothing() {
    let definition = EncounterDefinition {
        reserves: Vec::new(),
        attacks: Vec::new(),
        spells: vec![
            spell("Heal", 50.0, 30.0, 2000),
            spell("Greater Heal", 100.0, 150.0, 3000),
            spell("Renew", 0.0, 0.0, 0),
        ],
        party: vec![
            healer(100.0, 90.0, &["Heal", "Greater Heal", "Renew"]),
            ActorTemplate {
                spellbook: vec!["Heal".to_string()],
                ..actor("Paladin", Faction::Party, Role::Tank, 100.0, Targeting::RandomOpponent)
            },
        ],
        enemies: Vec::new(),
    };
    let mut encounter = Encounter::new(&definition, Some(1)).unwrap();
    let player = encounter.player_id().unwrap();
    let paladin = encounter.find_actor("paladin").unwrap().id();

    assert_eq!(
        encounter.cast_spell(player, "Smite"),
        Err(CastError::UnknownSpell("Smite".to_string()))
    );
    assert_eq!(
        encounter.cast_spell(player, "Greater Heal"),
        Err(CastError::NotEnoughMana {
            cost: 100.0,
            available: 90.0
        })
    );
    assert_eq!(encounter.cast_spell(paladin, "Heal"), Err(CastError::NoTarget));
    assert_eq!(encounter.cast_spell(ActorId(99), "Heal"), Err(CastError::UnknownActor(ActorId(99))));
    assert_eq!(encounter.combat_log().count_of(CombatEventType::SpellCastStart), 0);

    encounter.cast_spell(player, "Heal").unwrap();
    assert_eq!(encounter.cast_spell(player, "Renew"), Err(CastError::GlobalCooldown));
    advance_by(&mut encounter, ms(100), 16);
    assert_eq!(encounter.cast_spell(player, "Renew"), Err(CastError::AlreadyCasting));
    assert_eq!(encounter.combat_log().count_of(CombatEventType::SpellCastStart), 1);
}

#[test]
fn test_rejected_cast_keeps_target_and_rng() {
    let definition = EncounterDefinition {
        reserves: Vec::new(),
        attacks: vec![attack("Bite", 0, 1000, 5, 15)],
        spells: vec![spell("Heal", 50.0, 30.0, 2000)],
        party: vec![
            ActorTemplate {
                mana: Some(10.0),
                spellbook: vec!["Heal".to_string()],
                attacks: vec!["Bite".to_string()],
                ..actor("Paladin", Faction::Party, Role::Tank, 200.0, Targeting::RandomOpponent)
            },
            healer(200.0, 100.0, &["Heal"]),
        ],
        enemies: vec![
            ActorTemplate {
                attacks: vec!["Bite".to_string()],
                ..actor("Wolf", Faction::Enemy, Role::Damage, 500.0, Targeting::RandomOpponent)
            },
            ActorTemplate {
                attacks: vec!["Bite".to_string()],
                ..actor("Jackal", Faction::Enemy, Role::Damage, 500.0, Targeting::RandomOpponent)
            },
        ],
    };
    let mut quiet = Encounter::new(&definition, Some(17)).unwrap();
    let mut noisy = Encounter::new(&definition, Some(17)).unwrap();
    let paladin = noisy.find_actor("Paladin").unwrap().id();

    for _ in 0..5 {
        assert!(matches!(
            noisy.cast_spell(paladin, "Heal"),
            Err(CastError::NotEnoughMana { .. })
        ));
        assert_eq!(noisy.cast_spell(paladin, "Smite"), Err(CastError::UnknownSpell("Smite".to_string())));
    }
    assert_eq!(noisy.actor(paladin).unwrap().current_target(), None);

    advance_by(&mut quiet, ms(100), 200);
    advance_by(&mut noisy, ms(100), 200);
    assert_eq!(
        quiet.combat_log().entries(),
        noisy.combat_log().entries(),
        "Rejected casts must not change the seeded run"
    );
}

#[test]
fn test_instant_spell_fires_on_next_advance() {
    let mut encounter = casting_setup_with(spell("Renew", 10.0, 5.0, 0));
    let player = encounter.player_id().unwrap();

    encounter.cast_spell(player, "Renew").unwrap();
    assert_eq!(encounter.combat_log().count_of(CombatEventType::SpellCastSuccess), 0);
    encounter.advance(ms(16));
    assert_eq!(encounter.combat_log().count_of(CombatEventType::SpellCastSuccess), 1);
    assert_eq!(mana_of(&encounter, player), 90.0);
}

fn casting_setup_with(extra: SpellDef) -> Encounter {
    let name = extra.name.clone();
    let definition = EncounterDefinition {
        reserves: Vec::new(),
        attacks: Vec::new(),
        spells: vec![extra],
        party: vec![healer(100.0, 100.0, &[name.as_str()])],
        enemies: Vec::new(),
    };
    Encounter::new(&definition, Some(1)).unwrap()
}

// =============================================================================
// Damage and Death Tests
// =============================================================================

#[test]
fn test_lethal_hit_logs_damage_then_death() {
    let definition = EncounterDefinition {
        reserves: Vec::new(),
        attacks: vec![attack("Crush", 0, 10_000, 70, 70)],
        spells: Vec::new(),
        party: vec![
            actor("Tank", Faction::Party, Role::Tank, 50.0, Targeting::RandomOpponent),
            healer(1000.0, 100.0, &[]),
        ],
        enemies: vec![ActorTemplate {
            attacks: vec!["Crush".to_string()],
            ..actor("Ogre", Faction::Enemy, Role::Damage, 500.0, Targeting::PreferRole(Role::Tank))
        }],
    };
    let mut encounter = Encounter::new(&definition, Some(3)).unwrap();
    let tank = encounter.find_actor("Tank").unwrap().id();

    encounter.advance(ms(16));
    assert_eq!(encounter.actor(tank).unwrap().health().current(), 0.0);
    assert!(!encounter.is_alive(tank));

    let entries = encounter.combat_log().entries();
    let hit = entries.len() - 2;
    assert_eq!(entries[hit].event_type, CombatEventType::SwingDamage);
    assert_eq!(entries[hit].value, Some(70.0));
    assert_eq!(entries[hit].target_id, Some(tank));
    assert_eq!(entries[hit + 1].event_type, CombatEventType::UnitDied);
    assert_eq!(entries[hit + 1].target_id, Some(tank));

    // The ogre moves on to the healer and the tank never dies twice
    advance_by(&mut encounter, ms(500), 45);
    let log = encounter.combat_log();
    assert_eq!(log.count_of(CombatEventType::UnitDied), 1);
    let later_targets: Vec<Option<ActorId>> = log
        .iter_of(CombatEventType::SwingDamage)
        .skip(1)
        .map(|e| e.target_id)
        .collect();
    assert!(!later_targets.is_empty());
    assert!(later_targets.iter().all(|t| *t != Some(tank)));
}

#[test]
fn test_death_interrupts_cast_and_ends_encounter() {
    let definition = EncounterDefinition {
        reserves: Vec::new(),
        attacks: vec![attack("Ambush", 1000, 10_000, 100, 100)],
        spells: vec![spell("Heal", 50.0, 30.0, 2000)],
        party: vec![healer(50.0, 100.0, &["Heal"])],
        enemies: vec![ActorTemplate {
            attacks: vec!["Ambush".to_string()],
            ..actor("Rogue", Faction::Enemy, Role::Damage, 100.0, Targeting::RandomOpponent)
        }],
    };
    let mut encounter = Encounter::new(&definition, Some(3)).unwrap();
    let player = encounter.player_id().unwrap();

    encounter.cast_spell(player, "Heal").unwrap();
    advance_by(&mut encounter, ms(100), 10);

    assert!(encounter.is_party_defeated());
    assert_eq!(encounter.outcome(), Some(Outcome::Defeat));
    assert!(encounter.casting(player).is_none());
    assert!(!encounter.actor(player).unwrap().on_global_cooldown());

    let order: Vec<CombatEventType> = encounter
        .combat_log()
        .entries()
        .iter()
        .map(|e| e.event_type)
        .skip(2)
        .collect();
    assert_eq!(
        order,
        vec![
            CombatEventType::SwingDamage,
            CombatEventType::UnitDied,
            CombatEventType::SpellCastInterrupted,
            CombatEventType::EncounterEnd,
        ]
    );
    assert_eq!(mana_of(&encounter, player), 100.0);

    // A finished encounter no longer advances
    let time = encounter.time();
    let events = encounter.combat_log().len();
    advance_by(&mut encounter, ms(100), 30);
    assert_eq!(encounter.time(), time);
    assert_eq!(encounter.combat_log().len(), events);
    assert_eq!(encounter.cast_spell(player, "Heal"), Err(CastError::CasterDead));
}

#[test]
fn test_victory_is_logged_once() {
    let mut definition = EncounterDefinition::builtin().unwrap();
    definition.party[0].attacks = vec!["Mighty Swing".to_string()];
    let mut encounter = Encounter::new(&definition, Some(9)).unwrap();
    encounter.set_god_mode(true);

    for _ in 0..2000 {
        encounter.advance(ms(16));
    }
    assert_eq!(encounter.outcome(), Some(Outcome::Victory));
    let ends = encounter.combat_log().events_of(CombatEventType::EncounterEnd);
    assert_eq!(ends.len(), 1);
    assert_eq!(ends[0].extra_info.as_deref(), Some("VICTORY"));
}

// =============================================================================
// Heal-over-time Tests
// =============================================================================

#[test]
fn test_heal_over_time_is_clamped_and_stops_after_last_tick() {
    let definition = EncounterDefinition {
        reserves: Vec::new(),
        attacks: vec![attack("Scratch", 0, 1_000_000, 10, 10)],
        spells: vec![SpellDef {
            hot: Some(HotDef {
                name: "Rejuvenation".to_string(),
                total_heal: 100.0,
                interval_ms: 1000,
                ticks: 5,
                delay_ms: 0,
            }),
            ..spell("Rejuvenation", 0.0, 0.0, 0)
        }],
        party: vec![
            actor("Tank", Faction::Party, Role::Tank, 90.0, Targeting::RandomOpponent),
            healer(100.0, 100.0, &["Rejuvenation"]),
        ],
        enemies: vec![ActorTemplate {
            attacks: vec!["Scratch".to_string()],
            ..actor("Cat", Faction::Enemy, Role::Damage, 100.0, Targeting::PreferRole(Role::Tank))
        }],
    };
    let mut encounter = Encounter::new(&definition, Some(5)).unwrap();
    let tank = encounter.find_actor("Tank").unwrap().id();
    let player = encounter.player_id().unwrap();

    encounter.advance(ms(16));
    assert_eq!(encounter.actor(tank).unwrap().health().current(), 80.0);

    assert!(encounter.set_target(player, Some(tank)));
    encounter.cast_spell(player, "Rejuvenation").unwrap();
    encounter.advance(ms(16));
    assert_eq!(encounter.combat_log().count_of(CombatEventType::SpellAuraApplied), 1);
    assert_eq!(encounter.active_effects(tank).iter().filter(|e| e.name == "Rejuvenation").count(), 1);

    advance_by(&mut encounter, ms(1000), 10);

    let log = encounter.combat_log();
    let ticks = log.events_of(CombatEventType::PeriodicSpellHeal);
    assert_eq!(ticks.len(), 5, "Exactly five ticks, the sixth never fires");
    let healed: f32 = ticks.iter().filter_map(|e| e.value).sum();
    assert!(healed <= 10.0, "Healed {} past max health", healed);
    assert_eq!(ticks[0].value, Some(10.0), "First tick is clamped at max health");
    assert_eq!(encounter.actor(tank).unwrap().health().current(), 90.0);
    assert_eq!(log.count_of(CombatEventType::SpellAuraRemoved), 1);
    assert!(encounter.active_effects(tank).iter().all(|e| e.name != "Rejuvenation"));
}

#[test]
fn test_heal_over_time_finishes_after_caster_dies() {
    let definition = EncounterDefinition {
        reserves: Vec::new(),
        attacks: vec![attack("Ambush", 500, 1_000_000, 100, 100)],
        spells: vec![SpellDef {
            hot: Some(HotDef {
                name: "Renew".to_string(),
                total_heal: 30.0,
                interval_ms: 2000,
                ticks: 5,
                delay_ms: 0,
            }),
            ..spell("Renew", 0.0, 0.0, 0)
        }],
        party: vec![
            actor("Tank", Faction::Party, Role::Tank, 300.0, Targeting::RandomOpponent),
            healer(50.0, 100.0, &["Renew"]),
        ],
        enemies: vec![ActorTemplate {
            attacks: vec!["Ambush".to_string()],
            ..actor("Rogue", Faction::Enemy, Role::Damage, 100.0, Targeting::PreferRole(Role::Healer))
        }],
    };
    let mut encounter = Encounter::new(&definition, Some(5)).unwrap();
    let tank = encounter.find_actor("Tank").unwrap().id();
    let player = encounter.player_id().unwrap();

    assert!(encounter.set_target(player, Some(tank)));
    encounter.cast_spell(player, "Renew").unwrap();
    advance_by(&mut encounter, ms(100), 6);
    assert!(!encounter.is_alive(player), "Healer dies to the ambush");
    assert_eq!(encounter.active_effects(tank).len(), 1);

    advance_by(&mut encounter, ms(100), 120);

    let log = encounter.combat_log();
    assert_eq!(log.count_of(CombatEventType::PeriodicSpellHeal), 5);
    assert_eq!(log.count_of(CombatEventType::SpellAuraRemoved), 1);
    assert!(encounter.active_effects(tank).is_empty());
    assert_eq!(encounter.outcome(), None);
}

// =============================================================================
// Invariant Tests
// =============================================================================

#[test]
fn test_cast_exclusivity_under_random_input() {
    let definition = EncounterDefinition::builtin().unwrap();
    let mut encounter = Encounter::new(&definition, Some(21)).unwrap();
    encounter.set_god_mode(true);
    let player = encounter.player_id().unwrap();
    let spells = ["Heal", "Flash Heal", "Greater Heal", "Renew"];
    let mut rng = StdRng::seed_from_u64(99);

    for _ in 0..2000 {
        match rng.gen_range(0..10) {
            0..=3 => {
                let _ = encounter.cast_spell(player, spells[rng.gen_range(0..spells.len())]);
            }
            4 => {
                encounter.interrupt_cast(player);
            }
            5 => {
                encounter.cancel_cast(player);
            }
            _ => encounter.advance(ms(rng.gen_range(0..400))),
        }

        let log = encounter.combat_log();
        let started = log.count_of(CombatEventType::SpellCastStart);
        let settled = log.count_of(CombatEventType::SpellCastSuccess)
            + log.count_of(CombatEventType::SpellCastInterrupted);
        let outstanding = started - settled;
        assert!(outstanding <= 1, "{} casts outstanding", outstanding);
        assert_eq!(outstanding == 1, encounter.actor(player).unwrap().is_casting());
    }
}

#[test]
fn test_every_health_change_is_logged_in_the_same_frame() {
    let definition = EncounterDefinition::builtin().unwrap();
    let mut encounter = Encounter::new(&definition, Some(4)).unwrap();
    let ids: Vec<ActorId> = encounter.party().chain(encounter.enemies()).map(|a| a.id()).collect();

    for _ in 0..3000 {
        if encounter.is_over() {
            break;
        }
        let before: Vec<f32> = ids
            .iter()
            .map(|id| encounter.actor(*id).unwrap().health().current())
            .collect();
        let first_new = encounter.combat_log().len();

        autopilot_step(&mut encounter);
        encounter.advance(ms(16));

        let new_events = &encounter.combat_log().entries()[first_new..];
        for (id, before) in ids.iter().zip(before) {
            let after = encounter.actor(*id).unwrap().health().current();
            if after <= 0.0 {
                continue;
            }
            let delta: f32 = new_events
                .iter()
                .filter(|e| e.target_id == Some(*id))
                .map(|e| match e.event_type {
                    t if t.is_heal() => e.value.unwrap_or(0.0),
                    t if t.is_damage() => -e.value.unwrap_or(0.0),
                    _ => 0.0,
                })
                .sum();
            assert!(
                (after - before - delta).abs() < 1e-3,
                "{} changed by {} but the log accounts for {}",
                id,
                after - before,
                delta
            );
        }
    }

    let log = encounter.combat_log();
    for id in &ids {
        let deaths = log
            .iter_of(CombatEventType::UnitDied)
            .filter(|e| e.target_id == Some(*id))
            .count();
        assert!(deaths <= 1);
        assert_eq!(deaths == 1, !encounter.is_alive(*id));
    }
}

// =============================================================================
// Developer Toggle Tests
// =============================================================================

#[test]
fn test_god_mode_keeps_party_health_but_logs_hits() {
    let definition = EncounterDefinition::builtin().unwrap();
    let mut encounter = Encounter::new(&definition, Some(8)).unwrap();
    encounter.set_god_mode(true);

    advance_by(&mut encounter, ms(16), 1500);
    for member in encounter.party() {
        assert!(member.health().is_full(), "{} lost health in god mode", member.name());
    }
    let party_hits = encounter
        .combat_log()
        .entries()
        .iter()
        .filter(|e| e.event_type.is_damage() && e.source_name.as_deref() == Some("Tiny wolf"))
        .count();
    assert!(party_hits > 0, "Incoming damage is still logged");
}

#[test]
fn test_infinite_mana_skips_cost() {
    let mut encounter = casting_setup();
    let player = encounter.player_id().unwrap();
    encounter.set_infinite_mana(true);

    for _ in 0..3 {
        encounter.cast_spell(player, "Heal").unwrap();
        advance_by(&mut encounter, ms(100), 21);
    }
    assert_eq!(encounter.combat_log().count_of(CombatEventType::SpellCastSuccess), 3);
    assert_eq!(mana_of(&encounter, player), 100.0);
    assert_eq!(encounter.combat_log().count_of(CombatEventType::ResourceChange), 0);
}

#[test]
fn test_remove_all_enemies_stops_their_attacks() {
    let definition = EncounterDefinition::builtin().unwrap();
    let mut encounter = Encounter::new(&definition, Some(2)).unwrap();
    let tasks = encounter.task_count();

    assert_eq!(encounter.remove_all_enemies(), 1);
    assert_eq!(encounter.enemies().count(), 0);
    assert_eq!(encounter.task_count(), tasks - 3, "Container and two attacks are gone");

    encounter.clear_log();
    advance_by(&mut encounter, ms(100), 200);
    let log = encounter.combat_log();
    assert!(log.entries().iter().all(|e| e.source_name.as_deref() != Some("Tiny wolf")));
    assert_eq!(encounter.outcome(), None, "An empty roster is not a victory");
}

#[test]
fn test_heal_party_to_full_logs_restored_health() {
    let definition = EncounterDefinition::builtin().unwrap();
    let mut encounter = Encounter::new(&definition, Some(2)).unwrap();
    advance_by(&mut encounter, ms(100), 60);

    encounter.heal_party_to_full();
    for member in encounter.party() {
        assert!(member.health().is_full());
    }
    assert!(encounter
        .combat_log()
        .iter_of(CombatEventType::ResourceChange)
        .any(|e| e.extra_info.as_deref() == Some("HEALTH")));
}

#[test]
fn test_pause_freezes_time() {
    let mut encounter = casting_setup();
    encounter.advance(ms(500));
    encounter.pause();
    advance_by(&mut encounter, ms(500), 10);
    assert_eq!(encounter.time(), ms(500));
    encounter.resume();
    encounter.advance(ms(500));
    assert_eq!(encounter.time(), ms(1000));
}

#[test]
fn test_snapshot_reports_cast_progress() {
    let mut encounter = casting_setup();
    let player = encounter.player_id().unwrap();
    encounter.cast_spell(player, "Heal").unwrap();
    encounter.advance(ms(500));

    let snapshot = encounter.snapshot();
    let me = &snapshot.party[0];
    let casting = me.casting.as_ref().unwrap();
    assert_eq!(casting.spell, "Heal");
    assert_eq!(casting.elapsed, ms(500));
    assert_eq!(casting.fraction(), 0.25);
    assert!((me.gcd_remaining_fraction - 2.0 / 3.0).abs() < 1e-4);

    let json = serde_json::to_string(&snapshot).unwrap();
    assert!(json.contains("\"Heal\""));
}
