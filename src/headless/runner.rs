//! Headless encounter execution
//!
//! Runs encounters without any interactive input, suitable for automated testing.
//! The same [`HeadlessDriver`] steps the encounter whether it runs inside a Bevy
//! app ([`run_headless`]) or in a plain loop ([`simulate`]).

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::console::Command;
use crate::encounter::{Actor, Encounter, Outcome};
use crate::error::ConfigError;

use super::autopilot::autopilot_step;
use super::config::HeadlessConfig;

/// Result of a completed headless encounter
///
/// This struct provides programmatic access to encounter results for testing and analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterReport {
    /// How the encounter ended, or None if it hit the time limit
    pub outcome: Option<Outcome>,
    /// Simulated encounter time (pauses excluded)
    pub encounter_time: Duration,
    /// Frames stepped, pauses included
    pub frames: u64,
    pub timed_out: bool,
    /// Random seed used (if deterministic mode)
    pub random_seed: Option<u64>,
    pub party: Vec<ActorReport>,
    pub enemies: Vec<ActorReport>,
    /// Number of combat log events recorded
    pub event_count: usize,
    /// Console output of each scripted command, in execution order
    pub command_output: Vec<String>,
}

/// Statistics for a single actor after the encounter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorReport {
    pub name: String,
    pub max_health: f32,
    /// Health remaining at encounter end (0 if dead)
    pub final_health: f32,
    pub final_mana: Option<f32>,
    pub survived: bool,
    pub damage_dealt: f32,
    pub damage_taken: f32,
    pub healing_done: f32,
}

/// Steps one encounter frame by frame: scripted commands, autopilot, advance.
pub struct HeadlessDriver {
    schedule: VecDeque<(Duration, Command)>,
    autopilot: bool,
    frame: Duration,
    max_duration: Duration,
    /// Time since the run started, pauses included
    run_time: Duration,
    frames: u64,
    command_output: Vec<String>,
}

impl HeadlessDriver {
    pub fn new(config: &HeadlessConfig) -> Self {
        Self {
            schedule: config.schedule().into(),
            autopilot: config.autopilot,
            frame: config.frame(),
            max_duration: config.max_duration(),
            run_time: Duration::ZERO,
            frames: 0,
            command_output: Vec::new(),
        }
    }

    /// Run one frame. Returns `true` once the run is finished.
    pub fn step(&mut self, encounter: &mut Encounter) -> bool {
        while self
            .schedule
            .front()
            .is_some_and(|(at, _)| *at <= self.run_time)
        {
            let Some((_, command)) = self.schedule.pop_front() else {
                break;
            };
            let output = match command.execute(encounter) {
                Ok(output) => output,
                Err(e) => format!("{}: {}", command, e),
            };
            info!("[CONSOLE] {} -> {}", command, output);
            self.command_output.push(output);
        }

        if self.autopilot && !encounter.is_paused() {
            autopilot_step(encounter);
        }

        encounter.advance(self.frame);
        self.run_time += self.frame;
        self.frames += 1;

        self.is_finished(encounter)
    }

    pub fn is_finished(&self, encounter: &Encounter) -> bool {
        encounter.is_over() || self.run_time >= self.max_duration
    }

    pub fn report(&self, encounter: &Encounter, random_seed: Option<u64>) -> EncounterReport {
        EncounterReport {
            outcome: encounter.outcome(),
            encounter_time: encounter.time(),
            frames: self.frames,
            timed_out: !encounter.is_over(),
            random_seed,
            party: encounter.party().map(|actor| actor_report(encounter, actor)).collect(),
            enemies: encounter.enemies().map(|actor| actor_report(encounter, actor)).collect(),
            event_count: encounter.combat_log().len(),
            command_output: self.command_output.clone(),
        }
    }
}

fn actor_report(encounter: &Encounter, actor: &Actor) -> ActorReport {
    let log = encounter.combat_log();
    ActorReport {
        name: actor.name().to_string(),
        max_health: actor.health().max(),
        final_health: actor.health().current(),
        final_mana: actor.mana().map(|mana| mana.current()),
        survived: actor.is_alive(),
        damage_dealt: log.damage_by_spell(actor.id()).values().sum(),
        damage_taken: log.damage_taken(actor.id()),
        healing_done: log.healing_done(actor.id()),
    }
}

/// Build the encounter a config describes, with its dev flags applied
fn start_encounter(config: &HeadlessConfig) -> Result<Encounter, ConfigError> {
    let definition = config.load_encounter()?;
    let mut encounter = Encounter::new(&definition, config.random_seed)?;
    if config.god_mode {
        encounter.set_god_mode(true);
    }
    if config.infinite_mana {
        encounter.set_infinite_mana(true);
    }
    Ok(encounter)
}

/// Save the combat log if the config asks for it
fn save_log(encounter: &Encounter, output_path: Option<&str>) {
    let Some(path) = output_path else {
        return;
    };
    match encounter.combat_log().save_to_file(Path::new(path)) {
        Ok(()) => println!("Encounter complete. Log saved to: {}", path),
        Err(e) => eprintln!("Failed to save combat log: {}", e),
    }
}

/// Run an encounter to completion in a plain loop, without a Bevy app.
pub fn simulate(config: &HeadlessConfig) -> Result<EncounterReport, ConfigError> {
    config.validate()?;
    let mut encounter = start_encounter(config)?;
    let mut driver = HeadlessDriver::new(config);
    while !driver.step(&mut encounter) {}
    save_log(&encounter, config.output_path.as_deref());
    Ok(driver.report(&encounter, config.random_seed))
}

/// Resource to track headless run state
#[derive(Resource)]
pub struct HeadlessRunState {
    pub driver: HeadlessDriver,
    /// Custom output path for the combat log
    pub output_path: Option<String>,
    pub random_seed: Option<u64>,
    /// Whether the encounter has completed
    pub complete: bool,
    /// Report slot shared with the caller of [`run_headless`]
    pub result: Arc<Mutex<Option<EncounterReport>>>,
}

/// Plugin for headless encounter execution
pub struct HeadlessPlugin {
    pub config: HeadlessConfig,
    /// Encounter to run, built by the caller so start-up errors surface before the app runs
    pub encounter: Mutex<Option<Encounter>>,
    pub result: Arc<Mutex<Option<EncounterReport>>>,
}

impl Plugin for HeadlessPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, headless_step_encounter)
            .add_systems(PostUpdate, headless_exit_on_complete);

        let Some(encounter) = self.encounter.lock().ok().and_then(|mut slot| slot.take()) else {
            error!("Headless plugin has no encounter to run");
            return;
        };
        app.insert_resource(encounter).insert_resource(HeadlessRunState {
            driver: HeadlessDriver::new(&self.config),
            output_path: self.config.output_path.clone(),
            random_seed: self.config.random_seed,
            complete: false,
            result: Arc::clone(&self.result),
        });
    }
}

/// Step the encounter one frame and publish the report when it ends
fn headless_step_encounter(
    encounter: Option<ResMut<Encounter>>,
    run: Option<ResMut<HeadlessRunState>>,
) {
    let (Some(mut encounter), Some(mut run)) = (encounter, run) else {
        return;
    };
    if run.complete {
        return;
    }
    if !run.driver.step(&mut encounter) {
        return;
    }

    match encounter.outcome() {
        Some(outcome) => info!("Encounter ended: {}", outcome.tag()),
        None => info!(
            "Encounter timed out after {:.1}s",
            encounter.time().as_secs_f32()
        ),
    }
    save_log(&encounter, run.output_path.as_deref());
    let report = run.driver.report(&encounter, run.random_seed);
    if let Ok(mut slot) = run.result.lock() {
        *slot = Some(report);
    }
    run.complete = true;
}

/// Exit the app when the encounter is complete (or could not be started)
fn headless_exit_on_complete(run: Option<Res<HeadlessRunState>>, mut exit: EventWriter<AppExit>) {
    match run {
        Some(run) if !run.complete => {}
        Some(_) => {
            exit.send(AppExit::Success);
        }
        None => {
            exit.send(AppExit::error());
        }
    }
}

/// Run a headless encounter inside a Bevy app with the given configuration
pub fn run_headless(config: HeadlessConfig) -> Result<EncounterReport, ConfigError> {
    config.validate()?;
    let encounter = start_encounter(&config)?;
    println!("Starting headless encounter simulation...");
    println!(
        "  Encounter: {}",
        config.encounter.as_deref().unwrap_or("built-in")
    );
    println!("  Max duration: {:.0}s", config.max_duration_secs);
    println!("  Frame: {}ms", config.frame_ms);

    let result = Arc::new(Mutex::new(None));
    App::new()
        // Minimal plugins - no window, no rendering; frames run back to back
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::ZERO)))
        .add_plugins(LogPlugin::default())
        .add_plugins(HeadlessPlugin {
            config,
            encounter: Mutex::new(Some(encounter)),
            result: Arc::clone(&result),
        })
        .run();

    let report = result.lock().ok().and_then(|mut slot| slot.take());
    report.ok_or_else(|| ConfigError::Invalid("headless run ended without a report".to_string()))
}
