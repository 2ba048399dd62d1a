//! Interactive mode
//!
//! Runs the encounter in real time on the app clock. Console commands are read
//! from stdin on a background thread and every new combat log event is printed.

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::{Level, LogPlugin};
use bevy::prelude::*;
use std::io::BufRead;
use std::sync::mpsc::{self, Receiver};
use std::sync::Mutex;
use std::time::Duration;

use crate::console::{run_command, HELP_TEXT};
use crate::encounter::{advance_encounter, Encounter, EncounterDefinition, EncounterPlugin};

/// Lines typed on stdin, waiting to be run
#[derive(Resource)]
struct ConsoleInput(Mutex<Receiver<String>>);

/// Number of log events already printed
#[derive(Resource, Default)]
struct LogCursor(usize);

/// Reads console commands from stdin and prints the combat log
pub struct ConsolePlugin;

impl Plugin for ConsolePlugin {
    fn build(&self, app: &mut App) {
        let (sender, receiver) = mpsc::channel();
        std::thread::spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                if sender.send(line).is_err() {
                    break;
                }
            }
        });

        app.insert_resource(ConsoleInput(Mutex::new(receiver)))
            .init_resource::<LogCursor>()
            .add_systems(
                Update,
                (
                    run_console_commands.before(advance_encounter),
                    print_new_events.after(advance_encounter),
                    exit_when_over.after(print_new_events),
                ),
            );
    }
}

fn run_console_commands(input: Res<ConsoleInput>, encounter: Option<ResMut<Encounter>>) {
    let Some(mut encounter) = encounter else {
        return;
    };
    let Ok(receiver) = input.0.lock() else {
        return;
    };
    for line in receiver.try_iter() {
        if line.trim().is_empty() {
            continue;
        }
        match run_command(&mut encounter, &line) {
            Ok(output) => println!("{}", output),
            Err(e) => println!("{}", e),
        }
    }
}

fn print_new_events(encounter: Option<Res<Encounter>>, mut cursor: ResMut<LogCursor>) {
    let Some(encounter) = encounter else {
        return;
    };
    let events = encounter.combat_log().entries();
    // The log was cleared from the console
    if cursor.0 > events.len() {
        cursor.0 = 0;
    }
    for event in &events[cursor.0..] {
        println!("{}", event);
    }
    cursor.0 = events.len();
}

fn exit_when_over(encounter: Option<Res<Encounter>>, mut exit: EventWriter<AppExit>) {
    match encounter {
        Some(encounter) => {
            if let Some(outcome) = encounter.outcome() {
                println!("Encounter over: {}", outcome.tag());
                exit.send(AppExit::Success);
            }
        }
        None => {
            exit.send(AppExit::error());
        }
    }
}

/// Run an encounter in real time with console input on stdin
pub fn run_interactive(definition: EncounterDefinition, seed: Option<u64>) {
    println!("{}", HELP_TEXT);
    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
            1.0 / 60.0,
        ))))
        .add_plugins(LogPlugin {
            level: Level::WARN,
            ..default()
        })
        .add_plugins(EncounterPlugin { definition, seed })
        .add_plugins(ConsolePlugin)
        .run();
}
