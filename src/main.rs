//! HealSim - Healer Encounter Simulator
//!
//! Runs a healer-versus-enemies encounter either interactively (console commands
//! on stdin) or headless from a JSON run configuration.

use healsim::cli;
use healsim::encounter::EncounterDefinition;
use healsim::headless::{run_headless, HeadlessConfig};
use healsim::interactive::run_interactive;

fn main() {
    let args = cli::parse_args();

    if let Some(config_path) = args.headless {
        let mut config = match HeadlessConfig::load_from_file(&config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        };
        // Command-line flags override the config file
        if let Some(encounter) = args.encounter {
            config.encounter = Some(encounter.to_string_lossy().into_owned());
        }
        if let Some(output) = args.output {
            config.output_path = Some(output.to_string_lossy().into_owned());
        }
        if let Some(max_duration) = args.max_duration {
            config.max_duration_secs = max_duration;
        }
        if args.seed.is_some() {
            config.random_seed = args.seed;
        }

        match run_headless(config) {
            Ok(report) => match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("Failed to serialize report: {}", e),
            },
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let definition = match &args.encounter {
        Some(path) => EncounterDefinition::load_from_file(path),
        None => EncounterDefinition::builtin(),
    };
    match definition {
        Ok(definition) => run_interactive(definition, args.seed),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
