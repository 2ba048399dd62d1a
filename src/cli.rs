//! Command-line interface for HealSim
//!
//! Supports both interactive (default) and headless modes.

use clap::Parser;
use std::path::PathBuf;

/// Healer versus enemies combat encounter simulator
#[derive(Parser, Debug)]
#[command(name = "healsim")]
#[command(about = "Healer versus enemies combat encounter simulator")]
#[command(version)]
pub struct Args {
    /// Run in headless mode with the specified JSON config file
    #[arg(long, value_name = "CONFIG_FILE")]
    pub headless: Option<PathBuf>,

    /// Encounter RON file (default: the built-in demo encounter)
    #[arg(long, value_name = "ENCOUNTER_FILE")]
    pub encounter: Option<PathBuf>,

    /// Output path for the combat log (headless mode only)
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Maximum encounter duration in seconds (headless mode only)
    #[arg(long)]
    pub max_duration: Option<f32>,

    /// Random seed for a reproducible encounter
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn parse_args() -> Args {
    Args::parse()
}
