//! Headless mode for agentic testing
//!
//! This module provides functionality to run encounters without any interactive
//! input, suitable for automated testing and AI agent integration.
//!
//! ## Usage
//!
//! ```bash
//! # Run a headless encounter
//! cargo run --release -- --headless run_config.json
//! ```
//!
//! ## JSON Configuration
//!
//! ```json
//! {
//!   "encounter": "assets/config/encounter.ron",
//!   "max_duration_secs": 120,
//!   "random_seed": 42,
//!   "autopilot": true,
//!   "commands": [
//!     { "at_secs": 30.0, "command": "heal" },
//!     { "at_secs": 45.0, "command": "godmode" }
//!   ]
//! }
//! ```

pub mod autopilot;
pub mod config;
pub mod runner;

pub use autopilot::autopilot_step;
pub use config::{HeadlessConfig, ScheduledCommand};
pub use runner::{run_headless, simulate, ActorReport, EncounterReport, HeadlessDriver};
