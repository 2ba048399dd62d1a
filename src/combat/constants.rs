//! Combat Constants
//!
//! Centralized location for magic numbers used throughout the encounter.

use std::time::Duration;

// ============================================================================
// Global Cooldown
// ============================================================================

/// Lockout started by every accepted cast. Shared by all spells.
pub const GLOBAL_COOLDOWN: Duration = Duration::from_millis(1500);

// ============================================================================
// Audio Cues
// ============================================================================

/// Looping cue while a spell with a cast time is being cast
pub const PRECAST_CUE: &str = "spell.precast";

/// Played when a cast completes
pub const CAST_CUE: &str = "spell.cast";

/// Played when the player cancels a cast
pub const FIZZLE_CUE: &str = "spell.fizzle";

// ============================================================================
// Autopilot Thresholds
// ============================================================================

/// Below this health fraction the autopilot reaches for its fastest heal
pub const EMERGENCY_HEAL_THRESHOLD: f32 = 0.4;

/// Below this health fraction the autopilot uses its biggest heal
pub const HEAVY_HEAL_THRESHOLD: f32 = 0.6;

/// Below this health fraction the autopilot uses its efficient heal
pub const TOP_UP_THRESHOLD: f32 = 0.85;
