//! Engine configuration
//!
//! Persisted as JSON next to the game's assets. Every field has a default so a
//! partial file only overrides what it names.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::Result;

/// Engine-wide tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === World ===
    /// Default gravity for new levels
    pub gravity: Vec2,
    /// Largest dt handed to the physics step per frame
    pub max_frame_dt: f32,
    /// Seconds between chase steering updates
    pub chase_interval: f32,
    /// Seed for the per-level RNG (level index is mixed in)
    pub seed: u64,

    // === Entity defaults ===
    pub hero_strength: i32,
    pub enemy_damage: i32,
    /// Jump impulse applied when a hero jumps without a custom one
    pub jump_impulse: Vec2,

    // === Text shown by the end-of-level screens ===
    pub win_text: String,
    pub lose_text: String,

    // === Progress ===
    /// Number of playable levels
    pub level_count: usize,
    /// Storage key of the highest unlocked level
    pub unlock_key: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::ZERO,
            max_frame_dt: MAX_FRAME_DT,
            chase_interval: CHASE_UPDATE_INTERVAL,
            seed: 0x10_1e_u64,

            hero_strength: DEFAULT_HERO_STRENGTH,
            enemy_damage: DEFAULT_ENEMY_DAMAGE,
            jump_impulse: Vec2::new(0.0, 10.0),

            win_text: "Good Job".to_string(),
            lose_text: "Try Again".to_string(),

            level_count: 1,
            unlock_key: "lol_unlocked".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&json)?;
        log::info!("Loaded engine config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Load from a JSON file, falling back to defaults if it is missing or broken
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Using default engine config: {e}");
                Self::default()
            }
        }
    }

    /// Save to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Engine config saved");
        Ok(())
    }
}
