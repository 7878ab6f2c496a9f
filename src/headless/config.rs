//! JSON configuration parsing for headless mode
//!
//! Parses JSON encounter configurations and converts them to the encounter's
//! [`EncounterSetup`] format.

use bevy::math::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::director::config::DEFAULT_PROFILE_PATH;
use crate::director::constants::*;
use crate::encounter::{EncounterSetup, PlayerSpawn};

/// One player slot in a headless encounter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSpawnConfig {
    pub name: String,
    pub position: [f32; 3],
    #[serde(default = "default_player_health")]
    pub health: f32,
    #[serde(default = "default_player_dps")]
    pub dps: f32,
    #[serde(default = "default_attack_range")]
    pub attack_range: f32,
}

/// Headless encounter configuration loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadlessEncounterConfig {
    /// Boss profile RON file (default: assets/config/boss.ron)
    #[serde(default = "default_profile")]
    pub boss_profile: String,
    #[serde(default = "default_boss_health")]
    pub boss_health: f32,
    #[serde(default = "default_boss_position")]
    pub boss_position: [f32; 3],
    /// 1-8 players
    pub players: Vec<PlayerSpawnConfig>,
    /// Destructible obstacle positions
    #[serde(default)]
    pub obstacles: Vec<[f32; 3]>,
    /// Helper prefab name -> max health
    #[serde(default)]
    pub helper_prefabs: HashMap<String, f32>,
    /// Custom output path for the encounter log (optional)
    #[serde(default)]
    pub output_path: Option<String>,
    /// Maximum encounter duration in seconds (default: 300)
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f32,
    /// Random seed for deterministic encounter reproduction.
    /// Overrides the seed in the boss profile when provided.
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Seconds between boss decision ticks
    #[serde(default = "default_decision_interval")]
    pub decision_interval: f32,
}

fn default_profile() -> String {
    DEFAULT_PROFILE_PATH.to_string()
}

fn default_boss_health() -> f32 {
    DEFAULT_BOSS_HEALTH
}

fn default_boss_position() -> [f32; 3] {
    [0.0, 0.0, -10.0]
}

fn default_player_health() -> f32 {
    DEFAULT_PLAYER_HEALTH
}

fn default_player_dps() -> f32 {
    DEFAULT_PLAYER_DPS
}

fn default_attack_range() -> f32 {
    DEFAULT_PLAYER_ATTACK_RANGE
}

fn default_max_duration() -> f32 {
    300.0
}

fn default_decision_interval() -> f32 {
    DECISION_INTERVAL
}

impl HeadlessEncounterConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        Self::from_json(&contents)
    }

    /// Parse and validate configuration from JSON text
    pub fn from_json(contents: &str) -> Result<Self, String> {
        let config: HeadlessEncounterConfig =
            serde_json::from_str(contents).map_err(|e| format!("Failed to parse JSON: {}", e))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.players.is_empty() || self.players.len() > 8 {
            return Err("players must have 1-8 members".to_string());
        }

        for player in &self.players {
            if player.health <= 0.0 {
                return Err(format!("player '{}' health must be positive", player.name));
            }
            if player.dps < 0.0 {
                return Err(format!("player '{}' dps must not be negative", player.name));
            }
        }

        if self.boss_health <= 0.0 {
            return Err("boss_health must be positive".to_string());
        }

        for (name, health) in &self.helper_prefabs {
            if *health <= 0.0 {
                return Err(format!("helper prefab '{}' health must be positive", name));
            }
        }

        if self.max_duration_secs <= 0.0 {
            return Err("max_duration_secs must be positive".to_string());
        }

        if self.decision_interval <= 0.0 {
            return Err("decision_interval must be positive".to_string());
        }

        Ok(())
    }

    /// Convert to the encounter's setup format
    pub fn to_encounter_setup(&self) -> EncounterSetup {
        EncounterSetup {
            boss_health: self.boss_health,
            boss_position: Vec3::from_array(self.boss_position),
            players: self
                .players
                .iter()
                .map(|p| PlayerSpawn {
                    name: p.name.clone(),
                    position: Vec3::from_array(p.position),
                    health: p.health,
                    dps: p.dps,
                    attack_range: p.attack_range,
                })
                .collect(),
            obstacles: self.obstacles.iter().copied().map(Vec3::from_array).collect(),
            helper_prefabs: self.helper_prefabs.clone(),
            decision_interval: self.decision_interval,
            random_seed: self.random_seed,
        }
    }
}
