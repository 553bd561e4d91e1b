//! Engine configuration.
//!
//! Round setup, simulation rate and the embedded combat and player tuning.
//! Configuration can be loaded from and saved to a TOML file.

use favela_common::Team;
use favela_gameplay::{CombatConfig, PlayerConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "favela.toml";

/// Errors writing a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The configuration could not be encoded
    #[error("Failed to encode config: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// Engine configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Simulation ===
    /// Fixed simulation ticks per second
    pub tick_rate: u32,
    /// Length of a headless run in seconds
    pub round_seconds: f32,
    /// Seed for map layout, spawns and agents (None = random)
    pub seed: Option<u64>,

    // === Round ===
    /// Number of enemy agents spawned
    pub enemy_count: usize,
    /// Team the player fights for
    pub player_team: Team,

    // === Tuning ===
    /// Player controller and loadout
    pub player: PlayerConfig,
    /// Agent and combat tuning
    pub combat: CombatConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            round_seconds: 180.0,
            seed: None,

            enemy_count: 8,
            player_team: Team::Police,

            player: PlayerConfig::default(),
            combat: CombatConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from `favela.toml` in the working directory.
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Self {
        Self::load_from(CONFIG_FILE)
    }

    /// Load configuration from a specific path.
    /// Returns default config if the file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read config file: {e}");
                return Self::default();
            },
        };

        match toml::from_str(&contents) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.tick_rate = self.tick_rate.clamp(10, 240);
        self.round_seconds = self.round_seconds.clamp(1.0, 3600.0);
        self.enemy_count = self.enemy_count.clamp(1, 32);

        let agent = &mut self.combat.agent;
        agent.accuracy = agent.accuracy.clamp(0.0, 1.0);
        agent.view_angle = agent.view_angle.clamp(1.0, 360.0);
        agent.max_health = agent.max_health.max(1.0);

        let wait_min = self.combat.patrol_wait_min.max(0.0);
        self.combat.patrol_wait_min = wait_min;
        self.combat.patrol_wait_max = self.combat.patrol_wait_max.max(wait_min);

        self.player.max_health = self.player.max_health.max(1.0);
        self.player.mouse_sensitivity = self.player.mouse_sensitivity.clamp(0.0001, 0.1);
    }

    /// Seconds per simulation tick.
    #[must_use]
    pub fn tick_seconds(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use favela_gameplay::{BackstabPolicy, WeaponKind};
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.tick_rate, 60);
        assert_eq!(config.enemy_count, 8);
        assert_eq!(config.player_team, Team::Police);
        assert_eq!(config.combat.backstab, BackstabPolicy::Override(200.0));
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::default();

        config.tick_rate = 0;
        config.enemy_count = 500;
        config.combat.agent.accuracy = 3.0;
        config.combat.patrol_wait_min = 5.0;
        config.combat.patrol_wait_max = 1.0;

        config.validate();

        assert_eq!(config.tick_rate, 10);
        assert_eq!(config.enemy_count, 32);
        assert!((config.combat.agent.accuracy - 1.0).abs() < f32::EPSILON);
        assert!(config.combat.patrol_wait_max >= config.combat.patrol_wait_min);
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("nested").join("favela.toml");

        let mut config = EngineConfig::default();
        config.seed = Some(12345);
        config.enemy_count = 4;
        config.player_team = Team::Criminal;
        config.player.primary = WeaponKind::Shotgun;
        config.combat.backstab = BackstabPolicy::Multiplier(2.0);

        config.save_to(&config_path).expect("Failed to save config");

        let loaded = EngineConfig::load_from(&config_path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_load_missing_file() {
        let config = EngineConfig::load_from("/nonexistent/path/favela.toml");
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_config_load_invalid_file_falls_back() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("favela.toml");
        fs::write(&config_path, "tick_rate = \"fast\"").expect("write");

        let config = EngineConfig::load_from(&config_path);
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: EngineConfig = toml::from_str(
            r"
            enemy_count = 3

            [combat.agent]
            damage = 20.0
            ",
        )
        .expect("parse");
        assert_eq!(config.enemy_count, 3);
        assert!((config.combat.agent.damage - 20.0).abs() < f32::EPSILON);
        assert!((config.combat.agent.max_health - 100.0).abs() < f32::EPSILON);
        assert_eq!(config.tick_rate, 60);
    }
}
