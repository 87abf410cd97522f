// Configuration module for reading Penguins.toml
// Game setup, bot parameters and the debug trace are all loaded from one file

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::board::BoardGenerator;
use crate::bot::{BotParameters, MovementStrategy, PlacementStrategy, RatingWeights};
use crate::rng::RngKind;

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    pub game: GameConfig,
    pub bot: BotParameters,
    pub debug: DebugConfig,
}

/// How a new game is set up
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GameConfig {
    pub board_width: i32,
    pub board_height: i32,
    /// One name per player, every player is controlled by the bot in self-play
    pub players: Vec<String>,
    pub penguins_per_player: usize,
    pub generator: BoardGenerator,
    /// Fixed seed for reproducible games, OS entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub rng: RngKind,
}

/// Debug trace configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_file_path: String,
}

impl Config {
    /// Loads configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the Penguins.toml configuration file
    ///
    /// # Returns
    /// * `Result<Config, String>` - Parsed configuration or error message
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        toml::from_str(&contents).map_err(|e| format!("Failed to parse config file: {}", e))
    }

    /// Loads default configuration from Penguins.toml in the project root
    pub fn load_default() -> Result<Self, String> {
        Self::from_file("Penguins.toml")
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the constants defined in Penguins.toml
    pub fn default_hardcoded() -> Self {
        Config {
            game: GameConfig {
                board_width: 10,
                board_height: 10,
                players: vec!["Blue".to_string(), "Red".to_string()],
                penguins_per_player: 3,
                generator: BoardGenerator::Island,
                seed: None,
                rng: RngKind::Std,
            },
            bot: BotParameters {
                placement_strategy: PlacementStrategy::Smart,
                placement_scan_area: 6,
                movement_strategy: MovementStrategy::Smart,
                max_move_length: 32,
                recursion_limit: 2,
                junction_check_recursion_limit: 1,
                weights: RatingWeights::default(),
            },
            debug: DebugConfig {
                enabled: false,
                log_file_path: "penguins_debug.jsonl".to_string(),
            },
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default().unwrap_or_else(|e| {
            eprintln!("Warning: Could not load Penguins.toml ({}), using hardcoded defaults", e);
            Self::default_hardcoded()
        })
    }

    /// Checks the values a game cannot be started with
    pub fn validate(&self) -> Result<(), String> {
        if self.game.board_width <= 0 || self.game.board_height <= 0 {
            return Err(format!(
                "Board size {}x{} must be positive",
                self.game.board_width, self.game.board_height
            ));
        }
        if self.game.players.is_empty() || self.game.players.len() > 9 {
            return Err(format!("Between 1 and 9 players are supported, got {}", self.game.players.len()));
        }
        let board_size = self.game.board_width.max(self.game.board_height);
        if !(0..=board_size).contains(&self.bot.placement_scan_area) {
            return Err(format!(
                "bot.placement_scan_area must be between 0 and {}, got {}",
                board_size, self.bot.placement_scan_area
            ));
        }
        if self.bot.max_move_length == 0 {
            return Err("bot.max_move_length must be positive".to_string());
        }
        if self.bot.weights.lookahead_divisor == 0 {
            return Err("bot.weights.lookahead_divisor must not be zero".to_string());
        }
        Ok(())
    }
}
