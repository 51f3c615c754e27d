//! Game configuration.
//!
//! All rule constants live here so a layout can be played with different
//! pacing without touching code. Defaults reproduce the standard rules.
//!
//! ```
//! use escape_core::config::GameConfig;
//!
//! let config = GameConfig::from_json_str(r#"{ "max_turns": 10, "seed": 7 }"#).unwrap();
//! assert_eq!(config.max_turns, 10);
//! assert_eq!(config.inventory_capacity, 5);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// The game is lost once the lap counter exceeds this.
    pub max_turns: u32,
    /// Pickup is refused once an inventory holds *more* than this many items.
    pub inventory_capacity: usize,
    /// Stun applied when a toxic or wet room lands on an actor.
    pub hazard_stun_ticks: u32,
    /// How long a beer keeps a student drunk.
    pub drunk_ticks: u32,
    /// Arrivals after a cleaning before the room turns sticky.
    pub sticky_arming_arrivals: i32,
    /// Chance per lap of the merge + split topology mutation.
    pub mutation_chance: f64,
    /// Seed for the shared random source (None = random).
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_turns: 30,
            inventory_capacity: 5,
            hazard_stun_ticks: 3,
            drunk_ticks: 3,
            sticky_arming_arrivals: 3,
            mutation_chance: 0.5,
            seed: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl GameConfig {
    /// Standard rules with a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Standard rules without topology mutation. Handy for deterministic setups.
    pub fn static_topology() -> Self {
        Self {
            mutation_chance: 0.0,
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.mutation_chance) {
            return Err(ConfigError::Invalid(format!(
                "mutation_chance must be within [0, 1], got {}",
                self.mutation_chance
            )));
        }
        if self.max_turns == 0 {
            return Err(ConfigError::Invalid("max_turns must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_standard_rules() {
        let config = GameConfig::default();
        assert_eq!(config.max_turns, 30);
        assert_eq!(config.inventory_capacity, 5);
        assert_eq!(config.hazard_stun_ticks, 3);
        assert_eq!(config.drunk_ticks, 3);
        assert_eq!(config.sticky_arming_arrivals, 3);
        assert!((config.mutation_chance - 0.5).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = GameConfig::from_json_str(r#"{ "mutation_chance": 0.0 }"#).unwrap();
        assert_eq!(config.mutation_chance, 0.0);
        assert_eq!(config.max_turns, 30);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            GameConfig::from_json_str(r#"{ "mutation_chance": 1.5 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            GameConfig::from_json_str(r#"{ "max_turns": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            GameConfig::from_json_str("not json"),
            Err(ConfigError::Json(_))
        ));
    }
}
