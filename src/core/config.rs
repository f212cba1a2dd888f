//! Respec configuration with documented constants
//!
//! Every tunable number of the engine lives here. Values can be overridden
//! from a TOML file; keys left out keep their defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{RespecError, Result};
use crate::leaderboard::DEFAULT_LEADERBOARD_SIZE;
use crate::respec::cooldown::{CooldownGate, DEFAULT_COOLDOWN_SECS};
use crate::respec::dampening::{
    DampeningParams, DAMPING_FACTOR, MAX_FLIP_PROBABILITY, MIN_FLIP_PROBABILITY,
    SATURATED_FLIP_PROBABILITY, SATURATION_THRESHOLD,
};

/// Respec earned by an ordinary chat message in an active channel
pub const MESSAGE_VALUE: i64 = 2;

/// Respec earned by being mentioned. A removed reaction costs the author
/// the negation of this value.
pub const MENTION_VALUE: i64 = 3;

/// Respec earned by the author of a message someone reacted to
pub const REACTION_VALUE: i64 = 2;

/// Configuration for the respec engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RespecConfig {
    // === EVENT VALUES ===
    /// Proposed delta for an organic chat message
    pub message_value: i64,

    /// Proposed delta for each mention
    pub mention_value: i64,

    /// Proposed delta for a reaction added to someone's message
    pub reaction_value: i64,

    // === DAMPENING ===
    /// Absolute score beyond which corrections toward zero become rare
    ///
    /// Above this, a delta opposing the current sign is flipped with exactly
    /// `saturated_flip_probability`, which makes extreme scores sticky.
    pub saturation_threshold: u64,

    /// Multiplier on `|score| * ln(1 + |score|) / |global total|`
    pub damping_factor: f64,

    /// Lower clamp for the flip probability
    pub min_flip_probability: f64,

    /// Upper clamp for the flip probability
    pub max_flip_probability: f64,

    /// Flip probability forced on corrections of a saturated score
    pub saturated_flip_probability: f64,

    // === COOLDOWN ===
    /// Minimum seconds between externally-triggered respec for one
    /// (user, channel) pair
    pub cooldown_secs: i64,

    // === LEADERBOARD ===
    /// Maximum non-negative entries shown on a leaderboard
    pub leaderboard_size: usize,

    // === RANDOMNESS ===
    /// Seed for the dampening RNG. `None` seeds from the system time.
    pub seed: Option<u64>,
}

impl Default for RespecConfig {
    fn default() -> Self {
        Self {
            message_value: MESSAGE_VALUE,
            mention_value: MENTION_VALUE,
            reaction_value: REACTION_VALUE,

            saturation_threshold: SATURATION_THRESHOLD,
            damping_factor: DAMPING_FACTOR,
            min_flip_probability: MIN_FLIP_PROBABILITY,
            max_flip_probability: MAX_FLIP_PROBABILITY,
            saturated_flip_probability: SATURATED_FLIP_PROBABILITY,

            cooldown_secs: DEFAULT_COOLDOWN_SECS,

            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,

            seed: None,
        }
    }
}

impl RespecConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RespecConfig = toml::from_str(content)?;
        config.validate().map_err(RespecError::InvalidConfig)?;
        Ok(config)
    }

    /// Load a config file, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        let probabilities = [
            ("min_flip_probability", self.min_flip_probability),
            ("max_flip_probability", self.max_flip_probability),
            ("saturated_flip_probability", self.saturated_flip_probability),
        ];
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(format!("{} ({}) must be within [0, 1]", name, p));
            }
        }

        if self.min_flip_probability > self.max_flip_probability {
            return Err(format!(
                "min_flip_probability ({}) should be <= max_flip_probability ({})",
                self.min_flip_probability, self.max_flip_probability
            ));
        }

        if !self.damping_factor.is_finite() || self.damping_factor <= 0.0 {
            return Err("damping_factor must be positive".into());
        }

        if self.cooldown_secs < 0 {
            return Err("cooldown_secs must not be negative".into());
        }

        if self.leaderboard_size == 0 {
            return Err("leaderboard_size must be at least 1".into());
        }

        Ok(())
    }

    pub fn dampening(&self) -> DampeningParams {
        DampeningParams {
            saturation_threshold: self.saturation_threshold,
            damping_factor: self.damping_factor,
            min_flip_probability: self.min_flip_probability,
            max_flip_probability: self.max_flip_probability,
            saturated_flip_probability: self.saturated_flip_probability,
        }
    }

    pub fn cooldown(&self) -> CooldownGate {
        CooldownGate::new(chrono::Duration::seconds(self.cooldown_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RespecConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.message_value, 2);
        assert_eq!(config.mention_value, 3);
        assert_eq!(config.reaction_value, 2);
        assert_eq!(config.saturation_threshold, 166);
        assert_eq!(config.cooldown_secs, 300);
        assert_eq!(config.leaderboard_size, 15);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = RespecConfig::from_toml_str("mention_value = 5\nseed = 7\n").unwrap();
        assert_eq!(config.mention_value, 5);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.message_value, MESSAGE_VALUE);
        assert_eq!(config.cooldown_secs, DEFAULT_COOLDOWN_SECS);
    }

    #[test]
    fn test_inverted_clamp_rejected() {
        let result = RespecConfig::from_toml_str(
            "min_flip_probability = 0.5\nmax_flip_probability = 0.1\n",
        );
        assert!(matches!(result, Err(RespecError::InvalidConfig(_))));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let result = RespecConfig::from_toml_str("mention_value = \"lots\"");
        assert!(matches!(result, Err(RespecError::ConfigParse(_))));
    }

    #[test]
    fn test_zero_leaderboard_rejected() {
        let config = RespecConfig {
            leaderboard_size: 0,
            ..RespecConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_demo_config_parses() {
        let content = include_str!("../../demos/respec.toml");
        let config = RespecConfig::from_toml_str(content).unwrap();
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.dampening(), DampeningParams::default());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = RespecConfig::load(Path::new("/nonexistent/respec.toml")).unwrap();
        assert_eq!(config, RespecConfig::default());
    }
}
