//! Planner configuration: objective strategy, search bounds and training weights.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::constants::{
    DEFAULT_MAX_RECOMMENDATIONS, DEFAULT_MAX_SELECTED_MISSIONS, MAX_TEAM_SIZE,
    PRIORITY_LEVEL_GAP_WEIGHT, PRIORITY_PRIMARY_WEIGHT, PRIORITY_RARITY_WEIGHT,
    PRIORITY_SECONDARY_WEIGHT,
};

/// Lexicographic objective used by the assigner and the training scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Mission value, then fewest characters, then bonus count.
    #[default]
    BaseFirst,
    /// Bonus count, then mission value, then fewest characters.
    BonusFirst,
}

impl Strategy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BaseFirst => "base_first",
            Self::BonusFirst => "bonus_first",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Training priority weights. `primary` scores whatever the strategy ranks
/// first (unlocks for base-first, bonuses for bonus-first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityWeights {
    #[serde(default = "PriorityWeights::default_primary")]
    pub primary: f64,
    #[serde(default = "PriorityWeights::default_secondary")]
    pub secondary: f64,
    #[serde(default = "PriorityWeights::default_rarity")]
    pub rarity: f64,
    #[serde(default = "PriorityWeights::default_level_gap")]
    pub level_gap: f64,
}

impl PriorityWeights {
    const fn default_primary() -> f64 {
        PRIORITY_PRIMARY_WEIGHT
    }

    const fn default_secondary() -> f64 {
        PRIORITY_SECONDARY_WEIGHT
    }

    const fn default_rarity() -> f64 {
        PRIORITY_RARITY_WEIGHT
    }

    const fn default_level_gap() -> f64 {
        PRIORITY_LEVEL_GAP_WEIGHT
    }

    #[must_use]
    pub const fn unlock_weight(&self, strategy: Strategy) -> f64 {
        match strategy {
            Strategy::BaseFirst => self.primary,
            Strategy::BonusFirst => self.secondary,
        }
    }

    #[must_use]
    pub const fn bonus_weight(&self, strategy: Strategy) -> f64 {
        match strategy {
            Strategy::BaseFirst => self.secondary,
            Strategy::BonusFirst => self.primary,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("weights.primary", self.primary),
            ("weights.secondary", self.secondary),
            ("weights.rarity", self.rarity),
            ("weights.level_gap", self.level_gap),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { field, value });
            }
        }
        Ok(())
    }
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            primary: Self::default_primary(),
            secondary: Self::default_secondary(),
            rarity: Self::default_rarity(),
            level_gap: Self::default_level_gap(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(default = "PlannerConfig::default_max_team_size")]
    pub max_team_size: usize,
    #[serde(default = "PlannerConfig::default_max_selected_missions")]
    pub max_selected_missions: usize,
    #[serde(default = "PlannerConfig::default_max_recommendations")]
    pub max_recommendations: usize,
    #[serde(default)]
    pub weights: PriorityWeights,
}

impl PlannerConfig {
    const fn default_max_team_size() -> usize {
        MAX_TEAM_SIZE
    }

    const fn default_max_selected_missions() -> usize {
        DEFAULT_MAX_SELECTED_MISSIONS
    }

    const fn default_max_recommendations() -> usize {
        DEFAULT_MAX_RECOMMENDATIONS
    }

    /// Parse a configuration from JSON and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a bound is violated.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Check search bounds and weights.
    ///
    /// # Errors
    ///
    /// Returns the first violated bound.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_team_size == 0 || self.max_team_size > MAX_TEAM_SIZE {
            return Err(ConfigError::RangeViolation {
                field: "max_team_size",
                min: 1,
                max: MAX_TEAM_SIZE,
                value: self.max_team_size,
            });
        }
        if self.max_selected_missions == 0 {
            return Err(ConfigError::MinViolation {
                field: "max_selected_missions",
                min: 1,
                value: 0,
            });
        }
        self.weights.validate()
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            max_team_size: Self::default_max_team_size(),
            max_selected_missions: Self::default_max_selected_missions(),
            max_recommendations: Self::default_max_recommendations(),
            weights: PriorityWeights::default(),
        }
    }
}

/// Errors raised when planner configuration invariants are violated.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse planner config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: usize,
        value: usize,
    },
    #[error("{field} must be between {min} and {max} (got {value})")]
    RangeViolation {
        field: &'static str,
        min: usize,
        max: usize,
        value: usize,
    },
    #[error("{field} must be a finite, non-negative weight (got {value})")]
    InvalidWeight { field: &'static str, value: f64 },
}
