//! User roster state: owned characters, their levels, and selected missions.
//!
//! The UI persists this; the engine only reads it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use thiserror::Error;

use crate::catalog::{Catalog, Character, CharacterId, Mission, MissionId};
use crate::config::{ConfigError, PlannerConfig};
use crate::constants::DEFAULT_LEVEL;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UserState {
    #[serde(default)]
    pub owned: BTreeSet<CharacterId>,
    #[serde(default)]
    pub levels: BTreeMap<CharacterId, u32>,
    #[serde(default, alias = "selectedMissions")]
    pub selected_missions: Vec<MissionId>,
}

/// Errors raised when a planning request is invalid.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("{count} missions selected, at most {max} allowed")]
    TooManyMissions { count: usize, max: usize },
    #[error("unknown mission id {0}")]
    UnknownMission(MissionId),
    #[error("mission {0} selected more than once")]
    DuplicateMission(MissionId),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl UserState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load user state from a JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into user state.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Add an owned character at `level`.
    #[must_use]
    pub fn with_character(mut self, id: impl Into<CharacterId>, level: u32) -> Self {
        let id = id.into();
        self.levels.insert(id.clone(), level);
        self.owned.insert(id);
        self
    }

    /// Copy with one character's level replaced.
    #[must_use]
    pub fn with_level(&self, id: &str, level: u32) -> Self {
        let mut next = self.clone();
        next.levels.insert(id.to_string(), level);
        next
    }

    #[must_use]
    pub fn select_mission(mut self, id: impl Into<MissionId>) -> Self {
        self.selected_missions.push(id.into());
        self
    }

    #[must_use]
    pub fn level_of(&self, id: &str) -> u32 {
        self.levels.get(id).copied().unwrap_or(DEFAULT_LEVEL)
    }

    /// Owned characters resolved against the catalog, in ascending id order.
    #[must_use]
    pub fn owned_characters<'c>(&self, catalog: &'c Catalog) -> Vec<&'c Character> {
        self.owned
            .iter()
            .filter_map(|id| {
                let character = catalog.character(id);
                if character.is_none() {
                    log::warn!("skipping owned character {id}: not in catalog");
                }
                character
            })
            .collect()
    }

    /// Check the mission selection without resolving it.
    ///
    /// # Errors
    ///
    /// Same conditions as [`UserState::selected_missions`].
    pub fn validate(&self, catalog: &Catalog, config: &PlannerConfig) -> Result<(), PlanError> {
        self.selected_missions(catalog, config).map(|_| ())
    }

    /// Selected missions resolved against the catalog, in selection order.
    ///
    /// # Errors
    ///
    /// Returns an error when too many missions are selected, a mission id is
    /// unknown, or a mission is selected twice.
    pub fn selected_missions<'c>(
        &self,
        catalog: &'c Catalog,
        config: &PlannerConfig,
    ) -> Result<Vec<&'c Mission>, PlanError> {
        if self.selected_missions.len() > config.max_selected_missions {
            return Err(PlanError::TooManyMissions {
                count: self.selected_missions.len(),
                max: config.max_selected_missions,
            });
        }
        let mut seen = HashSet::with_capacity(self.selected_missions.len());
        self.selected_missions
            .iter()
            .map(|id| {
                if !seen.insert(id.as_str()) {
                    return Err(PlanError::DuplicateMission(id.clone()));
                }
                catalog
                    .mission(id)
                    .ok_or_else(|| PlanError::UnknownMission(id.clone()))
            })
            .collect()
    }
}
