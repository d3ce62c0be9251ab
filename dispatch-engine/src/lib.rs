//! Dispatch Planning Engine
//!
//! Platform-agnostic mission assignment and training planner for a
//! collectible-character companion tool. Given a validated [`Catalog`] and a
//! [`UserState`], it finds disjoint teams for the selected missions and ranks
//! which characters to level next. Every entry point is pure over its inputs.

pub mod assignment;
pub mod bitmask;
pub mod candidates;
pub mod catalog;
pub mod combinations;
pub mod conditions;
pub mod config;
pub mod constants;
pub mod numbers;
pub mod roster;
pub mod training;

// Re-export commonly used types
pub use assignment::{
    AssignedTeam, AssignmentStats, MissionAssignment, MultiMissionAssignmentResult,
    assign_missions, find_best_mission_assignment,
};
pub use bitmask::{CategoryMasks, ConditionMask, MAX_TAGS_PER_CATEGORY, TagBitmaskIndex, TagMask};
pub use candidates::{
    PerMissionCandidates, find_candidates_for_selection, find_mission_combinations,
    find_per_mission_candidates,
};
pub use catalog::{
    Catalog, CatalogError, Category, Character, CharacterId, CharacterTags, Condition, Labels,
    Mission, MissionId, Reward, Tag, TagDictionary, TagId,
};
pub use combinations::{Combination, Team, generate_combinations};
pub use conditions::{interacts_with, satisfies_all_conditions_with_counts, satisfies_condition};
pub use config::{ConfigError, PlannerConfig, PriorityWeights, Strategy};
pub use roster::{PlanError, UserState};
pub use training::{
    BlockedMission, TrainingImpact, TrainingRecommendation,
    calculate_training_priority_from_blocked_teams,
};

/// Trait for abstracting catalog loading operations
/// Platform-specific implementations should provide this
pub trait CatalogLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the tag dictionary
    ///
    /// # Errors
    ///
    /// Returns an error if the tag dictionary cannot be loaded.
    fn load_tag_dictionary(&self) -> Result<TagDictionary, Self::Error>;

    /// Load the character catalog
    ///
    /// # Errors
    ///
    /// Returns an error if the characters cannot be loaded.
    fn load_characters(&self) -> Result<Vec<Character>, Self::Error>;

    /// Load the mission catalog
    ///
    /// # Errors
    ///
    /// Returns an error if the missions cannot be loaded.
    fn load_missions(&self) -> Result<Vec<Mission>, Self::Error>;
}

/// Planner front door: a catalog source plus the configuration every call uses.
pub struct PlannerEngine<L>
where
    L: CatalogLoader,
{
    loader: L,
    config: PlannerConfig,
}

impl<L> PlannerEngine<L>
where
    L: CatalogLoader,
{
    /// Create a planner with the provided loader and configuration
    pub const fn new(loader: L, config: PlannerConfig) -> Self {
        Self { loader, config }
    }

    #[must_use]
    pub const fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Load and validate a fresh catalog
    ///
    /// # Errors
    ///
    /// Returns an error if a catalog cannot be loaded or fails validation.
    pub fn load_catalog(&self) -> Result<Catalog, anyhow::Error> {
        let tags = self.loader.load_tag_dictionary()?;
        let characters = self.loader.load_characters()?;
        let missions = self.loader.load_missions()?;
        Ok(Catalog::new(tags, characters, missions)?)
    }

    /// Per-mission candidates for the selected missions
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration or the mission selection is invalid.
    pub fn candidates(
        &self,
        catalog: &Catalog,
        state: &UserState,
    ) -> Result<Vec<PerMissionCandidates>, PlanError> {
        find_candidates_for_selection(catalog, state, &self.config)
    }

    /// Full plan: disjoint assignment, blocked suggestions and training advice
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration or the mission selection is invalid.
    pub fn plan(
        &self,
        catalog: &Catalog,
        state: &UserState,
    ) -> Result<MultiMissionAssignmentResult, PlanError> {
        find_best_mission_assignment(catalog, state, &self.config)
    }
}
