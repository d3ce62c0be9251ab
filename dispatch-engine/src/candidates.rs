//! Per-mission candidate teams.
//!
//! Every tag-valid team for a mission lands in exactly one of `ready_teams`
//! (all members meet the required level) or `blocked_teams` (at least one
//! member is under-leveled).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::{Catalog, Character, Mission, MissionId};
use crate::combinations::{
    Combination, generate_combinations, rank_blocked, rank_combined, rank_ready,
};
use crate::conditions::{interacts_with, satisfies_all_conditions_with_counts};
use crate::config::PlannerConfig;
use crate::roster::{PlanError, UserState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PerMissionCandidates {
    pub mission_id: MissionId,
    pub ready_teams: Vec<Combination>,
    pub blocked_teams: Vec<Combination>,
}

impl PerMissionCandidates {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ready_teams.is_empty() && self.blocked_teams.is_empty()
    }
}

/// Classify every team of up to `config.max_team_size` owned characters
/// that meets the mission's base conditions.
#[must_use]
pub fn find_per_mission_candidates(
    catalog: &Catalog,
    mission: &Mission,
    state: &UserState,
    config: &PlannerConfig,
) -> PerMissionCandidates {
    let mut ready_teams = Vec::new();
    let mut blocked_teams = Vec::new();

    for combination in evaluate_mission(catalog, mission, state, config.max_team_size) {
        if combination.is_ready() {
            ready_teams.push(combination);
        } else {
            blocked_teams.push(combination);
        }
    }
    ready_teams.sort_by(rank_ready);
    blocked_teams.sort_by(rank_blocked);

    log::debug!(
        "mission {}: {} ready, {} blocked",
        mission.id,
        ready_teams.len(),
        blocked_teams.len()
    );

    PerMissionCandidates {
        mission_id: mission.id.clone(),
        ready_teams,
        blocked_teams,
    }
}

/// Candidates for every selected mission, in selection order.
///
/// # Errors
///
/// Returns an error if the configuration or the mission selection is invalid.
pub fn find_candidates_for_selection(
    catalog: &Catalog,
    state: &UserState,
    config: &PlannerConfig,
) -> Result<Vec<PerMissionCandidates>, PlanError> {
    config.validate()?;
    let missions = state.selected_missions(catalog, config)?;
    Ok(missions
        .into_iter()
        .map(|mission| find_per_mission_candidates(catalog, mission, state, config))
        .collect())
}

/// Single-mission view: ready and blocked teams merged under one ranking.
#[must_use]
pub fn find_mission_combinations(
    catalog: &Catalog,
    mission: &Mission,
    state: &UserState,
    config: &PlannerConfig,
) -> Vec<Combination> {
    let mut combinations = evaluate_mission(catalog, mission, state, config.max_team_size);
    combinations.sort_by(rank_combined);
    combinations
}

/// Tag-valid teams for `mission`, unsorted.
fn evaluate_mission(
    catalog: &Catalog,
    mission: &Mission,
    state: &UserState,
    max_team_size: usize,
) -> Vec<Combination> {
    let index = catalog.index();
    let base_masks = index.condition_masks(&mission.base_conditions);
    let bonus_masks = index.condition_masks(&mission.bonus_conditions);

    let pool: Vec<&Character> = state
        .owned_characters(catalog)
        .into_iter()
        .filter(|character| {
            let masks = index.character_masks(character);
            interacts_with(&masks, &base_masks) || interacts_with(&masks, &bonus_masks)
        })
        .collect();

    generate_combinations(&pool, max_team_size)
        .into_iter()
        .filter(|team| satisfies_all_conditions_with_counts(team, &mission.base_conditions))
        .map(|team| {
            let meets_bonus = mission.has_bonus()
                && satisfies_all_conditions_with_counts(&team, &mission.bonus_conditions);
            evaluate_team(&team, mission, state, meets_bonus)
        })
        .collect()
}

fn evaluate_team(
    team: &[&Character],
    mission: &Mission,
    state: &UserState,
    meets_bonus: bool,
) -> Combination {
    let mut level_deficits = BTreeMap::new();
    let mut contributing_tags = BTreeSet::new();
    for member in team {
        let level = state.level_of(&member.id);
        if level < mission.required_level {
            level_deficits.insert(member.id.clone(), mission.required_level - level);
        }
        for condition in mission.all_conditions() {
            for tag in &condition.any_of {
                if member.carries(condition.category, tag) {
                    contributing_tags.insert(tag.clone());
                }
            }
        }
    }
    Combination {
        character_ids: team.iter().map(|member| member.id.clone()).collect(),
        meets_base_conditions: true,
        meets_bonus_conditions: meets_bonus,
        level_deficits,
        contributing_tags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Category, Condition, Labels, Tag, TagDictionary};

    fn tags(ids: &[&str]) -> Vec<Tag> {
        ids.iter()
            .map(|id| Tag {
                id: (*id).to_string(),
                labels: Labels::default(),
            })
            .collect()
    }

    fn catalog(missions: Vec<Mission>) -> Catalog {
        let dictionary = TagDictionary {
            role: tags(&["role-001", "role-002"]),
            element: tags(&["element-001"]),
            ..TagDictionary::default()
        };
        let characters = vec![
            Character::new("a").with_tag(Category::Role, "role-001"),
            Character::new("b")
                .with_tag(Category::Role, "role-002")
                .with_tag(Category::Element, "element-001"),
            Character::new("c").with_tag(Category::Role, "role-002"),
            Character::new("d"),
        ];
        Catalog::new(dictionary, characters, missions).unwrap()
    }

    fn ids(teams: &[Combination]) -> Vec<String> {
        teams.iter().map(|t| t.character_ids.join("+")).collect()
    }

    #[test]
    fn teams_split_by_level_and_skip_irrelevant_members() {
        let mission = Mission::new(
            "m1",
            20,
            vec![Condition::new(Category::Role, ["role-001", "role-002"])],
        );
        let catalog = catalog(vec![mission.clone()]);
        let state = UserState::new()
            .with_character("a", 25)
            .with_character("b", 10)
            .with_character("c", 20)
            .with_character("d", 90);

        let candidates =
            find_per_mission_candidates(&catalog, &mission, &state, &PlannerConfig::default());
        assert_eq!(candidates.mission_id, "m1");
        assert_eq!(ids(&candidates.ready_teams), vec!["a", "c", "a+c"]);
        assert_eq!(
            ids(&candidates.blocked_teams),
            vec!["b", "a+b", "b+c", "a+b+c"]
        );
        assert!(candidates
            .blocked_teams
            .iter()
            .all(|t| t.level_deficits.get("b") == Some(&10) && t.level_deficits.len() == 1));
        assert!(!candidates.ready_teams.iter().any(|t| t.contains("d")));
    }

    #[test]
    fn bonus_flag_and_contributing_tags_are_recorded() {
        let mission = Mission::new(
            "m1",
            1,
            vec![Condition::new(Category::Role, ["role-002"])],
        )
        .with_bonus(vec![Condition::new(Category::Element, ["element-001"])]);
        let catalog = catalog(vec![mission.clone()]);
        let state = UserState::new().with_character("b", 5).with_character("c", 5);

        let candidates =
            find_per_mission_candidates(&catalog, &mission, &state, &PlannerConfig::default());
        assert_eq!(ids(&candidates.ready_teams), vec!["b", "c", "b+c"]);
        let solo_b = &candidates.ready_teams[0];
        assert!(solo_b.meets_bonus_conditions);
        assert_eq!(
            solo_b.contributing_tags.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["element-001", "role-002"]
        );
        assert!(!candidates.ready_teams[1].meets_bonus_conditions);
        assert!(candidates.blocked_teams.is_empty());
    }

    #[test]
    fn count_based_condition_needs_full_team() {
        let mission = Mission::new(
            "m1",
            1,
            vec![Condition::new(
                Category::Role,
                ["role-002", "role-001", "role-002"],
            )],
        );
        let catalog = catalog(vec![mission.clone()]);
        let state = UserState::new()
            .with_character("a", 1)
            .with_character("b", 1)
            .with_character("c", 1);
        let candidates =
            find_per_mission_candidates(&catalog, &mission, &state, &PlannerConfig::default());
        assert_eq!(ids(&candidates.ready_teams), vec!["a+b+c"]);
    }

    #[test]
    fn merged_view_ranks_ready_before_blocked() {
        let mission = Mission::new(
            "m1",
            20,
            vec![Condition::new(Category::Role, ["role-002"])],
        );
        let catalog = catalog(vec![mission.clone()]);
        let state = UserState::new().with_character("b", 15).with_character("c", 20);
        let merged =
            find_mission_combinations(&catalog, &mission, &state, &PlannerConfig::default());
        assert_eq!(ids(&merged), vec!["c", "b", "b+c"]);
    }

    #[test]
    fn no_owned_characters_yields_empty_candidates() {
        let mission = Mission::new(
            "m1",
            1,
            vec![Condition::new(Category::Role, ["role-001"])],
        );
        let catalog = catalog(vec![mission.clone()]);
        let candidates = find_per_mission_candidates(
            &catalog,
            &mission,
            &UserState::new(),
            &PlannerConfig::default(),
        );
        assert!(candidates.is_empty());
    }

    #[test]
    fn selection_helper_follows_selection_order() {
        let missions = vec![
            Mission::new("m1", 1, vec![Condition::new(Category::Role, ["role-001"])]),
            Mission::new("m2", 1, vec![Condition::new(Category::Role, ["role-002"])]),
        ];
        let catalog = catalog(missions);
        let state = UserState::new()
            .with_character("a", 1)
            .select_mission("m2")
            .select_mission("m1");
        let all = find_candidates_for_selection(&catalog, &state, &PlannerConfig::default())
            .unwrap();
        let order: Vec<_> = all.iter().map(|c| c.mission_id.as_str()).collect();
        assert_eq!(order, vec!["m2", "m1"]);
        assert!(all[0].is_empty());
        assert_eq!(all[1].ready_teams.len(), 1);
    }
}
