//! Training recommendations from blocked teams.
//!
//! For each under-leveled character in a blocked team, and each required
//! level those teams imply, simulate raising only that character and record
//! which missions become playable. Recommendations are kept only when the
//! level-up changes something, at the lowest level producing that change.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::catalog::{Catalog, Category, CharacterId, Mission, MissionId};
use crate::combinations::Combination;
use crate::config::PlannerConfig;
use crate::numbers::count_to_f64;
use crate::roster::UserState;

/// A mission that could not be staffed, with its under-leveled teams.
#[derive(Debug, Clone, Copy)]
pub struct BlockedMission<'a> {
    pub mission: &'a Mission,
    pub blocked_teams: &'a [Combination],
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct TrainingImpact {
    pub missions_unlocked: Vec<MissionId>,
    pub bonuses_added: Vec<MissionId>,
}

impl TrainingImpact {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.missions_unlocked.is_empty() && self.bonuses_added.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRecommendation {
    pub character_id: CharacterId,
    pub current_level: u32,
    pub target_level: u32,
    pub impact: TrainingImpact,
    pub priority: f64,
}

/// Rank level-ups by how many blocked missions they would open.
#[must_use]
pub fn calculate_training_priority_from_blocked_teams(
    catalog: &Catalog,
    state: &UserState,
    blocked: &[BlockedMission<'_>],
    config: &PlannerConfig,
) -> Vec<TrainingRecommendation> {
    let mut targets: BTreeMap<&str, BTreeSet<u32>> = BTreeMap::new();
    for entry in blocked {
        for team in entry.blocked_teams {
            for member in team.level_deficits.keys() {
                targets
                    .entry(member.as_str())
                    .or_default()
                    .insert(entry.mission.required_level);
            }
        }
    }

    let mut recommendations = Vec::new();
    for (character_id, levels) in targets {
        let current_level = state.level_of(character_id);
        let mut seen: HashSet<TrainingImpact> = HashSet::new();
        for target_level in levels {
            if target_level <= current_level {
                continue;
            }
            let impact = simulate_level_up(blocked, character_id, target_level);
            if impact.is_empty() || seen.contains(&impact) {
                continue;
            }
            seen.insert(impact.clone());
            let priority = score_priority(
                catalog,
                config,
                character_id,
                current_level,
                target_level,
                &impact,
            );
            recommendations.push(TrainingRecommendation {
                character_id: character_id.to_string(),
                current_level,
                target_level,
                impact,
                priority,
            });
        }
    }

    recommendations.sort_by(|a, b| {
        b.priority
            .total_cmp(&a.priority)
            .then_with(|| a.character_id.cmp(&b.character_id))
            .then_with(|| a.target_level.cmp(&b.target_level))
    });
    recommendations.truncate(config.max_recommendations);
    log::debug!("{} training recommendations", recommendations.len());
    recommendations
}

/// Missions opened by raising only `character_id` to `target_level`.
fn simulate_level_up(
    blocked: &[BlockedMission<'_>],
    character_id: &str,
    target_level: u32,
) -> TrainingImpact {
    let mut impact = TrainingImpact::default();
    for entry in blocked {
        if target_level < entry.mission.required_level {
            continue;
        }
        let mut unlocked = entry
            .blocked_teams
            .iter()
            .filter(|team| unlocks(team, character_id));
        let Some(first) = unlocked.next() else { continue };
        impact.missions_unlocked.push(entry.mission.id.clone());
        if first.meets_bonus_conditions || unlocked.any(|team| team.meets_bonus_conditions) {
            impact.bonuses_added.push(entry.mission.id.clone());
        }
    }
    impact
}

/// A team is unlocked when `character_id` is its only under-leveled member.
fn unlocks(team: &Combination, character_id: &str) -> bool {
    team.meets_base_conditions
        && !team.level_deficits.is_empty()
        && team.level_deficits.keys().all(|member| member == character_id)
}

fn score_priority(
    catalog: &Catalog,
    config: &PlannerConfig,
    character_id: &str,
    current_level: u32,
    target_level: u32,
    impact: &TrainingImpact,
) -> f64 {
    let weights = &config.weights;
    let strategy = config.strategy;
    let gap = f64::from(target_level.saturating_sub(current_level));
    weights.unlock_weight(strategy) * count_to_f64(impact.missions_unlocked.len())
        + weights.bonus_weight(strategy) * count_to_f64(impact.bonuses_added.len())
        + weights.rarity * f64::from(rarity_score(catalog, character_id))
        - weights.level_gap * gap
}

/// Trailing number of the character's first rarity tag (`rarity-5` -> 5).
#[must_use]
pub fn rarity_score(catalog: &Catalog, character_id: &str) -> u32 {
    catalog
        .character(character_id)
        .and_then(|character| character.tags.get(Category::Rarity).first())
        .map_or(0, |tag| trailing_number(tag))
}

fn trailing_number(tag: &str) -> u32 {
    let digits: Vec<char> = tag
        .chars()
        .rev()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.iter().rev().collect::<String>().parse().unwrap_or(0)
}
