//! Multi-mission disjoint assignment.
//!
//! Exhaustive backtracking over ready-team choices: missions are visited
//! most-constrained first, each branch either skips the mission or commits a
//! ready team sharing no member with earlier commitments. Each recursive call
//! returns its best complete branch and the caller keeps the better of its
//! children, so no search state outlives a call.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

use crate::candidates::{PerMissionCandidates, find_per_mission_candidates};
use crate::catalog::{Catalog, CharacterId, Mission, MissionId};
use crate::combinations::{Combination, Team, rank_fallback};
use crate::config::{PlannerConfig, Strategy};
use crate::roster::{PlanError, UserState};
use crate::training::{
    BlockedMission, TrainingRecommendation, calculate_training_priority_from_blocked_teams,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedTeam {
    pub character_ids: Team<CharacterId>,
    pub meets_bonus_conditions: bool,
}

/// Outcome for one selected mission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionAssignment {
    pub mission_id: MissionId,
    pub team: Option<AssignedTeam>,
    /// Closest under-leveled team, offered only when `team` is `None`.
    pub blocked_team: Option<Combination>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AssignmentStats {
    pub missions_assigned: usize,
    pub missions_total: usize,
    pub characters_used: usize,
    pub total_mission_value: usize,
    pub unassigned_mission_ids: Vec<MissionId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiMissionAssignmentResult {
    pub strategy: Strategy,
    pub assignments: Vec<MissionAssignment>,
    pub stats: AssignmentStats,
    pub training_recommendations: Vec<TrainingRecommendation>,
}

/// Plan the user's selected missions.
///
/// # Errors
///
/// Returns an error if the configuration or the mission selection is invalid.
pub fn find_best_mission_assignment(
    catalog: &Catalog,
    state: &UserState,
    config: &PlannerConfig,
) -> Result<MultiMissionAssignmentResult, PlanError> {
    config.validate()?;
    let missions = state.selected_missions(catalog, config)?;
    let candidates: Vec<PerMissionCandidates> = missions
        .iter()
        .map(|mission| find_per_mission_candidates(catalog, mission, state, config))
        .collect();
    Ok(assign_missions(catalog, state, &missions, &candidates, config))
}

/// Assign precomputed candidates. `missions[i]` pairs with `candidates[i]`.
#[must_use]
pub fn assign_missions(
    catalog: &Catalog,
    state: &UserState,
    missions: &[&Mission],
    candidates: &[PerMissionCandidates],
    config: &PlannerConfig,
) -> MultiMissionAssignmentResult {
    let strategy = config.strategy;
    let mut search = AssignmentSearch::new(missions, candidates, strategy);
    let best = search.run();
    log::debug!(
        "assignment search ({strategy}): {} leaves, best {:?}",
        search.leaves,
        best.score
    );

    let mut picks: Vec<Option<&Combination>> = vec![None; missions.len()];
    for (depth, pick) in best.picks.iter().enumerate() {
        let mission = search.order[depth];
        picks[mission] = pick.map(|team| &candidates[mission].ready_teams[team]);
    }

    let mut committed: HashSet<&str> = picks
        .iter()
        .flatten()
        .flat_map(|team| team.character_ids.iter().map(String::as_str))
        .collect();
    let characters_used = committed.len();

    let assigned_members = committed.clone();
    let mut assignments = Vec::with_capacity(missions.len());
    let mut stats = AssignmentStats {
        missions_total: missions.len(),
        characters_used,
        ..AssignmentStats::default()
    };
    let mut blocked_inputs = Vec::new();

    for ((mission, pick), candidate) in missions.iter().zip(&picks).zip(candidates) {
        if let Some(team) = pick {
            stats.missions_assigned += 1;
            stats.total_mission_value += mission.value();
            assignments.push(MissionAssignment {
                mission_id: mission.id.clone(),
                team: Some(AssignedTeam {
                    character_ids: team.character_ids.clone(),
                    meets_bonus_conditions: team.meets_bonus_conditions,
                }),
                blocked_team: None,
            });
            continue;
        }

        stats.unassigned_mission_ids.push(mission.id.clone());
        let blocked_team = best_blocked_team(&candidate.blocked_teams, &committed, strategy);
        if let Some(team) = blocked_team {
            committed.extend(team.character_ids.iter().map(String::as_str));
        }
        assignments.push(MissionAssignment {
            mission_id: mission.id.clone(),
            team: None,
            blocked_team: blocked_team.cloned(),
        });

        let trainable: Vec<Combination> = candidate
            .blocked_teams
            .iter()
            .filter(|team| !team.overlaps(&assigned_members))
            .cloned()
            .collect();
        blocked_inputs.push((*mission, trainable));
    }

    let blocked: Vec<BlockedMission<'_>> = blocked_inputs
        .iter()
        .map(|(mission, teams)| BlockedMission {
            mission,
            blocked_teams: teams,
        })
        .collect();
    let training_recommendations =
        calculate_training_priority_from_blocked_teams(catalog, state, &blocked, config);

    MultiMissionAssignmentResult {
        strategy,
        assignments,
        stats,
        training_recommendations,
    }
}

fn best_blocked_team<'a>(
    blocked_teams: &'a [Combination],
    committed: &HashSet<&str>,
    strategy: Strategy,
) -> Option<&'a Combination> {
    blocked_teams
        .iter()
        .filter(|team| !team.overlaps(committed))
        .min_by(|a, b| rank_fallback(strategy, a, b))
}

/// Leaf objective, compared lexicographically per strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct BranchScore {
    mission_value: usize,
    characters_used: usize,
    bonus_missions: usize,
}

impl BranchScore {
    fn compare(&self, other: &Self, strategy: Strategy) -> Ordering {
        let value = self.mission_value.cmp(&other.mission_value);
        let fewer_characters = other.characters_used.cmp(&self.characters_used);
        let bonus = self.bonus_missions.cmp(&other.bonus_missions);
        match strategy {
            Strategy::BaseFirst => value.then(fewer_characters).then(bonus),
            Strategy::BonusFirst => bonus.then(value).then(fewer_characters),
        }
    }
}

/// A complete branch: one pick per search depth.
#[derive(Debug, Clone, Default)]
struct Branch {
    picks: Vec<Option<usize>>,
    score: BranchScore,
}

struct AssignmentSearch<'a> {
    /// Mission positions in visiting order.
    order: Vec<usize>,
    missions: &'a [&'a Mission],
    candidates: &'a [PerMissionCandidates],
    strategy: Strategy,
    leaves: usize,
}

impl<'a> AssignmentSearch<'a> {
    fn new(
        missions: &'a [&'a Mission],
        candidates: &'a [PerMissionCandidates],
        strategy: Strategy,
    ) -> Self {
        let mut order: Vec<usize> = (0..missions.len().min(candidates.len())).collect();
        order.sort_by_key(|&position| candidates[position].ready_teams.len());
        Self {
            order,
            missions,
            candidates,
            strategy,
            leaves: 0,
        }
    }

    fn run(&mut self) -> Branch {
        let mut used = HashSet::new();
        let mut picks = Vec::with_capacity(self.order.len());
        self.explore(0, &mut used, &mut picks)
    }

    fn explore(
        &mut self,
        depth: usize,
        used: &mut HashSet<&'a str>,
        picks: &mut Vec<Option<usize>>,
    ) -> Branch {
        if depth == self.order.len() {
            self.leaves += 1;
            return Branch {
                picks: picks.clone(),
                score: self.score(picks),
            };
        }

        let candidates: &'a [PerMissionCandidates] = self.candidates;
        let teams = &candidates[self.order[depth]].ready_teams;
        let mut best: Option<Branch> = None;

        for (position, team) in teams.iter().enumerate() {
            if team.overlaps(used) {
                continue;
            }
            used.extend(team.character_ids.iter().map(String::as_str));
            picks.push(Some(position));
            let branch = self.explore(depth + 1, used, picks);
            picks.pop();
            for member in &team.character_ids {
                used.remove(member.as_str());
            }
            best = Some(self.keep_better(best, branch));
        }

        picks.push(None);
        let skipped = self.explore(depth + 1, used, picks);
        picks.pop();
        self.keep_better(best, skipped)
    }

    /// Earlier branches win ties, so better-ranked ready teams are preferred.
    fn keep_better(&self, current: Option<Branch>, candidate: Branch) -> Branch {
        match current {
            Some(current)
                if candidate.score.compare(&current.score, self.strategy)
                    != Ordering::Greater =>
            {
                current
            }
            _ => {
                log::trace!("assignment search improved to {:?}", candidate.score);
                candidate
            }
        }
    }

    fn score(&self, picks: &[Option<usize>]) -> BranchScore {
        let mut score = BranchScore::default();
        for (depth, pick) in picks.iter().enumerate() {
            let Some(team) = pick else { continue };
            let mission = self.order[depth];
            let combination = &self.candidates[mission].ready_teams[*team];
            score.mission_value += self.missions[mission].value();
            score.characters_used += combination.size();
            if combination.meets_bonus_conditions {
                score.bonus_missions += 1;
            }
        }
        score
    }
}
