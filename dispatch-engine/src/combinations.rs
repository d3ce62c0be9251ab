//! Candidate team enumeration and ranking.
//!
//! [`generate_combinations`] is mission-agnostic; [`Combination`] is one
//! generated team evaluated against a mission. The `rank_*` comparators fix
//! every ordering the planner exposes so results are deterministic.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::catalog::{CharacterId, TagId};
use crate::config::Strategy;
use crate::constants::MAX_TEAM_SIZE;
use crate::numbers::saturating_sum;

/// Team of at most [`MAX_TEAM_SIZE`] members, stored inline.
pub type Team<T> = SmallVec<[T; MAX_TEAM_SIZE]>;

/// Every subset of `pool` with 1 to `max_size` members.
///
/// Sizes ascend; within a size, subsets follow pool index order
/// lexicographically. Members keep their relative pool order.
#[must_use]
pub fn generate_combinations<T: Clone>(pool: &[T], max_size: usize) -> Vec<Team<T>> {
    let mut out = Vec::new();
    let mut current: Team<T> = SmallVec::new();
    for size in 1..=max_size.min(pool.len()) {
        extend_combinations(pool, 0, size, &mut current, &mut out);
    }
    out
}

fn extend_combinations<T: Clone>(
    pool: &[T],
    start: usize,
    size: usize,
    current: &mut Team<T>,
    out: &mut Vec<Team<T>>,
) {
    if current.len() == size {
        out.push(current.clone());
        return;
    }
    let remaining = size - current.len();
    for position in start..=pool.len() - remaining {
        current.push(pool[position].clone());
        extend_combinations(pool, position + 1, size, current, out);
        current.pop();
    }
}

/// One team evaluated against one mission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combination {
    pub character_ids: Team<CharacterId>,
    pub meets_base_conditions: bool,
    pub meets_bonus_conditions: bool,
    /// Levels each under-leveled member is missing. Values are always > 0.
    #[serde(default)]
    pub level_deficits: BTreeMap<CharacterId, u32>,
    /// Member tags that appear in the mission's base or bonus conditions.
    #[serde(default)]
    pub contributing_tags: BTreeSet<TagId>,
}

impl Combination {
    #[must_use]
    pub fn size(&self) -> usize {
        self.character_ids.len()
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.level_deficits.is_empty()
    }

    #[must_use]
    pub fn total_deficit(&self) -> u32 {
        saturating_sum(self.level_deficits.values().copied())
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.character_ids.iter().any(|member| member == id)
    }

    /// Whether any member is already in `used`.
    #[must_use]
    pub fn overlaps(&self, used: &HashSet<&str>) -> bool {
        self.character_ids
            .iter()
            .any(|member| used.contains(member.as_str()))
    }
}

/// Ready teams: smallest first, bonus before no bonus, then ids.
#[must_use]
pub fn rank_ready(a: &Combination, b: &Combination) -> Ordering {
    a.size()
        .cmp(&b.size())
        .then_with(|| b.meets_bonus_conditions.cmp(&a.meets_bonus_conditions))
        .then_with(|| a.character_ids.cmp(&b.character_ids))
}

/// Blocked teams: smallest level gap first, then size, then ids.
#[must_use]
pub fn rank_blocked(a: &Combination, b: &Combination) -> Ordering {
    a.total_deficit()
        .cmp(&b.total_deficit())
        .then_with(|| a.size().cmp(&b.size()))
        .then_with(|| a.character_ids.cmp(&b.character_ids))
}

/// Shared ranking over ready and blocked teams alike.
#[must_use]
pub fn rank_combined(a: &Combination, b: &Combination) -> Ordering {
    a.total_deficit()
        .cmp(&b.total_deficit())
        .then_with(|| b.meets_bonus_conditions.cmp(&a.meets_bonus_conditions))
        .then_with(|| a.size().cmp(&b.size()))
        .then_with(|| a.character_ids.cmp(&b.character_ids))
}

/// Order in which blocked teams are offered for an unassigned mission.
#[must_use]
pub fn rank_fallback(strategy: Strategy, a: &Combination, b: &Combination) -> Ordering {
    let gap = a.total_deficit().cmp(&b.total_deficit());
    let bonus = b.meets_bonus_conditions.cmp(&a.meets_bonus_conditions);
    let primary = match strategy {
        Strategy::BaseFirst => gap.then(bonus),
        Strategy::BonusFirst => bonus.then(gap),
    };
    primary
        .then_with(|| a.size().cmp(&b.size()))
        .then_with(|| a.character_ids.cmp(&b.character_ids))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combination(ids: &[&str], bonus: bool, deficits: &[(&str, u32)]) -> Combination {
        Combination {
            character_ids: ids.iter().map(|id| (*id).to_string()).collect(),
            meets_base_conditions: true,
            meets_bonus_conditions: bonus,
            level_deficits: deficits
                .iter()
                .map(|(id, gap)| ((*id).to_string(), *gap))
                .collect(),
            contributing_tags: BTreeSet::new(),
        }
    }

    #[test]
    fn generator_counts_match_binomials() {
        for n in 0..=8_usize {
            let pool: Vec<usize> = (0..n).collect();
            let combos = generate_combinations(&pool, 3);
            let expected = n + n * n.saturating_sub(1) / 2
                + n * n.saturating_sub(1) * n.saturating_sub(2) / 6;
            assert_eq!(combos.len(), expected, "pool size {n}");
            assert!(combos.iter().all(|c| (1..=3).contains(&c.len())));
            let distinct: HashSet<_> = combos.iter().collect();
            assert_eq!(distinct.len(), combos.len());
        }
    }

    #[test]
    fn generator_order_is_size_then_lexicographic() {
        let combos = generate_combinations(&["a", "b", "c"], 3);
        let flat: Vec<String> = combos.iter().map(|c| c.join("")).collect();
        assert_eq!(flat, vec!["a", "b", "c", "ab", "ac", "bc", "abc"]);
    }

    #[test]
    fn generator_respects_smaller_max_size() {
        let combos = generate_combinations(&[1, 2, 3, 4], 2);
        assert_eq!(combos.len(), 10);
        assert!(generate_combinations(&[1, 2], 0).is_empty());
    }

    #[test]
    fn combination_helpers_report_deficits_and_overlap() {
        let blocked = combination(&["a", "b"], false, &[("a", 5), ("b", 7)]);
        assert_eq!(blocked.total_deficit(), 12);
        assert!(!blocked.is_ready());
        assert!(blocked.contains("b"));
        assert!(!blocked.contains("c"));

        let used: HashSet<&str> = ["b"].into_iter().collect();
        assert!(blocked.overlaps(&used));
        assert!(!combination(&["c"], false, &[]).overlaps(&used));
    }

    #[test]
    fn ready_ranking_prefers_small_then_bonus() {
        let mut teams = vec![
            combination(&["a", "b"], true, &[]),
            combination(&["c"], false, &[]),
            combination(&["d"], true, &[]),
        ];
        teams.sort_by(rank_ready);
        let order: Vec<_> = teams.iter().map(|t| t.character_ids.join("")).collect();
        assert_eq!(order, vec!["d", "c", "ab"]);
    }

    #[test]
    fn blocked_ranking_prefers_small_gap() {
        let mut teams = vec![
            combination(&["a"], false, &[("a", 9)]),
            combination(&["b", "c"], false, &[("b", 2), ("c", 2)]),
            combination(&["d"], false, &[("d", 4)]),
        ];
        teams.sort_by(rank_blocked);
        let order: Vec<_> = teams.iter().map(|t| t.character_ids.join("")).collect();
        assert_eq!(order, vec!["bc", "d", "a"]);
    }

    #[test]
    fn fallback_ranking_depends_on_strategy() {
        let close = combination(&["a"], false, &[("a", 1)]);
        let bonus = combination(&["b"], true, &[("b", 10)]);
        assert_eq!(rank_fallback(Strategy::BaseFirst, &close, &bonus), Ordering::Less);
        assert_eq!(rank_fallback(Strategy::BonusFirst, &close, &bonus), Ordering::Greater);
    }

    #[test]
    fn combined_ranking_puts_ready_teams_first() {
        let ready = combination(&["a", "b", "c"], false, &[]);
        let blocked = combination(&["d"], true, &[("d", 1)]);
        assert_eq!(rank_combined(&ready, &blocked), Ordering::Less);
    }
}
