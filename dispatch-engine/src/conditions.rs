//! Condition satisfaction: a bitmask prefilter and the exact checker.
//!
//! [`interacts_with`] is a superset test used only to prune the pool before
//! combinations are generated. [`satisfies_all_conditions_with_counts`] is
//! authoritative.

use smallvec::SmallVec;

use crate::bitmask::{CategoryMasks, ConditionMask};
use crate::catalog::{Category, Character, Condition};

/// Whether a character carries any tag relevant to at least one condition.
#[must_use]
pub fn interacts_with(masks: &CategoryMasks, conditions: &[ConditionMask]) -> bool {
    conditions
        .iter()
        .any(|condition| masks.get(condition.category) & condition.mask != 0)
}

/// Whether the team satisfies every condition in the list.
///
/// Members are matched to requirement slots independently per condition, so
/// one member may count toward several conditions of the same list.
#[must_use]
pub fn satisfies_all_conditions_with_counts(team: &[&Character], conditions: &[Condition]) -> bool {
    conditions
        .iter()
        .all(|condition| satisfies_condition(team, condition))
}

/// Exact check for a single condition.
///
/// Without repeated ids this is plain OR over members and tags. With repeats,
/// each distinct id must be held by as many distinct members as it appears,
/// and no member fills two slots of this condition.
#[must_use]
pub fn satisfies_condition(team: &[&Character], condition: &Condition) -> bool {
    let requirements = condition.requirements();
    if requirements.iter().all(|(_, count)| *count == 1) {
        return team.iter().any(|member| {
            requirements
                .iter()
                .any(|(tag, _)| member.carries(condition.category, tag))
        });
    }

    let slots: SmallVec<[&str; 4]> = requirements
        .iter()
        .flat_map(|(tag, count)| std::iter::repeat_n(*tag, *count))
        .collect();
    if slots.len() > team.len() {
        return false;
    }

    let mut matcher = SlotMatcher {
        team,
        category: condition.category,
        slots: &slots,
        holder: SmallVec::from_elem(None, team.len()),
    };
    (0..slots.len()).all(|slot| matcher.assign(slot))
}

/// Augmenting-path matching of requirement slots to team members.
struct SlotMatcher<'a> {
    team: &'a [&'a Character],
    category: Category,
    slots: &'a [&'a str],
    /// Slot currently held by each member.
    holder: SmallVec<[Option<usize>; 3]>,
}

impl SlotMatcher<'_> {
    fn assign(&mut self, slot: usize) -> bool {
        let mut visited: SmallVec<[bool; 3]> = SmallVec::from_elem(false, self.team.len());
        self.augment(slot, &mut visited)
    }

    fn augment(&mut self, slot: usize, visited: &mut [bool]) -> bool {
        let tag = self.slots[slot];
        for member in 0..self.team.len() {
            if visited[member] || !self.team[member].carries(self.category, tag) {
                continue;
            }
            visited[member] = true;
            let current = self.holder[member];
            let free = match current {
                None => true,
                Some(previous) => self.augment(previous, visited),
            };
            if free {
                self.holder[member] = Some(slot);
                return true;
            }
        }
        false
    }
}
