use std::collections::{BTreeSet, HashSet};

use dispatch_engine::{
    Catalog, Category, Character, Condition, Mission, PerMissionCandidates, PlannerConfig,
    Strategy, TagDictionary, UserState, find_best_mission_assignment,
    find_candidates_for_selection, generate_combinations, interacts_with,
    satisfies_all_conditions_with_counts,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const SEEDS: [u64; 6] = [1, 7, 42, 1337, 0xC0FFEE, 0xDEAD_BEEF];
const ROLE_TAGS: [&str; 4] = ["role-001", "role-002", "role-003", "role-004"];
const ELEMENT_TAGS: [&str; 3] = ["element-001", "element-002", "element-003"];

struct World {
    catalog: Catalog,
    state: UserState,
}

fn random_condition(rng: &mut ChaCha8Rng) -> Condition {
    let (category, pool): (Category, &[&str]) = if rng.gen_bool(0.6) {
        (Category::Role, &ROLE_TAGS)
    } else {
        (Category::Element, &ELEMENT_TAGS)
    };
    let len = rng.gen_range(1..=3);
    let tags: Vec<&str> = (0..len)
        .map(|_| pool[rng.gen_range(0..pool.len())])
        .collect();
    Condition::new(category, tags)
}

fn random_world(seed: u64) -> World {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let tags = TagDictionary::from_json(
        r#"{
            "role": [
                {"id": "role-001"}, {"id": "role-002"}, {"id": "role-003"}, {"id": "role-004"}
            ],
            "element": [{"id": "element-001"}, {"id": "element-002"}, {"id": "element-003"}]
        }"#,
    )
    .unwrap();

    let character_count = rng.gen_range(4..=8);
    let characters: Vec<Character> = (0..character_count)
        .map(|n| {
            let mut character = Character::new(format!("c{n:02}"));
            for tag in ROLE_TAGS {
                if rng.gen_bool(0.35) {
                    character = character.with_tag(Category::Role, tag);
                }
            }
            if rng.gen_bool(0.7) {
                let element = ELEMENT_TAGS[rng.gen_range(0..ELEMENT_TAGS.len())];
                character = character.with_tag(Category::Element, element);
            }
            character
        })
        .collect();

    let missions: Vec<Mission> = (0..4)
        .map(|n| {
            let base = (0..rng.gen_range(1..=2))
                .map(|_| random_condition(&mut rng))
                .collect();
            let mut mission = Mission::new(format!("m{n}"), rng.gen_range(10..=40), base);
            if rng.gen_bool(0.5) {
                mission = mission.with_bonus(vec![random_condition(&mut rng)]);
            }
            mission
        })
        .collect();

    let mut state = UserState::new();
    for character in &characters {
        if rng.gen_bool(0.85) {
            state = state.with_character(character.id.clone(), rng.gen_range(1..=50));
        }
    }
    for mission in &missions {
        state = state.select_mission(mission.id.clone());
    }

    World {
        catalog: Catalog::new(tags, characters, missions).unwrap(),
        state,
    }
}

fn team_key(ids: &[String]) -> Vec<String> {
    ids.to_vec()
}

#[test]
fn candidates_partition_every_tag_valid_team() {
    for seed in SEEDS {
        let world = random_world(seed);
        let config = PlannerConfig::default();
        let index = world.catalog.index();
        let all = find_candidates_for_selection(&world.catalog, &world.state, &config).unwrap();

        for (mission, candidates) in world.catalog.missions().iter().zip(&all) {
            let base_masks = index.condition_masks(&mission.base_conditions);
            let bonus_masks = index.condition_masks(&mission.bonus_conditions);
            let pool: Vec<&Character> = world
                .state
                .owned_characters(&world.catalog)
                .into_iter()
                .filter(|c| {
                    let masks = index.character_masks(c);
                    interacts_with(&masks, &base_masks) || interacts_with(&masks, &bonus_masks)
                })
                .collect();
            let expected: BTreeSet<Vec<String>> = generate_combinations(&pool, 3)
                .into_iter()
                .filter(|team| satisfies_all_conditions_with_counts(team, &mission.base_conditions))
                .map(|team| team.iter().map(|c| c.id.clone()).collect())
                .collect();

            let ready: BTreeSet<Vec<String>> = candidates
                .ready_teams
                .iter()
                .map(|t| team_key(&t.character_ids))
                .collect();
            let blocked: BTreeSet<Vec<String>> = candidates
                .blocked_teams
                .iter()
                .map(|t| team_key(&t.character_ids))
                .collect();

            assert!(ready.is_disjoint(&blocked), "seed {seed}: overlap");
            let union: BTreeSet<_> = ready.union(&blocked).cloned().collect();
            assert_eq!(union, expected, "seed {seed} mission {}", mission.id);
            assert_eq!(ready.len(), candidates.ready_teams.len());
            assert_eq!(blocked.len(), candidates.blocked_teams.len());

            for team in &candidates.ready_teams {
                assert!(team.level_deficits.is_empty());
                assert!(team.size() <= 3);
            }
            for team in &candidates.blocked_teams {
                assert!(!team.level_deficits.is_empty());
                assert!(team.level_deficits.values().all(|gap| *gap > 0));
                assert!(team.size() <= 3);
            }
        }
    }
}

#[test]
fn pruning_never_drops_an_essential_member() {
    for seed in SEEDS {
        let world = random_world(seed);
        let index = world.catalog.index();
        let owned = world.state.owned_characters(&world.catalog);

        for mission in world.catalog.missions() {
            let conditions = &mission.base_conditions;
            let masks = index.condition_masks(conditions);
            for team in generate_combinations(&owned, 3) {
                if !satisfies_all_conditions_with_counts(&team, conditions) {
                    continue;
                }
                let relevant: Vec<&Character> = team
                    .iter()
                    .copied()
                    .filter(|c| interacts_with(&index.character_masks(c), &masks))
                    .collect();
                assert!(
                    satisfies_all_conditions_with_counts(&relevant, conditions),
                    "seed {seed}: pruned team stops passing"
                );

                let minimal = (0..team.len()).all(|skip| {
                    let reduced: Vec<&Character> = team
                        .iter()
                        .enumerate()
                        .filter(|(position, _)| *position != skip)
                        .map(|(_, c)| *c)
                        .collect();
                    !satisfies_all_conditions_with_counts(&reduced, conditions)
                });
                if minimal {
                    assert_eq!(relevant.len(), team.len(), "seed {seed}: essential member pruned");
                }
            }
        }
    }
}

#[test]
fn assignments_never_share_characters() {
    for seed in SEEDS {
        let world = random_world(seed);
        for strategy in [Strategy::BaseFirst, Strategy::BonusFirst] {
            let config = PlannerConfig::default().with_strategy(strategy);
            let result =
                find_best_mission_assignment(&world.catalog, &world.state, &config).unwrap();

            let mut assigned = HashSet::new();
            for assignment in &result.assignments {
                if let Some(team) = &assignment.team {
                    for id in &team.character_ids {
                        assert!(assigned.insert(id.clone()), "seed {seed}: {id} reused");
                    }
                    assert!(assignment.blocked_team.is_none());
                }
            }

            let mut suggested = HashSet::new();
            for assignment in result.assignments.iter().filter(|a| a.team.is_none()) {
                if let Some(team) = &assignment.blocked_team {
                    assert!(!team.level_deficits.is_empty());
                    for id in &team.character_ids {
                        assert!(!assigned.contains(id), "seed {seed}: suggestion reuses {id}");
                        assert!(suggested.insert(id.clone()), "seed {seed}: {id} suggested twice");
                    }
                }
            }

            let stats = &result.stats;
            assert_eq!(stats.missions_total, result.assignments.len());
            assert_eq!(stats.characters_used, assigned.len());
            assert_eq!(
                stats.missions_assigned + stats.unassigned_mission_ids.len(),
                stats.missions_total
            );
            let unassigned: Vec<_> = result
                .assignments
                .iter()
                .filter(|a| a.team.is_none())
                .map(|a| a.mission_id.clone())
                .collect();
            assert_eq!(unassigned, stats.unassigned_mission_ids);
            assert!(result.training_recommendations.len() <= config.max_recommendations);
        }
    }
}

/// Best (value, -characters) over every disjoint choice, by plain enumeration.
fn brute_force_best(missions: &[&Mission], candidates: &[PerMissionCandidates]) -> (usize, usize) {
    fn walk(
        depth: usize,
        missions: &[&Mission],
        candidates: &[PerMissionCandidates],
        used: &mut Vec<String>,
        value: usize,
        best: &mut (usize, usize),
    ) {
        if depth == missions.len() {
            let better = value > best.0 || (value == best.0 && used.len() < best.1);
            if better {
                *best = (value, used.len());
            }
            return;
        }
        walk(depth + 1, missions, candidates, used, value, best);
        for team in &candidates[depth].ready_teams {
            if team.character_ids.iter().any(|id| used.contains(id)) {
                continue;
            }
            let mark = used.len();
            used.extend(team.character_ids.iter().cloned());
            walk(
                depth + 1,
                missions,
                candidates,
                used,
                value + missions[depth].value(),
                best,
            );
            used.truncate(mark);
        }
    }

    let mut best = (0, 0);
    walk(0, missions, candidates, &mut Vec::new(), 0, &mut best);
    best
}

#[test]
fn base_first_matches_exhaustive_optimum() {
    for seed in SEEDS {
        let world = random_world(seed);
        let config = PlannerConfig::default();
        let missions = world.state.selected_missions(&world.catalog, &config).unwrap();
        let candidates =
            find_candidates_for_selection(&world.catalog, &world.state, &config).unwrap();
        let (value, characters) = brute_force_best(&missions, &candidates);

        let result = find_best_mission_assignment(&world.catalog, &world.state, &config).unwrap();
        assert_eq!(result.stats.total_mission_value, value, "seed {seed}");
        assert_eq!(result.stats.characters_used, characters, "seed {seed}");
    }
}

#[test]
fn training_recommendations_only_target_blocked_members() {
    for seed in SEEDS {
        let world = random_world(seed);
        let result =
            find_best_mission_assignment(&world.catalog, &world.state, &PlannerConfig::default())
                .unwrap();
        let mut previous = f64::INFINITY;
        let mut seen = HashSet::new();
        for rec in &result.training_recommendations {
            assert!(rec.target_level > rec.current_level);
            assert_eq!(rec.current_level, world.state.level_of(&rec.character_id));
            assert!(!rec.impact.missions_unlocked.is_empty());
            for mission in &rec.impact.bonuses_added {
                assert!(rec.impact.missions_unlocked.contains(mission));
            }
            for mission in &rec.impact.missions_unlocked {
                assert!(result.stats.unassigned_mission_ids.contains(mission));
            }
            assert!(rec.priority <= previous);
            previous = rec.priority;
            assert!(seen.insert((rec.character_id.clone(), rec.impact.clone())));
        }
    }
}
