use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

use dispatch_engine::{
    AssignmentStats, Catalog, Combination, Mission, MultiMissionAssignmentResult,
    PerMissionCandidates, Strategy, UserState,
};

/// Teams listed per mission before the remainder is summarized.
const CANDIDATE_PREVIEW: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct MemberReport {
    pub id: String,
    pub name: String,
    pub level: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamReport {
    pub members: Vec<MemberReport>,
    pub meets_bonus_conditions: bool,
    /// Missing levels per under-leveled member; empty for assigned teams.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub level_deficits: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MissionReport {
    pub id: String,
    pub name: String,
    pub required_level: u32,
    pub value: usize,
    pub rewards: Vec<String>,
    pub bonus_rewards: Vec<String>,
    pub team: Option<TeamReport>,
    pub blocked_team: Option<TeamReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainingLine {
    pub character_id: String,
    pub name: String,
    pub current_level: u32,
    pub target_level: u32,
    pub missions_unlocked: Vec<String>,
    pub bonuses_added: Vec<String>,
    pub priority: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateReport {
    pub mission_id: String,
    pub ready_teams: Vec<TeamReport>,
    pub blocked_teams: Vec<TeamReport>,
}

/// Everything a report renders, resolved to display names.
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub strategy: Strategy,
    pub locale: String,
    pub missions: Vec<MissionReport>,
    pub stats: AssignmentStats,
    pub training: Vec<TrainingLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates: Option<Vec<CandidateReport>>,
}

impl PlanReport {
    pub fn build(
        catalog: &Catalog,
        state: &UserState,
        result: &MultiMissionAssignmentResult,
        candidates: Option<&[PerMissionCandidates]>,
        locale: &str,
    ) -> Self {
        let names = Names {
            catalog,
            state,
            locale,
        };
        let missions = result
            .assignments
            .iter()
            .map(|assignment| {
                let mission = catalog.mission(&assignment.mission_id);
                MissionReport {
                    id: assignment.mission_id.clone(),
                    name: names.mission(&assignment.mission_id),
                    required_level: mission.map_or(0, |m| m.required_level),
                    value: mission.map_or(0, Mission::value),
                    rewards: mission.map_or_else(Vec::new, |m| {
                        m.rewards.iter().map(ToString::to_string).collect()
                    }),
                    bonus_rewards: mission.map_or_else(Vec::new, |m| {
                        m.bonus_rewards.iter().map(ToString::to_string).collect()
                    }),
                    team: assignment.team.as_ref().map(|team| TeamReport {
                        members: names.members(&team.character_ids),
                        meets_bonus_conditions: team.meets_bonus_conditions,
                        level_deficits: BTreeMap::new(),
                    }),
                    blocked_team: assignment.blocked_team.as_ref().map(|team| names.team(team)),
                }
            })
            .collect();

        let training = result
            .training_recommendations
            .iter()
            .map(|rec| TrainingLine {
                character_id: rec.character_id.clone(),
                name: names.character(&rec.character_id),
                current_level: rec.current_level,
                target_level: rec.target_level,
                missions_unlocked: rec.impact.missions_unlocked.clone(),
                bonuses_added: rec.impact.bonuses_added.clone(),
                priority: rec.priority,
            })
            .collect();

        let candidates = candidates.map(|all| {
            all.iter()
                .map(|entry| CandidateReport {
                    mission_id: entry.mission_id.clone(),
                    ready_teams: entry.ready_teams.iter().map(|t| names.team(t)).collect(),
                    blocked_teams: entry.blocked_teams.iter().map(|t| names.team(t)).collect(),
                })
                .collect()
        });

        Self {
            strategy: result.strategy,
            locale: locale.to_string(),
            missions,
            stats: result.stats.clone(),
            training,
            candidates,
        }
    }
}

struct Names<'a> {
    catalog: &'a Catalog,
    state: &'a UserState,
    locale: &'a str,
}

impl Names<'_> {
    fn character(&self, id: &str) -> String {
        self.catalog.character(id).map_or_else(
            || id.to_string(),
            |c| c.labels.display(self.locale, &c.id).to_string(),
        )
    }

    fn mission(&self, id: &str) -> String {
        self.catalog.mission(id).map_or_else(
            || id.to_string(),
            |m| m.labels.display(self.locale, &m.id).to_string(),
        )
    }

    fn members(&self, ids: &[String]) -> Vec<MemberReport> {
        ids.iter()
            .map(|id| MemberReport {
                id: id.clone(),
                name: self.character(id),
                level: self.state.level_of(id),
            })
            .collect()
    }

    fn team(&self, team: &Combination) -> TeamReport {
        TeamReport {
            members: self.members(&team.character_ids),
            meets_bonus_conditions: team.meets_bonus_conditions,
            level_deficits: team.level_deficits.clone(),
        }
    }
}

fn member_list(team: &TeamReport) -> String {
    team.members
        .iter()
        .map(|m| match team.level_deficits.get(&m.id) {
            Some(gap) => format!("{} (Lv{}, needs +{gap})", m.name, m.level),
            None => format!("{} (Lv{})", m.name, m.level),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn generate_console_report<W: Write + ?Sized>(out: &mut W, report: &PlanReport) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📋 Mission Plan".bright_cyan().bold())?;
    writeln!(out, "{}", "===============".cyan())?;
    writeln!(out, "Strategy: {}", report.strategy)?;

    let stats = &report.stats;
    writeln!(
        out,
        "Missions assigned: {}/{}",
        stats.missions_assigned.to_string().green(),
        stats.missions_total
    )?;
    writeln!(out, "Characters used: {}", stats.characters_used)?;
    writeln!(out, "Total mission value: {}", stats.total_mission_value)?;
    writeln!(out)?;

    for mission in &report.missions {
        writeln!(
            out,
            "{} (Lv{}, value {})",
            mission.name.bold(),
            mission.required_level,
            mission.value
        )?;
        if let Some(team) = &mission.team {
            let bonus = if team.meets_bonus_conditions {
                " ★ bonus".yellow().to_string()
            } else {
                String::new()
            };
            writeln!(out, "   {} {}{bonus}", "✅".green(), member_list(team))?;
        } else if let Some(team) = &mission.blocked_team {
            writeln!(out, "   {} closest: {}", "⏳".yellow(), member_list(team))?;
        } else {
            writeln!(out, "   {} no eligible team", "❌".red())?;
        }
        if !mission.rewards.is_empty() {
            writeln!(out, "   Rewards: {}", mission.rewards.join(", "))?;
        }
    }

    if !report.training.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", "🏋 Training Priorities".bright_yellow().bold())?;
        writeln!(out, "{}", "=====================".yellow())?;
        for line in &report.training {
            writeln!(
                out,
                "{} Lv{} → Lv{}  unlocks [{}]{}  ({:.1})",
                line.name.bold(),
                line.current_level,
                line.target_level,
                line.missions_unlocked.join(", "),
                if line.bonuses_added.is_empty() {
                    String::new()
                } else {
                    format!(" bonus [{}]", line.bonuses_added.join(", "))
                },
                line.priority
            )?;
        }
    }

    if let Some(candidates) = &report.candidates {
        writeln!(out)?;
        writeln!(out, "{}", "🔎 Candidates".bright_blue().bold())?;
        writeln!(out, "{}", "=============".blue())?;
        for entry in candidates {
            writeln!(
                out,
                "{}: {} ready, {} blocked",
                entry.mission_id.bold(),
                entry.ready_teams.len(),
                entry.blocked_teams.len()
            )?;
            write_team_preview(out, "ready", &entry.ready_teams)?;
            write_team_preview(out, "blocked", &entry.blocked_teams)?;
        }
    }
    Ok(())
}

fn write_team_preview<W: Write + ?Sized>(
    out: &mut W,
    label: &str,
    teams: &[TeamReport],
) -> Result<()> {
    for team in teams.iter().take(CANDIDATE_PREVIEW) {
        writeln!(out, "   {label:7} {}", member_list(team))?;
    }
    if teams.len() > CANDIDATE_PREVIEW {
        writeln!(out, "   {label:7} … {} more", teams.len() - CANDIDATE_PREVIEW)?;
    }
    Ok(())
}

pub fn generate_json_report<W: Write + ?Sized>(out: &mut W, report: &PlanReport) -> Result<()> {
    let json_output = serde_json::to_string_pretty(report)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report<W: Write + ?Sized>(out: &mut W, report: &PlanReport) -> Result<()> {
    writeln!(out, "# Dispatch Plan\n")?;

    let stats = &report.stats;
    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Strategy**: {}", report.strategy)?;
    writeln!(
        out,
        "- **Missions assigned**: {}/{}",
        stats.missions_assigned, stats.missions_total
    )?;
    writeln!(out, "- **Characters used**: {}", stats.characters_used)?;
    writeln!(out, "- **Total mission value**: {}\n", stats.total_mission_value)?;

    writeln!(out, "## Missions\n")?;
    writeln!(out, "| Mission | Level | Team | Bonus |")?;
    writeln!(out, "|---|---|---|---|")?;
    for mission in &report.missions {
        let (team, bonus) = match (&mission.team, &mission.blocked_team) {
            (Some(team), _) => (member_list(team), team.meets_bonus_conditions),
            (None, Some(team)) => (format!("_blocked_: {}", member_list(team)), false),
            (None, None) => ("_none_".to_string(), false),
        };
        writeln!(
            out,
            "| {} | {} | {team} | {} |",
            mission.name,
            mission.required_level,
            if bonus { "✅" } else { "" }
        )?;
    }

    if !report.training.is_empty() {
        writeln!(out, "\n## Training\n")?;
        for line in &report.training {
            writeln!(
                out,
                "- **{}**: Lv{} → Lv{} unlocks {} (priority {:.1})",
                line.name,
                line.current_level,
                line.target_level,
                line.missions_unlocked.join(", "),
                line.priority
            )?;
        }
    }
    Ok(())
}

/// Catalog missions with their requirements, for `--list-missions`.
pub fn write_mission_list<W: Write + ?Sized>(
    out: &mut W,
    catalog: &Catalog,
    locale: &str,
) -> Result<()> {
    writeln!(out, "Available missions:")?;
    for mission in catalog.missions() {
        let conditions = mission
            .base_conditions
            .iter()
            .map(|c| format!("{}: {}", c.category, c.any_of.join("|")))
            .collect::<Vec<_>>()
            .join("; ");
        writeln!(
            out,
            "  {:12} Lv{:<3} {:20} {conditions}",
            mission.id,
            mission.required_level,
            mission.labels.display(locale, &mission.id)
        )?;
    }
    Ok(())
}
