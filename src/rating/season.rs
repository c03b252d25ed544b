//! Whole-season runs: sort once, fold through one engine, summarise.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::error::{EngineError, EngineResult};
use crate::models::{GameResult, Stage};

use super::engine::{RatingEngine, TiePolicy, DEFAULT_BASELINE};
use super::k_factor::KFactorPolicy;

/// Knobs shared by every season run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonSettings {
    pub baseline: f64,
    pub tie_policy: TiePolicy,
    pub include_preseason: bool,
    /// How many gainers/decliners to report
    pub movers: usize,
}

impl Default for SeasonSettings {
    fn default() -> Self {
        SeasonSettings {
            baseline: DEFAULT_BASELINE,
            tie_policy: TiePolicy::Reject,
            include_preseason: false,
            movers: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedTeam {
    pub rank: usize,
    pub team: String,
    pub rating: f64,
    pub wins: u32,
    pub losses: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingStats {
    pub highest: RankedTeam,
    pub lowest: RankedTeam,
    pub average: f64,
    pub range: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingChange {
    pub team: String,
    pub change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonSummary {
    pub policy: String,
    pub total_games: usize,
    pub regular_games: usize,
    pub playoff_games: usize,
    pub rankings: Vec<RankedTeam>,
    /// Ratings after the last non-playoff game
    pub regular_season: BTreeMap<String, f64>,
    pub stats: RatingStats,
    /// Playoff movers, biggest first; empty without playoff games
    pub gainers: Vec<RatingChange>,
    pub decliners: Vec<RatingChange>,
}

/// Finished engine plus its summary
#[derive(Debug, Clone)]
pub struct SeasonRun {
    pub engine: RatingEngine,
    pub summary: SeasonSummary,
}

/// Fold a season's games through a fresh engine under `policy`.
///
/// Games are stably sorted by timestamp first; K is computed from each game's
/// position in the sorted sequence over the season total.
pub fn run_season(games: &[GameResult], policy: &KFactorPolicy, settings: &SeasonSettings) -> EngineResult<SeasonRun> {
    policy.validate()?;

    let mut games: Vec<&GameResult> = games
        .iter()
        .filter(|g| settings.include_preseason || g.stage != Stage::Preseason)
        .collect();
    if games.is_empty() {
        return Err(EngineError::Data(
            "no usable games to seed a rating computation".to_string(),
        ));
    }
    games.sort_by_key(|g| g.played_at);

    let total = games.len();
    let last_regular = games.iter().rposition(|g| g.stage != Stage::Playoff);
    let playoff_games = games.iter().filter(|g| g.stage == Stage::Playoff).count();

    let mut engine = RatingEngine::initialize(settings.baseline).with_tie_policy(settings.tie_policy);
    let mut regular_season = BTreeMap::new();
    for (i, game) in games.iter().enumerate() {
        let k = policy.compute(i, total, game.stage, game.calendar_year());
        engine.apply_game(game, k)?;
        if Some(i) == last_regular {
            regular_season = engine.snapshot();
        }
    }

    let rankings = ranked(&engine);
    let stats = rating_stats(&rankings);
    let (gainers, decliners) = if playoff_games > 0 {
        movers(&engine.snapshot(), &regular_season, settings.movers)
    } else {
        (Vec::new(), Vec::new())
    };

    info!(
        "Processed {} games ({} regular, {} playoff) with {}: {} teams, top {} ({:.1})",
        total,
        total - playoff_games,
        playoff_games,
        policy.describe(),
        rankings.len(),
        stats.highest.team,
        stats.highest.rating
    );

    let summary = SeasonSummary {
        policy: policy.describe(),
        total_games: total,
        regular_games: total - playoff_games,
        playoff_games,
        rankings,
        regular_season,
        stats,
        gainers,
        decliners,
    };
    Ok(SeasonRun { engine, summary })
}

impl SeasonSummary {
    /// Rankings table (first `top` teams), rating statistics and playoff movers
    pub fn render(&self, top: usize) -> String {
        let mut lines = vec![
            format!(
                "{} | {} games ({} regular, {} playoff)",
                self.policy, self.total_games, self.regular_games, self.playoff_games
            ),
            "=".repeat(60),
            format!("{:<5} {:<30} {:>9} {:>10}", "Rank", "Team", "Rating", "Record"),
            "-".repeat(60),
        ];
        lines.extend(self.rankings.iter().take(top).map(|t| {
            format!(
                "{:<5} {:<30} {:>9.1} {:>10}",
                t.rank,
                t.team,
                t.rating,
                format!("{}-{}", t.wins, t.losses)
            )
        }));

        let s = &self.stats;
        lines.push(String::new());
        lines.push(format!("Highest: {} ({:.1})", s.highest.team, s.highest.rating));
        lines.push(format!("Lowest:  {} ({:.1})", s.lowest.team, s.lowest.rating));
        lines.push(format!("Average: {:.1}  Range: {:.1}", s.average, s.range));

        if !self.gainers.is_empty() || !self.decliners.is_empty() {
            lines.push(String::new());
            lines.push("Playoff movers:".to_string());
            lines.extend(
                self.gainers
                    .iter()
                    .chain(self.decliners.iter())
                    .map(|c| format!("  {:<30} {:+.1}", c.team, c.change)),
            );
        }
        lines.join("\n")
    }
}

fn ranked(engine: &RatingEngine) -> Vec<RankedTeam> {
    engine
        .rankings()
        .into_iter()
        .enumerate()
        .map(|(i, t)| RankedTeam {
            rank: i + 1,
            team: t.team.clone(),
            rating: t.rating,
            wins: t.wins,
            losses: t.losses,
        })
        .collect()
}

// rankings is never empty here: at least one game was applied.
fn rating_stats(rankings: &[RankedTeam]) -> RatingStats {
    let highest = rankings[0].clone();
    let lowest = rankings[rankings.len() - 1].clone();
    let average = rankings.iter().map(|t| t.rating).sum::<f64>() / rankings.len() as f64;
    RatingStats {
        range: highest.rating - lowest.rating,
        highest,
        lowest,
        average,
    }
}

fn movers(
    current: &BTreeMap<String, f64>,
    before: &BTreeMap<String, f64>,
    n: usize,
) -> (Vec<RatingChange>, Vec<RatingChange>) {
    let mut changes: Vec<RatingChange> = current
        .iter()
        .filter_map(|(team, now)| {
            before.get(team).map(|then| RatingChange {
                team: team.clone(),
                change: now - then,
            })
        })
        .collect();
    changes.sort_by(|a, b| b.change.total_cmp(&a.change));

    let gainers: Vec<RatingChange> = changes
        .iter()
        .filter(|c| c.change > 0.0)
        .take(n)
        .cloned()
        .collect();
    let decliners: Vec<RatingChange> = changes
        .iter()
        .rev()
        .filter(|c| c.change < 0.0)
        .take(n)
        .cloned()
        .collect();
    (gainers, decliners)
}

// ── Policy comparison ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub rank: usize,
    pub rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub team: String,
    /// One entry per policy, in the order the policies were given
    pub standings: Vec<Standing>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyComparison {
    pub labels: Vec<String>,
    pub summaries: Vec<SeasonSummary>,
    /// Ordered by the first policy's ranking
    pub rows: Vec<ComparisonRow>,
}

/// Run the same games under several K-factor policies.
///
/// Every policy gets its own engine; runs are independent and execute on the
/// rayon pool.
pub fn compare_policies(
    games: &[GameResult],
    policies: &[(String, KFactorPolicy)],
    settings: &SeasonSettings,
) -> EngineResult<PolicyComparison> {
    if policies.is_empty() {
        return Err(EngineError::Validation(
            "at least one K-factor policy is required".to_string(),
        ));
    }

    let summaries = policies
        .par_iter()
        .map(|(_, policy)| run_season(games, policy, settings).map(|run| run.summary))
        .collect::<EngineResult<Vec<SeasonSummary>>>()?;

    let lookups: Vec<BTreeMap<&str, Standing>> = summaries
        .iter()
        .map(|s| {
            s.rankings
                .iter()
                .map(|t| {
                    (
                        t.team.as_str(),
                        Standing {
                            rank: t.rank,
                            rating: t.rating,
                        },
                    )
                })
                .collect()
        })
        .collect();

    // Every run sees the same games, hence the same teams.
    let rows = summaries[0]
        .rankings
        .iter()
        .map(|t| ComparisonRow {
            team: t.team.clone(),
            standings: lookups
                .iter()
                .filter_map(|l| l.get(t.team.as_str()).cloned())
                .collect(),
        })
        .collect();

    Ok(PolicyComparison {
        labels: policies.iter().map(|(label, _)| label.clone()).collect(),
        summaries,
        rows,
    })
}

impl PolicyComparison {
    /// Side-by-side table: rating under each policy, then the difference and
    /// rank shift of the last policy against the first.
    pub fn render_table(&self) -> String {
        let width = 40 + 14 * self.labels.len() + 18;
        let header: String = self.labels.iter().map(|label| format!(" {:>13}", label)).collect();
        let mut lines = vec![
            "=".repeat(width),
            format!("{:<5} {:<30}{} {:>8} {:>8}", "Rank", "Team", header, "Diff", "Rank Δ"),
            "-".repeat(width),
        ];

        for row in &self.rows {
            let (Some(first), Some(last)) = (row.standings.first(), row.standings.last()) else {
                continue;
            };
            let ratings: String = row.standings.iter().map(|s| format!(" {:>13.1}", s.rating)).collect();
            let shift = first.rank as i64 - last.rank as i64;
            let shift = if shift == 0 {
                "=".to_string()
            } else {
                format!("{:+}", shift)
            };
            lines.push(format!(
                "{:<5} {:<30}{} {:>8.1} {:>8}",
                first.rank,
                row.team,
                ratings,
                last.rating - first.rating,
                shift
            ));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 12, 20, 0, 0, 0).unwrap() + Duration::days(n)
    }

    fn game(home: &str, away: &str, hs: u32, aws: u32, n: i64, stage: Stage) -> GameResult {
        GameResult::new(home, away, hs, aws, day(n), stage)
    }

    fn season() -> Vec<GameResult> {
        // deliberately out of order
        vec![
            game("Pacers", "Thunder", 111, 110, 170, Stage::Playoff),
            game("Thunder", "Pacers", 123, 107, 172, Stage::Playoff),
            game("Bucks", "Pacers", 120, 114, 1, Stage::Regular),
            game("Thunder", "Bucks", 125, 96, 3, Stage::Regular),
            game("Lakers", "Thunder", 101, 99, 2, Stage::Regular),
            game("Pacers", "Lakers", 130, 100, 5, Stage::Regular),
            game("Lakers", "Bucks", 90, 92, -30, Stage::Preseason),
        ]
    }

    #[test]
    fn summary_counts_and_preseason_filter() {
        let run = run_season(&season(), &KFactorPolicy::fixed(20.0), &SeasonSettings::default()).unwrap();
        let s = &run.summary;
        assert_eq!(s.total_games, 6);
        assert_eq!(s.regular_games, 4);
        assert_eq!(s.playoff_games, 2);
        assert_eq!(s.rankings.len(), 4);
        assert_eq!(run.engine.games_applied(), 6);
    }

    #[test]
    fn preseason_included_on_request() {
        let settings = SeasonSettings {
            include_preseason: true,
            ..SeasonSettings::default()
        };
        let run = run_season(&season(), &KFactorPolicy::fixed(20.0), &settings).unwrap();
        assert_eq!(run.summary.total_games, 7);
        assert_eq!(run.summary.regular_games, 5);
    }

    #[test]
    fn sorting_matches_presorted_fold() {
        let mut sorted: Vec<GameResult> = season()
            .into_iter()
            .filter(|g| g.stage != Stage::Preseason)
            .collect();
        sorted.sort_by_key(|g| g.played_at);
        let mut engine = RatingEngine::default();
        engine.process_games(&sorted, &KFactorPolicy::fixed(20.0)).unwrap();

        let run = run_season(&season(), &KFactorPolicy::fixed(20.0), &SeasonSettings::default()).unwrap();
        assert_eq!(run.engine.snapshot(), engine.snapshot());
    }

    #[test]
    fn regular_season_snapshot_precedes_playoffs() {
        let run = run_season(&season(), &KFactorPolicy::fixed(20.0), &SeasonSettings::default()).unwrap();
        let s = &run.summary;
        let thunder = run.engine.team("Thunder").unwrap();
        // Thunder trajectory: two regular games then two playoff games
        assert_eq!(thunder.trajectory.len(), 4);
        assert_relative_eq!(s.regular_season["Thunder"], thunder.trajectory[1].rating);
        // Bucks and Lakers did not play in the playoffs
        assert!(s.gainers.iter().chain(&s.decliners).all(|c| c.team != "Bucks"));
    }

    #[test]
    fn stats_are_consistent() {
        let run = run_season(&season(), &KFactorPolicy::fixed(20.0), &SeasonSettings::default()).unwrap();
        let stats = &run.summary.stats;
        assert_eq!(stats.highest.rank, 1);
        assert_eq!(stats.lowest.rank, 4);
        assert_relative_eq!(stats.range, stats.highest.rating - stats.lowest.rating);
        // Elo is zero-sum, so the mean stays at the baseline
        assert_relative_eq!(stats.average, DEFAULT_BASELINE, epsilon = 1e-9);
    }

    #[test]
    fn empty_or_all_preseason_is_data_error() {
        let err = run_season(&[], &KFactorPolicy::fixed(20.0), &SeasonSettings::default());
        assert!(matches!(err, Err(EngineError::Data(_))));

        let only_pre = vec![game("Lakers", "Bucks", 90, 92, 0, Stage::Preseason)];
        let err = run_season(&only_pre, &KFactorPolicy::fixed(20.0), &SeasonSettings::default());
        assert!(matches!(err, Err(EngineError::Data(_))));
    }

    #[test]
    fn no_playoffs_no_movers() {
        let regular: Vec<GameResult> = season()
            .into_iter()
            .filter(|g| g.stage == Stage::Regular)
            .collect();
        let run = run_season(&regular, &KFactorPolicy::fixed(20.0), &SeasonSettings::default()).unwrap();
        assert!(run.summary.gainers.is_empty());
        assert!(run.summary.decliners.is_empty());
        assert_eq!(run.summary.regular_season, run.engine.snapshot());
    }

    #[test]
    fn compare_runs_each_policy_independently() {
        let policies = vec![
            ("Fixed".to_string(), KFactorPolicy::fixed(20.0)),
            ("Decreasing".to_string(), KFactorPolicy::decreasing(40.0, 10.0)),
            ("By year".to_string(), KFactorPolicy::year_tiered(2025, 15.0, 25.0)),
        ];
        let cmp = compare_policies(&season(), &policies, &SeasonSettings::default()).unwrap();
        assert_eq!(cmp.labels.len(), 3);
        assert_eq!(cmp.rows.len(), 4);
        assert!(cmp.rows.iter().all(|r| r.standings.len() == 3));

        let fixed_alone = run_season(&season(), &KFactorPolicy::fixed(20.0), &SeasonSettings::default()).unwrap();
        assert_eq!(cmp.summaries[0], fixed_alone.summary);
        assert_ne!(cmp.summaries[0].rankings, cmp.summaries[1].rankings);

        let table = cmp.render_table();
        assert!(table.contains("Decreasing"));
        assert!(table.contains("Thunder"));
        assert_eq!(table.lines().count(), 3 + cmp.rows.len());
    }

    #[test]
    fn render_lists_top_teams_and_movers() {
        let run = run_season(&season(), &KFactorPolicy::fixed(20.0), &SeasonSettings::default()).unwrap();
        let text = run.summary.render(2);
        assert!(text.contains("K=20"));
        assert!(text.contains(&run.summary.rankings[0].team));
        assert!(!text.contains(&format!("4     {}", run.summary.rankings[3].team)));
        assert!(text.contains("Playoff movers:"));
        assert!(!text.ends_with('\n'));
    }

    #[test]
    fn compare_requires_a_policy() {
        let err = compare_policies(&season(), &[], &SeasonSettings::default());
        assert!(matches!(err, Err(EngineError::Validation(_))));
    }
}
