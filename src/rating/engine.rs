use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};
use crate::models::{GameResult, TeamRating};

use super::k_factor::KFactorPolicy;
use super::win_prob::{expected_score, mov_multiplier};

/// Default starting rating for every team
pub const DEFAULT_BASELINE: f64 = 1000.0;

/// What to do with a game that ended level.
///
/// A tied score is scored as an away win by the strict `home > away` rule
/// while its zero margin zeroes the rating change, so the two rules disagree.
/// The caller picks the behavior explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TiePolicy {
    /// Refuse the game with a validation error
    #[default]
    Reject,
    /// Credit the away side with the win; ratings stay put (zero margin)
    ScoreAsAwayWin,
}

/// Owns the team-rating map and folds game results into it one at a time,
/// in chronological order.
#[derive(Debug, Clone)]
pub struct RatingEngine {
    baseline: f64,
    tie_policy: TiePolicy,
    teams: HashMap<String, TeamRating>,
    games_applied: usize,
    last_played_at: Option<DateTime<Utc>>,
}

impl RatingEngine {
    /// Create an empty engine whose teams start at `baseline`.
    pub fn initialize(baseline: f64) -> Self {
        RatingEngine {
            baseline,
            tie_policy: TiePolicy::default(),
            teams: HashMap::new(),
            games_applied: 0,
            last_played_at: None,
        }
    }

    pub fn with_tie_policy(mut self, tie_policy: TiePolicy) -> Self {
        self.tie_policy = tie_policy;
        self
    }

    pub fn baseline(&self) -> f64 {
        self.baseline
    }

    pub fn tie_policy(&self) -> TiePolicy {
        self.tie_policy
    }

    pub fn games_applied(&self) -> usize {
        self.games_applied
    }

    pub fn team_count(&self) -> usize {
        self.teams.len()
    }

    pub fn team(&self, team: &str) -> Option<&TeamRating> {
        self.teams.get(team)
    }

    /// Current rating, or the baseline for a team that has not played yet.
    pub fn rating(&self, team: &str) -> f64 {
        self.teams.get(team).map_or(self.baseline, |t| t.rating)
    }

    /// Teams sorted by rating, best first. Equal ratings are ordered by name.
    pub fn rankings(&self) -> Vec<&TeamRating> {
        let mut teams: Vec<&TeamRating> = self.teams.values().collect();
        teams.sort_by(|a, b| {
            b.rating
                .total_cmp(&a.rating)
                .then_with(|| a.team.cmp(&b.team))
        });
        teams
    }

    /// Current ratings keyed by team.
    pub fn snapshot(&self) -> BTreeMap<String, f64> {
        self.teams
            .iter()
            .map(|(name, t)| (name.clone(), t.rating))
            .collect()
    }

    /// Apply one finished game with magnitude `k_factor`.
    ///
    /// Both expectations come from the pre-game ratings. The away change is
    /// the exact negation of the home change, so the update is zero-sum.
    /// On error nothing is modified.
    pub fn apply_game(&mut self, game: &GameResult, k_factor: f64) -> EngineResult<(f64, f64)> {
        if !k_factor.is_finite() || k_factor <= 0.0 {
            return Err(EngineError::Validation(format!(
                "K-factor must be positive, got {}",
                k_factor
            )));
        }
        self.check_game(game, self.last_played_at)?;
        Ok(self.update(game, k_factor))
    }

    /// Fold an already chronologically ordered slice of games, computing each
    /// game's K from `policy` with its position in the slice.
    ///
    /// The whole slice is checked before the first update, so a bad game
    /// leaves the engine exactly as it was.
    pub fn process_games(&mut self, games: &[GameResult], policy: &KFactorPolicy) -> EngineResult<()> {
        if games.is_empty() {
            return Err(EngineError::Data("no games to process".to_string()));
        }
        policy.validate()?;

        let mut last = self.last_played_at;
        for game in games {
            self.check_game(game, last)?;
            last = Some(game.played_at);
        }

        let total = games.len();
        for (i, game) in games.iter().enumerate() {
            let k = policy.compute(i, total, game.stage, game.calendar_year());
            self.update(game, k);
        }
        Ok(())
    }

    fn update(&mut self, game: &GameResult, k_factor: f64) -> (f64, f64) {
        let home_before = self.rating(&game.home_team);
        let away_before = self.rating(&game.away_team);

        let expected_home = expected_score(home_before, away_before);
        let actual_home = if game.home_won() { 1.0 } else { 0.0 };
        let mov = mov_multiplier(game.margin());
        let delta = k_factor * mov * (actual_home - expected_home);

        let home_after = home_before + delta;
        let away_after = away_before - delta;

        self.games_applied += 1;
        self.last_played_at = Some(game.played_at);
        let index = self.games_applied;
        let baseline = self.baseline;
        let home_won = game.home_won();

        self.teams
            .entry(game.home_team.clone())
            .or_insert_with(|| TeamRating::new(game.home_team.clone(), baseline))
            .record(index, home_after, home_won, game.played_at);
        self.teams
            .entry(game.away_team.clone())
            .or_insert_with(|| TeamRating::new(game.away_team.clone(), baseline))
            .record(index, away_after, !home_won, game.played_at);

        debug!(
            "Game {}: {} {}-{} {} (K={:.2}, MOV={:.3}) → {:.1} / {:.1}",
            index,
            game.home_team,
            game.home_score,
            game.away_score,
            game.away_team,
            k_factor,
            mov,
            home_after,
            away_after
        );

        (home_after, away_after)
    }

    fn check_game(&self, game: &GameResult, last: Option<DateTime<Utc>>) -> EngineResult<()> {
        if game.home_team == game.away_team {
            return Err(EngineError::Validation(format!(
                "{} cannot play itself",
                game.home_team
            )));
        }
        if let Some(last) = last {
            if game.played_at < last {
                return Err(EngineError::Validation(format!(
                    "game {} vs {} at {} is older than the last applied game at {}",
                    game.home_team, game.away_team, game.played_at, last
                )));
            }
        }
        if game.is_tie() {
            match self.tie_policy {
                TiePolicy::Reject => {
                    return Err(EngineError::Validation(format!(
                        "tied score {}-{} between {} and {}",
                        game.home_score, game.away_score, game.home_team, game.away_team
                    )));
                }
                TiePolicy::ScoreAsAwayWin => {
                    warn!(
                        "Tied score {}-{} between {} and {}: scoring as away win with no rating change",
                        game.home_score, game.away_score, game.home_team, game.away_team
                    );
                }
            }
        }
        Ok(())
    }
}

impl Default for RatingEngine {
    fn default() -> Self {
        RatingEngine::initialize(DEFAULT_BASELINE)
    }
}
