//! Best-of-N series win probability from any in-progress state.
//!
//! The state space is `(wins_a, wins_b, game)`. From each open state the next
//! game is either won by A (probability `p`) or by B, where `p` depends on who
//! hosts that game under the venue pattern:
//!
//!   P(a, b) = p · P(a + 1, b) + (1 − p) · P(a, b + 1)
//!
//! with P = 1 once A reaches `wins_needed` and P = 0 once B does. Results are
//! memoized per call in an explicit table; nothing is captured or shared.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{validate_probability, EngineResult};

use super::venue::VenuePattern;

/// Current score of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesState {
    pub wins_a: u32,
    pub wins_b: u32,
}

impl SeriesState {
    pub fn new(wins_a: u32, wins_b: u32) -> Self {
        SeriesState { wins_a, wins_b }
    }

    /// 1-based number of the next game to be played
    pub fn next_game(&self) -> u32 {
        self.wins_a + self.wins_b + 1
    }

    pub fn is_decided(&self, wins_needed: u32) -> bool {
        self.wins_a >= wins_needed || self.wins_b >= wins_needed
    }

    /// Same series seen from B's side
    pub fn mirrored(&self) -> Self {
        SeriesState {
            wins_a: self.wins_b,
            wins_b: self.wins_a,
        }
    }
}

/// Home/away split of the games that may still be played
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemainingGames {
    /// Game numbers from the next game through the last possible one
    pub games: Vec<u32>,
    pub a_home: u32,
    pub a_away: u32,
    pub b_home: u32,
    pub b_away: u32,
}

type Memo = HashMap<(u32, u32, u32), f64>;

/// Series model for one series length and venue pattern
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesModel {
    pattern: VenuePattern,
}

impl SeriesModel {
    pub fn new(pattern: VenuePattern) -> Self {
        SeriesModel { pattern }
    }

    /// First to `wins_needed` with the derived venue pattern.
    pub fn first_to(wins_needed: u32) -> EngineResult<Self> {
        Ok(SeriesModel::new(VenuePattern::derive(wins_needed)?))
    }

    /// Best-of-7 with the 2-2-1-1-1 pattern
    pub fn nba() -> Self {
        SeriesModel::new(VenuePattern::nba())
    }

    pub fn wins_needed(&self) -> u32 {
        self.pattern.wins_needed()
    }

    pub fn pattern(&self) -> &VenuePattern {
        &self.pattern
    }

    /// Probability that A wins the series from `(wins_a, wins_b)`.
    ///
    /// `p_a_home` is A's chance in a game A hosts, `p_a_away` in a game B
    /// hosts. A decided series short-circuits to 1.0 or 0.0.
    pub fn win_probability(
        &self,
        wins_a: u32,
        wins_b: u32,
        p_a_home: f64,
        p_a_away: f64,
        a_has_home_court: bool,
    ) -> f64 {
        let n = self.wins_needed();
        if wins_a >= n {
            return 1.0;
        }
        if wins_b >= n {
            return 0.0;
        }
        let mut memo = Memo::new();
        self.solve(
            &mut memo,
            wins_a,
            wins_b,
            wins_a + wins_b + 1,
            p_a_home,
            p_a_away,
            a_has_home_court,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn solve(
        &self,
        memo: &mut Memo,
        wins_a: u32,
        wins_b: u32,
        game: u32,
        p_a_home: f64,
        p_a_away: f64,
        a_has_home_court: bool,
    ) -> f64 {
        let n = self.wins_needed();
        if wins_a >= n {
            return 1.0;
        }
        if wins_b >= n {
            return 0.0;
        }
        if let Some(p) = memo.get(&(wins_a, wins_b, game)) {
            return *p;
        }
        debug_assert!(game <= self.pattern.max_games());

        let p = if self.pattern.a_at_home(game, a_has_home_court) {
            p_a_home
        } else {
            p_a_away
        };
        let win = self.solve(memo, wins_a + 1, wins_b, game + 1, p_a_home, p_a_away, a_has_home_court);
        let loss = self.solve(memo, wins_a, wins_b + 1, game + 1, p_a_home, p_a_away, a_has_home_court);
        let result = p * win + (1.0 - p) * loss;

        memo.insert((wins_a, wins_b, game), result);
        result
    }

    /// Remaining home/away games per side under the same venue table.
    ///
    /// Counts every game that could still be played, through the last
    /// possible one; empty once the series is decided.
    pub fn remaining_games_breakdown(&self, wins_a: u32, wins_b: u32, a_has_home_court: bool) -> RemainingGames {
        let state = SeriesState::new(wins_a, wins_b);
        let games: Vec<u32> = if state.is_decided(self.wins_needed()) {
            Vec::new()
        } else {
            (state.next_game()..=self.pattern.max_games()).collect()
        };
        let a_home = games
            .iter()
            .filter(|g| self.pattern.a_at_home(**g, a_has_home_court))
            .count() as u32;
        let a_away = games.len() as u32 - a_home;
        RemainingGames {
            games,
            a_home,
            a_away,
            b_home: a_away,
            b_away: a_home,
        }
    }
}

/// Series win probability for A with the derived venue pattern.
pub fn series_win_probability(
    wins_a: u32,
    wins_b: u32,
    p_a_home: f64,
    p_a_away: f64,
    a_has_home_court: bool,
    wins_needed: u32,
) -> EngineResult<f64> {
    validate_probability("home win probability", p_a_home)?;
    validate_probability("away win probability", p_a_away)?;
    let model = SeriesModel::first_to(wins_needed)?;
    Ok(model.win_probability(wins_a, wins_b, p_a_home, p_a_away, a_has_home_court))
}

/// Remaining-games breakdown with the derived venue pattern.
pub fn remaining_games_breakdown(
    wins_a: u32,
    wins_b: u32,
    a_has_home_court: bool,
    wins_needed: u32,
) -> EngineResult<RemainingGames> {
    let model = SeriesModel::first_to(wins_needed)?;
    Ok(model.remaining_games_breakdown(wins_a, wins_b, a_has_home_court))
}
