use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Season stage a game belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Preseason,
    Regular,
    Playoff,
}

/// A finished game as supplied by the game-data loader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    pub home_team: String,
    pub away_team: String,
    pub home_score: u32,
    pub away_score: u32,
    pub played_at: DateTime<Utc>,
    pub stage: Stage,
}

impl GameResult {
    pub fn new(
        home_team: impl Into<String>,
        away_team: impl Into<String>,
        home_score: u32,
        away_score: u32,
        played_at: DateTime<Utc>,
        stage: Stage,
    ) -> Self {
        GameResult {
            home_team: home_team.into(),
            away_team: away_team.into(),
            home_score,
            away_score,
            played_at,
            stage,
        }
    }

    /// Absolute point differential
    pub fn margin(&self) -> u32 {
        self.home_score.abs_diff(self.away_score)
    }

    pub fn is_tie(&self) -> bool {
        self.home_score == self.away_score
    }

    /// Strict comparison: a tied score is not a home win.
    pub fn home_won(&self) -> bool {
        self.home_score > self.away_score
    }

    pub fn calendar_year(&self) -> i32 {
        self.played_at.year()
    }
}

/// One point of a team's rating trajectory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    /// 1-based position of the game in the engine's fold
    pub game_index: usize,
    pub rating: f64,
    pub played_at: DateTime<Utc>,
}

/// Rating state of a single team, owned by a `RatingEngine`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRating {
    pub team: String,
    pub rating: f64,
    pub wins: u32,
    pub losses: u32,
    pub trajectory: Vec<TrajectoryPoint>,
}

impl TeamRating {
    pub fn new(team: impl Into<String>, baseline: f64) -> Self {
        TeamRating {
            team: team.into(),
            rating: baseline,
            wins: 0,
            losses: 0,
            trajectory: Vec::new(),
        }
    }

    pub fn games_played(&self) -> u32 {
        self.wins + self.losses
    }

    /// Win percentage in [0, 1]; 0.5 before the first game
    pub fn win_pct(&self) -> f64 {
        match self.games_played() {
            0 => 0.5,
            n => self.wins as f64 / n as f64,
        }
    }

    pub(crate) fn record(&mut self, game_index: usize, rating: f64, won: bool, at: DateTime<Utc>) {
        self.rating = rating;
        if won {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
        self.trajectory.push(TrajectoryPoint {
            game_index,
            rating,
            played_at: at,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn game(home: u32, away: u32) -> GameResult {
        let at = Utc.with_ymd_and_hms(2025, 6, 5, 0, 30, 0).unwrap();
        GameResult::new("Pacers", "Thunder", home, away, at, Stage::Playoff)
    }

    #[test]
    fn test_margin_and_winner() {
        let g = game(110, 111);
        assert_eq!(g.margin(), 1);
        assert!(!g.home_won());
        assert!(!g.is_tie());
        assert_eq!(g.calendar_year(), 2025);
    }

    #[test]
    fn test_tie_is_not_home_win() {
        let g = game(100, 100);
        assert!(g.is_tie());
        assert!(!g.home_won());
        assert_eq!(g.margin(), 0);
    }

    #[test]
    fn test_stage_serde_lowercase() {
        let json = serde_json::to_string(&Stage::Playoff).unwrap();
        assert_eq!(json, "\"playoff\"");
        let stage: Stage = serde_json::from_str("\"preseason\"").unwrap();
        assert_eq!(stage, Stage::Preseason);
    }

    #[test]
    fn test_team_rating_record() {
        let mut t = TeamRating::new("Knicks", 1000.0);
        assert_eq!(t.win_pct(), 0.5);
        let at = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
        t.record(1, 1010.0, true, at);
        t.record(2, 1004.0, false, at);
        assert_eq!(t.wins, 1);
        assert_eq!(t.losses, 1);
        assert_eq!(t.trajectory.len(), 2);
        assert_eq!(t.rating, 1004.0);
        assert_eq!(t.trajectory[1].game_index, 2);
    }
}
