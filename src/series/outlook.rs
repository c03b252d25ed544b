use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::rating::win_prob::{game_probabilities, GameProbabilities};

use super::probability::{RemainingGames, SeriesModel, SeriesState};

/// A series question as asked by the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRequest {
    pub team_a: String,
    pub team_b: String,
    pub rating_a: f64,
    pub rating_b: f64,
    /// Lower seed number is the better seed and holds home court
    pub seed_a: u32,
    pub seed_b: u32,
    pub wins_a: u32,
    pub wins_b: u32,
}

/// Everything the display needs about one series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesOutlook {
    pub team_a: String,
    pub team_b: String,
    pub state: SeriesState,
    pub wins_needed: u32,
    pub home_court: String,
    pub a_has_home_court: bool,
    pub game: GameProbabilities,
    pub series_prob_a: f64,
    pub series_prob_b: f64,
    pub remaining: RemainingGames,
}

impl SeriesOutlook {
    /// Build the outlook for `request` under `model`.
    ///
    /// Ratings are turned into per-game chances by moving A's rating
    /// `home_advantage` Elo points up (A hosting) or down (B hosting).
    pub fn evaluate(request: &SeriesRequest, model: &SeriesModel, home_advantage: f64) -> EngineResult<Self> {
        let n = model.wins_needed();
        if request.wins_a >= n || request.wins_b >= n {
            return Err(EngineError::Validation(format!(
                "series already decided at {}-{} (first to {})",
                request.wins_a, request.wins_b, n
            )));
        }
        if !request.rating_a.is_finite() || !request.rating_b.is_finite() || !home_advantage.is_finite() {
            return Err(EngineError::Validation(
                "ratings and home advantage must be finite".to_string(),
            ));
        }

        let a_has_home_court = request.seed_a < request.seed_b;
        let game = game_probabilities(request.rating_a, request.rating_b, home_advantage);
        let series_prob_a = model.win_probability(
            request.wins_a,
            request.wins_b,
            game.a_home,
            game.a_away,
            a_has_home_court,
        );
        let remaining = model.remaining_games_breakdown(request.wins_a, request.wins_b, a_has_home_court);

        debug!(
            "{} vs {} at {}-{}: game {:.3}/{:.3}, series {:.3}",
            request.team_a,
            request.team_b,
            request.wins_a,
            request.wins_b,
            game.a_home,
            game.a_away,
            series_prob_a
        );

        Ok(SeriesOutlook {
            team_a: request.team_a.clone(),
            team_b: request.team_b.clone(),
            state: SeriesState::new(request.wins_a, request.wins_b),
            wins_needed: n,
            home_court: if a_has_home_court {
                request.team_a.clone()
            } else {
                request.team_b.clone()
            },
            a_has_home_court,
            game,
            series_prob_a,
            series_prob_b: 1.0 - series_prob_a,
            remaining,
        })
    }

    /// Plain-text summary for terminals
    pub fn render(&self) -> String {
        let (home_a, away_a) = (self.remaining.a_home, self.remaining.a_away);
        [
            format!(
                "{} vs {}: {}-{} (first to {})",
                self.team_a, self.team_b, self.state.wins_a, self.state.wins_b, self.wins_needed
            ),
            format!("Home court: {}", self.home_court),
            format!(
                "Single game for {}: neutral {:.1}%, home {:.1}%, away {:.1}%",
                self.team_a,
                self.game.neutral * 100.0,
                self.game.a_home * 100.0,
                self.game.a_away * 100.0
            ),
            format!(
                "Series: {} {:.1}% | {} {:.1}%",
                self.team_a,
                self.series_prob_a * 100.0,
                self.team_b,
                self.series_prob_b * 100.0
            ),
            format!(
                "Remaining games {:?}: {} {} home / {} away",
                self.remaining.games, self.team_a, home_a, away_a
            ),
        ]
        .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn request(wins_a: u32, wins_b: u32) -> SeriesRequest {
        SeriesRequest {
            team_a: "Indiana Pacers".into(),
            team_b: "Oklahoma City Thunder".into(),
            rating_a: 1139.5,
            rating_b: 1255.9,
            seed_a: 4,
            seed_b: 1,
            wins_a,
            wins_b,
        }
    }

    #[test]
    fn better_seed_holds_court() {
        let o = SeriesOutlook::evaluate(&request(1, 0), &SeriesModel::nba(), 40.0).unwrap();
        assert!(!o.a_has_home_court);
        assert_eq!(o.home_court, "Oklahoma City Thunder");
        assert_eq!(o.remaining.games, vec![2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn series_probabilities_sum_to_one() {
        let o = SeriesOutlook::evaluate(&request(2, 1), &SeriesModel::nba(), 40.0).unwrap();
        assert_relative_eq!(o.series_prob_a + o.series_prob_b, 1.0, epsilon = 1e-15);
    }

    #[test]
    fn matches_model_directly() {
        let model = SeriesModel::nba();
        let o = SeriesOutlook::evaluate(&request(0, 0), &model, 40.0).unwrap();
        let gp = game_probabilities(1139.5, 1255.9, 40.0);
        let direct = model.win_probability(0, 0, gp.a_home, gp.a_away, false);
        assert_relative_eq!(o.series_prob_a, direct);
        assert!(o.game.a_home > o.game.neutral);
    }

    #[test]
    fn decided_series_is_rejected() {
        let err = SeriesOutlook::evaluate(&request(4, 2), &SeriesModel::nba(), 40.0);
        assert!(matches!(err, Err(EngineError::Validation(_))));
        let err = SeriesOutlook::evaluate(&request(1, 5), &SeriesModel::nba(), 40.0);
        assert!(matches!(err, Err(EngineError::Validation(_))));
    }

    #[test]
    fn equal_seeds_give_b_home_court() {
        let mut req = request(0, 0);
        req.seed_a = 2;
        req.seed_b = 2;
        let o = SeriesOutlook::evaluate(&req, &SeriesModel::nba(), 40.0).unwrap();
        assert!(!o.a_has_home_court);
    }

    #[test]
    fn render_mentions_both_teams() {
        let o = SeriesOutlook::evaluate(&request(1, 0), &SeriesModel::nba(), 40.0).unwrap();
        let text = o.render();
        assert!(text.contains("Indiana Pacers"));
        assert!(text.contains("Home court: Oklahoma City Thunder"));
    }
}
