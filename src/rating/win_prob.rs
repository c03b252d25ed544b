//! Logistic Elo win probability and the margin-of-victory multiplier.
//!
//! Both the rating engine and the series model go through these functions, so
//! a rating gap means the same thing when ratings are updated and when they
//! are turned into per-game probabilities.

use serde::{Deserialize, Serialize};

/// Rating gap that turns a 1:1 matchup into 10:1 odds.
const ELO_SCALE: f64 = 400.0;

/// Margin (points) at which the MOV multiplier reaches 1.0 (ln(20) = ln(19 + 1)).
const MOV_REFERENCE: f64 = 20.0;

/// Default home-court advantage in Elo points.
pub const DEFAULT_HOME_ADVANTAGE: f64 = 40.0;

// ── Expected score ───────────────────────────────────────────────────────────

/// Expected score (win probability) of a side rated `rating_a` against a side
/// rated `rating_b`.
///
///   E_A = 1 / (1 + 10^((R_B − R_A) / 400))
pub fn expected_score(rating_a: f64, rating_b: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((rating_b - rating_a) / ELO_SCALE))
}

/// Logarithmic margin-of-victory multiplier: `ln(margin + 1) / ln(20)`.
///
/// Zero for a zero margin and exactly 1.0 at a 19-point margin.
pub fn mov_multiplier(margin: u32) -> f64 {
    (margin as f64 + 1.0).ln() / MOV_REFERENCE.ln()
}

// ── Home court ───────────────────────────────────────────────────────────────

/// Per-game win probabilities for side A against side B.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameProbabilities {
    /// A's chance on a neutral floor
    pub neutral: f64,
    /// A's chance when A hosts
    pub a_home: f64,
    /// A's chance when B hosts
    pub a_away: f64,
}

/// Shift A's rating by `home_advantage` Elo points in either direction to get
/// the home and away chances.
pub fn game_probabilities(rating_a: f64, rating_b: f64, home_advantage: f64) -> GameProbabilities {
    GameProbabilities {
        neutral: expected_score(rating_a, rating_b),
        a_home: expected_score(rating_a + home_advantage, rating_b),
        a_away: expected_score(rating_a - home_advantage, rating_b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn equal_ratings_are_even() {
        assert_relative_eq!(expected_score(1000.0, 1000.0), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn finals_away_side_probability() {
        // Thunder 1213.7 hosting Pacers 1131.8: the Pacers' chance ≈ 38.4%
        let p = expected_score(1131.8, 1213.7);
        assert_relative_eq!(p, 0.3842, epsilon = 1e-4);
    }

    #[test]
    fn four_hundred_points_is_ten_to_one() {
        assert_relative_eq!(expected_score(1400.0, 1000.0), 10.0 / 11.0, epsilon = 1e-12);
    }

    #[test]
    fn mov_multiplier_values() {
        assert_eq!(mov_multiplier(0), 0.0);
        assert_relative_eq!(mov_multiplier(1), 2f64.ln() / 20f64.ln(), epsilon = 1e-12);
        assert_relative_eq!(mov_multiplier(1), 0.2314, epsilon = 1e-4);
        assert_relative_eq!(mov_multiplier(19), 1.0, epsilon = 1e-12);
        assert!(mov_multiplier(40) > mov_multiplier(20));
    }

    #[test]
    fn home_court_shifts_both_ways() {
        let gp = game_probabilities(1139.5, 1255.9, DEFAULT_HOME_ADVANTAGE);
        assert!(gp.a_home > gp.neutral);
        assert!(gp.a_away < gp.neutral);
        assert_relative_eq!(gp.neutral, expected_score(1139.5, 1255.9), epsilon = 1e-12);
    }

    #[test]
    fn zero_home_advantage_collapses_to_neutral() {
        let gp = game_probabilities(1050.0, 990.0, 0.0);
        assert_eq!(gp.a_home, gp.neutral);
        assert_eq!(gp.a_away, gp.neutral);
    }

    proptest! {
        #[test]
        fn expected_scores_are_complementary(a in 0.0f64..3000.0, b in 0.0f64..3000.0) {
            let sum = expected_score(a, b) + expected_score(b, a);
            prop_assert!((sum - 1.0).abs() < 1e-12);
        }

        #[test]
        fn expected_score_increases_with_rating(
            a in 0.0f64..2500.0,
            bump in 1.0f64..500.0,
            b in 0.0f64..2500.0,
        ) {
            prop_assert!(expected_score(a + bump, b) > expected_score(a, b));
        }
    }
}
