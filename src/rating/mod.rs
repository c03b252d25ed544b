pub mod engine;
pub mod k_factor;
pub mod season;
pub mod win_prob;

pub use engine::{RatingEngine, TiePolicy, DEFAULT_BASELINE};
pub use k_factor::{KFactorPolicy, DEFAULT_PLAYOFF_BOOST};
pub use season::{compare_policies, run_season, PolicyComparison, SeasonRun, SeasonSettings, SeasonSummary};
pub use win_prob::{expected_score, game_probabilities, mov_multiplier, GameProbabilities, DEFAULT_HOME_ADVANTAGE};
