pub mod edge;
pub mod odds;
pub mod report;

pub use edge::{kelly_stake, EdgeAnalysis, MarketEdgeAnalyzer, RiskLevel, RiskThresholds, DEFAULT_KELLY_MULTIPLIER};
pub use odds::{
    american_to_decimal, american_to_probability, decimal_to_american, normalize_probability,
    probability_to_american, OddsValue,
};
pub use report::{EstimateSource, MarketComparison, ProbabilityEstimate};
