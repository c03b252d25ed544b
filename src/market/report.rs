use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::series::SeriesState;

use super::edge::{EdgeAnalysis, MarketEdgeAnalyzer};
use super::odds::{normalize_probability, probability_to_american};

const RULE_WIDTH: usize = 80;

/// Where a probability estimate came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateSource {
    BettingMarket,
    EloModel,
    HistoricalPrecedent,
    Other(String),
}

impl EstimateSource {
    pub fn label(&self) -> &str {
        match self {
            EstimateSource::BettingMarket => "Betting Markets",
            EstimateSource::EloModel => "Elo Model",
            EstimateSource::HistoricalPrecedent => "Historical Precedent",
            EstimateSource::Other(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityEstimate {
    pub source: EstimateSource,
    /// Decimal probability that team A wins
    pub team_a_probability: f64,
    pub confidence: Option<String>,
}

impl ProbabilityEstimate {
    pub fn team_b_probability(&self) -> f64 {
        1.0 - self.team_a_probability
    }
}

/// Named estimates for one matchup, compared against the betting market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketComparison {
    pub team_a: String,
    pub team_b: String,
    pub state: SeriesState,
    estimates: Vec<ProbabilityEstimate>,
}

impl MarketComparison {
    pub fn new(team_a: impl Into<String>, team_b: impl Into<String>, state: SeriesState) -> Self {
        MarketComparison {
            team_a: team_a.into(),
            team_b: team_b.into(),
            state,
            estimates: Vec::new(),
        }
    }

    /// Record team A's probability from `source`, as a decimal or percentage.
    pub fn add_estimate(
        &mut self,
        source: EstimateSource,
        team_a_probability: f64,
        confidence: Option<String>,
    ) -> EngineResult<()> {
        let team_a_probability = normalize_probability(team_a_probability)?;
        if self.estimates.iter().any(|e| e.source == source) {
            return Err(EngineError::Validation(format!(
                "duplicate estimate source '{}'",
                source.label()
            )));
        }
        self.estimates.push(ProbabilityEstimate {
            source,
            team_a_probability,
            confidence,
        });
        Ok(())
    }

    pub fn estimates(&self) -> &[ProbabilityEstimate] {
        &self.estimates
    }

    pub fn market(&self) -> Option<&ProbabilityEstimate> {
        self.estimates
            .iter()
            .find(|e| e.source == EstimateSource::BettingMarket)
    }

    /// Edge of every non-market estimate over the market, in insertion order.
    ///
    /// Empty when no market estimate was recorded.
    pub fn edges(&self, analyzer: &MarketEdgeAnalyzer) -> EngineResult<Vec<(&ProbabilityEstimate, EdgeAnalysis)>> {
        let Some(market) = self.market() else {
            return Ok(Vec::new());
        };
        self.estimates
            .iter()
            .filter(|e| e.source != EstimateSource::BettingMarket)
            .map(|e| {
                analyzer
                    .analyze(market.team_a_probability, e.team_a_probability)
                    .map(|analysis| (e, analysis))
            })
            .collect()
    }

    /// Tabular report: one row per estimate with implied American odds,
    /// then one edge line per non-market estimate.
    pub fn report(&self, analyzer: &MarketEdgeAnalyzer) -> EngineResult<String> {
        let rule = "=".repeat(RULE_WIDTH);
        let mut lines = vec![
            "SERIES BETTING MARKET ANALYSIS".to_string(),
            rule.clone(),
            format!("Matchup: {} vs {}", self.team_a, self.team_b),
            format!("Series state: {}", self.describe_state()),
            rule.clone(),
            String::new(),
            "PROBABILITY ESTIMATES".to_string(),
            format!(
                "{:<28} {:<14} {:<13} {}",
                "Model/Source",
                format!("{} Win %", self.team_a),
                "Implied Odds",
                format!("{} Win %", self.team_b)
            ),
            "-".repeat(RULE_WIDTH),
        ];

        for estimate in &self.estimates {
            let odds = probability_to_american(estimate.team_a_probability)?;
            let mut row = format!(
                "{:<28} {:>6.1}%        {:>+6}        {:>6.1}%",
                estimate.source.label(),
                estimate.team_a_probability * 100.0,
                odds,
                estimate.team_b_probability() * 100.0
            );
            if let Some(confidence) = &estimate.confidence {
                row.push_str(&format!("  ({})", confidence));
            }
            lines.push(row);
        }

        let edges = self.edges(analyzer)?;
        if !edges.is_empty() {
            lines.push(String::new());
            lines.push("MARKET EDGE".to_string());
            lines.push(rule);
            for (estimate, a) in edges {
                lines.push(format!(
                    "• {}: {:+.1}% edge, {:+.1}% EV, Kelly: {:.1}% (stake {:.1}%), Risk: {}",
                    estimate.source.label(),
                    a.edge * 100.0,
                    a.expected_value * 100.0,
                    a.kelly_fraction * 100.0,
                    a.recommended_fraction * 100.0,
                    a.risk
                ));
            }
        }

        Ok(lines.join("\n"))
    }

    fn describe_state(&self) -> String {
        let (a, b) = (self.state.wins_a, self.state.wins_b);
        if a > b {
            format!("{} leads {}-{}", self.team_a, a, b)
        } else if b > a {
            format!("{} leads {}-{}", self.team_b, b, a)
        } else {
            format!("tied {}-{}", a, b)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn finals() -> MarketComparison {
        let mut c = MarketComparison::new("Pacers", "Thunder", SeriesState::new(1, 0));
        c.add_estimate(EstimateSource::BettingMarket, 25.0, None).unwrap();
        c.add_estimate(EstimateSource::EloModel, 0.359, None).unwrap();
        c.add_estimate(
            EstimateSource::HistoricalPrecedent,
            40.0,
            Some("small sample".to_string()),
        )
        .unwrap();
        c
    }

    #[test]
    fn estimates_are_normalized() {
        let c = finals();
        assert_relative_eq!(c.estimates()[0].team_a_probability, 0.25);
        assert_relative_eq!(c.estimates()[0].team_b_probability(), 0.75);
        assert_eq!(c.market().map(|m| m.source.label()), Some("Betting Markets"));
    }

    #[test]
    fn duplicate_and_invalid_estimates_rejected() {
        let mut c = finals();
        assert!(matches!(
            c.add_estimate(EstimateSource::EloModel, 0.5, None),
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            c.add_estimate(EstimateSource::Other("coin".into()), 0.0, None),
            Err(EngineError::Conversion(_))
        ));
        assert_eq!(c.estimates().len(), 3);
    }

    #[test]
    fn edges_skip_market_row() {
        let c = finals();
        let edges = c.edges(&MarketEdgeAnalyzer::default()).unwrap();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].0.source, EstimateSource::EloModel);
        assert_relative_eq!(edges[1].1.edge, 0.6, epsilon = 1e-9);
    }

    #[test]
    fn no_market_means_no_edges() {
        let mut c = MarketComparison::new("A", "B", SeriesState::new(0, 0));
        c.add_estimate(EstimateSource::EloModel, 0.55, None).unwrap();
        assert!(c.edges(&MarketEdgeAnalyzer::default()).unwrap().is_empty());
        let report = c.report(&MarketEdgeAnalyzer::default()).unwrap();
        assert!(!report.contains("MARKET EDGE"));
        assert!(report.contains("tied 0-0"));
    }

    #[test]
    fn report_contents() {
        let report = finals().report(&MarketEdgeAnalyzer::default()).unwrap();
        assert!(report.contains("Matchup: Pacers vs Thunder"));
        assert!(report.contains("Pacers leads 1-0"));
        assert!(report.contains("+300"));
        assert!(report.contains("(small sample)"));
        assert!(report.contains("• Historical Precedent: +60.0% edge, +60.0% EV, Kelly: 20.0% (stake 5.0%), Risk: High Edge"));
    }
}
