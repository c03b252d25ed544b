//! Market edge and Kelly Criterion sizing.
//!
//! The Kelly formula sizes a bet to maximise the expected logarithm of wealth.
//!
//! Standard formula:
//!   f* = (b·p − q) / b
//! where
//!   b  = net odds received on the bet (profit per unit staked, i.e. (1/price) − 1)
//!   p  = estimated probability of winning
//!   q  = 1 − p  (probability of losing)
//!
//! The analyzer reports full Kelly and a *fractional* Kelly recommendation
//! (0 < multiplier ≤ 1) that trades some growth for lower variance.
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, EngineResult};

use super::odds::normalize_probability;

pub const DEFAULT_KELLY_MULTIPLIER: f64 = 0.25;

/// Full Kelly stake fraction scaled by `kelly_fraction`.
///
/// # Arguments
/// * `win_prob`     – Estimated probability that the bet wins (0.0–1.0).
/// * `market_price` – Market-implied probability of the same outcome (0.0–1.0).
/// * `kelly_fraction` – Fractional Kelly multiplier (0.0–1.0).
///
/// # Returns
/// The fraction of bankroll to stake (0.0–1.0). `0.0` when there is no edge
/// or the market pays nothing (`1/price ≤ 1`).
pub fn kelly_stake(win_prob: f64, market_price: f64, kelly_fraction: f64) -> f64 {
    debug_assert!((0.0..=1.0).contains(&win_prob), "win_prob out of range");
    debug_assert!(
        (0.0..=1.0).contains(&kelly_fraction),
        "kelly_fraction out of range"
    );

    // Decimal odds 1/price must exceed 1 for the bet to pay anything
    if market_price <= 0.0 || market_price >= 1.0 {
        return 0.0;
    }

    // Net odds per unit staked (price=0.4 → 1.5x profit)
    let b = (1.0 / market_price) - 1.0;
    let p = win_prob;
    let q = 1.0 - p;

    let f = (b * p - q) / b;

    if f <= 0.0 {
        return 0.0;
    }

    (f * kelly_fraction).clamp(0.0, 1.0)
}

/// Relative edge of the model over the market.
///
/// Edge = win_prob / market_price − 1, i.e. (t − m) / m
pub fn edge(win_prob: f64, market_price: f64) -> f64 {
    if market_price <= 0.0 {
        return 0.0;
    }
    win_prob / market_price - 1.0
}

// ── Risk classification ─────────────────────────────────────────────────────

/// Edge magnitudes separating low / moderate / high
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub low: f64,
    pub moderate: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        RiskThresholds {
            low: 0.05,
            moderate: 0.15,
        }
    }
}

impl RiskThresholds {
    pub fn validate(&self) -> EngineResult<()> {
        if !self.low.is_finite() || !self.moderate.is_finite() || self.low <= 0.0 || self.moderate < self.low {
            return Err(EngineError::Validation(format!(
                "risk thresholds must satisfy 0 < low <= moderate, got {} / {}",
                self.low, self.moderate
            )));
        }
        Ok(())
    }

    pub fn classify(&self, edge: f64) -> RiskLevel {
        let magnitude = edge.abs();
        if magnitude < self.low {
            RiskLevel::Low
        } else if magnitude < self.moderate {
            RiskLevel::Moderate
        } else {
            RiskLevel::High
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskLevel::Low => "Low Edge",
            RiskLevel::Moderate => "Moderate Edge",
            RiskLevel::High => "High Edge",
        };
        f.write_str(label)
    }
}

// ── Analyzer ────────────────────────────────────────────────────────────────

/// One market-vs-model comparison, all probabilities as decimals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeAnalysis {
    pub market_probability: f64,
    pub model_probability: f64,
    pub edge: f64,
    /// Decimal odds implied by the market, `1 / m`
    pub market_odds: f64,
    pub expected_value: f64,
    /// Full Kelly fraction
    pub kelly_fraction: f64,
    /// Full Kelly scaled by the analyzer's multiplier
    pub recommended_fraction: f64,
    pub risk: RiskLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketEdgeAnalyzer {
    pub thresholds: RiskThresholds,
    pub kelly_multiplier: f64,
}

impl Default for MarketEdgeAnalyzer {
    fn default() -> Self {
        MarketEdgeAnalyzer {
            thresholds: RiskThresholds::default(),
            kelly_multiplier: DEFAULT_KELLY_MULTIPLIER,
        }
    }
}

impl MarketEdgeAnalyzer {
    pub fn new(thresholds: RiskThresholds, kelly_multiplier: f64) -> EngineResult<Self> {
        thresholds.validate()?;
        if !kelly_multiplier.is_finite() || kelly_multiplier <= 0.0 || kelly_multiplier > 1.0 {
            return Err(EngineError::Validation(format!(
                "kelly multiplier must be in (0, 1], got {}",
                kelly_multiplier
            )));
        }
        Ok(MarketEdgeAnalyzer {
            thresholds,
            kelly_multiplier,
        })
    }

    /// Compare a market-implied probability with a model probability.
    ///
    /// Either value may be a decimal in (0, 1) or a percentage in (1, 100).
    pub fn analyze(&self, market: f64, model: f64) -> EngineResult<EdgeAnalysis> {
        let m = normalize_probability(market)?;
        let t = normalize_probability(model)?;

        let market_odds = 1.0 / m;
        let expected_value = t * market_odds - 1.0;
        let kelly_fraction = kelly_stake(t, m, 1.0);
        let edge = edge(t, m);

        debug!(
            "market {:.3} vs model {:.3}: edge {:+.3}, kelly {:.3}",
            m, t, edge, kelly_fraction
        );

        Ok(EdgeAnalysis {
            market_probability: m,
            model_probability: t,
            edge,
            market_odds,
            expected_value,
            kelly_fraction,
            recommended_fraction: kelly_fraction * self.kelly_multiplier,
            risk: self.thresholds.classify(edge),
        })
    }
}
