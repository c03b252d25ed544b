//! Conversions between win probability and betting-odds notations.
//!
//! American odds: `+150` pays 150 per 100 staked (underdog), `-200` needs 200
//! staked to win 100 (favourite). Probability → American rounds to an
//! integer, so round trips are approximate.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// A quoted price in either notation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OddsValue {
    Probability(f64),
    American(i32),
}

impl OddsValue {
    pub fn to_probability(self) -> EngineResult<f64> {
        match self {
            OddsValue::Probability(p) => {
                check_open_unit(p)?;
                Ok(p)
            }
            OddsValue::American(odds) => american_to_probability(odds),
        }
    }

    pub fn to_american(self) -> EngineResult<i32> {
        match self {
            OddsValue::Probability(p) => probability_to_american(p),
            OddsValue::American(odds) => {
                if odds == 0 {
                    return Err(zero_odds());
                }
                Ok(odds)
            }
        }
    }
}

/// Implied probability of American odds.
pub fn american_to_probability(odds: i32) -> EngineResult<f64> {
    if odds == 0 {
        return Err(zero_odds());
    }
    let odds = odds as f64;
    if odds > 0.0 {
        Ok(100.0 / (odds + 100.0))
    } else {
        Ok(odds.abs() / (odds.abs() + 100.0))
    }
}

/// American odds for a probability in (0, 1).
///
/// Even money is quoted as `+100`; `-100` and `+100` are the same price.
pub fn probability_to_american(prob: f64) -> EngineResult<i32> {
    check_open_unit(prob)?;
    if prob == 0.5 {
        return Ok(100);
    }
    let raw = if prob >= 0.5 {
        -100.0 * prob / (1.0 - prob)
    } else {
        100.0 * (1.0 - prob) / prob
    };
    to_i32(raw.round())
}

/// American odds for decimal (European) odds.
pub fn decimal_to_american(decimal_odds: f64) -> EngineResult<i32> {
    if !decimal_odds.is_finite() || decimal_odds <= 1.0 {
        return Err(EngineError::Conversion(format!(
            "decimal odds must be greater than 1.0, got {}",
            decimal_odds
        )));
    }
    let raw = if decimal_odds >= 2.0 {
        (decimal_odds - 1.0) * 100.0
    } else {
        -100.0 / (decimal_odds - 1.0)
    };
    to_i32(raw.round())
}

/// Decimal odds (total return per unit staked) for American odds.
pub fn american_to_decimal(odds: i32) -> EngineResult<f64> {
    if odds == 0 {
        return Err(zero_odds());
    }
    let odds = odds as f64;
    if odds > 0.0 {
        Ok(1.0 + odds / 100.0)
    } else {
        Ok(1.0 + 100.0 / odds.abs())
    }
}

/// Accept a probability as a decimal in (0, 1) or a percentage in (1, 100).
pub fn normalize_probability(value: f64) -> EngineResult<f64> {
    if value.is_finite() && value > 0.0 && value < 1.0 {
        Ok(value)
    } else if value.is_finite() && value > 1.0 && value < 100.0 {
        Ok(value / 100.0)
    } else {
        Err(EngineError::Conversion(format!(
            "probability must be in (0, 1) or a percentage in (1, 100), got {}",
            value
        )))
    }
}

fn check_open_unit(prob: f64) -> EngineResult<()> {
    if !prob.is_finite() || prob <= 0.0 || prob >= 1.0 {
        return Err(EngineError::Conversion(format!(
            "probability must be strictly between 0 and 1, got {}",
            prob
        )));
    }
    Ok(())
}

fn to_i32(value: f64) -> EngineResult<i32> {
    if value < i32::MIN as f64 || value > i32::MAX as f64 {
        return Err(EngineError::Conversion(format!(
            "odds {} do not fit an American quote",
            value
        )));
    }
    Ok(value as i32)
}

fn zero_odds() -> EngineError {
    EngineError::Conversion("American odds of 0 are undefined".to_string())
}
