//! K-factor schedules.
//!
//! The K-factor bounds how far a single game can move a rating. One policy is
//! active per engine run; policies compose through `StageBoosted`.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::Stage;

/// Playoff multiplier used by the boosted schedule
pub const DEFAULT_PLAYOFF_BOOST: f64 = 1.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KFactorPolicy {
    /// Constant K for every game
    Fixed { k: f64 },
    /// Linear slide from `start` to `min` over the season, floored at `min`
    Decreasing { start: f64, min: f64 },
    /// `base` multiplied by `factor` for playoff games
    StageBoosted { base: Box<KFactorPolicy>, factor: f64 },
    /// `before` for games earlier than `cutover_year`, `from` afterwards
    YearTiered { cutover_year: i32, before: f64, from: f64 },
}

impl KFactorPolicy {
    pub fn fixed(k: f64) -> Self {
        KFactorPolicy::Fixed { k }
    }

    pub fn decreasing(start: f64, min: f64) -> Self {
        KFactorPolicy::Decreasing { start, min }
    }

    pub fn year_tiered(cutover_year: i32, before: f64, from: f64) -> Self {
        KFactorPolicy::YearTiered {
            cutover_year,
            before,
            from,
        }
    }

    /// Wrap this policy so playoff games get `factor` times the K.
    pub fn with_playoff_boost(self, factor: f64) -> Self {
        KFactorPolicy::StageBoosted {
            base: Box::new(self),
            factor,
        }
    }

    /// K for the game at `game_index` (0-based) of `total_games`.
    ///
    /// `total_games == 0` is a degenerate schedule, not an error: the
    /// decreasing policy answers with its starting K.
    pub fn compute(&self, game_index: usize, total_games: usize, stage: Stage, calendar_year: i32) -> f64 {
        match self {
            KFactorPolicy::Fixed { k } => *k,
            KFactorPolicy::Decreasing { start, min } => {
                if total_games == 0 {
                    return *start;
                }
                let progress = game_index as f64 / total_games as f64;
                (start + (min - start) * progress).max(*min)
            }
            KFactorPolicy::StageBoosted { base, factor } => {
                let k = base.compute(game_index, total_games, stage, calendar_year);
                if stage == Stage::Playoff {
                    k * factor
                } else {
                    k
                }
            }
            KFactorPolicy::YearTiered {
                cutover_year,
                before,
                from,
            } => {
                if calendar_year < *cutover_year {
                    *before
                } else {
                    *from
                }
            }
        }
    }

    /// Reject constants that would produce a non-positive or non-finite K.
    pub fn validate(&self) -> EngineResult<()> {
        match self {
            KFactorPolicy::Fixed { k } => positive("k", *k),
            KFactorPolicy::Decreasing { start, min } => {
                positive("start", *start)?;
                positive("min", *min)?;
                if min > start {
                    return Err(EngineError::Validation(format!(
                        "decreasing K must not grow: start {} < min {}",
                        start, min
                    )));
                }
                Ok(())
            }
            KFactorPolicy::StageBoosted { base, factor } => {
                positive("playoff boost", *factor)?;
                base.validate()
            }
            KFactorPolicy::YearTiered { before, from, .. } => {
                positive("before", *before)?;
                positive("from", *from)
            }
        }
    }

    /// Short label for tables and logs
    pub fn describe(&self) -> String {
        match self {
            KFactorPolicy::Fixed { k } => format!("K={}", k),
            KFactorPolicy::Decreasing { start, min } => format!("K={}→{}", start, min),
            KFactorPolicy::StageBoosted { base, factor } => {
                format!("{} (playoffs ×{})", base.describe(), factor)
            }
            KFactorPolicy::YearTiered {
                cutover_year,
                before,
                from,
            } => format!("K={} before {}, K={} from {}", before, cutover_year, from, cutover_year),
        }
    }
}

fn positive(label: &str, value: f64) -> EngineResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(EngineError::Validation(format!(
            "K-factor {} must be positive, got {}",
            label, value
        )));
    }
    Ok(())
}
