use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Which side hosts a given game of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Court {
    /// The side holding home-court advantage (the higher seed)
    Holder,
    /// The other side
    Challenger,
}

/// Longest series accepted: first to 64 wins (best of 127).
///
/// Keeps the `(wins_a, wins_b, game)` state space and the recursion depth of
/// the series model small.
pub const MAX_WINS_NEEDED: u32 = 64;

/// Number of games in a first-to-`wins_needed` series.
fn series_length(wins_needed: u32) -> EngineResult<u32> {
    if wins_needed == 0 {
        return Err(EngineError::Validation(
            "a series needs at least one win".to_string(),
        ));
    }
    if wins_needed > MAX_WINS_NEEDED {
        return Err(EngineError::Validation(format!(
            "series length first-to-{} exceeds the supported first-to-{}",
            wins_needed, MAX_WINS_NEEDED
        )));
    }
    wins_needed
        .checked_mul(2)
        .map(|games| games - 1)
        .ok_or_else(|| EngineError::Validation(format!("series length first-to-{} overflows", wins_needed)))
}

/// Fixed host assignment for every possible game of a best-of-N series.
///
/// Holds exactly `2 * wins_needed - 1` entries; game numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VenuePattern {
    wins_needed: u32,
    courts: Vec<Court>,
}

impl VenuePattern {
    /// Custom pattern; its length must match the series length.
    pub fn new(wins_needed: u32, courts: Vec<Court>) -> EngineResult<Self> {
        let max_games = series_length(wins_needed)?;
        if courts.len() != max_games as usize {
            return Err(EngineError::Validation(format!(
                "venue pattern for first-to-{} needs {} games, got {}",
                wins_needed,
                max_games,
                courts.len()
            )));
        }
        Ok(VenuePattern {
            wins_needed,
            courts,
        })
    }

    /// NBA 2-2-1-1-1: the holder hosts games 1, 2, 5 and 7.
    pub fn nba() -> Self {
        use Court::*;
        VenuePattern {
            wins_needed: 4,
            courts: vec![Holder, Holder, Challenger, Challenger, Holder, Challenger, Holder],
        }
    }

    /// Pattern for any series length.
    ///
    /// First-to-1 and first-to-2 alternate starting with the holder
    /// (1-1-1). Longer series open 2-2 and then alternate, which yields 2-2-1
    /// for first-to-3 and 2-2-1-1-1 for first-to-4. The decisive last game is
    /// always the holder's.
    pub fn derive(wins_needed: u32) -> EngineResult<Self> {
        let max_games = series_length(wins_needed)?;
        let courts = (1..=max_games)
            .map(|game| {
                let holder = if wins_needed <= 2 {
                    game % 2 == 1
                } else {
                    match game {
                        1 | 2 => true,
                        3 | 4 => false,
                        _ => game % 2 == 1,
                    }
                };
                if holder {
                    Court::Holder
                } else {
                    Court::Challenger
                }
            })
            .collect();
        Ok(VenuePattern {
            wins_needed,
            courts,
        })
    }

    pub fn wins_needed(&self) -> u32 {
        self.wins_needed
    }

    pub fn max_games(&self) -> u32 {
        self.courts.len() as u32
    }

    pub fn courts(&self) -> &[Court] {
        &self.courts
    }

    /// Host of 1-based `game`, `None` past the end of the series.
    pub fn court(&self, game: u32) -> Option<Court> {
        if game == 0 {
            return None;
        }
        self.courts.get(game as usize - 1).copied()
    }

    /// Whether side A hosts `game`, given which side holds home court.
    pub fn a_at_home(&self, game: u32, a_has_home_court: bool) -> bool {
        match self.court(game) {
            Some(Court::Holder) => a_has_home_court,
            Some(Court::Challenger) => !a_has_home_court,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Court::*;

    #[test]
    fn nba_holder_games() {
        let p = VenuePattern::nba();
        let holder_games: Vec<u32> = (1..=7).filter(|g| p.court(*g) == Some(Holder)).collect();
        assert_eq!(holder_games, vec![1, 2, 5, 7]);
        assert_eq!(p.max_games(), 7);
    }

    #[test]
    fn derived_best_of_seven_is_nba() {
        assert_eq!(VenuePattern::derive(4).unwrap(), VenuePattern::nba());
    }

    #[test]
    fn derived_short_series() {
        assert_eq!(VenuePattern::derive(1).unwrap().courts(), &[Holder]);
        assert_eq!(
            VenuePattern::derive(2).unwrap().courts(),
            &[Holder, Challenger, Holder]
        );
        assert_eq!(
            VenuePattern::derive(3).unwrap().courts(),
            &[Holder, Holder, Challenger, Challenger, Holder]
        );
    }

    #[test]
    fn derived_long_series_ends_with_holder() {
        for n in 1..=8 {
            let p = VenuePattern::derive(n).unwrap();
            assert_eq!(p.max_games(), 2 * n - 1);
            assert_eq!(p.court(p.max_games()), Some(Holder));
        }
    }

    #[test]
    fn custom_pattern_length_checked() {
        assert!(VenuePattern::new(4, vec![Holder; 6]).is_err());
        assert!(VenuePattern::new(0, vec![]).is_err());
        assert!(VenuePattern::derive(0).is_err());
        let p = VenuePattern::new(4, vec![Holder, Holder, Challenger, Challenger, Holder, Holder, Holder]).unwrap();
        assert_eq!(p.court(6), Some(Holder));
    }

    #[test]
    fn oversized_series_rejected() {
        assert!(VenuePattern::derive(MAX_WINS_NEEDED).is_ok());
        for n in [MAX_WINS_NEEDED + 1, 100_000, 3_000_000_000, u32::MAX] {
            assert!(matches!(VenuePattern::derive(n), Err(EngineError::Validation(_))));
            assert!(matches!(VenuePattern::new(n, vec![]), Err(EngineError::Validation(_))));
        }
    }

    #[test]
    fn a_at_home_follows_holder() {
        let p = VenuePattern::nba();
        assert!(p.a_at_home(1, true));
        assert!(!p.a_at_home(1, false));
        assert!(p.a_at_home(3, false));
        assert!(!p.a_at_home(8, true));
        assert_eq!(p.court(0), None);
    }
}
