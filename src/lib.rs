//! Elo team ratings, best-of-N series win probabilities and betting-market
//! edge analysis.
//!
//! * [`rating`] folds chronologically ordered game results into per-team Elo
//!   ratings under a configurable K-factor policy.
//! * [`series`] turns ratings into per-game chances (with a home-court
//!   offset) and solves the probability of winning a series from any state.
//! * [`market`] converts between odds notations and compares model
//!   probabilities with market prices (edge, EV, Kelly sizing).

pub mod error;
pub mod loader;
pub mod market;
pub mod models;
pub mod rating;
pub mod series;

pub use error::{EngineError, EngineResult};
pub use models::{GameResult, Stage, TeamRating, TrajectoryPoint};
