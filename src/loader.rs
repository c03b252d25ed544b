//! JSON game-record loading.
//!
//! Input is an array of `GameResult` records in their serde form:
//!
//! ```json
//! [{"home_team": "Boston Celtics", "away_team": "New York Knicks",
//!   "home_score": 132, "away_score": 109,
//!   "played_at": "2024-10-22T23:30:00Z", "stage": "regular"}]
//! ```

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::models::{GameResult, Stage};

/// Parse game records from a JSON string.
///
/// Preseason games are dropped unless `include_preseason` is set. Fails with
/// `EngineError::Data` on malformed JSON or when no usable game remains.
pub fn parse_games(json: &str, include_preseason: bool) -> EngineResult<Vec<GameResult>> {
    let games: Vec<GameResult> = serde_json::from_str(json)
        .map_err(|e| EngineError::Data(format!("malformed game records: {}", e)))?;
    let total = games.len();

    let games: Vec<GameResult> = games
        .into_iter()
        .filter(|g| include_preseason || g.stage != Stage::Preseason)
        .collect();
    if games.is_empty() {
        return Err(EngineError::Data(format!(
            "no usable games ({} records read)",
            total
        )));
    }
    debug!("kept {} of {} game records", games.len(), total);
    Ok(games)
}

/// Read and parse game records from a JSON file.
pub fn load_games(path: &Path, include_preseason: bool) -> EngineResult<Vec<GameResult>> {
    let json = fs::read_to_string(path)
        .map_err(|e| EngineError::Data(format!("cannot read {}: {}", path.display(), e)))?;
    let games = parse_games(&json, include_preseason)?;
    info!("Loaded {} games from {}", games.len(), path.display());
    Ok(games)
}
