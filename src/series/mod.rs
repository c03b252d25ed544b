pub mod outlook;
pub mod probability;
pub mod venue;

pub use outlook::{SeriesOutlook, SeriesRequest};
pub use probability::{
    remaining_games_breakdown, series_win_probability, RemainingGames, SeriesModel, SeriesState,
};
pub use venue::{Court, VenuePattern, MAX_WINS_NEEDED};
