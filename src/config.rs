use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};

use series_elo::market::{MarketEdgeAnalyzer, RiskThresholds, DEFAULT_KELLY_MULTIPLIER};
use series_elo::rating::{
    KFactorPolicy, SeasonSettings, TiePolicy, DEFAULT_BASELINE, DEFAULT_HOME_ADVANTAGE,
};
use series_elo::series::MAX_WINS_NEEDED;

/// Elo team ratings, playoff series odds and betting-market edges
#[derive(Parser, Debug, Clone)]
#[command(name = "series-elo", version, about)]
pub struct Config {
    /// Starting rating of every team
    #[arg(long, env = "ELO_BASELINE", default_value_t = DEFAULT_BASELINE, global = true)]
    pub baseline: f64,

    /// Home-court advantage in Elo points
    #[arg(long, env = "HOME_ADVANTAGE", default_value_t = DEFAULT_HOME_ADVANTAGE, global = true)]
    pub home_advantage: f64,

    /// How tied scores are handled
    #[arg(long, env = "TIE_POLICY", value_enum, default_value_t = TieHandling::Reject, global = true)]
    pub ties: TieHandling,

    /// K-factor schedule
    #[arg(long, env = "K_POLICY", value_enum, default_value_t = KPolicyKind::Fixed, global = true)]
    pub k_policy: KPolicyKind,

    /// K for the fixed schedule
    #[arg(long, env = "K_FACTOR", default_value = "20.0", global = true)]
    pub k_factor: f64,

    /// Opening K for the decreasing schedule
    #[arg(long, env = "K_START", default_value = "40.0", global = true)]
    pub k_start: f64,

    /// Floor K for the decreasing schedule
    #[arg(long, env = "K_MIN", default_value = "10.0", global = true)]
    pub k_min: f64,

    /// First calendar year of the second tier of the by-year schedule
    #[arg(long, env = "K_CUTOVER_YEAR", default_value = "2025", global = true)]
    pub k_cutover_year: i32,

    /// K for games before the cutover year
    #[arg(long, env = "K_BEFORE", default_value = "15.0", global = true)]
    pub k_before: f64,

    /// K for games from the cutover year on
    #[arg(long, env = "K_FROM", default_value = "25.0", global = true)]
    pub k_from: f64,

    /// Multiply K by this factor in playoff games
    #[arg(long, env = "PLAYOFF_BOOST", global = true)]
    pub playoff_boost: Option<f64>,

    /// Include preseason games in rating runs
    #[arg(long, env = "INCLUDE_PRESEASON", default_value = "false", global = true)]
    pub include_preseason: bool,

    /// Fractional Kelly multiplier for recommended stakes (0.0–1.0)
    #[arg(long, env = "KELLY_FRACTION", default_value_t = DEFAULT_KELLY_MULTIPLIER, global = true)]
    pub kelly_fraction: f64,

    /// Edge below which a comparison is rated low
    #[arg(long, env = "RISK_LOW", default_value = "0.05", global = true)]
    pub risk_low: f64,

    /// Edge below which a comparison is rated moderate
    #[arg(long, env = "RISK_MODERATE", default_value = "0.15", global = true)]
    pub risk_moderate: f64,

    /// Print results as pretty JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KPolicyKind {
    Fixed,
    Decreasing,
    ByYear,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieHandling {
    Reject,
    AwayWin,
}

impl From<TieHandling> for TiePolicy {
    fn from(t: TieHandling) -> Self {
        match t {
            TieHandling::Reject => TiePolicy::Reject,
            TieHandling::AwayWin => TiePolicy::ScoreAsAwayWin,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Rate every team from a JSON file of game results
    Ratings {
        /// JSON array of game results
        #[arg(long)]
        games: PathBuf,
        /// Number of teams to list
        #[arg(long, default_value = "30")]
        top: usize,
        /// Print the rating trajectory of these teams
        #[arg(long = "trajectory")]
        trajectory: Vec<String>,
    },
    /// Run the same games under the fixed, decreasing and by-year schedules
    Compare {
        #[arg(long)]
        games: PathBuf,
    },
    /// Series win probability from the current score
    Series(SeriesArgs),
    /// Convert between American odds, decimal odds and probability
    #[command(group(ArgGroup::new("quote").required(true).args(["american", "probability", "decimal"])))]
    Odds {
        #[arg(long, allow_hyphen_values = true)]
        american: Option<i32>,
        /// Decimal in (0, 1) or percentage in (1, 100)
        #[arg(long)]
        probability: Option<f64>,
        #[arg(long)]
        decimal: Option<f64>,
    },
    /// Compare model estimates with the betting market
    Edge(EdgeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SeriesArgs {
    #[arg(long)]
    pub team_a: String,
    #[arg(long)]
    pub team_b: String,
    /// Rating of team A; looked up from --games when omitted
    #[arg(long)]
    pub rating_a: Option<f64>,
    #[arg(long)]
    pub rating_b: Option<f64>,
    /// Game results to rate both teams from
    #[arg(long)]
    pub games: Option<PathBuf>,
    /// Seed of team A; the lower seed holds home court
    #[arg(long)]
    pub seed_a: u32,
    #[arg(long)]
    pub seed_b: u32,
    #[arg(long, default_value = "0")]
    pub wins_a: u32,
    #[arg(long, default_value = "0")]
    pub wins_b: u32,
    /// Wins needed to take the series (4 = best of seven)
    #[arg(long, default_value = "4")]
    pub wins_needed: u32,
}

#[derive(Args, Debug, Clone)]
#[command(group(ArgGroup::new("market").required(true).args(["market_odds", "market_prob"])))]
pub struct EdgeArgs {
    #[arg(long, default_value = "Team A")]
    pub team_a: String,
    #[arg(long, default_value = "Team B")]
    pub team_b: String,
    #[arg(long, default_value = "0")]
    pub wins_a: u32,
    #[arg(long, default_value = "0")]
    pub wins_b: u32,
    /// Market price for team A as American odds
    #[arg(long, allow_hyphen_values = true)]
    pub market_odds: Option<i32>,
    /// Market price for team A as a probability
    #[arg(long)]
    pub market_prob: Option<f64>,
    /// Elo model probability for team A
    #[arg(long)]
    pub elo: Option<f64>,
    /// Historical-precedent probability for team A
    #[arg(long)]
    pub historical: Option<f64>,
    /// Extra estimate as LABEL=PROBABILITY (repeatable)
    #[arg(long = "estimate", value_parser = parse_estimate)]
    pub estimates: Vec<(String, f64)>,
}

fn parse_estimate(raw: &str) -> Result<(String, f64), String> {
    let (label, prob) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected LABEL=PROBABILITY, got '{}'", raw))?;
    let label = label.trim();
    if label.is_empty() {
        return Err("estimate label is empty".to_string());
    }
    let prob: f64 = prob
        .trim()
        .parse()
        .map_err(|e| format!("bad probability in '{}': {}", raw, e))?;
    Ok((label.to_string(), prob))
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.baseline.is_finite() {
            anyhow::bail!("baseline must be a finite number");
        }
        if !self.home_advantage.is_finite() || self.home_advantage < 0.0 {
            anyhow::bail!("home_advantage must be a non-negative number");
        }
        self.k_factor_policy().validate()?;
        self.analyzer()?;

        match &self.command {
            Command::Series(args) => {
                if !(1..=MAX_WINS_NEEDED).contains(&args.wins_needed) {
                    anyhow::bail!("wins_needed must be between 1 and {}", MAX_WINS_NEEDED);
                }
                let ratings_given = args.rating_a.is_some() && args.rating_b.is_some();
                if !ratings_given && args.games.is_none() {
                    anyhow::bail!("give both --rating-a and --rating-b, or --games to rate the teams");
                }
            }
            Command::Edge(args) => {
                if args.elo.is_none() && args.historical.is_none() && args.estimates.is_empty() {
                    anyhow::bail!("at least one model estimate (--elo, --historical or --estimate) is required");
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// The configured K-factor schedule, boosted in playoffs when requested.
    pub fn k_factor_policy(&self) -> KFactorPolicy {
        let policy = self.policy_of_kind(self.k_policy);
        match self.playoff_boost {
            Some(factor) => policy.with_playoff_boost(factor),
            None => policy,
        }
    }

    /// Every schedule with the configured parameters, for side-by-side runs.
    pub fn comparison_policies(&self) -> Vec<(String, KFactorPolicy)> {
        [
            ("Fixed", KPolicyKind::Fixed),
            ("Decreasing", KPolicyKind::Decreasing),
            ("By year", KPolicyKind::ByYear),
        ]
        .into_iter()
        .map(|(label, kind)| {
            let policy = self.policy_of_kind(kind);
            let policy = match self.playoff_boost {
                Some(factor) => policy.with_playoff_boost(factor),
                None => policy,
            };
            (label.to_string(), policy)
        })
        .collect()
    }

    pub fn season_settings(&self) -> SeasonSettings {
        SeasonSettings {
            baseline: self.baseline,
            tie_policy: self.ties.into(),
            include_preseason: self.include_preseason,
            ..SeasonSettings::default()
        }
    }

    pub fn analyzer(&self) -> anyhow::Result<MarketEdgeAnalyzer> {
        let thresholds = RiskThresholds {
            low: self.risk_low,
            moderate: self.risk_moderate,
        };
        Ok(MarketEdgeAnalyzer::new(thresholds, self.kelly_fraction)?)
    }

    fn policy_of_kind(&self, kind: KPolicyKind) -> KFactorPolicy {
        match kind {
            KPolicyKind::Fixed => KFactorPolicy::fixed(self.k_factor),
            KPolicyKind::Decreasing => KFactorPolicy::decreasing(self.k_start, self.k_min),
            KPolicyKind::ByYear => KFactorPolicy::year_tiered(self.k_cutover_year, self.k_before, self.k_from),
        }
    }
}
