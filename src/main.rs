use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::Path;
use tracing::info;

mod config;

use config::{Command, Config, EdgeArgs, SeriesArgs};
use series_elo::loader::load_games;
use series_elo::market::{
    american_to_decimal, american_to_probability, decimal_to_american, normalize_probability,
    probability_to_american, EstimateSource, MarketComparison,
};
use series_elo::models::GameResult;
use series_elo::rating::{compare_policies, run_season, SeasonRun};
use series_elo::series::{SeriesModel, SeriesOutlook, SeriesRequest, SeriesState};

fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();
    config.validate()?;

    match &config.command {
        Command::Ratings {
            games,
            top,
            trajectory,
        } => ratings(&config, games, *top, trajectory),
        Command::Compare { games } => compare(&config, games),
        Command::Series(args) => series(&config, args),
        Command::Odds {
            american,
            probability,
            decimal,
        } => odds(&config, *american, *probability, *decimal),
        Command::Edge(args) => edge(&config, args),
    }
}

fn emit<T: Serialize>(config: &Config, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    if config.json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text());
    }
    Ok(())
}

fn read_games(config: &Config, path: &Path) -> Result<Vec<GameResult>> {
    load_games(path, config.include_preseason)
        .with_context(|| format!("Failed to load games from {}", path.display()))
}

fn season(config: &Config, path: &Path) -> Result<SeasonRun> {
    let games = read_games(config, path)?;
    let run = run_season(&games, &config.k_factor_policy(), &config.season_settings())
        .context("Rating run failed")?;
    Ok(run)
}

// ── Commands ─────────────────────────────────────────────────────────────────

fn ratings(config: &Config, path: &Path, top: usize, trajectory: &[String]) -> Result<()> {
    let run = season(config, path)?;

    let mut tracked = Vec::new();
    for team in trajectory {
        let rating = run
            .engine
            .team(team)
            .with_context(|| format!("No games found for '{}'", team))?;
        tracked.push(rating);
    }

    if config.json {
        #[derive(Serialize)]
        struct Output<'a> {
            summary: &'a series_elo::rating::SeasonSummary,
            trajectories: Vec<&'a series_elo::TeamRating>,
        }
        return emit(
            config,
            &Output {
                summary: &run.summary,
                trajectories: tracked,
            },
            String::new,
        );
    }

    println!("{}", run.summary.render(top));
    for team in tracked {
        println!("\n{} ({}-{}):", team.team, team.wins, team.losses);
        for point in &team.trajectory {
            println!(
                "  #{:<5} {}  {:.1}",
                point.game_index,
                point.played_at.format("%Y-%m-%d"),
                point.rating
            );
        }
    }
    Ok(())
}

fn compare(config: &Config, path: &Path) -> Result<()> {
    let games = read_games(config, path)?;
    let policies = config.comparison_policies();
    let comparison = compare_policies(&games, &policies, &config.season_settings())
        .context("Policy comparison failed")?;
    info!("Compared {} K-factor schedules", policies.len());
    emit(config, &comparison, || comparison.render_table())
}

fn series(config: &Config, args: &SeriesArgs) -> Result<()> {
    let (rating_a, rating_b) = match (args.rating_a, args.rating_b) {
        (Some(a), Some(b)) => (a, b),
        (given_a, given_b) => {
            let path = args
                .games
                .as_deref()
                .context("--games is required when a rating is omitted")?;
            let run = season(config, path)?;
            let lookup = |team: &str| {
                run.engine
                    .team(team)
                    .map(|t| t.rating)
                    .with_context(|| format!("No games found for '{}'", team))
            };
            let a = match given_a {
                Some(r) => r,
                None => lookup(&args.team_a)?,
            };
            let b = match given_b {
                Some(r) => r,
                None => lookup(&args.team_b)?,
            };
            (a, b)
        }
    };

    let model = SeriesModel::first_to(args.wins_needed)?;
    let request = SeriesRequest {
        team_a: args.team_a.clone(),
        team_b: args.team_b.clone(),
        rating_a,
        rating_b,
        seed_a: args.seed_a,
        seed_b: args.seed_b,
        wins_a: args.wins_a,
        wins_b: args.wins_b,
    };
    let outlook = SeriesOutlook::evaluate(&request, &model, config.home_advantage)?;
    emit(config, &outlook, || outlook.render())
}

fn odds(config: &Config, american: Option<i32>, probability: Option<f64>, decimal: Option<f64>) -> Result<()> {
    let american = match (american, probability, decimal) {
        (Some(odds), _, _) => odds,
        (None, Some(p), _) => probability_to_american(normalize_probability(p)?)?,
        (None, None, Some(d)) => decimal_to_american(d)?,
        (None, None, None) => anyhow::bail!("one of --american, --probability or --decimal is required"),
    };

    #[derive(Serialize)]
    struct Quote {
        american: i32,
        decimal: f64,
        probability: f64,
    }
    let quote = Quote {
        american,
        decimal: american_to_decimal(american)?,
        probability: american_to_probability(american)?,
    };
    emit(config, &quote, || {
        format!(
            "American {:+}  |  decimal {:.3}  |  implied probability {:.1}%",
            quote.american,
            quote.decimal,
            quote.probability * 100.0
        )
    })
}

fn edge(config: &Config, args: &EdgeArgs) -> Result<()> {
    let market = match (args.market_odds, args.market_prob) {
        (Some(odds), _) => american_to_probability(odds)?,
        (None, Some(p)) => p,
        (None, None) => anyhow::bail!("one of --market-odds or --market-prob is required"),
    };

    let mut comparison = MarketComparison::new(
        args.team_a.clone(),
        args.team_b.clone(),
        SeriesState::new(args.wins_a, args.wins_b),
    );
    comparison
        .add_estimate(EstimateSource::BettingMarket, market, None)
        .context("Invalid market price")?;
    if let Some(p) = args.elo {
        comparison.add_estimate(EstimateSource::EloModel, p, None)?;
    }
    if let Some(p) = args.historical {
        comparison.add_estimate(EstimateSource::HistoricalPrecedent, p, None)?;
    }
    for (label, p) in &args.estimates {
        comparison
            .add_estimate(EstimateSource::Other(label.clone()), *p, None)
            .with_context(|| format!("Invalid estimate '{}'", label))?;
    }

    let analyzer = config.analyzer()?;
    if config.json {
        #[derive(Serialize)]
        struct Row<'a> {
            source: &'a str,
            analysis: series_elo::market::EdgeAnalysis,
        }
        let rows: Vec<Row> = comparison
            .edges(&analyzer)?
            .into_iter()
            .map(|(e, analysis)| Row {
                source: e.source.label(),
                analysis,
            })
            .collect();
        return emit(config, &rows, String::new);
    }
    println!("{}", comparison.report(&analyzer)?);
    Ok(())
}
