//! Fan projector CLI
//!
//! Projects a quantile fan for one ticker and prints it as a table or JSON.
//!
//! Usage:
//!   cargo run --bin fan_projector -- --ticker SPY --horizon 30 --mode aggregate
//!   cargo run --bin fan_projector -- --input bundle.json --mode iv --json

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use quantile_fan::prelude::*;

/// Quantile fan projection
#[derive(Parser, Debug)]
#[command(name = "fan_projector")]
#[command(about = "Project a quantile price fan from option IVs and a trend forecast")]
struct Args {
    /// Ticker symbol to fetch
    #[arg(long, required_unless_present = "input")]
    ticker: Option<String>,

    /// Horizon in days (one of the configured allowed horizons)
    #[arg(long, default_value = "30")]
    horizon: u32,

    /// Forecast mode: iv, trend, aggregate (or 0, 1, 2)
    #[arg(long, default_value = "iv")]
    mode: String,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Offline market bundle instead of fetching
    #[arg(long)]
    input: Option<PathBuf>,

    /// Write the fetched bundle here for later offline runs
    #[arg(long)]
    save_bundle: Option<PathBuf>,

    /// Print the full grid as JSON
    #[arg(long)]
    json: bool,

    /// Always fetch fresh data
    #[arg(long)]
    no_cache: bool,

    /// Cache directory
    #[arg(long, default_value = "./data/cache")]
    cache_dir: PathBuf,
}

fn main() -> ExitCode {
    // Logs go to stderr so stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> ProjectionResult<()> {
    let config = match &args.config {
        Some(path) => ProjectionConfig::from_json_file(path)?,
        None => ProjectionConfig::default(),
    };
    config.check_offered_horizon(args.horizon)?;
    let mode: ForecastMode = args.mode.parse()?;

    let bundle = load_bundle(args, &config, mode)?;
    if let Some(path) = &args.save_bundle {
        bundle.to_json_file(path)?;
        tracing::info!("Saved bundle to {:?}", path);
    }

    let request = ProjectionRequest::new(bundle.snapshot, args.horizon, mode)
        .with_quantiles(config.quantile_set()?)
        .with_expirations(bundle.expirations);

    let projector = FanProjector::with_config(config);
    let grid = projector.project_with_forecaster(&request, &LinearTrendForecaster::new())?;

    if args.json {
        let json = serde_json::to_string_pretty(&grid)
            .map_err(|e| ProjectionError::Serialization(e.to_string()))?;
        println!("{}", json);
    } else {
        print_table(&bundle.symbol, &grid);
    }

    Ok(())
}

fn load_bundle(
    args: &Args,
    config: &ProjectionConfig,
    mode: ForecastMode,
) -> ProjectionResult<MarketBundle> {
    if let Some(path) = &args.input {
        return MarketBundle::from_json_file(path);
    }

    let ticker = args
        .ticker
        .as_deref()
        .ok_or_else(|| ProjectionError::invalid_input("--ticker or --input is required"))?;
    let window = config.history.window_for(mode);
    let max_offset = mode
        .needs_implied_vol()
        .then(|| args.horizon as i64 + config.expiry_lookahead_days as i64);

    let client = YahooClient::new()?;
    if args.no_cache {
        client.fetch_bundle(ticker, window, max_offset)
    } else {
        let cache = CacheConfig {
            cache_dir: args.cache_dir.clone(),
            ..Default::default()
        };
        CachedProvider::new(client, cache)?.fetch_bundle(ticker, window, max_offset)
    }
}

fn print_table(symbol: &str, grid: &FanGrid) {
    let levels = grid.quantiles.levels();
    let lo_rank = 0;
    let hi_rank = levels.len() - 1;
    let median = grid.median();
    let dates = grid.dates();

    println!(
        "{} {} fan from {} at ${:.2}",
        symbol, grid.mode, grid.valuation_date, grid.current_price
    );
    if let ProjectionStatus::Degraded(reasons) = &grid.status {
        println!("Degraded: {:?}", reasons);
    }
    if let Some(scan) = &grid.anchor_scan {
        println!(
            "Anchors: {} used, {} skipped{}",
            scan.used(),
            scan.skipped().count(),
            if scan.used_fallback { " (flat fallback)" } else { "" }
        );
    }

    println!();
    println!(
        "{:>10} {:>5} {:>10} {:>10} {:>10}",
        "Date",
        "Day",
        format!("q{:.0}", levels[lo_rank] * 100.0),
        "median",
        format!("q{:.0}", levels[hi_rank] * 100.0)
    );

    let horizon = grid.horizon_days() as usize;
    let step = (horizon / 10).max(1);
    for d in (0..=horizon).filter(|d| d % step == 0 || *d == horizon) {
        println!(
            "{:>10} {:>5} {:>10.2} {:>10.2} {:>10.2}",
            dates[d],
            grid.day_offsets[d],
            grid.family.value(lo_rank, d),
            median[d],
            grid.family.value(hi_rank, d)
        );
    }
}
