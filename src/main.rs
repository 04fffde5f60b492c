mod render;

use analytics::StatisticsEngine;
use anyhow::{Context, bail};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use clap::{Args, Parser, Subcommand};
use configuration::Config;
use core_types::{
    ENTRY_STRATEGY_OPTIONS, SystemClock, TradeFilter, TradingCalendar, is_entry_strategy,
    normalize_action,
};
use database::{DailyDebrief, DbRepository, connect, run_migrations};
use importer::CsvImporter;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The main entry point for the trade journal.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load JOURNAL__* overrides from a .env file when one is present
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => configuration::load_config_from(path),
        None => configuration::load_config(),
    }
    .context("Failed to load configuration")?;
    let _log_guard =
        configuration::init_tracing(&config.logging).context("Failed to initialise logging")?;

    // Initialize the database connection and run migrations
    let db_pool = connect(&config.database.url, config.database.max_connections)
        .await
        .with_context(|| format!("Failed to open database {}", config.database.url))?;
    run_migrations(&db_pool)
        .await
        .context("Failed to run database migrations")?;
    let repo = DbRepository::new(db_pool);

    // Execute the appropriate command
    match cli.command {
        Commands::Init => handle_init(&repo, &config).await,
        Commands::Import(args) => handle_import(&repo, &config, args).await,
        Commands::Trades(filter) => handle_trades(&repo, filter).await,
        Commands::Stats(args) => handle_stats(&repo, args).await,
        Commands::Instruments => handle_instruments(&repo).await,
        Commands::SetMultiplier { instrument, multiplier } => {
            repo.update_instrument_multiplier(&instrument, multiplier)
                .await
                .with_context(|| format!("Failed to update multiplier for {instrument}"))?;
            println!("{instrument} multiplier set to {}", multiplier.normalize());
            Ok(())
        }
        Commands::SetStrategy { trade_id, strategy } => {
            repo.update_trade_entry_strategy(trade_id, &strategy)
                .await
                .with_context(|| format!("Failed to tag trade {trade_id}"))?;
            println!("Trade {trade_id} tagged as {strategy}");
            Ok(())
        }
        Commands::Attach { trade_id, images } => {
            let now = Local::now().naive_local();
            let stored =
                attach_images(&repo, &config.storage.images_dir, trade_id, &images, now).await?;
            for path in &stored {
                println!("Attached {path}");
            }
            Ok(())
        }
        Commands::Debrief(command) => handle_debrief(&repo, &config, command).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// A single-user trading journal: record trades, import trade logs and review statistics.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file to use instead of ./config.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and register the configured instruments.
    Init,
    /// Import a broker trade export (CSV).
    Import(ImportArgs),
    /// List trades, newest first.
    Trades(FilterArgs),
    /// Compute statistics over the filtered trades.
    Stats(StatsArgs),
    /// List instruments and their point-value multipliers.
    Instruments,
    /// Change an instrument's multiplier. Statistics reprice immediately.
    SetMultiplier {
        instrument: String,
        multiplier: Decimal,
    },
    /// Tag a trade with an entry strategy.
    SetStrategy {
        trade_id: i64,
        #[arg(value_parser = parse_strategy)]
        strategy: String,
    },
    /// Attach chart screenshots to a trade.
    Attach {
        trade_id: i64,
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Read or write the journal entry for a trading day.
    #[command(subcommand)]
    Debrief(DebriefCommand),
}

#[derive(Args)]
struct ImportArgs {
    /// Path to the exported CSV file.
    path: PathBuf,
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// First trade date to include (YYYY-MM-DD).
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Last trade date to include (YYYY-MM-DD).
    #[arg(long)]
    to: Option<NaiveDate>,
    #[arg(long)]
    instrument: Option<String>,
    /// Buy or Sell (Long and Short are accepted).
    #[arg(long)]
    action: Option<String>,
    #[arg(long, value_parser = parse_strategy)]
    strategy: Option<String>,
    #[arg(long)]
    min_bars: Option<u32>,
    #[arg(long)]
    max_bars: Option<u32>,
    /// Earliest entry time (HH:MM or HH:MM:SS).
    #[arg(long, value_parser = parse_time)]
    start_time: Option<NaiveTime>,
    /// Latest entry time (HH:MM or HH:MM:SS).
    #[arg(long, value_parser = parse_time)]
    end_time: Option<NaiveTime>,
}

impl From<FilterArgs> for TradeFilter {
    fn from(args: FilterArgs) -> Self {
        let date = |d: NaiveDate| d.format("%Y-%m-%d").to_string();
        let time = |t: NaiveTime| t.format("%H:%M:%S").to_string();
        TradeFilter {
            start_date: args.from.map(date),
            end_date: args.to.map(date),
            instrument: args.instrument,
            action: args.action.as_deref().map(normalize_action),
            entry_strategy: args.strategy,
            min_bars: args.min_bars,
            max_bars: args.max_bars,
            start_time: args.start_time.map(time),
            end_time: args.end_time.map(time),
        }
    }
}

#[derive(Args)]
struct StatsArgs {
    #[command(flatten)]
    filter: FilterArgs,
    /// Print the report as JSON instead of tables.
    #[arg(long)]
    json: bool,
    /// Include the per-trade chart sequences.
    #[arg(long)]
    series: bool,
    /// Include the per-day P&L table.
    #[arg(long)]
    daily: bool,
}

#[derive(Subcommand)]
enum DebriefCommand {
    /// Show the debrief for a date (defaults to the current trading day).
    Show {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Create or update the debrief for a date. Omitted fields keep their stored text.
    Save {
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        summary: Option<String>,
        #[arg(long)]
        feelings: Option<String>,
        #[arg(long)]
        patterns: Option<String>,
        #[arg(long)]
        best_play: Option<String>,
        #[arg(long)]
        leverage: Option<String>,
    },
}

fn parse_strategy(value: &str) -> Result<String, String> {
    if is_entry_strategy(value) {
        Ok(value.to_string())
    } else {
        Err(format!("expected one of {}", ENTRY_STRATEGY_OPTIONS.join(", ")))
    }
}

fn parse_time(value: &str) -> Result<NaiveTime, String> {
    ["%H:%M:%S", "%H:%M"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(value, fmt).ok())
        .ok_or_else(|| format!("'{value}' is not a time of day (HH:MM or HH:MM:SS)"))
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn seed_pairs(config: &Config) -> impl Iterator<Item = (&str, Decimal)> {
    config
        .instruments
        .iter()
        .map(|instrument| (instrument.name.as_str(), instrument.multiplier))
}

async fn handle_init(repo: &DbRepository, config: &Config) -> anyhow::Result<()> {
    let added = repo
        .seed_instruments(seed_pairs(config))
        .await
        .context("Failed to register instruments")?;
    println!(
        "Journal ready at {} ({added} new instruments registered)",
        config.database.url
    );
    Ok(())
}

async fn handle_import(
    repo: &DbRepository,
    config: &Config,
    args: ImportArgs,
) -> anyhow::Result<()> {
    let batch = CsvImporter::new()
        .read_path(&args.path)
        .with_context(|| format!("Failed to read {}", args.path.display()))?;

    for skipped in &batch.skipped {
        println!("Skipped line {}: {}", skipped.line, skipped.reason);
    }
    if batch.trades.is_empty() {
        println!("No trades to import.");
        return Ok(());
    }

    // Instruments named in the file get their configured multiplier, not the default.
    repo.seed_instruments(seed_pairs(config))
        .await
        .context("Failed to register instruments")?;

    // Set up the spinner
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(format!("Writing {} trades...", batch.trades.len()));

    let result = repo.import_trades(&batch.trades).await;
    spinner.finish_and_clear();

    let imported = result.context("Import failed; no trades were written")?;
    println!(
        "Imported {imported} trades ({} rows skipped)",
        batch.skipped.len()
    );
    Ok(())
}

async fn handle_trades(repo: &DbRepository, filter: FilterArgs) -> anyhow::Result<()> {
    let trades = repo
        .get_trades(&filter.into())
        .await
        .context("Failed to load trades")?;
    if trades.is_empty() {
        println!("No trades match.");
        return Ok(());
    }
    println!("{}", render::trades_table(&trades));
    Ok(())
}

async fn handle_stats(repo: &DbRepository, args: StatsArgs) -> anyhow::Result<()> {
    let trades = repo
        .get_trades(&args.filter.into())
        .await
        .context("Failed to load trades")?;

    let engine = StatisticsEngine::new();
    let report = engine.calculate(&trades);
    let series = args.series.then(|| engine.series(&trades));

    if args.json {
        let output = match &series {
            Some(series) => serde_json::json!({ "report": report, "series": series }),
            None => serde_json::to_value(&report)?,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", render::metrics_table(&report));
    if !report.weekdays.is_empty() {
        println!("{}", render::weekday_table(&report));
    }
    if args.daily && !report.daily_pnl.is_empty() {
        println!("{}", render::daily_table(&report));
    }
    if let Some(series) = series.filter(|s| !s.is_empty()) {
        println!("{}", render::series_table(&series));
    }
    Ok(())
}

async fn handle_instruments(repo: &DbRepository) -> anyhow::Result<()> {
    let instruments = repo
        .get_instruments()
        .await
        .context("Failed to load instruments")?;
    println!("{}", render::instruments_table(&instruments));
    Ok(())
}

async fn handle_debrief(
    repo: &DbRepository,
    config: &Config,
    command: DebriefCommand,
) -> anyhow::Result<()> {
    let calendar = TradingCalendar::new(config.calendar.rollover_hour);
    let resolve = |date: Option<NaiveDate>| {
        date.unwrap_or_else(|| calendar.current_trading_date(&SystemClock))
            .format("%Y-%m-%d")
            .to_string()
    };

    match command {
        DebriefCommand::Show { date } => {
            let date = resolve(date);
            match repo
                .get_daily_debrief(&date)
                .await
                .context("Failed to load debrief")?
            {
                Some(debrief) => println!("{}", render::debrief_table(&debrief)),
                None => println!("No debrief recorded for {date}."),
            }
        }
        DebriefCommand::Save {
            date,
            summary,
            feelings,
            patterns,
            best_play,
            leverage,
        } => {
            let date = resolve(date);
            let mut debrief = repo
                .get_daily_debrief(&date)
                .await
                .context("Failed to load debrief")?
                .unwrap_or_else(|| DailyDebrief {
                    date: date.clone(),
                    ..DailyDebrief::default()
                });

            let fields = [
                (&mut debrief.intraday_summary, summary),
                (&mut debrief.feelings, feelings),
                (&mut debrief.recurring_patterns, patterns),
                (&mut debrief.best_play_out, best_play),
                (&mut debrief.leverage_info, leverage),
            ];
            for (field, value) in fields {
                if let Some(value) = value {
                    *field = value;
                }
            }

            repo.save_daily_debrief(&debrief)
                .await
                .context("Failed to save debrief")?;
            println!("Debrief saved for {date}.");
        }
    }
    Ok(())
}

// ==============================================================================
// Trade images
// ==============================================================================

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "webp", "bmp"];

/// `trade_<id>_<YYYYmmddHHMMSS><ext>`, with `_<n>` before the extension for the
/// second and later images sharing a timestamp.
fn image_file_name(trade_id: i64, stamp: NaiveDateTime, index: usize, source: &Path) -> String {
    let ext = source
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default();
    let suffix = if index == 0 {
        String::new()
    } else {
        format!("_{}", index + 1)
    };
    format!("trade_{trade_id}_{}{suffix}{ext}", stamp.format("%Y%m%d%H%M%S"))
}

/// Copies the images into `images_dir` and records the stored paths against the trade.
async fn attach_images(
    repo: &DbRepository,
    images_dir: &Path,
    trade_id: i64,
    sources: &[PathBuf],
    now: NaiveDateTime,
) -> anyhow::Result<Vec<String>> {
    if repo.get_trade(trade_id).await?.is_none() {
        bail!("Trade {trade_id} does not exist");
    }
    for source in sources {
        let is_image = source
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()));
        if !is_image {
            bail!("{} is not a supported image file", source.display());
        }
    }

    tokio::fs::create_dir_all(images_dir)
        .await
        .with_context(|| format!("Failed to create {}", images_dir.display()))?;

    let mut stored = Vec::with_capacity(sources.len());
    if let Err(err) = copy_images(images_dir, trade_id, now, sources, &mut stored).await {
        remove_copies(&stored).await;
        return Err(err);
    }
    if let Err(err) = repo.save_trade_images(trade_id, &stored).await {
        remove_copies(&stored).await;
        return Err(err).context("Failed to record trade images");
    }
    tracing::info!(trade_id, count = stored.len(), "Attached trade images.");
    Ok(stored)
}

/// Pushes each destination onto `stored` once its copy has succeeded.
async fn copy_images(
    images_dir: &Path,
    trade_id: i64,
    now: NaiveDateTime,
    sources: &[PathBuf],
    stored: &mut Vec<String>,
) -> anyhow::Result<()> {
    let mut index = 0;
    for source in sources {
        let destination = loop {
            let candidate = images_dir.join(image_file_name(trade_id, now, index, source));
            index += 1;
            let taken = tokio::fs::try_exists(&candidate)
                .await
                .with_context(|| format!("Failed to inspect {}", candidate.display()))?;
            if !taken {
                break candidate;
            }
        };
        tokio::fs::copy(source, &destination)
            .await
            .with_context(|| format!("Failed to copy {}", source.display()))?;
        stored.push(destination.to_string_lossy().into_owned());
    }
    Ok(())
}

async fn remove_copies(paths: &[String]) {
    for path in paths {
        if let Err(err) = tokio::fs::remove_file(path).await {
            tracing::warn!(path = %path, error = %err, "Failed to remove copied image.");
        }
    }
}
