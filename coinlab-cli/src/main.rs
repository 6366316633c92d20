//! CoinLab CLI — fetch, derive, and inspect crypto market features.
//!
//! Commands:
//! - `run` — fetch every configured asset, compute features, optionally save
//! - `snapshot` — print the current market state of each asset
//! - `inspect` — load a saved feature table and print its summary

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use coinlab_core::data::{CircuitBreaker, CoinGeckoProvider, MarketDataProvider, SyntheticProvider};
use coinlab_core::domain::{FeatureRow, MarketSnapshot};
use coinlab_core::store::{load_path, TableFormat};
use coinlab_core::FeatureTable;
use coinlab_runner::{Pipeline, PipelineConfig, PipelineOutcome, PipelineReport};

#[derive(Parser)]
#[command(
    name = "coinlab",
    about = "CoinLab CLI — crypto market data pipeline and feature engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by commands that talk to a provider.
#[derive(clap::Args)]
struct SourceArgs {
    /// Pipeline TOML config. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Comma-separated asset ids (e.g. bitcoin,ethereum).
    #[arg(long, value_delimiter = ',')]
    assets: Option<Vec<String>>,

    /// Quote currency.
    #[arg(long)]
    vs_currency: Option<String>,

    /// Milliseconds to wait between provider calls.
    #[arg(long)]
    rate_limit_ms: Option<u64>,

    /// Use the deterministic synthetic provider instead of CoinGecko.
    #[arg(long, default_value_t = false)]
    synthetic: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch history for each asset, compute features, and save the table.
    Run {
        #[command(flatten)]
        source: SourceArgs,

        /// Days of history to request (free tier allows up to 365).
        #[arg(long)]
        days: Option<u32>,

        /// Keep the table in memory only.
        #[arg(long, default_value_t = false)]
        no_save: bool,

        /// Directory for saved tables.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Output format: csv or parquet.
        #[arg(long)]
        format: Option<TableFormat>,

        /// Rows of the table to print.
        #[arg(long, default_value_t = 10)]
        rows: usize,
    },
    /// Print the current market snapshot for each asset.
    Snapshot {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Load a saved feature table (.csv or .parquet) and print its summary.
    Inspect {
        file: PathBuf,

        /// Rows of the table to print.
        #[arg(long, default_value_t = 10)]
        rows: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            source,
            days,
            no_save,
            output_dir,
            format,
            rows,
        } => {
            let mut config = load_config(&source)?;
            if let Some(days) = days {
                config.days = days;
            }
            if no_save {
                config.save = false;
            }
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            if let Some(format) = format {
                config.format = format;
            }
            run_pipeline(config, source.synthetic, rows)
        }
        Commands::Snapshot { source } => {
            let config = load_config(&source)?;
            run_snapshot(config, source.synthetic)
        }
        Commands::Inspect { file, rows } => run_inspect(&file, rows),
    }
}

fn load_config(args: &SourceArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(assets) = &args.assets {
        config.assets = assets.clone();
    }
    if let Some(vs) = &args.vs_currency {
        config.vs_currency = vs.clone();
    }
    if let Some(ms) = args.rate_limit_ms {
        config.rate_limit_ms = ms;
    }
    config.validate().context("invalid pipeline configuration")?;
    Ok(config)
}

fn build_provider(config: &PipelineConfig, synthetic: bool) -> Result<Box<dyn MarketDataProvider>> {
    if synthetic {
        return Ok(Box::new(SyntheticProvider::ending_today()));
    }
    let breaker = Arc::new(CircuitBreaker::default_provider());
    let provider = CoinGeckoProvider::new(config.coingecko_config(), breaker)
        .context("creating CoinGecko client")?;
    Ok(Box::new(provider))
}

fn run_pipeline(config: PipelineConfig, synthetic: bool, rows: usize) -> Result<()> {
    let provider = build_provider(&config, synthetic)?;
    let pipeline = Pipeline::new(config, provider.as_ref())?;

    match pipeline.run()? {
        PipelineOutcome::Completed(report) => {
            print_report(&report, rows);
            if synthetic {
                println!();
                println!("WARNING: Results based on SYNTHETIC data");
            }
            Ok(())
        }
        PipelineOutcome::NoData { skipped } => {
            for (asset, reason) in &skipped {
                eprintln!("Error for {asset}: {reason}");
            }
            bail!("No data fetched successfully");
        }
    }
}

fn run_snapshot(config: PipelineConfig, synthetic: bool) -> Result<()> {
    let provider = build_provider(&config, synthetic)?;
    let pipeline = Pipeline::new(config, provider.as_ref())?;
    let report = pipeline.snapshots();

    println!();
    println!("=== Current Snapshot ===");
    for snapshot in &report.snapshots {
        print_snapshot(snapshot);
    }
    for (asset, err) in &report.skipped {
        eprintln!("Error for {asset}: {err}");
    }

    if report.snapshots.is_empty() {
        bail!("No snapshot fetched successfully");
    }
    Ok(())
}

fn run_inspect(file: &std::path::Path, rows: usize) -> Result<()> {
    let loaded = load_path(file).with_context(|| format!("loading {}", file.display()))?;
    let table = FeatureTable {
        rows: loaded,
        duplicates_dropped: 0,
    };

    println!();
    println!("=== {} ===", file.display());
    print_table_summary(&table, rows);
    Ok(())
}

fn print_report(report: &PipelineReport, rows: usize) {
    println!();
    println!("=== Pipeline completed successfully ===");
    for (asset, count) in &report.fetched {
        println!("  {asset:<16} {count} rows fetched");
    }
    for (asset, reason) in &report.skipped {
        println!("  {asset:<16} SKIPPED: {reason}");
    }
    if report.table.duplicates_dropped > 0 {
        println!("Duplicates dropped: {}", report.table.duplicates_dropped);
    }
    if let Some(saved) = &report.saved {
        println!("Data saved to {}", saved.path.display());
    }
    print_table_summary(&report.table, rows);
}

fn print_table_summary(table: &FeatureTable, rows: usize) {
    println!("Total records: {}", table.len());
    match table.date_range() {
        Some((start, end)) => println!("Date range: {start} to {end}"),
        None => println!("Date range: (empty)"),
    }
    println!();
    print_rows(table.head(rows));
}

fn print_rows(rows: &[FeatureRow]) {
    println!(
        "{:<24} {:<12} {:>14} {:>10} {:>14} {:>14} {:>10} {:>12}",
        "date", "asset_id", "price", "return", "ma_7", "ma_30", "vol_30d", "cum_return"
    );
    for r in rows {
        println!(
            "{:<24} {:<12} {:>14.4} {:>10} {:>14} {:>14} {:>10} {:>12}",
            r.date.format("%Y-%m-%d %H:%M:%S").to_string(),
            r.asset_id,
            r.price,
            format!("{:.4}", r.daily_return),
            format!("{:.4}", r.ma_7),
            format!("{:.4}", r.ma_30),
            format!("{:.4}", r.volatility_30d),
            format!("{:.4}", r.cumulative_return),
        );
    }
}

fn print_snapshot(s: &MarketSnapshot) {
    let fmt = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |x| format!("{x:.2}"));
    println!("{}", s.asset_id);
    println!("  Price:          {}", fmt(s.price));
    println!("  Volume:         {}", fmt(s.volume));
    println!("  Market Cap:     {}", fmt(s.market_cap));
    println!(
        "  24h Change:     {}",
        s.price_change_24h
            .map_or_else(|| "n/a".to_string(), |x| format!("{x:.2}%"))
    );
    println!("  24h High/Low:   {} / {}", fmt(s.high_24h), fmt(s.low_24h));
    println!("  Captured At:    {}", s.captured_at);
}
