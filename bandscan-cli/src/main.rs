//! bandscan CLI: chunked scans, output merge and single-symbol evaluation.
//!
//! Commands:
//! - `scan`: score one chunk of the universe and write its partial CSV
//! - `merge`: merge a day's partial files into the daily and latest outputs
//! - `evaluate`: score one symbol and explain the result
//! - `universe`: show the filtered universe and its chunk layout
//! - `config`: print the default configuration or validate a file

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;

use bandscan_core::data::Universe;
use bandscan_core::domain::RelativeStrength;
use bandscan_core::Evaluation;
use bandscan_runner::export::{self, summary_json};
use bandscan_runner::{chunk_listings, PriceSource, RunnerConfig, ScanSummary, Scanner};

#[derive(Parser)]
#[command(
    name = "bandscan",
    about = "bandscan: Bollinger-band breakout screener"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one chunk of the universe and write its partial CSV.
    Scan {
        /// Runner config TOML. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Scan date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,

        /// 1-based chunk number; overrides `shard.chunk`.
        #[arg(long)]
        chunk: Option<usize>,

        /// Use synthetic price history instead of the configured source.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Also write the scan summary as JSON to this path.
        #[arg(long)]
        summary: Option<PathBuf>,
    },
    /// Merge a day's partial files into the daily and latest outputs.
    Merge {
        #[arg(long)]
        config: Option<PathBuf>,

        /// Date of the partial files (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,

        /// Overrides `output.partial_dir`.
        #[arg(long)]
        partial_dir: Option<PathBuf>,

        /// Overrides `output.dir`.
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Score one symbol and explain the result.
    Evaluate {
        /// Symbol code (e.g., 005930).
        #[arg(required = true)]
        code: String,

        #[arg(long)]
        config: Option<PathBuf>,

        /// Evaluation date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,

        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// 3-month relative-strength percentile (0-100).
        #[arg(long, default_value_t = 0)]
        rs_3m: i64,

        /// 6-month relative-strength percentile (0-100).
        #[arg(long, default_value_t = 0)]
        rs_6m: i64,

        /// Print the score record as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Show the filtered universe and its chunk layout.
    Universe {
        #[arg(long)]
        config: Option<PathBuf>,

        /// Listings to print.
        #[arg(long, default_value_t = 20)]
        head: usize,
    },
    /// Configuration commands.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the default configuration as TOML.
    Defaults,
    /// Parse and validate a config file, printing its fingerprint.
    Validate {
        #[arg(required = true)]
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            config,
            date,
            chunk,
            synthetic,
            summary,
        } => run_scan(config.as_deref(), date, chunk, synthetic, summary),
        Commands::Merge {
            config,
            date,
            partial_dir,
            out_dir,
        } => run_merge(config.as_deref(), date, partial_dir, out_dir),
        Commands::Evaluate {
            code,
            config,
            date,
            synthetic,
            rs_3m,
            rs_6m,
            json,
        } => run_evaluate(
            &code,
            config.as_deref(),
            date,
            synthetic,
            RelativeStrength::new(rs_3m, rs_6m),
            json,
        ),
        Commands::Universe { config, head } => run_universe(config.as_deref(), head),
        Commands::Config { action } => match action {
            ConfigAction::Defaults => {
                print!("{}", RunnerConfig::default().to_toml()?);
                Ok(())
            }
            ConfigAction::Validate { path } => {
                let config = RunnerConfig::from_file(&path)
                    .with_context(|| format!("invalid config {}", path.display()))?;
                println!("{} is valid", path.display());
                println!("fingerprint: {}", config.scan.fingerprint());
                Ok(())
            }
        },
    }
}

fn load_config(path: Option<&Path>) -> Result<RunnerConfig> {
    match path {
        Some(path) => RunnerConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(RunnerConfig::default()),
    }
}

fn parse_date(date: Option<String>) -> Result<NaiveDate> {
    match date.as_deref() {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD")),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

fn load_universe(config: &RunnerConfig) -> Result<Universe> {
    let path = &config.shard.universe_file;
    Universe::from_file(path).with_context(|| format!("failed to load universe {}", path.display()))
}

fn run_scan(
    config_path: Option<&Path>,
    date: Option<String>,
    chunk: Option<usize>,
    synthetic: bool,
    summary_path: Option<PathBuf>,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(chunk) = chunk {
        config.shard.chunk = chunk;
    }
    if synthetic {
        config.data.price_source = PriceSource::Synthetic;
    }
    config.validate()?;
    let scan_date = parse_date(date)?;

    let universe = load_universe(&config)?;
    let listings = chunk_listings(&universe, &config)?;
    let chunk = config.shard.chunk;
    if listings.is_empty() {
        println!("Chunk {chunk} is empty; nothing to scan.");
        return Ok(());
    }

    let scanner = Scanner::from_config(config)?;
    let report = scanner.scan(&listings, scan_date, chunk)?;
    let output = &scanner.config().output;
    let partial = export::write_partial(&output.partial_dir, scan_date, chunk, &report.records)?;

    if chunk == 1 {
        let ordered = universe.filtered(&scanner.config().scan.universe);
        let rankings = scanner.sector_rankings(&ordered.stocks, &report.returns_3m, scan_date);
        export::write_sector_rankings(&output.dir, &rankings)?;
    } else {
        info!(chunk, "sector rankings are computed by chunk 1 only");
    }

    print_summary(&report.summary);
    println!("Partial output: {}", partial.display());

    if let Some(path) = summary_path {
        std::fs::write(&path, summary_json(&report.summary)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}

fn print_summary(summary: &ScanSummary) {
    println!("=== Chunk {} on {} ===", summary.chunk, summary.scan_date);
    println!("Regime:     {:?}", summary.regime);
    println!("Requested:  {}", summary.requested);
    println!("Scored:     {}", summary.scored);
    println!("Kept:       {}", summary.kept);
    println!("Skipped:    {}", summary.skipped);
    for (label, count) in &summary.skip_reasons {
        println!("  {label:<24} {count}");
    }
    println!("Failed:     {}", summary.failed);
    for (code, error) in summary.failures.iter().take(10) {
        println!("  {code}: {error}");
    }
    if !summary.zero_filled_flows.is_empty() {
        println!("Zero-filled flows: {}", summary.zero_filled_flows.len());
    }
    println!("Config:     {}", &summary.config_fingerprint[..16.min(summary.config_fingerprint.len())]);
    println!("Elapsed:    {} ms", summary.elapsed_ms);
}

fn run_merge(
    config_path: Option<&Path>,
    date: Option<String>,
    partial_dir: Option<PathBuf>,
    out_dir: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let date = parse_date(date)?;
    let partial_dir = partial_dir.unwrap_or(config.output.partial_dir);
    let out_dir = out_dir.unwrap_or(config.output.dir);

    let outcome = export::merge_partials(&partial_dir, &out_dir, date)?;
    println!(
        "Merged {} files: {} rows read, {} written",
        outcome.partials.len(),
        outcome.rows_read,
        outcome.rows_written
    );
    println!("  {}", outcome.dated.display());
    println!("  {}", outcome.latest.display());
    Ok(())
}

fn run_evaluate(
    code: &str,
    config_path: Option<&Path>,
    date: Option<String>,
    synthetic: bool,
    rs: RelativeStrength,
    json: bool,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if synthetic {
        config.data.price_source = PriceSource::Synthetic;
    }
    let date = parse_date(date)?;
    let scanner = Scanner::from_config(config)?;

    let evaluation = match scanner
        .evaluate_one(code, date, rs)
        .with_context(|| format!("no price history for {code}"))?
    {
        Ok(evaluation) => evaluation,
        Err(reason) => {
            println!("{code}: skipped ({reason})");
            return Ok(());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&evaluation.result)?);
        return Ok(());
    }
    print_evaluation(code, &evaluation, &scanner.config().scan.scoring);
    Ok(())
}

fn print_evaluation(
    code: &str,
    evaluation: &Evaluation,
    weights: &bandscan_core::config::ScoringConfig,
) {
    let r = &evaluation.result;
    println!("=== {code} on {} ===", r.date);
    println!("Close:   {:.0}", r.close);
    println!(
        "Setup:   {} ({})",
        r.setup_tag.as_str(),
        r.setup_tag.describe()
    );
    println!(
        "Stop:    {:.0} ({:.2}% risk, {:?})",
        r.stop,
        r.risk_pct * 100.0,
        evaluation.risk.basis
    );
    println!();
    println!("Score:   {}/100", r.total_score);
    let rows = [
        ("trend", r.trend_score, weights.trend_weight),
        ("pattern", r.pattern_score, weights.pattern_weight),
        ("volume", r.volume_score, weights.volume_weight),
        ("supply", r.supply_score, weights.supply_weight),
        ("risk", r.risk_score, weights.risk_weight),
    ];
    for (name, score, cap) in rows {
        println!("  {name:<8} {score:>3}/{cap}");
    }
    println!();
    println!(
        "MA20 {:.0}  MA60 {:.0}  upper band {:.0}  ADX {:.1}",
        r.ma20, r.ma60, r.bb_upper, r.adx
    );
    match r.bandwidth_rank {
        Some(rank) => println!("Bandwidth rank {rank:.0} (squeeze: {})", r.squeeze),
        None => println!("Bandwidth rank n/a"),
    }
    println!(
        "Door knock: {}  Near memory level: {}  Dry-up bars: {}",
        r.door_knock, r.memory_near, r.dryup_count
    );

    if !evaluation.strategies.is_empty() {
        println!();
        println!("Strategies:");
        for s in &evaluation.strategies {
            println!(
                "  {:<15} entry {:>8.0}  stop {:>8.0}  risk {:>5.2}%{}",
                s.kind.to_string(),
                s.entry,
                s.stop,
                s.risk_pct * 100.0,
                if s.active { "  active" } else { "" }
            );
        }
    }
}

fn run_universe(config_path: Option<&Path>, head: usize) -> Result<()> {
    let config = load_config(config_path)?;
    let universe = load_universe(&config)?;
    let mut filtered = universe.filtered(&config.scan.universe);
    if let Some(top_n) = config.shard.top_n {
        filtered.stocks.truncate(top_n);
    }
    let chunks = filtered.shard_count(config.shard.chunk_size);
    println!(
        "{} listings ({} after filters), {} chunks of {}",
        universe.len(),
        filtered.len(),
        chunks,
        config.shard.chunk_size
    );
    for listing in filtered.stocks.iter().take(head) {
        println!(
            "  {:<8} {:<20} {:<8} {:<16} {:>18.0}",
            listing.code, listing.name, listing.market, listing.sector, listing.market_cap
        );
    }
    Ok(())
}
