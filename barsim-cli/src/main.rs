//! Barsim CLI — run, sweep, and validate commands.
//!
//! Commands:
//! - `run` — execute a backtest from a TOML config and save artifacts
//! - `sweep` — run a parameter grid in parallel and print a ranking table
//! - `validate` — check a config (and optionally its data) without simulating

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use barsim_core::engine::validate_series;
use barsim_runner::{
    generate_synthetic, load_series, run_backtest_from_data, run_sweep, save_artifacts,
    BacktestConfig, BacktestResult, LoadedSeries, ParamGrid,
};

#[derive(Parser)]
#[command(name = "barsim", about = "Barsim CLI — bar-by-bar backtest simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Bar/signal CSV. Overrides `[backtest].data`.
        #[arg(long, conflicts_with = "synthetic")]
        data: Option<PathBuf>,

        /// Run on this many synthetic bars instead of a data file.
        #[arg(long)]
        synthetic: Option<usize>,

        /// Seed for the synthetic series.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Run a parameter sweep over the config's risk settings.
    Sweep {
        /// Path to a TOML config file (base settings).
        #[arg(long)]
        config: PathBuf,

        /// Bar/signal CSV. Overrides `[backtest].data`.
        #[arg(long, conflicts_with = "synthetic")]
        data: Option<PathBuf>,

        /// Run on this many synthetic bars instead of a data file.
        #[arg(long)]
        synthetic: Option<usize>,

        /// Seed for the synthetic series.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// ATR multipliers to test, comma-separated.
        #[arg(long, value_delimiter = ',')]
        atr_multipliers: Vec<f64>,

        /// Partial-exit fractions to test, comma-separated.
        #[arg(long, value_delimiter = ',')]
        partial_fractions: Vec<f64>,

        /// Daily trade caps to test, comma-separated.
        #[arg(long, value_delimiter = ',')]
        max_trades: Vec<u32>,

        /// Rows to show in the ranking table.
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Validate a config file and, if available, the shape of its data.
    Validate {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Bar/signal CSV. Overrides `[backtest].data`.
        #[arg(long)]
        data: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            data,
            synthetic,
            seed,
            output_dir,
        } => run_cmd(&config, data, synthetic, seed, &output_dir),
        Commands::Sweep {
            config,
            data,
            synthetic,
            seed,
            atr_multipliers,
            partial_fractions,
            max_trades,
            top,
        } => {
            let grid = ParamGrid {
                atr_multipliers,
                partial_fractions,
                reward_ladders: Vec::new(),
                max_trades_per_day: max_trades.into_iter().map(Some).collect(),
            };
            sweep_cmd(&config, data, synthetic, seed, &grid, top)
        }
        Commands::Validate { config, data } => validate_cmd(&config, data),
    }
}

fn run_cmd(
    config_path: &Path,
    data: Option<PathBuf>,
    synthetic: Option<usize>,
    seed: u64,
    output_dir: &Path,
) -> Result<()> {
    let config = BacktestConfig::from_file(config_path)?;
    let series = resolve_series(&config, data, synthetic, seed)?;

    let result = run_backtest_from_data(&config.backtest.symbol, &config.risk, &series)?;
    print_summary(&result);

    let run_dir = save_artifacts(&result, output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());
    Ok(())
}

fn sweep_cmd(
    config_path: &Path,
    data: Option<PathBuf>,
    synthetic: Option<usize>,
    seed: u64,
    grid: &ParamGrid,
    top: usize,
) -> Result<()> {
    let config = BacktestConfig::from_file(config_path)?;
    let series = resolve_series(&config, data, synthetic, seed)?;

    info!(points = grid.size(), bars = series.len(), "starting sweep");
    let results = run_sweep(&config.backtest.symbol, &config.risk, grid, &series)?;

    println!();
    println!(
        "=== Sweep: {} runs ({} invalid grid points skipped) ===",
        results.len(),
        results.skipped
    );
    println!(
        "{:>4}  {:>6}  {:>6}  {:>6}  {:>6}  {:>12}  {:>10}  {:>8}  {}",
        "#", "ATR×", "Frac", "Cap", "Legs", "Net PnL", "Max DD", "Ret/DD", "Run"
    );
    for (rank, r) in results.top_n(top).into_iter().enumerate() {
        let cap = r
            .config
            .max_trades_per_day
            .map_or_else(|| "-".to_string(), |c| c.to_string());
        println!(
            "{:>4}  {:>6.2}  {:>6.2}  {:>6}  {:>6}  {:>12.4}  {:>10.4}  {:>8.2}  {}",
            rank + 1,
            r.config.atr_multiplier,
            r.config.partial_fraction,
            cap,
            r.summary.total_trades,
            r.summary.net_pnl,
            r.summary.max_drawdown,
            r.summary.return_over_max_drawdown,
            r.short_id()
        );
    }
    if series.synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    println!();
    Ok(())
}

fn validate_cmd(config_path: &Path, data: Option<PathBuf>) -> Result<()> {
    let config = BacktestConfig::from_file(config_path)?;
    println!("Config OK: {} ({})", config_path.display(), config.backtest.symbol);

    let Some(path) = data.or_else(|| config.backtest.data.clone()) else {
        println!("No data file configured; skipped data checks.");
        return Ok(());
    };
    let series =
        load_series(&path).with_context(|| format!("failed to load {}", path.display()))?;
    validate_series(&series.bars, &series.signals)
        .with_context(|| format!("invalid series in {}", path.display()))?;
    match (series.bars.first(), series.bars.last()) {
        (Some(first), Some(last)) => println!(
            "Data OK: {} bars, {} to {}",
            series.len(),
            first.timestamp,
            last.timestamp
        ),
        _ => println!("Data OK: empty series"),
    }
    Ok(())
}

/// Pick the series for a run: synthetic, then `--data`, then the config's path.
fn resolve_series(
    config: &BacktestConfig,
    data: Option<PathBuf>,
    synthetic: Option<usize>,
    seed: u64,
) -> Result<LoadedSeries> {
    if let Some(n) = synthetic {
        return Ok(generate_synthetic(n, seed, synthetic_start()?));
    }
    let Some(path) = data.or_else(|| config.backtest.data.clone()) else {
        bail!(
            "no data for '{}': pass --data, --synthetic, or set [backtest].data",
            config.backtest.symbol
        );
    };
    load_series(&path).with_context(|| format!("failed to load {}", path.display()))
}

fn synthetic_start() -> Result<NaiveDateTime> {
    NaiveDate::from_ymd_opt(2024, 1, 2)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("invalid synthetic start date")
}

fn print_summary(result: &BacktestResult) {
    let s = &result.summary;
    let c = &result.counters;
    println!();
    println!("=== Backtest Result ===");
    println!("Symbol:         {}", result.symbol);
    match (result.first_timestamp, result.last_timestamp) {
        (Some(first), Some(last)) => println!("Period:         {first} to {last}"),
        _ => println!("Period:         (no bars)"),
    }
    println!("Bars:           {}", c.bar_count);
    println!("Positions:      {}", s.positions);
    println!("Legs:           {}", s.total_trades);
    println!("Run ID:         {}", result.short_id());
    println!();
    println!("--- Performance ---");
    println!("Net PnL:        {:.4}", s.net_pnl);
    println!("Win Rate:       {:.1}%", s.win_rate * 100.0);
    println!("Avg Win:        {:.4}", s.avg_win);
    println!("Avg Loss:       {:.4}", s.avg_loss);
    println!("Best Leg:       {:.4}", s.best_trade);
    println!("Worst Leg:      {:.4}", s.worst_trade);
    println!("Profit Factor:  {:.2}", s.profit_factor);
    println!("Max Drawdown:   {:.4}", s.max_drawdown);
    println!("Return/Max DD:  {:.2}", s.return_over_max_drawdown);
    println!("Max Consec Loss:{}", s.max_consecutive_losses);
    println!();
    println!("--- Entry Filters ---");
    println!("Daily Gate:     {}", c.entries_blocked_by_gate);
    println!("Window:         {}", c.entries_outside_window);
    println!("Volatility:     {}", c.entries_blocked_by_volatility);
    println!("Ambiguous:      {}", c.entries_ambiguous);
    println!("Degenerate:     {}", c.entries_degenerate);
    println!("Total Skipped:  {}", c.entries_skipped());
    if result.synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    println!();
}
