//! Backtest runner — wires together data loading, the engine, and metrics.
//!
//! Two entry points:
//! - `run_single_backtest()`: loads the series named in the config, then runs. Used by CLI.
//! - `run_backtest_from_data()`: takes a pre-loaded series. Used by sweeps.

use barsim_core::config::RiskConfig;
use barsim_core::domain::TradeLeg;
use barsim_core::engine::{run_backtest, EngineError, RunCounters};
use barsim_core::fingerprint::RunId;
use barsim_core::metrics::PerformanceSummary;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::{BacktestConfig, ConfigFileError};
use crate::data_loader::{load_series, LoadError, LoadedSeries};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigFileError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("no data file configured for '{0}' (set [backtest].data or use --synthetic)")]
    NoData(String),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub symbol: String,
    pub run_id: String,
    pub config_hash: String,
    pub dataset_hash: String,
    pub config: RiskConfig,
    pub summary: PerformanceSummary,
    pub trades: Vec<TradeLeg>,
    pub equity_curve: Vec<f64>,
    pub drawdown: Vec<f64>,
    pub counters: RunCounters,
    pub first_timestamp: Option<NaiveDateTime>,
    pub last_timestamp: Option<NaiveDateTime>,
    pub synthetic: bool,
}

impl BacktestResult {
    /// First 12 hex chars of the run id.
    pub fn short_id(&self) -> &str {
        &self.run_id[..self.run_id.len().min(12)]
    }
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Run a single backtest from a `BacktestConfig` (loads data from its `data` path).
pub fn run_single_backtest(config: &BacktestConfig) -> Result<BacktestResult, RunError> {
    let path = config
        .backtest
        .data
        .as_ref()
        .ok_or_else(|| RunError::NoData(config.backtest.symbol.clone()))?;
    let series = load_series(path)?;
    run_backtest_from_data(&config.backtest.symbol, &config.risk, &series)
}

/// Run a backtest on a pre-loaded series — no I/O.
pub fn run_backtest_from_data(
    symbol: &str,
    risk: &RiskConfig,
    series: &LoadedSeries,
) -> Result<BacktestResult, RunError> {
    let run = run_backtest(&series.bars, &series.signals, risk)?;
    let run_id = RunId::new(risk, &series.bars, &series.signals);
    let summary = run.summary();

    info!(
        symbol,
        run_id = %run_id.short(),
        trades = summary.total_trades,
        net_pnl = summary.net_pnl,
        synthetic = series.synthetic,
        "run finished"
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        symbol: symbol.to_string(),
        run_id: run_id.hash(),
        config_hash: run_id.config_hash.0.clone(),
        dataset_hash: run_id.dataset_hash.0.clone(),
        config: risk.clone(),
        summary,
        trades: run.trades,
        equity_curve: run.equity.equity,
        drawdown: run.equity.drawdown,
        counters: run.counters,
        first_timestamp: run.first_timestamp,
        last_timestamp: run.last_timestamp,
        synthetic: series.synthetic,
    })
}
