//! Barsim Runner — backtest orchestration on top of `barsim-core`.
//!
//! This crate provides:
//! - TOML backtest configuration
//! - CSV loading of bars with their precomputed signal columns
//! - A seeded synthetic series for development without data files
//! - Single-run orchestration with run fingerprinting
//! - Parallel parameter sweeps with ranking
//! - JSON, CSV, and Markdown export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;
pub mod sweep;
pub mod synthetic;

pub use config::{BacktestConfig, BacktestSection, ConfigFileError};
pub use data_loader::{load_series, load_series_from_reader, LoadError, LoadedSeries};
pub use export::{
    export_equity_csv, export_json, export_trades_csv, import_json, load_artifacts,
    render_markdown_summary, save_artifacts,
};
pub use runner::{
    run_backtest_from_data, run_single_backtest, BacktestResult, RunError, SCHEMA_VERSION,
};
pub use sweep::{run_sweep, ParamGrid, SweepError, SweepResults};
pub use synthetic::generate_synthetic;
