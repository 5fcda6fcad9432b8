//! Parameter sweeps — a Cartesian grid of risk settings run in parallel.
//!
//! Every grid point gets its own engine instance. Results are collected in
//! grid order, so a sweep's output never depends on thread scheduling.

use barsim_core::config::RiskConfig;
use rayon::prelude::*;
use std::cmp::Ordering;
use thiserror::Error;
use tracing::{debug, info};

use crate::data_loader::LoadedSeries;
use crate::runner::{run_backtest_from_data, BacktestResult, RunError};

/// Errors from a sweep.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("parameter grid is empty")]
    EmptyGrid,

    #[error("no grid point produced a valid configuration ({skipped} skipped)")]
    NoValidConfigs { skipped: usize },

    #[error("run failed: {0}")]
    Run(#[from] RunError),
}

/// Axes of a parameter sweep.
///
/// An empty axis keeps the base config's value for that parameter.
#[derive(Debug, Clone, Default)]
pub struct ParamGrid {
    pub atr_multipliers: Vec<f64>,
    pub partial_fractions: Vec<f64>,
    pub reward_ladders: Vec<Vec<f64>>,
    pub max_trades_per_day: Vec<Option<u32>>,
}

impl ParamGrid {
    /// Number of grid points, counting an empty axis as one.
    pub fn size(&self) -> usize {
        self.atr_multipliers.len().max(1)
            * self.partial_fractions.len().max(1)
            * self.reward_ladders.len().max(1)
            * self.max_trades_per_day.len().max(1)
    }

    fn is_empty(&self) -> bool {
        self.atr_multipliers.is_empty()
            && self.partial_fractions.is_empty()
            && self.reward_ladders.is_empty()
            && self.max_trades_per_day.is_empty()
    }

    /// Generates every configuration in the grid, in axis order.
    ///
    /// Returns the valid configs and the number of grid points dropped
    /// because they failed `RiskConfig::validate`.
    pub fn generate_configs(&self, base: &RiskConfig) -> (Vec<RiskConfig>, usize) {
        let atrs = axis(&self.atr_multipliers, base.atr_multiplier);
        let fractions = axis(&self.partial_fractions, base.partial_fraction);
        let ladders = axis(&self.reward_ladders, base.reward_multiples.clone());
        let caps = axis(&self.max_trades_per_day, base.max_trades_per_day);

        let mut configs = Vec::with_capacity(self.size());
        let mut skipped = 0;

        for &atr_multiplier in &atrs {
            for &partial_fraction in &fractions {
                for ladder in &ladders {
                    for &cap in &caps {
                        let config = RiskConfig {
                            atr_multiplier,
                            partial_fraction,
                            reward_multiples: ladder.clone(),
                            max_trades_per_day: cap,
                            ..base.clone()
                        };
                        match config.validate() {
                            Ok(()) => configs.push(config),
                            Err(e) => {
                                debug!(error = %e, "skipping grid point");
                                skipped += 1;
                            }
                        }
                    }
                }
            }
        }

        (configs, skipped)
    }
}

fn axis<T: Clone>(values: &[T], fallback: T) -> Vec<T> {
    if values.is_empty() {
        vec![fallback]
    } else {
        values.to_vec()
    }
}

/// Run every valid grid point against the same series.
pub fn run_sweep(
    symbol: &str,
    base: &RiskConfig,
    grid: &ParamGrid,
    series: &LoadedSeries,
) -> Result<SweepResults, SweepError> {
    if grid.is_empty() {
        return Err(SweepError::EmptyGrid);
    }
    let (configs, skipped) = grid.generate_configs(base);
    if configs.is_empty() {
        return Err(SweepError::NoValidConfigs { skipped });
    }

    let results = configs
        .par_iter()
        .map(|config| run_backtest_from_data(symbol, config, series))
        .collect::<Result<Vec<_>, _>>()?;

    info!(runs = results.len(), skipped, "sweep finished");
    Ok(SweepResults { results, skipped })
}

/// Results from a parameter sweep, in grid order.
#[derive(Debug, Clone)]
pub struct SweepResults {
    pub results: Vec<BacktestResult>,
    /// Grid points rejected by config validation.
    pub skipped: usize,
}

impl SweepResults {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Results ordered by return over max drawdown (descending), then net PnL.
    ///
    /// The sort is stable, so full ties keep grid order.
    pub fn ranked(&self) -> Vec<&BacktestResult> {
        let mut sorted: Vec<_> = self.results.iter().collect();
        sorted.sort_by(|a, b| rank_cmp(b, a));
        sorted
    }

    /// The top `n` results by rank.
    pub fn top_n(&self, n: usize) -> Vec<&BacktestResult> {
        self.ranked().into_iter().take(n).collect()
    }

    pub fn best(&self) -> Option<&BacktestResult> {
        self.ranked().into_iter().next()
    }
}

fn rank_cmp(a: &BacktestResult, b: &BacktestResult) -> Ordering {
    a.summary
        .return_over_max_drawdown
        .total_cmp(&b.summary.return_over_max_drawdown)
        .then_with(|| a.summary.net_pnl.total_cmp(&b.summary.net_pnl))
}
