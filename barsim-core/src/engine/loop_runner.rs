//! Whole-series entry point: validate everything up front, then replay bar by bar.

use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, RiskConfig};
use crate::domain::{Bar, SignalRow};

use super::simulation::Simulation;
use super::state::RunResult;
use super::validate::{validate_series, InputError};

/// Errors that abort a run before any bar is simulated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid risk configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("malformed input: {0}")]
    Input(#[from] InputError),
}

/// Run a backtest over a fully materialized series.
///
/// Fails fast on configuration or input-shape errors. Numeric degeneracies
/// inside the loop (e.g. a zero-width stop) skip the affected entry and the
/// run continues.
pub fn run_backtest(
    bars: &[Bar],
    signals: &[SignalRow],
    config: &RiskConfig,
) -> Result<RunResult, EngineError> {
    let mut sim = Simulation::new(config.clone())?;
    validate_series(bars, signals)?;

    for (bar, signal) in bars.iter().zip(signals) {
        sim.step(bar, signal)?;
    }

    let result = sim.finish();
    info!(
        bars = result.counters.bar_count,
        positions = result.counters.positions_opened,
        legs = result.trades.len(),
        net_pnl = result.net_pnl(),
        "backtest complete"
    );
    Ok(result)
}
