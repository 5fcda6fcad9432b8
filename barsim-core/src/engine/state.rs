//! Run counters and the result of a completed simulation.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::TradeLeg;
use crate::metrics::{EquityCurve, PerformanceSummary};

/// Diagnostics accumulated over a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    /// Total bars processed.
    pub bar_count: usize,
    pub positions_opened: usize,
    /// Entry signals suppressed by the daily loss or trade-count limit.
    pub entries_blocked_by_gate: usize,
    pub entries_outside_window: usize,
    pub entries_blocked_by_volatility: usize,
    /// Both entry flags set with the conflict policy set to ignore.
    pub entries_ambiguous: usize,
    /// Entries skipped because no valid stop could be placed.
    pub entries_degenerate: usize,
}

impl RunCounters {
    /// Entry signals that did not become positions.
    pub fn entries_skipped(&self) -> usize {
        self.entries_blocked_by_gate
            + self.entries_outside_window
            + self.entries_blocked_by_volatility
            + self.entries_ambiguous
            + self.entries_degenerate
    }
}

/// Result of a complete backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Realized legs in exit order.
    pub trades: Vec<TradeLeg>,
    /// Cumulative PnL per ledger entry, with drawdown.
    pub equity: EquityCurve,
    pub counters: RunCounters,
    pub first_timestamp: Option<NaiveDateTime>,
    pub last_timestamp: Option<NaiveDateTime>,
}

impl RunResult {
    pub fn summary(&self) -> PerformanceSummary {
        PerformanceSummary::compute(&self.trades)
    }

    pub fn net_pnl(&self) -> f64 {
        self.equity.final_equity()
    }
}
