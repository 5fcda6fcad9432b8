//! Performance aggregation — pure functions over the trade ledger.
//!
//! Every metric is a pure function of the ledger: legs in, scalar out. Empty
//! inputs yield 0.0, never NaN or a division by zero.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::TradeLeg;

/// Cumulative realized PnL, one point per ledger entry, with its drawdown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquityCurve {
    pub equity: Vec<f64>,
    /// `equity[i] - max(equity[0..=i])`, always <= 0.
    pub drawdown: Vec<f64>,
}

impl EquityCurve {
    pub fn from_legs(legs: &[TradeLeg]) -> Self {
        let equity = equity_curve(legs);
        let drawdown = drawdown_series(&equity);
        Self { equity, drawdown }
    }

    pub fn len(&self) -> usize {
        self.equity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.equity.is_empty()
    }

    /// Final equity, 0.0 when empty.
    pub fn final_equity(&self) -> f64 {
        self.equity.last().copied().unwrap_or(0.0)
    }

    /// Most negative drawdown; 0.0 when the curve has at most one point.
    pub fn max_drawdown(&self) -> f64 {
        max_drawdown(&self.drawdown)
    }
}

/// Summary statistics for a single run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Distinct positions behind the legs.
    pub positions: usize,
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub net_pnl: f64,
    pub best_trade: f64,
    pub worst_trade: f64,
    pub profit_factor: f64,
    pub max_drawdown: f64,
    pub return_over_max_drawdown: f64,
    pub max_consecutive_losses: usize,
}

impl PerformanceSummary {
    pub fn compute(legs: &[TradeLeg]) -> Self {
        let curve = EquityCurve::from_legs(legs);
        let max_dd = curve.max_drawdown();
        let net = curve.final_equity();
        let winning = legs.iter().filter(|l| l.is_winner()).count();
        Self {
            total_trades: legs.len(),
            winning_trades: winning,
            losing_trades: legs.len() - winning,
            positions: distinct_positions(legs),
            win_rate: win_rate(legs),
            avg_win: avg_win(legs),
            avg_loss: avg_loss(legs),
            net_pnl: net,
            best_trade: best_trade(legs),
            worst_trade: worst_trade(legs),
            profit_factor: profit_factor(legs),
            max_drawdown: max_dd,
            return_over_max_drawdown: return_over_max_drawdown(net, max_dd),
            max_consecutive_losses: max_consecutive_losses(legs),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// `equity[i]` = sum of net PnL of legs `0..=i`.
pub fn equity_curve(legs: &[TradeLeg]) -> Vec<f64> {
    legs.iter()
        .scan(0.0_f64, |acc, leg| {
            *acc += leg.pnl;
            Some(*acc)
        })
        .collect()
}

/// Drawdown against the running maximum, which starts at `equity[0]`.
pub fn drawdown_series(equity: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    equity
        .iter()
        .map(|&e| {
            peak = peak.max(e);
            e - peak
        })
        .collect()
}

/// Minimum of the drawdown series (non-positive).
pub fn max_drawdown(drawdown: &[f64]) -> f64 {
    if drawdown.len() <= 1 {
        return 0.0;
    }
    drawdown.iter().copied().fold(0.0_f64, f64::min)
}

/// Final equity over |max drawdown|; 0.0 when there is no drawdown.
pub fn return_over_max_drawdown(net_pnl: f64, max_drawdown: f64) -> f64 {
    if max_drawdown == 0.0 {
        return 0.0;
    }
    net_pnl / max_drawdown.abs()
}

/// Fraction of legs with positive net PnL.
pub fn win_rate(legs: &[TradeLeg]) -> f64 {
    if legs.is_empty() {
        return 0.0;
    }
    let winners = legs.iter().filter(|l| l.is_winner()).count();
    winners as f64 / legs.len() as f64
}

/// Mean PnL of winning legs (pnl > 0).
pub fn avg_win(legs: &[TradeLeg]) -> f64 {
    mean_f64(&pnls_where(legs, |p| p > 0.0))
}

/// Mean PnL of non-winning legs (pnl <= 0). Scratch legs count as losses.
pub fn avg_loss(legs: &[TradeLeg]) -> f64 {
    mean_f64(&pnls_where(legs, |p| p <= 0.0))
}

pub fn best_trade(legs: &[TradeLeg]) -> f64 {
    legs.iter().map(|l| l.pnl).reduce(f64::max).unwrap_or(0.0)
}

pub fn worst_trade(legs: &[TradeLeg]) -> f64 {
    legs.iter().map(|l| l.pnl).reduce(f64::min).unwrap_or(0.0)
}

/// Gross profits / gross losses.
///
/// Capped at 100.0 for edge cases (all winners, zero losses).
pub fn profit_factor(legs: &[TradeLeg]) -> f64 {
    if legs.is_empty() {
        return 0.0;
    }
    let gross_profit: f64 = pnls_where(legs, |p| p > 0.0).iter().sum();
    let gross_loss: f64 = pnls_where(legs, |p| p < 0.0).iter().map(|p| p.abs()).sum();

    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { 100.0 } else { 0.0 };
    }
    (gross_profit / gross_loss).min(100.0)
}

/// Longest run of consecutive non-winning legs.
pub fn max_consecutive_losses(legs: &[TradeLeg]) -> usize {
    let mut max_streak = 0;
    let mut current = 0;
    for leg in legs {
        if leg.is_winner() {
            current = 0;
        } else {
            current += 1;
            max_streak = max_streak.max(current);
        }
    }
    max_streak
}

// ─── Helpers ────────────────────────────────────────────────────────

fn pnls_where(legs: &[TradeLeg], keep: impl Fn(f64) -> bool) -> Vec<f64> {
    legs.iter().map(|l| l.pnl).filter(|&p| keep(p)).collect()
}

fn distinct_positions(legs: &[TradeLeg]) -> usize {
    legs.iter()
        .map(|l| l.position_id)
        .collect::<BTreeSet<_>>()
        .len()
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
