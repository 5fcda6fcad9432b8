//! Position — the single open position tracked by the simulation.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::bar::Bar;

/// Direction of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// +1 for long, -1 for short.
    pub fn sign(self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }

    /// Realized PnL of `size` units entered at `entry` and exited at `exit`.
    pub fn pnl(self, entry: f64, exit: f64, size: f64) -> f64 {
        match self {
            Side::Long => (exit - entry) * size,
            Side::Short => (entry - exit) * size,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Long => write!(f, "LONG"),
            Side::Short => write!(f, "SHORT"),
        }
    }
}

/// An open position with its target ladder and partial-exit progress.
///
/// Entry terms never change after construction. `stop_price` moves to
/// `entry_price` after the first partial target and never loosens.
/// `size_remaining` only decreases; zero means the position is closed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: u64,
    pub side: Side,
    pub entry_index: usize,
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,
    pub initial_stop: f64,
    pub stop_price: f64,
    /// Take-profit levels in ladder order (nearest first).
    pub targets: Vec<f64>,
    /// Number of targets already consumed.
    pub targets_hit: usize,
    pub initial_size: f64,
    pub size_remaining: f64,
}

impl Position {
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        id: u64,
        side: Side,
        entry_index: usize,
        entry_time: NaiveDateTime,
        entry_price: f64,
        stop_price: f64,
        targets: Vec<f64>,
        size: f64,
    ) -> Self {
        Self {
            id,
            side,
            entry_index,
            entry_time,
            entry_price,
            initial_stop: stop_price,
            stop_price,
            targets,
            targets_hit: 0,
            initial_size: size,
            size_remaining: size,
        }
    }

    pub fn is_open(&self) -> bool {
        self.size_remaining > 0.0
    }

    /// Distance from entry to the initial stop (1R).
    pub fn initial_risk(&self) -> f64 {
        (self.entry_price - self.initial_stop).abs()
    }

    /// Next unconsumed target, if any.
    pub fn next_target(&self) -> Option<f64> {
        self.targets.get(self.targets_hit).copied()
    }

    /// True when the next unconsumed target is the last rung of the ladder.
    pub fn next_target_is_final(&self) -> bool {
        self.targets_hit + 1 == self.targets.len()
    }

    /// Intrabar stop touch: low for longs, high for shorts.
    pub fn stop_touched(&self, bar: &Bar) -> bool {
        match self.side {
            Side::Long => bar.low <= self.stop_price,
            Side::Short => bar.high >= self.stop_price,
        }
    }

    /// Intrabar target touch: high for longs, low for shorts.
    pub fn target_touched(&self, bar: &Bar, target: f64) -> bool {
        match self.side {
            Side::Long => bar.high >= target,
            Side::Short => bar.low <= target,
        }
    }

    /// Move the stop to entry. Only ever tightens.
    pub fn move_stop_to_breakeven(&mut self) {
        self.stop_price = match self.side {
            Side::Long => self.stop_price.max(self.entry_price),
            Side::Short => self.stop_price.min(self.entry_price),
        };
    }

}
