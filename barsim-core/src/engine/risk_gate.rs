//! Daily risk gate — per-calendar-day loss and trade-count limits on new entries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::RiskConfig;

/// Realized PnL and trade count for the current calendar day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyRiskState {
    pub trading_day: Option<NaiveDate>,
    pub realized_pnl_today: f64,
    pub trade_count_today: u32,
}

impl DailyRiskState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch to `day`, zeroing both counters if it differs from the stored day.
    ///
    /// Returns true when a reset happened.
    pub fn roll_to(&mut self, day: NaiveDate) -> bool {
        if self.trading_day == Some(day) {
            return false;
        }
        self.trading_day = Some(day);
        self.realized_pnl_today = 0.0;
        self.trade_count_today = 0;
        true
    }

    /// Whether a new position may be opened under `config`'s daily limits.
    pub fn permits(&self, config: &RiskConfig) -> bool {
        let loss_ok = config
            .max_daily_loss
            .map_or(true, |limit| self.realized_pnl_today > -limit);
        let count_ok = config
            .max_trades_per_day
            .map_or(true, |cap| self.trade_count_today < cap);
        loss_ok && count_ok
    }

    /// Post a realized leg's net PnL.
    pub fn record_pnl(&mut self, pnl: f64) {
        self.realized_pnl_today += pnl;
    }

    /// Count a newly opened position. Partial exits never count.
    pub fn record_open(&mut self) {
        self.trade_count_today += 1;
    }
}
