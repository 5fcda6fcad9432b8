//! Risk configuration — static, immutable parameters for one backtest run.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How the initial stop of a new position is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StopBasis {
    /// Opposite side of the lookback range (`range_low` for longs, `range_high` for shorts).
    FixedRange,
    /// `entry ∓ atr × atr_multiplier`.
    AtrMultiple,
}

/// What to do when both entry flags are set on the same bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalConflict {
    Ignore,
    PreferLong,
    PreferShort,
}

/// Time-of-day interval during which new entries are allowed.
///
/// Both ends are inclusive. When `start > end` the window wraps midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TradingWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, t: NaiveTime) -> bool {
        if self.start <= self.end {
            self.start <= t && t <= self.end
        } else {
            t >= self.start || t <= self.end
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("position_size must be positive and finite, got {0}")]
    NonPositiveSize(f64),

    #[error("reward_multiples must not be empty")]
    EmptyRewardMultiples,

    #[error("reward_multiples must be finite, positive and strictly increasing: {0:?}")]
    InvalidRewardMultiples(Vec<f64>),

    #[error("partial_fraction must be in (0, 1], got {0}")]
    PartialFractionOutOfRange(f64),

    #[error("atr_multiplier must be positive and finite when stop_basis is ATR_MULTIPLE, got {0}")]
    NonPositiveAtrMultiplier(f64),

    #[error("max_daily_loss must be positive and finite, got {0}")]
    NonPositiveDailyLoss(f64),

    #[error("max_trades_per_day must be at least 1")]
    ZeroTradesPerDay,

    #[error("cost_per_leg must be non-negative and finite, got {0}")]
    NegativeCost(f64),

    #[error("trading_window start and end must differ (both {0})")]
    EmptyTradingWindow(NaiveTime),
}

/// Risk and trade-management parameters. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Size of a newly opened position.
    pub position_size: f64,
    /// R-multiples defining the target ladder, nearest first.
    pub reward_multiples: Vec<f64>,
    /// Fraction of the remaining size closed at each non-final target.
    pub partial_fraction: f64,
    pub stop_basis: StopBasis,
    /// Only read when `stop_basis` is `AtrMultiple`.
    pub atr_multiplier: f64,
    /// Realized loss for the day at which new entries stop (positive number).
    pub max_daily_loss: Option<f64>,
    pub max_trades_per_day: Option<u32>,
    pub trading_window: Option<TradingWindow>,
    pub signal_conflict: SignalConflict,
    pub require_volatility_ok: bool,
    /// Flatten any open position at the last bar of each calendar day.
    pub close_at_day_end: bool,
    /// Fixed cost charged on every realized leg.
    pub cost_per_leg: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            position_size: 1.0,
            reward_multiples: vec![1.0, 2.0],
            partial_fraction: 0.5,
            stop_basis: StopBasis::AtrMultiple,
            atr_multiplier: 1.5,
            max_daily_loss: None,
            max_trades_per_day: None,
            trading_window: None,
            signal_conflict: SignalConflict::Ignore,
            require_volatility_ok: true,
            close_at_day_end: false,
            cost_per_leg: 0.0,
        }
    }
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.position_size.is_finite() && self.position_size > 0.0) {
            return Err(ConfigError::NonPositiveSize(self.position_size));
        }
        if self.reward_multiples.is_empty() {
            return Err(ConfigError::EmptyRewardMultiples);
        }
        let ladder_ok = self.reward_multiples.iter().all(|r| r.is_finite() && *r > 0.0)
            && self.reward_multiples.windows(2).all(|w| w[0] < w[1]);
        if !ladder_ok {
            return Err(ConfigError::InvalidRewardMultiples(
                self.reward_multiples.clone(),
            ));
        }
        if !(self.partial_fraction > 0.0 && self.partial_fraction <= 1.0) {
            return Err(ConfigError::PartialFractionOutOfRange(self.partial_fraction));
        }
        if self.stop_basis == StopBasis::AtrMultiple
            && !(self.atr_multiplier.is_finite() && self.atr_multiplier > 0.0)
        {
            return Err(ConfigError::NonPositiveAtrMultiplier(self.atr_multiplier));
        }
        if let Some(limit) = self.max_daily_loss {
            if !(limit.is_finite() && limit > 0.0) {
                return Err(ConfigError::NonPositiveDailyLoss(limit));
            }
        }
        if self.max_trades_per_day == Some(0) {
            return Err(ConfigError::ZeroTradesPerDay);
        }
        if !(self.cost_per_leg.is_finite() && self.cost_per_leg >= 0.0) {
            return Err(ConfigError::NegativeCost(self.cost_per_leg));
        }
        if let Some(window) = self.trading_window {
            if window.start == window.end {
                return Err(ConfigError::EmptyTradingWindow(window.start));
            }
        }
        Ok(())
    }
}
