//! SignalRow — per-bar output of the external indicator pipeline.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Precomputed signal context for one bar, aligned 1:1 with the bar series.
///
/// The engine only reads these values. Numeric context is optional because
/// rolling indicators are undefined during their own warmup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRow {
    pub timestamp: NaiveDateTime,
    pub long_entry: bool,
    pub short_entry: bool,
    /// Kill-zone flag computed upstream.
    pub in_window: bool,
    /// Volatility filter (e.g. ATR above its rolling median).
    pub volatility_ok: bool,
    pub atr: Option<f64>,
    pub range_high: Option<f64>,
    pub range_low: Option<f64>,
    pub equilibrium: Option<f64>,
}

impl SignalRow {
    /// A row with no entry flags, open window, volatility ok, and no numeric context.
    pub fn flat(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            long_entry: false,
            short_entry: false,
            in_window: true,
            volatility_ok: true,
            atr: None,
            range_high: None,
            range_low: None,
            equilibrium: None,
        }
    }

    pub fn long(timestamp: NaiveDateTime) -> Self {
        Self {
            long_entry: true,
            ..Self::flat(timestamp)
        }
    }

    pub fn short(timestamp: NaiveDateTime) -> Self {
        Self {
            short_entry: true,
            ..Self::flat(timestamp)
        }
    }

    pub fn with_atr(mut self, atr: f64) -> Self {
        self.atr = Some(atr);
        self
    }

    /// Sets the lookback range and derives the equilibrium as its midpoint.
    pub fn with_range(mut self, low: f64, high: f64) -> Self {
        self.range_low = Some(low);
        self.range_high = Some(high);
        self.equilibrium = Some((low + high) / 2.0);
        self
    }
}
