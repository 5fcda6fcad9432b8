//! Seeded synthetic series — developer fallback when no data file exists.
//!
//! Produces an intraday random walk with a simple indicator stack on top:
//! Wilder-style ATR, a rolling high/low range, and sparse breakout entries
//! inside a fixed session window. Results produced on synthetic data are
//! tagged and should never be compared against real runs.

use barsim_core::domain::{Bar, SignalRow};
use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::data_loader::LoadedSeries;

/// Minutes between synthetic bars.
const BAR_MINUTES: i64 = 5;
const ATR_PERIOD: usize = 14;
const RANGE_LOOKBACK: usize = 20;
const SESSION_START_HOUR: u32 = 13;
const SESSION_END_HOUR: u32 = 17;

/// Generate `n` bars starting at `start`, deterministic in `seed`.
pub fn generate_synthetic(n: usize, seed: u64, start: NaiveDateTime) -> LoadedSeries {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut bars: Vec<Bar> = Vec::with_capacity(n);
    let mut price = 100.0_f64;

    for i in 0..n {
        let step: f64 = rng.gen_range(-0.004..0.004);
        let open = price;
        let close = price * (1.0 + step);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.002));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.002));
        bars.push(Bar {
            timestamp: start + Duration::minutes(BAR_MINUTES * i as i64),
            open,
            high,
            low,
            close,
            volume: rng.gen_range(10.0..1_000.0),
        });
        price = close;
    }

    let atr = wilder_atr(&bars, ATR_PERIOD);
    let median_atr = median(atr.iter().flatten().copied().collect());

    let signals = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let mut row = SignalRow::flat(bar.timestamp);
            row.in_window = in_session(bar.timestamp.time());
            row.atr = atr[i];
            row.volatility_ok = match (atr[i], median_atr) {
                (Some(a), Some(m)) => a >= m,
                _ => false,
            };

            if i >= RANGE_LOOKBACK {
                let window = &bars[i - RANGE_LOOKBACK..i];
                let hi = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
                let lo = window.iter().map(|b| b.low).fold(f64::MAX, f64::min);
                row = row.with_range(lo, hi);
                // Breakout of the prior range, thinned so entries stay sparse.
                let roll: f64 = rng.gen();
                row.long_entry = bar.close > hi && roll < 0.5;
                row.short_entry = bar.close < lo && roll < 0.5;
            }
            row
        })
        .collect();

    LoadedSeries {
        bars,
        signals,
        synthetic: true,
    }
}

// ─── Helpers ────────────────────────────────────────────────────────

fn in_session(t: NaiveTime) -> bool {
    (SESSION_START_HOUR..SESSION_END_HOUR).contains(&t.hour())
}

/// ATR with Wilder smoothing; `None` until `period` true ranges are available.
fn wilder_atr(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; bars.len()];
    let mut atr: Option<f64> = None;
    let mut seed_sum = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        let tr = match i {
            0 => bar.high - bar.low,
            _ => {
                let prev_close = bars[i - 1].close;
                (bar.high - bar.low)
                    .max((bar.high - prev_close).abs())
                    .max((bar.low - prev_close).abs())
            }
        };
        atr = match atr {
            Some(prev) => Some((prev * (period as f64 - 1.0) + tr) / period as f64),
            None => {
                seed_sum += tr;
                (i + 1 == period).then(|| seed_sum / period as f64)
            }
        };
        out[i] = atr;
    }
    out
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}
