//! Input-shape validation for the bar series and its signal table.
//!
//! Malformed input is fatal for a run and is rejected before any bar is
//! simulated. An empty series is valid input and yields an empty run.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::domain::{Bar, SignalRow};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("bar {index} at {current} does not follow previous bar at {previous} (timestamps must be strictly increasing)")]
    Unordered {
        index: usize,
        previous: NaiveDateTime,
        current: NaiveDateTime,
    },

    #[error("signal table has {signals} rows but bar series has {bars}")]
    LengthMismatch { bars: usize, signals: usize },

    #[error("signal row {index} is stamped {signal} but its bar is stamped {bar}")]
    TimestampMismatch {
        index: usize,
        bar: NaiveDateTime,
        signal: NaiveDateTime,
    },

    #[error("bar {index} at {timestamp} has non-finite prices or high below low")]
    InvalidBar {
        index: usize,
        timestamp: NaiveDateTime,
    },
}

/// Validate a whole series up front.
pub fn validate_series(bars: &[Bar], signals: &[SignalRow]) -> Result<(), InputError> {
    if bars.len() != signals.len() {
        return Err(InputError::LengthMismatch {
            bars: bars.len(),
            signals: signals.len(),
        });
    }
    let mut previous: Option<&Bar> = None;
    for (index, (bar, signal)) in bars.iter().zip(signals).enumerate() {
        check_bar(index, previous, bar, signal)?;
        previous = Some(bar);
    }
    Ok(())
}

/// Validate one bar against its signal row and the bar before it.
pub fn check_bar(
    index: usize,
    previous: Option<&Bar>,
    bar: &Bar,
    signal: &SignalRow,
) -> Result<(), InputError> {
    if let Some(prev) = previous {
        if bar.timestamp <= prev.timestamp {
            return Err(InputError::Unordered {
                index,
                previous: prev.timestamp,
                current: bar.timestamp,
            });
        }
    }
    if signal.timestamp != bar.timestamp {
        return Err(InputError::TimestampMismatch {
            index,
            bar: bar.timestamp,
            signal: signal.timestamp,
        });
    }
    if bar.is_void() || bar.high < bar.low {
        return Err(InputError::InvalidBar {
            index,
            timestamp: bar.timestamp,
        });
    }
    Ok(())
}
