//! Entry planning: direction resolution, initial stop, and target ladder.

use crate::config::{RiskConfig, SignalConflict, StopBasis};
use crate::domain::{Bar, SignalRow, Side};

/// Outcome of reading the entry flags on one signal row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryDirection {
    None,
    /// Both flags set under `SignalConflict::Ignore`.
    Ambiguous,
    Enter(Side),
}

pub fn resolve_direction(signal: &SignalRow, conflict: SignalConflict) -> EntryDirection {
    match (signal.long_entry, signal.short_entry) {
        (false, false) => EntryDirection::None,
        (true, false) => EntryDirection::Enter(Side::Long),
        (false, true) => EntryDirection::Enter(Side::Short),
        (true, true) => match conflict {
            SignalConflict::Ignore => EntryDirection::Ambiguous,
            SignalConflict::PreferLong => EntryDirection::Enter(Side::Long),
            SignalConflict::PreferShort => EntryDirection::Enter(Side::Short),
        },
    }
}

/// Fully specified terms of a new position.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryPlan {
    pub side: Side,
    pub entry_price: f64,
    pub stop_price: f64,
    pub targets: Vec<f64>,
}

/// Compute entry terms at the bar's close.
///
/// Returns `None` when the stop cannot be placed: missing or non-finite
/// stop inputs, or a stop at or beyond the entry price.
pub fn plan_entry(side: Side, bar: &Bar, signal: &SignalRow, config: &RiskConfig) -> Option<EntryPlan> {
    let entry_price = bar.close;
    if !entry_price.is_finite() {
        return None;
    }

    let stop_price = match (config.stop_basis, side) {
        (StopBasis::FixedRange, Side::Long) => signal.range_low?,
        (StopBasis::FixedRange, Side::Short) => signal.range_high?,
        (StopBasis::AtrMultiple, _) => {
            let atr = signal.atr?;
            entry_price - side.sign() * atr * config.atr_multiplier
        }
    };

    let risk = (entry_price - stop_price) * side.sign();
    if !(stop_price.is_finite() && risk.is_finite() && risk > 0.0) {
        return None;
    }

    let targets = config
        .reward_multiples
        .iter()
        .map(|r| entry_price + side.sign() * risk * r)
        .collect();

    Some(EntryPlan {
        side,
        entry_price,
        stop_price,
        targets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(close: f64) -> Bar {
        Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 4)
                .unwrap()
                .and_hms_opt(14, 0, 0)
                .unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1.0,
        }
    }

    fn atr_config(mult: f64) -> RiskConfig {
        RiskConfig {
            atr_multiplier: mult,
            ..Default::default()
        }
    }

    fn range_config() -> RiskConfig {
        RiskConfig {
            stop_basis: StopBasis::FixedRange,
            ..Default::default()
        }
    }

    #[test]
    fn conflict_policies() {
        let b = bar(100.0);
        let mut row = SignalRow::long(b.timestamp);
        row.short_entry = true;
        assert_eq!(resolve_direction(&row, SignalConflict::Ignore), EntryDirection::Ambiguous);
        assert_eq!(
            resolve_direction(&row, SignalConflict::PreferLong),
            EntryDirection::Enter(Side::Long)
        );
        assert_eq!(
            resolve_direction(&row, SignalConflict::PreferShort),
            EntryDirection::Enter(Side::Short)
        );
        assert_eq!(
            resolve_direction(&SignalRow::flat(b.timestamp), SignalConflict::Ignore),
            EntryDirection::None
        );
    }

    #[test]
    fn atr_stop_long_and_short() {
        let b = bar(100.0);
        let row = SignalRow::long(b.timestamp).with_atr(2.0);

        let long = plan_entry(Side::Long, &b, &row, &atr_config(1.5)).unwrap();
        assert_eq!(long.stop_price, 97.0);
        assert_eq!(long.targets, vec![103.0, 106.0]);
        assert_eq!(long.entry_price - long.stop_price, 3.0);

        let short = plan_entry(Side::Short, &b, &row, &atr_config(1.5)).unwrap();
        assert_eq!(short.stop_price, 103.0);
        assert_eq!(short.targets, vec![97.0, 94.0]);
    }

    #[test]
    fn fixed_range_stop_uses_opposite_side() {
        let b = bar(100.0);
        let row = SignalRow::long(b.timestamp).with_range(96.0, 104.0);

        let long = plan_entry(Side::Long, &b, &row, &range_config()).unwrap();
        assert_eq!(long.stop_price, 96.0);
        assert_eq!(long.targets, vec![104.0, 108.0]);

        let short = plan_entry(Side::Short, &b, &row, &range_config()).unwrap();
        assert_eq!(short.stop_price, 104.0);
        assert_eq!(short.targets, vec![96.0, 92.0]);
    }

    #[test]
    fn missing_inputs_are_degenerate() {
        let b = bar(100.0);
        let row = SignalRow::long(b.timestamp);
        assert!(plan_entry(Side::Long, &b, &row, &atr_config(1.5)).is_none());
        assert!(plan_entry(Side::Long, &b, &row, &range_config()).is_none());

        let nan_atr = SignalRow::long(b.timestamp).with_atr(f64::NAN);
        assert!(plan_entry(Side::Long, &b, &nan_atr, &atr_config(1.5)).is_none());
    }

    #[test]
    fn zero_width_stop_is_degenerate() {
        let b = bar(100.0);
        let row = SignalRow::long(b.timestamp).with_atr(0.0);
        assert!(plan_entry(Side::Long, &b, &row, &atr_config(1.5)).is_none());

        let flat_range = SignalRow::long(b.timestamp).with_range(100.0, 100.0);
        assert!(plan_entry(Side::Long, &b, &flat_range, &range_config()).is_none());
    }

    #[test]
    fn wrong_side_stop_is_degenerate() {
        let b = bar(100.0);
        // range_low above the entry for a long.
        let row = SignalRow::long(b.timestamp).with_range(101.0, 110.0);
        assert!(plan_entry(Side::Long, &b, &row, &range_config()).is_none());
        // Negative ATR would put the stop on the profit side.
        let neg = SignalRow::long(b.timestamp).with_atr(-1.0);
        assert!(plan_entry(Side::Long, &b, &neg, &atr_config(1.5)).is_none());
    }
}
