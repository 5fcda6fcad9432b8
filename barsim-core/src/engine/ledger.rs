//! Append-only trade ledger.

use serde::{Deserialize, Serialize};

use crate::domain::TradeLeg;

/// Realized legs in exit order. Legs are never mutated or removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeLedger {
    legs: Vec<TradeLeg>,
}

impl TradeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, leg: TradeLeg) {
        self.legs.push(leg);
    }

    pub fn legs(&self) -> &[TradeLeg] {
        &self.legs
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    pub fn into_legs(self) -> Vec<TradeLeg> {
        self.legs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExitReason, Side};
    use chrono::NaiveDate;

    fn leg(id: u64, pnl: f64) -> TradeLeg {
        let t = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap();
        TradeLeg {
            position_id: id,
            side: Side::Short,
            entry_index: 0,
            entry_time: t,
            entry_price: 50.0,
            exit_index: 1,
            exit_time: t,
            exit_price: 50.0 - pnl,
            exit_reason: ExitReason::EndOfSession,
            stop_price_at_exit: 55.0,
            size: 1.0,
            gross_pnl: pnl,
            cost: 0.0,
            pnl,
        }
    }

    #[test]
    fn append_preserves_order() {
        let mut ledger = TradeLedger::new();
        assert!(ledger.is_empty());
        ledger.append(leg(1, 2.0));
        ledger.append(leg(2, -1.0));
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.legs()[0].position_id, 1);
        assert_eq!(ledger.into_legs()[1].position_id, 2);
    }
}
