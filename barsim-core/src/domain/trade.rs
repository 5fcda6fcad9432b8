//! TradeLeg — one realized exit (partial or final) of a position.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::position::Side;

/// Why a leg was closed.
///
/// Serialized as its canonical string: `STOP`, `TARGET_1`, `TARGET_2`, ...,
/// `END_OF_SESSION`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitReason {
    Stop,
    /// 1-based rung of the target ladder.
    Target(usize),
    EndOfSession,
}

impl ExitReason {
    pub fn is_target(self) -> bool {
        matches!(self, ExitReason::Target(_))
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Stop => write!(f, "STOP"),
            ExitReason::Target(n) => write!(f, "TARGET_{n}"),
            ExitReason::EndOfSession => write!(f, "END_OF_SESSION"),
        }
    }
}

impl FromStr for ExitReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STOP" => Ok(ExitReason::Stop),
            "END_OF_SESSION" => Ok(ExitReason::EndOfSession),
            other => other
                .strip_prefix("TARGET_")
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|&n| n >= 1)
                .map(ExitReason::Target)
                .ok_or_else(|| format!("unknown exit reason '{other}'")),
        }
    }
}

impl Serialize for ExitReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ExitReason {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// An immutable record of one realized exit.
///
/// A position that scales out through a target ladder produces several legs
/// sharing the same `position_id`; their sizes sum to the original size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeLeg {
    // ── Identification ──
    pub position_id: u64,
    pub side: Side,

    // ── Entry ──
    pub entry_index: usize,
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_index: usize,
    pub exit_time: NaiveDateTime,
    pub exit_price: f64,
    pub exit_reason: ExitReason,
    /// Stop level in force when this leg was realized.
    pub stop_price_at_exit: f64,

    // ── Size ──
    pub size: f64,

    // ── PnL ──
    pub gross_pnl: f64,
    pub cost: f64,
    pub pnl: f64,
}

impl TradeLeg {
    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }

    pub fn bars_held(&self) -> usize {
        self.exit_index.saturating_sub(self.entry_index)
    }

    /// Net return on the leg's entry notional.
    pub fn return_pct(&self) -> f64 {
        if self.entry_price == 0.0 || self.size == 0.0 {
            return 0.0;
        }
        self.pnl / (self.entry_price * self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_leg() -> TradeLeg {
        let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        TradeLeg {
            position_id: 1,
            side: Side::Long,
            entry_index: 4,
            entry_time: day.and_hms_opt(13, 0, 0).unwrap(),
            entry_price: 100.0,
            exit_index: 8,
            exit_time: day.and_hms_opt(14, 0, 0).unwrap(),
            exit_price: 110.0,
            exit_reason: ExitReason::Target(1),
            stop_price_at_exit: 95.0,
            size: 0.5,
            gross_pnl: 5.0,
            cost: 0.25,
            pnl: 4.75,
        }
    }

    #[test]
    fn exit_reason_strings() {
        assert_eq!(ExitReason::Stop.to_string(), "STOP");
        assert_eq!(ExitReason::Target(2).to_string(), "TARGET_2");
        assert_eq!(ExitReason::EndOfSession.to_string(), "END_OF_SESSION");
        assert_eq!("TARGET_3".parse::<ExitReason>(), Ok(ExitReason::Target(3)));
        assert!("TARGET_0".parse::<ExitReason>().is_err());
        assert!("TAKE_PROFIT".parse::<ExitReason>().is_err());
    }

    #[test]
    fn leg_helpers() {
        let leg = sample_leg();
        assert!(leg.is_winner());
        assert_eq!(leg.bars_held(), 4);
        assert!((leg.return_pct() - 4.75 / 50.0).abs() < 1e-12);
    }

    #[test]
    fn leg_serializes_reason_as_string() {
        let json = serde_json::to_string(&sample_leg()).unwrap();
        assert!(json.contains("\"exit_reason\":\"TARGET_1\""));
        let back: TradeLeg = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample_leg());
    }
}
