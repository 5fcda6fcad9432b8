//! Streaming simulation context — one per run, advanced one bar at a time.
//!
//! Per bar, in this order:
//! 1. Day boundary: optionally flatten at the previous bar's close, then
//!    reset the daily risk counters.
//! 2. Exits for the open position (stop first, then the target ladder).
//! 3. Entry, if flat and every gate passes: direction, trading window,
//!    volatility, daily limits, stop placement.
//!
//! The daily gate is evaluated after this bar's exits have posted, so a stop
//! hit on the current bar already counts against the day's loss limit.

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::config::{ConfigError, RiskConfig};
use crate::domain::{Bar, ExitReason, Position, SignalRow, TradeLeg};
use crate::metrics::EquityCurve;

use super::entries::{plan_entry, resolve_direction, EntryDirection};
use super::exits::{evaluate_exits, ExitFill};
use super::ledger::TradeLedger;
use super::risk_gate::DailyRiskState;
use super::state::{RunCounters, RunResult};
use super::validate::{check_bar, InputError};

/// Mutable state owned by a single backtest run.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: RiskConfig,
    risk: DailyRiskState,
    position: Option<Position>,
    ledger: TradeLedger,
    counters: RunCounters,
    next_position_id: u64,
    first_timestamp: Option<NaiveDateTime>,
    last_bar: Option<Bar>,
}

impl Simulation {
    pub fn new(config: RiskConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            risk: DailyRiskState::new(),
            position: None,
            ledger: TradeLedger::new(),
            counters: RunCounters::default(),
            next_position_id: 1,
            first_timestamp: None,
            last_bar: None,
        })
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn ledger(&self) -> &TradeLedger {
        &self.ledger
    }

    pub fn risk_state(&self) -> &DailyRiskState {
        &self.risk
    }

    pub fn counters(&self) -> &RunCounters {
        &self.counters
    }

    /// Process one bar. The bar must follow the previous one in time and
    /// carry a signal row with the same timestamp.
    pub fn step(&mut self, bar: &Bar, signal: &SignalRow) -> Result<(), InputError> {
        let index = self.counters.bar_count;
        check_bar(index, self.last_bar.as_ref(), bar, signal)?;

        let day = bar.trading_day();
        if self.risk.trading_day != Some(day) {
            if self.config.close_at_day_end {
                if let Some(prev) = self.last_bar.take() {
                    self.force_close(index - 1, &prev);
                }
            }
            self.risk.roll_to(day);
        }

        self.process_exits(index, bar);
        self.process_entry(index, bar, signal);

        self.first_timestamp.get_or_insert(bar.timestamp);
        self.last_bar = Some(bar.clone());
        self.counters.bar_count += 1;
        Ok(())
    }

    /// Close any open position at the last close and return the run result.
    pub fn finish(mut self) -> RunResult {
        if let Some(last) = self.last_bar.take() {
            self.force_close(self.counters.bar_count - 1, &last);
            self.last_bar = Some(last);
        }
        let trades = self.ledger.into_legs();
        let equity = EquityCurve::from_legs(&trades);
        RunResult {
            trades,
            equity,
            counters: self.counters,
            first_timestamp: self.first_timestamp,
            last_timestamp: self.last_bar.map(|b| b.timestamp),
        }
    }

    // ─── Exits ──────────────────────────────────────────────────────

    fn process_exits(&mut self, index: usize, bar: &Bar) {
        let Some(mut position) = self.position.take() else {
            return;
        };
        let fills = evaluate_exits(&mut position, bar, self.config.partial_fraction);
        for fill in fills {
            self.realize(&position, index, bar.timestamp, fill);
        }
        if position.is_open() {
            self.position = Some(position);
        }
    }

    /// Close the whole remainder at `bar`'s close with `END_OF_SESSION`.
    fn force_close(&mut self, index: usize, bar: &Bar) {
        let Some(mut position) = self.position.take() else {
            return;
        };
        let fill = ExitFill {
            price: bar.close,
            size: position.size_remaining,
            reason: ExitReason::EndOfSession,
            stop_at_exit: position.stop_price,
        };
        position.size_remaining = 0.0;
        self.realize(&position, index, bar.timestamp, fill);
    }

    fn realize(
        &mut self,
        position: &Position,
        exit_index: usize,
        exit_time: NaiveDateTime,
        fill: ExitFill,
    ) {
        let gross_pnl = position.side.pnl(position.entry_price, fill.price, fill.size);
        let cost = self.config.cost_per_leg;
        let leg = TradeLeg {
            position_id: position.id,
            side: position.side,
            entry_index: position.entry_index,
            entry_time: position.entry_time,
            entry_price: position.entry_price,
            exit_index,
            exit_time,
            exit_price: fill.price,
            exit_reason: fill.reason,
            stop_price_at_exit: fill.stop_at_exit,
            size: fill.size,
            gross_pnl,
            cost,
            pnl: gross_pnl - cost,
        };
        debug!(
            position = leg.position_id,
            side = %leg.side,
            reason = %leg.exit_reason,
            price = leg.exit_price,
            size = leg.size,
            pnl = leg.pnl,
            "leg realized"
        );
        self.risk.record_pnl(leg.pnl);
        self.ledger.append(leg);
    }

    // ─── Entries ────────────────────────────────────────────────────

    fn process_entry(&mut self, index: usize, bar: &Bar, signal: &SignalRow) {
        if self.position.is_some() {
            return;
        }

        let side = match resolve_direction(signal, self.config.signal_conflict) {
            EntryDirection::None => return,
            EntryDirection::Ambiguous => {
                self.counters.entries_ambiguous += 1;
                debug!(bar = index, "both entry flags set, ignoring");
                return;
            }
            EntryDirection::Enter(side) => side,
        };

        let in_window = signal.in_window
            && self
                .config
                .trading_window
                .map_or(true, |w| w.contains(bar.time_of_day()));
        if !in_window {
            self.counters.entries_outside_window += 1;
            return;
        }

        if self.config.require_volatility_ok && !signal.volatility_ok {
            self.counters.entries_blocked_by_volatility += 1;
            return;
        }

        if !self.risk.permits(&self.config) {
            self.counters.entries_blocked_by_gate += 1;
            debug!(
                bar = index,
                pnl_today = self.risk.realized_pnl_today,
                trades_today = self.risk.trade_count_today,
                "daily limit reached, entry suppressed"
            );
            return;
        }

        let Some(plan) = plan_entry(side, bar, signal, &self.config) else {
            self.counters.entries_degenerate += 1;
            warn!(
                bar = index,
                timestamp = %bar.timestamp,
                %side,
                "no valid stop for entry, skipping"
            );
            return;
        };

        let position = Position::open(
            self.next_position_id,
            plan.side,
            index,
            bar.timestamp,
            plan.entry_price,
            plan.stop_price,
            plan.targets,
            self.config.position_size,
        );
        debug!(
            position = position.id,
            side = %position.side,
            entry = position.entry_price,
            stop = position.stop_price,
            risk = position.initial_risk(),
            "position opened"
        );
        self.next_position_id += 1;
        self.counters.positions_opened += 1;
        self.risk.record_open();
        self.position = Some(position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn bar(t: NaiveDateTime, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            timestamp: t,
            open: close,
            high,
            low,
            close,
            volume: 1.0,
        }
    }

    #[test]
    fn rejects_invalid_config() {
        let cfg = RiskConfig {
            position_size: -1.0,
            ..Default::default()
        };
        assert!(Simulation::new(cfg).is_err());
    }

    #[test]
    fn step_rejects_out_of_order_bar() {
        let mut sim = Simulation::new(RiskConfig::default()).unwrap();
        let b1 = bar(ts(4, 13, 5), 101.0, 99.0, 100.0);
        let b0 = bar(ts(4, 13, 0), 101.0, 99.0, 100.0);
        sim.step(&b1, &SignalRow::flat(b1.timestamp)).unwrap();
        assert!(matches!(
            sim.step(&b0, &SignalRow::flat(b0.timestamp)),
            Err(InputError::Unordered { .. })
        ));
    }

    #[test]
    fn opens_and_tracks_position() {
        let mut sim = Simulation::new(RiskConfig::default()).unwrap();
        let b = bar(ts(4, 13, 0), 101.0, 99.0, 100.0);
        sim.step(&b, &SignalRow::long(b.timestamp).with_atr(2.0)).unwrap();
        let pos = sim.position().unwrap();
        assert_eq!(pos.id, 1);
        assert_eq!(pos.entry_price, 100.0);
        assert_eq!(pos.stop_price, 97.0);
        assert_eq!(sim.risk_state().trade_count_today, 1);
        assert_eq!(sim.counters().positions_opened, 1);
    }

    #[test]
    fn finish_without_bars_is_empty() {
        let sim = Simulation::new(RiskConfig::default()).unwrap();
        let result = sim.finish();
        assert!(result.trades.is_empty());
        assert!(result.first_timestamp.is_none());
        assert_eq!(result.counters.bar_count, 0);
    }

    #[test]
    fn cost_is_charged_per_leg() {
        let cfg = RiskConfig {
            cost_per_leg: 0.25,
            ..Default::default()
        };
        let mut sim = Simulation::new(cfg).unwrap();
        let b0 = bar(ts(4, 13, 0), 101.0, 99.0, 100.0);
        let b1 = bar(ts(4, 13, 5), 104.0, 99.0, 103.0);
        sim.step(&b0, &SignalRow::long(b0.timestamp).with_atr(2.0)).unwrap();
        // Target 1 at 103 hit; half of the position closes.
        sim.step(&b1, &SignalRow::flat(b1.timestamp)).unwrap();
        let leg = &sim.ledger().legs()[0];
        assert_eq!(leg.gross_pnl, 1.5);
        assert_eq!(leg.cost, 0.25);
        assert_eq!(leg.pnl, 1.25);
        assert_eq!(sim.risk_state().realized_pnl_today, 1.25);
    }
}
