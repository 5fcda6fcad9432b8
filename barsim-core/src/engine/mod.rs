//! Backtesting engine — bar-by-bar position state machine and supporting pieces.
//!
//! The engine consumes a validated bar series with its aligned signal table
//! and, per bar, runs exits before entries:
//!
//! 1. Day boundary: optional session-end flatten, daily risk reset
//! 2. Exits: stop first, then the partial target ladder with breakeven
//! 3. Entries: signal direction, window/volatility gates, daily risk gate
//! 4. End of series: force-close anything still open

pub mod entries;
pub mod exits;
pub mod ledger;
pub mod loop_runner;
pub mod risk_gate;
pub mod simulation;
pub mod state;
pub mod validate;

pub use entries::{plan_entry, resolve_direction, EntryDirection, EntryPlan};
pub use exits::{evaluate_exits, ExitFill};
pub use ledger::TradeLedger;
pub use loop_runner::{run_backtest, EngineError};
pub use risk_gate::DailyRiskState;
pub use simulation::Simulation;
pub use state::{RunCounters, RunResult};
pub use validate::{check_bar, validate_series, InputError};
