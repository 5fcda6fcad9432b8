//! Barsim Core — domain types, risk configuration, simulation engine, metrics.
//!
//! This crate contains the heart of the backtester:
//! - Domain types (bars, signal rows, positions, trade legs)
//! - Risk configuration and its validation
//! - Bar-by-bar position state machine with stop-first exits, a partial
//!   target ladder, and breakeven
//! - Daily risk gate and append-only trade ledger
//! - Pure performance aggregation over the ledger
//! - Deterministic run fingerprints

pub mod config;
pub mod domain;
pub mod engine;
pub mod fingerprint;
pub mod metrics;

pub use config::{ConfigError, RiskConfig, SignalConflict, StopBasis, TradingWindow};
pub use engine::{run_backtest, EngineError, InputError, RunCounters, RunResult, Simulation};
pub use metrics::{EquityCurve, PerformanceSummary};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: run inputs and outputs are Send + Sync so
    /// independent runs can be fanned out across threads.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::SignalRow>();
        require_sync::<domain::SignalRow>();
        require_send::<domain::Position>();
        require_sync::<domain::Position>();
        require_send::<domain::TradeLeg>();
        require_sync::<domain::TradeLeg>();

        // Config
        require_send::<RiskConfig>();
        require_sync::<RiskConfig>();

        // Engine
        require_send::<Simulation>();
        require_sync::<Simulation>();
        require_send::<RunResult>();
        require_sync::<RunResult>();
        require_send::<EngineError>();
        require_sync::<EngineError>();

        // Metrics and fingerprints
        require_send::<PerformanceSummary>();
        require_sync::<PerformanceSummary>();
        require_send::<fingerprint::RunId>();
        require_sync::<fingerprint::RunId>();
    }
}
