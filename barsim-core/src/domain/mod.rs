//! Domain types for barsim

pub mod bar;
pub mod position;
pub mod signal;
pub mod trade;

pub use bar::Bar;
pub use position::{Position, Side};
pub use signal::SignalRow;
pub use trade::{ExitReason, TradeLeg};
