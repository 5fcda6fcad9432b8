//! Intrabar exit evaluation for an open position.
//!
//! The stop is checked first. A bar whose range covers both the stop and a
//! target exits the full remainder at the stop.
//!
//! If the stop holds, at most one rung of the target ladder fills per bar,
//! even when the bar's range reaches further rungs. A non-final target
//! closes `remaining × partial_fraction` and moves the stop to breakeven.
//! The final target closes whatever remains.
//!
//! A breakeven move made on a bar is checked against that bar's close only.
//! A close through the new stop means price came back across entry after the
//! target was touched, so the remainder exits at breakeven on the same bar.

use crate::domain::{Bar, ExitReason, Position, Side};

/// One realized exit produced by a bar.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitFill {
    pub price: f64,
    pub size: f64,
    pub reason: ExitReason,
    /// Stop level in force when the fill happened.
    pub stop_at_exit: f64,
}

/// Evaluate `bar` against `position`, mutating its remaining size, target
/// progress, and stop. Returns the fills in the order they are realized.
pub fn evaluate_exits(position: &mut Position, bar: &Bar, partial_fraction: f64) -> Vec<ExitFill> {
    let mut fills = Vec::new();
    if !position.is_open() {
        return fills;
    }

    if position.stop_touched(bar) {
        fills.push(ExitFill {
            price: position.stop_price,
            size: position.size_remaining,
            reason: ExitReason::Stop,
            stop_at_exit: position.stop_price,
        });
        position.size_remaining = 0.0;
        return fills;
    }

    let Some(target) = position.next_target() else {
        return fills;
    };
    if !position.target_touched(bar, target) {
        return fills;
    }

    let rung = position.targets_hit + 1;
    let stop_at_exit = position.stop_price;
    let size = if position.next_target_is_final() {
        position.size_remaining
    } else {
        position.size_remaining * partial_fraction
    };

    position.size_remaining -= size;
    if position.size_remaining <= 0.0 {
        position.size_remaining = 0.0;
    }
    position.targets_hit += 1;

    fills.push(ExitFill {
        price: target,
        size,
        reason: ExitReason::Target(rung),
        stop_at_exit,
    });

    if position.is_open() {
        position.move_stop_to_breakeven();
        if closed_through_stop(position, bar) {
            fills.push(ExitFill {
                price: position.stop_price,
                size: position.size_remaining,
                reason: ExitReason::Stop,
                stop_at_exit: position.stop_price,
            });
            position.size_remaining = 0.0;
        }
    }

    fills
}

fn closed_through_stop(position: &Position, bar: &Bar) -> bool {
    match position.side {
        Side::Long => bar.close <= position.stop_price,
        Side::Short => bar.close >= position.stop_price,
    }
}
