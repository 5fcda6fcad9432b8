//! Reporting and export — JSON, CSV, and Markdown artifact generation.
//!
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: trade ledger and equity curve for external analysis tools
//! - **Markdown**: a human-readable single-run summary
//!
//! Persisted results carry a `schema_version`; versions newer than this
//! build understands are rejected on load.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use barsim_core::domain::TradeLeg;

use crate::runner::{BacktestResult, SCHEMA_VERSION};

const RESULT_FILE: &str = "result.json";
const TRADES_FILE: &str = "trades.csv";
const EQUITY_FILE: &str = "equity.csv";
const SUMMARY_FILE: &str = "summary.md";

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the trade ledger as CSV, one row per exit leg.
///
/// Columns: position_id, side, entry_index, entry_time, entry_price,
/// exit_index, exit_time, exit_price, exit_reason, stop_at_exit, size,
/// gross_pnl, cost, pnl, bars_held
pub fn export_trades_csv(trades: &[TradeLeg]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "position_id",
        "side",
        "entry_index",
        "entry_time",
        "entry_price",
        "exit_index",
        "exit_time",
        "exit_price",
        "exit_reason",
        "stop_at_exit",
        "size",
        "gross_pnl",
        "cost",
        "pnl",
        "bars_held",
    ])?;

    for t in trades {
        wtr.write_record([
            &t.position_id.to_string(),
            &t.side.to_string(),
            &t.entry_index.to_string(),
            &t.entry_time.to_string(),
            &format!("{:.6}", t.entry_price),
            &t.exit_index.to_string(),
            &t.exit_time.to_string(),
            &format!("{:.6}", t.exit_price),
            &t.exit_reason.to_string(),
            &format!("{:.6}", t.stop_price_at_exit),
            &format!("{:.6}", t.size),
            &format!("{:.6}", t.gross_pnl),
            &format!("{:.6}", t.cost),
            &format!("{:.6}", t.pnl),
            &t.bars_held().to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the per-leg equity curve with its drawdown series.
pub fn export_equity_csv(equity_curve: &[f64], drawdown: &[f64]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["trade_index", "equity", "drawdown"])?;
    for (i, eq) in equity_curve.iter().enumerate() {
        let dd = drawdown.get(i).copied().unwrap_or(0.0);
        wtr.write_record([&i.to_string(), &format!("{:.6}", eq), &format!("{:.6}", dd)])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Markdown summary ───────────────────────────────────────────────

/// Render a Markdown summary for a single run.
pub fn render_markdown_summary(result: &BacktestResult) -> String {
    let s = &result.summary;
    let c = &result.counters;
    let mut md = String::with_capacity(2048);

    md.push_str("# Backtest Summary\n\n");

    md.push_str("## Run\n\n");
    md.push_str("| Field | Value |\n| --- | --- |\n");
    let _ = writeln!(md, "| Symbol | {} |", result.symbol);
    let _ = writeln!(md, "| Run ID | `{}` |", result.short_id());
    match (result.first_timestamp, result.last_timestamp) {
        (Some(first), Some(last)) => {
            let _ = writeln!(md, "| Period | {first} to {last} |");
        }
        _ => md.push_str("| Period | (no bars) |\n"),
    }
    let _ = writeln!(md, "| Bars | {} |", c.bar_count);
    let _ = writeln!(md, "| Dataset Hash | `{}` |", result.dataset_hash);
    if result.synthetic {
        md.push_str("| Data | **SYNTHETIC** |\n");
    }
    md.push('\n');

    md.push_str("## Risk Settings\n\n");
    md.push_str("| Setting | Value |\n| --- | --- |\n");
    let r = &result.config;
    let _ = writeln!(md, "| Position Size | {} |", r.position_size);
    let _ = writeln!(md, "| Reward Multiples | {:?} |", r.reward_multiples);
    let _ = writeln!(md, "| Partial Fraction | {} |", r.partial_fraction);
    let _ = writeln!(md, "| Stop Basis | {:?} |", r.stop_basis);
    let _ = writeln!(md, "| ATR Multiplier | {} |", r.atr_multiplier);
    let _ = writeln!(md, "| Max Daily Loss | {} |", optional(r.max_daily_loss));
    let _ = writeln!(md, "| Max Trades/Day | {} |", optional(r.max_trades_per_day));
    let _ = writeln!(md, "| Cost per Leg | {} |", r.cost_per_leg);
    md.push('\n');

    md.push_str("## Performance\n\n");
    md.push_str("| Metric | Value |\n| --- | --- |\n");
    let _ = writeln!(md, "| Net PnL | {:.4} |", s.net_pnl);
    let _ = writeln!(md, "| Legs | {} |", s.total_trades);
    let _ = writeln!(md, "| Positions | {} |", s.positions);
    let _ = writeln!(md, "| Win Rate | {:.1}% |", s.win_rate * 100.0);
    let _ = writeln!(md, "| Avg Win | {:.4} |", s.avg_win);
    let _ = writeln!(md, "| Avg Loss | {:.4} |", s.avg_loss);
    let _ = writeln!(md, "| Best Leg | {:.4} |", s.best_trade);
    let _ = writeln!(md, "| Worst Leg | {:.4} |", s.worst_trade);
    let _ = writeln!(md, "| Profit Factor | {:.2} |", s.profit_factor);
    let _ = writeln!(md, "| Max Drawdown | {:.4} |", s.max_drawdown);
    let _ = writeln!(md, "| Return / Max DD | {:.2} |", s.return_over_max_drawdown);
    let _ = writeln!(md, "| Max Consecutive Losses | {} |", s.max_consecutive_losses);
    md.push('\n');

    md.push_str("## Entry Filters\n\n");
    md.push_str("| Counter | Value |\n| --- | --- |\n");
    let _ = writeln!(md, "| Positions Opened | {} |", c.positions_opened);
    let _ = writeln!(md, "| Blocked by Daily Gate | {} |", c.entries_blocked_by_gate);
    let _ = writeln!(md, "| Outside Window | {} |", c.entries_outside_window);
    let _ = writeln!(md, "| Volatility Filter | {} |", c.entries_blocked_by_volatility);
    let _ = writeln!(md, "| Ambiguous | {} |", c.entries_ambiguous);
    let _ = writeln!(md, "| Degenerate Stop | {} |", c.entries_degenerate);
    let _ = writeln!(md, "| Total Skipped | {} |", c.entries_skipped());

    md
}

fn optional<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "none".to_string(), |v| v.to_string())
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a single backtest run.
///
/// Creates `{symbol}_{run_id_short}/` under `output_dir` containing:
/// - `result.json` — the full `BacktestResult`
/// - `trades.csv` — the trade ledger
/// - `equity.csv` — per-leg equity and drawdown
/// - `summary.md` — the Markdown summary
///
/// The directory name depends only on the run's inputs, so rerunning
/// overwrites the same bundle. Returns the path to the directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let run_dir = output_dir.join(format!("{}_{}", result.symbol, result.short_id()));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    write_file(&run_dir.join(RESULT_FILE), &export_json(result)?)?;
    write_file(&run_dir.join(TRADES_FILE), &export_trades_csv(&result.trades)?)?;
    write_file(
        &run_dir.join(EQUITY_FILE),
        &export_equity_csv(&result.equity_curve, &result.drawdown)?,
    )?;
    write_file(&run_dir.join(SUMMARY_FILE), &render_markdown_summary(result))?;

    Ok(run_dir)
}

/// Load a `BacktestResult` from an artifact directory's `result.json`.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let path = dir.join(RESULT_FILE);
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use barsim_core::domain::{ExitReason, Side};
    use chrono::NaiveDate;

    fn leg(pnl: f64, reason: ExitReason) -> TradeLeg {
        let t = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(13, 0, 0)
            .unwrap();
        TradeLeg {
            position_id: 1,
            side: Side::Long,
            entry_index: 2,
            entry_time: t,
            entry_price: 100.0,
            exit_index: 5,
            exit_time: t + chrono::Duration::minutes(15),
            exit_price: 100.0 + pnl,
            exit_reason: reason,
            stop_price_at_exit: 97.0,
            size: 1.0,
            gross_pnl: pnl,
            cost: 0.0,
            pnl,
        }
    }

    #[test]
    fn trades_csv_has_header_and_reason_strings() {
        let csv = export_trades_csv(&[leg(3.0, ExitReason::Target(1)), leg(-3.0, ExitReason::Stop)])
            .unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("position_id,side,entry_index"));
        assert!(lines[1].contains(",LONG,"));
        assert!(lines[1].contains(",TARGET_1,"));
        assert!(lines[2].contains(",STOP,"));
        assert!(lines[1].ends_with(",3"));
    }

    #[test]
    fn equity_csv_pairs_drawdown() {
        let csv = export_equity_csv(&[1.0, 0.5, 2.0], &[0.0, 0.5, 0.0]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "trade_index,equity,drawdown");
        assert_eq!(lines[2], "1,0.500000,0.500000");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn empty_ledger_exports_header_only() {
        assert_eq!(export_trades_csv(&[]).unwrap().lines().count(), 1);
        assert_eq!(export_equity_csv(&[], &[]).unwrap().lines().count(), 1);
    }

    #[test]
    fn import_rejects_garbage() {
        assert!(import_json("{not json").is_err());
    }
}
