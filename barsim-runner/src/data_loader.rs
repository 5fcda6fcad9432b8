//! Bar and signal loading for the runner.
//!
//! A series file is a single CSV whose rows carry the bar columns
//! (`timestamp, open, high, low, close, volume`) and, optionally, the
//! precomputed signal columns (`long_entry, short_entry, in_window,
//! volatility_ok, atr, range_high, range_low, equilibrium`).
//!
//! Missing signal columns take neutral defaults: no entry flags, window
//! open, volatility ok, numeric context absent. Empty cells and `NaN` are
//! read as absent.

use std::io::Read;
use std::path::Path;

use barsim_core::domain::{Bar, SignalRow};
use barsim_core::fingerprint::DatasetHash;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: unrecognized timestamp '{value}'")]
    Timestamp { row: usize, value: String },

    #[error("row {row}: column '{column}' is not a boolean: '{value}'")]
    Bool {
        row: usize,
        column: &'static str,
        value: String,
    },
}

/// A bar series with its aligned signal table.
#[derive(Debug, Clone, Default)]
pub struct LoadedSeries {
    pub bars: Vec<Bar>,
    pub signals: Vec<SignalRow>,
    /// True when the series came from the synthetic generator.
    pub synthetic: bool,
}

impl LoadedSeries {
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn dataset_hash(&self) -> DatasetHash {
        DatasetHash::of(&self.bars, &self.signals)
    }
}

/// One CSV row as written on disk.
#[derive(Debug, Deserialize)]
struct SeriesRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: Option<f64>,
    #[serde(default)]
    long_entry: Option<String>,
    #[serde(default)]
    short_entry: Option<String>,
    #[serde(default)]
    in_window: Option<String>,
    #[serde(default)]
    volatility_ok: Option<String>,
    #[serde(default)]
    atr: Option<f64>,
    #[serde(default)]
    range_high: Option<f64>,
    #[serde(default)]
    range_low: Option<f64>,
    #[serde(default)]
    equilibrium: Option<f64>,
}

/// Load a series from a CSV file on disk.
pub fn load_series(path: &Path) -> Result<LoadedSeries, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let series = load_series_from_reader(file)?;
    debug!(path = %path.display(), bars = series.len(), "series loaded");
    Ok(series)
}

/// Load a series from any CSV reader.
///
/// Row order is preserved as-is; ordering and alignment are checked by the
/// engine, not here.
pub fn load_series_from_reader<R: Read>(reader: R) -> Result<LoadedSeries, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut series = LoadedSeries::default();
    for (i, record) in rdr.deserialize::<SeriesRow>().enumerate() {
        // Header is line 1.
        let row = i + 2;
        let raw = record?;
        let timestamp = parse_timestamp(&raw.timestamp).ok_or_else(|| LoadError::Timestamp {
            row,
            value: raw.timestamp.clone(),
        })?;

        series.bars.push(Bar {
            timestamp,
            open: raw.open,
            high: raw.high,
            low: raw.low,
            close: raw.close,
            volume: raw.volume.unwrap_or(0.0),
        });
        series.signals.push(SignalRow {
            timestamp,
            long_entry: parse_flag(row, "long_entry", raw.long_entry.as_deref(), false)?,
            short_entry: parse_flag(row, "short_entry", raw.short_entry.as_deref(), false)?,
            in_window: parse_flag(row, "in_window", raw.in_window.as_deref(), true)?,
            volatility_ok: parse_flag(row, "volatility_ok", raw.volatility_ok.as_deref(), true)?,
            atr: finite(raw.atr),
            range_high: finite(raw.range_high),
            range_low: finite(raw.range_low),
            equilibrium: finite(raw.equilibrium),
        });
    }
    Ok(series)
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Accepts `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` (optionally with
/// fractional seconds), or a bare `YYYY-MM-DD` (midnight).
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_flag(
    row: usize,
    column: &'static str,
    value: Option<&str>,
    default: bool,
) -> Result<bool, LoadError> {
    match value.map(str::trim) {
        None | Some("") => Ok(default),
        Some(v) => match v.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(LoadError::Bool {
                row,
                column,
                value: v.to_string(),
            }),
        },
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bars_only_file_gets_neutral_signals() {
        let csv = "timestamp,open,high,low,close,volume\n\
                   2024-03-04 13:00:00,100,101,99,100.5,10\n\
                   2024-03-04 13:05:00,100.5,102,100,101,12\n";
        let series = load_series_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(series.len(), 2);
        let s = &series.signals[0];
        assert!(!s.long_entry && !s.short_entry);
        assert!(s.in_window && s.volatility_ok);
        assert!(s.atr.is_none());
        assert_eq!(series.bars[1].close, 101.0);
        assert!(!series.synthetic);
    }

    #[test]
    fn signal_columns_are_read() {
        let csv = "timestamp,open,high,low,close,volume,long_entry,short_entry,in_window,volatility_ok,atr,range_high,range_low,equilibrium\n\
                   2024-03-04T13:00:00,100,101,99,100.5,10,1,0,true,FALSE,1.25,102,98,100\n\
                   2024-03-04T13:05:00,100,101,99,100.5,10,0,1,0,1,NaN,,,\n";
        let series = load_series_from_reader(csv.as_bytes()).unwrap();
        let first = &series.signals[0];
        assert!(first.long_entry);
        assert!(!first.short_entry);
        assert!(first.in_window);
        assert!(!first.volatility_ok);
        assert_eq!(first.atr, Some(1.25));
        assert_eq!(first.range_low, Some(98.0));

        let second = &series.signals[1];
        assert!(second.short_entry);
        assert!(!second.in_window);
        assert!(second.atr.is_none());
        assert!(second.range_high.is_none());
    }

    #[test]
    fn timestamp_formats() {
        assert!(parse_timestamp("2024-03-04 13:00:00").is_some());
        assert!(parse_timestamp("2024-03-04T13:00:00").is_some());
        assert!(parse_timestamp("2024-03-04T13:00:00.250").is_some());
        assert!(parse_timestamp("2024-03-04 13:00").is_some());
        assert_eq!(
            parse_timestamp("2024-03-04"),
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap().and_hms_opt(0, 0, 0)
        );
        assert!(parse_timestamp("03/04/2024").is_none());
    }

    #[test]
    fn bad_timestamp_reports_row() {
        let csv = "timestamp,open,high,low,close\n\
                   2024-03-04,1,1,1,1\n\
                   yesterday,1,1,1,1\n";
        match load_series_from_reader(csv.as_bytes()) {
            Err(LoadError::Timestamp { row, value }) => {
                assert_eq!(row, 3);
                assert_eq!(value, "yesterday");
            }
            other => panic!("expected timestamp error, got {other:?}"),
        }
    }

    #[test]
    fn bad_flag_is_rejected() {
        let csv = "timestamp,open,high,low,close,long_entry\n\
                   2024-03-04,1,1,1,1,maybe\n";
        assert!(matches!(
            load_series_from_reader(csv.as_bytes()),
            Err(LoadError::Bool { column: "long_entry", .. })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_series(Path::new("/nonexistent/series.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
