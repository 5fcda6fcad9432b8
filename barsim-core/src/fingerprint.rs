//! Run fingerprinting — deterministic identification of a backtest run.
//!
//! - `ConfigHash`: BLAKE3 over the canonical JSON of a `RiskConfig`.
//! - `DatasetHash`: BLAKE3 over the bar series and its aligned signals.
//! - `RunId`: both hashes combined. Identical inputs always produce the same id.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::RiskConfig;
use crate::domain::{Bar, SignalRow};

/// Hash of a risk configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigHash(pub String);

impl ConfigHash {
    pub fn of(config: &RiskConfig) -> Self {
        // Struct fields serialize in declaration order, so the JSON is canonical.
        let json = serde_json::to_string(config).expect("RiskConfig must serialize");
        Self(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

impl fmt::Display for ConfigHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content hash of the bar series plus its signal table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetHash(pub String);

impl DatasetHash {
    pub fn of(bars: &[Bar], signals: &[SignalRow]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(bars.len() as u64).to_le_bytes());
        for bar in bars {
            hash_timestamp(&mut hasher, bar.timestamp);
            for v in [bar.open, bar.high, bar.low, bar.close, bar.volume] {
                hasher.update(&v.to_le_bytes());
            }
        }
        hasher.update(&(signals.len() as u64).to_le_bytes());
        for s in signals {
            hash_timestamp(&mut hasher, s.timestamp);
            hasher.update(&[
                s.long_entry as u8,
                s.short_entry as u8,
                s.in_window as u8,
                s.volatility_ok as u8,
            ]);
            for v in [s.atr, s.range_high, s.range_low, s.equilibrium] {
                match v {
                    Some(x) => {
                        hasher.update(&[1]);
                        hasher.update(&x.to_le_bytes());
                    }
                    None => {
                        hasher.update(&[0]);
                    }
                }
            }
        }
        Self(hasher.finalize().to_hex().to_string())
    }
}

/// Seconds plus the sub-second nanos, so bars closer than a second apart
/// still hash apart.
fn hash_timestamp(hasher: &mut blake3::Hasher, t: NaiveDateTime) {
    let utc = t.and_utc();
    hasher.update(&utc.timestamp().to_le_bytes());
    hasher.update(&utc.timestamp_subsec_nanos().to_le_bytes());
}

impl fmt::Display for DatasetHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deterministic run ID (config + dataset).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId {
    pub config_hash: ConfigHash,
    pub dataset_hash: DatasetHash,
}

impl RunId {
    pub fn new(config: &RiskConfig, bars: &[Bar], signals: &[SignalRow]) -> Self {
        Self {
            config_hash: ConfigHash::of(config),
            dataset_hash: DatasetHash::of(bars, signals),
        }
    }

    /// Single hex digest covering both halves of the id.
    pub fn hash(&self) -> String {
        let canonical = serde_json::json!({
            "config_hash": &self.config_hash.0,
            "dataset_hash": &self.dataset_hash.0,
        });
        blake3::hash(canonical.to_string().as_bytes())
            .to_hex()
            .to_string()
    }

    /// First 12 hex chars of `hash()`, for display.
    pub fn short(&self) -> String {
        self.hash()[..12].to_string()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hash())
    }
}
