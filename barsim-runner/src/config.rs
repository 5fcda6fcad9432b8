//! Serializable backtest configuration, read from TOML.
//!
//! ```toml
//! [backtest]
//! symbol = "BTCUSD"
//! data = "data/btcusd.csv"
//!
//! [risk]
//! position_size = 0.05
//! reward_multiples = [1.0, 2.0]
//! stop_basis = "ATR_MULTIPLE"
//!
//! [risk.trading_window]
//! start = "13:00:00"
//! end = "17:00:00"
//! ```

use std::path::{Path, PathBuf};

use barsim_core::config::{ConfigError, RiskConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reading or validating a configuration file.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid risk configuration: {0}")]
    Invalid(#[from] ConfigError),
}

/// `[backtest]` table: what to run on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSection {
    pub symbol: String,
    /// Combined bar/signal CSV. Optional; the CLI can override it.
    #[serde(default)]
    pub data: Option<PathBuf>,
}

/// Complete configuration for a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    #[serde(default)]
    pub risk: RiskConfig,
}

impl BacktestConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigFileError> {
        let config: BacktestConfig = toml::from_str(content)?;
        config.risk.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a TOML file. A relative `data` path is
    /// resolved against the config file's directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigFileError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config = Self::from_toml(&content)?;
        if let (Some(data), Some(dir)) = (config.backtest.data.as_ref(), path.parent()) {
            if data.is_relative() {
                config.backtest.data = Some(dir.join(data));
            }
        }
        Ok(config)
    }

    /// A config for `symbol` with default risk settings and no data path.
    pub fn with_defaults(symbol: impl Into<String>) -> Self {
        Self {
            backtest: BacktestSection {
                symbol: symbol.into(),
                data: None,
            },
            risk: RiskConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use barsim_core::config::{SignalConflict, StopBasis};
    use chrono::NaiveTime;

    const FULL: &str = r#"
[backtest]
symbol = "BTCUSD"
data = "data/btcusd.csv"

[risk]
position_size = 0.05
reward_multiples = [1.0, 2.0]
partial_fraction = 0.5
stop_basis = "FIXED_RANGE"
atr_multiplier = 1.5
max_daily_loss = 1.0
max_trades_per_day = 2
signal_conflict = "PREFER_LONG"
require_volatility_ok = false
close_at_day_end = true
cost_per_leg = 0.01

[risk.trading_window]
start = "13:00:00"
end = "17:00:00"
"#;

    #[test]
    fn parses_full_config() {
        let cfg = BacktestConfig::from_toml(FULL).unwrap();
        assert_eq!(cfg.backtest.symbol, "BTCUSD");
        assert_eq!(cfg.backtest.data, Some(PathBuf::from("data/btcusd.csv")));
        assert_eq!(cfg.risk.position_size, 0.05);
        assert_eq!(cfg.risk.stop_basis, StopBasis::FixedRange);
        assert_eq!(cfg.risk.max_trades_per_day, Some(2));
        assert_eq!(cfg.risk.signal_conflict, SignalConflict::PreferLong);
        assert!(cfg.risk.close_at_day_end);
        let window = cfg.risk.trading_window.unwrap();
        assert_eq!(window.start, NaiveTime::from_hms_opt(13, 0, 0).unwrap());
        assert_eq!(window.end, NaiveTime::from_hms_opt(17, 0, 0).unwrap());
    }

    #[test]
    fn risk_table_is_optional() {
        let cfg = BacktestConfig::from_toml("[backtest]\nsymbol = \"ES\"\n").unwrap();
        assert_eq!(cfg.risk, RiskConfig::default());
        assert!(cfg.backtest.data.is_none());
    }

    #[test]
    fn invalid_risk_is_rejected() {
        let toml = "[backtest]\nsymbol = \"ES\"\n[risk]\npartial_fraction = 1.5\n";
        assert!(matches!(
            BacktestConfig::from_toml(toml),
            Err(ConfigFileError::Invalid(ConfigError::PartialFractionOutOfRange(_)))
        ));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        assert!(matches!(
            BacktestConfig::from_toml("[backtest\nsymbol="),
            Err(ConfigFileError::Parse(_))
        ));
    }

    #[test]
    fn unknown_stop_basis_is_parse_error() {
        let toml = "[backtest]\nsymbol = \"ES\"\n[risk]\nstop_basis = \"TRAILING\"\n";
        assert!(matches!(
            BacktestConfig::from_toml(toml),
            Err(ConfigFileError::Parse(_))
        ));
    }
}
