//! TOML backtest configuration.
//!
//! ```toml
//! [backtest]
//! ticker = "AAPL"
//! start_date = "2023-01-01"
//! end_date = "2023-12-31"
//! interval = "1d"
//! initial_capital = 10000.0
//!
//! [strategy]
//! short_window = 50
//! long_window = 200
//! take_profit_pct = 15.0   # optional
//! ```
//!
//! Every field has a default, so an empty file is a valid config: AAPL over
//! the last 365 days on daily bars with a 50/200 crossover and 10 000 capital.

use std::path::Path;

use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crossbot_core::data::{FetchRequest, Interval};
use crossbot_core::{BacktestParams, ParamError};

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

pub const DEFAULT_TICKER: &str = "AAPL";
pub const DEFAULT_LOOKBACK_DAYS: i64 = 365;
pub const DEFAULT_SHORT_WINDOW: usize = 50;
pub const DEFAULT_LONG_WINDOW: usize = 200;
pub const DEFAULT_CAPITAL: f64 = 10_000.0;

/// Errors from loading or validating a config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("start date {start} is after end date {end}")]
    DateRange { start: NaiveDate, end: NaiveDate },

    #[error("invalid parameters: {0}")]
    Params(#[from] ParamError),
}

/// Top-level config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BacktestConfig {
    #[serde(default)]
    pub backtest: BacktestSection,
    #[serde(default)]
    pub strategy: StrategySection,
}

/// `[backtest]`: what to test and over which range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSection {
    pub ticker: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub interval: Interval,
    pub initial_capital: f64,
}

impl Default for BacktestSection {
    fn default() -> Self {
        let end_date = Local::now().date_naive();
        Self {
            ticker: DEFAULT_TICKER.to_string(),
            start_date: end_date - Duration::days(DEFAULT_LOOKBACK_DAYS),
            end_date,
            interval: Interval::Daily,
            initial_capital: DEFAULT_CAPITAL,
        }
    }
}

/// `[strategy]`: crossover windows and the optional take-profit exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategySection {
    pub short_window: usize,
    pub long_window: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit_pct: Option<f64>,
}

impl Default for StrategySection {
    fn default() -> Self {
        Self {
            short_window: DEFAULT_SHORT_WINDOW,
            long_window: DEFAULT_LONG_WINDOW,
            take_profit_pct: None,
        }
    }
}

impl BacktestConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Check the date range and the strategy parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bt = &self.backtest;
        if bt.start_date > bt.end_date {
            return Err(ConfigError::DateRange {
                start: bt.start_date,
                end: bt.end_date,
            });
        }
        self.to_params().validate()?;
        Ok(())
    }

    /// Core pipeline parameters. The ticker is upper-cased.
    pub fn to_params(&self) -> BacktestParams {
        BacktestParams {
            ticker: self.ticker(),
            short_window: self.strategy.short_window,
            long_window: self.strategy.long_window,
            initial_capital: self.backtest.initial_capital,
            take_profit_pct: self.strategy.take_profit_pct,
        }
    }

    /// Provider request covering the configured range.
    pub fn fetch_request(&self) -> FetchRequest {
        FetchRequest {
            ticker: self.ticker(),
            start: self.backtest.start_date,
            end: self.backtest.end_date,
            interval: self.backtest.interval,
        }
    }

    pub fn ticker(&self) -> String {
        self.backtest.ticker.trim().to_uppercase()
    }

    /// Deterministic hash of this configuration.
    ///
    /// Two runs with identical configs share a RunId.
    pub fn run_id(&self) -> RunId {
        // Struct of plain fields: serialization cannot fail.
        let json = serde_json::to_string(self).unwrap_or_default();
        let hash = blake3::hash(json.as_bytes());
        format!("{}", hash.to_hex())
    }
}
