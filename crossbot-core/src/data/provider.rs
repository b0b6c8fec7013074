//! Price provider trait, request type and structured error types.
//!
//! The PriceProvider trait abstracts over data sources (Yahoo Finance, CSV
//! import, synthetic) so the runner can swap implementations and tests can
//! work offline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::{Series, SeriesError};

/// Bar sampling interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Interval {
    #[default]
    Daily,
    Min1,
    Min5,
    Min15,
    Min30,
    Min60,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown interval '{0}' (expected one of 1d, 1m, 5m, 15m, 30m, 60m)")]
pub struct UnknownInterval(pub String);

impl Interval {
    pub const ALL: [Interval; 6] = [
        Interval::Daily,
        Interval::Min1,
        Interval::Min5,
        Interval::Min15,
        Interval::Min30,
        Interval::Min60,
    ];

    /// Provider-facing interval code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Daily => "1d",
            Interval::Min1 => "1m",
            Interval::Min5 => "5m",
            Interval::Min15 => "15m",
            Interval::Min30 => "30m",
            Interval::Min60 => "60m",
        }
    }

    pub fn is_intraday(&self) -> bool {
        !matches!(self, Interval::Daily)
    }

    /// Bar length in minutes for intraday intervals.
    pub fn minutes(&self) -> Option<u32> {
        match self {
            Interval::Daily => None,
            Interval::Min1 => Some(1),
            Interval::Min5 => Some(5),
            Interval::Min15 => Some(15),
            Interval::Min30 => Some(30),
            Interval::Min60 => Some(60),
        }
    }

    /// Fixed lookback period used instead of a date range for intraday data.
    pub fn lookback_range(&self) -> &'static str {
        lookback_range(self.as_str())
    }

    /// [`Interval::lookback_range`] in days.
    pub fn lookback_days(&self) -> i64 {
        self.lookback_range()
            .trim_end_matches('d')
            .parse()
            .unwrap_or(7)
    }
}

/// Lookback period for an intraday interval code; `7d` for anything unknown.
pub fn lookback_range(interval: &str) -> &'static str {
    match interval {
        "1m" => "7d",
        "5m" | "15m" | "30m" => "60d",
        "60m" => "730d",
        _ => "7d",
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = UnknownInterval;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1d" | "daily" => Ok(Interval::Daily),
            "1m" => Ok(Interval::Min1),
            "5m" => Ok(Interval::Min5),
            "15m" => Ok(Interval::Min15),
            "30m" => Ok(Interval::Min30),
            "60m" | "1h" => Ok(Interval::Min60),
            other => Err(UnknownInterval(other.to_string())),
        }
    }
}

impl TryFrom<String> for Interval {
    type Error = UnknownInterval;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Interval> for String {
    fn from(value: Interval) -> Self {
        value.as_str().to_string()
    }
}

/// What to fetch. `start`/`end` are inclusive calendar dates; intraday
/// providers may use [`Interval::lookback_range`] instead.
///
/// `end` being inclusive differs from downloaders that treat the end date as
/// exclusive (yfinance's `download(end=...)`): a daily Yahoo request runs to
/// 23:59:59 UTC on `end`, so the bar dated `end` is included when it exists.
/// Subtract a day from `end` to reproduce an exclusive-end window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub ticker: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub interval: Interval,
}

impl FetchRequest {
    pub fn daily(ticker: &str, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            ticker: ticker.to_string(),
            start,
            end,
            interval: Interval::Daily,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Structured error types for data operations.
///
/// `NoData` is kept apart from transport failures so callers can tell
/// "nothing to show" from "the fetch broke".
#[derive(Debug, Error)]
pub enum DataError {
    #[error("no data returned for '{ticker}'")]
    NoData { ticker: String },

    #[error("symbol not found: {ticker}")]
    SymbolNotFound { ticker: String },

    #[error("network unreachable: {0}")]
    Network(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("HTTP {status} fetching '{ticker}'")]
    Http { status: u16, ticker: String },

    #[error("response format changed: {0}")]
    ResponseFormat(String),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid series: {0}")]
    InvalidSeries(#[from] SeriesError),
}

impl DataError {
    /// True when the provider answered but had no bars to give.
    pub fn is_empty_result(&self) -> bool {
        matches!(
            self,
            DataError::NoData { .. } | DataError::SymbolNotFound { .. }
        )
    }
}

impl From<csv::Error> for DataError {
    fn from(e: csv::Error) -> Self {
        DataError::Csv(e.to_string())
    }
}

impl From<std::io::Error> for DataError {
    fn from(e: std::io::Error) -> Self {
        DataError::Io(e.to_string())
    }
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    YahooFinance,
    CsvImport,
    Synthetic,
}

/// Trait for price providers.
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    fn source(&self) -> DataSource;

    /// Fetch a chronologically ordered series.
    ///
    /// Returns `DataError::NoData` when the request is valid but yields no
    /// bars.
    fn fetch(&self, request: &FetchRequest) -> Result<Series, DataError>;
}
