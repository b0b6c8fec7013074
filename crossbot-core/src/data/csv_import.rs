//! CSV price provider and writer.
//!
//! Reads the column layout produced by common exporters (yfinance, most
//! brokers): a `Date` or `Datetime` column plus `Open,High,Low,Close,Volume`.
//! Extra columns such as `Adj Close` are ignored. Newer yfinance exports put
//! the dates under a `Price` header followed by `Ticker` and `Date` rows; rows
//! whose timestamp or close does not parse are skipped, which drops those
//! secondary header rows.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::provider::{DataError, DataSource, FetchRequest, PriceProvider};
use crate::domain::{Bar, Series};

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(
        alias = "Date",
        alias = "Datetime",
        alias = "date",
        alias = "datetime",
        alias = "Price"
    )]
    timestamp: String,
    #[serde(alias = "Open", default)]
    open: Option<f64>,
    #[serde(alias = "High", default)]
    high: Option<f64>,
    #[serde(alias = "Low", default)]
    low: Option<f64>,
    #[serde(alias = "Close")]
    close: Option<f64>,
    #[serde(alias = "Volume", default)]
    volume: Option<f64>,
}

/// Reads bars from `{root}/{TICKER}.csv`, or from `root` itself when it is a file.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    root: PathBuf,
}

impl CsvProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, ticker: &str) -> PathBuf {
        if self.root.is_file() {
            self.root.clone()
        } else {
            self.root.join(format!("{ticker}.csv"))
        }
    }
}

impl PriceProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv_import"
    }

    fn source(&self) -> DataSource {
        DataSource::CsvImport
    }

    fn fetch(&self, request: &FetchRequest) -> Result<Series, DataError> {
        let path = self.path_for(&request.ticker);
        if !path.exists() {
            debug!(path = %path.display(), "no CSV file for ticker");
            return Err(DataError::NoData {
                ticker: request.ticker.clone(),
            });
        }

        let file = std::fs::File::open(&path)?;
        let bars: Vec<Bar> = read_bars(file, &request.ticker)?
            .into_iter()
            .filter(|b| request.contains(b.date()))
            .collect();

        let series = Series::from_unsorted(bars)?;
        if series.is_empty() {
            return Err(DataError::NoData {
                ticker: request.ticker.clone(),
            });
        }
        info!(
            ticker = %request.ticker,
            path = %path.display(),
            bars = series.len(),
            "loaded CSV"
        );
        Ok(series)
    }
}

/// Parse every usable row of a CSV document into bars for `ticker`.
pub fn read_bars<R: Read>(reader: R, ticker: &str) -> Result<Vec<Bar>, DataError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let mut bars = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let row: CsvRow = match record.deserialize(Some(&headers)) {
            Ok(row) => row,
            Err(e) => {
                debug!(error = %e, "skipping unreadable CSV row");
                continue;
            }
        };
        let (Some(timestamp), Some(close)) = (parse_timestamp(&row.timestamp), row.close) else {
            continue;
        };
        bars.push(Bar {
            symbol: ticker.to_string(),
            timestamp,
            open: row.open.unwrap_or(close),
            high: row.high.unwrap_or(close),
            low: row.low.unwrap_or(close),
            close,
            volume: row.volume.map(|v| v.max(0.0) as u64).unwrap_or(0),
        });
    }
    Ok(bars)
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`, and RFC 3339 / offset forms
/// (converted to UTC).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Write a series in the layout [`CsvProvider`] reads back.
pub fn write_series_csv<W: Write>(series: &Series, writer: W) -> Result<(), DataError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["Datetime", "Open", "High", "Low", "Close", "Volume"])?;
    for bar in series.bars() {
        wtr.write_record([
            bar.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Convenience for tests and the CLI: write `series` to `path`.
pub fn write_series_file(series: &Series, path: &Path) -> Result<(), DataError> {
    let file = std::fs::File::create(path)?;
    write_series_csv(series, file)
}
