//! Yahoo Finance price provider.
//!
//! Fetches bars from Yahoo's v8 chart API. Daily requests use an explicit
//! `period1`/`period2` window; intraday requests use the interval's fixed
//! lookback `range`. Retries with exponential backoff on rate limits, server
//! errors and connection failures.
//!
//! Yahoo Finance has no official API and is subject to unannounced format
//! changes. The CSV provider is the fallback when Yahoo is unavailable.

use chrono::{DateTime, NaiveDate, NaiveTime};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::provider::{DataError, DataSource, FetchRequest, PriceProvider};
use crate::domain::{Bar, Series};

const BASE_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

/// Yahoo Finance price provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new() -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    /// Override the retry budget (attempts after the first) and backoff base.
    pub fn with_retry_policy(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_delay = base_delay;
        self
    }

    /// Point the provider at a different host (mirrors, local stubs).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build the chart API URL for a request.
    fn chart_url(&self, request: &FetchRequest) -> String {
        let symbol = &request.ticker;
        let interval = request.interval.as_str();
        if request.interval.is_intraday() {
            let range = request.interval.lookback_range();
            format!(
                "{}/{symbol}?range={range}&interval={interval}",
                self.base_url
            )
        } else {
            let (start_ts, end_ts) = day_bounds(request.start, request.end);
            format!(
                "{}/{symbol}?period1={start_ts}&period2={end_ts}&interval={interval}",
                self.base_url
            )
        }
    }

    /// Parse the chart API response into bars for `ticker`.
    fn parse_response(ticker: &str, resp: ChartResponse) -> Result<Vec<Bar>, DataError> {
        let result = match (resp.chart.result, resp.chart.error) {
            (Some(result), _) => result,
            (None, Some(err)) if err.code == "Not Found" => {
                return Err(DataError::SymbolNotFound {
                    ticker: ticker.to_string(),
                })
            }
            (None, Some(err)) => {
                return Err(DataError::ResponseFormat(format!(
                    "{}: {}",
                    err.code, err.description
                )))
            }
            (None, None) => {
                return Err(DataError::ResponseFormat("empty result with no error".into()))
            }
        };

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormat("result array is empty".into()))?;

        // Yahoo omits timestamps entirely when the window has no trading.
        let Some(timestamps) = data.timestamp else {
            return Ok(Vec::new());
        };

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormat("no quote data".into()))?;

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let timestamp = DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.naive_utc())
                .ok_or_else(|| DataError::ResponseFormat(format!("invalid timestamp: {ts}")))?;

            // Rows without a close are holidays or halted sessions.
            let Some(close) = quote.close.get(i).copied().flatten() else {
                continue;
            };
            let open = quote.open.get(i).copied().flatten().unwrap_or(close);
            let high = quote.high.get(i).copied().flatten().unwrap_or(close);
            let low = quote.low.get(i).copied().flatten().unwrap_or(close);
            let volume = quote.volume.get(i).copied().flatten().unwrap_or(0);

            bars.push(Bar {
                symbol: ticker.to_string(),
                timestamp,
                open,
                high,
                low,
                close,
                volume,
            });
        }

        Ok(bars)
    }

    /// Execute the request, retrying transient failures with exponential backoff.
    fn fetch_with_retry(&self, request: &FetchRequest) -> Result<Vec<Bar>, DataError> {
        let ticker = &request.ticker;
        let url = self.chart_url(request);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(self.base_delay, attempt);
                warn!(ticker = %ticker, attempt, ?delay, "retrying Yahoo request");
                std::thread::sleep(delay);
            }

            debug!(%url, "GET");
            let resp = match self.client.get(&url).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = Some(DataError::Network(e.to_string()));
                    continue;
                }
                Err(e) => return Err(DataError::Network(e.to_string())),
            };

            let status = resp.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                let retry_after = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                last_error = Some(DataError::RateLimited {
                    retry_after_secs: retry_after,
                });
                continue;
            }

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(DataError::SymbolNotFound {
                    ticker: ticker.clone(),
                });
            }

            if status.is_server_error() {
                last_error = Some(DataError::Http {
                    status: status.as_u16(),
                    ticker: ticker.clone(),
                });
                continue;
            }

            if !status.is_success() {
                return Err(DataError::Http {
                    status: status.as_u16(),
                    ticker: ticker.clone(),
                });
            }

            let chart: ChartResponse = resp.json().map_err(|e| {
                DataError::ResponseFormat(format!("failed to parse response for {ticker}: {e}"))
            })?;
            return Self::parse_response(ticker, chart);
        }

        Err(last_error.unwrap_or_else(|| DataError::Network("max retries exceeded".into())))
    }
}

/// `base * 2^(attempt - 1)`, saturating instead of overflowing.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
}

/// Unix seconds for the start of `start` and the last second of `end` (UTC).
fn day_bounds(start: NaiveDate, end: NaiveDate) -> (i64, i64) {
    let start_ts = start.and_time(NaiveTime::MIN).and_utc().timestamp();
    let end_ts = end.and_time(NaiveTime::MIN).and_utc().timestamp() + 86_399;
    (start_ts, end_ts)
}

impl PriceProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn source(&self) -> DataSource {
        DataSource::YahooFinance
    }

    fn fetch(&self, request: &FetchRequest) -> Result<Series, DataError> {
        let bars = self.fetch_with_retry(request)?;
        if bars.is_empty() {
            return Err(DataError::NoData {
                ticker: request.ticker.clone(),
            });
        }
        let series = Series::from_unsorted(bars)?;
        if series.is_empty() {
            return Err(DataError::NoData {
                ticker: request.ticker.clone(),
            });
        }
        info!(
            ticker = %request.ticker,
            interval = %request.interval,
            bars = series.len(),
            "fetched from Yahoo Finance"
        );
        Ok(series)
    }
}
