//! Deterministic synthetic prices for offline runs and demos.
//!
//! A random walk from 100.0 seeded by the BLAKE3 hash of the ticker, so the
//! same ticker and window always yield the same bars. Weekends are skipped.
//! Results built on synthetic data are tagged as such by the runner.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::warn;

use super::provider::{DataError, DataSource, FetchRequest, PriceProvider};
use crate::domain::{Bar, Series};

/// US regular session in UTC (14:30–21:00).
const SESSION_OPEN_MINUTES: u32 = 14 * 60 + 30;
const SESSION_CLOSE_MINUTES: u32 = 21 * 60;

#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticProvider {
    /// Half-width of the uniform per-bar return range. `None` picks a default
    /// per interval.
    volatility: Option<f64>,
}

impl SyntheticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the per-bar return range to `[-volatility, volatility)`.
    ///
    /// Must be finite and in `[0, 1)`; zero gives a flat series.
    pub fn with_volatility(mut self, volatility: f64) -> Result<Self, DataError> {
        if !volatility.is_finite() || !(0.0..1.0).contains(&volatility) {
            return Err(DataError::InvalidRequest(format!(
                "synthetic volatility must be in [0, 1), got {volatility}"
            )));
        }
        self.volatility = Some(volatility);
        Ok(self)
    }

    pub fn volatility(&self) -> Option<f64> {
        self.volatility
    }

    fn rng_for(ticker: &str) -> StdRng {
        let seed: [u8; 32] = *blake3::hash(ticker.as_bytes()).as_bytes();
        StdRng::from_seed(seed)
    }

    /// Trading days in the request window. Intraday requests cover the
    /// interval's lookback ending at `end`.
    fn trading_days(request: &FetchRequest) -> Vec<NaiveDate> {
        let start = if request.interval.is_intraday() {
            request.end - Duration::days(request.interval.lookback_days() - 1)
        } else {
            request.start
        };
        start
            .iter_days()
            .take_while(|d| *d <= request.end)
            .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
            .collect()
    }

    pub fn generate(&self, request: &FetchRequest) -> Vec<Bar> {
        let mut rng = Self::rng_for(&request.ticker);
        let vol = self
            .volatility
            .unwrap_or(if request.interval.is_intraday() { 0.003 } else { 0.03 });

        let mut timestamps = Vec::new();
        for day in Self::trading_days(request) {
            match request.interval.minutes() {
                None => timestamps.push(day.and_time(NaiveTime::MIN)),
                Some(step) => {
                    let mut minute = SESSION_OPEN_MINUTES;
                    while minute < SESSION_CLOSE_MINUTES {
                        if let Some(t) = NaiveTime::from_hms_opt(minute / 60, minute % 60, 0) {
                            timestamps.push(day.and_time(t));
                        }
                        minute += step;
                    }
                }
            }
        }

        let mut price = 100.0_f64;
        timestamps
            .into_iter()
            .map(|timestamp| {
                let ret = uniform(&mut rng, -vol, vol);
                let open = price;
                let close = price * (1.0 + ret);
                let high = open.max(close) * (1.0 + uniform(&mut rng, 0.0, vol / 3.0));
                let low = open.min(close) * (1.0 - uniform(&mut rng, 0.0, vol / 3.0));
                let volume = rng.gen_range(500_000..5_000_000u64);
                price = close;
                Bar {
                    symbol: request.ticker.clone(),
                    timestamp,
                    open,
                    high,
                    low,
                    close,
                    volume,
                }
            })
            .collect()
    }
}

/// Sample `[lo, hi)`, or `lo` when the range is empty.
fn uniform(rng: &mut StdRng, lo: f64, hi: f64) -> f64 {
    if hi > lo {
        rng.gen_range(lo..hi)
    } else {
        lo
    }
}

impl PriceProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn source(&self) -> DataSource {
        DataSource::Synthetic
    }

    fn fetch(&self, request: &FetchRequest) -> Result<Series, DataError> {
        warn!(
            ticker = %request.ticker,
            "generating synthetic data; results are not market data"
        );
        let series = Series::new(self.generate(request))?;
        if series.is_empty() {
            return Err(DataError::NoData {
                ticker: request.ticker.clone(),
            });
        }
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::Interval;

    fn january(ticker: &str) -> FetchRequest {
        FetchRequest::daily(
            ticker,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
    }

    #[test]
    fn synthetic_data_is_deterministic() {
        let provider = SyntheticProvider::new();
        let a = provider.generate(&january("SPY"));
        let b = provider.generate(&january("SPY"));
        assert_eq!(a, b);
        // 23 weekdays in January 2024.
        assert_eq!(a.len(), 23);
    }

    #[test]
    fn different_tickers_differ() {
        let provider = SyntheticProvider::new();
        let spy = provider.generate(&january("SPY"));
        let qqq = provider.generate(&january("QQQ"));
        assert_eq!(spy.len(), qqq.len());
        assert_ne!(spy[0].close, qqq[0].close);
    }

    #[test]
    fn bars_are_sane_and_ordered() {
        let series = SyntheticProvider::new().fetch(&january("AAPL")).unwrap();
        assert!(series.bars().iter().all(Bar::is_sane));
    }

    #[test]
    fn weekend_only_window_is_no_data() {
        let req = FetchRequest::daily(
            "SPY",
            NaiveDate::from_ymd_opt(2024, 1, 6).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
        );
        let err = SyntheticProvider::new().fetch(&req).unwrap_err();
        assert!(err.is_empty_result());
    }

    #[test]
    fn intraday_covers_lookback_sessions() {
        let mut req = january("SPY");
        req.interval = Interval::Min30;
        let bars = SyntheticProvider::new().generate(&req);
        // 13 half-hour bars per session.
        assert_eq!(bars.len() % 13, 0);
        assert!(bars.len() > 13 * 30);
        assert_eq!(bars[0].timestamp.time(), NaiveTime::from_hms_opt(14, 30, 0).unwrap());
    }

    #[test]
    fn zero_volatility_is_flat() {
        let provider = SyntheticProvider::new().with_volatility(0.0).unwrap();
        let series = provider.fetch(&january("SPY")).unwrap();
        assert_eq!(series.len(), 23);
        assert!(series.bars().iter().all(|b| b.close == 100.0 && b.high == 100.0));
    }

    #[test]
    fn rejects_out_of_range_volatility() {
        for vol in [-0.01, 1.0, f64::NAN, f64::INFINITY] {
            let err = SyntheticProvider::new().with_volatility(vol).unwrap_err();
            assert!(matches!(err, DataError::InvalidRequest(_)), "accepted {vol}");
        }
    }

    #[test]
    fn custom_volatility_stays_in_band() {
        let provider = SyntheticProvider::new().with_volatility(0.01).unwrap();
        assert_eq!(provider.volatility(), Some(0.01));
        let bars = provider.generate(&january("SPY"));
        for pair in bars.windows(2) {
            let ret = pair[1].close / pair[0].close - 1.0;
            assert!(ret.abs() <= 0.01 + 1e-12);
        }
    }
}
