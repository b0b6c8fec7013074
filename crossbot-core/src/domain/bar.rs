//! Bar: one sample of a price series.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single symbol at a single timestamp.
///
/// Daily bars carry a midnight timestamp; intraday bars carry the bar open
/// time in UTC. Only `close` feeds the signal; the other fields are kept for
/// charting and CSV round-trips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Build a daily bar where every price field equals `close`.
    pub fn daily(symbol: &str, date: NaiveDate, close: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            timestamp: date.and_time(chrono::NaiveTime::MIN),
            open: close,
            high: close,
            low: close,
            close,
            volume: 0,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// Basic OHLC sanity check: high >= low, high/low bracket open and close,
    /// and the close is a positive finite number.
    pub fn is_sane(&self) -> bool {
        if !self.close.is_finite() || self.close <= 0.0 {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> Bar {
        Bar {
            symbol: "AAPL".into(),
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
            volume: 50_000,
        }
    }

    #[test]
    fn bar_is_sane() {
        assert!(sample_bar().is_sane());
    }

    #[test]
    fn bar_detects_insane_high_low() {
        let mut bar = sample_bar();
        bar.high = 97.0;
        assert!(!bar.is_sane());
    }

    #[test]
    fn bar_rejects_non_positive_close() {
        let mut bar = sample_bar();
        bar.close = 0.0;
        bar.low = 0.0;
        assert!(!bar.is_sane());
    }

    #[test]
    fn daily_bar_is_midnight() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let bar = Bar::daily("SPY", date, 10.0);
        assert_eq!(bar.date(), date);
        assert_eq!(bar.timestamp.time(), chrono::NaiveTime::MIN);
        assert!(bar.is_sane());
    }
}
