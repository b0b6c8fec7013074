//! Imminent-signal detection: would a trade fire on the most recent bar?
//!
//! Looks only at the last bar's transition and the holding state carried into
//! that bar. The simulator's final holding flag already includes any trade
//! taken on the last bar, so it is not used here.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::signal::{AnnotatedSeries, Position};

/// What the latest bar says to do now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImminentSignal {
    /// Fewer than two bars; no transition can be evaluated.
    NoData,
    Buy {
        ticker: String,
        timestamp: NaiveDateTime,
        price: f64,
    },
    Sell {
        ticker: String,
        timestamp: NaiveDateTime,
        price: f64,
    },
    None,
}

impl ImminentSignal {
    pub fn is_actionable(&self) -> bool {
        matches!(self, ImminentSignal::Buy { .. } | ImminentSignal::Sell { .. })
    }
}

impl fmt::Display for ImminentSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImminentSignal::NoData => f.write_str("No data available for imminent signal check."),
            ImminentSignal::Buy {
                ticker,
                timestamp,
                price,
            } => write!(f, "{ticker} Buy signal at {timestamp}: {price:.2}"),
            ImminentSignal::Sell {
                ticker,
                timestamp,
                price,
            } => write!(f, "{ticker} Sell signal at {timestamp}: {price:.2}"),
            ImminentSignal::None => f.write_str("No imminent trade signal."),
        }
    }
}

/// Report a Buy if the last bar is an Entry and the book came into it flat,
/// a Sell if it is an Exit and the book came into it long, otherwise nothing.
pub fn detect(
    annotated: &AnnotatedSeries,
    holding_before_last_bar: bool,
    ticker: &str,
) -> ImminentSignal {
    if annotated.len() < 2 {
        return ImminentSignal::NoData;
    }
    let Some((bar, row)) = annotated.last() else {
        return ImminentSignal::NoData;
    };

    match (row.position, holding_before_last_bar) {
        (Position::Entry, false) => ImminentSignal::Buy {
            ticker: ticker.to_string(),
            timestamp: bar.timestamp,
            price: bar.close,
        },
        (Position::Exit, true) => ImminentSignal::Sell {
            ticker: ticker.to_string(),
            timestamp: bar.timestamp,
            price: bar.close,
        },
        _ => ImminentSignal::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Series;
    use crate::indicators::make_series;
    use crate::signal::MaCrossover;

    #[test]
    fn entry_on_last_bar_reports_buy() {
        let annotated = MaCrossover::new(2, 4).annotate(make_series(&[10.0, 10.0, 10.0, 10.0, 10.0, 12.0]));
        let signal = detect(&annotated, false, "AAPL");
        assert_eq!(
            signal.to_string(),
            "AAPL Buy signal at 2024-01-07 00:00:00: 12.00"
        );
        assert!(signal.is_actionable());
    }

    #[test]
    fn entry_while_already_holding_is_ignored() {
        let annotated = MaCrossover::new(2, 4).annotate(make_series(&[10.0, 10.0, 10.0, 10.0, 10.0, 12.0]));
        assert_eq!(detect(&annotated, true, "AAPL"), ImminentSignal::None);
    }

    #[test]
    fn exit_on_last_bar_reports_sell() {
        let annotated =
            MaCrossover::new(2, 3).annotate(make_series(&[10.0, 10.0, 10.0, 12.0, 14.0, 12.0, 8.0]));
        let signal = detect(&annotated, true, "AAPL");
        assert!(matches!(signal, ImminentSignal::Sell { price, .. } if price == 8.0));
        assert_eq!(detect(&annotated, false, "AAPL"), ImminentSignal::None);
    }

    #[test]
    fn hold_on_last_bar_reports_nothing() {
        let annotated = MaCrossover::new(2, 4).annotate(make_series(&[10.0; 8]));
        let signal = detect(&annotated, false, "AAPL");
        assert_eq!(signal, ImminentSignal::None);
        assert_eq!(signal.to_string(), "No imminent trade signal.");
    }

    #[test]
    fn fewer_than_two_bars_is_no_data() {
        let one = MaCrossover::new(1, 2).annotate(make_series(&[10.0]));
        assert_eq!(detect(&one, false, "AAPL"), ImminentSignal::NoData);
        let none = MaCrossover::new(1, 2).annotate(Series::default());
        assert_eq!(detect(&none, true, "AAPL"), ImminentSignal::NoData);
        assert!(!ImminentSignal::NoData.is_actionable());
    }
}
