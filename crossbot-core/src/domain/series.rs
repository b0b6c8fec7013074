//! Series: a validated, chronologically ordered sequence of bars.

use chrono::NaiveDateTime;
use thiserror::Error;

use super::Bar;

/// Reasons a bar sequence cannot become a [`Series`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("bar {index} at {timestamp} is not after the previous bar")]
    NotIncreasing {
        index: usize,
        timestamp: NaiveDateTime,
    },

    #[error("bar {index} at {timestamp} has invalid close {close}")]
    InvalidClose {
        index: usize,
        timestamp: NaiveDateTime,
        close: f64,
    },
}

/// An immutable price series.
///
/// Invariants, checked once in [`Series::new`]:
/// - timestamps are unique and strictly increasing
/// - every close is finite and positive
///
/// An empty series is valid; the pipeline defines its behavior on it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Series {
    bars: Vec<Bar>,
}

impl Series {
    pub fn new(bars: Vec<Bar>) -> Result<Self, SeriesError> {
        for (index, bar) in bars.iter().enumerate() {
            if !bar.close.is_finite() || bar.close <= 0.0 {
                return Err(SeriesError::InvalidClose {
                    index,
                    timestamp: bar.timestamp,
                    close: bar.close,
                });
            }
            if index > 0 && bar.timestamp <= bars[index - 1].timestamp {
                return Err(SeriesError::NotIncreasing {
                    index,
                    timestamp: bar.timestamp,
                });
            }
        }
        Ok(Self { bars })
    }

    /// Sort by timestamp, drop duplicate timestamps (keeping the last) and
    /// bars without a usable close, then validate.
    ///
    /// Providers call this on raw payloads before handing a series out.
    pub fn from_unsorted(mut bars: Vec<Bar>) -> Result<Self, SeriesError> {
        bars.retain(|b| b.close.is_finite() && b.close > 0.0);
        bars.sort_by_key(|b| b.timestamp);
        let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(prev) if prev.timestamp == bar.timestamp => *prev = bar,
                _ => deduped.push(bar),
            }
        }
        Self::new(deduped)
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Whole calendar days between the first and last bar (floor of the
    /// elapsed time). Zero for fewer than two bars.
    pub fn span_days(&self) -> i64 {
        match (self.bars.first(), self.bars.last()) {
            (Some(first), Some(last)) => (last.timestamp - first.timestamp).num_days(),
            _ => 0,
        }
    }

    pub fn into_bars(self) -> Vec<Bar> {
        self.bars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar_on(day: u32, close: f64) -> Bar {
        Bar::daily("TEST", NaiveDate::from_ymd_opt(2024, 1, day).unwrap(), close)
    }

    #[test]
    fn accepts_increasing_positive_bars() {
        let series = Series::new(vec![bar_on(2, 10.0), bar_on(3, 11.0)]).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.closes(), vec![10.0, 11.0]);
    }

    #[test]
    fn rejects_duplicate_timestamps() {
        let err = Series::new(vec![bar_on(2, 10.0), bar_on(2, 11.0)]).unwrap_err();
        assert!(matches!(err, SeriesError::NotIncreasing { index: 1, .. }));
    }

    #[test]
    fn rejects_non_positive_close() {
        let err = Series::new(vec![bar_on(2, 10.0), bar_on(3, -1.0)]).unwrap_err();
        assert!(matches!(err, SeriesError::InvalidClose { index: 1, .. }));
    }

    #[test]
    fn rejects_nan_close() {
        let err = Series::new(vec![bar_on(2, f64::NAN)]).unwrap_err();
        assert!(matches!(err, SeriesError::InvalidClose { index: 0, .. }));
    }

    #[test]
    fn from_unsorted_sorts_and_dedups() {
        let series = Series::from_unsorted(vec![
            bar_on(4, 12.0),
            bar_on(2, 10.0),
            bar_on(3, f64::NAN),
            bar_on(4, 13.0),
        ])
        .unwrap();
        assert_eq!(series.closes(), vec![10.0, 13.0]);
    }

    #[test]
    fn span_days_counts_calendar_days() {
        let series = Series::new(vec![bar_on(2, 10.0), bar_on(9, 11.0)]).unwrap();
        assert_eq!(series.span_days(), 7);
    }

    #[test]
    fn span_days_is_zero_for_short_series() {
        assert_eq!(Series::default().span_days(), 0);
        let one = Series::new(vec![bar_on(2, 10.0)]).unwrap();
        assert_eq!(one.span_days(), 0);
    }

    #[test]
    fn span_days_floors_partial_days() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let mut a = Bar::daily("TEST", date, 10.0);
        let mut b = Bar::daily("TEST", date, 11.0);
        a.timestamp = date.and_hms_opt(9, 30, 0).unwrap();
        b.timestamp = date.and_hms_opt(15, 55, 0).unwrap();
        let series = Series::new(vec![a, b]).unwrap();
        assert_eq!(series.span_days(), 0);
    }
}
