//! Dual moving-average crossover.
//!
//! The signal is Long while the short SMA is strictly above the long SMA and
//! Flat otherwise, including every bar where either average is still warming
//! up. Entry/Exit mark the bars where the signal flips.

use tracing::debug;

use super::{AnnotatedSeries, Position, Signal, SignalRow};
use crate::domain::Series;
use crate::indicators::Sma;

/// Moving average crossover signal generator.
///
/// `short_window < long_window` is the usual setup but is not required; with
/// the windows swapped the signal simply inverts its meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaCrossover {
    pub short_window: usize,
    pub long_window: usize,
}

impl MaCrossover {
    pub fn new(short_window: usize, long_window: usize) -> Self {
        assert!(short_window >= 1, "short_window must be >= 1");
        assert!(long_window >= 1, "long_window must be >= 1");
        Self {
            short_window,
            long_window,
        }
    }

    pub fn default_params() -> Self {
        Self::new(50, 200)
    }

    pub fn name(&self) -> &str {
        "ma_crossover"
    }

    /// Bars needed before the signal can be Long.
    pub fn warmup_bars(&self) -> usize {
        self.short_window.max(self.long_window)
    }

    /// Annotate `series` with both averages, the signal and its transitions.
    ///
    /// Every row depends only on closes at or before its own index. A series
    /// shorter than the long window yields an all-Flat annotation.
    pub fn annotate(&self, series: Series) -> AnnotatedSeries {
        let closes = series.closes();
        let short = Sma::new(self.short_window).compute(&closes);
        let long = Sma::new(self.long_window).compute(&closes);

        let mut rows = Vec::with_capacity(closes.len());
        let mut prev = Signal::Flat;
        for (i, (short_ma, long_ma)) in short.into_iter().zip(long).enumerate() {
            let signal = match (short_ma, long_ma) {
                (Some(s), Some(l)) if s > l => Signal::Long,
                _ => Signal::Flat,
            };
            let position = if i == 0 {
                Position::Hold
            } else {
                Position::between(prev, signal)
            };
            rows.push(SignalRow {
                short_ma,
                long_ma,
                signal,
                position,
            });
            prev = signal;
        }

        let annotated =
            AnnotatedSeries::new(series, rows, self.short_window, self.long_window);
        debug!(
            bars = annotated.len(),
            short_window = self.short_window,
            long_window = self.long_window,
            entries = annotated.entry_count(),
            exits = annotated.exit_count(),
            "annotated series"
        );
        annotated
    }
}
