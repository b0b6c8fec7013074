//! Performance metrics: pure functions from capital and elapsed time to
//! percentage returns.

use serde::{Deserialize, Serialize};

use crate::domain::Series;

/// Calendar days per year used for annualization.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Return summary for one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    pub initial_capital: f64,
    pub final_value: f64,
    pub total_return_pct: f64,
    pub annualized_return_pct: f64,
    /// Whole calendar days between the first and last bar.
    pub span_days: i64,
}

impl Performance {
    pub fn compute(initial_capital: f64, final_value: f64, series: &Series) -> Self {
        Self::from_span(initial_capital, final_value, series.span_days())
    }

    pub fn from_span(initial_capital: f64, final_value: f64, span_days: i64) -> Self {
        Self {
            initial_capital,
            final_value,
            total_return_pct: total_return_pct(initial_capital, final_value),
            annualized_return_pct: annualized_return_pct(initial_capital, final_value, span_days),
            span_days,
        }
    }
}

/// `(final / initial - 1) * 100`.
pub fn total_return_pct(initial_capital: f64, final_value: f64) -> f64 {
    (final_value / initial_capital - 1.0) * 100.0
}

/// Total growth compounded over a 365-day year, in percent.
///
/// Returns 0.0 when the span is zero or negative.
pub fn annualized_return_pct(initial_capital: f64, final_value: f64, span_days: i64) -> f64 {
    if span_days <= 0 {
        return 0.0;
    }
    let growth = final_value / initial_capital;
    (growth.powf(DAYS_PER_YEAR / span_days as f64) - 1.0) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use crate::indicators::{assert_approx, make_series};
    use chrono::NaiveDate;

    #[test]
    fn fifty_percent_over_one_year() {
        let perf = Performance::from_span(1000.0, 1500.0, 365);
        assert_approx(perf.total_return_pct, 50.0, 1e-9);
        assert_approx(perf.annualized_return_pct, 50.0, 1e-9);
    }

    #[test]
    fn zero_span_is_guarded() {
        let perf = Performance::from_span(1000.0, 1500.0, 0);
        assert_approx(perf.total_return_pct, 50.0, 1e-9);
        assert_eq!(perf.annualized_return_pct, 0.0);
        assert!(perf.annualized_return_pct.is_finite());
    }

    #[test]
    fn half_year_compounds() {
        // 10% over ~half a year annualizes to about 21%.
        let ann = annualized_return_pct(1000.0, 1100.0, 182);
        let expected = (1.1_f64.powf(365.0 / 182.0) - 1.0) * 100.0;
        assert_approx(ann, expected, 1e-9);
        assert!(ann > 20.0 && ann < 22.0);
    }

    #[test]
    fn loss_is_negative() {
        assert_approx(total_return_pct(1000.0, 800.0), -20.0, 1e-9);
        assert!(annualized_return_pct(1000.0, 800.0, 730) < 0.0);
    }

    #[test]
    fn unchanged_capital_is_zero() {
        let series = make_series(&[10.0; 5]);
        let perf = Performance::compute(1000.0, 1000.0, &series);
        assert_eq!(perf.total_return_pct, 0.0);
        assert_eq!(perf.annualized_return_pct, 0.0);
        assert_eq!(perf.span_days, 4);
    }

    #[test]
    fn compute_uses_series_span() {
        let first = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let last = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let series =
            Series::new(vec![Bar::daily("T", first, 10.0), Bar::daily("T", last, 15.0)]).unwrap();
        let perf = Performance::compute(1000.0, 1500.0, &series);
        assert_eq!(perf.span_days, 365);
        assert_approx(perf.annualized_return_pct, 50.0, 1e-9);
    }

    #[test]
    fn single_bar_series_has_zero_annualized() {
        let series = make_series(&[10.0]);
        let perf = Performance::compute(1000.0, 1200.0, &series);
        assert_eq!(perf.annualized_return_pct, 0.0);
    }
}
