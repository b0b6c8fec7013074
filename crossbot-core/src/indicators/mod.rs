//! Rolling indicators over close prices.

pub mod sma;

pub use sma::Sma;

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

/// Build a daily series from closes, one bar per calendar day from 2024-01-02.
#[cfg(test)]
pub fn make_series(closes: &[f64]) -> crate::domain::Series {
    use crate::domain::{Bar, Series};
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar::daily("TEST", base_date + chrono::Duration::days(i as i64), close))
        .collect();
    Series::new(bars).unwrap()
}
