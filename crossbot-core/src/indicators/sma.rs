//! Simple Moving Average (SMA).
//!
//! Arithmetic mean of the trailing `period` closes.
//! Lookback: period - 1 (first defined value at index period-1).

/// Simple moving average over a fixed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sma {
    period: usize,
}

impl Sma {
    /// Panics on a zero period. Use [`Sma::try_new`] for unvalidated input.
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self { period }
    }

    pub fn try_new(period: usize) -> Option<Self> {
        (period >= 1).then_some(Self { period })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn name(&self) -> String {
        format!("sma_{}", self.period)
    }

    pub fn lookback(&self) -> usize {
        self.period - 1
    }

    /// Mean of the window ending at each index, `None` until the window fits.
    ///
    /// O(n): a running sum adds the newest close and drops the one leaving the
    /// window. A window whose closes are all equal yields exactly that value,
    /// so rounding left in the running sum cannot split two averages over a
    /// flat stretch.
    pub fn compute(&self, closes: &[f64]) -> Vec<Option<f64>> {
        let n = closes.len();
        let mut result = vec![None; n];
        if n < self.period {
            return result;
        }

        let divisor = self.period as f64;
        let mut sum = 0.0;
        // Length of the run of equal closes ending at `i`.
        let mut run = 0usize;
        for (i, &close) in closes.iter().enumerate() {
            sum += close;
            run = if i > 0 && closes[i - 1] == close {
                run + 1
            } else {
                1
            };
            if i >= self.period {
                sum -= closes[i - self.period];
            }
            if i >= self.lookback() {
                result[i] = Some(if run >= self.period {
                    close
                } else {
                    sum / divisor
                });
            }
        }
        result
    }
}
