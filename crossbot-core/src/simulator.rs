//! Long-only, all-in/all-out trade simulation over an annotated series.
//!
//! One forward pass. The book is either entirely cash or entirely shares:
//! an Entry converts all cash to shares at the bar's close, an Exit converts
//! all shares back. An open position at the end is marked to market at the
//! last close, not sold.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{ExitReason, Trade, TradeAction};
use crate::signal::{AnnotatedSeries, Position};

/// Simulation inputs besides the series itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub initial_capital: f64,
    /// Liquidate once the close reaches this gain over the entry price, in
    /// percent. `None` exits on crossovers only.
    pub take_profit_pct: Option<f64>,
}

impl SimulationConfig {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            initial_capital,
            take_profit_pct: None,
        }
    }
}

/// The simulator's single state variable.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Book {
    Flat { cash: f64 },
    Long { shares: f64, entry_price: f64 },
}

impl Book {
    fn is_holding(&self) -> bool {
        matches!(self, Book::Long { .. })
    }

    fn value_at(&self, price: f64) -> f64 {
        match *self {
            Book::Flat { cash } => cash,
            Book::Long { shares, .. } => shares * price,
        }
    }
}

/// Result of one simulation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub trades: Vec<Trade>,
    /// Cash if flat, otherwise shares marked at the last close.
    pub final_value: f64,
    pub final_holding: bool,
    /// Holding state carried into the last bar, before it was processed.
    pub holding_before_last_bar: bool,
    pub cash: f64,
    pub shares: f64,
    /// Mark-to-market value after each bar.
    pub equity_curve: Vec<f64>,
}

impl SimulationOutcome {
    pub fn trade_log(&self) -> Vec<String> {
        self.trades.iter().map(ToString::to_string).collect()
    }

    pub fn round_trips(&self) -> usize {
        self.trades
            .iter()
            .filter(|t| t.action == TradeAction::Sell)
            .count()
    }
}

/// Walk `annotated` once and return the trade log and ending value.
///
/// Never fails: an empty or all-flat series produces no trades and a final
/// value equal to the initial capital.
pub fn simulate(
    annotated: &AnnotatedSeries,
    config: &SimulationConfig,
    ticker: &str,
) -> SimulationOutcome {
    let mut book = Book::Flat {
        cash: config.initial_capital,
    };
    let mut trades = Vec::new();
    let mut equity_curve = Vec::with_capacity(annotated.len());
    let mut holding_before_last_bar = false;
    let last_index = annotated.len().saturating_sub(1);

    for (i, (bar, row)) in annotated.iter().enumerate() {
        if i == last_index {
            holding_before_last_bar = book.is_holding();
        }
        let close = bar.close;

        match book {
            Book::Flat { cash } if row.position == Position::Entry => {
                let shares = cash / close;
                book = Book::Long {
                    shares,
                    entry_price: close,
                };
                trades.push(fill(ticker, bar.timestamp, TradeAction::Buy, close, shares, None));
            }
            Book::Long {
                shares,
                entry_price,
            } => {
                let reason = if row.position == Position::Exit {
                    Some(ExitReason::Crossover)
                } else if take_profit_hit(config.take_profit_pct, entry_price, close) {
                    Some(ExitReason::TakeProfit)
                } else {
                    None
                };
                if let Some(reason) = reason {
                    book = Book::Flat {
                        cash: shares * close,
                    };
                    let mut trade =
                        fill(ticker, bar.timestamp, TradeAction::Sell, close, shares, Some(entry_price));
                    trade.reason = reason;
                    trades.push(trade);
                }
            }
            Book::Flat { .. } => {}
        }

        equity_curve.push(book.value_at(close));
    }

    let final_value = equity_curve
        .last()
        .copied()
        .unwrap_or(config.initial_capital);
    let (cash, shares) = match book {
        Book::Flat { cash } => (cash, 0.0),
        Book::Long { shares, .. } => (0.0, shares),
    };

    debug!(
        ticker,
        trades = trades.len(),
        final_value,
        holding = book.is_holding(),
        "simulation complete"
    );

    SimulationOutcome {
        trades,
        final_value,
        final_holding: book.is_holding(),
        holding_before_last_bar,
        cash,
        shares,
        equity_curve,
    }
}

fn take_profit_hit(take_profit_pct: Option<f64>, entry_price: f64, close: f64) -> bool {
    match take_profit_pct {
        Some(pct) => (close - entry_price) / entry_price >= pct / 100.0,
        None => false,
    }
}

fn fill(
    ticker: &str,
    timestamp: NaiveDateTime,
    action: TradeAction,
    price: f64,
    shares: f64,
    entry_price: Option<f64>,
) -> Trade {
    debug!(ticker, %timestamp, %action, price, shares, "fill");
    Trade {
        ticker: ticker.to_string(),
        timestamp,
        action,
        price,
        shares,
        reason: ExitReason::Crossover,
        realized_return_pct: entry_price.map(|entry| (price / entry - 1.0) * 100.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Series;
    use crate::indicators::{assert_approx, make_series, DEFAULT_EPSILON};
    use crate::signal::MaCrossover;

    fn run(closes: &[f64], short: usize, long: usize, capital: f64) -> SimulationOutcome {
        let annotated = MaCrossover::new(short, long).annotate(make_series(closes));
        simulate(&annotated, &SimulationConfig::new(capital), "TEST")
    }

    #[test]
    fn worked_example_buys_once_and_marks_to_market() {
        let out = run(&[10.0, 10.0, 10.0, 10.0, 10.0, 12.0, 14.0, 16.0], 2, 4, 1000.0);
        assert_eq!(out.trades.len(), 1);
        let buy = &out.trades[0];
        assert_eq!(buy.action, TradeAction::Buy);
        assert_eq!(buy.price, 12.0);
        assert_approx(buy.shares, 1000.0 / 12.0, DEFAULT_EPSILON);
        assert!(out.final_holding);
        assert!(out.holding_before_last_bar);
        assert_approx(out.final_value, 1000.0 / 12.0 * 16.0, 1e-9);
        assert_eq!(out.cash, 0.0);
    }

    #[test]
    fn round_trip_records_shares_before_liquidation() {
        let out = run(&[10.0, 10.0, 10.0, 12.0, 14.0, 12.0, 8.0, 6.0], 2, 3, 1000.0);
        assert_eq!(out.trades.len(), 2);
        let (buy, sell) = (&out.trades[0], &out.trades[1]);
        assert_eq!(buy.action, TradeAction::Buy);
        assert_eq!(sell.action, TradeAction::Sell);
        assert_eq!(buy.shares, sell.shares);
        assert!(!out.final_holding);
        assert_approx(out.final_value, sell.shares * sell.price, DEFAULT_EPSILON);
        assert_eq!(out.shares, 0.0);
        assert_eq!(out.round_trips(), 1);
        let expected_ret = (sell.price / buy.price - 1.0) * 100.0;
        assert_approx(sell.realized_return_pct.unwrap(), expected_ret, DEFAULT_EPSILON);
    }

    #[test]
    fn flat_series_never_trades() {
        let out = run(&[10.0; 30], 3, 10, 5000.0);
        assert!(out.trades.is_empty());
        assert_eq!(out.final_value, 5000.0);
        assert!(!out.final_holding);
    }

    #[test]
    fn series_shorter_than_long_window_never_trades() {
        let out = run(&[10.0, 12.0, 14.0, 16.0], 2, 10, 1000.0);
        assert!(out.trades.is_empty());
        assert_eq!(out.final_value, 1000.0);
    }

    #[test]
    fn empty_series_returns_initial_capital() {
        let annotated = MaCrossover::new(2, 4).annotate(Series::default());
        let out = simulate(&annotated, &SimulationConfig::new(750.0), "TEST");
        assert!(out.trades.is_empty());
        assert_eq!(out.final_value, 750.0);
        assert!(out.equity_curve.is_empty());
        assert!(!out.holding_before_last_bar);
    }

    #[test]
    fn take_profit_exits_before_crossover() {
        let closes = [10.0, 10.0, 10.0, 12.0, 14.0, 16.0, 18.0];
        let annotated = MaCrossover::new(2, 3).annotate(make_series(&closes));
        let config = SimulationConfig {
            initial_capital: 1000.0,
            take_profit_pct: Some(20.0),
        };
        let out = simulate(&annotated, &config, "TEST");
        assert_eq!(out.trades.len(), 2);
        let sell = &out.trades[1];
        assert_eq!(sell.reason, ExitReason::TakeProfit);
        // Entry at 12, first close >= 14.4 is 16.
        assert_eq!(sell.price, 16.0);
        assert!(!out.final_holding);
        // Signal stays Long, so no re-entry without a fresh crossover.
        assert_approx(out.final_value, 1000.0 / 12.0 * 16.0, 1e-9);
    }

    #[test]
    fn equity_curve_tracks_each_bar() {
        let out = run(&[10.0, 10.0, 10.0, 10.0, 10.0, 12.0, 14.0, 16.0], 2, 4, 1000.0);
        assert_eq!(out.equity_curve.len(), 8);
        assert_eq!(out.equity_curve[4], 1000.0);
        assert_approx(out.equity_curve[5], 1000.0, 1e-9);
        assert_approx(out.equity_curve[7], out.final_value, DEFAULT_EPSILON);
    }

    #[test]
    fn trade_log_lines() {
        let out = run(&[10.0, 10.0, 10.0, 10.0, 10.0, 12.0, 14.0, 16.0], 2, 4, 1000.0);
        assert_eq!(
            out.trade_log(),
            vec!["TEST Buy at 2024-01-07 00:00:00: 12.00, shares: 83.33".to_string()]
        );
    }
}
