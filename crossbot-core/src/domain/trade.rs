//! Trade: an immutable entry in the simulation's trade log.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeAction {
    Buy,
    Sell,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => f.write_str("Buy"),
            TradeAction::Sell => f.write_str("Sell"),
        }
    }
}

/// Why a trade fired. Entries are always `Crossover`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    Crossover,
    TakeProfit,
}

/// One fill of the long-only simulation.
///
/// `shares` is the share count bought (for a Buy) or liquidated (for a Sell,
/// recorded before the position is closed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub ticker: String,
    pub timestamp: NaiveDateTime,
    pub action: TradeAction,
    pub price: f64,
    pub shares: f64,
    pub reason: ExitReason,
    /// Round-trip return versus the entry price, in percent. Sells only.
    pub realized_return_pct: Option<f64>,
}

impl Trade {
    /// Cash value of the fill.
    pub fn notional(&self) -> f64 {
        self.price * self.shares
    }
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} at {}: {:.2}, shares: {:.2}",
            self.ticker, self.action, self.timestamp, self.price, self.shares
        )?;
        if let Some(ret) = self.realized_return_pct {
            write!(f, ", return: {ret:.2}%")?;
        }
        if self.reason == ExitReason::TakeProfit {
            f.write_str(" (take profit)")?;
        }
        Ok(())
    }
}
