//! Domain types: bars, validated series, trade log entries.

pub mod bar;
pub mod series;
pub mod trade;

pub use bar::Bar;
pub use series::{Series, SeriesError};
pub use trade::{ExitReason, Trade, TradeAction};
