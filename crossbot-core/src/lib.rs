//! Crossbot Core: bars, moving-average crossover signal, trade simulation,
//! performance and price providers.
//!
//! The pipeline is a chain of pure transforms:
//! - [`signal::MaCrossover::annotate`]: series → annotated series
//! - [`simulator::simulate`]: annotated series → trades + final value
//! - [`performance::Performance::compute`]: capital + span → returns
//! - [`imminent::detect`]: last bar → actionable signal, if any
//!
//! [`backtest::run_backtest`] wires them together. Fetching data lives in
//! [`data`] and is the only part that performs I/O.

pub mod backtest;
pub mod data;
pub mod domain;
pub mod imminent;
pub mod indicators;
pub mod performance;
pub mod signal;
pub mod simulator;

pub use backtest::{run_backtest, BacktestOutput, BacktestParams, ParamError};
pub use domain::{Bar, ExitReason, Series, SeriesError, Trade, TradeAction};
pub use imminent::ImminentSignal;
pub use performance::Performance;
pub use signal::{AnnotatedSeries, ChartSeries, MaCrossover, Position, Signal, SignalRow};
pub use simulator::{SimulationConfig, SimulationOutcome};
