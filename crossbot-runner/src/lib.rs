//! Crossbot Runner: backtest orchestration on top of `crossbot-core`.
//!
//! - TOML configuration with defaults and validation
//! - Series loading through any `PriceProvider`, with "no data" kept apart
//!   from fetch failures
//! - Single-backtest runner producing a serializable `BacktestReport`
//! - JSON/CSV artifact export

pub mod config;
pub mod export;
pub mod loader;
pub mod runner;

pub use config::{BacktestConfig, ConfigError, RunId};
pub use export::{export_chart_csv, export_json, export_trades_csv, import_json, save_artifacts};
pub use loader::{load_series, LoadError, LoadedSeries};
pub use runner::{run, run_from_series, BacktestReport, RunError, SCHEMA_VERSION};
