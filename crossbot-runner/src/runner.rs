//! Backtest runner: wires together config, data loading, and the core pipeline.
//!
//! Two entry points:
//! - `run()`: validates the config, loads data through a provider, then runs. Used by the CLI.
//! - `run_from_series()`: takes a pre-loaded series. No I/O.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crossbot_core::data::{DataSource, Interval, PriceProvider};
use crossbot_core::{
    run_backtest, BacktestParams, ChartSeries, ImminentSignal, ParamError, Performance, Trade,
};

use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::loader::{load_series, LoadError, LoadedSeries};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("invalid parameters: {0}")]
    Params(#[from] ParamError),
}

impl RunError {
    /// True when the provider had nothing for the requested ticker/range.
    pub fn is_data_unavailable(&self) -> bool {
        matches!(self, RunError::Data(e) if e.is_data_unavailable())
    }
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub ticker: String,
    pub interval: Interval,
    pub provider: String,
    #[serde(default)]
    pub has_synthetic: bool,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub bar_count: usize,
    pub dataset_hash: String,
    pub params: BacktestParams,
    /// Human-readable trade lines, one per trade.
    pub trade_log: Vec<String>,
    pub trades: Vec<Trade>,
    pub performance: Performance,
    pub final_holding: bool,
    pub imminent: ImminentSignal,
    pub equity_curve: Vec<f64>,
    pub chart: ChartSeries,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl BacktestReport {
    pub fn final_value(&self) -> f64 {
        self.performance.final_value
    }

    pub fn trade_count(&self) -> usize {
        self.trades.len()
    }
}

/// Run a single backtest from a config, fetching data through `provider`.
pub fn run(
    config: &BacktestConfig,
    provider: &dyn PriceProvider,
) -> Result<BacktestReport, RunError> {
    config.validate()?;
    let request = config.fetch_request();
    let loaded = load_series(provider, &request)?;
    let has_synthetic = provider.source() == DataSource::Synthetic;
    let mut report = run_from_series(config, loaded)?;
    report.has_synthetic = has_synthetic;
    Ok(report)
}

/// Run a backtest over an already-loaded series. No I/O.
pub fn run_from_series(
    config: &BacktestConfig,
    loaded: LoadedSeries,
) -> Result<BacktestReport, RunError> {
    let params = config.to_params();
    let bar_count = loaded.series.len();
    let output = run_backtest(&params, loaded.series)?;

    let report = BacktestReport {
        schema_version: SCHEMA_VERSION,
        run_id: config.run_id(),
        ticker: params.ticker.clone(),
        interval: config.backtest.interval,
        provider: loaded.provider,
        has_synthetic: false,
        start: config.backtest.start_date,
        end: config.backtest.end_date,
        bar_count,
        dataset_hash: loaded.dataset_hash,
        trade_log: output.trade_log(),
        chart: output.annotated.chart_series(),
        trades: output.outcome.trades,
        performance: output.performance,
        final_holding: output.outcome.final_holding,
        imminent: output.imminent,
        equity_curve: output.outcome.equity_curve,
        params,
    };

    info!(
        ticker = %report.ticker,
        bars = report.bar_count,
        trades = report.trades.len(),
        total_return_pct = report.performance.total_return_pct,
        "backtest complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::compute_dataset_hash;
    use chrono::Duration;
    use crossbot_core::data::SyntheticProvider;
    use crossbot_core::{Bar, Series};

    fn config(short: usize, long: usize, capital: f64) -> BacktestConfig {
        let mut cfg = BacktestConfig::default();
        cfg.backtest.ticker = "test".into();
        cfg.backtest.start_date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        cfg.backtest.end_date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        cfg.backtest.initial_capital = capital;
        cfg.strategy.short_window = short;
        cfg.strategy.long_window = long;
        cfg
    }

    fn loaded(closes: &[f64]) -> LoadedSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::daily("TEST", start + Duration::days(i as i64), c))
            .collect();
        let series = Series::new(bars).unwrap();
        LoadedSeries {
            dataset_hash: compute_dataset_hash(&series),
            series,
            provider: "memory".into(),
        }
    }

    #[test]
    fn worked_example_report() {
        let cfg = config(2, 4, 1000.0);
        let report = run_from_series(
            &cfg,
            loaded(&[10.0, 10.0, 10.0, 10.0, 10.0, 12.0, 14.0, 16.0]),
        )
        .unwrap();

        assert_eq!(report.ticker, "TEST");
        assert_eq!(report.bar_count, 8);
        assert_eq!(report.trade_log.len(), 1);
        assert!(report.trade_log[0].starts_with("TEST Buy at 2024-01-07"));
        assert!(report.final_holding);
        assert!((report.final_value() - 1000.0 / 12.0 * 16.0).abs() < 1e-9);
        assert_eq!(report.chart.len(), 8);
        assert_eq!(report.equity_curve.len(), 8);
        assert_eq!(report.run_id, cfg.run_id());
        assert_eq!(report.imminent, ImminentSignal::None);
    }

    #[test]
    fn invalid_params_surface_as_errors() {
        let cfg = config(0, 4, 1000.0);
        let err = run_from_series(&cfg, loaded(&[10.0, 11.0])).unwrap_err();
        assert!(matches!(err, RunError::Params(ParamError::ShortWindow(0))));
    }

    #[test]
    fn run_validates_before_fetching() {
        let mut cfg = config(2, 4, 1000.0);
        cfg.backtest.start_date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let err = run(&cfg, &SyntheticProvider::new()).unwrap_err();
        assert!(matches!(err, RunError::Config(ConfigError::DateRange { .. })));
        assert!(!err.is_data_unavailable());
    }

    #[test]
    fn run_with_synthetic_provider_tags_report() {
        let report = run(&config(5, 20, 10_000.0), &SyntheticProvider::new()).unwrap();
        assert!(report.has_synthetic);
        assert_eq!(report.provider, "synthetic");
        assert!(report.bar_count > 200);
        assert_eq!(report.trade_log.len(), report.trades.len());
    }
}
