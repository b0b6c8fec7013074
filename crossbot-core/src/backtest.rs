//! End-to-end backtest pipeline: validate → annotate → simulate → measure →
//! detect. No I/O; the caller supplies the series.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::Series;
use crate::imminent::{self, ImminentSignal};
use crate::performance::Performance;
use crate::signal::{AnnotatedSeries, MaCrossover};
use crate::simulator::{simulate, SimulationConfig, SimulationOutcome};

/// Parameters rejected before the pipeline runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    #[error("short window must be >= 1 (got {0})")]
    ShortWindow(usize),

    #[error("long window must be >= 1 (got {0})")]
    LongWindow(usize),

    #[error("initial capital must be a positive number (got {0})")]
    Capital(f64),

    #[error("take-profit must be a positive percentage (got {0})")]
    TakeProfit(f64),

    #[error("ticker must not be empty")]
    EmptyTicker,
}

/// Everything the core needs besides the price series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestParams {
    pub ticker: String,
    pub short_window: usize,
    pub long_window: usize,
    pub initial_capital: f64,
    #[serde(default)]
    pub take_profit_pct: Option<f64>,
}

impl BacktestParams {
    pub fn new(ticker: &str, short_window: usize, long_window: usize, initial_capital: f64) -> Self {
        Self {
            ticker: ticker.to_string(),
            short_window,
            long_window,
            initial_capital,
            take_profit_pct: None,
        }
    }

    pub fn validate(&self) -> Result<(), ParamError> {
        if self.ticker.trim().is_empty() {
            return Err(ParamError::EmptyTicker);
        }
        if self.short_window == 0 {
            return Err(ParamError::ShortWindow(self.short_window));
        }
        if self.long_window == 0 {
            return Err(ParamError::LongWindow(self.long_window));
        }
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(ParamError::Capital(self.initial_capital));
        }
        if let Some(tp) = self.take_profit_pct {
            if !tp.is_finite() || tp <= 0.0 {
                return Err(ParamError::TakeProfit(tp));
            }
        }
        if self.short_window >= self.long_window {
            warn!(
                short_window = self.short_window,
                long_window = self.long_window,
                "short window is not shorter than long window"
            );
        }
        Ok(())
    }

    pub fn signal(&self) -> MaCrossover {
        MaCrossover::new(self.short_window, self.long_window)
    }

    pub fn simulation_config(&self) -> SimulationConfig {
        SimulationConfig {
            initial_capital: self.initial_capital,
            take_profit_pct: self.take_profit_pct,
        }
    }
}

/// All outputs of one pipeline run.
#[derive(Debug, Clone)]
pub struct BacktestOutput {
    pub annotated: AnnotatedSeries,
    pub outcome: SimulationOutcome,
    pub performance: Performance,
    pub imminent: ImminentSignal,
}

impl BacktestOutput {
    pub fn trade_log(&self) -> Vec<String> {
        self.outcome.trade_log()
    }
}

/// Run the full pipeline on an already-fetched series.
///
/// Deterministic: the same params and series always produce the same trades
/// and values.
pub fn run_backtest(params: &BacktestParams, series: Series) -> Result<BacktestOutput, ParamError> {
    params.validate()?;

    let annotated = params.signal().annotate(series);
    let outcome = simulate(&annotated, &params.simulation_config(), &params.ticker);
    let performance =
        Performance::compute(params.initial_capital, outcome.final_value, annotated.series());
    let imminent = imminent::detect(&annotated, outcome.holding_before_last_bar, &params.ticker);

    debug!(
        ticker = %params.ticker,
        bars = annotated.len(),
        trades = outcome.trades.len(),
        total_return_pct = performance.total_return_pct,
        "backtest complete"
    );

    Ok(BacktestOutput {
        annotated,
        outcome,
        performance,
        imminent,
    })
}
