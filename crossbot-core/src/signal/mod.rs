//! Signal generation: a pure transform from a [`Series`] to an
//! [`AnnotatedSeries`] carrying moving averages, the long/flat signal and its
//! transitions.

pub mod ma_crossover;

pub use ma_crossover::MaCrossover;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{Bar, Series};

/// Discrete target exposure on a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    #[default]
    Flat,
    Long,
}

impl Signal {
    pub fn as_u8(self) -> u8 {
        match self {
            Signal::Flat => 0,
            Signal::Long => 1,
        }
    }
}

/// Change in [`Signal`] from the previous bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    /// 1 → 0
    Exit,
    #[default]
    Hold,
    /// 0 → 1
    Entry,
}

impl Position {
    /// Difference `signal[i] - signal[i-1]`.
    pub fn between(prev: Signal, cur: Signal) -> Self {
        match (prev, cur) {
            (Signal::Flat, Signal::Long) => Position::Entry,
            (Signal::Long, Signal::Flat) => Position::Exit,
            _ => Position::Hold,
        }
    }

    pub fn as_i8(self) -> i8 {
        match self {
            Position::Exit => -1,
            Position::Hold => 0,
            Position::Entry => 1,
        }
    }
}

/// Derived fields for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SignalRow {
    pub short_ma: Option<f64>,
    pub long_ma: Option<f64>,
    pub signal: Signal,
    pub position: Position,
}

/// A series together with its per-bar signal rows (same length, same order).
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedSeries {
    series: Series,
    rows: Vec<SignalRow>,
    short_window: usize,
    long_window: usize,
}

impl AnnotatedSeries {
    pub(crate) fn new(
        series: Series,
        rows: Vec<SignalRow>,
        short_window: usize,
        long_window: usize,
    ) -> Self {
        debug_assert_eq!(series.len(), rows.len());
        Self {
            series,
            rows,
            short_window,
            long_window,
        }
    }

    pub fn series(&self) -> &Series {
        &self.series
    }

    pub fn bars(&self) -> &[Bar] {
        self.series.bars()
    }

    pub fn rows(&self) -> &[SignalRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn short_window(&self) -> usize {
        self.short_window
    }

    pub fn long_window(&self) -> usize {
        self.long_window
    }

    /// Bars paired with their rows, in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = (&Bar, &SignalRow)> {
        self.series.bars().iter().zip(self.rows.iter())
    }

    pub fn last(&self) -> Option<(&Bar, &SignalRow)> {
        self.iter().last()
    }

    pub fn entry_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| r.position == Position::Entry)
            .count()
    }

    pub fn exit_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| r.position == Position::Exit)
            .count()
    }

    /// Column view for charting: close, short MA and long MA per timestamp.
    pub fn chart_series(&self) -> ChartSeries {
        ChartSeries {
            timestamps: self.bars().iter().map(|b| b.timestamp).collect(),
            close: self.bars().iter().map(|b| b.close).collect(),
            short_ma: self.rows.iter().map(|r| r.short_ma).collect(),
            long_ma: self.rows.iter().map(|r| r.long_ma).collect(),
        }
    }

    pub fn into_series(self) -> Series {
        self.series
    }
}

/// The three numeric series handed to a chart renderer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartSeries {
    pub timestamps: Vec<NaiveDateTime>,
    pub close: Vec<f64>,
    pub short_ma: Vec<Option<f64>>,
    pub long_ma: Vec<Option<f64>>,
}

impl ChartSeries {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}
