//! Report export: JSON and CSV artifact generation.
//!
//! - **JSON**: the full [`BacktestReport`] with schema versioning
//! - **CSV**: trade tape, and the chart series (close plus both averages) for
//!   external plotting tools
//!
//! Persisted reports carry a `schema_version` field. Unknown versions are
//! rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use crossbot_core::{ChartSeries, ExitReason, Trade, TradeAction};
use tracing::info;

use crate::runner::{BacktestReport, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestReport` to pretty JSON.
pub fn export_json(report: &BacktestReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize BacktestReport to JSON")
}

/// Deserialize a `BacktestReport` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestReport> {
    let report: BacktestReport =
        serde_json::from_str(json).context("failed to deserialize BacktestReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the trade log as CSV.
///
/// Columns: ticker, timestamp, action, price, shares, notional, reason,
/// realized_return_pct (blank on buys)
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "ticker",
        "timestamp",
        "action",
        "price",
        "shares",
        "notional",
        "reason",
        "realized_return_pct",
    ])?;

    for t in trades {
        let reason = match (t.action, t.reason) {
            (TradeAction::Buy, _) => "",
            (TradeAction::Sell, ExitReason::Crossover) => "crossover",
            (TradeAction::Sell, ExitReason::TakeProfit) => "take_profit",
        };
        wtr.write_record([
            &t.ticker,
            &t.timestamp.to_string(),
            &t.action.to_string(),
            &format!("{:.6}", t.price),
            &format!("{:.6}", t.shares),
            &format!("{:.2}", t.notional()),
            &reason.to_string(),
            &t.realized_return_pct
                .map(|r| format!("{r:.4}"))
                .unwrap_or_default(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the chart series as CSV: timestamp, close, short_ma, long_ma.
///
/// Averages are blank on warm-up bars.
pub fn export_chart_csv(chart: &ChartSeries) -> Result<String> {
    let fmt_opt = |v: Option<f64>| v.map(|x| format!("{x:.6}")).unwrap_or_default();

    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "close", "short_ma", "long_ma"])?;
    for i in 0..chart.len() {
        wtr.write_record([
            chart.timestamps[i].to_string(),
            format!("{:.6}", chart.close[i]),
            fmt_opt(chart.short_ma[i]),
            fmt_opt(chart.long_ma[i]),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a single backtest run.
///
/// Creates a directory named `{ticker}_{timestamp}/` under `output_dir`
/// containing:
/// - `report.json`: the full `BacktestReport`
/// - `trades.csv`: trade tape
/// - `chart.csv`: close price and both moving averages per bar
///
/// Returns the path to the created directory.
pub fn save_artifacts(report: &BacktestReport, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}",
        report.ticker,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let json = export_json(report)?;
    std::fs::write(run_dir.join("report.json"), &json)?;

    let trades_csv = export_trades_csv(&report.trades)?;
    std::fs::write(run_dir.join("trades.csv"), &trades_csv)?;

    let chart_csv = export_chart_csv(&report.chart)?;
    std::fs::write(run_dir.join("chart.csv"), &chart_csv)?;

    info!(dir = %run_dir.display(), "artifacts saved");
    Ok(run_dir)
}

/// Load a `BacktestReport` from an artifact directory's report.json.
///
/// Rejects unknown schema versions.
pub fn load_artifacts(dir: &Path) -> Result<BacktestReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn trade(action: TradeAction, price: f64, ret: Option<f64>) -> Trade {
        Trade {
            ticker: "AAPL".into(),
            timestamp: ts(5),
            action,
            price,
            shares: 10.0,
            reason: ExitReason::Crossover,
            realized_return_pct: ret,
        }
    }

    #[test]
    fn trades_csv_has_header_and_rows() {
        let csv = export_trades_csv(&[
            trade(TradeAction::Buy, 100.0, None),
            trade(TradeAction::Sell, 110.0, Some(10.0)),
        ])
        .unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ticker,timestamp,action"));
        assert!(lines[1].contains("Buy"));
        assert!(lines[1].ends_with(",,"));
        assert!(lines[2].contains(",crossover,"));
        assert!(lines[2].ends_with("10.0000"));
    }

    #[test]
    fn chart_csv_blanks_undefined_averages() {
        let chart = ChartSeries {
            timestamps: vec![ts(2), ts(3), ts(4)],
            close: vec![10.0, 11.0, 12.0],
            short_ma: vec![None, Some(10.5), Some(11.5)],
            long_ma: vec![None, None, Some(11.0)],
        };
        let csv = export_chart_csv(&chart).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "timestamp,close,short_ma,long_ma");
        assert_eq!(lines[1], "2024-01-02 00:00:00,10.000000,,");
        assert_eq!(lines[2], "2024-01-03 00:00:00,11.000000,10.500000,");
        assert_eq!(lines[3], "2024-01-04 00:00:00,12.000000,11.500000,11.000000");
    }

    #[test]
    fn empty_chart_is_header_only() {
        let csv = export_chart_csv(&ChartSeries::default()).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }
}
