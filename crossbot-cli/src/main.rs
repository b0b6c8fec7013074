//! Crossbot CLI: moving-average crossover backtests from the command line.
//!
//! Commands:
//! - `run`: backtest a ticker from a TOML config file and/or flags
//! - `fetch`: download bars and save them as CSV for offline runs
//! - `signal`: print only whether a trade would fire on the latest bar

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crossbot_core::data::csv_import::write_series_file;
use crossbot_core::data::{
    CsvProvider, FetchRequest, Interval, PriceProvider, SyntheticProvider, YahooProvider,
};
use crossbot_runner::{load_series, run, save_artifacts, BacktestConfig, BacktestReport};

const NO_DATA_MESSAGE: &str = "No data fetched. Try a different ticker or date range.";

#[derive(Parser)]
#[command(
    name = "crossbot",
    version,
    about = "Crossbot CLI: dual moving-average crossover backtester"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest a ticker and print the trade log and performance.
    Run {
        /// Ticker symbol. Defaults to the config value, or AAPL.
        #[arg(long)]
        ticker: Option<String>,

        #[command(flatten)]
        overrides: Overrides,

        #[command(flatten)]
        source: SourceArgs,

        /// Output directory for report artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Print results without writing artifacts.
        #[arg(long, default_value_t = false)]
        no_save: bool,
    },
    /// Download bars and write them as CSV.
    Fetch {
        /// Ticker symbol to download.
        ticker: String,

        /// Start date (YYYY-MM-DD). Defaults to 365 days ago.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Bar interval: 1d, 1m, 5m, 15m, 30m, 60m.
        #[arg(long, default_value = "1d")]
        interval: Interval,

        #[command(flatten)]
        source: SourceArgs,

        /// Destination CSV file.
        #[arg(long)]
        out: PathBuf,
    },
    /// Print only the imminent-signal message for the latest bar.
    Signal {
        /// Ticker symbol to check.
        ticker: String,

        #[command(flatten)]
        overrides: Overrides,

        #[command(flatten)]
        source: SourceArgs,
    },
}

/// Backtest settings that override the config file.
#[derive(Args, Debug, Default)]
struct Overrides {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start date (YYYY-MM-DD). Defaults to 365 days before the end date.
    #[arg(long)]
    start: Option<String>,

    /// End date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    end: Option<String>,

    /// Bar interval: 1d, 1m, 5m, 15m, 30m, 60m.
    #[arg(long)]
    interval: Option<Interval>,

    /// Short moving-average window, in bars.
    #[arg(long)]
    short: Option<usize>,

    /// Long moving-average window, in bars.
    #[arg(long)]
    long: Option<usize>,

    /// Starting cash.
    #[arg(long)]
    capital: Option<f64>,

    /// Close a position once it gains this many percent.
    #[arg(long)]
    take_profit: Option<f64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum Source {
    #[default]
    Yahoo,
    Csv,
    Synthetic,
}

#[derive(Args, Debug, Default)]
struct SourceArgs {
    /// Where bars come from.
    #[arg(long, value_enum, default_value_t = Source::Yahoo)]
    source: Source,

    /// CSV file, or directory of `{TICKER}.csv` files (with --source csv).
    #[arg(long)]
    csv_path: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            ticker,
            overrides,
            source,
            output_dir,
            no_save,
        } => run_backtest_cmd(ticker, &overrides, &source, &output_dir, no_save),
        Commands::Fetch {
            ticker,
            start,
            end,
            interval,
            source,
            out,
        } => run_fetch(&ticker, start, end, interval, &source, &out),
        Commands::Signal {
            ticker,
            overrides,
            source,
        } => run_signal(ticker, &overrides, &source),
    }
}

/// Logs go to stderr so stdout stays clean for results. `RUST_LOG` overrides
/// the default `info` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(s, "%Y-%m-%d")?)
}

/// Merge the config file (or defaults) with command-line overrides.
fn build_config(ticker: Option<String>, overrides: &Overrides) -> Result<BacktestConfig> {
    let mut config = match &overrides.config {
        Some(path) => BacktestConfig::from_file(path)?,
        None => BacktestConfig::default(),
    };

    if let Some(t) = ticker {
        config.backtest.ticker = t;
    }
    if let Some(end) = overrides.end.as_deref() {
        config.backtest.end_date = parse_date(end)?;
        if overrides.start.is_none() && overrides.config.is_none() {
            config.backtest.start_date =
                config.backtest.end_date - chrono::Duration::days(365);
        }
    }
    if let Some(start) = overrides.start.as_deref() {
        config.backtest.start_date = parse_date(start)?;
    }
    if let Some(interval) = overrides.interval {
        config.backtest.interval = interval;
    }
    if let Some(capital) = overrides.capital {
        config.backtest.initial_capital = capital;
    }
    if let Some(short) = overrides.short {
        config.strategy.short_window = short;
    }
    if let Some(long) = overrides.long {
        config.strategy.long_window = long;
    }
    if overrides.take_profit.is_some() {
        config.strategy.take_profit_pct = overrides.take_profit;
    }

    config.validate()?;
    debug!(?config, "resolved config");
    Ok(config)
}

fn make_provider(args: &SourceArgs) -> Result<Box<dyn PriceProvider>> {
    let provider: Box<dyn PriceProvider> = match args.source {
        Source::Yahoo => Box::new(YahooProvider::new()?),
        Source::Csv => match &args.csv_path {
            Some(path) => Box::new(CsvProvider::new(path.clone())),
            None => bail!("--source csv requires --csv-path"),
        },
        Source::Synthetic => Box::new(SyntheticProvider::new()),
    };
    Ok(provider)
}

fn run_backtest_cmd(
    ticker: Option<String>,
    overrides: &Overrides,
    source: &SourceArgs,
    output_dir: &Path,
    no_save: bool,
) -> Result<()> {
    let config = build_config(ticker, overrides)?;
    let provider = make_provider(source)?;

    let report = match run(&config, provider.as_ref()) {
        Ok(report) => report,
        Err(e) if e.is_data_unavailable() => {
            eprintln!("{NO_DATA_MESSAGE}");
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    print_summary(&report);

    if !no_save {
        let dir = save_artifacts(&report, output_dir)?;
        println!("Artifacts saved to {}", dir.display());
    }
    Ok(())
}

fn run_signal(ticker: String, overrides: &Overrides, source: &SourceArgs) -> Result<()> {
    let config = build_config(Some(ticker), overrides)?;
    let provider = make_provider(source)?;

    match run(&config, provider.as_ref()) {
        Ok(report) => {
            println!("{}", report.imminent);
            Ok(())
        }
        Err(e) if e.is_data_unavailable() => {
            eprintln!("{NO_DATA_MESSAGE}");
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

fn run_fetch(
    ticker: &str,
    start: Option<String>,
    end: Option<String>,
    interval: Interval,
    source: &SourceArgs,
    out: &Path,
) -> Result<()> {
    let end_date = end
        .as_deref()
        .map(parse_date)
        .transpose()?
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let start_date = start
        .as_deref()
        .map(parse_date)
        .transpose()?
        .unwrap_or_else(|| end_date - chrono::Duration::days(365));
    if start_date > end_date {
        bail!("start date {start_date} is after end date {end_date}");
    }

    let request = FetchRequest {
        ticker: ticker.trim().to_uppercase(),
        start: start_date,
        end: end_date,
        interval,
    };
    let provider = make_provider(source)?;

    let loaded = match load_series(provider.as_ref(), &request) {
        Ok(loaded) => loaded,
        Err(e) if e.is_data_unavailable() => {
            eprintln!("{NO_DATA_MESSAGE}");
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    write_series_file(&loaded.series, out)?;
    println!(
        "Wrote {} bars for {} to {}",
        loaded.series.len(),
        request.ticker,
        out.display()
    );
    Ok(())
}

fn print_summary(report: &BacktestReport) {
    println!();
    println!("=== Backtest Result ===");
    println!("Ticker:         {}", report.ticker);
    println!("Period:         {} to {}", report.start, report.end);
    println!("Interval:       {}", report.interval);
    println!("Provider:       {}", report.provider);
    println!(
        "Windows:        {} / {}",
        report.params.short_window, report.params.long_window
    );
    println!("Bars:           {}", report.bar_count);
    println!("Trades:         {}", report.trades.len());
    println!();
    println!("--- Trade Log ---");
    if report.trade_log.is_empty() {
        println!("(no trades)");
    }
    for line in &report.trade_log {
        println!("{line}");
    }
    println!();
    println!("--- Performance ---");
    println!("Initial Capital:   {:.2}", report.performance.initial_capital);
    println!("Final Value:       {:.2}", report.performance.final_value);
    println!(
        "Total Return:      {:.2}%",
        report.performance.total_return_pct
    );
    println!(
        "Annualized Return: {:.2}%",
        report.performance.annualized_return_pct
    );
    println!(
        "Position:          {}",
        if report.final_holding { "long" } else { "cash" }
    );
    println!();
    println!("--- Signal ---");
    println!("{}", report.imminent);
    if report.has_synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_defaults() {
        let overrides = Overrides {
            start: Some("2022-01-01".into()),
            end: Some("2022-12-31".into()),
            interval: Some(Interval::Min15),
            short: Some(5),
            long: Some(20),
            capital: Some(500.0),
            take_profit: Some(10.0),
            ..Default::default()
        };
        let cfg = build_config(Some("msft".into()), &overrides).unwrap();
        assert_eq!(cfg.ticker(), "MSFT");
        assert_eq!(cfg.backtest.start_date, NaiveDate::from_ymd_opt(2022, 1, 1).unwrap());
        assert_eq!(cfg.backtest.interval, Interval::Min15);
        assert_eq!(cfg.strategy.short_window, 5);
        assert_eq!(cfg.strategy.long_window, 20);
        assert_eq!(cfg.backtest.initial_capital, 500.0);
        assert_eq!(cfg.strategy.take_profit_pct, Some(10.0));
    }

    #[test]
    fn end_alone_shifts_default_start() {
        let overrides = Overrides {
            end: Some("2020-06-30".into()),
            ..Default::default()
        };
        let cfg = build_config(None, &overrides).unwrap();
        assert_eq!(
            cfg.backtest.start_date,
            NaiveDate::from_ymd_opt(2019, 7, 1).unwrap()
        );
    }

    #[test]
    fn rejects_bad_date_and_bad_window() {
        let bad_date = Overrides {
            start: Some("01/02/2020".into()),
            ..Default::default()
        };
        assert!(build_config(None, &bad_date).is_err());

        let bad_window = Overrides {
            short: Some(0),
            ..Default::default()
        };
        assert!(build_config(None, &bad_window).is_err());
    }

    #[test]
    fn csv_source_requires_path() {
        let args = SourceArgs {
            source: Source::Csv,
            csv_path: None,
        };
        assert!(make_provider(&args).is_err());
    }

    #[test]
    fn parses_run_flags() {
        let cli = Cli::try_parse_from([
            "crossbot", "run", "--ticker", "spy", "--short", "10", "--long", "30",
            "--source", "synthetic", "--interval", "5m", "--no-save",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                ticker,
                overrides,
                source,
                no_save,
                ..
            } => {
                assert_eq!(ticker.as_deref(), Some("spy"));
                assert_eq!(overrides.short, Some(10));
                assert_eq!(overrides.interval, Some(Interval::Min5));
                assert_eq!(source.source, Source::Synthetic);
                assert!(no_save);
            }
            _ => panic!("expected run"),
        }
    }
}
