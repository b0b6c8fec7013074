//! Price series providers: Yahoo Finance, CSV files, synthetic random walks.

pub mod csv_import;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use csv_import::{write_series_csv, CsvProvider};
pub use provider::{
    lookback_range, DataError, DataSource, FetchRequest, Interval, PriceProvider, UnknownInterval,
};
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;
