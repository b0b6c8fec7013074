//! Series loading for the runner.
//!
//! Wraps a [`PriceProvider`] fetch and splits failures in two: the provider
//! had nothing for the ticker/range (`DataUnavailable`), or the fetch itself
//! broke (`FetchFailed`).

use thiserror::Error;
use tracing::{debug, info};

use crossbot_core::data::{DataError, FetchRequest, PriceProvider};
use crossbot_core::Series;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no data for '{ticker}' between {start} and {end} ({source})")]
    DataUnavailable {
        ticker: String,
        start: String,
        end: String,
        #[source]
        source: DataError,
    },

    #[error("fetching '{ticker}' from {provider} failed: {source}")]
    FetchFailed {
        ticker: String,
        provider: String,
        #[source]
        source: DataError,
    },
}

impl LoadError {
    pub fn is_data_unavailable(&self) -> bool {
        matches!(self, LoadError::DataUnavailable { .. })
    }
}

/// Result of loading a series, including provenance.
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub series: Series,
    pub provider: String,
    /// BLAKE3 over every bar's timestamp and close.
    pub dataset_hash: String,
}

/// Fetch the series described by `request` from `provider`.
pub fn load_series(
    provider: &dyn PriceProvider,
    request: &FetchRequest,
) -> Result<LoadedSeries, LoadError> {
    debug!(
        provider = provider.name(),
        ticker = %request.ticker,
        start = %request.start,
        end = %request.end,
        interval = %request.interval,
        "loading series"
    );

    let series = provider.fetch(request).map_err(|source| {
        if source.is_empty_result() {
            LoadError::DataUnavailable {
                ticker: request.ticker.clone(),
                start: request.start.to_string(),
                end: request.end.to_string(),
                source,
            }
        } else {
            LoadError::FetchFailed {
                ticker: request.ticker.clone(),
                provider: provider.name().to_string(),
                source,
            }
        }
    })?;

    // Providers report empty results themselves; this catches one that doesn't.
    if series.is_empty() {
        return Err(LoadError::DataUnavailable {
            ticker: request.ticker.clone(),
            start: request.start.to_string(),
            end: request.end.to_string(),
            source: DataError::NoData {
                ticker: request.ticker.clone(),
            },
        });
    }

    let dataset_hash = compute_dataset_hash(&series);
    info!(
        provider = provider.name(),
        ticker = %request.ticker,
        bars = series.len(),
        "series loaded"
    );

    Ok(LoadedSeries {
        series,
        provider: provider.name().to_string(),
        dataset_hash,
    })
}

/// Compute a BLAKE3 hash over the series for replay fingerprinting.
pub fn compute_dataset_hash(series: &Series) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in series.bars() {
        hasher.update(bar.timestamp.to_string().as_bytes());
        hasher.update(&bar.close.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
