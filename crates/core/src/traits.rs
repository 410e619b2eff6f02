use crate::models::*;
use async_trait::async_trait;

// ---------------------------------------------------------------------------
// Price Provider Trait
// ---------------------------------------------------------------------------

/// Errors that can occur while fetching price history.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("No data for {0}")]
    NoData(String),
    #[error("Insufficient history for {symbol}: got {available}, need {required}")]
    InsufficientHistory {
        symbol: String,
        required: usize,
        available: usize,
    },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid series: {0}")]
    InvalidSeries(#[from] SeriesError),
}

/// Supplies daily price history for a symbol.
///
/// Implementations validate their raw data into a [`PriceSeries`] so
/// consumers never see unordered or empty histories.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Fetch the most recent `lookback` of history for `symbol`.
    async fn fetch(&self, symbol: &str, lookback: Lookback) -> Result<PriceSeries, FetchError>;

    /// Short provider name used in logs.
    fn name(&self) -> &str;
}
