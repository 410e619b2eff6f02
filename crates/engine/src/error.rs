use rust_decimal::Decimal;
use stockanalyser_core::FetchError;
use stockanalyser_indicators::IndicatorError;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Insufficient history for {symbol}: got {available}, need {required}")]
    InsufficientHistory {
        symbol: String,
        required: usize,
        available: usize,
    },
    #[error("Invalid reference price for {symbol}: {price}")]
    InvalidPrice { symbol: String, price: Decimal },
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Indicator(#[from] IndicatorError),
    #[error("Fetch task failed: {0}")]
    Task(String),
    #[error("No data available for analysis")]
    NoData,
}
