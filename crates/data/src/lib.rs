pub mod csv_loader;
pub mod yahoo;

use async_trait::async_trait;
use std::path::PathBuf;
use stockanalyser_core::{FetchError, Lookback, PriceProvider, PriceSeries};
use tracing::debug;

pub use yahoo::{YahooConfig, YahooProvider};

/// A CSV-file-based provider: one `{SYMBOL}.csv` per symbol in a directory.
///
/// The lookback is applied by keeping the trailing
/// [`Lookback::trading_days`] rows.
#[derive(Debug, Clone)]
pub struct CsvDataProvider {
    pub directory: PathBuf,
}

impl CsvDataProvider {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Symbols with a CSV file in the directory, sorted.
    pub fn available_symbols(&self) -> Result<Vec<String>, FetchError> {
        let mut symbols = Vec::new();
        for entry in std::fs::read_dir(&self.directory)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "csv").unwrap_or(false) {
                if let Some(stem) = path.file_stem() {
                    symbols.push(stem.to_string_lossy().to_string());
                }
            }
        }
        symbols.sort();
        Ok(symbols)
    }
}

#[async_trait]
impl PriceProvider for CsvDataProvider {
    async fn fetch(&self, symbol: &str, lookback: Lookback) -> Result<PriceSeries, FetchError> {
        let file_path = self.directory.join(format!("{}.csv", symbol));
        if !file_path.exists() {
            return Err(FetchError::NoData(format!(
                "CSV file not found: {}",
                file_path.display()
            )));
        }

        debug!(%symbol, path = %file_path.display(), "Loading CSV");
        let series = tokio::task::spawn_blocking(move || csv_loader::load_series_from_csv(&file_path))
            .await
            .map_err(|e| FetchError::Io(std::io::Error::other(e)))??;

        Ok(match lookback.trading_days() {
            Some(days) => series.tail(days),
            None => series,
        })
    }

    fn name(&self) -> &str {
        "csv"
    }
}
