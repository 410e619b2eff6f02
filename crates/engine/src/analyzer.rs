use chrono::Utc;
use futures_util::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use stockanalyser_core::*;
use tracing::{info, warn};

use crate::comparison::{self, Comparison, NormalizedSeries};
use crate::config::{AnalysisConfig, IndicatorConfig};
use crate::error::AnalysisError;
use crate::positions;
use crate::signals::{self, Signal};
use crate::snapshot;
use crate::summary;
use crate::technical::TechnicalReport;

/// A symbol that dropped out of a run, and why.
#[derive(Debug, Clone, Serialize)]
pub struct SymbolFailure {
    pub symbol: String,
    pub reason: String,
}

/// Everything produced by one portfolio pass.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRun {
    /// Successful snapshots, in portfolio order.
    pub snapshots: Vec<StockSnapshot>,
    pub summary: PortfolioSummary,
    pub failures: Vec<SymbolFailure>,
    /// Present only when some holding carries a quantity and average price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positions: Option<PositionsSummary>,
}

/// Detailed analysis of a single symbol.
#[derive(Debug, Clone, Serialize)]
pub struct TechnicalAnalysis {
    pub name: String,
    pub report: TechnicalReport,
    pub signals: Vec<Signal>,
}

/// Fetches every portfolio symbol concurrently and aggregates the results.
pub struct PortfolioAnalyzer<P: PriceProvider + 'static> {
    provider: Arc<P>,
    config: AnalysisConfig,
}

impl<P: PriceProvider + 'static> PortfolioAnalyzer<P> {
    pub fn new(provider: P, config: AnalysisConfig) -> Self {
        Self {
            provider: Arc::new(provider),
            config,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Snapshot every holding, dropping the ones that fail.
    ///
    /// Fetches run as independent tasks; all of them are awaited before
    /// aggregating. Only a run with no successful symbol is an error.
    pub async fn run(&self, portfolio: &Portfolio) -> Result<AnalysisRun, AnalysisError> {
        info!(
            portfolio = %portfolio.name,
            symbols = portfolio.len(),
            provider = self.provider.name(),
            period = %self.config.history_period,
            "Starting portfolio analysis"
        );

        let computed_at = Utc::now();
        let fetched = self
            .fetch_all(&portfolio.holdings, self.config.history_period)
            .await;

        let mut snapshots = Vec::new();
        let mut failures = Vec::new();
        for (holding, result) in fetched {
            let result = result.and_then(|series| {
                snapshot::price_change(&series, &holding.name, &self.config, computed_at)
            });
            match result {
                Ok(snapshot) => {
                    info!(
                        symbol = %snapshot.symbol,
                        price = %snapshot.current_price,
                        change_pct = %snapshot.percentage_change,
                        "Snapshot ready"
                    );
                    snapshots.push(snapshot);
                }
                Err(e) => failures.push(skipped(holding, e)),
            }
        }

        let summary = summary::summarize(&snapshots)?;
        let positions = positions::value_positions(portfolio, &snapshots, &self.config);
        info!(
            succeeded = snapshots.len(),
            failed = failures.len(),
            "Portfolio analysis complete"
        );

        Ok(AnalysisRun {
            snapshots,
            summary,
            failures,
            positions,
        })
    }

    /// Fetch a longer history for one symbol and run every indicator on it.
    pub async fn technical(
        &self,
        symbol: &str,
        portfolio: &Portfolio,
        config: &IndicatorConfig,
    ) -> Result<TechnicalAnalysis, AnalysisError> {
        info!(%symbol, period = %config.history_period, "Starting technical analysis");
        let series = self.provider.fetch(symbol, config.history_period).await?;
        let report = TechnicalReport::compute(&series, config)?;
        let signals = signals::detect(&report, &config.signals);

        Ok(TechnicalAnalysis {
            name: portfolio.name_for(symbol).to_string(),
            report,
            signals,
        })
    }

    /// Rebase several symbols to 100 over the same lookback.
    ///
    /// Symbols are fetched concurrently and reported in request order.
    /// Only a comparison with no usable symbol is an error.
    pub async fn compare(
        &self,
        symbols: &[String],
        portfolio: &Portfolio,
        lookback: Lookback,
    ) -> Result<Comparison, AnalysisError> {
        info!(symbols = symbols.len(), %lookback, "Starting comparison");
        let holdings: Vec<Holding> = symbols
            .iter()
            .map(|s| Holding::new(s.as_str(), portfolio.name_for(s)))
            .collect();

        let mut series = Vec::new();
        let mut failures = Vec::new();
        for (holding, result) in self.fetch_all(&holdings, lookback).await {
            let result = result.and_then(|s| {
                let values = comparison::normalize(&s)?;
                Ok(NormalizedSeries {
                    symbol: holding.symbol.clone(),
                    name: holding.name.clone(),
                    timestamps: s.points().iter().map(|p| p.timestamp).collect(),
                    values: values
                        .iter()
                        .map(|v| v.map(|v| v.round_dp(self.config.percentage_decimal_places)))
                        .collect(),
                })
            });
            match result {
                Ok(normalized) => series.push(normalized),
                Err(e) => failures.push(skipped(holding, e)),
            }
        }

        if series.is_empty() {
            return Err(AnalysisError::NoData);
        }
        Ok(Comparison {
            lookback,
            series,
            failures,
        })
    }

    /// Fetch every holding in its own task, keeping input order.
    async fn fetch_all(
        &self,
        holdings: &[Holding],
        lookback: Lookback,
    ) -> Vec<(Holding, Result<PriceSeries, AnalysisError>)> {
        let tasks = holdings.iter().map(|holding| {
            let provider = Arc::clone(&self.provider);
            let symbol = holding.symbol.clone();
            tokio::spawn(async move { provider.fetch(&symbol, lookback).await })
        });
        let results = join_all(tasks).await;

        holdings
            .iter()
            .cloned()
            .zip(results)
            .map(|(holding, joined)| {
                let result = match joined {
                    Ok(fetched) => fetched.map_err(AnalysisError::from),
                    Err(e) => Err(AnalysisError::Task(e.to_string())),
                };
                (holding, result)
            })
            .collect()
    }
}

fn skipped(holding: Holding, error: AnalysisError) -> SymbolFailure {
    warn!(symbol = %holding.symbol, error = %error, "Skipping symbol");
    SymbolFailure {
        symbol: holding.symbol,
        reason: error.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    /// In-memory provider keyed by symbol.
    pub(crate) struct MockProvider {
        closes: HashMap<String, Vec<Decimal>>,
    }

    impl MockProvider {
        pub(crate) fn new(data: Vec<(&str, Vec<Decimal>)>) -> Self {
            Self {
                closes: data
                    .into_iter()
                    .map(|(s, c)| (s.to_string(), c))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl PriceProvider for MockProvider {
        async fn fetch(&self, symbol: &str, lookback: Lookback) -> Result<PriceSeries, FetchError> {
            let closes = self
                .closes
                .get(symbol)
                .ok_or_else(|| FetchError::NoData(symbol.to_string()))?;
            let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            let points = closes
                .iter()
                .enumerate()
                .map(|(i, c)| PricePoint::close_only(start + Duration::days(i as i64), *c))
                .collect();
            let series = PriceSeries::new(symbol, points)?;
            Ok(match lookback.trading_days() {
                Some(days) => series.tail(days),
                None => series,
            })
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    fn portfolio() -> Portfolio {
        Portfolio::new(
            "TEST",
            vec![
                Holding::new("AAA", "Alpha"),
                Holding::new("BBB", "Beta"),
                Holding::new("CCC", "Gamma"),
                Holding::new("DDD", "Delta"),
                Holding::new("EEE", "Missing"),
                Holding::new("FFF", "Short"),
            ],
        )
    }

    #[tokio::test]
    async fn test_run_aggregates_and_drops_failures() {
        let provider = MockProvider::new(vec![
            ("AAA", vec![dec!(90), dec!(100), dec!(105)]),
            ("BBB", vec![dec!(50), dec!(49)]),
            ("CCC", vec![dec!(10), dec!(10)]),
            ("DDD", vec![dec!(20), dec!(21)]),
            ("FFF", vec![dec!(5)]),
        ]);
        let analyzer = PortfolioAnalyzer::new(provider, AnalysisConfig::default());
        let run = analyzer.run(&portfolio()).await.unwrap();

        let symbols: Vec<&str> = run.snapshots.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAA", "BBB", "CCC", "DDD"]);
        assert_eq!(run.snapshots[0].name, "Alpha");
        assert_eq!(run.snapshots[0].percentage_change, dec!(5.00));

        assert_eq!(run.summary.up, 2);
        assert_eq!(run.summary.down, 1);
        assert_eq!(run.summary.stable, 1);
        assert_eq!(run.summary.average_change, dec!(2));
        // AAA and DDD both +5%; the first one wins
        assert_eq!(run.summary.best.symbol, "AAA");
        assert_eq!(run.summary.worst.symbol, "BBB");

        let failed: Vec<&str> = run.failures.iter().map(|f| f.symbol.as_str()).collect();
        assert_eq!(failed, vec!["EEE", "FFF"]);
    }

    #[tokio::test]
    async fn test_run_values_positions() {
        let portfolio = Portfolio::new(
            "HELD",
            vec![
                Holding::new("AAA", "Alpha").with_position(dec!(10), dec!(100)),
                Holding::new("BBB", "Beta"),
            ],
        );
        let provider = MockProvider::new(vec![
            ("AAA", vec![dec!(100), dec!(110)]),
            ("BBB", vec![dec!(50), dec!(49)]),
        ]);
        let analyzer = PortfolioAnalyzer::new(provider, AnalysisConfig::default());
        let run = analyzer.run(&portfolio).await.unwrap();

        let positions = run.positions.unwrap();
        assert_eq!(positions.positions.len(), 1);
        assert_eq!(positions.positions[0].value, dec!(1100));
        assert_eq!(positions.total_pnl, dec!(100));
        assert_eq!(positions.total_pnl_percent, dec!(10));
    }

    #[tokio::test]
    async fn test_run_without_positions() {
        let provider = MockProvider::new(vec![("AAA", vec![dec!(1), dec!(2)])]);
        let analyzer = PortfolioAnalyzer::new(provider, AnalysisConfig::default());
        let run = analyzer.run(&portfolio()).await.unwrap();
        assert!(run.positions.is_none());
    }

    #[tokio::test]
    async fn test_run_with_nothing_usable_is_no_data() {
        let analyzer = PortfolioAnalyzer::new(MockProvider::new(vec![]), AnalysisConfig::default());
        let err = analyzer.run(&portfolio()).await.unwrap_err();
        assert!(matches!(err, AnalysisError::NoData));
    }

    #[tokio::test]
    async fn test_technical_analysis() {
        let closes: Vec<Decimal> = (1..=40).map(Decimal::from).collect();
        let analyzer = PortfolioAnalyzer::new(
            MockProvider::new(vec![("AAA", closes)]),
            AnalysisConfig::default(),
        );
        let analysis = analyzer
            .technical("AAA", &portfolio(), &IndicatorConfig::default())
            .await
            .unwrap();
        assert_eq!(analysis.name, "Alpha");
        assert_eq!(analysis.report.len(), 40);
        assert_eq!(analysis.report.rsi.last(), Some(dec!(100)));
        assert!(analysis
            .signals
            .iter()
            .any(|s| matches!(s, Signal::RsiOverbought { .. })));
    }

    #[tokio::test]
    async fn test_technical_unknown_symbol() {
        let analyzer = PortfolioAnalyzer::new(MockProvider::new(vec![]), AnalysisConfig::default());
        let err = analyzer
            .technical("ZZZ", &portfolio(), &IndicatorConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Fetch(FetchError::NoData(_))));
    }
}
