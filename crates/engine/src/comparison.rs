use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use stockanalyser_core::{Lookback, PriceSeries};
use stockanalyser_indicators::IndicatorSeries;

use crate::analyzer::SymbolFailure;
use crate::error::AnalysisError;

/// Closes rebased so the first one is 100.
pub fn normalize(series: &PriceSeries) -> Result<IndicatorSeries, AnalysisError> {
    let base = series.points()[0].close;
    if base.is_zero() {
        return Err(AnalysisError::InvalidPrice {
            symbol: series.symbol().to_string(),
            price: base,
        });
    }
    Ok(series
        .points()
        .iter()
        .map(|p| p.close / base * Decimal::ONE_HUNDRED)
        .collect())
}

/// One symbol's rebased history.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedSeries {
    pub symbol: String,
    pub name: String,
    pub timestamps: Vec<DateTime<Utc>>,
    pub values: IndicatorSeries,
}

impl NormalizedSeries {
    /// Percent move over the whole window.
    pub fn performance(&self) -> Option<Decimal> {
        self.values.last().map(|v| v - Decimal::ONE_HUNDRED)
    }
}

/// Relative performance of several symbols over the same lookback.
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub lookback: Lookback,
    /// In the order the symbols were requested.
    pub series: Vec<NormalizedSeries>,
    pub failures: Vec<SymbolFailure>,
}

impl Comparison {
    /// Strongest performer; ties go to the first one listed.
    pub fn leader(&self) -> Option<&NormalizedSeries> {
        let mut best: Option<(&NormalizedSeries, Decimal)> = None;
        for series in &self.series {
            let Some(perf) = series.performance() else {
                continue;
            };
            if best.map_or(true, |(_, b)| perf > b) {
                best = Some((series, perf));
            }
        }
        best.map(|(s, _)| s)
    }
}
