use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use stockanalyser_core::PriceSeries;
use stockanalyser_indicators::{
    bollinger, ema, macd, rsi, sma, stochastic, BollingerOutput, BollingerSeries, IndicatorSeries,
    MacdOutput, MacdSeries, StochasticOutput, StochasticSeries,
};
use tracing::{debug, warn};

use crate::config::IndicatorConfig;
use crate::error::AnalysisError;

/// Summary statistics over the fetched window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceMetrics {
    pub current_price: Decimal,
    /// `None` with fewer than two observations.
    pub change: Option<Decimal>,
    pub change_percent: Option<Decimal>,
    pub period_high: Decimal,
    pub period_low: Decimal,
    pub last_volume: Option<Decimal>,
    pub average_volume: Option<Decimal>,
}

impl PriceMetrics {
    fn compute(series: &PriceSeries) -> Self {
        let closes = series.closes();
        let current_price = series.last().close;
        let previous = closes.len().checked_sub(2).map(|i| closes[i]);

        let change = previous.map(|p| current_price - p);
        let change_percent = previous
            .zip(change)
            .filter(|(p, _)| !p.is_zero())
            .map(|(p, c)| c / p * Decimal::ONE_HUNDRED);

        // Fall back to closes when the provider has no high/low columns.
        let highs = series.highs().unwrap_or_else(|| closes.clone());
        let lows = series.lows().unwrap_or_else(|| closes.clone());
        let period_high = highs.iter().copied().max().unwrap_or(current_price);
        let period_low = lows.iter().copied().min().unwrap_or(current_price);

        let volumes = series.volumes();
        let last_volume = volumes.as_ref().and_then(|v| v.last().copied());
        let average_volume = volumes
            .filter(|v| !v.is_empty())
            .map(|v| v.iter().sum::<Decimal>() / Decimal::from(v.len()));

        Self {
            current_price,
            change,
            change_percent,
            period_high,
            period_low,
            last_volume,
            average_volume,
        }
    }
}

/// One indicator series tagged with its window length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowedSeries {
    pub period: usize,
    pub values: IndicatorSeries,
}

/// Every indicator computed over one symbol's history, index-aligned with
/// [`TechnicalReport::timestamps`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechnicalReport {
    pub symbol: String,
    pub timestamps: Vec<DateTime<Utc>>,
    pub closes: Vec<Decimal>,
    pub metrics: PriceMetrics,
    pub sma: Vec<WindowedSeries>,
    pub ema: Vec<WindowedSeries>,
    pub rsi: IndicatorSeries,
    pub macd: MacdSeries,
    pub bollinger: BollingerSeries,
    /// Absent when the provider supplied no high/low columns.
    pub stochastic: Option<StochasticSeries>,
}

impl TechnicalReport {
    pub fn compute(series: &PriceSeries, config: &IndicatorConfig) -> Result<Self, AnalysisError> {
        let closes = series.closes();
        debug!(symbol = %series.symbol(), points = closes.len(), "Computing indicators");

        // Cross detection reads the fast and slow SMAs from the report
        let mut sma_periods = config.sma_periods.clone();
        for period in [config.signals.cross_fast, config.signals.cross_slow] {
            if !sma_periods.contains(&period) {
                sma_periods.push(period);
            }
        }
        let sma = sma_periods
            .iter()
            .map(|&period| {
                Ok(WindowedSeries {
                    period,
                    values: sma(&closes, period)?,
                })
            })
            .collect::<Result<Vec<_>, AnalysisError>>()?;
        let ema = config
            .ema_spans
            .iter()
            .map(|&span| {
                Ok(WindowedSeries {
                    period: span,
                    values: ema(&closes, span)?,
                })
            })
            .collect::<Result<Vec<_>, AnalysisError>>()?;

        let rsi = rsi(&closes, config.rsi_period)?;
        let macd = macd(&closes, config.macd_fast, config.macd_slow, config.macd_signal)?;
        let bollinger = bollinger(&closes, config.bollinger_period, config.bollinger_std_dev)?;

        let stochastic = match (series.highs(), series.lows()) {
            (Some(highs), Some(lows)) => Some(stochastic(
                &highs,
                &lows,
                &closes,
                config.stochastic_k,
                config.stochastic_d,
            )?),
            _ => {
                warn!(symbol = %series.symbol(), "No high/low columns, skipping stochastic oscillator");
                None
            }
        };

        Ok(Self {
            symbol: series.symbol().to_string(),
            timestamps: series.points().iter().map(|p| p.timestamp).collect(),
            metrics: PriceMetrics::compute(series),
            closes,
            sma,
            ema,
            rsi,
            macd,
            bollinger,
            stochastic,
        })
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    /// SMA series for `period`, if it was configured.
    pub fn sma_for(&self, period: usize) -> Option<&IndicatorSeries> {
        self.sma.iter().find(|s| s.period == period).map(|s| &s.values)
    }

    pub fn ema_for(&self, span: usize) -> Option<&IndicatorSeries> {
        self.ema.iter().find(|s| s.period == span).map(|s| &s.values)
    }

    /// Final-bar reading of every indicator.
    pub fn latest(&self) -> LatestReadings {
        LatestReadings {
            symbol: self.symbol.clone(),
            as_of: self.timestamps.last().copied(),
            close: self.closes.last().copied(),
            sma: self.sma.iter().map(|s| (s.period, s.values.last())).collect(),
            ema: self.ema.iter().map(|s| (s.period, s.values.last())).collect(),
            rsi: self.rsi.last(),
            macd: self.macd.latest(),
            bollinger: self.bollinger.latest(),
            stochastic: self.stochastic.as_ref().and_then(|s| s.latest()),
        }
    }
}

/// Last value of every series in a [`TechnicalReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestReadings {
    pub symbol: String,
    pub as_of: Option<DateTime<Utc>>,
    pub close: Option<Decimal>,
    pub sma: Vec<(usize, Option<Decimal>)>,
    pub ema: Vec<(usize, Option<Decimal>)>,
    pub rsi: Option<Decimal>,
    pub macd: Option<MacdOutput>,
    pub bollinger: Option<BollingerOutput>,
    pub stochastic: Option<StochasticOutput>,
}
