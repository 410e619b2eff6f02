use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use stockanalyser_core::Lookback;

/// Settings for the daily price-change pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// History requested per symbol.
    pub history_period: Lookback,
    /// Observations required before a snapshot is produced (at least 2).
    pub min_required_days: usize,
    pub price_decimal_places: u32,
    pub percentage_decimal_places: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            history_period: Lookback::TwoDays,
            min_required_days: 2,
            price_decimal_places: 2,
            percentage_decimal_places: 2,
        }
    }
}

/// Parameters for the detailed technical report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// History requested for detailed analysis.
    pub history_period: Lookback,
    pub sma_periods: Vec<usize>,
    pub ema_spans: Vec<usize>,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    pub bollinger_std_dev: Decimal,
    pub stochastic_k: usize,
    pub stochastic_d: usize,
    pub signals: SignalConfig,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            history_period: Lookback::OneYear,
            sma_periods: vec![20, 50, 200],
            ema_spans: vec![12, 26],
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bollinger_period: 20,
            bollinger_std_dev: Decimal::TWO,
            stochastic_k: 14,
            stochastic_d: 3,
            signals: SignalConfig::default(),
        }
    }
}

/// Thresholds for signal detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub rsi_overbought: Decimal,
    pub rsi_oversold: Decimal,
    /// Fast/slow SMA periods compared for golden/death crosses.
    pub cross_fast: usize,
    pub cross_slow: usize,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            rsi_overbought: dec!(70),
            rsi_oversold: dec!(30),
            cross_fast: 50,
            cross_slow: 200,
        }
    }
}
