use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::SignalConfig;
use crate::technical::TechnicalReport;

/// A notable condition on the most recent bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Signal {
    /// Fast SMA crossed above the slow SMA.
    GoldenCross { fast: usize, slow: usize },
    /// Fast SMA crossed below the slow SMA.
    DeathCross { fast: usize, slow: usize },
    RsiOverbought { rsi: Decimal },
    RsiOversold { rsi: Decimal },
}

impl Signal {
    pub fn describe(&self) -> String {
        match self {
            Signal::GoldenCross { fast, slow } => {
                format!("Golden cross: SMA{} crossed above SMA{}", fast, slow)
            }
            Signal::DeathCross { fast, slow } => {
                format!("Death cross: SMA{} crossed below SMA{}", fast, slow)
            }
            Signal::RsiOverbought { rsi } => format!("RSI overbought ({:.2})", rsi),
            Signal::RsiOversold { rsi } => format!("RSI oversold ({:.2})", rsi),
        }
    }
}

/// Signals on the final bar of `report`. Indicators that are missing or
/// still warming up contribute nothing.
pub fn detect(report: &TechnicalReport, config: &SignalConfig) -> Vec<Signal> {
    let mut signals = Vec::new();

    if let (Some(fast), Some(slow)) = (
        report.sma_for(config.cross_fast),
        report.sma_for(config.cross_slow),
    ) {
        if let (Some(f_now), Some(s_now), Some(f_prev), Some(s_prev)) =
            (fast.last(), slow.last(), fast.previous(), slow.previous())
        {
            let (fast_p, slow_p) = (config.cross_fast, config.cross_slow);
            if f_now > s_now && f_prev <= s_prev {
                signals.push(Signal::GoldenCross { fast: fast_p, slow: slow_p });
            } else if f_now < s_now && f_prev >= s_prev {
                signals.push(Signal::DeathCross { fast: fast_p, slow: slow_p });
            }
        }
    }

    if let Some(rsi) = report.rsi.last() {
        if rsi > config.rsi_overbought {
            signals.push(Signal::RsiOverbought { rsi });
        } else if rsi < config.rsi_oversold {
            signals.push(Signal::RsiOversold { rsi });
        }
    }

    signals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndicatorConfig;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;
    use stockanalyser_core::{PricePoint, PriceSeries};

    fn close_series(closes: &[Decimal]) -> PriceSeries {
        let start = Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap();
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, c)| PricePoint::close_only(start + Duration::days(i as i64), *c))
            .collect();
        PriceSeries::new("X", points).unwrap()
    }

    fn config(fast: usize, slow: usize) -> IndicatorConfig {
        IndicatorConfig {
            sma_periods: vec![fast, slow],
            signals: SignalConfig {
                cross_fast: fast,
                cross_slow: slow,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_golden_cross_on_last_bar() {
        // Falling then a sharp jump on the final bar
        let closes = [dec!(10), dec!(9), dec!(8), dec!(7), dec!(20)];
        let cfg = config(2, 4);
        let report = TechnicalReport::compute(&close_series(&closes), &cfg).unwrap();
        let signals = detect(&report, &cfg.signals);
        assert!(signals.contains(&Signal::GoldenCross { fast: 2, slow: 4 }));
    }

    #[test]
    fn test_cross_without_configured_smas() {
        let closes = [dec!(10), dec!(9), dec!(8), dec!(7), dec!(20)];
        let cfg = IndicatorConfig {
            sma_periods: vec![3],
            ..config(2, 4)
        };
        let report = TechnicalReport::compute(&close_series(&closes), &cfg).unwrap();
        let signals = detect(&report, &cfg.signals);
        assert!(signals.contains(&Signal::GoldenCross { fast: 2, slow: 4 }));
    }

    #[test]
    fn test_death_cross_on_last_bar() {
        let closes = [dec!(7), dec!(8), dec!(9), dec!(10), dec!(1)];
        let cfg = config(2, 4);
        let report = TechnicalReport::compute(&close_series(&closes), &cfg).unwrap();
        let signals = detect(&report, &cfg.signals);
        assert!(signals.contains(&Signal::DeathCross { fast: 2, slow: 4 }));
    }

    #[test]
    fn test_rsi_overbought() {
        let closes: Vec<Decimal> = (1..=30).map(Decimal::from).collect();
        let cfg = IndicatorConfig::default();
        let report = TechnicalReport::compute(&close_series(&closes), &cfg).unwrap();
        let signals = detect(&report, &cfg.signals);
        assert_eq!(signals, vec![Signal::RsiOverbought { rsi: dec!(100) }]);
    }

    #[test]
    fn test_rsi_oversold() {
        let closes: Vec<Decimal> = (1..=30).rev().map(Decimal::from).collect();
        let cfg = IndicatorConfig::default();
        let report = TechnicalReport::compute(&close_series(&closes), &cfg).unwrap();
        let signals = detect(&report, &cfg.signals);
        assert_eq!(signals, vec![Signal::RsiOversold { rsi: Decimal::ZERO }]);
    }

    #[test]
    fn test_short_history_has_no_signals() {
        let closes = [dec!(1), dec!(2), dec!(3)];
        let cfg = IndicatorConfig::default();
        let report = TechnicalReport::compute(&close_series(&closes), &cfg).unwrap();
        assert!(detect(&report, &cfg.signals).is_empty());
    }
}
