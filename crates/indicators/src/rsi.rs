use crate::{require_non_empty, require_positive, Indicator, IndicatorError, IndicatorSeries};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::VecDeque;

/// Relative Strength Index (RSI).
///
/// Average gain/loss are seeded with the simple mean of the first `period`
/// changes, then follow Wilder's smoothing:
/// `avg = (prev_avg * (period - 1) + current) / period`.
///
/// A zero average loss reports 100 rather than dividing by zero.
#[derive(Debug, Clone)]
pub struct Rsi {
    len: usize,
    prev_value: Option<Decimal>,
    gains: VecDeque<Decimal>,
    losses: VecDeque<Decimal>,
    averages: Option<(Decimal, Decimal)>,
}

impl Rsi {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        require_positive("period", period)?;
        Ok(Self {
            len: period,
            prev_value: None,
            gains: VecDeque::with_capacity(period),
            losses: VecDeque::with_capacity(period),
            averages: None,
        })
    }

    pub fn value(&self) -> Option<Decimal> {
        self.averages.map(|(avg_gain, avg_loss)| {
            if avg_loss.is_zero() {
                dec!(100)
            } else {
                let rs = avg_gain / avg_loss;
                dec!(100) - (dec!(100) / (Decimal::ONE + rs))
            }
        })
    }

    /// Current (average gain, average loss), once seeded.
    pub fn averages(&self) -> Option<(Decimal, Decimal)> {
        self.averages
    }
}

impl Indicator for Rsi {
    fn next(&mut self, value: Decimal) -> Option<Decimal> {
        if let Some(prev) = self.prev_value {
            let change = value - prev;
            let gain = change.max(Decimal::ZERO);
            let loss = (-change).max(Decimal::ZERO);
            let period_dec = Decimal::from(self.len);

            self.averages = match self.averages {
                None => {
                    // Accumulate initial period
                    self.gains.push_back(gain);
                    self.losses.push_back(loss);

                    if self.gains.len() >= self.len {
                        let sum_gain: Decimal = self.gains.iter().sum();
                        let sum_loss: Decimal = self.losses.iter().sum();
                        Some((sum_gain / period_dec, sum_loss / period_dec))
                    } else {
                        None
                    }
                }
                Some((prev_gain, prev_loss)) => {
                    // Wilder's smoothing
                    let keep = period_dec - Decimal::ONE;
                    Some((
                        (prev_gain * keep + gain) / period_dec,
                        (prev_loss * keep + loss) / period_dec,
                    ))
                }
            };
        }

        self.prev_value = Some(value);
        self.value()
    }

    fn reset(&mut self) {
        self.prev_value = None;
        self.gains.clear();
        self.losses.clear();
        self.averages = None;
    }

    fn period(&self) -> usize {
        self.len + 1 // need one extra data point for the first change
    }

    fn is_ready(&self) -> bool {
        self.averages.is_some()
    }
}

/// RSI over a whole series. The first `period` entries are `None`.
pub fn rsi(values: &[Decimal], period: usize) -> Result<IndicatorSeries, IndicatorError> {
    require_non_empty(values)?;
    let mut rsi = Rsi::new(period)?;
    Ok(values.iter().map(|v| rsi.next(*v)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn wilder_sample() -> Vec<Decimal> {
        vec![
            dec!(44), dec!(44.34), dec!(44.09), dec!(43.61), dec!(44.33),
            dec!(44.83), dec!(45.10), dec!(45.42), dec!(45.84), dec!(46.08),
            dec!(45.89), dec!(46.03), dec!(45.61), dec!(46.28), dec!(46.28),
            dec!(46.00), dec!(46.03), dec!(46.41), dec!(46.22), dec!(45.64),
        ]
    }

    #[test]
    fn test_rsi_basic() {
        let mut rsi = Rsi::new(14).unwrap();
        let mut result = None;
        for v in &wilder_sample()[..15] {
            result = rsi.next(*v);
        }
        let rsi_val = result.expect("seeded after 15 values");
        // RSI should be between 0 and 100
        assert!(rsi_val > Decimal::ZERO && rsi_val < dec!(100));
    }

    #[test]
    fn test_rsi_warm_up_region() {
        let closes = wilder_sample();
        let out = rsi(&closes, 14).unwrap();
        assert_eq!(out.len(), closes.len());
        assert!(out.iter().take(14).all(|v| v.is_none()));
        assert!(out.iter().skip(14).all(|v| v.is_some()));
    }

    #[test]
    fn test_rsi_bounded() {
        let closes = wilder_sample();
        let out = rsi(&closes, 5).unwrap();
        assert!(out.defined().all(|v| v >= Decimal::ZERO && v <= dec!(100)));
    }

    #[test]
    fn test_rsi_all_gains_is_100() {
        let closes: Vec<Decimal> = (1..=20).map(Decimal::from).collect();
        let out = rsi(&closes, 14).unwrap();
        assert_eq!(out.last(), Some(dec!(100)));
        assert!(out.defined().all(|v| v == dec!(100)));
    }

    #[test]
    fn test_rsi_all_losses_is_0() {
        let closes: Vec<Decimal> = (1..=20).rev().map(Decimal::from).collect();
        let out = rsi(&closes, 14).unwrap();
        assert!(out.defined().all(|v| v == Decimal::ZERO));
    }

    #[test]
    fn test_rsi_wilder_smoothing() {
        // period 2: changes +2, -1, +3
        let closes = [dec!(10), dec!(12), dec!(11), dec!(14)];
        let mut rsi = Rsi::new(2).unwrap();
        for v in &closes[..3] {
            rsi.next(*v);
        }
        assert_eq!(rsi.averages(), Some((dec!(1), dec!(0.5))));
        rsi.next(closes[3]);
        // gain = (1 * 1 + 3) / 2 = 2, loss = (0.5 * 1 + 0) / 2 = 0.25
        assert_eq!(rsi.averages(), Some((dec!(2), dec!(0.25))));
        // RS = 8 → 100 - 100/9
        assert_eq!(rsi.value(), Some(dec!(100) - dec!(100) / dec!(9)));
    }
}
