use crate::{require_non_empty, require_positive, Indicator, IndicatorError, IndicatorSeries};
use rust_decimal::Decimal;
use std::collections::VecDeque;

/// Simple Moving Average (SMA).
#[derive(Debug, Clone)]
pub struct Sma {
    len: usize,
    buffer: VecDeque<Decimal>,
    sum: Decimal,
}

impl Sma {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        require_positive("period", period)?;
        Ok(Self {
            len: period,
            buffer: VecDeque::with_capacity(period),
            sum: Decimal::ZERO,
        })
    }

    /// Get the current SMA value without feeding new data.
    pub fn value(&self) -> Option<Decimal> {
        if self.buffer.len() == self.len {
            Some(self.sum / Decimal::from(self.len))
        } else {
            None
        }
    }

    /// Values currently in the window, oldest first.
    pub fn window(&self) -> impl Iterator<Item = &Decimal> {
        self.buffer.iter()
    }
}

impl Indicator for Sma {
    fn next(&mut self, value: Decimal) -> Option<Decimal> {
        self.sum += value;
        self.buffer.push_back(value);

        if self.buffer.len() > self.len {
            if let Some(removed) = self.buffer.pop_front() {
                self.sum -= removed;
            }
        }

        self.value()
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.sum = Decimal::ZERO;
    }

    fn period(&self) -> usize {
        self.len
    }

    fn is_ready(&self) -> bool {
        self.buffer.len() == self.len
    }
}

/// SMA over a whole series.
///
/// The first `period - 1` entries are `None`. A period longer than the
/// series yields an all-`None` series rather than an error.
pub fn sma(values: &[Decimal], period: usize) -> Result<IndicatorSeries, IndicatorError> {
    require_non_empty(values)?;
    let mut sma = Sma::new(period)?;
    Ok(values.iter().map(|v| sma.next(*v)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sma_basic() {
        let mut sma = Sma::new(3).unwrap();
        assert_eq!(sma.next(dec!(1)), None);
        assert_eq!(sma.next(dec!(2)), None);
        assert_eq!(sma.next(dec!(3)), Some(dec!(2)));
        assert_eq!(sma.next(dec!(4)), Some(dec!(3)));
        assert_eq!(sma.next(dec!(5)), Some(dec!(4)));
    }

    #[test]
    fn test_sma_reset() {
        let mut sma = Sma::new(2).unwrap();
        sma.next(dec!(10));
        sma.next(dec!(20));
        sma.reset();
        assert!(!sma.is_ready());
        assert_eq!(sma.next(dec!(5)), None);
        assert_eq!(sma.next(dec!(15)), Some(dec!(10)));
    }

    #[test]
    fn test_sma_series_alignment() {
        let closes = [dec!(10), dec!(11), dec!(12), dec!(13), dec!(14)];
        let out = sma(&closes, 3).unwrap();
        assert_eq!(out.len(), closes.len());
        assert_eq!(out.defined_count(), closes.len() - 3 + 1);
        assert_eq!(
            out.as_slice(),
            &[None, None, Some(dec!(11)), Some(dec!(12)), Some(dec!(13))]
        );
    }

    #[test]
    fn test_sma_period_longer_than_series() {
        let out = sma(&[dec!(1), dec!(2)], 5).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out.defined_count(), 0);
    }

    #[test]
    fn test_sma_rejects_zero_period_and_empty_input() {
        assert!(matches!(
            sma(&[dec!(1)], 0),
            Err(IndicatorError::InvalidParameter { .. })
        ));
        assert_eq!(
            sma(&[], 3),
            Err(IndicatorError::InsufficientHistory { required: 1, available: 0 })
        );
    }
}
