use crate::{require_non_empty, require_positive, Indicator, IndicatorError, IndicatorSeries};
use rust_decimal::Decimal;

/// Exponential Moving Average (EMA).
///
/// Smoothing factor `α = 2 / (span + 1)`. Seeded with the first observation,
/// so output is defined from the very first value; early values carry little
/// history and should be read as low-confidence.
#[derive(Debug, Clone)]
pub struct Ema {
    len: usize,
    multiplier: Decimal,
    current: Option<Decimal>,
}

impl Ema {
    pub fn new(span: usize) -> Result<Self, IndicatorError> {
        require_positive("span", span)?;
        let multiplier = Decimal::TWO / (Decimal::from(span) + Decimal::ONE);
        Ok(Self {
            len: span,
            multiplier,
            current: None,
        })
    }

    pub fn value(&self) -> Option<Decimal> {
        self.current
    }

    pub fn multiplier(&self) -> Decimal {
        self.multiplier
    }
}

impl Indicator for Ema {
    fn next(&mut self, value: Decimal) -> Option<Decimal> {
        let ema = match self.current {
            None => value,
            Some(prev) => (value - prev) * self.multiplier + prev,
        };
        self.current = Some(ema);
        self.current
    }

    fn reset(&mut self) {
        self.current = None;
    }

    fn period(&self) -> usize {
        self.len
    }

    fn is_ready(&self) -> bool {
        self.current.is_some()
    }
}

/// EMA over a whole series; every entry is defined.
pub fn ema(values: &[Decimal], span: usize) -> Result<IndicatorSeries, IndicatorError> {
    require_non_empty(values)?;
    let mut ema = Ema::new(span)?;
    Ok(values.iter().map(|v| ema.next(*v)).collect())
}
