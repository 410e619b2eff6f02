use crate::sma::Sma;
use crate::{require_non_empty, Indicator, IndicatorError, IndicatorSeries};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Bollinger Bands.
///
/// Middle band is the SMA; the bands sit `num_std` sample standard
/// deviations (n - 1 denominator) above and below it.
/// Returns the middle band from `next()`. Use `next_output()` for everything.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    len: usize,
    num_std: Decimal,
    sma: Sma,
    buffer: VecDeque<Decimal>,
    last: Option<BollingerOutput>,
}

/// Bollinger Bands output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BollingerOutput {
    pub upper: Decimal,
    pub middle: Decimal,
    pub lower: Decimal,
    /// `(upper - lower) / middle * 100`; `None` when the middle band is zero.
    pub bandwidth: Option<Decimal>,
    /// `(close - lower) / (upper - lower)`; `None` for a zero-width band.
    pub percent_b: Option<Decimal>,
}

impl BollingerBands {
    pub fn new(period: usize, num_std_dev: Decimal) -> Result<Self, IndicatorError> {
        if period < 2 {
            return Err(IndicatorError::invalid(
                "period",
                "must be >= 2 for a sample standard deviation",
            ));
        }
        if num_std_dev.is_sign_negative() && !num_std_dev.is_zero() {
            return Err(IndicatorError::invalid("num_std_dev", "must be >= 0"));
        }
        Ok(Self {
            len: period,
            num_std: num_std_dev,
            sma: Sma::new(period)?,
            buffer: VecDeque::with_capacity(period),
            last: None,
        })
    }

    /// Standard Bollinger Bands (20, 2).
    pub fn default_periods() -> Result<Self, IndicatorError> {
        Self::new(20, Decimal::TWO)
    }

    /// Sample standard deviation of the values in the buffer.
    fn std_dev(&self, mean: Decimal) -> Decimal {
        if self.buffer.len() < 2 {
            return Decimal::ZERO;
        }
        let variance: Decimal = self
            .buffer
            .iter()
            .map(|v| {
                let diff = *v - mean;
                diff * diff
            })
            .sum::<Decimal>()
            / Decimal::from(self.buffer.len() - 1);

        decimal_sqrt(variance)
    }

    pub fn output(&self) -> Option<BollingerOutput> {
        self.last
    }

    pub fn next_output(&mut self, value: Decimal) -> Option<BollingerOutput> {
        self.buffer.push_back(value);
        if self.buffer.len() > self.len {
            self.buffer.pop_front();
        }

        if let Some(middle) = self.sma.next(value) {
            let spread = self.num_std * self.std_dev(middle);
            let upper = middle + spread;
            let lower = middle - spread;
            let width = upper - lower;

            let bandwidth = if middle.is_zero() {
                None
            } else {
                Some(width / middle * Decimal::ONE_HUNDRED)
            };
            let percent_b = if width.is_zero() {
                None
            } else {
                Some((value - lower) / width)
            };

            self.last = Some(BollingerOutput {
                upper,
                middle,
                lower,
                bandwidth,
                percent_b,
            });
        }

        self.last
    }
}

impl Indicator for BollingerBands {
    fn next(&mut self, value: Decimal) -> Option<Decimal> {
        self.next_output(value).map(|o| o.middle)
    }

    fn reset(&mut self) {
        self.sma.reset();
        self.buffer.clear();
        self.last = None;
    }

    fn period(&self) -> usize {
        self.len
    }

    fn is_ready(&self) -> bool {
        self.last.is_some()
    }
}

/// All Bollinger components aligned with the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BollingerSeries {
    pub upper: IndicatorSeries,
    pub middle: IndicatorSeries,
    pub lower: IndicatorSeries,
    pub bandwidth: IndicatorSeries,
    pub percent_b: IndicatorSeries,
}

impl BollingerSeries {
    /// Components at the final index, if past the warm-up region.
    pub fn latest(&self) -> Option<BollingerOutput> {
        Some(BollingerOutput {
            upper: self.upper.last()?,
            middle: self.middle.last()?,
            lower: self.lower.last()?,
            bandwidth: self.bandwidth.last(),
            percent_b: self.percent_b.last(),
        })
    }
}

/// Bollinger Bands over a whole series. The first `period - 1` entries of
/// every component are `None`.
pub fn bollinger(
    values: &[Decimal],
    period: usize,
    num_std_dev: Decimal,
) -> Result<BollingerSeries, IndicatorError> {
    require_non_empty(values)?;
    let mut bands = BollingerBands::new(period, num_std_dev)?;

    let outputs: Vec<Option<BollingerOutput>> =
        values.iter().map(|v| bands.next_output(*v)).collect();
    let component = |f: fn(&BollingerOutput) -> Option<Decimal>| -> IndicatorSeries {
        outputs.iter().map(|o| o.as_ref().and_then(f)).collect()
    };

    Ok(BollingerSeries {
        upper: component(|o| Some(o.upper)),
        middle: component(|o| Some(o.middle)),
        lower: component(|o| Some(o.lower)),
        bandwidth: component(|o| o.bandwidth),
        percent_b: component(|o| o.percent_b),
    })
}

/// Newton's method square root for Decimal.
pub fn decimal_sqrt(value: Decimal) -> Decimal {
    if value.is_zero() || value < Decimal::ZERO {
        return Decimal::ZERO;
    }
    let mut guess = if value > Decimal::ONE {
        value / Decimal::TWO
    } else {
        Decimal::ONE
    };
    let epsilon = Decimal::new(1, 16);
    for _ in 0..100 {
        let next_guess = (guess + value / guess) / Decimal::TWO;
        let diff = (next_guess - guess).abs();
        guess = next_guess;
        if diff < epsilon {
            break;
        }
    }
    guess
}
