use crate::{require_non_empty, require_positive, Indicator, IndicatorError, IndicatorSeries};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Neutral reading used for the warm-up region and for flat ranges.
pub const NEUTRAL: Decimal = dec!(50);

/// Stochastic Oscillator (%K and %D).
///
/// %K = (Close - Lowest Low) / (Highest High - Lowest Low) * 100
/// %D = SMA(%K, d_period)
///
/// Unlike the other indicators this one never leaves gaps: until enough
/// history exists both lines read 50, and a flat range (highest high equal
/// to lowest low) also reads 50.
#[derive(Debug, Clone)]
pub struct Stochastic {
    k_period: usize,
    d_period: usize,
    highs: VecDeque<Decimal>,
    lows: VecDeque<Decimal>,
    k_values: VecDeque<Decimal>,
    current_k: Option<Decimal>,
    current_d: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StochasticOutput {
    pub k: Decimal,
    pub d: Decimal,
}

impl Stochastic {
    pub fn new(k_period: usize, d_period: usize) -> Result<Self, IndicatorError> {
        require_positive("k_period", k_period)?;
        require_positive("d_period", d_period)?;
        Ok(Self {
            k_period,
            d_period,
            highs: VecDeque::with_capacity(k_period),
            lows: VecDeque::with_capacity(k_period),
            k_values: VecDeque::with_capacity(d_period),
            current_k: None,
            current_d: None,
        })
    }

    /// Standard Stochastic (14, 3).
    pub fn default_periods() -> Result<Self, IndicatorError> {
        Self::new(14, 3)
    }

    /// Feed one bar. Always returns a reading; see the type docs for the
    /// fill policy.
    pub fn next_hlc(&mut self, high: Decimal, low: Decimal, close: Decimal) -> StochasticOutput {
        self.highs.push_back(high);
        self.lows.push_back(low);

        if self.highs.len() > self.k_period {
            self.highs.pop_front();
            self.lows.pop_front();
        }

        if self.highs.len() < self.k_period {
            return self.output();
        }

        let highest = self.highs.iter().copied().max().unwrap_or(high);
        let lowest = self.lows.iter().copied().min().unwrap_or(low);

        let range = highest - lowest;
        let k = if range <= Decimal::ZERO {
            NEUTRAL
        } else {
            (((close - lowest) / range) * Decimal::ONE_HUNDRED)
                .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
        };

        self.current_k = Some(k);
        self.k_values.push_back(k);
        if self.k_values.len() > self.d_period {
            self.k_values.pop_front();
        }

        if self.k_values.len() == self.d_period {
            let sum: Decimal = self.k_values.iter().sum();
            self.current_d = Some(sum / Decimal::from(self.d_period));
        }

        self.output()
    }

    /// Latest reading with the neutral fill applied.
    pub fn output(&self) -> StochasticOutput {
        StochasticOutput {
            k: self.current_k.unwrap_or(NEUTRAL),
            d: self.current_d.unwrap_or(NEUTRAL),
        }
    }
}

impl Indicator for Stochastic {
    fn next(&mut self, value: Decimal) -> Option<Decimal> {
        // Simplified: use value as high, low, and close
        Some(self.next_hlc(value, value, value).k)
    }

    fn reset(&mut self) {
        self.highs.clear();
        self.lows.clear();
        self.k_values.clear();
        self.current_k = None;
        self.current_d = None;
    }

    fn period(&self) -> usize {
        self.k_period + self.d_period - 1
    }

    /// True once %D is backed by real %K values rather than the fill.
    fn is_ready(&self) -> bool {
        self.current_d.is_some()
    }
}

/// %K and %D aligned with the input; every entry is defined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StochasticSeries {
    pub k: IndicatorSeries,
    pub d: IndicatorSeries,
}

impl StochasticSeries {
    pub fn latest(&self) -> Option<StochasticOutput> {
        Some(StochasticOutput {
            k: self.k.last()?,
            d: self.d.last()?,
        })
    }
}

/// Stochastic Oscillator over a whole series.
pub fn stochastic(
    highs: &[Decimal],
    lows: &[Decimal],
    closes: &[Decimal],
    k_period: usize,
    d_period: usize,
) -> Result<StochasticSeries, IndicatorError> {
    require_non_empty(closes)?;
    if highs.len() != closes.len() || lows.len() != closes.len() {
        return Err(IndicatorError::LengthMismatch(format!(
            "highs={}, lows={}, closes={}",
            highs.len(),
            lows.len(),
            closes.len()
        )));
    }
    let mut stoch = Stochastic::new(k_period, d_period)?;

    let (k, d): (Vec<Decimal>, Vec<Decimal>) = highs
        .iter()
        .zip(lows)
        .zip(closes)
        .map(|((h, l), c)| {
            let out = stoch.next_hlc(*h, *l, *c);
            (out.k, out.d)
        })
        .unzip();

    Ok(StochasticSeries {
        k: k.into_iter().collect(),
        d: d.into_iter().collect(),
    })
}
