use crate::ema::Ema;
use crate::{require_non_empty, Indicator, IndicatorError, IndicatorSeries};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// MACD (Moving Average Convergence Divergence).
///
/// Composed of three EMAs:
/// - Fast EMA (default 12)
/// - Slow EMA (default 26)
/// - Signal EMA over the MACD line (default 9)
///
/// The EMAs are seeded with the first value, so every component is defined
/// from the first input onward. Early values therefore differ from pandas'
/// default `ewm(adjust=True)` MACD; the two converge once the slow EMA has
/// warmed up.
#[derive(Debug, Clone)]
pub struct Macd {
    fast_ema: Ema,
    slow_ema: Ema,
    signal_ema: Ema,
    last: Option<MacdOutput>,
}

/// MACD output with all three components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacdOutput {
    pub macd: Decimal,
    pub signal: Decimal,
    pub histogram: Decimal,
}

impl Macd {
    pub fn new(fast_span: usize, slow_span: usize, signal_span: usize) -> Result<Self, IndicatorError> {
        if fast_span >= slow_span {
            return Err(IndicatorError::invalid(
                "fast_span",
                format!("must be less than slow span ({} >= {})", fast_span, slow_span),
            ));
        }
        Ok(Self {
            fast_ema: Ema::new(fast_span)?,
            slow_ema: Ema::new(slow_span)?,
            signal_ema: Ema::new(signal_span)?,
            last: None,
        })
    }

    /// Standard MACD (12, 26, 9).
    pub fn default_periods() -> Result<Self, IndicatorError> {
        Self::new(12, 26, 9)
    }

    /// Returns the full MACD output (macd, signal, histogram) if ready.
    pub fn output(&self) -> Option<MacdOutput> {
        self.last
    }

    /// Process next value and return the full output.
    pub fn next_output(&mut self, value: Decimal) -> MacdOutput {
        let fast = self.fast_ema.next(value).unwrap_or(value);
        let slow = self.slow_ema.next(value).unwrap_or(value);
        let macd = fast - slow;
        let signal = self.signal_ema.next(macd).unwrap_or(macd);

        let out = MacdOutput {
            macd,
            signal,
            histogram: macd - signal,
        };
        self.last = Some(out);
        out
    }
}

impl Indicator for Macd {
    fn next(&mut self, value: Decimal) -> Option<Decimal> {
        Some(self.next_output(value).macd)
    }

    fn reset(&mut self) {
        self.fast_ema.reset();
        self.slow_ema.reset();
        self.signal_ema.reset();
        self.last = None;
    }

    fn period(&self) -> usize {
        self.slow_ema.period()
    }

    fn is_ready(&self) -> bool {
        self.last.is_some()
    }
}

/// MACD line, signal line and histogram aligned with the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacdSeries {
    pub macd: IndicatorSeries,
    pub signal: IndicatorSeries,
    pub histogram: IndicatorSeries,
}

impl MacdSeries {
    pub fn latest(&self) -> Option<MacdOutput> {
        Some(MacdOutput {
            macd: self.macd.last()?,
            signal: self.signal.last()?,
            histogram: self.histogram.last()?,
        })
    }
}

/// MACD over a whole series.
pub fn macd(
    values: &[Decimal],
    fast_span: usize,
    slow_span: usize,
    signal_span: usize,
) -> Result<MacdSeries, IndicatorError> {
    require_non_empty(values)?;
    let mut macd = Macd::new(fast_span, slow_span, signal_span)?;

    let mut line = Vec::with_capacity(values.len());
    let mut signal = Vec::with_capacity(values.len());
    let mut histogram = Vec::with_capacity(values.len());
    for value in values {
        let out = macd.next_output(*value);
        line.push(out.macd);
        signal.push(out.signal);
        histogram.push(out.histogram);
    }

    Ok(MacdSeries {
        macd: line.into_iter().collect(),
        signal: signal.into_iter().collect(),
        histogram: histogram.into_iter().collect(),
    })
}
