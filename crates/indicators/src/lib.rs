pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stochastic;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use bollinger::{bollinger, BollingerBands, BollingerOutput, BollingerSeries};
pub use ema::{ema, Ema};
pub use macd::{macd, Macd, MacdOutput, MacdSeries};
pub use rsi::{rsi, Rsi};
pub use sma::{sma, Sma};
pub use stochastic::{stochastic, Stochastic, StochasticOutput, StochasticSeries};

/// Trait for streaming (incremental) indicators.
/// Feed one value at a time; the indicator maintains internal state.
pub trait Indicator: Send + Sync {
    /// Process the next value and return the indicator output (if ready).
    fn next(&mut self, value: Decimal) -> Option<Decimal>;

    /// Reset the indicator to its initial state.
    fn reset(&mut self);

    /// The minimum number of data points needed before the indicator produces output.
    fn period(&self) -> usize;

    /// Whether the indicator has enough data to produce output.
    fn is_ready(&self) -> bool;
}

/// Errors raised for unusable parameters or inputs.
///
/// Warm-up gaps are never errors; they show up as `None` entries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndicatorError {
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("Insufficient history: need {required} points, got {available}")]
    InsufficientHistory { required: usize, available: usize },
    #[error("Input length mismatch: {0}")]
    LengthMismatch(String),
}

impl IndicatorError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        IndicatorError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Reject zero-length windows.
pub(crate) fn require_positive(name: &'static str, value: usize) -> Result<(), IndicatorError> {
    if value == 0 {
        Err(IndicatorError::invalid(name, "must be > 0"))
    } else {
        Ok(())
    }
}

pub(crate) fn require_non_empty(values: &[Decimal]) -> Result<(), IndicatorError> {
    if values.is_empty() {
        Err(IndicatorError::InsufficientHistory {
            required: 1,
            available: 0,
        })
    } else {
        Ok(())
    }
}

/// Indicator output aligned index-for-index with the input series.
///
/// `None` marks the warm-up region (or any index where the value is undefined).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndicatorSeries(Vec<Option<Decimal>>);

impl IndicatorSeries {
    pub fn new(values: Vec<Option<Decimal>>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value at `index`, `None` if undefined or out of range.
    pub fn get(&self, index: usize) -> Option<Decimal> {
        self.0.get(index).copied().flatten()
    }

    /// Value at the final index, `None` while still warming up.
    pub fn last(&self) -> Option<Decimal> {
        self.0.last().copied().flatten()
    }

    /// Value one index before the final one.
    pub fn previous(&self) -> Option<Decimal> {
        self.0
            .len()
            .checked_sub(2)
            .and_then(|i| self.get(i))
    }

    pub fn defined_count(&self) -> usize {
        self.0.iter().filter(|v| v.is_some()).count()
    }

    /// Defined values only, in order.
    pub fn defined(&self) -> impl Iterator<Item = Decimal> + '_ {
        self.0.iter().filter_map(|v| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<Decimal>> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[Option<Decimal>] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<Option<Decimal>> {
        self.0
    }
}

impl FromIterator<Option<Decimal>> for IndicatorSeries {
    fn from_iter<I: IntoIterator<Item = Option<Decimal>>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromIterator<Decimal> for IndicatorSeries {
    fn from_iter<I: IntoIterator<Item = Decimal>>(iter: I) -> Self {
        Self(iter.into_iter().map(Some).collect())
    }
}
