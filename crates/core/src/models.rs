use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Market Data
// ---------------------------------------------------------------------------

/// A single daily OHLCV observation.
///
/// Only `close` is guaranteed; the other columns depend on the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Decimal,
    pub volume: Option<Decimal>,
}

impl PricePoint {
    /// A close-only observation.
    pub fn close_only(timestamp: DateTime<Utc>, close: Decimal) -> Self {
        Self {
            timestamp,
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
        }
    }

    /// A full OHLCV observation.
    pub fn ohlcv(
        timestamp: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Self {
        Self {
            timestamp,
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close,
            volume: Some(volume),
        }
    }
}

/// Reasons a sequence of points cannot form a [`PriceSeries`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeriesError {
    #[error("Price series for {0} is empty")]
    Empty(String),
    #[error("Timestamps must be strictly increasing (index {index})")]
    NonIncreasingTimestamps { index: usize },
    #[error("Negative {field} at index {index}")]
    NegativeValue { index: usize, field: &'static str },
}

/// Chronologically ordered, non-empty price history for one symbol.
///
/// Invariants are checked once in [`PriceSeries::new`]; everything downstream
/// relies on them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Result<Self, SeriesError> {
        let symbol = symbol.into();
        if points.is_empty() {
            return Err(SeriesError::Empty(symbol));
        }

        for (index, point) in points.iter().enumerate() {
            let fields = [
                ("open", point.open),
                ("high", point.high),
                ("low", point.low),
                ("close", Some(point.close)),
                ("volume", point.volume),
            ];
            for (field, value) in fields {
                if value.is_some_and(|v| v.is_sign_negative() && !v.is_zero()) {
                    return Err(SeriesError::NegativeValue { index, field });
                }
            }
        }

        if let Some(pos) = points
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(SeriesError::NonIncreasingTimestamps { index: pos + 1 });
        }

        Ok(Self { symbol, points })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; kept for API symmetry with collections.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> &PricePoint {
        // Non-empty by construction.
        &self.points[self.points.len() - 1]
    }

    pub fn first_timestamp(&self) -> DateTime<Utc> {
        self.points[0].timestamp
    }

    pub fn last_timestamp(&self) -> DateTime<Utc> {
        self.last().timestamp
    }

    pub fn closes(&self) -> Vec<Decimal> {
        self.points.iter().map(|p| p.close).collect()
    }

    /// High column, or `None` if any point lacks it.
    pub fn highs(&self) -> Option<Vec<Decimal>> {
        self.points.iter().map(|p| p.high).collect()
    }

    /// Low column, or `None` if any point lacks it.
    pub fn lows(&self) -> Option<Vec<Decimal>> {
        self.points.iter().map(|p| p.low).collect()
    }

    /// Volume column, or `None` if any point lacks it.
    pub fn volumes(&self) -> Option<Vec<Decimal>> {
        self.points.iter().map(|p| p.volume).collect()
    }

    /// Keep only the trailing `count` observations (at least one remains).
    pub fn tail(mut self, count: usize) -> Self {
        let count = count.max(1);
        if self.points.len() > count {
            self.points.drain(..self.points.len() - count);
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Lookback
// ---------------------------------------------------------------------------

/// How much history to request from a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Lookback {
    OneDay,
    TwoDays,
    FiveDays,
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
    FiveYears,
    Max,
}

impl Lookback {
    pub const ALL: [Lookback; 10] = [
        Lookback::OneDay,
        Lookback::TwoDays,
        Lookback::FiveDays,
        Lookback::OneMonth,
        Lookback::ThreeMonths,
        Lookback::SixMonths,
        Lookback::OneYear,
        Lookback::TwoYears,
        Lookback::FiveYears,
        Lookback::Max,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Lookback::OneDay => "1d",
            Lookback::TwoDays => "2d",
            Lookback::FiveDays => "5d",
            Lookback::OneMonth => "1mo",
            Lookback::ThreeMonths => "3mo",
            Lookback::SixMonths => "6mo",
            Lookback::OneYear => "1y",
            Lookback::TwoYears => "2y",
            Lookback::FiveYears => "5y",
            Lookback::Max => "max",
        }
    }

    /// Approximate number of trading sessions covered, `None` for `Max`.
    pub fn trading_days(&self) -> Option<usize> {
        match self {
            Lookback::OneDay => Some(1),
            Lookback::TwoDays => Some(2),
            Lookback::FiveDays => Some(5),
            Lookback::OneMonth => Some(21),
            Lookback::ThreeMonths => Some(63),
            Lookback::SixMonths => Some(126),
            Lookback::OneYear => Some(252),
            Lookback::TwoYears => Some(504),
            Lookback::FiveYears => Some(1260),
            Lookback::Max => None,
        }
    }
}

impl fmt::Display for Lookback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lookback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        Lookback::ALL
            .iter()
            .copied()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = Lookback::ALL.iter().map(|l| l.as_str()).collect();
                format!("unknown lookback '{}' (expected one of {})", s, valid.join(", "))
            })
    }
}

impl TryFrom<String> for Lookback {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Lookback> for String {
    fn from(value: Lookback) -> Self {
        value.as_str().to_string()
    }
}

// ---------------------------------------------------------------------------
// Portfolio
// ---------------------------------------------------------------------------

/// A tracked symbol and its display name.
///
/// `quantity` and `avg_price` are optional; when both are set the holding
/// is valued as a position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_price: Option<Decimal>,
}

impl Holding {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            quantity: None,
            avg_price: None,
        }
    }

    pub fn with_position(mut self, quantity: Decimal, avg_price: Decimal) -> Self {
        self.quantity = Some(quantity);
        self.avg_price = Some(avg_price);
        self
    }

    /// `(quantity, avg_price)` when both are configured.
    pub fn position(&self) -> Option<(Decimal, Decimal)> {
        Some((self.quantity?, self.avg_price?))
    }
}

/// An ordered, immutable symbol → display name mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portfolio {
    pub name: String,
    pub holdings: Vec<Holding>,
}

impl Portfolio {
    pub fn new(name: impl Into<String>, holdings: Vec<Holding>) -> Self {
        Self {
            name: name.into(),
            holdings,
        }
    }

    /// The built-in large-cap technology portfolio.
    pub fn diamond() -> Self {
        Self::new(
            "DIAMOND",
            vec![
                Holding::new("GOOGL", "Google"),
                Holding::new("AAPL", "Apple"),
                Holding::new("META", "Meta Platforms"),
                Holding::new("AMZN", "Amazon"),
                Holding::new("MSFT", "Microsoft"),
                Holding::new("NVDA", "Nvidia"),
                Holding::new("TSLA", "Tesla"),
            ],
        )
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.holdings.iter().map(|h| h.symbol.as_str())
    }

    /// Display name for a symbol, falling back to the symbol itself.
    pub fn name_for<'a>(&'a self, symbol: &'a str) -> &'a str {
        self.holdings
            .iter()
            .find(|h| h.symbol.eq_ignore_ascii_case(symbol))
            .map(|h| h.name.as_str())
            .unwrap_or(symbol)
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    pub fn has_positions(&self) -> bool {
        self.holdings.iter().any(|h| h.position().is_some())
    }
}

impl Default for Portfolio {
    fn default() -> Self {
        Self::diamond()
    }
}

// ---------------------------------------------------------------------------
// Analysis Results
// ---------------------------------------------------------------------------

/// Direction of a day-over-day move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Stable,
}

/// Day-over-day price change for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub symbol: String,
    pub name: String,
    pub current_price: Decimal,
    pub previous_price: Decimal,
    pub absolute_change: Decimal,
    /// Percent, e.g. `5.00` for +5%.
    pub percentage_change: Decimal,
    pub computed_at: DateTime<Utc>,
}

impl StockSnapshot {
    pub fn direction(&self) -> Direction {
        if self.percentage_change > Decimal::ZERO {
            Direction::Up
        } else if self.percentage_change < Decimal::ZERO {
            Direction::Down
        } else {
            Direction::Stable
        }
    }
}

/// Aggregate view over a run's snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total: usize,
    pub up: usize,
    pub down: usize,
    pub stable: usize,
    pub average_change: Decimal,
    pub best: StockSnapshot,
    pub worst: StockSnapshot,
}

/// Valuation of one holding at its latest price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub name: String,
    pub quantity: Decimal,
    pub avg_price: Decimal,
    pub current_price: Decimal,
    /// `quantity * current_price`
    pub value: Decimal,
    /// `quantity * avg_price`
    pub invested: Decimal,
    pub pnl: Decimal,
    /// Percent of `invested`; zero when nothing was invested.
    pub pnl_percent: Decimal,
}

/// Totals over every valued position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionsSummary {
    pub positions: Vec<Position>,
    pub total_value: Decimal,
    pub total_invested: Decimal,
    pub total_pnl: Decimal,
    pub total_pnl_percent: Decimal,
}
