use chrono::{DateTime, Utc};
use stockanalyser_core::{PriceSeries, StockSnapshot};

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;

/// Day-over-day change between the last two closes of `series`.
///
/// Prices are rounded to `price_decimal_places` and the percentage to
/// `percentage_decimal_places` (banker's rounding). The percentage is
/// computed from unrounded prices.
pub fn price_change(
    series: &PriceSeries,
    name: &str,
    config: &AnalysisConfig,
    computed_at: DateTime<Utc>,
) -> Result<StockSnapshot, AnalysisError> {
    let symbol = series.symbol();
    let required = config.min_required_days.max(2);
    let points = series.points();
    if points.len() < required {
        return Err(AnalysisError::InsufficientHistory {
            symbol: symbol.to_string(),
            required,
            available: points.len(),
        });
    }

    let current = points[points.len() - 1].close;
    let previous = points[points.len() - 2].close;
    if previous.is_zero() {
        return Err(AnalysisError::InvalidPrice {
            symbol: symbol.to_string(),
            price: previous,
        });
    }

    let absolute = current - previous;
    let percentage = absolute / previous * rust_decimal::Decimal::ONE_HUNDRED;

    Ok(StockSnapshot {
        symbol: symbol.to_string(),
        name: name.to_string(),
        current_price: current.round_dp(config.price_decimal_places),
        previous_price: previous.round_dp(config.price_decimal_places),
        absolute_change: absolute.round_dp(config.price_decimal_places),
        percentage_change: percentage.round_dp(config.percentage_decimal_places),
        computed_at,
    })
}
