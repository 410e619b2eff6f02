use rust_decimal::Decimal;
use stockanalyser_core::{Portfolio, Position, PositionsSummary, StockSnapshot};

use crate::config::AnalysisConfig;

fn percent_of(amount: Decimal, base: Decimal) -> Decimal {
    if base <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        amount / base * Decimal::ONE_HUNDRED
    }
}

/// Value every holding that carries a quantity and average price, using
/// the latest price from its snapshot.
///
/// Holdings without a snapshot in this run are left out. Returns `None`
/// when nothing could be valued.
pub fn value_positions(
    portfolio: &Portfolio,
    snapshots: &[StockSnapshot],
    config: &AnalysisConfig,
) -> Option<PositionsSummary> {
    let price_dp = config.price_decimal_places;
    let pct_dp = config.percentage_decimal_places;

    let mut positions = Vec::new();
    let (mut total_value, mut total_invested) = (Decimal::ZERO, Decimal::ZERO);
    for holding in &portfolio.holdings {
        let Some((quantity, avg_price)) = holding.position() else {
            continue;
        };
        let Some(snapshot) = snapshots.iter().find(|s| s.symbol == holding.symbol) else {
            continue;
        };

        let value = quantity * snapshot.current_price;
        let invested = quantity * avg_price;
        let pnl = value - invested;
        total_value += value;
        total_invested += invested;

        positions.push(Position {
            symbol: holding.symbol.clone(),
            name: holding.name.clone(),
            quantity,
            avg_price,
            current_price: snapshot.current_price,
            value: value.round_dp(price_dp),
            invested: invested.round_dp(price_dp),
            pnl: pnl.round_dp(price_dp),
            pnl_percent: percent_of(pnl, invested).round_dp(pct_dp),
        });
    }

    if positions.is_empty() {
        return None;
    }

    let total_pnl = total_value - total_invested;
    Some(PositionsSummary {
        positions,
        total_value: total_value.round_dp(price_dp),
        total_invested: total_invested.round_dp(price_dp),
        total_pnl: total_pnl.round_dp(price_dp),
        total_pnl_percent: percent_of(total_pnl, total_invested).round_dp(pct_dp),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use stockanalyser_core::Holding;

    fn snap(symbol: &str, price: Decimal) -> StockSnapshot {
        StockSnapshot {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            current_price: price,
            previous_price: price,
            absolute_change: Decimal::ZERO,
            percentage_change: Decimal::ZERO,
            computed_at: Utc::now(),
        }
    }

    #[test]
    fn test_values_configured_positions() {
        let portfolio = Portfolio::new(
            "P",
            vec![
                Holding::new("AAPL", "Apple").with_position(dec!(10), dec!(150)),
                Holding::new("TSLA", "Tesla").with_position(dec!(4), dec!(300)),
                Holding::new("MSFT", "Microsoft"),
            ],
        );
        let snapshots = vec![
            snap("AAPL", dec!(180)),
            snap("TSLA", dec!(250)),
            snap("MSFT", dec!(400)),
        ];
        let summary = value_positions(&portfolio, &snapshots, &AnalysisConfig::default()).unwrap();

        assert_eq!(summary.positions.len(), 2);
        let apple = &summary.positions[0];
        assert_eq!(apple.value, dec!(1800));
        assert_eq!(apple.invested, dec!(1500));
        assert_eq!(apple.pnl, dec!(300));
        assert_eq!(apple.pnl_percent, dec!(20));

        let tesla = &summary.positions[1];
        assert_eq!(tesla.pnl, dec!(-200));
        assert_eq!(tesla.pnl_percent, dec!(-16.67));

        assert_eq!(summary.total_value, dec!(2800));
        assert_eq!(summary.total_invested, dec!(2700));
        assert_eq!(summary.total_pnl, dec!(100));
        assert_eq!(summary.total_pnl_percent, dec!(3.70));
    }

    #[test]
    fn test_zero_invested_has_zero_percent() {
        let portfolio = Portfolio::new(
            "P",
            vec![Holding::new("GIFT", "Gifted").with_position(dec!(5), dec!(0))],
        );
        let summary =
            value_positions(&portfolio, &[snap("GIFT", dec!(12))], &AnalysisConfig::default())
                .unwrap();
        assert_eq!(summary.positions[0].pnl, dec!(60));
        assert_eq!(summary.positions[0].pnl_percent, Decimal::ZERO);
        assert_eq!(summary.total_pnl_percent, Decimal::ZERO);
    }

    #[test]
    fn test_missing_snapshot_or_position_is_none() {
        let portfolio = Portfolio::new(
            "P",
            vec![Holding::new("AAPL", "Apple").with_position(dec!(1), dec!(100))],
        );
        assert!(value_positions(&portfolio, &[], &AnalysisConfig::default()).is_none());
        assert!(value_positions(
            &Portfolio::diamond(),
            &[snap("AAPL", dec!(1))],
            &AnalysisConfig::default()
        )
        .is_none());
    }
}
