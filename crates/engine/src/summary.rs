use rust_decimal::Decimal;
use stockanalyser_core::{Direction, PortfolioSummary, StockSnapshot};

use crate::error::AnalysisError;

/// Aggregate a run's snapshots.
///
/// Ties for best/worst go to the earliest snapshot in input order.
/// An empty input is [`AnalysisError::NoData`].
pub fn summarize(snapshots: &[StockSnapshot]) -> Result<PortfolioSummary, AnalysisError> {
    let (first, rest) = snapshots.split_first().ok_or(AnalysisError::NoData)?;

    let count = |direction: Direction| snapshots.iter().filter(|s| s.direction() == direction).count();

    let total_change: Decimal = snapshots.iter().map(|s| s.percentage_change).sum();
    let average_change = total_change / Decimal::from(snapshots.len());

    // Strict comparisons keep the first occurrence on ties.
    let mut best = first;
    let mut worst = first;
    for snapshot in rest {
        if snapshot.percentage_change > best.percentage_change {
            best = snapshot;
        }
        if snapshot.percentage_change < worst.percentage_change {
            worst = snapshot;
        }
    }

    Ok(PortfolioSummary {
        total: snapshots.len(),
        up: count(Direction::Up),
        down: count(Direction::Down),
        stable: count(Direction::Stable),
        average_change,
        best: best.clone(),
        worst: worst.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn snap(symbol: &str, pct: Decimal) -> StockSnapshot {
        StockSnapshot {
            symbol: symbol.to_string(),
            name: symbol.to_lowercase(),
            current_price: dec!(100),
            previous_price: dec!(100),
            absolute_change: Decimal::ZERO,
            percentage_change: pct,
            computed_at: Utc::now(),
        }
    }

    #[test]
    fn test_summary_counts_and_ties() {
        let snapshots = vec![
            snap("A", dec!(5)),
            snap("B", dec!(-2)),
            snap("C", dec!(0)),
            snap("D", dec!(5)),
        ];
        let summary = summarize(&snapshots).unwrap();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.up, 2);
        assert_eq!(summary.down, 1);
        assert_eq!(summary.stable, 1);
        assert_eq!(summary.average_change, dec!(2));
        assert_eq!(summary.average_change.round_dp(2), dec!(2.00));
        assert_eq!(summary.best.symbol, "A");
        assert_eq!(summary.worst.symbol, "B");
    }

    #[test]
    fn test_summary_single_entry() {
        let summary = summarize(&[snap("A", dec!(-1.5))]).unwrap();
        assert_eq!(summary.best.symbol, "A");
        assert_eq!(summary.worst.symbol, "A");
        assert_eq!(summary.average_change, dec!(-1.5));
        assert_eq!(summary.down, 1);
    }

    #[test]
    fn test_summary_worst_tie_keeps_first() {
        let snapshots = vec![snap("A", dec!(1)), snap("B", dec!(-3)), snap("C", dec!(-3))];
        assert_eq!(summarize(&snapshots).unwrap().worst.symbol, "B");
    }

    #[test]
    fn test_summary_empty_is_no_data() {
        assert!(matches!(summarize(&[]), Err(AnalysisError::NoData)));
    }
}
