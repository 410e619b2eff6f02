use chrono::{DateTime, Local};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt::{self, Write};
use stockanalyser_core::{Portfolio, PositionsSummary};
use stockanalyser_engine::{AnalysisRun, Comparison, TechnicalAnalysis};

const RULE: &str = "============================================================";
const INNER_RULE: &str = "/==================================/";

pub const NO_DATA: &str = "❌ No data available for analysis";

/// Output format for reports on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    Text,
    Json,
}

/// `+1.23` / `-1.23` with `dp` decimals, banker's rounding.
fn signed(value: Decimal, dp: u32) -> String {
    let sign = if value.is_sign_negative() && !value.round_dp(dp).is_zero() {
        '-'
    } else {
        '+'
    };
    format!("{}{:.*}", sign, dp as usize, value.abs().round_dp(dp))
}

fn money(value: Decimal) -> String {
    format!("${:.2}", value.round_dp(2))
}

fn opt(value: Option<Decimal>) -> String {
    value.map(|v| format!("{:.2}", v.round_dp(2))).unwrap_or_else(|| "n/a".to_string())
}

pub fn to_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Daily portfolio report.
pub fn render_run(
    portfolio: &Portfolio,
    run: &AnalysisRun,
    now: DateTime<Local>,
) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "{RULE}")?;
    writeln!(out, "{:^60}", "🚀 StockAnalyser")?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "⏰ Analysis of {}", now.format("%d/%m/%Y at %H:%M"))?;
    writeln!(out)?;
    writeln!(out, "🔍 PORTFOLIO ANALYSIS ({})", portfolio.name)?;
    writeln!(out)?;
    writeln!(out, "{INNER_RULE}")?;
    for snapshot in &run.snapshots {
        writeln!(
            out,
            "  ✅ {}: {} ({}%)",
            snapshot.symbol,
            money(snapshot.current_price),
            signed(snapshot.percentage_change, 1)
        )?;
    }
    for failure in &run.failures {
        writeln!(out, "  ❌ {}: {}", failure.symbol, failure.reason)?;
    }
    writeln!(out, "{INNER_RULE}")?;
    writeln!(out)?;

    let summary = &run.summary;
    writeln!(out, "======================== 📊 SUMMARY ========================")?;
    writeln!(out, "Number of Stocks: {}", summary.total)?;
    writeln!(out, "Up: {} 📈", summary.up)?;
    writeln!(out, "Down: {} 📉", summary.down)?;
    writeln!(out, "Stable: {} ➡️", summary.stable)?;
    writeln!(out, "Average Variation: {}%", signed(summary.average_change, 2))?;
    writeln!(out)?;
    writeln!(
        out,
        "🏆 Best: {} ({}) : {}%",
        summary.best.symbol,
        summary.best.name,
        signed(summary.best.percentage_change, 2)
    )?;
    writeln!(
        out,
        "📉 Worst: {} ({}) : {}%",
        summary.worst.symbol,
        summary.worst.name,
        signed(summary.worst.percentage_change, 2)
    )?;
    if let Some(positions) = &run.positions {
        render_positions(&mut out, positions)?;
    }
    writeln!(out, "{RULE}")?;
    writeln!(out, "✅ Analysis Done!")?;
    Ok(out)
}

fn render_positions(out: &mut String, summary: &PositionsSummary) -> fmt::Result {
    writeln!(out)?;
    writeln!(out, "======================== 💼 POSITIONS =======================")?;
    for position in &summary.positions {
        writeln!(
            out,
            "  {:<6} {} @ {} → {} ({} / {}%)",
            position.symbol,
            position.quantity.normalize(),
            money(position.avg_price),
            money(position.value),
            signed(position.pnl, 2),
            signed(position.pnl_percent, 2)
        )?;
    }
    writeln!(out, "Invested: {}", money(summary.total_invested))?;
    writeln!(out, "Value:    {}", money(summary.total_value))?;
    writeln!(
        out,
        "P&L:      {} ({}%)",
        signed(summary.total_pnl, 2),
        signed(summary.total_pnl_percent, 2)
    )?;
    Ok(())
}

/// Latest indicator readings and signals for one symbol.
pub fn render_technical(analysis: &TechnicalAnalysis) -> Result<String, fmt::Error> {
    let report = &analysis.report;
    let latest = report.latest();
    let metrics = &report.metrics;
    let mut out = String::new();

    writeln!(out, "{RULE}")?;
    writeln!(out, "📈 {} ({})", report.symbol, analysis.name)?;
    writeln!(out, "{RULE}")?;
    if let (Some(first), Some(last)) = (report.timestamps.first(), report.timestamps.last()) {
        writeln!(
            out,
            "Period: {} → {} ({} sessions)",
            first.format("%Y-%m-%d"),
            last.format("%Y-%m-%d"),
            report.len()
        )?;
    }

    let change = match (metrics.change, metrics.change_percent) {
        (Some(c), Some(p)) => format!(" {} ({}%)", signed(c, 2), signed(p, 2)),
        (Some(c), None) => format!(" {}", signed(c, 2)),
        _ => String::new(),
    };
    writeln!(out, "Price:       {}{}", money(metrics.current_price), change)?;
    writeln!(out, "Period High: {}", money(metrics.period_high))?;
    writeln!(out, "Period Low:  {}", money(metrics.period_low))?;
    if let Some(volume) = metrics.last_volume {
        writeln!(
            out,
            "Volume:      {} (avg {})",
            volume.round(),
            opt(metrics.average_volume.map(|v| v.round()))
        )?;
    }

    writeln!(out)?;
    writeln!(out, "Moving averages")?;
    for (period, value) in &latest.sma {
        writeln!(out, "  SMA {:<4} {}", period, opt(*value))?;
    }
    for (span, value) in &latest.ema {
        writeln!(out, "  EMA {:<4} {}", span, opt(*value))?;
    }

    writeln!(out)?;
    writeln!(out, "Oscillators")?;
    writeln!(out, "  RSI        {}", opt(latest.rsi))?;
    if let Some(macd) = latest.macd {
        writeln!(
            out,
            "  MACD       {} (signal {}, histogram {})",
            opt(Some(macd.macd)),
            opt(Some(macd.signal)),
            opt(Some(macd.histogram))
        )?;
    }
    match latest.stochastic {
        Some(stoch) => {
            writeln!(out, "  Stoch %K   {} (%D {})", opt(Some(stoch.k)), opt(Some(stoch.d)))?;
        }
        None => {
            writeln!(out, "  Stoch %K   n/a")?;
        }
    }

    if let Some(bands) = latest.bollinger {
        writeln!(out)?;
        writeln!(out, "Bollinger Bands")?;
        writeln!(
            out,
            "  Upper {}  Middle {}  Lower {}",
            opt(Some(bands.upper)),
            opt(Some(bands.middle)),
            opt(Some(bands.lower))
        )?;
        writeln!(
            out,
            "  Bandwidth {}  %B {}",
            opt(bands.bandwidth),
            opt(bands.percent_b)
        )?;
    }

    writeln!(out)?;
    if analysis.signals.is_empty() {
        writeln!(out, "Signals: none")?;
    } else {
        writeln!(out, "Signals")?;
        for signal in &analysis.signals {
            writeln!(out, "  🔔 {}", signal.describe())?;
        }
    }
    writeln!(out, "{RULE}")?;
    Ok(out)
}

/// Rebased closes side by side, one row per session of the first series.
pub fn render_comparison(comparison: &Comparison) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "{RULE}")?;
    writeln!(out, "⚖️  Relative performance ({}, base 100)", comparison.lookback)?;
    writeln!(out, "{RULE}")?;
    for series in &comparison.series {
        let performance = series
            .performance()
            .map(|p| format!("{}%", signed(p, 2)))
            .unwrap_or_else(|| "n/a".to_string());
        let marker = match comparison.leader() {
            Some(leader) if leader.symbol == series.symbol => " 🏆",
            _ => "",
        };
        writeln!(
            out,
            "  {:<6} {:<24} {:>9}{}",
            series.symbol, series.name, performance, marker
        )?;
    }
    for failure in &comparison.failures {
        writeln!(out, "  ❌ {}: {}", failure.symbol, failure.reason)?;
    }
    writeln!(out, "{RULE}")?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;
    use stockanalyser_core::{
        Holding, PortfolioSummary, Position, PricePoint, PriceSeries, StockSnapshot,
    };
    use stockanalyser_engine::{
        detect, IndicatorConfig, NormalizedSeries, SymbolFailure, TechnicalReport,
    };

    fn snap(symbol: &str, name: &str, price: Decimal, pct: Decimal) -> StockSnapshot {
        StockSnapshot {
            symbol: symbol.to_string(),
            name: name.to_string(),
            current_price: price,
            previous_price: price,
            absolute_change: Decimal::ZERO,
            percentage_change: pct,
            computed_at: Utc::now(),
        }
    }

    fn sample_run() -> AnalysisRun {
        let apple = snap("AAPL", "Apple", dec!(189.98), dec!(1.37));
        let tesla = snap("TSLA", "Tesla", dec!(250.5), dec!(-2.04));
        AnalysisRun {
            snapshots: vec![apple.clone(), tesla.clone()],
            summary: PortfolioSummary {
                total: 2,
                up: 1,
                down: 1,
                stable: 0,
                average_change: dec!(-0.335),
                best: apple,
                worst: tesla,
            },
            failures: vec![SymbolFailure {
                symbol: "META".to_string(),
                reason: "No data for META".to_string(),
            }],
            positions: None,
        }
    }

    fn portfolio() -> Portfolio {
        Portfolio::new(
            "DIAMOND",
            vec![Holding::new("AAPL", "Apple"), Holding::new("TSLA", "Tesla")],
        )
    }

    /// Steadily rising daily bars with a one-dollar range around the close.
    fn rising_bars(symbol: &str, len: usize) -> PriceSeries {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let points = (0..len)
            .map(|i| {
                let close = dec!(100) + Decimal::from(i as i64);
                PricePoint::ohlcv(
                    start + Duration::days(i as i64),
                    close,
                    close + dec!(1),
                    close - dec!(1),
                    close,
                    dec!(1000),
                )
            })
            .collect();
        PriceSeries::new(symbol, points).unwrap()
    }

    #[test]
    fn test_signed_formatting() {
        assert_eq!(signed(dec!(1.37), 1), "+1.4");
        assert_eq!(signed(dec!(-2.04), 2), "-2.04");
        assert_eq!(signed(dec!(0), 2), "+0.00");
        assert_eq!(signed(dec!(-0.001), 2), "+0.00");
        // banker's rounding
        assert_eq!(signed(dec!(-0.335), 2), "-0.34");
        assert_eq!(signed(dec!(0.125), 2), "+0.12");
    }

    #[test]
    fn test_render_run() {
        let now = Local.with_ymd_and_hms(2024, 5, 3, 16, 30, 0).unwrap();
        let text = render_run(&portfolio(), &sample_run(), now).unwrap();

        assert!(text.contains("🚀 StockAnalyser"));
        assert!(text.contains("⏰ Analysis of 03/05/2024 at 16:30"));
        assert!(text.contains("  ✅ AAPL: $189.98 (+1.4%)"));
        assert!(text.contains("  ✅ TSLA: $250.50 (-2.0%)"));
        assert!(text.contains("  ❌ META: No data for META"));
        assert!(text.contains("Number of Stocks: 2"));
        assert!(text.contains("Up: 1 📈"));
        assert!(text.contains("Stable: 0 ➡️"));
        assert!(text.contains("Average Variation: -0.34%"));
        assert!(text.contains("🏆 Best: AAPL (Apple) : +1.37%"));
        assert!(text.contains("📉 Worst: TSLA (Tesla) : -2.04%"));
        assert!(!text.contains("POSITIONS"));
    }

    #[test]
    fn test_render_run_with_positions() {
        let mut run = sample_run();
        run.positions = Some(PositionsSummary {
            positions: vec![Position {
                symbol: "AAPL".to_string(),
                name: "Apple".to_string(),
                quantity: dec!(10),
                avg_price: dec!(150),
                current_price: dec!(189.98),
                value: dec!(1899.80),
                invested: dec!(1500),
                pnl: dec!(399.80),
                pnl_percent: dec!(26.65),
            }],
            total_value: dec!(1899.80),
            total_invested: dec!(1500),
            total_pnl: dec!(399.80),
            total_pnl_percent: dec!(26.65),
        });
        let now = Local.with_ymd_and_hms(2024, 5, 3, 16, 30, 0).unwrap();
        let text = render_run(&portfolio(), &run, now).unwrap();

        assert!(text.contains("💼 POSITIONS"));
        assert!(text.contains("  AAPL   10 @ $150.00 → $1899.80 (+399.80 / +26.65%)"));
        assert!(text.contains("Invested: $1500.00"));
        assert!(text.contains("P&L:      +399.80 (+26.65%)"));
    }

    #[test]
    fn test_render_technical() {
        let config = IndicatorConfig::default();
        let report = TechnicalReport::compute(&rising_bars("AAPL", 30), &config).unwrap();
        let signals = detect(&report, &config.signals);
        let analysis = TechnicalAnalysis {
            name: "Apple".to_string(),
            report,
            signals,
        };
        let text = render_technical(&analysis).unwrap();

        assert!(text.contains("📈 AAPL (Apple)"));
        assert!(text.contains("Period: 2024-01-01 → 2024-01-30 (30 sessions)"));
        assert!(text.contains("Price:       $129.00 +1.00"));
        assert!(text.contains("  SMA 20   119.50"));
        assert!(text.contains("  SMA 50   n/a"));
        assert!(text.contains("  RSI        100.00"));
        assert!(text.contains("Bollinger Bands"));
        assert!(text.contains("  🔔 RSI overbought (100.00)"));
    }

    #[test]
    fn test_render_comparison() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let timestamps = vec![start, start + Duration::days(1)];
        let comparison = Comparison {
            lookback: stockanalyser_core::Lookback::OneYear,
            series: vec![
                NormalizedSeries {
                    symbol: "AAPL".to_string(),
                    name: "Apple".to_string(),
                    timestamps: timestamps.clone(),
                    values: [dec!(100), dec!(90)].into_iter().collect(),
                },
                NormalizedSeries {
                    symbol: "NVDA".to_string(),
                    name: "Nvidia".to_string(),
                    timestamps,
                    values: [dec!(100), dec!(120)].into_iter().collect(),
                },
            ],
            failures: vec![SymbolFailure {
                symbol: "ZZZ".to_string(),
                reason: "No data for ZZZ".to_string(),
            }],
        };
        let text = render_comparison(&comparison).unwrap();

        assert!(text.contains("Relative performance (1y, base 100)"));
        assert!(text.contains("-10.00%"));
        assert!(text.contains("+20.00% 🏆"));
        assert!(!text.contains("-10.00% 🏆"));
        assert!(text.contains("  ❌ ZZZ: No data for ZZZ"));
    }

    #[test]
    fn test_run_json() {
        let json = to_json(&sample_run()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["summary"]["total"], 2);
        assert_eq!(value["snapshots"][0]["symbol"], "AAPL");
        assert_eq!(value["snapshots"][0]["percentage_change"], "1.37");
        assert_eq!(value["failures"][0]["symbol"], "META");
        assert!(value.get("positions").is_none());
    }
}
