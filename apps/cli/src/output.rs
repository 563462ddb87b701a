//! Terminal output formatting, grounded on `original_source/backend/
//! scripts/run_regression_test.py`'s `print_header`/`print_status`/
//! `print_metrics`/`print_degraded_metrics`. No color crate appears
//! anywhere in the example pack, so ANSI codes are emitted directly
//! (`no_color` turns this module into a no-op on escape codes), mirroring
//! what the original script does itself.

use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::metrics::BacktestMetrics;

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

pub fn print_header(title: &str, use_color: bool) {
    let bar = "=".repeat(60);
    if use_color {
        println!("{GREEN}{bar}{RESET}");
        println!("{GREEN}{title}{RESET}");
        println!("{GREEN}{bar}{RESET}");
    } else {
        println!("{bar}");
        println!("{title}");
        println!("{bar}");
    }
}

pub fn print_status(status: &str, use_color: bool) {
    let (symbol, color) = match status {
        "PASS" => ("\u{2713}", GREEN),
        "FAIL" => ("\u{2717}", RED),
        "BASELINE_NOT_SET" => ("\u{26a0}", YELLOW),
        _ => ("?", YELLOW),
    };

    if use_color {
        println!("{color}{symbol} {status}{RESET}");
    } else {
        println!("{symbol} {status}");
    }
}

pub fn print_metrics(metrics: &BacktestMetrics, _use_color: bool) {
    println!("Total Trades:        {}", metrics.total_trades);
    println!("Win Rate:            {}", format_pct(metrics.win_rate));
    println!("Average R-Multiple:  {:.2}", metrics.average_r_multiple);
    println!("Profit Factor:       {:.2}", metrics.profit_factor);
    println!("Max Drawdown:        {}", format_pct(metrics.max_drawdown));
    println!("Sharpe Ratio:        {:.2}", metrics.sharpe_ratio);
}

/// `baseline_value`/`current_value` are in the metric's own units
/// (fractions for win_rate, ratios for profit_factor); `percent_change`
/// and `threshold` are already percentages (`5.0` means 5%), matching
/// `original_source`'s `RegressionTestConfig.regression_thresholds`.
pub struct MetricComparison {
    pub baseline_value: Decimal,
    pub current_value: Decimal,
    pub percent_change: Decimal,
    pub threshold: Decimal,
}

pub fn print_degraded_metrics(
    degraded: &[String],
    comparisons: &HashMap<String, MetricComparison>,
    use_color: bool,
) {
    if degraded.is_empty() {
        println!("No metrics degraded beyond threshold.");
        return;
    }

    if use_color {
        println!("{RED}Degraded Metrics:{RESET}");
    } else {
        println!("Degraded Metrics:");
    }

    for name in degraded {
        let Some(comparison) = comparisons.get(name) else {
            continue;
        };
        println!(
            "  {name}: {:.4} -> {:.4} ({}{:.2}% vs {:.2}% threshold)",
            comparison.baseline_value,
            comparison.current_value,
            if comparison.percent_change >= Decimal::ZERO { "+" } else { "" },
            comparison.percent_change,
            comparison.threshold,
        );
    }
}

fn format_pct(value: Decimal) -> String {
    format!("{:.2}%", value * Decimal::from(100))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn degraded_metrics_report_is_empty_when_nothing_degraded() {
        print_degraded_metrics(&[], &HashMap::new(), true);
    }

    #[test]
    fn format_pct_renders_fraction_as_percentage() {
        assert_eq!(format_pct(dec!(0.6333)), "63.33%");
        assert_eq!(format_pct(dec!(0.12)), "12.00%");
    }

    #[test]
    fn degraded_metric_line_matches_expected_shape() {
        let mut comparisons = HashMap::new();
        comparisons.insert(
            "win_rate".to_string(),
            MetricComparison {
                baseline_value: dec!(0.65),
                current_value: dec!(0.60),
                percent_change: dec!(-7.69),
                threshold: dec!(5.0),
            },
        );
        print_degraded_metrics(&["win_rate".to_string()], &comparisons, true);
    }
}
