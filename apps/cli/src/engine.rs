//! Regression-test orchestration: run the symbol universe over the
//! date window, aggregate metrics, and compare against the stored
//! baseline. Grounded on `original_source/backend/src/services/
//! regression_test_engine.py`'s `RegressionTestEngine.run_regression_test`/
//! `establish_baseline` (named in the unit test file's mocks).

use chrono::{DateTime, NaiveDate, Utc};
use jejakcuan_db::{PositionRepository, PostgresPositionRepository};
use rust_decimal::Decimal;
use std::collections::HashMap;
use uuid::Uuid;

use crate::baseline::{self, RegressionBaseline};
use crate::metrics::BacktestMetrics;
use crate::output::MetricComparison;

pub struct RegressionTestConfig {
    pub symbols: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub regression_thresholds: HashMap<String, Decimal>,
}

impl RegressionTestConfig {
    pub fn default_thresholds() -> HashMap<String, Decimal> {
        use rust_decimal_macros::dec;
        let mut thresholds = HashMap::new();
        thresholds.insert("win_rate".to_string(), dec!(5.0));
        thresholds.insert("average_r_multiple".to_string(), dec!(10.0));
        thresholds.insert("profit_factor".to_string(), dec!(15.0));
        thresholds
    }
}

pub struct RegressionTestResult {
    pub test_id: Uuid,
    pub test_run_time: DateTime<Utc>,
    pub status: &'static str,
    pub aggregate_metrics: BacktestMetrics,
    pub per_symbol_metrics: HashMap<String, BacktestMetrics>,
    pub regression_detected: bool,
    pub degraded_metrics: Vec<String>,
    pub comparisons: HashMap<String, MetricComparison>,
}

pub struct RegressionTestEngine {
    positions: PostgresPositionRepository,
}

impl RegressionTestEngine {
    pub fn new(positions: PostgresPositionRepository) -> Self {
        Self { positions }
    }

    pub async fn run(
        &self,
        config: &RegressionTestConfig,
        baseline_path: &std::path::Path,
    ) -> Result<RegressionTestResult, jejakcuan_db::DbError> {
        let start = config.start_date.and_hms_opt(0, 0, 0).unwrap().and_utc();
        let end = config.end_date.and_hms_opt(23, 59, 59).unwrap().and_utc();

        let mut all_positions = Vec::new();
        let mut per_symbol_metrics = HashMap::new();

        for symbol in &config.symbols {
            let closed = self.positions.get_closed_in_range(symbol, start, end).await?;
            per_symbol_metrics.insert(symbol.clone(), BacktestMetrics::from_closed_positions(&closed));
            all_positions.extend(closed);
        }

        let aggregate_metrics = BacktestMetrics::from_closed_positions(&all_positions);
        let existing_baseline = baseline::load(baseline_path);

        let (status, regression_detected, degraded_metrics, comparisons) = match &existing_baseline {
            None => ("BASELINE_NOT_SET", false, Vec::new(), HashMap::new()),
            Some(baseline) => {
                let (degraded, comparisons) =
                    compare_against_baseline(&aggregate_metrics, &baseline.metrics, &config.regression_thresholds);
                if degraded.is_empty() {
                    ("PASS", false, degraded, comparisons)
                } else {
                    ("FAIL", true, degraded, comparisons)
                }
            }
        };

        Ok(RegressionTestResult {
            test_id: Uuid::new_v4(),
            test_run_time: Utc::now(),
            status,
            aggregate_metrics,
            per_symbol_metrics,
            regression_detected,
            degraded_metrics,
            comparisons,
        })
    }

    /// Persists `result`'s metrics as the new baseline. Callers must
    /// reject this for a FAIL result themselves -- this method has no
    /// opinion on status, only on writing the file.
    pub fn establish_baseline(
        &self,
        result: &RegressionTestResult,
        version: &str,
        baseline_path: &std::path::Path,
    ) -> std::io::Result<RegressionBaseline> {
        let baseline = RegressionBaseline {
            baseline_id: Uuid::new_v4(),
            test_id: result.test_id,
            version: version.to_string(),
            established_at: Utc::now(),
            metrics: result.aggregate_metrics,
            per_symbol_metrics: result.per_symbol_metrics.clone(),
        };
        baseline::save(baseline_path, &baseline)?;
        Ok(baseline)
    }
}

/// A metric is degraded when it moves against the trade's favor by more
/// than its configured threshold percentage. `win_rate`/`average_r_multiple`/
/// `profit_factor` degrade on the downside; `max_drawdown` degrades on
/// the upside -- it isn't in `regression_thresholds` by default, so it's
/// compared only when a caller explicitly configures a threshold for it.
fn compare_against_baseline(
    current: &BacktestMetrics,
    baseline: &BacktestMetrics,
    thresholds: &HashMap<String, Decimal>,
) -> (Vec<String>, HashMap<String, MetricComparison>) {
    let mut degraded = Vec::new();
    let mut comparisons = HashMap::new();

    for (name, threshold) in thresholds {
        let (baseline_value, current_value) = match name.as_str() {
            "win_rate" => (baseline.win_rate, current.win_rate),
            "average_r_multiple" => (baseline.average_r_multiple, current.average_r_multiple),
            "profit_factor" => (baseline.profit_factor, current.profit_factor),
            "max_drawdown" => (baseline.max_drawdown, current.max_drawdown),
            "sharpe_ratio" => (baseline.sharpe_ratio, current.sharpe_ratio),
            _ => continue,
        };

        if baseline_value == Decimal::ZERO {
            continue;
        }

        let raw_change = (current_value - baseline_value) / baseline_value.abs() * Decimal::from(100);
        let percent_change = if name == "max_drawdown" { -raw_change } else { raw_change };

        if percent_change < -*threshold {
            degraded.push(name.clone());
        }

        comparisons.insert(
            name.clone(),
            MetricComparison {
                baseline_value,
                current_value,
                percent_change: raw_change,
                threshold: *threshold,
            },
        );
    }

    degraded.sort();
    (degraded, comparisons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn metrics_with(win_rate: Decimal, profit_factor: Decimal) -> BacktestMetrics {
        BacktestMetrics {
            total_trades: 100,
            winning_trades: 60,
            losing_trades: 40,
            win_rate,
            average_r_multiple: dec!(1.5),
            profit_factor,
            max_drawdown: dec!(0.1),
            sharpe_ratio: dec!(1.2),
            total_return: dec!(0.3),
        }
    }

    #[test]
    fn flags_a_win_rate_drop_beyond_threshold() {
        let baseline = metrics_with(dec!(0.65), dec!(2.5));
        let current = metrics_with(dec!(0.60), dec!(2.0));
        let thresholds = RegressionTestConfig::default_thresholds();

        let (degraded, _) = compare_against_baseline(&current, &baseline, &thresholds);
        assert!(degraded.contains(&"win_rate".to_string()));
    }

    #[test]
    fn passes_when_metrics_improve() {
        let baseline = metrics_with(dec!(0.60), dec!(2.0));
        let current = metrics_with(dec!(0.65), dec!(2.5));
        let thresholds = RegressionTestConfig::default_thresholds();

        let (degraded, _) = compare_against_baseline(&current, &baseline, &thresholds);
        assert!(degraded.is_empty());
    }
}
