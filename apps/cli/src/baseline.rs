//! On-disk baseline storage. `original_source` persists baselines in
//! Postgres (`RegressionBaseline`); this workspace has no regression
//! table, so the baseline is kept as a single JSON file next to the
//! binary's working directory -- acceptable for an operator-run CLI
//! that isn't part of the live request path. Decided as an Open
//! Question resolution, see `DESIGN.md`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::metrics::BacktestMetrics;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionBaseline {
    pub baseline_id: Uuid,
    pub test_id: Uuid,
    pub version: String,
    pub established_at: DateTime<Utc>,
    pub metrics: BacktestMetrics,
    pub per_symbol_metrics: HashMap<String, BacktestMetrics>,
}

pub fn default_path() -> PathBuf {
    std::env::var("JEJAKCUAN_REGRESSION_BASELINE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("regression_baseline.json"))
}

pub fn load(path: &Path) -> Option<RegressionBaseline> {
    let contents = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&contents).ok()
}

pub fn save(path: &Path, baseline: &RegressionBaseline) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(baseline)
        .expect("RegressionBaseline serialization cannot fail");
    std::fs::write(path, json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn round_trips_through_disk() {
        let dir = std::env::temp_dir().join(format!("jejakcuan-baseline-test-{}", Uuid::new_v4()));
        let baseline = RegressionBaseline {
            baseline_id: Uuid::new_v4(),
            test_id: Uuid::new_v4(),
            version: "abc123".to_string(),
            established_at: Utc::now(),
            metrics: BacktestMetrics {
                total_trades: 10,
                winning_trades: 6,
                losing_trades: 4,
                win_rate: Decimal::new(6, 1),
                average_r_multiple: Decimal::new(15, 1),
                profit_factor: Decimal::new(2, 0),
                max_drawdown: Decimal::new(1, 1),
                sharpe_ratio: Decimal::new(12, 1),
                total_return: Decimal::new(3, 1),
            },
            per_symbol_metrics: HashMap::new(),
        };

        save(&dir, &baseline).expect("write baseline");
        let loaded = load(&dir).expect("read baseline back");
        assert_eq!(loaded.version, "abc123");
        assert_eq!(loaded.metrics.total_trades, 10);

        let _ = std::fs::remove_file(&dir);
    }

    #[test]
    fn missing_file_yields_none() {
        let path = PathBuf::from("/tmp/does-not-exist-jejakcuan-baseline.json");
        assert!(load(&path).is_none());
    }
}
