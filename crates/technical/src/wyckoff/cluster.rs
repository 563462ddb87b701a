//! Range Clusterer (spec §4.4): groups pivots into candidate trading ranges.

use super::config::DetectionConfig;
use jejakcuan_core::{Pivot, PivotType, PriceCluster, RangeStatus, Timeframe, TradingRange};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Clusters pivots of one type: two pivots join the same cluster iff
/// their prices lie within `tolerance_pct` of the cluster's running mean.
pub fn cluster_pivots(pivots: &[Pivot], pivot_type: PivotType, tolerance_pct: Decimal) -> Vec<PriceCluster> {
    let mut sorted: Vec<&Pivot> = pivots.iter().filter(|p| p.pivot_type == pivot_type).collect();
    sorted.sort_by(|a, b| a.price.cmp(&b.price));

    let mut clusters: Vec<Vec<&Pivot>> = Vec::new();
    for pivot in sorted {
        let joined = clusters.iter_mut().find(|cluster| {
            let mean = cluster_mean(cluster);
            if mean.is_zero() {
                return false;
            }
            ((pivot.price - mean) / mean).abs() <= tolerance_pct
        });
        match joined {
            Some(cluster) => cluster.push(pivot),
            None => clusters.push(vec![pivot]),
        }
    }

    clusters
        .into_iter()
        .map(|members| build_cluster(pivot_type, members))
        .collect()
}

fn cluster_mean(members: &[&Pivot]) -> Decimal {
    if members.is_empty() {
        return Decimal::ZERO;
    }
    members.iter().map(|p| p.price).sum::<Decimal>() / Decimal::from(members.len() as u64)
}

fn build_cluster(pivot_type: PivotType, members: Vec<&Pivot>) -> PriceCluster {
    let average = cluster_mean(&members);
    let min = members.iter().map(|p| p.price).min().unwrap_or(Decimal::ZERO);
    let max = members.iter().map(|p| p.price).max().unwrap_or(Decimal::ZERO);
    let variance = if members.is_empty() {
        Decimal::ZERO
    } else {
        members
            .iter()
            .map(|p| (p.price - average) * (p.price - average))
            .sum::<Decimal>()
            / Decimal::from(members.len() as u64)
    };
    PriceCluster {
        pivot_type,
        touch_count: members.len(),
        pivots: members.into_iter().cloned().collect(),
        average,
        min,
        max,
        std_dev: sqrt_approx(variance),
    }
}

/// Decimal has no built-in sqrt; Newton's method to a handful of
/// iterations is exact enough for a touch-count-scale standard deviation.
fn sqrt_approx(value: Decimal) -> Decimal {
    if value <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let mut guess = value;
    for _ in 0..20 {
        guess = (guess + value / guess) / Decimal::from(2);
    }
    guess
}

/// Pairs every low cluster with every high cluster of strictly greater
/// average price into a candidate `TradingRange` (without levels/zones
/// yet), rejecting pairs whose width or duration falls below threshold.
pub fn candidate_ranges(
    symbol: &str,
    timeframe: &Timeframe,
    low_clusters: &[PriceCluster],
    high_clusters: &[PriceCluster],
    config: &DetectionConfig,
) -> Vec<TradingRange> {
    let mut ranges = Vec::new();

    for low in low_clusters {
        for high in high_clusters {
            if high.average <= low.average {
                continue;
            }
            let support = low.average;
            let resistance = high.average;
            let width = resistance - support;
            let width_pct = width / support;
            if width_pct < config.min_range_width_pct {
                continue;
            }

            let all_indices: Vec<usize> = low
                .pivots
                .iter()
                .chain(high.pivots.iter())
                .map(|p| p.index)
                .collect();
            let Some(&start_index) = all_indices.iter().min() else {
                continue;
            };
            let Some(&end_index) = all_indices.iter().max() else {
                continue;
            };
            let duration = end_index.saturating_sub(start_index);
            if duration < config.min_range_duration_bars {
                continue;
            }

            let start_ts = low
                .pivots
                .iter()
                .chain(high.pivots.iter())
                .find(|p| p.index == start_index)
                .map(|p| p.ts_utc)
                .unwrap();
            let end_ts = low
                .pivots
                .iter()
                .chain(high.pivots.iter())
                .find(|p| p.index == end_index)
                .map(|p| p.ts_utc)
                .unwrap();

            ranges.push(TradingRange {
                id: Uuid::new_v4(),
                symbol: symbol.to_string(),
                timeframe: timeframe.clone(),
                support,
                resistance,
                midpoint: (support + resistance) / Decimal::from(2),
                range_width: width,
                range_width_pct: width_pct,
                start_index,
                end_index,
                duration_bars: duration,
                quality_score: 0, // filled in by the range detector's scoring pass
                status: RangeStatus::Forming,
                start_ts,
                end_ts,
                creek: None,
                ice: None,
                jump: None,
                zones: Vec::new(),
            });
        }
    }

    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn pivot(index: usize, price: Decimal, pivot_type: PivotType) -> Pivot {
        Pivot {
            index,
            ts_utc: Utc::now(),
            price,
            pivot_type,
            strength: Decimal::ZERO,
        }
    }

    #[test]
    fn clusters_nearby_pivots() {
        use rust_decimal_macros::dec;
        let pivots = vec![
            pivot(0, dec!(100), PivotType::Low),
            pivot(1, dec!(101), PivotType::Low),
            pivot(2, dec!(150), PivotType::Low),
        ];
        let clusters = cluster_pivots(&pivots, PivotType::Low, dec!(0.02));
        assert_eq!(clusters.len(), 2);
        let low_cluster = clusters.iter().find(|c| c.touch_count == 2).unwrap();
        assert_eq!(low_cluster.min, dec!(100));
        assert_eq!(low_cluster.max, dec!(101));
    }

    #[test]
    fn rejects_narrow_or_short_ranges() {
        use rust_decimal_macros::dec;
        let low = PriceCluster {
            pivot_type: PivotType::Low,
            pivots: vec![pivot(0, dec!(100), PivotType::Low)],
            average: dec!(100),
            min: dec!(100),
            max: dec!(100),
            std_dev: Decimal::ZERO,
            touch_count: 1,
        };
        let high = PriceCluster {
            pivot_type: PivotType::High,
            pivots: vec![pivot(3, dec!(100.5), PivotType::High)],
            average: dec!(100.5),
            min: dec!(100.5),
            max: dec!(100.5),
            std_dev: Decimal::ZERO,
            touch_count: 1,
        };
        let config = DetectionConfig::default();
        let ranges = candidate_ranges("T", &Timeframe::new("1d"), &[low], &[high], &config);
        assert!(ranges.is_empty());
    }
}
