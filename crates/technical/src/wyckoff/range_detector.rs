//! Trading Range Detector (spec §4.7): orchestrates pivots → clusters →
//! candidate ranges → quality scoring → levels → zones → overlap
//! arbitration → status assignment.

use super::cluster::{candidate_ranges, cluster_pivots};
use super::config::DetectionConfig;
use super::levels::{calculate_creek, calculate_ice, calculate_jump};
use super::pivot;
use super::volume::{self, VolumeAnalysis};
use jejakcuan_core::{Bar, PivotType, RangeStatus, Timeframe, TradingRange, VolumeTrend};
use rust_decimal::Decimal;

/// Runs the full pipeline over `bars` for one (symbol, timeframe),
/// returning scored, leveled, zoned ranges with overlap arbitration
/// already applied (the loser of an overlap becomes `Archived`).
pub fn detect_ranges(bars: &[Bar], symbol: &str, timeframe: &Timeframe, config: &DetectionConfig) -> Vec<TradingRange> {
    if bars.is_empty() {
        return Vec::new();
    }

    let analyses = volume::analyze(bars, config);
    let pivots = pivot::detect(bars, config);

    let low_clusters = cluster_pivots(&pivots, PivotType::Low, config.pivot_tolerance_pct);
    let high_clusters = cluster_pivots(&pivots, PivotType::High, config.pivot_tolerance_pct);

    let mut ranges = candidate_ranges(symbol, timeframe, &low_clusters, &high_clusters, config);

    for range in &mut ranges {
        range.quality_score = quality_score(range, &analyses, bars, config);
    }
    ranges.retain(|r| r.quality_score >= config.min_range_quality);

    for range in &mut ranges {
        let low_cluster = low_clusters
            .iter()
            .find(|c| (c.average - range.support).abs() < Decimal::new(1, 6));
        let high_cluster = high_clusters
            .iter()
            .find(|c| (c.average - range.resistance).abs() < Decimal::new(1, 6));

        let (Some(low_cluster), Some(high_cluster)) = (low_cluster, high_cluster) else {
            continue;
        };

        let support_volume_trend = level_volume_trend(bars, &analyses, low_cluster.pivots.iter().map(|p| p.index));
        let resistance_volume_trend = level_volume_trend(bars, &analyses, high_cluster.pivots.iter().map(|p| p.index));

        let creek = calculate_creek(low_cluster, support_volume_trend);
        let ice = calculate_ice(high_cluster, resistance_volume_trend);

        if creek.strength_score < 60 || ice.strength_score < 60 {
            continue;
        }

        let jump = calculate_jump(&creek, &ice);
        range.zones = super::zones::map_zones(bars, &analyses, range.start_index, range.end_index, config);
        range.creek = Some(creek);
        range.ice = Some(ice);
        range.jump = Some(jump);
    }

    arbitrate_overlaps(&mut ranges);
    assign_status(&mut ranges, config);

    ranges
}

/// Quality aggregates width, duration, and touch density into a 0-100
/// score. Ranges below `config.min_range_quality` are discarded before
/// levels/zones are ever computed for them; surviving ranges below
/// `range_active_quality` stay FORMING rather than becoming ACTIVE
/// (spec §4.7).
fn quality_score(range: &TradingRange, _analyses: &[VolumeAnalysis], bars: &[Bar], config: &DetectionConfig) -> u8 {
    let width_component = (range.range_width_pct * Decimal::from(400))
        .round()
        .to_string()
        .parse::<u32>()
        .unwrap_or(0)
        .min(40);
    let duration_component = ((range.duration_bars.min(60)) as u32 * 40 / 60).min(40);
    let touch_component = touch_density(range, bars, config).min(20);
    width_component
        .saturating_add(duration_component)
        .saturating_add(touch_component)
        .min(100) as u8
}

/// Counts bars whose low/high come within `pivot_tolerance_pct` of the
/// range's support/resistance, as a proxy for how many times the range
/// has been tested -- 4 points per touch, capped at 20.
fn touch_density(range: &TradingRange, bars: &[Bar], config: &DetectionConfig) -> u32 {
    let support_band = range.support * config.pivot_tolerance_pct;
    let resistance_band = range.resistance * config.pivot_tolerance_pct;

    let touches = bars
        .get(range.start_index..=range.end_index.min(bars.len().saturating_sub(1)))
        .unwrap_or(&[])
        .iter()
        .filter(|bar| {
            (bar.low - range.support).abs() <= support_band
                || (bar.high - range.resistance).abs() <= resistance_band
        })
        .count();

    (touches as u32).saturating_mul(4)
}

fn level_volume_trend(bars: &[Bar], analyses: &[VolumeAnalysis], indices: impl Iterator<Item = usize>) -> VolumeTrend {
    let indices: Vec<usize> = indices.collect();
    if indices.len() < 2 {
        return VolumeTrend::Flat;
    }
    let mut sorted = indices;
    sorted.sort();
    let first = sorted[0];
    let last = *sorted.last().unwrap();
    let first_volume = bars.get(first).map(|b| b.volume).unwrap_or(Decimal::ZERO);
    let last_volume = bars.get(last).map(|b| b.volume).unwrap_or(Decimal::ZERO);
    let _ = analyses; // volume analyses would refine this with rolling ratios; raw comparison suffices here
    if first_volume.is_zero() {
        return VolumeTrend::Flat;
    }
    let change = (last_volume - first_volume) / first_volume;
    if change < Decimal::new(-1, 1) {
        VolumeTrend::Decreasing
    } else if change > Decimal::new(1, 1) {
        VolumeTrend::Increasing
    } else {
        VolumeTrend::Flat
    }
}

/// Newer `end_index` wins an overlap; the loser is archived.
fn arbitrate_overlaps(ranges: &mut [TradingRange]) {
    let n = ranges.len();
    let mut archived = vec![false; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let overlap = ranges[i].start_index <= ranges[j].end_index
                && ranges[j].start_index <= ranges[i].end_index;
            if !overlap {
                continue;
            }
            if ranges[i].end_index >= ranges[j].end_index {
                archived[j] = true;
            } else {
                archived[i] = true;
            }
        }
    }
    for (range, is_archived) in ranges.iter_mut().zip(archived) {
        if is_archived {
            range.status = RangeStatus::Archived;
        }
    }
}

fn assign_status(ranges: &mut [TradingRange], config: &DetectionConfig) {
    for range in ranges.iter_mut() {
        if range.status == RangeStatus::Archived {
            continue;
        }
        range.status = if range.quality_score >= config.range_active_quality
            && range.duration_bars >= config.range_active_duration
        {
            RangeStatus::Active
        } else {
            RangeStatus::Forming
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn bar(i: i64, o: Decimal, h: Decimal, l: Decimal, c: Decimal, v: Decimal) -> Bar {
        Bar {
            symbol: "T".into(),
            timeframe: Timeframe::new("1d"),
            ts_utc: Utc.timestamp_opt(1_700_000_000 + i * 86400, 0).unwrap(),
            open: o,
            high: h,
            low: l,
            close: c,
            volume: v,
        }
    }

    #[test]
    fn empty_bars_produce_no_ranges() {
        let config = DetectionConfig::default();
        let ranges = detect_ranges(&[], "T", &Timeframe::new("1d"), &config);
        assert!(ranges.is_empty());
    }

    fn bare_range(support: Decimal, resistance: Decimal, start_index: usize, end_index: usize) -> TradingRange {
        TradingRange {
            id: uuid::Uuid::new_v4(),
            symbol: "T".into(),
            timeframe: Timeframe::new("1d"),
            support,
            resistance,
            midpoint: (support + resistance) / Decimal::from(2),
            range_width: resistance - support,
            range_width_pct: (resistance - support) / support,
            start_index,
            end_index,
            duration_bars: end_index - start_index,
            quality_score: 0,
            status: RangeStatus::Forming,
            start_ts: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            end_ts: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            creek: None,
            ice: None,
            jump: None,
            zones: Vec::new(),
        }
    }

    #[test]
    fn touch_density_counts_bars_near_support_or_resistance() {
        let config = DetectionConfig::default();
        let range = bare_range(dec!(90), dec!(110), 0, 4);
        let bars = vec![
            bar(0, dec!(100), dec!(100), dec!(90), dec!(95), dec!(1000)), // touches support
            bar(1, dec!(100), dec!(110), dec!(100), dec!(105), dec!(1000)), // touches resistance
            bar(2, dec!(100), dec!(102), dec!(98), dec!(100), dec!(1000)), // touches neither
            bar(3, dec!(100), dec!(100), dec!(90), dec!(95), dec!(1000)), // touches support
            bar(4, dec!(100), dec!(110), dec!(100), dec!(105), dec!(1000)), // touches resistance
        ];
        assert_eq!(touch_density(&range, &bars, &config), 16);
    }

    #[test]
    fn low_quality_ranges_are_discarded_before_levels() {
        let config = DetectionConfig::default();
        // A narrow, short, untested range scores well under the 70 floor.
        let range = bare_range(dec!(99.5), dec!(100), 0, 2);
        let bars: Vec<Bar> = (0..3).map(|i| bar(i, dec!(99.7), dec!(99.8), dec!(99.6), dec!(99.7), dec!(1000))).collect();
        let score = quality_score(&range, &[], &bars, &config);
        assert!(score < config.min_range_quality, "expected a low quality score, got {score}");
    }

    #[test]
    fn budget_smoke_test_1000_bars() {
        let config = DetectionConfig::default();
        let bars: Vec<Bar> = (0..1000)
            .map(|i| {
                let base = dec!(100) + Decimal::from(i % 20);
                bar(i, base, base + dec!(1), base - dec!(1), base, dec!(1000))
            })
            .collect();
        let started = std::time::Instant::now();
        let _ranges = detect_ranges(&bars, "T", &Timeframe::new("1d"), &config);
        assert!(started.elapsed().as_millis() < 1000);
    }
}
