//! Zone Mapper (spec §4.6): supply/demand zones with strength and touches.

use super::config::DetectionConfig;
use super::volume::VolumeAnalysis;
use jejakcuan_core::{Bar, Zone, ZoneStrength, ZoneType};
use rust_decimal::Decimal;

/// Scans bars `[start_index, end_index]` for high-volume, narrow-spread
/// bars whose close sits in the upper half (demand) or lower half
/// (supply); later bars mark touches, demoting freshness.
pub fn map_zones(
    bars: &[Bar],
    analyses: &[VolumeAnalysis],
    start_index: usize,
    end_index: usize,
    config: &DetectionConfig,
) -> Vec<Zone> {
    let mut zones = Vec::new();

    for i in start_index..=end_index.min(bars.len().saturating_sub(1)) {
        let Some(volume_ratio) = analyses[i].volume_ratio else {
            continue;
        };
        let Some(spread_ratio) = analyses[i].spread_ratio else {
            continue;
        };
        if volume_ratio < config.zone_volume_ratio_min || spread_ratio > config.zone_spread_ratio_max {
            continue;
        }

        let close_position = analyses[i].close_position;
        let zone_type = if close_position >= Decimal::new(5, 1) {
            ZoneType::Demand
        } else {
            ZoneType::Supply
        };

        let price_low = bars[i].low;
        let price_high = bars[i].high;

        let mut touch_count = 0usize;
        let mut invalidated = false;
        for later in bars.iter().take(end_index.min(bars.len() - 1) + 1).skip(i + 1) {
            let intersects = later.low <= price_high && later.high >= price_low;
            if intersects {
                touch_count += 1;
            }
            let breaks_out = match zone_type {
                ZoneType::Demand => later.close < price_low,
                ZoneType::Supply => later.close > price_high,
            };
            if breaks_out {
                let later_idx = bars.iter().position(|b| std::ptr::eq(b, later));
                if let Some(idx) = later_idx {
                    if let Some(ratio) = analyses.get(idx).and_then(|a| a.volume_ratio) {
                        if ratio >= config.zone_invalidation_volume {
                            invalidated = true;
                        }
                    }
                }
            }
        }

        if invalidated {
            continue;
        }

        let strength = ZoneStrength::from_touch_count(touch_count);
        let significance_score = zone_significance(volume_ratio, spread_ratio, touch_count);

        zones.push(Zone {
            zone_type,
            price_low,
            price_high,
            strength,
            touch_count,
            formation_volume_ratio: volume_ratio,
            formation_spread_ratio: spread_ratio,
            formation_close_position: close_position,
            significance_score,
        });
    }

    zones
}

fn zone_significance(volume_ratio: Decimal, spread_ratio: Decimal, touch_count: usize) -> u8 {
    let volume_component = (volume_ratio * Decimal::from(20))
        .round()
        .to_string()
        .parse::<u32>()
        .unwrap_or(0)
        .min(60);
    let tightness_component = if spread_ratio.is_zero() {
        0
    } else {
        ((Decimal::ONE - spread_ratio).max(Decimal::ZERO) * Decimal::from(40))
            .round()
            .to_string()
            .parse::<u32>()
            .unwrap_or(0)
    };
    let touch_penalty = (touch_count as u32) * 10;
    volume_component
        .saturating_add(tightness_component)
        .saturating_sub(touch_penalty)
        .min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use jejakcuan_core::Timeframe;
    use rust_decimal_macros::dec;

    fn bar(i: i64, o: Decimal, h: Decimal, l: Decimal, c: Decimal, v: Decimal) -> Bar {
        Bar {
            symbol: "T".into(),
            timeframe: Timeframe::new("1d"),
            ts_utc: Utc.timestamp_opt(1_700_000_000 + i * 60, 0).unwrap(),
            open: o,
            high: h,
            low: l,
            close: c,
            volume: v,
        }
    }

    #[test]
    fn filters_out_low_volume_wide_spread_bars() {
        let config = DetectionConfig::default();
        let bars = vec![bar(0, dec!(100), dec!(110), dec!(90), dec!(108), dec!(1000))];
        let analyses = vec![VolumeAnalysis {
            volume_ratio: Some(dec!(1.0)),
            spread_ratio: Some(dec!(1.0)),
            close_position: dec!(0.9),
        }];
        let zones = map_zones(&bars, &analyses, 0, 0, &config);
        assert!(zones.is_empty());
    }

    #[test]
    fn detects_demand_zone_on_tight_high_volume_bar() {
        let config = DetectionConfig::default();
        let bars = vec![
            bar(0, dec!(100), dec!(101), dec!(99), dec!(100.8), dec!(3000)),
            bar(1, dec!(101), dec!(102), dec!(100), dec!(101.5), dec!(1000)),
        ];
        let analyses = vec![
            VolumeAnalysis {
                volume_ratio: Some(dec!(2.0)),
                spread_ratio: Some(dec!(0.5)),
                close_position: dec!(0.9),
            },
            VolumeAnalysis {
                volume_ratio: Some(dec!(1.0)),
                spread_ratio: Some(dec!(1.0)),
                close_position: dec!(0.75),
            },
        ];
        let zones = map_zones(&bars, &analyses, 0, 1, &config);
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].zone_type, ZoneType::Demand);
    }
}
