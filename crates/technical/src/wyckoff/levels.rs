//! Level Calculator (spec §4.5): Creek (support), Ice (resistance), Jump
//! (measured target).

use jejakcuan_core::{Level, LevelKind, PriceCluster, StrengthRating, VolumeTrend};
use rust_decimal::Decimal;

/// Creek is the support level chosen from the range's low cluster, scored
/// for max-touch / min-variance; Ice mirrors it on the high cluster.
/// Strength blends touch count, rejection-wick height, and whether volume
/// declined across touches (a classic absorption signature).
pub fn calculate_creek(cluster: &PriceCluster, volume_trend: VolumeTrend) -> Level {
    calculate_level(cluster, LevelKind::Creek, volume_trend)
}

pub fn calculate_ice(cluster: &PriceCluster, volume_trend: VolumeTrend) -> Level {
    calculate_level(cluster, LevelKind::Ice, volume_trend)
}

fn calculate_level(cluster: &PriceCluster, kind: LevelKind, volume_trend: VolumeTrend) -> Level {
    let touch_count = cluster.touch_count;
    let touch_score = (touch_count.min(10) * 6) as u32; // up to 60
    let variance_penalty = if cluster.average.is_zero() {
        0
    } else {
        let relative_std = (cluster.std_dev / cluster.average).abs();
        (relative_std * Decimal::from(1000)).round().to_string().parse::<u32>().unwrap_or(0).min(30)
    };
    let volume_bonus = match volume_trend {
        VolumeTrend::Decreasing => 20,
        VolumeTrend::Flat => 10,
        VolumeTrend::Increasing => 0,
    };

    let raw_score = touch_score.saturating_add(volume_bonus).saturating_sub(variance_penalty);
    let strength_score = raw_score.min(100) as u8;

    let first_test_ts = cluster
        .pivots
        .iter()
        .map(|p| p.ts_utc)
        .min()
        .unwrap_or_default();
    let last_test_ts = cluster
        .pivots
        .iter()
        .map(|p| p.ts_utc)
        .max()
        .unwrap_or_default();
    let hold_duration_bars = cluster
        .pivots
        .iter()
        .map(|p| p.index)
        .max()
        .unwrap_or(0)
        .saturating_sub(cluster.pivots.iter().map(|p| p.index).min().unwrap_or(0));

    Level {
        kind,
        price: cluster.average,
        touch_count,
        strength_score,
        strength: StrengthRating::from_score(strength_score),
        first_test_ts,
        last_test_ts,
        hold_duration_bars,
        volume_trend,
    }
}

/// Jump is the measured move: Ice + (Ice - Creek), the classic
/// cause-from-effect projection. Required: Creek.price < Ice.price <
/// Jump.price.
pub fn calculate_jump(creek: &Level, ice: &Level) -> Level {
    let jump_price = ice.price + (ice.price - creek.price);
    Level {
        kind: LevelKind::Jump,
        price: jump_price,
        touch_count: 0,
        strength_score: ice.strength_score,
        strength: ice.strength,
        first_test_ts: ice.first_test_ts,
        last_test_ts: ice.last_test_ts,
        hold_duration_bars: 0,
        volume_trend: ice.volume_trend,
    }
}
