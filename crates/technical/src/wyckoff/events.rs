//! Event Detectors (spec §4.8): Selling Climax, Automatic Rally, Secondary
//! Test, Spring, Sign of Strength, Last Point of Support, and Upthrust
//! After Distribution.
//!
//! Entry-preference arbitration between a direct SOS entry and waiting for
//! an LPS lives in the signal builder, not here — this module only detects
//! events, it doesn't decide which one to trade.

use super::config::DetectionConfig;
use super::volume::VolumeAnalysis;
use jejakcuan_core::{AssetClass, Bar, EventType, TradingRange, WyckoffEvent};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

const TREND_LOOKBACK: usize = 10;
const AR_SEARCH_WINDOW: usize = 10;

fn is_downtrend(bars: &[Bar], i: usize) -> bool {
    if i < TREND_LOOKBACK {
        return false;
    }
    bars[i].close < bars[i - TREND_LOOKBACK].close
}

fn fp(pairs: &[(&str, Decimal)]) -> BTreeMap<String, Decimal> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn clamp_u8(value: Decimal) -> u8 {
    value.round().to_string().parse::<i64>().unwrap_or(0).clamp(0, 100) as u8
}

/// Selling Climax: a violent, high-volume, wide-spread bar closing in its
/// upper half after a sustained downtrend.
pub fn detect_selling_climax(
    bars: &[Bar],
    analyses: &[VolumeAnalysis],
    range: &TradingRange,
    config: &DetectionConfig,
) -> Vec<WyckoffEvent> {
    let mut events = Vec::new();
    let scan_end = range.end_index.min(bars.len().saturating_sub(1));
    for i in range.start_index..=scan_end {
        let Some(volume_ratio) = analyses[i].volume_ratio else { continue };
        let Some(spread_ratio) = analyses[i].spread_ratio else { continue };
        if volume_ratio < config.sc_volume_threshold || spread_ratio < config.sc_spread_threshold {
            continue;
        }
        if analyses[i].close_position < dec!(0.5) {
            continue;
        }
        if !is_downtrend(bars, i) {
            continue;
        }

        let volume_component = (volume_ratio / config.sc_volume_threshold).min(dec!(2.0)) * dec!(35);
        let spread_component = (spread_ratio / config.sc_spread_threshold).min(dec!(2.0)) * dec!(35);
        let confidence = clamp_u8(volume_component + spread_component + dec!(30));

        events.push(WyckoffEvent {
            event_type: EventType::SellingClimax,
            range_id: range.id,
            trigger_bar_index: i,
            trigger_ts: bars[i].ts_utc,
            confidence,
            fingerprint: fp(&[
                ("volume_ratio", volume_ratio),
                ("spread_ratio", spread_ratio),
                ("close_position", analyses[i].close_position),
            ]),
            predecessor_indices: Vec::new(),
        });
    }
    events
}

/// Automatic Rally: the reflexive bounce off a Selling Climax, confirmed
/// by a rally of at least `ar_min_rally_pct` on volume lighter than the
/// SC's. `predecessor_indices` carries the SC's bar index until
/// [`detect_all`] remaps it to a position in the combined event list.
pub fn detect_automatic_rally(
    bars: &[Bar],
    analyses: &[VolumeAnalysis],
    range: &TradingRange,
    sc_events: &[WyckoffEvent],
    config: &DetectionConfig,
) -> Vec<WyckoffEvent> {
    let mut events = Vec::new();
    let scan_limit = range.end_index.min(bars.len().saturating_sub(1));
    for sc in sc_events {
        let sc_low = bars[sc.trigger_bar_index].low;
        let sc_volume_ratio = sc.fingerprint.get("volume_ratio").copied().unwrap_or(Decimal::ZERO);
        let search_end = (sc.trigger_bar_index + AR_SEARCH_WINDOW).min(scan_limit);
        if search_end <= sc.trigger_bar_index {
            continue;
        }

        let mut best: Option<(usize, Decimal)> = None;
        for j in (sc.trigger_bar_index + 1)..=search_end {
            if sc_low.is_zero() {
                continue;
            }
            let rally_pct = (bars[j].high - sc_low) / sc_low;
            if rally_pct < config.ar_min_rally_pct {
                continue;
            }
            let Some(volume_ratio) = analyses[j].volume_ratio else { continue };
            if volume_ratio >= sc_volume_ratio {
                continue;
            }
            if best.map(|(_, best_pct)| rally_pct > best_pct).unwrap_or(true) {
                best = Some((j, rally_pct));
            }
        }

        let Some((j, rally_pct)) = best else { continue };
        let bars_after_sc = j - sc.trigger_bar_index;
        let confidence = clamp_u8(dec!(40) + rally_pct * dec!(500) - Decimal::from(bars_after_sc as u64) * dec!(2));

        events.push(WyckoffEvent {
            event_type: EventType::AutomaticRally,
            range_id: range.id,
            trigger_bar_index: j,
            trigger_ts: bars[j].ts_utc,
            confidence,
            fingerprint: fp(&[
                ("rally_pct", rally_pct),
                ("bars_after_sc", Decimal::from(bars_after_sc as u64)),
            ]),
            predecessor_indices: vec![sc.trigger_bar_index],
        });
    }
    events
}

/// Secondary Test: a retest of the SC low within `st_max_distance_pct` on
/// volume reduced by at least `st_min_volume_reduction_pct`; shallow
/// penetration only (deeper moves belong to Spring). Multiple tests are
/// tracked with an incrementing `test_number`, spaced at least
/// `st_min_bar_separation` bars apart.
pub fn detect_secondary_test(
    bars: &[Bar],
    analyses: &[VolumeAnalysis],
    range: &TradingRange,
    sc_events: &[WyckoffEvent],
    config: &DetectionConfig,
) -> Vec<WyckoffEvent> {
    let mut events = Vec::new();
    let scan_end = range.end_index.min(bars.len().saturating_sub(1));
    for sc in sc_events {
        let sc_low = bars[sc.trigger_bar_index].low;
        let sc_volume_ratio = sc.fingerprint.get("volume_ratio").copied().unwrap_or(Decimal::ZERO);
        if sc_low.is_zero() || sc_volume_ratio.is_zero() {
            continue;
        }

        let mut test_number = 0u32;
        let mut last_test_index: Option<usize> = None;
        for i in (sc.trigger_bar_index + 1)..=scan_end {
            if let Some(last) = last_test_index {
                if i - last < config.st_min_bar_separation {
                    continue;
                }
            }

            let distance_from_sc_low = ((bars[i].low - sc_low) / sc_low).abs();
            if distance_from_sc_low > config.st_max_distance_pct {
                continue;
            }
            let Some(volume_ratio) = analyses[i].volume_ratio else { continue };
            let volume_reduction_pct = (sc_volume_ratio - volume_ratio) / sc_volume_ratio;
            if volume_reduction_pct < config.st_min_volume_reduction_pct {
                continue;
            }
            let penetration_pct = if bars[i].low < sc_low {
                (sc_low - bars[i].low) / sc_low
            } else {
                Decimal::ZERO
            };
            if penetration_pct >= config.st_max_penetration_pct {
                continue;
            }

            let volume_component = (volume_reduction_pct * dec!(45)).min(dec!(45));
            let proximity_component =
                ((config.st_max_distance_pct - distance_from_sc_low) / config.st_max_distance_pct * dec!(27)).max(Decimal::ZERO);
            let holding_component = if bars[i].close >= sc_low { dec!(18) } else { Decimal::ZERO };
            let close_position_component = analyses[i].close_position * dec!(10);
            let spread_bonus = analyses[i]
                .spread_ratio
                .map(|r| (dec!(1) - r).max(Decimal::ZERO) * dec!(5))
                .unwrap_or(Decimal::ZERO)
                .min(dec!(5));
            let confidence =
                clamp_u8(volume_component + proximity_component + holding_component + close_position_component + spread_bonus);

            test_number += 1;
            last_test_index = Some(i);
            events.push(WyckoffEvent {
                event_type: EventType::SecondaryTest,
                range_id: range.id,
                trigger_bar_index: i,
                trigger_ts: bars[i].ts_utc,
                confidence,
                fingerprint: fp(&[
                    ("test_number", Decimal::from(test_number)),
                    ("distance_from_sc_low_pct", distance_from_sc_low),
                    ("volume_reduction_pct", volume_reduction_pct),
                    ("penetration_pct", penetration_pct),
                ]),
                predecessor_indices: vec![sc.trigger_bar_index],
            });
        }
    }
    events
}

enum SpringQuality {
    Ideal,
    Good,
    Acceptable,
}

fn spring_quality(penetration_pct: Decimal, volume_ratio: Decimal, recovery_bars: usize, config: &DetectionConfig) -> SpringQuality {
    let tight_penetration = penetration_pct <= config.spring_max_penetration_pct / dec!(2);
    let light_volume = volume_ratio <= config.spring_max_volume_ratio / dec!(2);
    let fast_recovery = recovery_bars <= 2;
    if tight_penetration && light_volume && fast_recovery {
        SpringQuality::Ideal
    } else if (tight_penetration && light_volume) || (light_volume && fast_recovery) {
        SpringQuality::Good
    } else {
        SpringQuality::Acceptable
    }
}

/// Spring: a shallow penetration below Creek that reverses on light volume
/// and recovers above it within `spring_max_recovery_bars` — the
/// archetypal accumulation trap for late shorts.
pub fn detect_spring(bars: &[Bar], analyses: &[VolumeAnalysis], range: &TradingRange, config: &DetectionConfig) -> Vec<WyckoffEvent> {
    let mut events = Vec::new();
    let Some(creek) = &range.creek else { return events };
    let support = creek.price;
    if support.is_zero() {
        return events;
    }
    let scan_end = range.end_index.min(bars.len().saturating_sub(1));

    for i in range.start_index..=scan_end {
        if bars[i].low >= support {
            continue;
        }
        let penetration_pct = (support - bars[i].low) / support;
        if penetration_pct > config.spring_max_penetration_pct {
            continue;
        }
        let Some(volume_ratio) = analyses[i].volume_ratio else { continue };
        if volume_ratio >= config.spring_max_volume_ratio {
            continue;
        }

        let recovery_end = (i + config.spring_max_recovery_bars).min(scan_end);
        let Some(recovery_index) = ((i + 1)..=recovery_end).find(|&j| bars[j].close > support) else {
            continue;
        };
        let recovery_bars = recovery_index - i;

        let confidence = match spring_quality(penetration_pct, volume_ratio, recovery_bars, config) {
            SpringQuality::Ideal => 90,
            SpringQuality::Good => 78,
            SpringQuality::Acceptable => 65,
        };

        events.push(WyckoffEvent {
            event_type: EventType::Spring,
            range_id: range.id,
            trigger_bar_index: i,
            trigger_ts: bars[i].ts_utc,
            confidence,
            fingerprint: fp(&[
                ("penetration_pct", penetration_pct),
                ("volume_ratio", volume_ratio),
                ("recovery_bars", Decimal::from(recovery_bars as u64)),
            ]),
            predecessor_indices: Vec::new(),
        });
    }
    events
}

/// A confirmed Spring is invalidated if price later closes decisively back
/// below support within the invalidation window — the trap failed to hold.
pub fn spring_invalidated(bars: &[Bar], spring_index: usize, support: Decimal, config: &DetectionConfig) -> bool {
    if support.is_zero() {
        return false;
    }
    let end = (spring_index + config.spring_invalidation_window_bars).min(bars.len().saturating_sub(1));
    ((spring_index + 1)..=end).any(|j| {
        let break_pct = (support - bars[j].close) / support;
        break_pct >= config.spring_invalidation_break_pct
    })
}

/// Sign of Strength: a decisive close above Ice on expanding volume and a
/// wide spread — the first clear evidence of institutional buying.
pub fn detect_sign_of_strength(
    bars: &[Bar],
    analyses: &[VolumeAnalysis],
    range: &TradingRange,
    asset_class: AssetClass,
    config: &DetectionConfig,
) -> Vec<WyckoffEvent> {
    let mut events = Vec::new();
    let Some(ice) = &range.ice else { return events };
    let resistance = ice.price;
    if resistance.is_zero() {
        return events;
    }
    let volume_floor = match asset_class {
        AssetClass::Forex => config.sos_volume_forex,
        _ => config.sos_volume_stock,
    };
    let scan_end = range.end_index.min(bars.len().saturating_sub(1));

    for i in range.start_index..=scan_end {
        if bars[i].close <= resistance {
            continue;
        }
        let Some(volume_ratio) = analyses[i].volume_ratio else { continue };
        if volume_ratio < volume_floor {
            continue;
        }
        let Some(spread_ratio) = analyses[i].spread_ratio else { continue };
        if spread_ratio < dec!(1.2) {
            continue;
        }

        let clearance_pct = (bars[i].close - resistance) / resistance;
        let confidence = clamp_u8(dec!(30) + (volume_ratio / volume_floor).min(dec!(2)) * dec!(30) + clearance_pct * dec!(400));

        events.push(WyckoffEvent {
            event_type: EventType::SignOfStrength,
            range_id: range.id,
            trigger_bar_index: i,
            trigger_ts: bars[i].ts_utc,
            confidence,
            fingerprint: fp(&[
                ("volume_ratio", volume_ratio),
                ("spread_ratio", spread_ratio),
                ("clearance_pct", clearance_pct),
            ]),
            predecessor_indices: Vec::new(),
        });
    }
    events
}

/// Last Point of Support: a post-SOS pullback to Ice on lighter volume
/// than the SOS itself, holding above Ice and bouncing the following bar —
/// the low-risk re-entry after the breakout.
pub fn detect_last_point_of_support(
    bars: &[Bar],
    analyses: &[VolumeAnalysis],
    range: &TradingRange,
    sos_events: &[WyckoffEvent],
    config: &DetectionConfig,
) -> Vec<WyckoffEvent> {
    let mut events = Vec::new();
    let Some(ice) = &range.ice else { return events };
    let resistance = ice.price;
    if resistance.is_zero() {
        return events;
    }
    let scan_limit = range.end_index.min(bars.len().saturating_sub(1));

    for sos in sos_events {
        let sos_volume_ratio = sos.fingerprint.get("volume_ratio").copied().unwrap_or(Decimal::ZERO);
        let scan_end = (sos.trigger_bar_index + config.lps_wait_bars).min(scan_limit);
        if scan_end <= sos.trigger_bar_index {
            continue;
        }

        for i in (sos.trigger_bar_index + 1)..=scan_end {
            let near_ice = ((bars[i].low - resistance) / resistance).abs() <= config.pivot_tolerance_pct;
            if !near_ice || bars[i].close < resistance {
                continue;
            }
            let Some(volume_ratio) = analyses[i].volume_ratio else { continue };
            if volume_ratio >= sos_volume_ratio {
                continue;
            }
            let bounced = bars.get(i + 1).map(|b| b.close > bars[i].close).unwrap_or(false);
            if !bounced {
                continue;
            }

            let confidence = clamp_u8(dec!(50) + (sos_volume_ratio - volume_ratio) * dec!(20));
            events.push(WyckoffEvent {
                event_type: EventType::LastPointOfSupport,
                range_id: range.id,
                trigger_bar_index: i,
                trigger_ts: bars[i].ts_utc,
                confidence,
                fingerprint: fp(&[("volume_ratio", volume_ratio)]),
                predecessor_indices: vec![sos.trigger_bar_index],
            });
            break; // one LPS per SOS is enough to act on
        }
    }
    events
}

/// Upthrust After Distribution: the short-side mirror of a Spring — a
/// shallow push above Ice that fails and closes back below it on
/// confirming volume.
pub fn detect_utad(
    bars: &[Bar],
    analyses: &[VolumeAnalysis],
    range: &TradingRange,
    asset_class: AssetClass,
    config: &DetectionConfig,
) -> Vec<WyckoffEvent> {
    let mut events = Vec::new();
    let Some(ice) = &range.ice else { return events };
    let resistance = ice.price;
    if resistance.is_zero() {
        return events;
    }
    let volume_floor = match asset_class {
        AssetClass::Forex => config.utad_volume_forex,
        _ => config.utad_volume_stock,
    };
    let scan_end = range.end_index.min(bars.len().saturating_sub(1));

    for i in range.start_index..=scan_end {
        if bars[i].high <= resistance {
            continue;
        }
        let penetration_pct = (bars[i].high - resistance) / resistance;
        if penetration_pct > config.utad_max_penetration_pct {
            continue;
        }
        if bars[i].close >= resistance {
            continue;
        }
        let Some(volume_ratio) = analyses[i].volume_ratio else { continue };
        if volume_ratio < volume_floor {
            continue;
        }

        let confidence = clamp_u8(
            dec!(40) + (volume_ratio / volume_floor).min(dec!(2)) * dec!(30)
                + (config.utad_max_penetration_pct - penetration_pct) * dec!(600),
        );

        events.push(WyckoffEvent {
            event_type: EventType::Utad,
            range_id: range.id,
            trigger_bar_index: i,
            trigger_ts: bars[i].ts_utc,
            confidence,
            fingerprint: fp(&[("penetration_pct", penetration_pct), ("volume_ratio", volume_ratio)]),
            predecessor_indices: Vec::new(),
        });
    }
    events
}

/// Runs every detector in dependency order and remaps the bar-index
/// predecessor references each detector stashes into positions within the
/// final, time-sorted event list.
pub fn detect_all(
    bars: &[Bar],
    analyses: &[VolumeAnalysis],
    range: &TradingRange,
    asset_class: AssetClass,
    config: &DetectionConfig,
) -> Vec<WyckoffEvent> {
    let sc_events = detect_selling_climax(bars, analyses, range, config);
    let ar_events = detect_automatic_rally(bars, analyses, range, &sc_events, config);
    let st_events = detect_secondary_test(bars, analyses, range, &sc_events, config);
    let spring_events = detect_spring(bars, analyses, range, config);
    let sos_events = detect_sign_of_strength(bars, analyses, range, asset_class, config);
    let lps_events = detect_last_point_of_support(bars, analyses, range, &sos_events, config);
    let utad_events = detect_utad(bars, analyses, range, asset_class, config);

    let mut all = Vec::new();
    all.extend(sc_events);
    all.extend(ar_events);
    all.extend(st_events);
    all.extend(spring_events);
    all.extend(sos_events);
    all.extend(lps_events);
    all.extend(utad_events);
    all.sort_by_key(|e| e.trigger_bar_index);

    let index_by_bar: std::collections::HashMap<usize, usize> = all
        .iter()
        .enumerate()
        .map(|(pos, e)| (e.trigger_bar_index, pos))
        .collect();
    for event in &mut all {
        event.predecessor_indices = event
            .predecessor_indices
            .iter()
            .filter_map(|bar_index| index_by_bar.get(bar_index).copied())
            .collect();
    }

    all
}
