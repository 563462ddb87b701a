//! Phase Classifier (spec §4.9): probes E → D → C → B → A in that order
//! and returns the most advanced phase the detected events support.

use super::config::DetectionConfig;
use jejakcuan_core::{Bar, EventType, Phase, PhaseClassification, TradingRange, WyckoffEvent};
use rust_decimal::Decimal;

fn latest<'a>(events: &'a [WyckoffEvent], event_type: EventType, as_of: usize) -> Option<&'a WyckoffEvent> {
    events
        .iter()
        .filter(|e| e.event_type == event_type && e.trigger_bar_index <= as_of)
        .max_by_key(|e| e.trigger_bar_index)
}

fn latest_of<'a>(events: &'a [WyckoffEvent], types: &[EventType], as_of: usize) -> Option<&'a WyckoffEvent> {
    events
        .iter()
        .filter(|e| types.contains(&e.event_type) && e.trigger_bar_index <= as_of)
        .max_by_key(|e| e.trigger_bar_index)
}

fn collect_events(events: &[WyckoffEvent], as_of: usize) -> Vec<WyckoffEvent> {
    events.iter().filter(|e| e.trigger_bar_index <= as_of).cloned().collect()
}

fn avg_conf(values: &[Option<u8>]) -> u8 {
    let present: Vec<u32> = values.iter().filter_map(|v| v.map(|x| x as u32)).collect();
    if present.is_empty() {
        return 0;
    }
    (present.iter().sum::<u32>() / present.len() as u32) as u8
}

/// Consecutive closes above `ice_price`, walking backward from `as_of` to
/// (but not including) `from`. Breaks the streak on the first close that
/// fails to hold above Ice.
fn closes_above_streak(bars: &[Bar], from: usize, as_of: usize, ice_price: Decimal) -> usize {
    let mut streak = 0usize;
    let mut i = as_of;
    while i > from {
        if bars[i].close > ice_price {
            streak += 1;
            if i == 0 {
                break;
            }
            i -= 1;
        } else {
            break;
        }
    }
    streak
}

/// Classifies the phase as of `current_bar_index` (defaults to the
/// range's last bar for a final, non-real-time read). Phase B's
/// `trading_allowed` gate and Phase E's sustained-closes rule both depend
/// on this cutoff, so backtests must pass the bar index under evaluation
/// rather than always reading the range's full span.
pub fn classify_phase(
    bars: &[Bar],
    range: &TradingRange,
    events: &[WyckoffEvent],
    current_bar_index: Option<usize>,
    config: &DetectionConfig,
) -> PhaseClassification {
    let as_of = current_bar_index.unwrap_or(range.end_index).min(bars.len().saturating_sub(1));

    let sc = latest(events, EventType::SellingClimax, as_of);
    let ar = latest(events, EventType::AutomaticRally, as_of);
    let terminal_test = latest_of(events, &[EventType::SecondaryTest, EventType::Spring], as_of);
    let sos = latest(events, EventType::SignOfStrength, as_of);
    let lps = latest(events, EventType::LastPointOfSupport, as_of);

    if let (Some(sos_event), Some(ice)) = (sos, &range.ice) {
        let streak = closes_above_streak(bars, sos_event.trigger_bar_index, as_of, ice.price);
        if streak >= config.phase_e_sustained_closes {
            return PhaseClassification {
                phase: Some(Phase::E),
                confidence: avg_conf(&[Some(sos_event.confidence), lps.map(|e| e.confidence)]),
                duration_bars: as_of.saturating_sub(sos_event.trigger_bar_index),
                events: collect_events(events, as_of),
                trading_allowed: true,
                rejection_reason: None,
                phase_start_index: sos_event.trigger_bar_index,
                phase_start_ts: bars[sos_event.trigger_bar_index].ts_utc,
            };
        }
    }

    if let Some(sos_event) = sos {
        return PhaseClassification {
            phase: Some(Phase::D),
            confidence: avg_conf(&[Some(sos_event.confidence), lps.map(|e| e.confidence)]),
            duration_bars: as_of.saturating_sub(sos_event.trigger_bar_index),
            events: collect_events(events, as_of),
            trading_allowed: true,
            rejection_reason: None,
            phase_start_index: sos_event.trigger_bar_index,
            phase_start_ts: bars[sos_event.trigger_bar_index].ts_utc,
        };
    }

    if let Some(test_event) = terminal_test {
        let is_spring = test_event.event_type == EventType::Spring;
        return PhaseClassification {
            phase: Some(Phase::C),
            confidence: test_event.confidence,
            duration_bars: as_of.saturating_sub(test_event.trigger_bar_index),
            events: collect_events(events, as_of),
            trading_allowed: is_spring,
            rejection_reason: if is_spring {
                None
            } else {
                Some("Phase C has a Secondary Test but no Spring or SOS confirmation yet".to_string())
            },
            phase_start_index: test_event.trigger_bar_index,
            phase_start_ts: bars[test_event.trigger_bar_index].ts_utc,
        };
    }

    if let Some(ar_event) = ar {
        let duration = as_of.saturating_sub(ar_event.trigger_bar_index);
        let trading_allowed = duration >= config.phase_b_min_duration;
        return PhaseClassification {
            phase: Some(Phase::B),
            confidence: ar_event.confidence,
            duration_bars: duration,
            events: collect_events(events, as_of),
            trading_allowed,
            rejection_reason: if trading_allowed {
                None
            } else {
                Some(format!(
                    "Phase B requires {} bars of range-building, only {} elapsed",
                    config.phase_b_min_duration, duration
                ))
            },
            phase_start_index: ar_event.trigger_bar_index,
            phase_start_ts: bars[ar_event.trigger_bar_index].ts_utc,
        };
    }

    if let (Some(sc_event), Some(_)) = (sc, ar) {
        return PhaseClassification {
            phase: Some(Phase::A),
            confidence: sc_event.confidence,
            duration_bars: as_of.saturating_sub(sc_event.trigger_bar_index),
            events: collect_events(events, as_of),
            trading_allowed: false,
            rejection_reason: Some("Phase A only stops the prior downtrend; no tradable structure yet".to_string()),
            phase_start_index: sc_event.trigger_bar_index,
            phase_start_ts: bars[sc_event.trigger_bar_index].ts_utc,
        };
    }

    PhaseClassification {
        phase: None,
        confidence: 0,
        duration_bars: 0,
        events: Vec::new(),
        trading_allowed: false,
        rejection_reason: Some("no Wyckoff events detected in range".to_string()),
        phase_start_index: range.start_index,
        phase_start_ts: range.start_ts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use jejakcuan_core::{Level, LevelKind, StrengthRating, Timeframe, VolumeTrend};
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn bar(i: i64, close: Decimal) -> Bar {
        Bar {
            symbol: "T".into(),
            timeframe: Timeframe::new("1d"),
            ts_utc: Utc.timestamp_opt(1_700_000_000 + i * 86400, 0).unwrap(),
            open: close,
            high: close + dec!(1),
            low: close - dec!(1),
            close,
            volume: dec!(1000),
        }
    }

    fn ice_level() -> Level {
        Level {
            kind: LevelKind::Ice,
            price: dec!(100),
            touch_count: 3,
            strength_score: 75,
            strength: StrengthRating::Strong,
            first_test_ts: Utc::now(),
            last_test_ts: Utc::now(),
            hold_duration_bars: 10,
            volume_trend: VolumeTrend::Decreasing,
        }
    }

    fn bare_range() -> TradingRange {
        TradingRange {
            id: Uuid::new_v4(),
            symbol: "T".into(),
            timeframe: Timeframe::new("1d"),
            support: dec!(90),
            resistance: dec!(100),
            midpoint: dec!(95),
            range_width: dec!(10),
            range_width_pct: dec!(0.1),
            start_index: 0,
            end_index: 40,
            duration_bars: 40,
            quality_score: 80,
            status: jejakcuan_core::RangeStatus::Active,
            start_ts: Utc::now(),
            end_ts: Utc::now(),
            creek: None,
            ice: Some(ice_level()),
            jump: None,
            zones: Vec::new(),
        }
    }

    fn event(event_type: EventType, index: usize, confidence: u8) -> WyckoffEvent {
        WyckoffEvent {
            event_type,
            range_id: Uuid::new_v4(),
            trigger_bar_index: index,
            trigger_ts: Utc::now(),
            confidence,
            fingerprint: BTreeMap::new(),
            predecessor_indices: Vec::new(),
        }
    }

    #[test]
    fn sc_without_ar_classifies_as_no_phase() {
        let config = DetectionConfig::default();
        let range = bare_range();
        let bars: Vec<Bar> = (0..5).map(|i| bar(i, dec!(90))).collect();
        let events = vec![event(EventType::SellingClimax, 0, 80)];
        let result = classify_phase(&bars, &range, &events, Some(4), &config);
        assert_eq!(result.phase, None);
        assert!(!result.trading_allowed);
    }

    #[test]
    fn sc_and_ar_classify_as_phase_a_not_tradable() {
        let config = DetectionConfig::default();
        let range = bare_range();
        let bars: Vec<Bar> = (0..5).map(|i| bar(i, dec!(90))).collect();
        let events = vec![
            event(EventType::SellingClimax, 0, 80),
            event(EventType::AutomaticRally, 2, 70),
        ];
        let result = classify_phase(&bars, &range, &events, Some(2), &config);
        assert_eq!(result.phase, Some(Phase::B));
        assert!(!result.trading_allowed);
    }

    #[test]
    fn phase_b_requires_minimum_duration_since_ar() {
        let config = DetectionConfig::default();
        let range = bare_range();
        let bars: Vec<Bar> = (0..20).map(|i| bar(i, dec!(92))).collect();
        let events = vec![event(EventType::SellingClimax, 0, 80), event(EventType::AutomaticRally, 5, 70)];
        let early = classify_phase(&bars, &range, &events, Some(8), &config);
        assert_eq!(early.phase, Some(Phase::B));
        assert!(!early.trading_allowed);

        let later = classify_phase(&bars, &range, &events, Some(18), &config);
        assert_eq!(later.phase, Some(Phase::B));
        assert!(later.trading_allowed);
    }

    #[test]
    fn spring_in_phase_c_is_tradable_bare_st_is_not() {
        let config = DetectionConfig::default();
        let range = bare_range();
        let bars: Vec<Bar> = (0..15).map(|i| bar(i, dec!(92))).collect();
        let events_with_st = vec![event(EventType::SecondaryTest, 10, 60)];
        let st_only = classify_phase(&bars, &range, &events_with_st, Some(12), &config);
        assert_eq!(st_only.phase, Some(Phase::C));
        assert!(!st_only.trading_allowed);

        let events_with_spring = vec![event(EventType::Spring, 10, 85)];
        let spring = classify_phase(&bars, &range, &events_with_spring, Some(12), &config);
        assert_eq!(spring.phase, Some(Phase::C));
        assert!(spring.trading_allowed);
    }

    #[test]
    fn sustained_closes_above_ice_advance_to_phase_e() {
        let config = DetectionConfig::default();
        let range = bare_range();
        let mut bars: Vec<Bar> = (0..15).map(|i| bar(i, dec!(92))).collect();
        bars.extend((15..26).map(|i| bar(i, dec!(105))));
        let events = vec![event(EventType::SignOfStrength, 15, 85)];

        let right_after_sos = classify_phase(&bars, &range, &events, Some(16), &config);
        assert_eq!(right_after_sos.phase, Some(Phase::D));

        let after_ten_closes = classify_phase(&bars, &range, &events, Some(25), &config);
        assert_eq!(after_ten_closes.phase, Some(Phase::E));
    }

    #[test]
    fn no_events_yields_no_phase() {
        let config = DetectionConfig::default();
        let range = bare_range();
        let bars: Vec<Bar> = (0..5).map(|i| bar(i, dec!(92))).collect();
        let result = classify_phase(&bars, &range, &[], Some(4), &config);
        assert_eq!(result.phase, None);
        assert!(!result.trading_allowed);
    }
}
