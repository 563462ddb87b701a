//! Pattern-to-Signal Builder (spec §4.10): turns a validated pattern
//! event into the entry/stop/target/confidence skeleton of a `TradeSignal`.
//! Position size, margin, and campaign assignment are filled in later by
//! [`crate::sizing`] once the validation chain clears.

use chrono::Utc;
use jejakcuan_core::{
    AssetClass, Bar, ConfidenceComponents, Direction, EventType, PatternType, Phase, PhaseClassification,
    PositionSizeUnit, SignalStatus, TargetLevels, Timeframe, TradeSignal, TradingRange, ValidationChain, WyckoffEvent,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use crate::error::{RiskError, RiskResult};
use jejakcuan_technical::DetectionConfig;

fn position_size_unit(asset_class: AssetClass) -> PositionSizeUnit {
    match asset_class {
        AssetClass::Stock => PositionSizeUnit::Shares,
        AssetClass::Forex => PositionSizeUnit::Lots,
        AssetClass::Crypto => PositionSizeUnit::Contracts,
    }
}

/// Volume-ratio fingerprint scaled onto the signal's documented [0, 100]
/// confidence-component range; a 2x ratio already saturates it.
fn volume_component(event: &WyckoffEvent) -> Decimal {
    event
        .fingerprint
        .get("volume_ratio")
        .map(|ratio| (*ratio * dec!(50)).min(dec!(100)))
        .unwrap_or(dec!(50))
}

struct EntryStop {
    entry: Decimal,
    stop: Decimal,
    primary_target: Decimal,
    secondary_targets: Vec<Decimal>,
}

fn entry_stop_targets(pattern_type: PatternType, trigger_bar: &Bar, range: &TradingRange, config: &DetectionConfig) -> RiskResult<EntryStop> {
    let (Some(creek), Some(ice), Some(jump)) = (&range.creek, &range.ice, &range.jump) else {
        return Err(RiskError::LevelsMissing(range.id));
    };

    Ok(match pattern_type {
        PatternType::Spring => EntryStop {
            entry: trigger_bar.close,
            stop: trigger_bar.low * (Decimal::ONE - config.spring_stop_pct),
            primary_target: jump.price,
            secondary_targets: vec![ice.price],
        },
        PatternType::Sos => EntryStop {
            entry: trigger_bar.close,
            stop: ice.price * (Decimal::ONE - config.sos_direct_stop_pct),
            primary_target: jump.price,
            secondary_targets: vec![(ice.price + jump.price) / dec!(2)],
        },
        PatternType::Lps => EntryStop {
            entry: trigger_bar.close,
            stop: ice.price * (Decimal::ONE - config.lps_stop_pct),
            primary_target: jump.price,
            secondary_targets: vec![(ice.price + jump.price) / dec!(2)],
        },
        PatternType::Utad => EntryStop {
            entry: trigger_bar.close,
            stop: trigger_bar.high * (Decimal::ONE + config.utad_stop_pct),
            // distribution's downside measured move mirrors Jump: Creek is
            // the floor the markdown is expected to reach.
            primary_target: creek.price,
            secondary_targets: Vec::new(),
        },
    })
}

fn expected_phase(pattern_type: PatternType) -> Phase {
    match pattern_type {
        PatternType::Spring => Phase::C,
        PatternType::Sos | PatternType::Lps => Phase::D,
        PatternType::Utad => Phase::C,
    }
}

fn pattern_event_type(pattern_type: PatternType) -> EventType {
    match pattern_type {
        PatternType::Spring => EventType::Spring,
        PatternType::Sos => EventType::SignOfStrength,
        PatternType::Lps => EventType::LastPointOfSupport,
        PatternType::Utad => EventType::Utad,
    }
}

/// Outcome of the SOS-vs-LPS entry-preference hierarchy (spec.md §4.8):
/// after an SOS, wait up to `lps_wait_bars` for an LPS before allowing a
/// direct-SOS entry, and only then if the SOS itself clears the
/// direct-entry confidence/volume floor.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryPreference {
    /// An LPS formed inside the wait window; trade it instead of the SOS.
    Lps(WyckoffEvent),
    /// The wait window elapsed with no LPS and the SOS clears the floor.
    SosDirect,
    /// Still inside the wait window; no LPS yet.
    Waiting { elapsed: usize },
    /// Wait window elapsed, no LPS, and the SOS doesn't clear the floor.
    Rejected { confidence: u8, volume_ratio: Decimal },
}

/// Resolves which event an SOS breakout should actually be traded from.
/// `lps_events` should be the LPS candidates detected for the same range;
/// only ones whose `predecessor_indices` name this SOS are considered.
pub fn resolve_sos_entry(
    sos_event: &WyckoffEvent,
    lps_events: &[WyckoffEvent],
    current_bar_index: usize,
    config: &DetectionConfig,
) -> EntryPreference {
    if let Some(lps) = lps_events
        .iter()
        .find(|e| e.predecessor_indices.contains(&sos_event.trigger_bar_index))
    {
        return EntryPreference::Lps(lps.clone());
    }

    let elapsed = current_bar_index.saturating_sub(sos_event.trigger_bar_index);
    if elapsed < config.lps_wait_bars {
        return EntryPreference::Waiting { elapsed };
    }

    let volume_ratio = sos_event.fingerprint.get("volume_ratio").copied().unwrap_or(Decimal::ZERO);
    if sos_event.confidence >= config.sos_direct_min_confidence && volume_ratio >= config.sos_direct_min_volume {
        EntryPreference::SosDirect
    } else {
        EntryPreference::Rejected {
            confidence: sos_event.confidence,
            volume_ratio,
        }
    }
}

/// Builds the entry/stop/target/confidence skeleton of a signal from
/// `trigger_event`. Position sizing, campaign assignment, and the
/// validation chain are applied afterward by the caller.
///
/// For `PatternType::Sos`, `lps_events` and `current_bar_index` gate the
/// entry-preference hierarchy: the signal is only built once the LPS wait
/// window has elapsed without an LPS forming, and only if the SOS clears
/// the direct-entry confidence/volume floor (see [`resolve_sos_entry`]).
/// Other pattern types ignore these two arguments.
#[allow(clippy::too_many_arguments)]
pub fn build_signal(
    pattern_type: PatternType,
    trigger_event: &WyckoffEvent,
    trigger_bar: &Bar,
    range: &TradingRange,
    phase: &PhaseClassification,
    asset_class: AssetClass,
    symbol: &str,
    timeframe: &Timeframe,
    lps_events: &[WyckoffEvent],
    current_bar_index: usize,
) -> RiskResult<TradeSignal> {
    if trigger_event.event_type != pattern_event_type(pattern_type) {
        return Err(RiskError::InvalidLevels(format!(
            "trigger event {:?} does not match pattern {:?}",
            trigger_event.event_type, pattern_type
        )));
    }

    let config = DetectionConfig::default();
    if pattern_type == PatternType::Sos {
        match resolve_sos_entry(trigger_event, lps_events, current_bar_index, &config) {
            EntryPreference::SosDirect => {}
            EntryPreference::Lps(_) => {
                return Err(RiskError::InvalidLevels(
                    "an LPS formed inside the wait window; build the LPS signal instead of SOS direct entry".to_string(),
                ));
            }
            EntryPreference::Waiting { elapsed } => {
                return Err(RiskError::SosEntryDeferred {
                    wait_bars: config.lps_wait_bars,
                    elapsed,
                });
            }
            EntryPreference::Rejected { confidence, volume_ratio } => {
                return Err(RiskError::SosEntryRejected { confidence, volume_ratio });
            }
        }
    }

    let levels = entry_stop_targets(pattern_type, trigger_bar, range, &config)?;
    let per_share_risk = (levels.entry - levels.stop).abs();
    if per_share_risk.is_zero() {
        return Err(RiskError::InvalidLevels("entry and stop-loss coincide".to_string()));
    }
    let reward = (levels.primary_target - levels.entry).abs();
    let r_multiple = reward / per_share_risk;

    let phase_component = Decimal::from(phase.confidence);
    let pattern_component = Decimal::from(trigger_event.confidence);
    let volume = volume_component(trigger_event);

    let confidence_components = ConfidenceComponents {
        pattern: pattern_component,
        phase: phase_component,
        volume,
    };

    Ok(TradeSignal {
        id: Uuid::new_v4(),
        asset_class,
        symbol: symbol.to_string(),
        pattern_type,
        phase: phase.phase.unwrap_or_else(|| expected_phase(pattern_type)),
        timeframe: timeframe.clone(),
        entry_price: levels.entry,
        stop_loss: levels.stop,
        target_levels: TargetLevels {
            primary_target: levels.primary_target,
            secondary_targets: levels.secondary_targets,
            trailing_activation: None,
            trailing_offset: None,
        },
        position_size: Decimal::ZERO,
        position_size_unit: position_size_unit(asset_class),
        leverage: Decimal::ONE,
        margin: Decimal::ZERO,
        notional_value: Decimal::ZERO,
        risk_amount: Decimal::ZERO,
        r_multiple,
        confidence_score: confidence_components.weighted(),
        confidence_components,
        campaign_id: None,
        status: SignalStatus::Pending,
        rejection_reasons: Vec::new(),
        validation_chain: ValidationChain::default(),
        schema_version: 1,
        created_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use jejakcuan_core::{Level, LevelKind, RangeStatus, StrengthRating, VolumeTrend};
    use std::collections::BTreeMap;

    fn bar(close: Decimal, high: Decimal, low: Decimal) -> Bar {
        Bar {
            symbol: "T".into(),
            timeframe: Timeframe::new("1d"),
            ts_utc: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            open: close,
            high,
            low,
            close,
            volume: dec!(1000),
        }
    }

    fn level(kind: LevelKind, price: Decimal) -> Level {
        Level {
            kind,
            price,
            touch_count: 3,
            strength_score: 75,
            strength: StrengthRating::Strong,
            first_test_ts: Utc::now(),
            last_test_ts: Utc::now(),
            hold_duration_bars: 10,
            volume_trend: VolumeTrend::Decreasing,
        }
    }

    fn range() -> TradingRange {
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
            end_index: 50,
            duration_bars: 50,
            quality_score: 80,
            status: RangeStatus::Active,
            start_ts: Utc::now(),
            end_ts: Utc::now(),
            creek: Some(level(LevelKind::Creek, dec!(90))),
            ice: Some(level(LevelKind::Ice, dec!(100))),
            jump: Some(level(LevelKind::Jump, dec!(110))),
            zones: Vec::new(),
        }
    }

    fn phase(confidence: u8) -> PhaseClassification {
        PhaseClassification {
            phase: Some(Phase::C),
            confidence,
            duration_bars: 5,
            events: Vec::new(),
            trading_allowed: true,
            rejection_reason: None,
            phase_start_index: 40,
            phase_start_ts: Utc::now(),
        }
    }

    fn spring_event() -> WyckoffEvent {
        let mut fingerprint = BTreeMap::new();
        fingerprint.insert("volume_ratio".to_string(), dec!(0.5));
        WyckoffEvent {
            event_type: EventType::Spring,
            range_id: range().id,
            trigger_bar_index: 45,
            trigger_ts: Utc::now(),
            confidence: 85,
            fingerprint,
            predecessor_indices: Vec::new(),
        }
    }

    fn sos_event(trigger_bar_index: usize, confidence: u8, volume_ratio: Decimal) -> WyckoffEvent {
        let mut fingerprint = BTreeMap::new();
        fingerprint.insert("volume_ratio".to_string(), volume_ratio);
        WyckoffEvent {
            event_type: EventType::SignOfStrength,
            range_id: range().id,
            trigger_bar_index,
            trigger_ts: Utc::now(),
            confidence,
            fingerprint,
            predecessor_indices: Vec::new(),
        }
    }

    fn lps_event(trigger_bar_index: usize, sos_index: usize) -> WyckoffEvent {
        WyckoffEvent {
            event_type: EventType::LastPointOfSupport,
            range_id: range().id,
            trigger_bar_index,
            trigger_ts: Utc::now(),
            confidence: 70,
            fingerprint: BTreeMap::new(),
            predecessor_indices: vec![sos_index],
        }
    }

    #[test]
    fn spring_signal_is_long_with_entry_above_stop() {
        let range = range();
        let trigger_bar = bar(dec!(91), dec!(92), dec!(88));
        let signal = build_signal(
            PatternType::Spring,
            &spring_event(),
            &trigger_bar,
            &range,
            &phase(80),
            AssetClass::Stock,
            "BBCA",
            &Timeframe::new("1d"),
            &[],
            45,
        )
        .unwrap();
        assert_eq!(signal.direction(), Direction::Long);
        assert!(signal.stop_loss < signal.entry_price);
        assert!(signal.target_levels.primary_target > signal.entry_price);
        assert!(signal.r_multiple > Decimal::ZERO);
    }

    #[test]
    fn mismatched_trigger_event_is_rejected() {
        let range = range();
        let trigger_bar = bar(dec!(91), dec!(92), dec!(88));
        let err = build_signal(
            PatternType::Sos,
            &spring_event(),
            &trigger_bar,
            &range,
            &phase(80),
            AssetClass::Stock,
            "BBCA",
            &Timeframe::new("1d"),
            &[],
            45,
        )
        .unwrap_err();
        assert!(matches!(err, RiskError::InvalidLevels(_)));
    }

    #[test]
    fn sos_direct_entry_deferred_inside_wait_window() {
        let range = range();
        let trigger_bar = bar(dec!(101), dec!(102), dec!(99));
        let event = sos_event(100, 90, dec!(2.5));
        let err = build_signal(
            PatternType::Sos,
            &event,
            &trigger_bar,
            &range,
            &phase(80),
            AssetClass::Stock,
            "BBCA",
            &Timeframe::new("1d"),
            &[],
            105,
        )
        .unwrap_err();
        assert!(matches!(err, RiskError::SosEntryDeferred { wait_bars: 10, elapsed: 5 }));
    }

    #[test]
    fn sos_direct_entry_allowed_after_wait_window_when_thresholds_clear() {
        let range = range();
        let trigger_bar = bar(dec!(101), dec!(102), dec!(99));
        let event = sos_event(100, 90, dec!(2.5));
        let signal = build_signal(
            PatternType::Sos,
            &event,
            &trigger_bar,
            &range,
            &phase(80),
            AssetClass::Stock,
            "BBCA",
            &Timeframe::new("1d"),
            &[],
            111,
        )
        .unwrap();
        assert_eq!(signal.pattern_type, PatternType::Sos);
    }

    #[test]
    fn sos_direct_entry_rejected_below_thresholds() {
        let range = range();
        let trigger_bar = bar(dec!(101), dec!(102), dec!(99));
        let event = sos_event(100, 60, dec!(1.2));
        let err = build_signal(
            PatternType::Sos,
            &event,
            &trigger_bar,
            &range,
            &phase(80),
            AssetClass::Stock,
            "BBCA",
            &Timeframe::new("1d"),
            &[],
            111,
        )
        .unwrap_err();
        assert!(matches!(err, RiskError::SosEntryRejected { .. }));
    }

    #[test]
    fn lps_inside_wait_window_overrides_sos_direct_entry() {
        let range = range();
        let trigger_bar = bar(dec!(101), dec!(102), dec!(99));
        let event = sos_event(100, 90, dec!(2.5));
        let lps = lps_event(105, 100);
        let err = build_signal(
            PatternType::Sos,
            &event,
            &trigger_bar,
            &range,
            &phase(80),
            AssetClass::Stock,
            "BBCA",
            &Timeframe::new("1d"),
            &[lps],
            111,
        )
        .unwrap_err();
        assert!(matches!(err, RiskError::InvalidLevels(_)));
    }
}
