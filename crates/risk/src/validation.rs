//! Validation Chain (spec §4.11): five stages run in fixed order, each
//! producing PASS/WARN/FAIL; the first FAIL short-circuits the chain.
//! Grounded on `original_source/.../validators/risk_validator.py`'s
//! ordered `validate(context)` step list, adapted into a fixed
//! `Vec<Box<dyn ValidationStage>>` per the design note in spec §9 ("encode
//! stages as an ordered list rather than dispatching dynamically").

use jejakcuan_core::{
    AssetClass, Direction, PatternType, PhaseClassification, StageValidationResult, TradeSignal, TradingRange,
    ValidationChain, ValidationStatus, WyckoffEvent,
};
use std::collections::BTreeMap;

use crate::sizing::min_r_multiple;
use jejakcuan_technical::DetectionConfig;

fn pass(stage: &str) -> StageValidationResult {
    StageValidationResult {
        stage: stage.to_string(),
        status: ValidationStatus::Pass,
        reason: None,
        metadata: BTreeMap::new(),
    }
}

fn fail(stage: &str, reason: impl Into<String>) -> StageValidationResult {
    StageValidationResult {
        stage: stage.to_string(),
        status: ValidationStatus::Fail,
        reason: Some(reason.into()),
        metadata: BTreeMap::new(),
    }
}

/// Everything a stage needs, computed up front by the caller so each
/// stage stays a pure function over already-known facts.
pub struct ValidationContext<'a> {
    pub signal: &'a TradeSignal,
    pub trigger_event: &'a WyckoffEvent,
    pub phase: &'a PhaseClassification,
    pub range: &'a TradingRange,
    pub asset_class: AssetClass,
    pub config: &'a DetectionConfig,
    /// Already-computed per-trade/portfolio/campaign risk verdict from
    /// `crate::sizing::size_position`; the Risk stage surfaces it as-is.
    pub risk_stage_result: StageValidationResult,
    pub strategy_paused: bool,
    pub session_allowed: bool,
}

pub trait ValidationStage {
    fn validate(&self, ctx: &ValidationContext) -> StageValidationResult;
}

pub struct VolumeStage;

impl ValidationStage for VolumeStage {
    fn validate(&self, ctx: &ValidationContext) -> StageValidationResult {
        let Some(volume_ratio) = ctx.trigger_event.fingerprint.get("volume_ratio").copied() else {
            return fail("volume", "trigger event carries no volume_ratio fingerprint");
        };

        let floor = match (ctx.signal.pattern_type, ctx.asset_class) {
            (PatternType::Sos, AssetClass::Forex) => Some(ctx.config.sos_volume_forex),
            (PatternType::Sos, _) => Some(ctx.config.sos_volume_stock),
            (PatternType::Lps, _) => None, // LPS must be lighter than the SOS, not above a floor
            (PatternType::Spring, _) => None, // Spring's ceiling was already enforced at detection
            (PatternType::Utad, AssetClass::Forex) => Some(ctx.config.utad_volume_forex),
            (PatternType::Utad, _) => Some(ctx.config.utad_volume_stock),
        };

        if let Some(floor) = floor {
            if volume_ratio < floor {
                return fail("volume", format!("volume_ratio {volume_ratio} below required floor {floor}"));
            }
        }
        pass("volume")
    }
}

pub struct PhaseStage;

impl ValidationStage for PhaseStage {
    fn validate(&self, ctx: &ValidationContext) -> StageValidationResult {
        if ctx.phase.phase.is_none() {
            return fail("phase", "no phase classified for this range");
        }
        if !ctx.phase.trading_allowed {
            let reason = ctx.phase.rejection_reason.clone().unwrap_or_else(|| "phase does not permit trading".to_string());
            return fail("phase", reason);
        }
        pass("phase")
    }
}

pub struct LevelsStage;

impl ValidationStage for LevelsStage {
    fn validate(&self, ctx: &ValidationContext) -> StageValidationResult {
        if !ctx.range.is_admitted_for_patterns() {
            return fail("levels", "range's Creek/Ice/Jump are not admitted (strength or ordering failure)");
        }
        let signal = ctx.signal;
        let sidedness_ok = match signal.direction() {
            Direction::Long => signal.stop_loss < signal.entry_price && signal.entry_price < signal.target_levels.primary_target,
            Direction::Short => signal.target_levels.primary_target < signal.entry_price && signal.entry_price < signal.stop_loss,
        };
        if !sidedness_ok {
            return fail("levels", "stop/entry/target are not correctly ordered for the signal's direction");
        }
        let floor = min_r_multiple(signal.pattern_type);
        if signal.r_multiple < floor {
            return fail("levels", format!("R-multiple {} is below the {:?} minimum of {}", signal.r_multiple, signal.pattern_type, floor));
        }
        pass("levels")
    }
}

pub struct RiskStage;

impl ValidationStage for RiskStage {
    fn validate(&self, ctx: &ValidationContext) -> StageValidationResult {
        ctx.risk_stage_result.clone()
    }
}

pub struct StrategyStage;

impl ValidationStage for StrategyStage {
    fn validate(&self, ctx: &ValidationContext) -> StageValidationResult {
        if ctx.strategy_paused {
            return fail("strategy", "trading is manually paused");
        }
        if !ctx.session_allowed {
            return fail("strategy", "outside the allowed trading session");
        }
        pass("strategy")
    }
}

pub fn default_stages() -> Vec<Box<dyn ValidationStage>> {
    vec![
        Box::new(VolumeStage),
        Box::new(PhaseStage),
        Box::new(LevelsStage),
        Box::new(RiskStage),
        Box::new(StrategyStage),
    ]
}

/// Runs `stages` in order, stopping at the first FAIL. `chain.stages`
/// therefore holds every stage up to and including the failing one, or
/// all of them if none failed.
pub fn run_chain(stages: &[Box<dyn ValidationStage>], ctx: &ValidationContext) -> ValidationChain {
    let mut chain = ValidationChain::default();
    for stage in stages {
        let result = stage.validate(ctx);
        let failed = result.status == ValidationStatus::Fail;
        chain.stages.push(result);
        if failed {
            break;
        }
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use jejakcuan_core::{
        ConfidenceComponents, EventType, Level, LevelKind, Phase, PositionSizeUnit, RangeStatus, SignalStatus,
        StrengthRating, TargetLevels, Timeframe, VolumeTrend,
    };
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn level(kind: LevelKind, price: Decimal) -> Level {
        Level {
            kind,
            price,
            touch_count: 4,
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

    fn signal() -> TradeSignal {
        TradeSignal {
            id: Uuid::new_v4(),
            asset_class: AssetClass::Stock,
            symbol: "T".into(),
            pattern_type: PatternType::Spring,
            phase: Phase::C,
            timeframe: Timeframe::new("1d"),
            entry_price: dec!(91),
            stop_loss: dec!(89),
            target_levels: TargetLevels {
                primary_target: dec!(110),
                secondary_targets: vec![dec!(100)],
                trailing_activation: None,
                trailing_offset: None,
            },
            position_size: Decimal::ZERO,
            position_size_unit: PositionSizeUnit::Shares,
            leverage: Decimal::ONE,
            margin: Decimal::ZERO,
            notional_value: Decimal::ZERO,
            risk_amount: Decimal::ZERO,
            r_multiple: dec!(9.5),
            confidence_score: dec!(80),
            confidence_components: ConfidenceComponents {
                pattern: dec!(85),
                phase: dec!(80),
                volume: dec!(70),
            },
            campaign_id: None,
            status: SignalStatus::Pending,
            rejection_reasons: Vec::new(),
            validation_chain: ValidationChain::default(),
            schema_version: 1,
            created_at: Utc::now(),
        }
    }

    fn event() -> WyckoffEvent {
        let mut fingerprint = BTreeMap::new();
        fingerprint.insert("volume_ratio".to_string(), dec!(0.5));
        WyckoffEvent {
            event_type: EventType::Spring,
            range_id: Uuid::new_v4(),
            trigger_bar_index: 45,
            trigger_ts: Utc::now(),
            confidence: 85,
            fingerprint,
            predecessor_indices: Vec::new(),
        }
    }

    fn phase_pass() -> PhaseClassification {
        PhaseClassification {
            phase: Some(Phase::C),
            confidence: 80,
            duration_bars: 5,
            events: Vec::new(),
            trading_allowed: true,
            rejection_reason: None,
            phase_start_index: 40,
            phase_start_ts: Utc::now(),
        }
    }

    #[test]
    fn all_pass_yields_overall_pass() {
        let config = DetectionConfig::default();
        let range = range();
        let signal = signal();
        let event = event();
        let phase = phase_pass();
        let ctx = ValidationContext {
            signal: &signal,
            trigger_event: &event,
            phase: &phase,
            range: &range,
            asset_class: AssetClass::Stock,
            config: &config,
            risk_stage_result: pass("risk"),
            strategy_paused: false,
            session_allowed: true,
        };
        let chain = run_chain(&default_stages(), &ctx);
        assert_eq!(chain.overall_status(), ValidationStatus::Pass);
        assert_eq!(chain.stages.len(), 5);
    }

    #[test]
    fn phase_fail_short_circuits_before_risk_and_strategy() {
        let config = DetectionConfig::default();
        let range = range();
        let signal = signal();
        let event = event();
        let mut phase = phase_pass();
        phase.trading_allowed = false;
        phase.rejection_reason = Some("not enough Phase B duration".to_string());
        let ctx = ValidationContext {
            signal: &signal,
            trigger_event: &event,
            phase: &phase,
            range: &range,
            asset_class: AssetClass::Stock,
            config: &config,
            risk_stage_result: pass("risk"),
            strategy_paused: false,
            session_allowed: true,
        };
        let chain = run_chain(&default_stages(), &ctx);
        assert_eq!(chain.overall_status(), ValidationStatus::Fail);
        assert_eq!(chain.stages.len(), 2); // volume (pass), phase (fail) -- stops there
    }

    #[test]
    fn r_multiple_below_pattern_minimum_fails_levels() {
        let config = DetectionConfig::default();
        let range = range();
        let mut signal = signal();
        signal.r_multiple = dec!(1.0); // below Spring's 3.0 minimum
        let event = event();
        let phase = phase_pass();
        let ctx = ValidationContext {
            signal: &signal,
            trigger_event: &event,
            phase: &phase,
            range: &range,
            asset_class: AssetClass::Stock,
            config: &config,
            risk_stage_result: pass("risk"),
            strategy_paused: false,
            session_allowed: true,
        };
        let chain = run_chain(&default_stages(), &ctx);
        assert_eq!(chain.overall_status(), ValidationStatus::Fail);
        assert_eq!(chain.stages.last().unwrap().stage, "levels");
    }
}
