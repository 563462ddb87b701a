//! Position Lifecycle & Exit Rules (spec §4.14). Evaluated once per bar
//! in the fixed order: invalidation levels, T1, T2, T3, stop. Grounded on
//! `original_source/backend/src/services/position_manager.py`'s per-bar
//! evaluation loop, adapted into a pure function over one bar so the
//! caller owns persistence and broker-order submission.

use jejakcuan_core::{Bar, Direction, ExitRule, Position};
use rust_decimal::Decimal;

use crate::error::{RiskError, RiskResult};

#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleAction {
    /// A breached invalidation level: exit the whole remaining position
    /// at market, immediately, no partial-exit bookkeeping.
    EmergencyExit { reason: String },
    /// A target was hit: sell `exit_pct` of the shares held when the
    /// position was opened, at `price`.
    PartialExit { level: TargetLevel, price: Decimal, exit_pct: Decimal },
    /// A target's trailing rule fired: move the stop to `new_stop`.
    TrailStop { new_stop: Decimal },
    /// Price traded through the (possibly trailed) stop.
    StopExit { price: Decimal },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetLevel {
    T1,
    T2,
    T3,
}

fn invalidation_breach(position: &Position, rule: &ExitRule, bar: &Bar) -> Option<String> {
    let inv = &rule.invalidation;
    match position.direction {
        Direction::Long => {
            if let Some(spring_low) = inv.spring_low {
                if bar.low < spring_low {
                    return Some(format!("closed below spring low {spring_low}"));
                }
            }
            if let Some(ice) = inv.ice_level {
                if bar.close < ice {
                    return Some(format!("closed below ice level {ice} after SOS"));
                }
            }
            if let Some(creek) = inv.creek_level {
                if bar.close < creek {
                    return Some(format!("closed below creek level {creek} after jump"));
                }
            }
            None
        }
        Direction::Short => inv.utad_high.filter(|&utad_high| bar.high > utad_high).map(|utad_high| format!("traded above utad high {utad_high}")),
    }
}

fn hit(direction: Direction, price: Decimal, level: Decimal) -> bool {
    match direction {
        Direction::Long => price >= level,
        Direction::Short => price <= level,
    }
}

/// Evaluates one bar against `position`/`rule` in the §4.14 fixed order,
/// returning every action the caller should apply, in order. Multiple
/// actions can fire on the same bar (e.g. T1 hit and trailed to
/// breakeven); an emergency exit always short-circuits everything else.
pub fn evaluate_bar(position: &Position, rule: &ExitRule, bar: &Bar) -> Vec<LifecycleAction> {
    if let Some(reason) = invalidation_breach(position, rule, bar) {
        return vec![LifecycleAction::EmergencyExit { reason }];
    }

    let mut actions = Vec::new();
    let targets = [
        (TargetLevel::T1, rule.target_1, rule.t1_exit_pct, rule.trail_to_breakeven_on_t1.then_some(position.entry_price)),
        (TargetLevel::T2, rule.target_2, rule.t2_exit_pct, rule.trail_to_t1_on_t2.then_some(rule.target_1)),
        (TargetLevel::T3, rule.target_3, rule.t3_exit_pct, None),
    ];

    for (level, target, exit_pct, trail_to) in targets {
        if hit(position.direction, bar.close, target) {
            actions.push(LifecycleAction::PartialExit { level, price: bar.close, exit_pct });
            if let Some(new_stop) = trail_to {
                actions.push(LifecycleAction::TrailStop { new_stop });
            }
        }
    }

    if !actions.is_empty() {
        return actions;
    }

    let stopped_out = match position.direction {
        Direction::Long => bar.low <= position.stop_loss,
        Direction::Short => bar.high >= position.stop_loss,
    };
    if stopped_out {
        actions.push(LifecycleAction::StopExit { price: position.stop_loss });
    }

    actions
}

/// Direction-aware stop-trail validation (spec §4.14): a LONG stop may
/// only move up and must stay strictly below entry; a SHORT stop may
/// only move down and must stay strictly above entry. The automated
/// trail-to-breakeven/trail-to-T1 actions in [`evaluate_bar`] set the
/// stop to exactly `entry_price`/`target_1` and are exempt from the
/// "strictly below/above entry" half of this check -- they're the
/// system's own invalidation anchors, not a manual edit that could let
/// a trade run at zero protection.
pub fn validate_stop_update(position: &Position, new_stop: Decimal, is_system_trail: bool) -> RiskResult<()> {
    match position.direction {
        Direction::Long => {
            if new_stop <= position.stop_loss {
                return Err(RiskError::InvalidStopUpdate("long stop must trail up".to_string()));
            }
            if !is_system_trail && new_stop >= position.entry_price {
                return Err(RiskError::InvalidStopUpdate("long stop must stay below entry".to_string()));
            }
        }
        Direction::Short => {
            if new_stop >= position.stop_loss {
                return Err(RiskError::InvalidStopUpdate("short stop must trail down".to_string()));
            }
            if !is_system_trail && new_stop <= position.entry_price {
                return Err(RiskError::InvalidStopUpdate("short stop must stay above entry".to_string()));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use jejakcuan_core::{InvalidationLevels, PositionStatus, Timeframe};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn bar(high: Decimal, low: Decimal, close: Decimal) -> Bar {
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

    fn position() -> Position {
        Position {
            id: Uuid::new_v4(),
            campaign_id: Uuid::new_v4(),
            signal_id: Uuid::new_v4(),
            symbol: "T".into(),
            direction: Direction::Long,
            entry_date: Utc::now(),
            entry_price: dec!(100),
            shares: dec!(1000),
            stop_loss: dec!(95),
            current_price: dec!(100),
            current_pnl: Decimal::ZERO,
            status: PositionStatus::Open,
            closed_date: None,
            exit_price: None,
            realized_pnl: None,
        }
    }

    fn rule() -> ExitRule {
        ExitRule {
            campaign_id: Uuid::new_v4(),
            target_1: dec!(110),
            target_2: dec!(120),
            target_3: dec!(130),
            t1_exit_pct: dec!(33.34),
            t2_exit_pct: dec!(33.33),
            t3_exit_pct: dec!(33.33),
            trail_to_breakeven_on_t1: true,
            trail_to_t1_on_t2: true,
            invalidation: InvalidationLevels {
                spring_low: Some(dec!(90)),
                ice_level: None,
                creek_level: None,
                utad_high: None,
                jump_target: Some(dec!(130)),
            },
        }
    }

    #[test]
    fn invalidation_breach_short_circuits_everything_else() {
        let actions = evaluate_bar(&position(), &rule(), &bar(dec!(111), dec!(89), dec!(89)));
        assert_eq!(actions, vec![LifecycleAction::EmergencyExit { reason: "closed below spring low 90".to_string() }]);
    }

    #[test]
    fn hitting_t1_trails_stop_to_breakeven() {
        let actions = evaluate_bar(&position(), &rule(), &bar(dec!(111), dec!(108), dec!(111)));
        assert_eq!(
            actions,
            vec![
                LifecycleAction::PartialExit { level: TargetLevel::T1, price: dec!(111), exit_pct: dec!(33.34) },
                LifecycleAction::TrailStop { new_stop: dec!(100) },
            ]
        );
    }

    #[test]
    fn stop_fires_when_no_target_hit() {
        let actions = evaluate_bar(&position(), &rule(), &bar(dec!(96), dec!(93), dec!(94)));
        assert_eq!(actions, vec![LifecycleAction::StopExit { price: dec!(95) }]);
    }

    #[test]
    fn manual_long_stop_update_above_entry_is_rejected() {
        let err = validate_stop_update(&position(), dec!(101), false).unwrap_err();
        assert!(matches!(err, RiskError::InvalidStopUpdate(_)));
    }

    #[test]
    fn system_breakeven_trail_is_exempt_from_below_entry_check() {
        validate_stop_update(&position(), dec!(100), true).unwrap();
    }

    #[test]
    fn stop_must_move_in_the_trailing_direction() {
        let err = validate_stop_update(&position(), dec!(94), false).unwrap_err();
        assert!(matches!(err, RiskError::InvalidStopUpdate(_)));
    }
}
