//! Integration tests for the bar window manager and core domain invariants.

use chrono::{TimeZone, Utc};
use jejakcuan_core::{
    Bar, BarWindowManager, Direction, EngineError, ExitRule, InvalidationLevels, Position,
    PositionStatus, Timeframe,
};
use rust_decimal_macros::dec;
use uuid::Uuid;

fn bar_at(symbol: &str, minute: i64, close: rust_decimal::Decimal) -> Bar {
    Bar {
        symbol: symbol.to_string(),
        timeframe: Timeframe::new("1d"),
        ts_utc: Utc.timestamp_opt(1_700_000_000 + minute * 60, 0).unwrap(),
        open: close,
        high: close,
        low: close,
        close,
        volume: dec!(1000),
    }
}

#[test]
fn bar_window_round_trips_admission_order() {
    let mut mgr = BarWindowManager::new(100);
    for i in 0..5 {
        mgr.append(bar_at("ABCD", i, rust_decimal::Decimal::from(100 + i)))
            .unwrap();
    }
    let snapshot = mgr.get_bars("ABCD", "1d", None);
    let closes: Vec<_> = snapshot.iter().map(|b| b.close).collect();
    assert_eq!(
        closes,
        vec![
            dec!(100),
            dec!(101),
            dec!(102),
            dec!(103),
            dec!(104)
        ]
    );
}

#[test]
fn bar_window_rejects_out_of_order_append() {
    let mut mgr = BarWindowManager::new(100);
    mgr.append(bar_at("ABCD", 10, dec!(100))).unwrap();
    let err = mgr.append(bar_at("ABCD", 5, dec!(99))).unwrap_err();
    assert!(matches!(err, EngineError::InvalidBar { .. }));
}

#[test]
fn exit_rule_requires_exit_percentages_to_sum_to_100() {
    let valid = ExitRule {
        campaign_id: Uuid::new_v4(),
        target_1: dec!(110),
        target_2: dec!(120),
        target_3: dec!(130),
        t1_exit_pct: dec!(40),
        t2_exit_pct: dec!(35),
        t3_exit_pct: dec!(25),
        trail_to_breakeven_on_t1: true,
        trail_to_t1_on_t2: true,
        invalidation: InvalidationLevels {
            spring_low: Some(dec!(95)),
            ice_level: None,
            creek_level: None,
            utad_high: None,
            jump_target: Some(dec!(130)),
        },
    };
    assert!(valid.exit_pcts_valid());

    let invalid = ExitRule {
        t1_exit_pct: dec!(40),
        t2_exit_pct: dec!(35),
        t3_exit_pct: dec!(20),
        ..valid
    };
    assert!(!invalid.exit_pcts_valid());
}

#[test]
fn position_dollars_at_risk_is_zero_through_the_stop() {
    let mut position = Position {
        id: Uuid::new_v4(),
        campaign_id: Uuid::new_v4(),
        signal_id: Uuid::new_v4(),
        symbol: "ABCD".into(),
        direction: Direction::Long,
        entry_date: Utc::now(),
        entry_price: dec!(100),
        shares: dec!(50),
        stop_loss: dec!(95),
        current_price: dec!(105),
        current_pnl: dec!(250),
        status: PositionStatus::Open,
        closed_date: None,
        exit_price: None,
        realized_pnl: None,
    };
    assert_eq!(position.dollars_at_risk(), dec!(500));

    position.current_price = dec!(90);
    assert_eq!(position.dollars_at_risk(), dec!(0));
}
