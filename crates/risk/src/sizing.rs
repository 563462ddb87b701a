//! Position Sizer & Risk Allocator (spec §4.12): BMAD campaign allocation,
//! hard risk caps, and minimum R-multiple per pattern.

use jejakcuan_core::{CampaignPattern, PatternType, StageValidationResult, ValidationStatus};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::{RiskError, RiskResult};

pub const MAX_PER_TRADE_RISK: Decimal = dec!(2.0);
pub const MAX_PORTFOLIO_HEAT: Decimal = dec!(10.0);
pub const WARN_PORTFOLIO_HEAT: Decimal = dec!(8.0);
pub const MAX_CAMPAIGN_RISK: Decimal = dec!(5.0);
pub const WARN_CAMPAIGN_RISK: Decimal = dec!(4.0);
pub const MAX_CORRELATED_RISK: Decimal = dec!(6.0);
pub const WARN_CORRELATED_RISK: Decimal = dec!(4.8);
pub const MAX_CAMPAIGN_POSITIONS: usize = 5;
pub const MAX_POSITION_VALUE_PCT: Decimal = dec!(20.0);

pub const CAMPAIGN_SPRING_ALLOCATION: Decimal = dec!(0.40);
pub const CAMPAIGN_SOS_ALLOCATION: Decimal = dec!(0.35);
pub const CAMPAIGN_LPS_ALLOCATION: Decimal = dec!(0.25);

/// Minimum acceptable R-multiple, by pattern (FR19).
pub fn min_r_multiple(pattern: PatternType) -> Decimal {
    match pattern {
        PatternType::Spring => dec!(3.0),
        PatternType::Sos => dec!(2.0),
        PatternType::Lps => dec!(2.5),
        PatternType::Utad => dec!(3.0),
    }
}

/// Share of the campaign's risk budget each BMAD pattern draws on.
pub fn bmad_allocation_pct(pattern: CampaignPattern) -> Decimal {
    match pattern {
        CampaignPattern::Spring => CAMPAIGN_SPRING_ALLOCATION,
        CampaignPattern::Sos => CAMPAIGN_SOS_ALLOCATION,
        CampaignPattern::Lps => CAMPAIGN_LPS_ALLOCATION,
    }
}

fn campaign_pattern_for(pattern: PatternType) -> Option<CampaignPattern> {
    match pattern {
        PatternType::Spring => Some(CampaignPattern::Spring),
        PatternType::Sos => Some(CampaignPattern::Sos),
        PatternType::Lps => Some(CampaignPattern::Lps),
        // UTAD trades short a distribution top; they aren't part of a BMAD
        // accumulation campaign and size against the flat per-trade cap.
        PatternType::Utad => None,
    }
}

/// Portfolio-wide risk already committed, as percent of account equity,
/// read by the caller from open positions before sizing a new one.
#[derive(Debug, Clone, Copy, Default)]
pub struct PortfolioRiskState {
    pub portfolio_heat_pct: Decimal,
    pub campaign_risk_pct: Decimal,
    pub correlated_risk_pct: Decimal,
    pub campaign_position_count: usize,
}

#[derive(Debug, Clone)]
pub struct SizingResult {
    pub shares: Decimal,
    pub risk_amount: Decimal,
    pub notional_value: Decimal,
    pub risk_budget_pct: Decimal,
    pub stage_result: StageValidationResult,
}

fn apply_cap(status: &mut ValidationStatus, reasons: &mut Vec<String>, label: &str, projected: Decimal, warn: Decimal, max: Decimal) {
    if projected > max {
        *status = ValidationStatus::Fail;
        reasons.push(format!("{label} would reach {projected:.2}%, cap is {max}%"));
    } else if projected > warn && *status != ValidationStatus::Fail {
        *status = ValidationStatus::Warn;
        reasons.push(format!("{label} would reach {projected:.2}%, warn threshold is {warn}%"));
    }
}

/// `shares = floor(risk_budget / per_share_risk)`, where `risk_budget` is
/// the campaign's BMAD allocation of the per-trade cap (or the flat
/// per-trade cap itself for UTAD, which has no campaign). Evaluates every
/// hard cap from §4.12 against the position this sizing would add and
/// folds the verdict into a single `risk` stage result.
pub fn size_position(
    pattern_type: PatternType,
    entry: Decimal,
    stop: Decimal,
    account_equity: Decimal,
    state: &PortfolioRiskState,
) -> RiskResult<SizingResult> {
    let per_share_risk = (entry - stop).abs();
    if per_share_risk.is_zero() {
        return Err(RiskError::InvalidLevels("entry and stop-loss are equal".to_string()));
    }
    if account_equity.is_zero() {
        return Err(RiskError::InvalidLevels("account equity is zero".to_string()));
    }

    let campaign_pattern = campaign_pattern_for(pattern_type);
    let risk_budget_pct = match campaign_pattern {
        Some(pattern) => (MAX_CAMPAIGN_RISK * bmad_allocation_pct(pattern)).min(MAX_PER_TRADE_RISK),
        None => MAX_PER_TRADE_RISK,
    };
    let risk_budget = account_equity * risk_budget_pct / dec!(100);

    let shares = (risk_budget / per_share_risk).floor();
    let notional_value = shares * entry;
    let risk_amount = shares * per_share_risk;

    let mut status = ValidationStatus::Pass;
    let mut reasons = Vec::new();

    if shares < Decimal::ONE {
        status = ValidationStatus::Fail;
        reasons.push("position size rounds down to zero shares".to_string());
    }

    let max_position_value = account_equity * MAX_POSITION_VALUE_PCT / dec!(100);
    if notional_value > max_position_value {
        status = ValidationStatus::Fail;
        reasons.push(format!("position value {notional_value} exceeds {MAX_POSITION_VALUE_PCT}% of account equity"));
    }

    let added_risk_pct = risk_amount / account_equity * dec!(100);
    apply_cap(
        &mut status,
        &mut reasons,
        "portfolio heat",
        state.portfolio_heat_pct + added_risk_pct,
        WARN_PORTFOLIO_HEAT,
        MAX_PORTFOLIO_HEAT,
    );
    if campaign_pattern.is_some() {
        apply_cap(
            &mut status,
            &mut reasons,
            "campaign risk",
            state.campaign_risk_pct + added_risk_pct,
            WARN_CAMPAIGN_RISK,
            MAX_CAMPAIGN_RISK,
        );
        if state.campaign_position_count >= MAX_CAMPAIGN_POSITIONS {
            status = ValidationStatus::Fail;
            reasons.push(format!("campaign already holds the maximum of {MAX_CAMPAIGN_POSITIONS} positions"));
        }
    }
    apply_cap(
        &mut status,
        &mut reasons,
        "correlated (sector) risk",
        state.correlated_risk_pct + added_risk_pct,
        WARN_CORRELATED_RISK,
        MAX_CORRELATED_RISK,
    );

    Ok(SizingResult {
        shares,
        risk_amount,
        notional_value,
        risk_budget_pct,
        stage_result: StageValidationResult {
            stage: "risk".to_string(),
            status,
            reason: reasons.first().cloned(),
            metadata: std::collections::BTreeMap::new(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shares_floor_to_whole_units() {
        let state = PortfolioRiskState::default();
        let result = size_position(PatternType::Spring, dec!(100), dec!(98), dec!(100_000), &state).unwrap();
        // risk_budget_pct = min(5.0% campaign cap * 40% spring share, 2.0% per-trade cap) = 2.0%
        // risk_budget = 100_000 * 2.0% = 2_000; per_share_risk = 2 -> 1_000 shares
        assert_eq!(result.shares, dec!(1000));
    }

    #[test]
    fn utad_sizes_against_flat_per_trade_cap() {
        let state = PortfolioRiskState::default();
        let result = size_position(PatternType::Utad, dec!(100), dec!(102), dec!(100_000), &state).unwrap();
        assert_eq!(result.risk_budget_pct, MAX_PER_TRADE_RISK);
    }

    #[test]
    fn portfolio_heat_above_cap_fails() {
        let state = PortfolioRiskState {
            portfolio_heat_pct: dec!(9.9),
            ..Default::default()
        };
        let result = size_position(PatternType::Spring, dec!(100), dec!(98), dec!(100_000), &state).unwrap();
        assert_eq!(result.stage_result.status, ValidationStatus::Fail);
    }

    #[test]
    fn equal_entry_and_stop_is_rejected() {
        let state = PortfolioRiskState::default();
        let err = size_position(PatternType::Sos, dec!(100), dec!(100), dec!(100_000), &state).unwrap_err();
        assert!(matches!(err, RiskError::InvalidLevels(_)));
    }
}
