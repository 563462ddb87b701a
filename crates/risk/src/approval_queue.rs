//! Signal Approval Queue (spec §4.13): a human gate between a validated
//! signal and an open position. Grounded on
//! `original_source/backend/src/services/signal_approval_service.py`'s
//! per-user pending cap and idempotent approve/reject transitions.

use chrono::{DateTime, Duration, Utc};
use jejakcuan_core::{QueueEntryStatus, SignalQueueEntry, TradeSignal};
use uuid::Uuid;

use crate::error::{RiskError, RiskResult};

/// Maximum PENDING entries a single user may hold at once; the oldest
/// pending entry is expired to make room for a new submission.
pub const MAX_PENDING_PER_USER: usize = 20;

#[derive(Debug, Default)]
pub struct ApprovalQueue {
    entries: Vec<SignalQueueEntry>,
}

impl ApprovalQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[SignalQueueEntry] {
        &self.entries
    }

    fn expire_if_stale(entry: &mut SignalQueueEntry, now: DateTime<Utc>) {
        if entry.status == QueueEntryStatus::Pending && entry.is_expired(now) {
            entry.status = QueueEntryStatus::Expired;
        }
    }

    /// Marks every stale PENDING entry EXPIRED. Callers run this on a
    /// schedule; `submit`/`approve`/`reject` also self-heal the single
    /// entry they touch so a missed sweep never masks a stale approval.
    pub fn expire_stale(&mut self, now: DateTime<Utc>) -> usize {
        let mut count = 0;
        for entry in &mut self.entries {
            let was_pending = entry.status == QueueEntryStatus::Pending;
            Self::expire_if_stale(entry, now);
            if was_pending && entry.status == QueueEntryStatus::Expired {
                count += 1;
            }
        }
        count
    }

    /// Adds `entry` to the queue, first expiring the user's oldest
    /// pending entry if they are already at `MAX_PENDING_PER_USER`.
    pub fn submit(&mut self, entry: SignalQueueEntry, now: DateTime<Utc>) {
        self.expire_stale(now);

        let pending_for_user: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.user_id == entry.user_id && e.status == QueueEntryStatus::Pending)
            .map(|(i, _)| i)
            .collect();

        if pending_for_user.len() >= MAX_PENDING_PER_USER {
            let oldest = pending_for_user
                .into_iter()
                .min_by_key(|&i| self.entries[i].submitted_at)
                .expect("non-empty by the len() check above");
            self.entries[oldest].status = QueueEntryStatus::Expired;
        }

        self.entries.push(entry);
    }

    fn find_pending_mut(&mut self, entry_id: Uuid, user_id: Uuid, now: DateTime<Utc>) -> RiskResult<&mut SignalQueueEntry> {
        let index = self
            .entries
            .iter()
            .position(|e| e.id == entry_id)
            .ok_or(RiskError::QueueEntryNotFound(entry_id))?;

        Self::expire_if_stale(&mut self.entries[index], now);

        let entry = &mut self.entries[index];
        if entry.user_id != user_id {
            return Err(RiskError::WrongOwner(entry_id));
        }
        if entry.status != QueueEntryStatus::Pending {
            return Err(RiskError::NotPending(entry_id, entry.status));
        }
        Ok(entry)
    }

    pub fn approve(&mut self, entry_id: Uuid, user_id: Uuid, now: DateTime<Utc>) -> RiskResult<()> {
        let entry = self.find_pending_mut(entry_id, user_id, now)?;
        entry.status = QueueEntryStatus::Approved;
        entry.approved_at = Some(now);
        Ok(())
    }

    pub fn reject(&mut self, entry_id: Uuid, user_id: Uuid, reason: String, now: DateTime<Utc>) -> RiskResult<()> {
        let entry = self.find_pending_mut(entry_id, user_id, now)?;
        entry.status = QueueEntryStatus::Rejected;
        entry.rejection_reason = Some(reason);
        Ok(())
    }
}

/// Builds a queue entry expiring `ttl` after `submitted_at`, per spec
/// §4.13's default 15-minute approval window. `snapshot` freezes the
/// signal as it was at submission time so a later approval can't be
/// fooled by the signal mutating underneath it.
pub fn new_entry(snapshot: TradeSignal, user_id: Uuid, submitted_at: DateTime<Utc>, ttl: Duration) -> SignalQueueEntry {
    SignalQueueEntry {
        id: Uuid::new_v4(),
        signal_id: snapshot.id,
        user_id,
        status: QueueEntryStatus::Pending,
        submitted_at,
        expires_at: submitted_at + ttl,
        approved_at: None,
        rejection_reason: None,
        snapshot,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jejakcuan_core::{
        AssetClass, ConfidenceComponents, Phase, PatternType, PositionSizeUnit, SignalStatus, TargetLevels, Timeframe,
        ValidationChain,
    };
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

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

    fn entry(user: Uuid, submitted_at: DateTime<Utc>) -> SignalQueueEntry {
        new_entry(signal(), user, submitted_at, Duration::minutes(15))
    }

    #[test]
    fn approve_transitions_pending_to_approved() {
        let mut queue = ApprovalQueue::new();
        let user = Uuid::new_v4();
        let now = Utc::now();
        let e = entry(user, now);
        let id = e.id;
        queue.submit(e, now);
        queue.approve(id, user, now).unwrap();
        assert_eq!(queue.entries()[0].status, QueueEntryStatus::Approved);
    }

    #[test]
    fn wrong_owner_cannot_approve() {
        let mut queue = ApprovalQueue::new();
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();
        let now = Utc::now();
        let e = entry(user, now);
        let id = e.id;
        queue.submit(e, now);
        let err = queue.approve(id, other, now).unwrap_err();
        assert!(matches!(err, RiskError::WrongOwner(_)));
    }

    #[test]
    fn expired_entry_cannot_be_approved() {
        let mut queue = ApprovalQueue::new();
        let user = Uuid::new_v4();
        let submitted_at = Utc::now() - Duration::minutes(20);
        let e = entry(user, submitted_at);
        let id = e.id;
        queue.submit(e, submitted_at);
        let err = queue.approve(id, user, Utc::now()).unwrap_err();
        assert!(matches!(err, RiskError::NotPending(_, QueueEntryStatus::Expired)));
    }

    #[test]
    fn submitting_past_the_per_user_cap_expires_the_oldest() {
        let mut queue = ApprovalQueue::new();
        let user = Uuid::new_v4();
        let base = Utc::now();
        let mut first_id = None;
        for i in 0..MAX_PENDING_PER_USER {
            let e = entry(user, base + Duration::seconds(i as i64));
            if i == 0 {
                first_id = Some(e.id);
            }
            queue.submit(e, base + Duration::seconds(i as i64));
        }
        let overflow = entry(user, base + Duration::seconds(100));
        queue.submit(overflow, base + Duration::seconds(100));

        let first = queue.entries().iter().find(|e| e.id == first_id.unwrap()).unwrap();
        assert_eq!(first.status, QueueEntryStatus::Expired);
    }

    #[test]
    fn reject_is_terminal_and_not_reapprovable() {
        let mut queue = ApprovalQueue::new();
        let user = Uuid::new_v4();
        let now = Utc::now();
        let e = entry(user, now);
        let id = e.id;
        queue.submit(e, now);
        queue.reject(id, user, "no longer relevant".to_string(), now).unwrap();
        let err = queue.approve(id, user, now).unwrap_err();
        assert!(matches!(err, RiskError::NotPending(_, QueueEntryStatus::Rejected)));
    }
}
