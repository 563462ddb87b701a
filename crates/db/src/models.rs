//! Database models (row types)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// BMAD campaign row, including its live risk-allocation bookkeeping so a
/// `CampaignAllocationTracker` can be rebuilt on process restart.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CampaignRow {
    pub id: Uuid,
    pub symbol: String,
    pub range_id: Uuid,
    pub account_equity: Decimal,
    pub spring_used_pct: Decimal,
    pub sos_used_pct: Decimal,
    pub lps_used_pct: Decimal,
    pub position_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PositionRow {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub signal_id: Uuid,
    pub symbol: String,
    pub direction: String,
    pub entry_date: DateTime<Utc>,
    pub entry_price: Decimal,
    pub shares: Decimal,
    pub stop_loss: Decimal,
    pub current_price: Decimal,
    pub current_pnl: Decimal,
    pub status: String,
    pub closed_date: Option<DateTime<Utc>>,
    pub exit_price: Option<Decimal>,
    pub realized_pnl: Option<Decimal>,
}

/// One row per campaign -- an `ExitRule` is defined once per campaign and
/// shared by every position opened within it (spec §4.14).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ExitRuleRow {
    pub campaign_id: Uuid,
    pub target_1: Decimal,
    pub target_2: Decimal,
    pub target_3: Decimal,
    pub t1_exit_pct: Decimal,
    pub t2_exit_pct: Decimal,
    pub t3_exit_pct: Decimal,
    pub trail_to_breakeven_on_t1: bool,
    pub trail_to_t1_on_t2: bool,
    pub spring_low: Option<Decimal>,
    pub ice_level: Option<Decimal>,
    pub creek_level: Option<Decimal>,
    pub utad_high: Option<Decimal>,
    pub jump_target: Option<Decimal>,
}

/// `TradeSignal` is stored whole as `payload` (it is immutable once
/// created); the scalar columns exist so the signal list/filter queries
/// don't need to round-trip through JSON.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SignalRow {
    pub id: Uuid,
    pub symbol: String,
    pub pattern_type: String,
    pub phase: String,
    pub status: String,
    pub confidence_score: Decimal,
    pub r_multiple: Decimal,
    pub campaign_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QueueEntryRow {
    pub id: Uuid,
    pub signal_id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub submitted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub snapshot: serde_json::Value,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct NotificationLogRow {
    pub id: Uuid,
    pub recipient_id: String,
    pub channel: String,
    pub title: String,
    pub body: String,
    pub priority: String,
    pub sent_at: DateTime<Utc>,
    pub delivered: bool,
    pub error: Option<String>,
}

