use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Asset class traded by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    Stock,
    Forex,
    Crypto,
}

/// Bar timeframe, string-backed so new timeframes don't require a schema
/// migration. Comparisons only ever happen within one (symbol, timeframe).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Timeframe(pub String);

impl Timeframe {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }
}

/// A single OHLCV bar. Immutable once admitted to a `BarWindow`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub ts_utc: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Bar {
    /// high - low.
    pub fn spread(&self) -> Decimal {
        self.high - self.low
    }

    /// (close - low) / (high - low), clamped to 0.5 when the bar is
    /// degenerate (high == low).
    pub fn close_position(&self) -> Decimal {
        let spread = self.spread();
        if spread.is_zero() {
            return Decimal::new(5, 1);
        }
        (self.close - self.low) / spread
    }

    /// low <= min(o,c) <= max(o,c) <= high, volume >= 0.
    pub fn is_well_formed(&self) -> bool {
        let lo = self.open.min(self.close);
        let hi = self.open.max(self.close);
        self.low <= lo && hi <= self.high && self.volume >= Decimal::ZERO
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PivotType {
    High,
    Low,
}

/// A confirmed swing high or low.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pivot {
    pub index: usize,
    pub ts_utc: DateTime<Utc>,
    pub price: Decimal,
    pub pivot_type: PivotType,
    pub strength: Decimal,
}

/// A set of pivots whose prices cluster within tolerance of the running mean.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceCluster {
    pub pivot_type: PivotType,
    pub pivots: Vec<Pivot>,
    pub average: Decimal,
    pub min: Decimal,
    pub max: Decimal,
    pub std_dev: Decimal,
    pub touch_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeTrend {
    Decreasing,
    Flat,
    Increasing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrengthRating {
    Weak,
    Moderate,
    Strong,
}

impl StrengthRating {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=39 => StrengthRating::Weak,
            40..=69 => StrengthRating::Moderate,
            _ => StrengthRating::Strong,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelKind {
    Creek,
    Ice,
    Jump,
}

/// Creek (support), Ice (resistance), or Jump (measured target).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    pub kind: LevelKind,
    pub price: Decimal,
    pub touch_count: usize,
    pub strength_score: u8,
    pub strength: StrengthRating,
    pub first_test_ts: DateTime<Utc>,
    pub last_test_ts: DateTime<Utc>,
    pub hold_duration_bars: usize,
    pub volume_trend: VolumeTrend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneType {
    Supply,
    Demand,
}

/// Zone freshness, demoted by touch count. Exhausted zones are filtered
/// out of signal generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneStrength {
    Fresh,
    Tested,
    Exhausted,
}

impl ZoneStrength {
    pub fn from_touch_count(touches: usize) -> Self {
        match touches {
            0 => ZoneStrength::Fresh,
            1..=2 => ZoneStrength::Tested,
            _ => ZoneStrength::Exhausted,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    pub zone_type: ZoneType,
    pub price_low: Decimal,
    pub price_high: Decimal,
    pub strength: ZoneStrength,
    pub touch_count: usize,
    pub formation_volume_ratio: Decimal,
    pub formation_spread_ratio: Decimal,
    pub formation_close_position: Decimal,
    pub significance_score: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeStatus {
    Forming,
    Active,
    Breakout,
    Archived,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingRange {
    pub id: Uuid,
    pub symbol: String,
    pub timeframe: Timeframe,
    pub support: Decimal,
    pub resistance: Decimal,
    pub midpoint: Decimal,
    pub range_width: Decimal,
    pub range_width_pct: Decimal,
    pub start_index: usize,
    pub end_index: usize,
    pub duration_bars: usize,
    pub quality_score: u8,
    pub status: RangeStatus,
    pub start_ts: DateTime<Utc>,
    pub end_ts: DateTime<Utc>,
    pub creek: Option<Level>,
    pub ice: Option<Level>,
    pub jump: Option<Level>,
    pub zones: Vec<Zone>,
}

impl TradingRange {
    /// Admitted for pattern use only once both Creek and Ice clear the
    /// strength floor and Creek < Ice < Jump holds.
    pub fn is_admitted_for_patterns(&self) -> bool {
        let (Some(creek), Some(ice), Some(jump)) = (&self.creek, &self.ice, &self.jump) else {
            return false;
        };
        creek.strength_score >= 60
            && ice.strength_score >= 60
            && creek.price < ice.price
            && ice.price < jump.price
    }
}

/// Canonical Wyckoff events: accumulation side plus UTAD for distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    SellingClimax,
    AutomaticRally,
    SecondaryTest,
    Spring,
    SignOfStrength,
    LastPointOfSupport,
    Utad,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WyckoffEvent {
    pub event_type: EventType,
    pub range_id: Uuid,
    pub trigger_bar_index: usize,
    pub trigger_ts: DateTime<Utc>,
    pub confidence: u8,
    /// Quantitative fingerprint (volume_ratio, penetration_pct,
    /// recovery_bars, distance_from_level_pct, ...), keyed by name so new
    /// detectors can add fields without a schema change.
    pub fingerprint: std::collections::BTreeMap<String, Decimal>,
    /// Indices into the range's event list this event depends on (e.g. an
    /// AR depends on the SC that preceded it).
    pub predecessor_indices: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    A,
    B,
    C,
    D,
    E,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseClassification {
    pub phase: Option<Phase>,
    pub confidence: u8,
    pub duration_bars: usize,
    pub events: Vec<WyckoffEvent>,
    pub trading_allowed: bool,
    pub rejection_reason: Option<String>,
    pub phase_start_index: usize,
    pub phase_start_ts: DateTime<Utc>,
}

/// Pattern a signal is built from. UTAD implies SHORT, the rest LONG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    Spring,
    Sos,
    Lps,
    Utad,
}

impl PatternType {
    pub fn direction(self) -> Direction {
        match self {
            PatternType::Utad => Direction::Short,
            _ => Direction::Long,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Long,
    Short,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionSizeUnit {
    Shares,
    Lots,
    Contracts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalStatus {
    Pending,
    Approved,
    Rejected,
    Filled,
    Stopped,
    TargetHit,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Pass,
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageValidationResult {
    pub stage: String,
    pub status: ValidationStatus,
    pub reason: Option<String>,
    pub metadata: std::collections::BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ValidationChain {
    pub stages: Vec<StageValidationResult>,
}

impl ValidationChain {
    pub fn overall_status(&self) -> ValidationStatus {
        if self.stages.iter().any(|s| s.status == ValidationStatus::Fail) {
            ValidationStatus::Fail
        } else if self
            .stages
            .iter()
            .any(|s| s.status == ValidationStatus::Warn)
        {
            ValidationStatus::Warn
        } else {
            ValidationStatus::Pass
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetLevels {
    pub primary_target: Decimal,
    pub secondary_targets: Vec<Decimal>,
    pub trailing_activation: Option<Decimal>,
    pub trailing_offset: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceComponents {
    pub pattern: Decimal,
    pub phase: Decimal,
    pub volume: Decimal,
}

impl ConfidenceComponents {
    /// Weighted average: pattern 0.5 + phase 0.3 + volume 0.2, clamped to
    /// the signal's documented [70, 95] range.
    pub fn weighted(&self) -> Decimal {
        let raw = self.pattern * Decimal::new(5, 1)
            + self.phase * Decimal::new(3, 1)
            + self.volume * Decimal::new(2, 1);
        raw.clamp(Decimal::from(70), Decimal::from(95))
    }
}

/// Immutable pattern-derived trade signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeSignal {
    pub id: Uuid,
    pub asset_class: AssetClass,
    pub symbol: String,
    pub pattern_type: PatternType,
    pub phase: Phase,
    pub timeframe: Timeframe,
    pub entry_price: Decimal,
    pub stop_loss: Decimal,
    pub target_levels: TargetLevels,
    pub position_size: Decimal,
    pub position_size_unit: PositionSizeUnit,
    pub leverage: Decimal,
    pub margin: Decimal,
    pub notional_value: Decimal,
    pub risk_amount: Decimal,
    pub r_multiple: Decimal,
    pub confidence_score: Decimal,
    pub confidence_components: ConfidenceComponents,
    pub campaign_id: Option<Uuid>,
    pub status: SignalStatus,
    pub rejection_reasons: Vec<String>,
    pub validation_chain: ValidationChain,
    pub schema_version: u32,
    pub created_at: DateTime<Utc>,
}

impl TradeSignal {
    pub fn direction(&self) -> Direction {
        self.pattern_type.direction()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionStatus {
    Open,
    Closed,
    Stopped,
    TargetHit,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub signal_id: Uuid,
    pub symbol: String,
    pub direction: Direction,
    pub entry_date: DateTime<Utc>,
    pub entry_price: Decimal,
    pub shares: Decimal,
    pub stop_loss: Decimal,
    pub current_price: Decimal,
    pub current_pnl: Decimal,
    pub status: PositionStatus,
    pub closed_date: Option<DateTime<Utc>>,
    pub exit_price: Option<Decimal>,
    pub realized_pnl: Option<Decimal>,
}

impl Position {
    /// Dollars at risk, direction-aware; zero once price has moved through
    /// the stop (the position is exiting rather than still "at risk").
    pub fn dollars_at_risk(&self) -> Decimal {
        let diff = match self.direction {
            Direction::Long => self.current_price - self.stop_loss,
            Direction::Short => self.stop_loss - self.current_price,
        };
        if diff < Decimal::ZERO {
            Decimal::ZERO
        } else {
            diff * self.shares
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidationLevels {
    pub spring_low: Option<Decimal>,
    pub ice_level: Option<Decimal>,
    pub creek_level: Option<Decimal>,
    pub utad_high: Option<Decimal>,
    pub jump_target: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitRule {
    pub campaign_id: Uuid,
    pub target_1: Decimal,
    pub target_2: Decimal,
    pub target_3: Decimal,
    pub t1_exit_pct: Decimal,
    pub t2_exit_pct: Decimal,
    pub t3_exit_pct: Decimal,
    pub trail_to_breakeven_on_t1: bool,
    pub trail_to_t1_on_t2: bool,
    pub invalidation: InvalidationLevels,
}

impl ExitRule {
    /// §8 invariant: exit percentages sum to exactly 100.00%.
    pub fn exit_pcts_valid(&self) -> bool {
        self.t1_exit_pct + self.t2_exit_pct + self.t3_exit_pct == Decimal::from(100)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CampaignPattern {
    Spring,
    Sos,
    Lps,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub symbol: String,
    pub range_id: Uuid,
    pub account_equity: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueEntryStatus {
    Pending,
    Approved,
    Rejected,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalQueueEntry {
    pub id: Uuid,
    pub signal_id: Uuid,
    pub user_id: Uuid,
    pub status: QueueEntryStatus,
    pub submitted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub snapshot: TradeSignal,
}

impl SignalQueueEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
