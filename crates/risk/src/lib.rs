//! Risk management for the trading-signal engine: turns a detected
//! Wyckoff pattern into a sized, validated `TradeSignal`, then carries it
//! through approval and the position's exit lifecycle.

pub mod approval_queue;
pub mod campaign;
pub mod error;
pub mod lifecycle;
pub mod signal_builder;
pub mod sizing;
pub mod validation;

pub use approval_queue::{new_entry, ApprovalQueue, MAX_PENDING_PER_USER};
pub use campaign::CampaignAllocationTracker;
pub use error::{RiskError, RiskResult};
pub use lifecycle::{evaluate_bar, validate_stop_update, LifecycleAction, TargetLevel};
pub use signal_builder::{build_signal, resolve_sos_entry, EntryPreference};
pub use sizing::{size_position, PortfolioRiskState, SizingResult};
pub use validation::{default_stages, run_chain, ValidationContext, ValidationStage};
