//! Audit logging and real-time event streaming for the trading-signal
//! engine: an append-only audit trail for queue/approval/position
//! lifecycle actions, plus the replay-ring event bus that backs the
//! WebSocket fan-out in `apps/api`.

mod bus;
mod events;
mod logger;

pub use bus::{EventBus, Frame, REPLAY_CAPACITY, REPLAY_TTL_MINUTES};
pub use events::*;
pub use logger::*;
