//! Redis caching layer for the Wyckoff signal engine: a thin
//! `ConnectionManager` wrapper plus the replay-ring mirror backing
//! `apps/api`'s WebSocket fan-out across multiple instances.

mod client;
mod keys;
mod replay;

pub use client::*;
pub use keys::*;
pub use replay::*;
