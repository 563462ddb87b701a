//! Bar data sources for the engine's rolling `BarWindow`s (spec §4.1).
//! Grounded on `data-sources/src/twelvedata/websocket.rs`'s
//! reconnect/backoff/command-channel architecture, generalized from
//! delivering raw price ticks to delivering closed OHLCV bars.

mod aggregator;
mod twelvedata;

pub use aggregator::TickAggregator;
pub use twelvedata::TwelveDataBarSource;

use async_trait::async_trait;
use jejakcuan_core::Bar;

use crate::error::DataSourceError;

/// Events a `BarSource` emits. `Bar` fires once per closed bar, never
/// for the still-forming one -- callers feed each `Bar` straight into
/// `BarWindowManager::append`.
#[derive(Debug, Clone)]
pub enum BarEvent {
    Connected,
    Disconnected,
    Bar(Bar),
    Error(String),
}

/// A live feed of closed bars for a subscribed symbol set. Implementors
/// own their own reconnect/backoff loop internally; `subscribe`/
/// `unsubscribe` are expected to be cheap and non-blocking.
#[async_trait]
pub trait BarSource: Send + Sync {
    async fn connect(&mut self) -> Result<(), DataSourceError>;

    async fn subscribe(&self, symbols: Vec<String>) -> Result<(), DataSourceError>;

    async fn unsubscribe(&self, symbols: Vec<String>) -> Result<(), DataSourceError>;

    /// Awaits the next event; `None` once the source has been
    /// disconnected and its event channel drained.
    async fn recv(&self) -> Option<BarEvent>;

    async fn disconnect(&self) -> Result<(), DataSourceError>;
}
