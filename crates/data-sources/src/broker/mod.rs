//! Broker/execution platform adapters (spec §6): a single async trait
//! implemented once against a live venue and once as an in-memory
//! simulator, so the rest of the engine never branches on which is
//! wired up.
//!
//! Method surface and status vocabulary grounded on `original_source/
//! backend/src/brokers/alpaca_adapter.py` (`AlpacaAdapter`); the
//! trait-over-multiple-impls shape follows `apps/api/src/notifications/
//! mod.rs`'s `NotificationSender`.

mod alpaca;
mod paper;
mod types;

pub use alpaca::AlpacaBroker;
pub use paper::PaperBroker;
pub use types::{
    ExecutionReport, OcoOrder, Order, OrderSide, OrderStatus, OrderType, TimeInForce,
};

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DataSourceError;

/// Unifies order placement/cancellation/status across execution venues.
/// Every method returning `ExecutionReport` is expected to return
/// `Ok(report)` even for a broker-side rejection -- `Err` is reserved
/// for transport/auth failures, matching `alpaca_adapter.py`'s split
/// between HTTP errors and a 422-style rejected-order response.
#[async_trait]
pub trait BrokerAdapter: Send + Sync {
    /// Human-readable platform name used in `ExecutionReport::platform`
    /// and audit events (`"alpaca"`, `"paper"`).
    fn platform(&self) -> &'static str;

    async fn connect(&self) -> Result<(), DataSourceError>;

    async fn disconnect(&self) -> Result<(), DataSourceError>;

    async fn place_order(&self, order: &Order) -> Result<ExecutionReport, DataSourceError>;

    /// Submits an entry order bracketed with a stop-loss and take-profit
    /// leg; the platform cancels the sibling once either fills.
    async fn place_oco(&self, oco: &OcoOrder) -> Result<Vec<ExecutionReport>, DataSourceError>;

    async fn cancel_order(&self, order_id: Uuid) -> Result<(), DataSourceError>;

    async fn get_order_status(&self, order_id: Uuid) -> Result<ExecutionReport, DataSourceError>;

    async fn get_open_orders(
        &self,
        symbol: Option<&str>,
    ) -> Result<Vec<ExecutionReport>, DataSourceError>;

    /// Flattens every open position at market, used by the emergency-exit
    /// path when an invalidation level is breached (spec §4.14).
    async fn close_all_positions(&self) -> Result<(), DataSourceError>;
}
