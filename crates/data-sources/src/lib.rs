//! External collaborators for the Wyckoff signal engine: market data
//! feeds, execution venues, and outbound notifications, kept behind
//! thin adapters so the risk/technical crates never talk HTTP directly.

pub mod bars;
pub mod broker;
pub mod error;
pub mod notifications;
pub mod twelvedata;
pub mod yahoo;

pub use bars::{BarEvent, BarSource, TickAggregator, TwelveDataBarSource};
pub use broker::{
    AlpacaBroker, BrokerAdapter, ExecutionReport, OcoOrder, Order, OrderSide, OrderStatus,
    OrderType, PaperBroker, TimeInForce,
};
pub use error::DataSourceError;
pub use notifications::{
    Notification, NotificationChannel, NotificationPolicy, NotificationPriority,
    NotificationSender, NotificationService,
};
pub use yahoo::YahooFinanceClient;
