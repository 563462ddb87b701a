//! Order/execution vocabulary shared by every `BrokerAdapter` impl.
//! Grounded on `original_source/backend/src/models/order.py`'s
//! `Order`/`ExecutionReport`/`OrderStatus` field layout.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Market,
    Limit,
    Stop,
    StopLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeInForce {
    Gtc,
    Day,
    Ioc,
    Fok,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Submitted,
    PartialFill,
    Filled,
    Cancelled,
    Expired,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub time_in_force: TimeInForce,
    pub quantity: Decimal,
    pub limit_price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    /// Set for the position's take-profit leg when submitted as part of
    /// a bracket/OCO order.
    pub take_profit: Option<Decimal>,
    /// Set for the position's stop-loss leg when submitted as part of
    /// a bracket/OCO order.
    pub stop_loss: Option<Decimal>,
}

/// Entry + stop-loss + take-profit submitted together so the platform
/// cancels the sibling leg once one fills (spec §6's bracket order).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcoOrder {
    pub id: Uuid,
    pub primary_order: Order,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub order_id: Uuid,
    pub platform_order_id: String,
    pub platform: String,
    pub status: OrderStatus,
    pub filled_quantity: Decimal,
    pub remaining_quantity: Decimal,
    pub average_fill_price: Option<Decimal>,
    pub error_message: Option<String>,
}

impl ExecutionReport {
    pub fn rejected(order: &Order, platform: &str, error_message: impl Into<String>) -> Self {
        Self {
            order_id: order.id,
            platform_order_id: String::new(),
            platform: platform.to_string(),
            status: OrderStatus::Rejected,
            filled_quantity: Decimal::ZERO,
            remaining_quantity: order.quantity,
            average_fill_price: None,
            error_message: Some(error_message.into()),
        }
    }
}
