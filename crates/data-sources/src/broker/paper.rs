//! In-memory paper-trading fill simulator: lets the signal/position
//! pipeline exercise the full `BrokerAdapter` surface in tests and in a
//! dry-run deployment without touching a live venue.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{BrokerAdapter, ExecutionReport, OcoOrder, Order, OrderStatus};
use crate::error::DataSourceError;

/// Fills every order immediately and in full at its limit/stop price,
/// falling back to `default_fill_price` for market orders that carry
/// neither.
pub struct PaperBroker {
    orders: Mutex<HashMap<Uuid, ExecutionReport>>,
    default_fill_price: Decimal,
}

impl PaperBroker {
    pub fn new(default_fill_price: Decimal) -> Self {
        Self {
            orders: Mutex::new(HashMap::new()),
            default_fill_price,
        }
    }

    fn fill_price(&self, order: &Order) -> Decimal {
        order
            .limit_price
            .or(order.stop_price)
            .unwrap_or(self.default_fill_price)
    }
}

impl Default for PaperBroker {
    fn default() -> Self {
        Self::new(Decimal::from(100))
    }
}

#[async_trait]
impl BrokerAdapter for PaperBroker {
    fn platform(&self) -> &'static str {
        "paper"
    }

    async fn connect(&self) -> Result<(), DataSourceError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), DataSourceError> {
        Ok(())
    }

    async fn place_order(&self, order: &Order) -> Result<ExecutionReport, DataSourceError> {
        let fill_price = self.fill_price(order);
        let report = ExecutionReport {
            order_id: order.id,
            platform_order_id: order.id.to_string(),
            platform: "paper".to_string(),
            status: OrderStatus::Filled,
            filled_quantity: order.quantity,
            remaining_quantity: Decimal::ZERO,
            average_fill_price: Some(fill_price),
            error_message: None,
        };
        self.orders.lock().await.insert(order.id, report.clone());
        Ok(report)
    }

    async fn place_oco(&self, oco: &OcoOrder) -> Result<Vec<ExecutionReport>, DataSourceError> {
        self.place_order(&oco.primary_order).await.map(|r| vec![r])
    }

    async fn cancel_order(&self, order_id: Uuid) -> Result<(), DataSourceError> {
        let mut orders = self.orders.lock().await;
        match orders.get_mut(&order_id) {
            Some(report) if report.status == OrderStatus::Filled => {
                Err(DataSourceError::ApiError("order already filled".into()))
            }
            Some(report) => {
                report.status = OrderStatus::Cancelled;
                Ok(())
            }
            None => Err(DataSourceError::OrderNotFound(order_id.to_string())),
        }
    }

    async fn get_order_status(&self, order_id: Uuid) -> Result<ExecutionReport, DataSourceError> {
        self.orders
            .lock()
            .await
            .get(&order_id)
            .cloned()
            .ok_or_else(|| DataSourceError::OrderNotFound(order_id.to_string()))
    }

    async fn get_open_orders(
        &self,
        symbol: Option<&str>,
    ) -> Result<Vec<ExecutionReport>, DataSourceError> {
        let orders = self.orders.lock().await;
        Ok(orders
            .values()
            .filter(|r| {
                !matches!(
                    r.status,
                    OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
                )
            })
            .filter(|r| symbol.map_or(true, |s| r.platform_order_id.contains(s)))
            .cloned()
            .collect())
    }

    async fn close_all_positions(&self) -> Result<(), DataSourceError> {
        // Paper positions are tracked by the risk engine, not this
        // adapter, so there is nothing to flatten here.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::{OrderSide, OrderType, TimeInForce};

    fn order() -> Order {
        Order {
            id: Uuid::new_v4(),
            symbol: "BBCA".to_string(),
            side: OrderSide::Buy,
            order_type: OrderType::Limit,
            time_in_force: TimeInForce::Gtc,
            quantity: Decimal::from(100),
            limit_price: Some(Decimal::from(9500)),
            stop_price: None,
            take_profit: None,
            stop_loss: None,
        }
    }

    #[tokio::test]
    async fn place_order_fills_immediately_at_limit_price() {
        let broker = PaperBroker::default();
        let report = broker.place_order(&order()).await.unwrap();
        assert_eq!(report.status, OrderStatus::Filled);
        assert_eq!(report.average_fill_price, Some(Decimal::from(9500)));
    }

    #[tokio::test]
    async fn cancel_unknown_order_errors() {
        let broker = PaperBroker::default();
        let err = broker.cancel_order(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DataSourceError::OrderNotFound(_)));
    }

    #[tokio::test]
    async fn filled_order_cannot_be_cancelled() {
        let broker = PaperBroker::default();
        let report = broker.place_order(&order()).await.unwrap();
        let err = broker.cancel_order(report.order_id).await.unwrap_err();
        assert!(matches!(err, DataSourceError::ApiError(_)));
    }
}
