//! Alpaca execution adapter. Grounded on `original_source/backend/src/
//! brokers/alpaca_adapter.py` (`AlpacaAdapter`): same base-URL pair,
//! status vocabulary, and bracket-order payload shape, reworked into
//! Rust's `reqwest`/`async-trait` idiom the way `yahoo/client.rs` builds
//! its HTTP client.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{BrokerAdapter, ExecutionReport, OcoOrder, Order, OrderSide, OrderStatus, OrderType};
use crate::error::DataSourceError;

const PAPER_BASE_URL: &str = "https://paper-api.alpaca.markets";
const LIVE_BASE_URL: &str = "https://api.alpaca.markets";

pub struct AlpacaBroker {
    client: Client,
    base_url: String,
    key_id: String,
    secret_key: String,
    connected: AtomicBool,
}

impl AlpacaBroker {
    pub fn new(key_id: impl Into<String>, secret_key: impl Into<String>, paper: bool) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("jejakcuan-risk-engine/0.1")
            .build()
            .expect("failed to build Alpaca HTTP client");

        Self {
            client,
            base_url: if paper {
                PAPER_BASE_URL.to_string()
            } else {
                LIVE_BASE_URL.to_string()
            }
            .into(),
            key_id: key_id.into(),
            secret_key: secret_key.into(),
            connected: AtomicBool::new(false),
        }
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("APCA-API-KEY-ID", &self.key_id)
            .header("APCA-API-SECRET-KEY", &self.secret_key)
    }

    fn ensure_connected(&self) -> Result<(), DataSourceError> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DataSourceError::NotConnected)
        }
    }

    fn build_order_payload(order: &Order) -> serde_json::Value {
        let mut payload = json!({
            "symbol": order.symbol,
            "qty": order.quantity.to_string(),
            "side": side_str(order.side),
            "type": order_type_str(order.order_type),
            "time_in_force": tif_str(order.time_in_force),
        });

        if let Some(limit) = order.limit_price {
            payload["limit_price"] = json!(limit.to_string());
        }
        if let Some(stop) = order.stop_price {
            payload["stop_price"] = json!(stop.to_string());
        }
        if order.take_profit.is_some() || order.stop_loss.is_some() {
            payload["order_class"] = json!("bracket");
            if let Some(tp) = order.take_profit {
                payload["take_profit"] = json!({ "limit_price": tp.to_string() });
            }
            if let Some(sl) = order.stop_loss {
                payload["stop_loss"] = json!({ "stop_price": sl.to_string() });
            }
        }

        payload
    }

    fn parse_order_response(
        order: &Order,
        body: &serde_json::Value,
    ) -> Result<ExecutionReport, DataSourceError> {
        let platform_order_id = body
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| DataSourceError::InvalidResponse("missing order id".into()))?
            .to_string();

        let status = alpaca_status(body.get("status").and_then(|v| v.as_str()).unwrap_or(""));

        let filled_quantity = body
            .get("filled_qty")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse::<Decimal>().ok())
            .unwrap_or(Decimal::ZERO);

        let average_fill_price = body
            .get("filled_avg_price")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse::<Decimal>().ok());

        Ok(ExecutionReport {
            order_id: order.id,
            platform_order_id,
            platform: "alpaca".to_string(),
            remaining_quantity: order.quantity - filled_quantity,
            filled_quantity,
            average_fill_price,
            status,
            error_message: None,
        })
    }
}

fn side_str(side: OrderSide) -> &'static str {
    match side {
        OrderSide::Buy => "buy",
        OrderSide::Sell => "sell",
    }
}

fn order_type_str(order_type: OrderType) -> &'static str {
    match order_type {
        OrderType::Market => "market",
        OrderType::Limit => "limit",
        OrderType::Stop => "stop",
        OrderType::StopLimit => "stop_limit",
    }
}

fn tif_str(tif: super::TimeInForce) -> &'static str {
    match tif {
        super::TimeInForce::Gtc => "gtc",
        super::TimeInForce::Day => "day",
        super::TimeInForce::Ioc => "ioc",
        super::TimeInForce::Fok => "fok",
    }
}

/// Mirrors `_ALPACA_STATUS_MAP` in `alpaca_adapter.py`.
fn alpaca_status(raw: &str) -> OrderStatus {
    match raw {
        "new" | "accepted" | "pending_new" | "held" => OrderStatus::Submitted,
        "partially_filled" => OrderStatus::PartialFill,
        "filled" => OrderStatus::Filled,
        "canceled" | "pending_cancel" => OrderStatus::Cancelled,
        "expired" => OrderStatus::Expired,
        "rejected" | "suspended" => OrderStatus::Rejected,
        _ => OrderStatus::Pending,
    }
}

#[async_trait]
impl BrokerAdapter for AlpacaBroker {
    fn platform(&self) -> &'static str {
        "alpaca"
    }

    async fn connect(&self) -> Result<(), DataSourceError> {
        let resp = self
            .authed(self.client.get(format!("{}/v2/account", self.base_url)))
            .send()
            .await?;

        if resp.status().is_success() {
            self.connected.store(true, Ordering::SeqCst);
            debug!("connected to Alpaca at {}", self.base_url);
            Ok(())
        } else {
            warn!(status = %resp.status(), "Alpaca connect failed");
            Err(DataSourceError::ApiError(format!(
                "account check failed: {}",
                resp.status()
            )))
        }
    }

    async fn disconnect(&self) -> Result<(), DataSourceError> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn place_order(&self, order: &Order) -> Result<ExecutionReport, DataSourceError> {
        self.ensure_connected()?;
        let payload = Self::build_order_payload(order);

        let resp = self
            .authed(self.client.post(format!("{}/v2/orders", self.base_url)))
            .json(&payload)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body: serde_json::Value = resp.json().await.unwrap_or(json!({}));
            let message = body
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or("order rejected")
                .to_string();
            warn!(%status, %message, "Alpaca order rejected");
            return Ok(ExecutionReport::rejected(order, "alpaca", message));
        }

        let body: serde_json::Value = resp.json().await?;
        Self::parse_order_response(order, &body)
    }

    async fn place_oco(&self, oco: &OcoOrder) -> Result<Vec<ExecutionReport>, DataSourceError> {
        // A bracket order's stop-loss/take-profit legs are expressed as
        // nested fields on the primary order payload, so Alpaca only
        // ever returns the one parent report.
        self.place_order(&oco.primary_order).await.map(|r| vec![r])
    }

    async fn cancel_order(&self, order_id: Uuid) -> Result<(), DataSourceError> {
        self.ensure_connected()?;
        let resp = self
            .authed(
                self.client
                    .delete(format!("{}/v2/orders/{}", self.base_url, order_id)),
            )
            .send()
            .await?;

        if resp.status().is_success() || resp.status().as_u16() == 404 {
            Ok(())
        } else {
            Err(DataSourceError::ApiError(format!(
                "cancel failed: {}",
                resp.status()
            )))
        }
    }

    async fn get_order_status(&self, order_id: Uuid) -> Result<ExecutionReport, DataSourceError> {
        self.ensure_connected()?;
        let resp = self
            .authed(
                self.client
                    .get(format!("{}/v2/orders/{}", self.base_url, order_id)),
            )
            .send()
            .await?;

        if resp.status().as_u16() == 404 {
            return Err(DataSourceError::OrderNotFound(order_id.to_string()));
        }

        let body: serde_json::Value = resp.json().await?;
        let symbol = body
            .get("symbol")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let quantity = body
            .get("qty")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse::<Decimal>().ok())
            .unwrap_or(Decimal::ZERO);

        let placeholder = Order {
            id: order_id,
            symbol,
            side: OrderSide::Buy,
            order_type: OrderType::Market,
            time_in_force: super::TimeInForce::Day,
            quantity,
            limit_price: None,
            stop_price: None,
            take_profit: None,
            stop_loss: None,
        };
        Self::parse_order_response(&placeholder, &body)
    }

    async fn get_open_orders(
        &self,
        symbol: Option<&str>,
    ) -> Result<Vec<ExecutionReport>, DataSourceError> {
        self.ensure_connected()?;
        let mut req = self
            .authed(self.client.get(format!("{}/v2/orders", self.base_url)))
            .query(&[("status", "open")]);
        if let Some(symbol) = symbol {
            req = req.query(&[("symbols", symbol)]);
        }

        let body: Vec<serde_json::Value> = req.send().await?.json().await?;
        let mut reports = Vec::with_capacity(body.len());
        for entry in &body {
            let symbol = entry
                .get("symbol")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            let quantity = entry
                .get("qty")
                .and_then(|v| v.as_str())
                .and_then(|s| s.parse::<Decimal>().ok())
                .unwrap_or(Decimal::ZERO);
            let placeholder = Order {
                id: Uuid::new_v4(),
                symbol,
                side: OrderSide::Buy,
                order_type: OrderType::Market,
                time_in_force: super::TimeInForce::Day,
                quantity,
                limit_price: None,
                stop_price: None,
                take_profit: None,
                stop_loss: None,
            };
            reports.push(Self::parse_order_response(&placeholder, entry)?);
        }
        Ok(reports)
    }

    async fn close_all_positions(&self) -> Result<(), DataSourceError> {
        self.ensure_connected()?;
        let resp = self
            .authed(self.client.delete(format!("{}/v2/positions", self.base_url)))
            .send()
            .await?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(DataSourceError::ApiError(format!(
                "close_all_positions failed: {}",
                resp.status()
            )))
        }
    }
}
