//! `BarSource` backed by TwelveData's tick WebSocket, aggregated into
//! bars by `TickAggregator`. Connection handling is entirely delegated
//! to `crate::twelvedata::TwelveDataWebSocket`; this module only folds
//! its `WebSocketEvent::Price` stream into closed bars.

use async_trait::async_trait;
use chrono::Duration;
use jejakcuan_core::Timeframe;
use tokio::sync::Mutex;

use super::{aggregator::TickAggregator, BarEvent, BarSource};
use crate::error::DataSourceError;
use crate::twelvedata::{TwelveDataWebSocket, WebSocketEvent};

pub struct TwelveDataBarSource {
    ws: TwelveDataWebSocket,
    aggregator: Mutex<TickAggregator>,
}

impl TwelveDataBarSource {
    pub fn new(api_key: String, timeframe: Timeframe, bucket_width: Duration) -> Self {
        Self {
            ws: TwelveDataWebSocket::new(api_key),
            aggregator: Mutex::new(TickAggregator::new(timeframe, bucket_width)),
        }
    }
}

#[async_trait]
impl BarSource for TwelveDataBarSource {
    async fn connect(&mut self) -> Result<(), DataSourceError> {
        self.ws.connect().await
    }

    async fn subscribe(&self, symbols: Vec<String>) -> Result<(), DataSourceError> {
        self.ws.subscribe(symbols).await
    }

    async fn unsubscribe(&self, symbols: Vec<String>) -> Result<(), DataSourceError> {
        self.ws.unsubscribe(symbols).await
    }

    async fn recv(&self) -> Option<BarEvent> {
        loop {
            return match self.ws.recv().await? {
                WebSocketEvent::Connected => Some(BarEvent::Connected),
                WebSocketEvent::Disconnected => Some(BarEvent::Disconnected),
                WebSocketEvent::Error(msg) => Some(BarEvent::Error(msg)),
                WebSocketEvent::Subscribed(_) | WebSocketEvent::Unsubscribed(_) => continue,
                WebSocketEvent::Price(update) => {
                    let (Some(price), Some(ts)) = (update.price, update.datetime()) else {
                        continue;
                    };
                    let volume = update
                        .day_volume
                        .map(|v| v.into())
                        .unwrap_or(rust_decimal::Decimal::ZERO);

                    let mut aggregator = self.aggregator.lock().await;
                    match aggregator.on_tick(&update.symbol, price, volume, ts) {
                        Some(bar) => Some(BarEvent::Bar(bar)),
                        None => continue,
                    }
                }
            };
        }
    }

    async fn disconnect(&self) -> Result<(), DataSourceError> {
        self.ws.disconnect().await
    }
}
