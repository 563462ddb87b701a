//! Real-time event bus for streaming consumers (spec §5): a global
//! monotonic sequence, a 500-frame replay ring with a 15-minute TTL, and
//! a `tokio::sync::broadcast` fan-out channel. The WebSocket transport
//! itself (accept/upgrade, per-connection bookkeeping) lives in
//! `apps/api`; this module is the connection-agnostic core both the
//! live broadcast and the reconnect-recovery endpoint read from.
//!
//! Grounded on `original_source/backend/src/api/websocket.py`'s
//! `ConnectionManager` (`_message_buffer: deque(maxlen=500)`,
//! `_global_sequence`, `get_messages_since`) and this crate's own
//! `logger.rs` background-task pattern; the `Arc<RwLock<VecDeque<_>>>`
//! shape follows `data-sources/src/twelvedata/websocket.rs`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};

pub const REPLAY_CAPACITY: usize = 500;
pub const REPLAY_TTL_MINUTES: i64 = 15;

/// One streamed message: a sequence number for ordering/dedup, a
/// timestamp, an event type tag (`"pattern_detected"`, `"signal:new"`,
/// `"portfolio:updated"`, ...), and an arbitrary JSON payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub payload: serde_json::Value,
}

pub struct EventBus {
    sender: broadcast::Sender<Frame>,
    replay: Arc<RwLock<VecDeque<Frame>>>,
    sequence: AtomicU64,
}

impl EventBus {
    pub fn new(channel_capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(channel_capacity);
        Self {
            sender,
            replay: Arc::new(RwLock::new(VecDeque::with_capacity(REPLAY_CAPACITY))),
            sequence: AtomicU64::new(0),
        }
    }

    /// A new receiver only sees frames published after this call; callers
    /// recovering after a reconnect should pair this with `messages_since`.
    pub fn subscribe(&self) -> broadcast::Receiver<Frame> {
        self.sender.subscribe()
    }

    /// Assigns the next global sequence number, buffers the frame for
    /// replay, and fans it out to every live subscriber. A `send` error
    /// just means nobody is currently subscribed -- the frame still gets
    /// buffered for recovery.
    pub async fn publish(&self, event_type: impl Into<String>, payload: serde_json::Value) -> Frame {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let frame = Frame {
            sequence,
            timestamp: Utc::now(),
            event_type: event_type.into(),
            payload,
        };

        {
            let mut replay = self.replay.write().await;
            if replay.len() == REPLAY_CAPACITY {
                replay.pop_front();
            }
            replay.push_back(frame.clone());
        }

        let _ = self.sender.send(frame.clone());
        frame
    }

    /// Frames with `sequence > since_seq`, still within the 15-minute TTL.
    /// Used by reconnecting clients to recover what they missed.
    pub async fn messages_since(&self, since_seq: u64) -> Vec<Frame> {
        let cutoff = Utc::now() - Duration::minutes(REPLAY_TTL_MINUTES);
        self.replay
            .read()
            .await
            .iter()
            .filter(|f| f.sequence > since_seq && f.timestamp > cutoff)
            .cloned()
            .collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_assigns_increasing_sequence_numbers() {
        let bus = EventBus::default();
        let a = bus.publish("pattern_detected", serde_json::json!({})).await;
        let b = bus.publish("signal:new", serde_json::json!({})).await;
        assert_eq!(a.sequence, 1);
        assert_eq!(b.sequence, 2);
    }

    #[tokio::test]
    async fn messages_since_excludes_already_seen_sequences() {
        let bus = EventBus::default();
        bus.publish("a", serde_json::json!(1)).await;
        let b = bus.publish("b", serde_json::json!(2)).await;
        bus.publish("c", serde_json::json!(3)).await;

        let recovered = bus.messages_since(b.sequence).await;
        assert_eq!(recovered.len(), 1);
        assert_eq!(recovered[0].event_type, "c");
    }

    #[tokio::test]
    async fn ring_buffer_drops_oldest_past_capacity() {
        let bus = EventBus::default();
        for i in 0..REPLAY_CAPACITY + 10 {
            bus.publish("tick", serde_json::json!(i)).await;
        }
        let all = bus.messages_since(0).await;
        assert_eq!(all.len(), REPLAY_CAPACITY);
        assert_eq!(all[0].sequence, 11);
    }

    #[tokio::test]
    async fn subscriber_receives_live_frames() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        bus.publish("signal:new", serde_json::json!({"id": 1})).await;
        let frame = rx.recv().await.unwrap();
        assert_eq!(frame.event_type, "signal:new");
    }
}
