//! Engine-wide error kinds (spec §7).

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("bar for {symbol} {timeframe} is out of order: last={last_ts}, got={ts}")]
    InvalidBar {
        symbol: String,
        timeframe: String,
        last_ts: String,
        ts: String,
    },

    #[error("{detector} needs at least {required} bars, have {actual}")]
    InsufficientHistory {
        detector: String,
        required: usize,
        actual: usize,
    },

    #[error("validation stage {stage} failed: {reason}")]
    ValidationFail { stage: String, reason: String },

    #[error("campaign {0} not found")]
    CampaignNotFound(Uuid),

    #[error("signal {0} not found")]
    SignalNotFound(Uuid),

    #[error("broker rejected order: http {status} — {body}")]
    BrokerRejected { status: u16, body: String },

    #[error("broker unavailable after retry exhaustion: {0}")]
    BrokerUnavailable(String),

    #[error("race lost: queue entry {0} already advanced")]
    RaceLost(Uuid),

    #[error("invalid config: {0}")]
    ConfigInvalid(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
