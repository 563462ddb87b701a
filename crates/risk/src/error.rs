use jejakcuan_core::QueueEntryStatus;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RiskError {
    #[error("queue entry {0} not found")]
    QueueEntryNotFound(Uuid),
    #[error("queue entry {0} is not pending (currently {1:?})")]
    NotPending(Uuid, QueueEntryStatus),
    #[error("user does not own queue entry {0}")]
    WrongOwner(Uuid),
    #[error("invalid price levels: {0}")]
    InvalidLevels(String),
    #[error("invalid stop-loss update: {0}")]
    InvalidStopUpdate(String),
    #[error("range {0} has no admitted Creek/Ice/Jump levels")]
    LevelsMissing(Uuid),
    #[error("SOS direct entry deferred: waiting up to {wait_bars} bars for an LPS ({elapsed} elapsed)")]
    SosEntryDeferred { wait_bars: usize, elapsed: usize },
    #[error("SOS direct entry rejected: confidence {confidence} / volume_ratio {volume_ratio} below the direct-entry floor")]
    SosEntryRejected { confidence: u8, volume_ratio: Decimal },
    #[error(transparent)]
    Engine(#[from] jejakcuan_core::EngineError),
}

pub type RiskResult<T> = Result<T, RiskError>;
