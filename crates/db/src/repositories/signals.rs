//! Trade signal persistence. The full `TradeSignal` is stored as
//! `payload` JSON since it's immutable once created; scalar columns
//! exist for filtering without decoding the payload.

use async_trait::async_trait;
use jejakcuan_core::TradeSignal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::SignalRow;

#[async_trait]
pub trait SignalRepository: Send + Sync {
    async fn create(&self, signal: &TradeSignal) -> Result<SignalRow, DbError>;
    async fn get(&self, id: Uuid) -> Result<Option<SignalRow>, DbError>;
    async fn get_by_symbol(&self, symbol: &str, limit: i64) -> Result<Vec<SignalRow>, DbError>;
    async fn update_status(&self, id: Uuid, status: &str) -> Result<(), DbError>;
    async fn link_to_campaign(&self, id: Uuid, campaign_id: Uuid) -> Result<(), DbError>;
}

pub struct PostgresSignalRepository {
    pool: PgPool,
}

impl PostgresSignalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SignalRepository for PostgresSignalRepository {
    async fn create(&self, signal: &TradeSignal) -> Result<SignalRow, DbError> {
        let payload = serde_json::to_value(signal).map_err(|e| DbError::Conflict(e.to_string()))?;

        sqlx::query_as::<_, SignalRow>(
            r#"
            INSERT INTO signals
                (id, symbol, pattern_type, phase, status, confidence_score,
                 r_multiple, campaign_id, created_at, payload)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(signal.id)
        .bind(&signal.symbol)
        .bind(format!("{:?}", signal.pattern_type).to_lowercase())
        .bind(format!("{:?}", signal.phase).to_lowercase())
        .bind(format!("{:?}", signal.status).to_lowercase())
        .bind(signal.confidence_score)
        .bind(signal.r_multiple)
        .bind(signal.campaign_id)
        .bind(signal.created_at)
        .bind(payload)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from)
    }

    async fn get(&self, id: Uuid) -> Result<Option<SignalRow>, DbError> {
        sqlx::query_as::<_, SignalRow>("SELECT * FROM signals WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)
    }

    async fn get_by_symbol(&self, symbol: &str, limit: i64) -> Result<Vec<SignalRow>, DbError> {
        sqlx::query_as::<_, SignalRow>(
            "SELECT * FROM signals WHERE symbol = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(symbol)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)
    }

    async fn update_status(&self, id: Uuid, status: &str) -> Result<(), DbError> {
        let result = sqlx::query("UPDATE signals SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("signal {id}")));
        }
        Ok(())
    }

    async fn link_to_campaign(&self, id: Uuid, campaign_id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("UPDATE signals SET campaign_id = $2 WHERE id = $1")
            .bind(id)
            .bind(campaign_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("signal {id}")));
        }
        Ok(())
    }
}
