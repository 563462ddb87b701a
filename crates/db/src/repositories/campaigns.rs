//! Campaign persistence, grounded on `repositories/stocks.rs`'s
//! `query_as`/upsert idiom, generalized to a trait so callers can swap
//! in a fake for tests.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::CampaignRow;

#[async_trait]
pub trait CampaignRepository: Send + Sync {
    async fn create(&self, row: &CampaignRow) -> Result<CampaignRow, DbError>;
    async fn get(&self, id: Uuid) -> Result<Option<CampaignRow>, DbError>;
    async fn get_by_symbol(&self, symbol: &str) -> Result<Vec<CampaignRow>, DbError>;

    /// Persists the BMAD allocation tracker's used-pct fields and
    /// position count after a size/record/release operation.
    async fn update_allocation(
        &self,
        id: Uuid,
        spring_used_pct: Decimal,
        sos_used_pct: Decimal,
        lps_used_pct: Decimal,
        position_count: i32,
    ) -> Result<(), DbError>;
}

pub struct PostgresCampaignRepository {
    pool: PgPool,
}

impl PostgresCampaignRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CampaignRepository for PostgresCampaignRepository {
    async fn create(&self, row: &CampaignRow) -> Result<CampaignRow, DbError> {
        sqlx::query_as::<_, CampaignRow>(
            r#"
            INSERT INTO campaigns
                (id, symbol, range_id, account_equity, spring_used_pct,
                 sos_used_pct, lps_used_pct, position_count, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(row.id)
        .bind(&row.symbol)
        .bind(row.range_id)
        .bind(row.account_equity)
        .bind(row.spring_used_pct)
        .bind(row.sos_used_pct)
        .bind(row.lps_used_pct)
        .bind(row.position_count)
        .bind(row.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from)
    }

    async fn get(&self, id: Uuid) -> Result<Option<CampaignRow>, DbError> {
        sqlx::query_as::<_, CampaignRow>("SELECT * FROM campaigns WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)
    }

    async fn get_by_symbol(&self, symbol: &str) -> Result<Vec<CampaignRow>, DbError> {
        sqlx::query_as::<_, CampaignRow>(
            "SELECT * FROM campaigns WHERE symbol = $1 ORDER BY created_at DESC",
        )
        .bind(symbol)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)
    }

    async fn update_allocation(
        &self,
        id: Uuid,
        spring_used_pct: Decimal,
        sos_used_pct: Decimal,
        lps_used_pct: Decimal,
        position_count: i32,
    ) -> Result<(), DbError> {
        let result = sqlx::query(
            r#"
            UPDATE campaigns
            SET spring_used_pct = $2, sos_used_pct = $3, lps_used_pct = $4,
                position_count = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(spring_used_pct)
        .bind(sos_used_pct)
        .bind(lps_used_pct)
        .bind(position_count)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("campaign {id}")));
        }
        Ok(())
    }
}
