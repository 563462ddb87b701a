//! Position and exit-rule persistence. Exit rules are 1:1 with a
//! campaign (spec §4.14) so they're upserted alongside position writes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{ExitRuleRow, PositionRow};

#[async_trait]
pub trait PositionRepository: Send + Sync {
    async fn create(&self, row: &PositionRow) -> Result<PositionRow, DbError>;
    async fn get(&self, id: Uuid) -> Result<Option<PositionRow>, DbError>;
    async fn get_open_by_campaign(&self, campaign_id: Uuid) -> Result<Vec<PositionRow>, DbError>;

    /// Closed positions for `symbol` with `closed_date` in `[start, end]`,
    /// used by the regression-test runner to aggregate trade metrics.
    async fn get_closed_in_range(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PositionRow>, DbError>;

    async fn update_stop(&self, id: Uuid, new_stop: Decimal) -> Result<(), DbError>;

    async fn record_partial_exit(
        &self,
        id: Uuid,
        remaining_shares: Decimal,
        realized_pnl_delta: Decimal,
    ) -> Result<(), DbError>;

    async fn close(
        &self,
        id: Uuid,
        status: &str,
        exit_price: Decimal,
        realized_pnl: Decimal,
        closed_date: DateTime<Utc>,
    ) -> Result<(), DbError>;
}

#[async_trait]
pub trait ExitRuleRepository: Send + Sync {
    async fn upsert(&self, row: &ExitRuleRow) -> Result<ExitRuleRow, DbError>;
    async fn get(&self, campaign_id: Uuid) -> Result<Option<ExitRuleRow>, DbError>;
}

pub struct PostgresPositionRepository {
    pool: PgPool,
}

impl PostgresPositionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PositionRepository for PostgresPositionRepository {
    async fn create(&self, row: &PositionRow) -> Result<PositionRow, DbError> {
        sqlx::query_as::<_, PositionRow>(
            r#"
            INSERT INTO positions
                (id, campaign_id, signal_id, symbol, direction, entry_date,
                 entry_price, shares, stop_loss, current_price, current_pnl,
                 status, closed_date, exit_price, realized_pnl)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(row.id)
        .bind(row.campaign_id)
        .bind(row.signal_id)
        .bind(&row.symbol)
        .bind(&row.direction)
        .bind(row.entry_date)
        .bind(row.entry_price)
        .bind(row.shares)
        .bind(row.stop_loss)
        .bind(row.current_price)
        .bind(row.current_pnl)
        .bind(&row.status)
        .bind(row.closed_date)
        .bind(row.exit_price)
        .bind(row.realized_pnl)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from)
    }

    async fn get(&self, id: Uuid) -> Result<Option<PositionRow>, DbError> {
        sqlx::query_as::<_, PositionRow>("SELECT * FROM positions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)
    }

    async fn get_open_by_campaign(&self, campaign_id: Uuid) -> Result<Vec<PositionRow>, DbError> {
        sqlx::query_as::<_, PositionRow>(
            "SELECT * FROM positions WHERE campaign_id = $1 AND status = 'open' ORDER BY entry_date",
        )
        .bind(campaign_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)
    }

    async fn get_closed_in_range(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PositionRow>, DbError> {
        sqlx::query_as::<_, PositionRow>(
            r#"
            SELECT * FROM positions
            WHERE symbol = $1 AND status = 'closed' AND closed_date BETWEEN $2 AND $3
            ORDER BY closed_date
            "#,
        )
        .bind(symbol)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)
    }

    async fn update_stop(&self, id: Uuid, new_stop: Decimal) -> Result<(), DbError> {
        let result = sqlx::query("UPDATE positions SET stop_loss = $2 WHERE id = $1 AND status = 'open'")
            .bind(id)
            .bind(new_stop)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("open position {id}")));
        }
        Ok(())
    }

    async fn record_partial_exit(
        &self,
        id: Uuid,
        remaining_shares: Decimal,
        realized_pnl_delta: Decimal,
    ) -> Result<(), DbError> {
        let result = sqlx::query(
            r#"
            UPDATE positions
            SET shares = $2,
                realized_pnl = COALESCE(realized_pnl, 0) + $3
            WHERE id = $1 AND status = 'open'
            "#,
        )
        .bind(id)
        .bind(remaining_shares)
        .bind(realized_pnl_delta)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("open position {id}")));
        }
        Ok(())
    }

    async fn close(
        &self,
        id: Uuid,
        status: &str,
        exit_price: Decimal,
        realized_pnl: Decimal,
        closed_date: DateTime<Utc>,
    ) -> Result<(), DbError> {
        let result = sqlx::query(
            r#"
            UPDATE positions
            SET status = $2, exit_price = $3, realized_pnl = $4, closed_date = $5
            WHERE id = $1 AND status = 'open'
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(exit_price)
        .bind(realized_pnl)
        .bind(closed_date)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("open position {id}")));
        }
        Ok(())
    }
}

pub struct PostgresExitRuleRepository {
    pool: PgPool,
}

impl PostgresExitRuleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExitRuleRepository for PostgresExitRuleRepository {
    async fn upsert(&self, row: &ExitRuleRow) -> Result<ExitRuleRow, DbError> {
        sqlx::query_as::<_, ExitRuleRow>(
            r#"
            INSERT INTO exit_rules
                (campaign_id, target_1, target_2, target_3, t1_exit_pct,
                 t2_exit_pct, t3_exit_pct, trail_to_breakeven_on_t1,
                 trail_to_t1_on_t2, spring_low, ice_level, creek_level,
                 utad_high, jump_target)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (campaign_id) DO UPDATE SET
                target_1 = EXCLUDED.target_1,
                target_2 = EXCLUDED.target_2,
                target_3 = EXCLUDED.target_3,
                t1_exit_pct = EXCLUDED.t1_exit_pct,
                t2_exit_pct = EXCLUDED.t2_exit_pct,
                t3_exit_pct = EXCLUDED.t3_exit_pct,
                trail_to_breakeven_on_t1 = EXCLUDED.trail_to_breakeven_on_t1,
                trail_to_t1_on_t2 = EXCLUDED.trail_to_t1_on_t2,
                spring_low = EXCLUDED.spring_low,
                ice_level = EXCLUDED.ice_level,
                creek_level = EXCLUDED.creek_level,
                utad_high = EXCLUDED.utad_high,
                jump_target = EXCLUDED.jump_target
            RETURNING *
            "#,
        )
        .bind(row.campaign_id)
        .bind(row.target_1)
        .bind(row.target_2)
        .bind(row.target_3)
        .bind(row.t1_exit_pct)
        .bind(row.t2_exit_pct)
        .bind(row.t3_exit_pct)
        .bind(row.trail_to_breakeven_on_t1)
        .bind(row.trail_to_t1_on_t2)
        .bind(row.spring_low)
        .bind(row.ice_level)
        .bind(row.creek_level)
        .bind(row.utad_high)
        .bind(row.jump_target)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from)
    }

    async fn get(&self, campaign_id: Uuid) -> Result<Option<ExitRuleRow>, DbError> {
        sqlx::query_as::<_, ExitRuleRow>("SELECT * FROM exit_rules WHERE campaign_id = $1")
            .bind(campaign_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)
    }
}
