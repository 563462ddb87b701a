//! Approval queue persistence, backing `jejakcuan_risk::ApprovalQueue`
//! across process restarts. `approve`/`reject` use a `WHERE status =
//! 'pending'` compare-and-set so two concurrent reviewers can't both
//! resolve the same entry -- the loser's `rows_affected() == 0` turns
//! into `DbError::Conflict`, grounded on
//! `signal_approval_service.py`'s idempotent status check.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::QueueEntryRow;

#[async_trait]
pub trait QueueEntryRepository: Send + Sync {
    async fn create(&self, row: &QueueEntryRow) -> Result<QueueEntryRow, DbError>;
    async fn get(&self, id: Uuid) -> Result<Option<QueueEntryRow>, DbError>;
    async fn get_pending_for_user(&self, user_id: Uuid) -> Result<Vec<QueueEntryRow>, DbError>;

    /// Transitions `id` from `pending` to `approved`, but only on behalf
    /// of the user who submitted it. Fails with `DbError::Forbidden` if
    /// `user_id` does not own the entry, or `DbError::Conflict` if it
    /// was not pending (already approved, rejected, or expired by a
    /// concurrent caller).
    async fn approve(&self, id: Uuid, user_id: Uuid, approved_at: DateTime<Utc>) -> Result<(), DbError>;

    /// Transitions `id` from `pending` to `rejected`, same ownership and
    /// CAS semantics as `approve`.
    async fn reject(&self, id: Uuid, user_id: Uuid, reason: &str) -> Result<(), DbError>;

    /// Bulk-expires every still-pending entry whose `expires_at` has
    /// passed; returns the rows transitioned so the caller can emit one
    /// `queue_expired` lifecycle event per entry.
    async fn expire_stale(&self, now: DateTime<Utc>) -> Result<Vec<QueueEntryRow>, DbError>;
}

pub struct PostgresQueueEntryRepository {
    pool: PgPool,
}

impl PostgresQueueEntryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Called after a CAS `UPDATE ... WHERE id = $1 AND user_id = $2 AND
    /// status = 'pending'` affects zero rows, to tell a wrong-owner
    /// caller apart from a stale or missing entry.
    async fn diagnose_transition_failure(&self, id: Uuid, user_id: Uuid) -> Result<DbError, DbError> {
        let row = self.get(id).await?;
        Ok(match row {
            None => DbError::NotFound(format!("queue entry {id} not found")),
            Some(row) if row.user_id != user_id => {
                DbError::Forbidden(format!("user {user_id} does not own queue entry {id}"))
            }
            Some(_) => DbError::Conflict(format!("queue entry {id} was not pending")),
        })
    }
}

#[async_trait]
impl QueueEntryRepository for PostgresQueueEntryRepository {
    async fn create(&self, row: &QueueEntryRow) -> Result<QueueEntryRow, DbError> {
        sqlx::query_as::<_, QueueEntryRow>(
            r#"
            INSERT INTO queue_entries
                (id, signal_id, user_id, status, submitted_at, expires_at,
                 approved_at, rejection_reason, snapshot)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(row.id)
        .bind(row.signal_id)
        .bind(row.user_id)
        .bind(&row.status)
        .bind(row.submitted_at)
        .bind(row.expires_at)
        .bind(row.approved_at)
        .bind(&row.rejection_reason)
        .bind(&row.snapshot)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from)
    }

    async fn get(&self, id: Uuid) -> Result<Option<QueueEntryRow>, DbError> {
        sqlx::query_as::<_, QueueEntryRow>("SELECT * FROM queue_entries WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)
    }

    async fn get_pending_for_user(&self, user_id: Uuid) -> Result<Vec<QueueEntryRow>, DbError> {
        sqlx::query_as::<_, QueueEntryRow>(
            "SELECT * FROM queue_entries WHERE user_id = $1 AND status = 'pending' ORDER BY submitted_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)
    }

    async fn approve(&self, id: Uuid, user_id: Uuid, approved_at: DateTime<Utc>) -> Result<(), DbError> {
        let result = sqlx::query(
            r#"
            UPDATE queue_entries
            SET status = 'approved', approved_at = $3
            WHERE id = $1 AND user_id = $2 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(approved_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.diagnose_transition_failure(id, user_id).await?);
        }
        Ok(())
    }

    async fn reject(&self, id: Uuid, user_id: Uuid, reason: &str) -> Result<(), DbError> {
        let result = sqlx::query(
            r#"
            UPDATE queue_entries
            SET status = 'rejected', rejection_reason = $3
            WHERE id = $1 AND user_id = $2 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(reason)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.diagnose_transition_failure(id, user_id).await?);
        }
        Ok(())
    }

    async fn expire_stale(&self, now: DateTime<Utc>) -> Result<Vec<QueueEntryRow>, DbError> {
        sqlx::query_as::<_, QueueEntryRow>(
            r#"
            UPDATE queue_entries
            SET status = 'expired'
            WHERE status = 'pending' AND expires_at <= $1
            RETURNING *
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)
    }
}
