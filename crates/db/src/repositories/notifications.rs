//! Delivery log for `jejakcuan_data_sources::NotificationService`
//! dispatches, so a dashboard can show "was this alert actually sent."

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::DbError;
use crate::models::NotificationLogRow;

#[async_trait]
pub trait NotificationLogRepository: Send + Sync {
    async fn record(&self, row: &NotificationLogRow) -> Result<NotificationLogRow, DbError>;
    async fn get_recent_for_recipient(
        &self,
        recipient_id: &str,
        limit: i64,
    ) -> Result<Vec<NotificationLogRow>, DbError>;
}

pub struct PostgresNotificationLogRepository {
    pool: PgPool,
}

impl PostgresNotificationLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationLogRepository for PostgresNotificationLogRepository {
    async fn record(&self, row: &NotificationLogRow) -> Result<NotificationLogRow, DbError> {
        sqlx::query_as::<_, NotificationLogRow>(
            r#"
            INSERT INTO notification_log
                (id, recipient_id, channel, title, body, priority, sent_at, delivered, error)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(row.id)
        .bind(&row.recipient_id)
        .bind(&row.channel)
        .bind(&row.title)
        .bind(&row.body)
        .bind(&row.priority)
        .bind(row.sent_at)
        .bind(row.delivered)
        .bind(&row.error)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from)
    }

    async fn get_recent_for_recipient(
        &self,
        recipient_id: &str,
        limit: i64,
    ) -> Result<Vec<NotificationLogRow>, DbError> {
        sqlx::query_as::<_, NotificationLogRow>(
            "SELECT * FROM notification_log WHERE recipient_id = $1 ORDER BY sent_at DESC LIMIT $2",
        )
        .bind(recipient_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)
    }
}
