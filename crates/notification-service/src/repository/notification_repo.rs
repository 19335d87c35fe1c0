//! 通知记录仓储
//!
//! 记录 ID 由调用方预先分配（UUIDv7），仓储只负责写入和状态变更

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::traits::NotificationRepository;
use crate::error::Result;
use crate::models::{NotificationRecord, NotificationType};

#[derive(Debug, FromRow)]
struct NotificationRow {
    id: Uuid,
    user_id: String,
    notification_type: NotificationType,
    title: String,
    body: String,
    data: Json<HashMap<String, String>>,
    sent_at: DateTime<Utc>,
    is_read: bool,
    read_at: Option<DateTime<Utc>>,
}

impl From<NotificationRow> for NotificationRecord {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            notification_type: row.notification_type,
            title: row.title,
            body: row.body,
            data: row.data.0,
            sent_at: row.sent_at,
            is_read: row.is_read,
            read_at: row.read_at,
        }
    }
}

/// PostgreSQL 通知记录仓储
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn create(&self, record: &NotificationRecord) -> Result<Uuid> {
        sqlx::query(
            r#"
            INSERT INTO notifications
                (id, user_id, notification_type, title, body, data, sent_at, is_read, read_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(record.id)
        .bind(&record.user_id)
        .bind(record.notification_type)
        .bind(&record.title)
        .bind(&record.body)
        .bind(Json(&record.data))
        .bind(record.sent_at)
        .bind(record.is_read)
        .bind(record.read_at)
        .execute(&self.pool)
        .await?;

        Ok(record.id)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<NotificationRecord>> {
        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, user_id, notification_type, title, body, data, sent_at, is_read, read_at
            FROM notifications
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_by_user(&self, user_id: &str, limit: i64) -> Result<Vec<NotificationRecord>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, user_id, notification_type, title, body, data, sent_at, is_read, read_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY sent_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_unread_by_user(&self, user_id: &str) -> Result<Vec<NotificationRecord>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, user_id, notification_type, title, body, data, sent_at, is_read, read_at
            FROM notifications
            WHERE user_id = $1 AND is_read = FALSE
            ORDER BY sent_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count_unread(&self, user_id: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM notifications
            WHERE user_id = $1 AND is_read = FALSE
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn mark_read(&self, id: Uuid, read_at: DateTime<Utc>) -> Result<bool> {
        // 只更新未读记录，保留首次已读时间
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE, read_at = $2
            WHERE id = $1 AND is_read = FALSE
            "#,
        )
        .bind(id)
        .bind(read_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, user_id: &str, read_at: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE, read_at = $2
            WHERE user_id = $1 AND is_read = FALSE
            "#,
        )
        .bind(user_id)
        .bind(read_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
