//! 推送 token 仓储
//!
//! 表 `push_tokens` 以 (user_id, platform) 为主键，注册即 upsert

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use super::traits::TokenRepository;
use crate::error::Result;
use crate::models::{Platform, PushToken};

/// PostgreSQL 推送 token 仓储
pub struct PgTokenRepository {
    pool: PgPool,
}

impl PgTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRepository for PgTokenRepository {
    async fn register_token(&self, user_id: &str, platform: Platform, token: &str) -> Result<()> {
        // 同一主键的并发写入由 ON CONFLICT 串行化，后写者覆盖
        sqlx::query(
            r#"
            INSERT INTO push_tokens (user_id, platform, token, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (user_id, platform)
            DO UPDATE SET token = EXCLUDED.token, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user_id)
        .bind(platform)
        .bind(token)
        .execute(&self.pool)
        .await?;

        debug!(user_id = %user_id, platform = %platform, "推送 token 已注册");
        Ok(())
    }

    async fn unregister_token(&self, user_id: &str, platform: Platform) -> Result<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM push_tokens
            WHERE user_id = $1 AND platform = $2
            "#,
        )
        .bind(user_id)
        .bind(platform)
        .execute(&self.pool)
        .await?;

        debug!(
            user_id = %user_id,
            platform = %platform,
            removed = result.rows_affected(),
            "推送 token 已注销"
        );
        Ok(())
    }

    async fn get_tokens(&self, user_id: &str) -> Result<Vec<PushToken>> {
        let tokens = sqlx::query_as::<_, PushToken>(
            r#"
            SELECT user_id, platform, token, updated_at
            FROM push_tokens
            WHERE user_id = $1
            ORDER BY platform
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tokens)
    }
}
