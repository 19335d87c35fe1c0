//! 仓储 Trait 定义
//!
//! 服务层只依赖这些接口，PostgreSQL 与内存实现可以互换，也便于 mock 测试

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{NotificationPreferences, NotificationRecord, Platform, PushToken};

/// 推送 token 仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// 注册或覆盖 (user_id, platform) 对应的 token
    async fn register_token(&self, user_id: &str, platform: Platform, token: &str) -> Result<()>;
    /// 删除 token，不存在时同样视为成功
    async fn unregister_token(&self, user_id: &str, platform: Platform) -> Result<()>;
    async fn get_tokens(&self, user_id: &str) -> Result<Vec<PushToken>>;
}

/// 通知偏好仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PreferencesRepository: Send + Sync {
    /// 读取偏好，未保存过时返回默认偏好
    async fn get_preferences(&self, user_id: &str) -> Result<NotificationPreferences>;
    /// 整体替换偏好，返回带有最新 `updated_at` 的结果
    async fn set_preferences(
        &self,
        preferences: &NotificationPreferences,
    ) -> Result<NotificationPreferences>;
}

/// 通知记录仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, record: &NotificationRecord) -> Result<Uuid>;
    async fn get_by_id(&self, id: Uuid) -> Result<Option<NotificationRecord>>;
    /// 按 sent_at 倒序，最多返回 limit 条
    async fn list_by_user(&self, user_id: &str, limit: i64) -> Result<Vec<NotificationRecord>>;
    async fn list_unread_by_user(&self, user_id: &str) -> Result<Vec<NotificationRecord>>;
    async fn count_unread(&self, user_id: &str) -> Result<i64>;
    /// 返回本次调用是否把记录从未读变为已读
    async fn mark_read(&self, id: Uuid, read_at: DateTime<Utc>) -> Result<bool>;
    /// 返回本次被标记的条数
    async fn mark_all_read(&self, user_id: &str, read_at: DateTime<Utc>) -> Result<u64>;
    /// 返回记录是否存在并被删除
    async fn delete(&self, id: Uuid) -> Result<bool>;
}
