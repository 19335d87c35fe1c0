//! 内存仓储
//!
//! 基于 DashMap 实现，适用于测试和本地开发（未配置数据库时）。
//! 同一 key 的并发写入由 DashMap 分片锁串行化。

use std::cmp::Reverse;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use super::traits::{NotificationRepository, PreferencesRepository, TokenRepository};
use crate::error::Result;
use crate::models::{NotificationPreferences, NotificationRecord, Platform, PushToken};

/// 内存推送 token 仓储
#[derive(Debug, Clone, Default)]
pub struct InMemoryTokenRepository {
    tokens: Arc<DashMap<(String, Platform), PushToken>>,
}

impl InMemoryTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokenRepository {
    async fn register_token(&self, user_id: &str, platform: Platform, token: &str) -> Result<()> {
        self.tokens.insert(
            (user_id.to_string(), platform),
            PushToken::new(user_id, platform, token),
        );
        Ok(())
    }

    async fn unregister_token(&self, user_id: &str, platform: Platform) -> Result<()> {
        self.tokens.remove(&(user_id.to_string(), platform));
        Ok(())
    }

    async fn get_tokens(&self, user_id: &str) -> Result<Vec<PushToken>> {
        let mut tokens: Vec<PushToken> = self
            .tokens
            .iter()
            .filter(|entry| entry.key().0 == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        tokens.sort_by_key(|t| t.platform);
        Ok(tokens)
    }
}

/// 内存通知偏好仓储
#[derive(Debug, Clone, Default)]
pub struct InMemoryPreferencesRepository {
    preferences: Arc<DashMap<String, NotificationPreferences>>,
}

impl InMemoryPreferencesRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferencesRepository for InMemoryPreferencesRepository {
    async fn get_preferences(&self, user_id: &str) -> Result<NotificationPreferences> {
        Ok(self
            .preferences
            .get(user_id)
            .map(|p| p.clone())
            .unwrap_or_else(|| NotificationPreferences::default_for(user_id)))
    }

    async fn set_preferences(
        &self,
        preferences: &NotificationPreferences,
    ) -> Result<NotificationPreferences> {
        let mut stored = preferences.clone();
        stored.updated_at = Some(Utc::now());
        self.preferences
            .insert(stored.user_id.clone(), stored.clone());
        Ok(stored)
    }
}

/// 内存通知记录仓储
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationRepository {
    records: Arc<DashMap<Uuid, NotificationRecord>>,
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn collect_by_user<F>(&self, user_id: &str, predicate: F) -> Vec<NotificationRecord>
    where
        F: Fn(&NotificationRecord) -> bool,
    {
        let mut records: Vec<NotificationRecord> = self
            .records
            .iter()
            .filter(|entry| entry.user_id == user_id && predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by_key(|r| Reverse((r.sent_at, r.id)));
        records
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn create(&self, record: &NotificationRecord) -> Result<Uuid> {
        self.records.insert(record.id, record.clone());
        Ok(record.id)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<NotificationRecord>> {
        Ok(self.records.get(&id).map(|r| r.clone()))
    }

    async fn list_by_user(&self, user_id: &str, limit: i64) -> Result<Vec<NotificationRecord>> {
        let mut records = self.collect_by_user(user_id, |_| true);
        records.truncate(limit.max(0) as usize);
        Ok(records)
    }

    async fn list_unread_by_user(&self, user_id: &str) -> Result<Vec<NotificationRecord>> {
        Ok(self.collect_by_user(user_id, |r| !r.is_read))
    }

    async fn count_unread(&self, user_id: &str) -> Result<i64> {
        let count = self
            .records
            .iter()
            .filter(|entry| entry.user_id == user_id && !entry.is_read)
            .count();
        Ok(count as i64)
    }

    async fn mark_read(&self, id: Uuid, read_at: DateTime<Utc>) -> Result<bool> {
        Ok(self
            .records
            .get_mut(&id)
            .map(|mut record| record.mark_read(read_at))
            .unwrap_or(false))
    }

    async fn mark_all_read(&self, user_id: &str, read_at: DateTime<Utc>) -> Result<u64> {
        let mut changed = 0;
        for mut entry in self.records.iter_mut() {
            if entry.user_id == user_id && entry.mark_read(read_at) {
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.records.remove(&id).is_some())
    }
}
