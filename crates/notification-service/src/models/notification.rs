//! 通知请求与通知记录
//!
//! `NotificationRequest` 是业务侧发起分发的输入，不直接持久化；
//! `NotificationRecord` 是策略放行后落库的通知历史。

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{NotificationType, PublicNotificationType};

/// 通知分发请求
///
/// 标题和正文由调用方预先完成本地化，本服务不做任何文本格式化
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    pub user_id: String,
    pub notification_type: NotificationType,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub data: HashMap<String, String>,
}

impl NotificationRequest {
    pub fn new(
        user_id: impl Into<String>,
        notification_type: NotificationType,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            notification_type,
            title: title.into(),
            body: body.into(),
            data: HashMap::new(),
        }
    }

    /// 添加业务数据
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// 批量添加业务数据
    pub fn with_data_map(mut self, data: HashMap<String, String>) -> Self {
        self.data.extend(data);
        self
    }
}

/// 已分发的通知记录
///
/// `is_read` 只会从 false 变为 true；`read_at` 当且仅当已读时有值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: Uuid,
    pub user_id: String,
    pub notification_type: NotificationType,
    pub title: String,
    pub body: String,
    pub data: HashMap<String, String>,
    pub sent_at: DateTime<Utc>,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
}

impl NotificationRecord {
    /// 根据请求创建未读记录
    ///
    /// ID 使用 UUIDv7，全局唯一且按时间递增，便于按新旧排序分页
    pub fn from_request(request: NotificationRequest, sent_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id: request.user_id,
            notification_type: request.notification_type,
            title: request.title,
            body: request.body,
            data: request.data,
            sent_at,
            is_read: false,
            read_at: None,
        }
    }

    /// 标记为已读，返回状态是否发生变化
    ///
    /// 已读记录再次标记时保留首次已读时间
    pub fn mark_read(&mut self, read_at: DateTime<Utc>) -> bool {
        if self.is_read {
            return false;
        }
        self.is_read = true;
        self.read_at = Some(read_at);
        true
    }
}

/// 展示层通知视图
///
/// 与记录字段一致，但通知类型已映射为公开词汇
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    pub id: Uuid,
    pub user_id: String,
    #[serde(rename = "type")]
    pub notification_type: PublicNotificationType,
    pub title: String,
    pub body: String,
    pub data: HashMap<String, String>,
    pub sent_at: DateTime<Utc>,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
}

impl From<NotificationRecord> for NotificationView {
    fn from(record: NotificationRecord) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            notification_type: record.notification_type.to_public(),
            title: record.title,
            body: record.body,
            data: record.data,
            sent_at: record.sent_at,
            is_read: record.is_read,
            read_at: record.read_at,
        }
    }
}
