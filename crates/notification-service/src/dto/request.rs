//! 请求 DTO 定义

use std::collections::{BTreeSet, HashMap};

use serde::Deserialize;
use validator::Validate;

use crate::models::{
    NotificationPreferences, NotificationRequest, NotificationType, QuietHours,
};

/// 注册推送 token 请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterTokenRequest {
    #[validate(length(min = 1, max = 4096, message = "token 长度必须在1-4096个字符之间"))]
    pub token: String,
}

/// 发送通知请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationRequest {
    #[validate(length(min = 1, max = 128, message = "userId 长度必须在1-128个字符之间"))]
    pub user_id: String,
    pub notification_type: NotificationType,
    #[validate(length(min = 1, max = 200, message = "标题长度必须在1-200个字符之间"))]
    pub title: String,
    #[validate(length(max = 4000, message = "正文不能超过4000个字符"))]
    pub body: String,
    #[serde(default)]
    pub data: HashMap<String, String>,
}

impl From<SendNotificationRequest> for NotificationRequest {
    fn from(req: SendNotificationRequest) -> Self {
        NotificationRequest::new(req.user_id, req.notification_type, req.title, req.body)
            .with_data_map(req.data)
    }
}

/// 更新通知偏好请求（整体替换）
///
/// 时间格式为 `"HH:MM"`，反序列化阶段即校验范围
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePreferencesRequest {
    pub enabled_types: BTreeSet<NotificationType>,
    #[serde(default)]
    pub quiet_hours: Option<QuietHours>,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    #[serde(default = "default_true")]
    pub vibration_enabled: bool,
}

fn default_true() -> bool {
    true
}

impl UpdatePreferencesRequest {
    pub fn into_preferences(self, user_id: impl Into<String>) -> NotificationPreferences {
        NotificationPreferences {
            user_id: user_id.into(),
            enabled_types: self.enabled_types,
            quiet_hours: self.quiet_hours,
            sound_enabled: self.sound_enabled,
            vibration_enabled: self.vibration_enabled,
            updated_at: None,
        }
    }
}

/// 通知列表查询参数
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// 为空时使用服务端默认条数
    pub limit: Option<i64>,
}
