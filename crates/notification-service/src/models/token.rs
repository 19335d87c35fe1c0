//! 设备推送 token

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::enums::Platform;

/// 设备推送 token
///
/// 每个 (user_id, platform) 至多一条，重复注册覆盖旧值
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushToken {
    pub user_id: String,
    pub platform: Platform,
    pub token: String,
    pub updated_at: DateTime<Utc>,
}

impl PushToken {
    pub fn new(user_id: impl Into<String>, platform: Platform, token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            platform,
            token: token.into(),
            updated_at: Utc::now(),
        }
    }

    /// 校验 token 字符集
    ///
    /// APNs 设备 token 为十六进制串；FCM 注册 token 只含字母数字与 `_:-.`
    pub fn is_well_formed(platform: Platform, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }
        match platform {
            Platform::Ios => token.chars().all(|c| c.is_ascii_hexdigit()),
            Platform::Android => token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '-' | '.')),
        }
    }
}
