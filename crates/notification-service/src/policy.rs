//! 分发策略
//!
//! 根据用户偏好和当前时刻判断一条通知是否允许投递。
//! 纯函数，无副作用；时刻由调用方传入，便于测试。
//!
//! 判定顺序：
//! 1. 类型未启用 → 拒绝（紧急类型也不例外）
//! 2. 紧急类型 → 放行
//! 3. 处于免打扰时段 → 拒绝
//! 4. 其余 → 放行

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{NotificationPreferences, NotificationRequest, QuietTime};

/// 拒绝原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenyReason {
    /// 用户关闭了该通知类型
    TypeDisabled,
    /// 处于免打扰时段
    QuietHours,
}

impl DenyReason {
    /// 指标标签值
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TypeDisabled => "type_disabled",
            Self::QuietHours => "quiet_hours",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeDisabled => f.write_str("type disabled"),
            Self::QuietHours => f.write_str("quiet hours"),
        }
    }
}

/// 策略判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    Allow,
    Deny(DenyReason),
}

impl PolicyDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// 判断通知是否允许投递
///
/// 免打扰时段按 UTC 墙上时间比较
pub fn evaluate(
    request: &NotificationRequest,
    preferences: &NotificationPreferences,
    now: DateTime<Utc>,
) -> PolicyDecision {
    if !preferences.is_type_enabled(request.notification_type) {
        return PolicyDecision::Deny(DenyReason::TypeDisabled);
    }

    if request.notification_type.is_urgent() {
        return PolicyDecision::Allow;
    }

    match preferences.quiet_hours {
        Some(window) if window.contains(QuietTime::of_instant(now)) => {
            PolicyDecision::Deny(DenyReason::QuietHours)
        }
        _ => PolicyDecision::Allow,
    }
}
