//! 通知分发枚举类型定义
//!
//! 所有枚举都支持数据库（sqlx）和 JSON（serde）序列化

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DispatchError;

/// 推送平台
///
/// 决定设备 token 交给哪个推送后端投递
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Platform {
    /// Android 类设备，经 FCM 投递
    Android,
    /// iOS 类设备，经 APNs 投递
    Ios,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Android, Platform::Ios];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Android => "ANDROID",
            Self::Ios => "IOS",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ANDROID" => Ok(Self::Android),
            "IOS" => Ok(Self::Ios),
            other => Err(DispatchError::Validation(format!(
                "无效的推送平台: {other}，支持: ANDROID, IOS"
            ))),
        }
    }
}

/// 通知类型（内部词汇）
///
/// 由触发通知的业务域决定；对展示层输出前需映射为 [`PublicNotificationType`]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    /// 被邀请参加活动
    EventInvite,
    /// 活动日期已确定
    DateConfirmed,
    /// 活动信息变更
    EventUpdated,
    /// 活动取消
    EventCancelled,
    /// 被提及
    Mention,
    /// 新评论
    NewComment,
    /// 评论回复
    CommentReply,
    /// 投票提醒
    VoteReminder,
    /// 投票即将截止
    VoteCloseReminder,
    /// 截止日期提醒
    DeadlineReminder,
    /// 会议即将开始（紧急）
    MeetingReminder,
    /// 待付款
    PaymentDue,
}

/// 不受免打扰时段限制的紧急类型
pub const URGENT_TYPES: &[NotificationType] = &[NotificationType::MeetingReminder];

impl NotificationType {
    pub const ALL: [NotificationType; 12] = [
        NotificationType::EventInvite,
        NotificationType::DateConfirmed,
        NotificationType::EventUpdated,
        NotificationType::EventCancelled,
        NotificationType::Mention,
        NotificationType::NewComment,
        NotificationType::CommentReply,
        NotificationType::VoteReminder,
        NotificationType::VoteCloseReminder,
        NotificationType::DeadlineReminder,
        NotificationType::MeetingReminder,
        NotificationType::PaymentDue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EventInvite => "EVENT_INVITE",
            Self::DateConfirmed => "DATE_CONFIRMED",
            Self::EventUpdated => "EVENT_UPDATED",
            Self::EventCancelled => "EVENT_CANCELLED",
            Self::Mention => "MENTION",
            Self::NewComment => "NEW_COMMENT",
            Self::CommentReply => "COMMENT_REPLY",
            Self::VoteReminder => "VOTE_REMINDER",
            Self::VoteCloseReminder => "VOTE_CLOSE_REMINDER",
            Self::DeadlineReminder => "DEADLINE_REMINDER",
            Self::MeetingReminder => "MEETING_REMINDER",
            Self::PaymentDue => "PAYMENT_DUE",
        }
    }

    /// 是否为紧急类型（跳过免打扰时段检查）
    pub fn is_urgent(&self) -> bool {
        URGENT_TYPES.contains(self)
    }

    /// 映射为展示层使用的公开类型
    pub fn to_public(self) -> PublicNotificationType {
        PublicNotificationType::from(self)
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 展示层通知类型（公开词汇）
///
/// 粒度比内部类型粗，多个内部类型可以对应同一个公开类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PublicNotificationType {
    EventInvitation,
    EventConfirmed,
    EventUpdate,
    EventCancelled,
    Mention,
    Comment,
    Vote,
    Reminder,
    Payment,
}

impl From<NotificationType> for PublicNotificationType {
    fn from(value: NotificationType) -> Self {
        match value {
            NotificationType::EventInvite => Self::EventInvitation,
            NotificationType::DateConfirmed => Self::EventConfirmed,
            NotificationType::EventUpdated => Self::EventUpdate,
            NotificationType::EventCancelled => Self::EventCancelled,
            NotificationType::Mention => Self::Mention,
            NotificationType::NewComment | NotificationType::CommentReply => Self::Comment,
            NotificationType::VoteReminder | NotificationType::VoteCloseReminder => Self::Vote,
            NotificationType::DeadlineReminder | NotificationType::MeetingReminder => {
                Self::Reminder
            }
            NotificationType::PaymentDue => Self::Payment,
        }
    }
}
