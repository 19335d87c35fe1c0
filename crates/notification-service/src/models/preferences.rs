//! 用户通知偏好模型
//!
//! 包含启用的通知类型、免打扰时段以及声音/振动开关。

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use super::enums::NotificationType;
use crate::error::{DispatchError, Result};

const MINUTES_PER_DAY: u16 = 24 * 60;

/// 不带日期的墙上时间（时:分）
///
/// JSON 中以 `"HH:MM"` 字符串表示，数据库中以当日分钟数存储
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QuietTime {
    hour: u8,
    minute: u8,
}

impl QuietTime {
    pub fn new(hour: u8, minute: u8) -> Result<Self> {
        if hour > 23 {
            return Err(DispatchError::Validation(format!(
                "小时必须在 0-23 之间: {hour}"
            )));
        }
        if minute > 59 {
            return Err(DispatchError::Validation(format!(
                "分钟必须在 0-59 之间: {minute}"
            )));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// 当日分钟数（hour * 60 + minute）
    pub fn minute_of_day(&self) -> u16 {
        self.hour as u16 * 60 + self.minute as u16
    }

    pub fn from_minute_of_day(minutes: i32) -> Result<Self> {
        if !(0..MINUTES_PER_DAY as i32).contains(&minutes) {
            return Err(DispatchError::Validation(format!(
                "当日分钟数超出范围: {minutes}"
            )));
        }
        Self::new((minutes / 60) as u8, (minutes % 60) as u8)
    }

    /// 取 UTC 时刻的时:分部分
    pub fn of_instant(instant: DateTime<Utc>) -> Self {
        Self {
            hour: instant.hour() as u8,
            minute: instant.minute() as u8,
        }
    }
}

impl fmt::Display for QuietTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for QuietTime {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || DispatchError::Validation(format!("无效的时间格式: {s}，应为 HH:MM"));
        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        let hour = h.parse::<u8>().map_err(|_| invalid())?;
        let minute = m.parse::<u8>().map_err(|_| invalid())?;
        Self::new(hour, minute)
    }
}

impl TryFrom<String> for QuietTime {
    type Error = DispatchError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<QuietTime> for String {
    fn from(value: QuietTime) -> Self {
        value.to_string()
    }
}

/// 免打扰时段
///
/// `start > end` 表示跨越午夜（如 22:00 → 08:00）。
/// 区间左闭右开；`start == end` 为空区间。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietHours {
    pub start: QuietTime,
    pub end: QuietTime,
}

impl QuietHours {
    pub fn new(start: QuietTime, end: QuietTime) -> Self {
        Self { start, end }
    }

    pub fn wraps_midnight(&self) -> bool {
        self.start > self.end
    }

    /// 判断给定时刻是否落在免打扰时段内
    pub fn contains(&self, time: QuietTime) -> bool {
        let now = time.minute_of_day();
        let start = self.start.minute_of_day();
        let end = self.end.minute_of_day();

        if start <= end {
            start <= now && now < end
        } else {
            now >= start || now < end
        }
    }
}

/// 用户通知偏好
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    pub user_id: String,
    pub enabled_types: BTreeSet<NotificationType>,
    /// 为 None 时不启用免打扰
    pub quiet_hours: Option<QuietHours>,
    pub sound_enabled: bool,
    pub vibration_enabled: bool,
    /// 为 None 表示从未保存过（默认偏好）
    pub updated_at: Option<DateTime<Utc>>,
}

impl NotificationPreferences {
    /// 默认偏好：全部类型启用、无免打扰、声音和振动开启
    pub fn default_for(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            enabled_types: NotificationType::ALL.into_iter().collect(),
            quiet_hours: None,
            sound_enabled: true,
            vibration_enabled: true,
            updated_at: None,
        }
    }

    pub fn with_enabled_types(mut self, types: impl IntoIterator<Item = NotificationType>) -> Self {
        self.enabled_types = types.into_iter().collect();
        self
    }

    pub fn without_type(mut self, notification_type: NotificationType) -> Self {
        self.enabled_types.remove(&notification_type);
        self
    }

    pub fn with_quiet_hours(mut self, start: QuietTime, end: QuietTime) -> Self {
        self.quiet_hours = Some(QuietHours::new(start, end));
        self
    }

    pub fn is_type_enabled(&self, notification_type: NotificationType) -> bool {
        self.enabled_types.contains(&notification_type)
    }

    /// 是否为未持久化的默认偏好
    pub fn is_default(&self) -> bool {
        self.updated_at.is_none()
    }
}
