//! 通知偏好仓储
//!
//! 免打扰时段以当日分钟数存储（SMALLINT），启用类型以 JSONB 数组存储

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::debug;

use super::traits::PreferencesRepository;
use crate::error::{DispatchError, Result};
use crate::models::{NotificationPreferences, NotificationType, QuietHours, QuietTime};

/// 数据库行
#[derive(Debug, FromRow)]
struct PreferencesRow {
    user_id: String,
    enabled_types: Json<Vec<NotificationType>>,
    quiet_hours_start: Option<i16>,
    quiet_hours_end: Option<i16>,
    sound_enabled: bool,
    vibration_enabled: bool,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PreferencesRow> for NotificationPreferences {
    type Error = DispatchError;

    fn try_from(row: PreferencesRow) -> Result<Self> {
        let quiet_hours = match (row.quiet_hours_start, row.quiet_hours_end) {
            (Some(start), Some(end)) => Some(QuietHours::new(
                QuietTime::from_minute_of_day(start.into())?,
                QuietTime::from_minute_of_day(end.into())?,
            )),
            (None, None) => None,
            _ => {
                return Err(DispatchError::Internal(format!(
                    "免打扰时段数据不完整: user_id={}",
                    row.user_id
                )));
            }
        };

        Ok(Self {
            user_id: row.user_id,
            enabled_types: row.enabled_types.0.into_iter().collect(),
            quiet_hours,
            sound_enabled: row.sound_enabled,
            vibration_enabled: row.vibration_enabled,
            updated_at: Some(row.updated_at),
        })
    }
}

/// PostgreSQL 通知偏好仓储
pub struct PgPreferencesRepository {
    pool: PgPool,
}

impl PgPreferencesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PreferencesRepository for PgPreferencesRepository {
    async fn get_preferences(&self, user_id: &str) -> Result<NotificationPreferences> {
        let row = sqlx::query_as::<_, PreferencesRow>(
            r#"
            SELECT user_id, enabled_types, quiet_hours_start, quiet_hours_end,
                   sound_enabled, vibration_enabled, updated_at
            FROM notification_preferences
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.try_into(),
            None => {
                debug!(user_id = %user_id, "未找到通知偏好，使用默认值");
                Ok(NotificationPreferences::default_for(user_id))
            }
        }
    }

    async fn set_preferences(
        &self,
        preferences: &NotificationPreferences,
    ) -> Result<NotificationPreferences> {
        let enabled_types: Vec<NotificationType> =
            preferences.enabled_types.iter().copied().collect();
        let start = preferences
            .quiet_hours
            .map(|w| w.start.minute_of_day() as i16);
        let end = preferences.quiet_hours.map(|w| w.end.minute_of_day() as i16);

        let row = sqlx::query_as::<_, PreferencesRow>(
            r#"
            INSERT INTO notification_preferences
                (user_id, enabled_types, quiet_hours_start, quiet_hours_end,
                 sound_enabled, vibration_enabled, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            ON CONFLICT (user_id) DO UPDATE SET
                enabled_types = EXCLUDED.enabled_types,
                quiet_hours_start = EXCLUDED.quiet_hours_start,
                quiet_hours_end = EXCLUDED.quiet_hours_end,
                sound_enabled = EXCLUDED.sound_enabled,
                vibration_enabled = EXCLUDED.vibration_enabled,
                updated_at = EXCLUDED.updated_at
            RETURNING user_id, enabled_types, quiet_hours_start, quiet_hours_end,
                      sound_enabled, vibration_enabled, updated_at
            "#,
        )
        .bind(&preferences.user_id)
        .bind(Json(enabled_types))
        .bind(start)
        .bind(end)
        .bind(preferences.sound_enabled)
        .bind(preferences.vibration_enabled)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(start: Option<i16>, end: Option<i16>) -> PreferencesRow {
        PreferencesRow {
            user_id: "user-1".to_string(),
            enabled_types: Json(vec![NotificationType::Mention, NotificationType::PaymentDue]),
            quiet_hours_start: start,
            quiet_hours_end: end,
            sound_enabled: false,
            vibration_enabled: true,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_with_quiet_hours() {
        let prefs = NotificationPreferences::try_from(row(Some(1320), Some(480))).unwrap();
        let window = prefs.quiet_hours.unwrap();
        assert_eq!(window.start.to_string(), "22:00");
        assert_eq!(window.end.to_string(), "08:00");
        assert!(prefs.is_type_enabled(NotificationType::Mention));
        assert!(!prefs.is_type_enabled(NotificationType::NewComment));
        assert!(!prefs.sound_enabled);
        assert!(!prefs.is_default());
    }

    #[test]
    fn test_row_without_quiet_hours() {
        let prefs = NotificationPreferences::try_from(row(None, None)).unwrap();
        assert!(prefs.quiet_hours.is_none());
    }

    #[test]
    fn test_row_with_half_window_is_rejected() {
        let err = NotificationPreferences::try_from(row(Some(60), None)).unwrap_err();
        assert!(matches!(err, DispatchError::Internal(_)));
    }
}
