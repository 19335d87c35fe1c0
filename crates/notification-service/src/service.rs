//! 通知分发服务
//!
//! 串起偏好读取、策略判定、设备查询、记录持久化与多设备推送。
//!
//! ## 分发流程
//!
//! 1. 读取用户偏好（未保存过时使用默认偏好）
//! 2. 策略判定，拒绝时不落库也不推送
//! 3. 查询设备 token，没有设备时不落库
//! 4. 持久化未读通知记录，失败时不推送
//! 5. 并行推送到所有设备，单设备失败只记录日志和指标
//! 6. 返回记录 ID
//!
//! 除发送外的操作都是对仓储的直通调用，不附加策略。

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use dispatch_shared::observability::metrics as dispatch_metrics;
use futures::future::join_all;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::channels::{ChannelRouter, PushMessage};
use crate::error::{DispatchError, Result};
use crate::models::{
    NotificationPreferences, NotificationRecord, NotificationRequest, NotificationView, Platform,
    PushToken,
};
use crate::policy::{self, PolicyDecision};
use crate::repository::{NotificationRepository, PreferencesRepository, TokenRepository};

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

/// 一次多设备推送的汇总
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutSummary {
    pub delivered: usize,
    pub failed: usize,
}

impl FanOutSummary {
    pub fn total(&self) -> usize {
        self.delivered + self.failed
    }
}

/// 通知分发服务
///
/// 所有依赖都是 `Arc<dyn Trait>`，服务可以在 tokio 任务和 axum handler 间共享
pub struct NotificationService {
    tokens: Arc<dyn TokenRepository>,
    preferences: Arc<dyn PreferencesRepository>,
    notifications: Arc<dyn NotificationRepository>,
    channels: ChannelRouter,
    default_page_size: i64,
    max_page_size: i64,
}

impl NotificationService {
    pub fn new(
        tokens: Arc<dyn TokenRepository>,
        preferences: Arc<dyn PreferencesRepository>,
        notifications: Arc<dyn NotificationRepository>,
        channels: ChannelRouter,
    ) -> Self {
        Self {
            tokens,
            preferences,
            notifications,
            channels,
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }

    /// 设置通知列表分页大小
    pub fn with_page_sizes(mut self, default_page_size: i64, max_page_size: i64) -> Self {
        self.max_page_size = max_page_size.max(1);
        self.default_page_size = default_page_size.clamp(1, self.max_page_size);
        self
    }

    // ==================== 分发 ====================

    /// 发送通知（使用当前时刻判断免打扰）
    pub async fn send_notification(&self, request: NotificationRequest) -> Result<Uuid> {
        self.send_notification_at(request, Utc::now()).await
    }

    /// 以指定时刻发送通知
    ///
    /// `now` 同时用于免打扰判定和记录的 `sent_at`
    #[instrument(
        skip(self, request),
        fields(
            user_id = %request.user_id,
            notification_type = %request.notification_type
        )
    )]
    pub async fn send_notification_at(
        &self,
        request: NotificationRequest,
        now: DateTime<Utc>,
    ) -> Result<Uuid> {
        ensure_user_id(&request.user_id)?;
        let start = Instant::now();
        let notification_type = request.notification_type;

        let preferences = self.preferences.get_preferences(&request.user_id).await?;

        if let PolicyDecision::Deny(reason) = policy::evaluate(&request, &preferences, now) {
            info!(reason = %reason, "通知被策略拒绝");
            dispatch_metrics::record_notification_rejected(
                notification_type.as_str(),
                reason.as_str(),
            );
            return Err(DispatchError::PolicyRejected(reason));
        }

        let tokens = self.tokens.get_tokens(&request.user_id).await?;
        if tokens.is_empty() {
            info!("用户没有注册推送设备");
            dispatch_metrics::record_notification_rejected(notification_type.as_str(), "no_tokens");
            return Err(DispatchError::NoTokensRegistered {
                user_id: request.user_id,
            });
        }

        let record = NotificationRecord::from_request(request, now);
        let id = self.notifications.create(&record).await.map_err(|e| {
            error!(error = %e, "通知记录持久化失败，跳过推送");
            e
        })?;

        debug!(notification_id = %id, device_count = tokens.len(), "通知记录已保存");

        let summary = self
            .fan_out(&record, &tokens, preferences.sound_enabled)
            .await;
        self.log_result(id, &summary, start);

        dispatch_metrics::record_notification_dispatched(
            notification_type.as_str(),
            tokens.len(),
            start.elapsed().as_secs_f64(),
        );

        Ok(id)
    }

    /// 并行推送到用户的所有设备
    ///
    /// 每台设备独立发送，失败不影响其他设备，也不回滚记录
    async fn fan_out(
        &self,
        record: &NotificationRecord,
        tokens: &[PushToken],
        sound: bool,
    ) -> FanOutSummary {
        let send_futures: Vec<_> = tokens
            .iter()
            .map(|token| {
                let channel = self.channels.sender_for(token.platform).clone();
                let message = PushMessage::new(&token.token, &record.title, &record.body)
                    .with_data(record.data.clone())
                    .with_sound(sound);
                let platform = token.platform;
                async move { (platform, channel.send(&message).await) }
            })
            .collect();

        let results = join_all(send_futures).await;

        let mut summary = FanOutSummary::default();
        for (platform, result) in results {
            match result {
                Ok(receipt) => {
                    summary.delivered += 1;
                    dispatch_metrics::record_push_send(platform.as_str(), "success");
                    debug!(
                        notification_id = %record.id,
                        platform = %platform,
                        message_id = %receipt.message_id,
                        "设备推送成功"
                    );
                }
                Err(e) => {
                    summary.failed += 1;
                    dispatch_metrics::record_push_send(platform.as_str(), "failed");
                    warn!(
                        notification_id = %record.id,
                        platform = %platform,
                        error = %e,
                        "设备推送失败"
                    );
                }
            }
        }
        summary
    }

    /// 记录推送结果
    fn log_result(&self, id: Uuid, summary: &FanOutSummary, start: Instant) {
        let duration_ms = start.elapsed().as_millis() as u64;
        let total = summary.total();

        if summary.failed == 0 {
            info!(
                notification_id = %id,
                delivered = summary.delivered,
                total,
                duration_ms,
                "通知分发完成（全部成功）"
            );
        } else if summary.delivered > 0 {
            warn!(
                notification_id = %id,
                delivered = summary.delivered,
                failed = summary.failed,
                total,
                duration_ms,
                "通知分发完成（部分成功）"
            );
        } else {
            error!(
                notification_id = %id,
                failed = summary.failed,
                total,
                duration_ms,
                "通知分发完成（全部失败）"
            );
        }
    }

    // ==================== 设备 token ====================

    /// 注册推送 token，同平台旧 token 被覆盖
    #[instrument(skip(self, token), fields(user_id = %user_id, platform = %platform))]
    pub async fn register_push_token(
        &self,
        user_id: &str,
        platform: Platform,
        token: &str,
    ) -> Result<()> {
        ensure_user_id(user_id)?;
        if token.trim().is_empty() {
            return Err(DispatchError::Validation("推送 token 不能为空".to_string()));
        }
        if !PushToken::is_well_formed(platform, token) {
            return Err(DispatchError::Validation(format!(
                "{platform} 推送 token 格式无效"
            )));
        }
        self.tokens.register_token(user_id, platform, token).await?;
        info!("推送 token 已注册");
        Ok(())
    }

    /// 注销推送 token，未注册时同样成功
    #[instrument(skip(self), fields(user_id = %user_id, platform = %platform))]
    pub async fn unregister_push_token(&self, user_id: &str, platform: Platform) -> Result<()> {
        ensure_user_id(user_id)?;
        self.tokens.unregister_token(user_id, platform).await?;
        info!("推送 token 已注销");
        Ok(())
    }

    // ==================== 通知记录 ====================

    /// 获取用户最近的通知，默认 50 条，按发送时间倒序
    pub async fn get_notifications(
        &self,
        user_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<NotificationView>> {
        ensure_user_id(user_id)?;
        let limit = self.effective_limit(limit)?;
        let records = self.notifications.list_by_user(user_id, limit).await?;
        Ok(records.into_iter().map(NotificationView::from).collect())
    }

    /// 获取用户全部未读通知，按发送时间倒序
    pub async fn get_unread_notifications(&self, user_id: &str) -> Result<Vec<NotificationView>> {
        ensure_user_id(user_id)?;
        let records = self.notifications.list_unread_by_user(user_id).await?;
        Ok(records.into_iter().map(NotificationView::from).collect())
    }

    pub async fn get_unread_count(&self, user_id: &str) -> Result<i64> {
        ensure_user_id(user_id)?;
        self.notifications.count_unread(user_id).await
    }

    pub async fn get_notification(&self, id: Uuid) -> Result<NotificationView> {
        self.notifications
            .get_by_id(id)
            .await?
            .map(NotificationView::from)
            .ok_or(DispatchError::NotificationNotFound(id))
    }

    /// 标记单条通知已读
    ///
    /// 已读或不存在的记录不报错
    #[instrument(skip(self))]
    pub async fn mark_as_read(&self, id: Uuid) -> Result<()> {
        let changed = self.notifications.mark_read(id, Utc::now()).await?;
        debug!(changed, "标记已读");
        Ok(())
    }

    /// 标记用户全部通知已读，返回本次标记条数
    #[instrument(skip(self))]
    pub async fn mark_all_as_read(&self, user_id: &str) -> Result<u64> {
        ensure_user_id(user_id)?;
        let changed = self.notifications.mark_all_read(user_id, Utc::now()).await?;
        info!(changed, "全部标记已读");
        Ok(changed)
    }

    /// 删除通知，不存在时同样成功
    #[instrument(skip(self))]
    pub async fn delete_notification(&self, id: Uuid) -> Result<()> {
        let deleted = self.notifications.delete(id).await?;
        debug!(deleted, "删除通知");
        Ok(())
    }

    // ==================== 偏好 ====================

    pub async fn get_preferences(&self, user_id: &str) -> Result<NotificationPreferences> {
        ensure_user_id(user_id)?;
        self.preferences.get_preferences(user_id).await
    }

    /// 整体替换用户偏好
    #[instrument(skip(self, preferences), fields(user_id = %preferences.user_id))]
    pub async fn update_preferences(
        &self,
        preferences: NotificationPreferences,
    ) -> Result<NotificationPreferences> {
        ensure_user_id(&preferences.user_id)?;
        let saved = self.preferences.set_preferences(&preferences).await?;
        info!(
            enabled_types = saved.enabled_types.len(),
            quiet_hours = saved.quiet_hours.is_some(),
            "通知偏好已更新"
        );
        Ok(saved)
    }

    fn effective_limit(&self, limit: Option<i64>) -> Result<i64> {
        match limit {
            None => Ok(self.default_page_size),
            Some(n) if n < 1 => Err(DispatchError::Validation(format!(
                "limit 必须为正数: {n}"
            ))),
            Some(n) => Ok(n.min(self.max_page_size)),
        }
    }
}

/// user_id 列宽为 VARCHAR(128)
const MAX_USER_ID_CHARS: usize = 128;

fn ensure_user_id(user_id: &str) -> Result<()> {
    if user_id.trim().is_empty() {
        return Err(DispatchError::Validation("user_id 不能为空".to_string()));
    }
    if user_id.chars().count() > MAX_USER_ID_CHARS {
        return Err(DispatchError::Validation(format!(
            "user_id 长度不能超过 {MAX_USER_ID_CHARS} 个字符"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::{DeliveryReceipt, PushChannel};
    use crate::models::{NotificationType, QuietTime};
    use crate::policy::DenyReason;
    use crate::repository::{
        InMemoryNotificationRepository, InMemoryPreferencesRepository, InMemoryTokenRepository,
        MockNotificationRepository, MockPreferencesRepository, MockTokenRepository,
    };
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Mutex;

    /// 记录调用的测试渠道
    struct RecordingChannel {
        platform: Platform,
        fail: bool,
        sent: Mutex<Vec<PushMessage>>,
    }

    impl RecordingChannel {
        fn new(platform: Platform, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                platform,
                fail,
                sent: Mutex::new(Vec::new()),
            })
        }

        fn sent(&self) -> Vec<PushMessage> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PushChannel for RecordingChannel {
        fn platform(&self) -> Platform {
            self.platform
        }

        fn name(&self) -> &str {
            "recording"
        }

        async fn send(&self, message: &PushMessage) -> Result<DeliveryReceipt> {
            self.sent.lock().unwrap().push(message.clone());
            if self.fail {
                return Err(DispatchError::ChannelSendFailed {
                    platform: self.platform,
                    token: message.token.clone(),
                    reason: "simulated".to_string(),
                });
            }
            Ok(DeliveryReceipt {
                platform: self.platform,
                message_id: "msg-1".to_string(),
            })
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn request(notification_type: NotificationType) -> NotificationRequest {
        NotificationRequest::new("u1", notification_type, "title", "body")
    }

    fn request_for(user_id: &str) -> NotificationRequest {
        NotificationRequest::new(user_id, NotificationType::Mention, "title", "body")
    }

    #[tokio::test]
    async fn test_store_unavailable_skips_sends() {
        let mut preferences = MockPreferencesRepository::new();
        preferences
            .expect_get_preferences()
            .returning(|user_id| Ok(NotificationPreferences::default_for(user_id)));

        let mut tokens = MockTokenRepository::new();
        tokens
            .expect_get_tokens()
            .returning(|user_id| Ok(vec![PushToken::new(user_id, Platform::Ios, "ios-tok")]));

        let mut notifications = MockNotificationRepository::new();
        notifications
            .expect_create()
            .times(1)
            .returning(|_| Err(DispatchError::StoreUnavailable(sqlx::Error::PoolTimedOut)));

        let ios = RecordingChannel::new(Platform::Ios, false);
        let android = RecordingChannel::new(Platform::Android, false);
        let service = NotificationService::new(
            Arc::new(tokens),
            Arc::new(preferences),
            Arc::new(notifications),
            ChannelRouter::new(android.clone(), ios.clone()),
        );

        let err = service
            .send_notification_at(request(NotificationType::Mention), noon())
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::StoreUnavailable(_)));
        assert!(ios.sent().is_empty());
        assert!(android.sent().is_empty());
    }

    #[tokio::test]
    async fn test_policy_rejection_skips_token_lookup() {
        let mut preferences = MockPreferencesRepository::new();
        preferences.expect_get_preferences().returning(|user_id| {
            Ok(NotificationPreferences::default_for(user_id)
                .without_type(NotificationType::PaymentDue))
        });

        let mut tokens = MockTokenRepository::new();
        tokens.expect_get_tokens().never();

        let mut notifications = MockNotificationRepository::new();
        notifications.expect_create().never();

        let service = NotificationService::new(
            Arc::new(tokens),
            Arc::new(preferences),
            Arc::new(notifications),
            ChannelRouter::with_defaults(),
        );

        let err = service
            .send_notification_at(request(NotificationType::PaymentDue), noon())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::PolicyRejected(DenyReason::TypeDisabled)
        ));
    }

    #[tokio::test]
    async fn test_preferences_store_failure_propagates() {
        let mut preferences = MockPreferencesRepository::new();
        preferences
            .expect_get_preferences()
            .returning(|_| Err(DispatchError::StoreUnavailable(sqlx::Error::PoolClosed)));

        let service = NotificationService::new(
            Arc::new(MockTokenRepository::new()),
            Arc::new(preferences),
            Arc::new(MockNotificationRepository::new()),
            ChannelRouter::with_defaults(),
        );

        let err = service
            .send_notification(request(NotificationType::Mention))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_fan_out_carries_payload_and_sound_preference() {
        let tokens = Arc::new(InMemoryTokenRepository::new());
        tokens
            .register_token("u1", Platform::Android, "android-tok")
            .await
            .unwrap();
        let preferences = Arc::new(InMemoryPreferencesRepository::new());
        let mut prefs = NotificationPreferences::default_for("u1");
        prefs.sound_enabled = false;
        preferences.set_preferences(&prefs).await.unwrap();

        let android = RecordingChannel::new(Platform::Android, false);
        let service = NotificationService::new(
            tokens,
            preferences,
            Arc::new(InMemoryNotificationRepository::new()),
            ChannelRouter::new(android.clone(), RecordingChannel::new(Platform::Ios, false)),
        );

        service
            .send_notification_at(
                request(NotificationType::EventInvite).with_data("eventId", "evt-1"),
                noon(),
            )
            .await
            .unwrap();

        let sent = android.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].token, "android-tok");
        assert_eq!(sent[0].title, "title");
        assert_eq!(sent[0].data.get("eventId").map(String::as_str), Some("evt-1"));
        assert!(!sent[0].sound);
    }

    #[tokio::test]
    async fn test_quiet_hours_use_supplied_clock() {
        let preferences = Arc::new(InMemoryPreferencesRepository::new());
        preferences
            .set_preferences(&NotificationPreferences::default_for("u1").with_quiet_hours(
                QuietTime::new(11, 0).unwrap(),
                QuietTime::new(13, 0).unwrap(),
            ))
            .await
            .unwrap();

        let service = NotificationService::new(
            Arc::new(InMemoryTokenRepository::new()),
            preferences,
            Arc::new(InMemoryNotificationRepository::new()),
            ChannelRouter::with_defaults(),
        );

        let err = service
            .send_notification_at(request(NotificationType::Mention), noon())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::PolicyRejected(DenyReason::QuietHours)
        ));
    }

    #[tokio::test]
    async fn test_effective_limit() {
        let service = NotificationService::new(
            Arc::new(InMemoryTokenRepository::new()),
            Arc::new(InMemoryPreferencesRepository::new()),
            Arc::new(InMemoryNotificationRepository::new()),
            ChannelRouter::with_defaults(),
        )
        .with_page_sizes(20, 100);

        assert_eq!(service.effective_limit(None).unwrap(), 20);
        assert_eq!(service.effective_limit(Some(5)).unwrap(), 5);
        assert_eq!(service.effective_limit(Some(1000)).unwrap(), 100);
        assert!(service.effective_limit(Some(0)).is_err());
    }

    #[tokio::test]
    async fn test_register_rejects_blank_token() {
        let service = NotificationService::new(
            Arc::new(InMemoryTokenRepository::new()),
            Arc::new(InMemoryPreferencesRepository::new()),
            Arc::new(InMemoryNotificationRepository::new()),
            ChannelRouter::with_defaults(),
        );

        let err = service
            .register_push_token("u1", Platform::Ios, "  ")
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Validation(_)));
    }

    #[tokio::test]
    async fn test_register_rejects_path_like_apns_token() {
        let tokens = Arc::new(InMemoryTokenRepository::new());
        let service = NotificationService::new(
            tokens.clone(),
            Arc::new(InMemoryPreferencesRepository::new()),
            Arc::new(InMemoryNotificationRepository::new()),
            ChannelRouter::with_defaults(),
        );

        let err = service
            .register_push_token("u1", Platform::Ios, "x/../../admin/purge?all=1#")
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Validation(_)));
        assert!(tokens.get_tokens("u1").await.unwrap().is_empty());

        service
            .register_push_token("u1", Platform::Ios, "0123abcdef")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_overlong_user_id_is_validation_error() {
        // 存储层不应被调用
        let service = NotificationService::new(
            Arc::new(MockTokenRepository::new()),
            Arc::new(MockPreferencesRepository::new()),
            Arc::new(MockNotificationRepository::new()),
            ChannelRouter::with_defaults(),
        );
        let long_id = "u".repeat(MAX_USER_ID_CHARS + 1);

        let err = service
            .update_preferences(NotificationPreferences::default_for(&long_id))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Validation(_)));
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
        assert!(!err.is_retryable());

        assert!(matches!(
            service.register_push_token(&long_id, Platform::Android, "a").await,
            Err(DispatchError::Validation(_))
        ));
        assert!(matches!(
            service.get_notifications(&long_id, None).await,
            Err(DispatchError::Validation(_))
        ));
        assert!(matches!(
            service.send_notification_at(request_for(&long_id), noon()).await,
            Err(DispatchError::Validation(_))
        ));

        // 恰好 128 个字符（多字节）仍合法
        let max_id = "用".repeat(MAX_USER_ID_CHARS);
        assert!(ensure_user_id(&max_id).is_ok());
    }
}
