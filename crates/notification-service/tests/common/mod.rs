//! 集成测试公共组件
//!
//! 内存仓储 + 记录调用的推送渠道，无需外部依赖

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use notification_dispatch::{
    ChannelRouter, DeliveryReceipt, DispatchError, NotificationService, Platform, PushChannel,
    PushMessage, Result,
    repository::{
        InMemoryNotificationRepository, InMemoryPreferencesRepository, InMemoryTokenRepository,
    },
};

/// 记录每次调用的推送渠道
pub struct RecordingChannel {
    platform: Platform,
    fail: bool,
    sent: Mutex<Vec<PushMessage>>,
}

impl RecordingChannel {
    pub fn new(platform: Platform) -> Arc<Self> {
        Arc::new(Self {
            platform,
            fail: false,
            sent: Mutex::new(Vec::new()),
        })
    }

    /// 每次发送都失败的渠道
    pub fn failing(platform: Platform) -> Arc<Self> {
        Arc::new(Self {
            platform,
            fail: true,
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn sent(&self) -> Vec<PushMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.sent.lock().unwrap().len()
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
                reason: "simulated outage".to_string(),
            });
        }
        Ok(DeliveryReceipt {
            platform: self.platform,
            message_id: format!("test-{}", message.token),
        })
    }
}

/// 测试环境：服务及其依赖的句柄
pub struct TestHarness {
    pub service: Arc<NotificationService>,
    pub tokens: Arc<InMemoryTokenRepository>,
    pub preferences: Arc<InMemoryPreferencesRepository>,
    pub notifications: Arc<InMemoryNotificationRepository>,
    pub android: Arc<RecordingChannel>,
    pub ios: Arc<RecordingChannel>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_channels(
            RecordingChannel::new(Platform::Android),
            RecordingChannel::new(Platform::Ios),
        )
    }

    pub fn with_channels(android: Arc<RecordingChannel>, ios: Arc<RecordingChannel>) -> Self {
        let tokens = Arc::new(InMemoryTokenRepository::new());
        let preferences = Arc::new(InMemoryPreferencesRepository::new());
        let notifications = Arc::new(InMemoryNotificationRepository::new());

        let service = NotificationService::new(
            tokens.clone(),
            preferences.clone(),
            notifications.clone(),
            ChannelRouter::new(android.clone(), ios.clone()),
        );

        Self {
            service: Arc::new(service),
            tokens,
            preferences,
            notifications,
            android,
            ios,
        }
    }

    pub fn total_sends(&self) -> usize {
        self.android.call_count() + self.ios.call_count()
    }
}

/// 固定日期下的 UTC 时刻
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, hour, minute, 0).unwrap()
}
