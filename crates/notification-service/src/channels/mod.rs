//! 推送渠道实现
//!
//! 定义推送渠道 trait 并提供各平台的具体实现。
//!
//! ## 支持的渠道
//!
//! - **FCM**: Android 类设备
//! - **APNs**: iOS 类设备
//!
//! 配置了 endpoint 时通过 HTTP 投递；未配置时以模拟模式运行，
//! 只记录日志并返回合成的消息 ID，便于本地开发。

mod apns;
mod fcm;

pub use apns::ApnsChannel;
pub use fcm::FcmChannel;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dispatch_shared::config::{PushChannelSettings, PushConfig};

use crate::error::{DispatchError, Result};
use crate::models::Platform;

/// 单台设备的推送消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    pub token: String,
    pub title: String,
    pub body: String,
    pub data: HashMap<String, String>,
    /// 是否播放提示音（来自用户偏好）
    pub sound: bool,
}

impl PushMessage {
    pub fn new(token: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            title: title.into(),
            body: body.into(),
            data: HashMap::new(),
            sound: true,
        }
    }

    pub fn with_data(mut self, data: HashMap<String, String>) -> Self {
        self.data = data;
        self
    }

    pub fn with_sound(mut self, sound: bool) -> Self {
        self.sound = sound;
        self
    }
}

/// 推送后端的投递回执
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub platform: Platform,
    pub message_id: String,
}

/// 推送渠道 trait
///
/// 每个实现对应一个推送后端，负责把消息翻译为该后端的负载格式。
/// 实现应当是无状态的，便于并发调用。
#[async_trait]
pub trait PushChannel: Send + Sync {
    /// 渠道负责的平台
    fn platform(&self) -> Platform;

    /// 渠道名称（用于日志）
    fn name(&self) -> &str;

    /// 向单台设备发送推送
    ///
    /// 失败统一返回 `DispatchError::ChannelSendFailed`
    async fn send(&self, message: &PushMessage) -> Result<DeliveryReceipt>;
}

/// 渠道配置
#[derive(Debug, Clone, Default)]
pub struct ChannelConfig {
    /// 是否启用
    pub enabled: bool,
    /// 请求超时（毫秒）
    pub timeout_ms: u64,
    /// API 端点，为空时进入模拟模式
    pub endpoint: Option<String>,
    /// API 密钥（以 Bearer 方式发送）
    pub api_key: Option<String>,
    /// APNs apns-topic
    pub topic: Option<String>,
}

impl ChannelConfig {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timeout_ms: 5000,
            endpoint: None,
            api_key: None,
            topic: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl From<&PushChannelSettings> for ChannelConfig {
    fn from(settings: &PushChannelSettings) -> Self {
        Self {
            enabled: settings.enabled,
            timeout_ms: settings.timeout_ms,
            endpoint: settings.endpoint.clone(),
            api_key: settings.api_key.clone(),
            topic: settings.topic.clone(),
        }
    }
}

/// 构造渠道发送失败错误
pub(crate) fn send_failed(
    platform: Platform,
    message: &PushMessage,
    reason: impl Into<String>,
) -> DispatchError {
    DispatchError::ChannelSendFailed {
        platform,
        token: message.token.clone(),
        reason: reason.into(),
    }
}

/// 按平台选择推送渠道
///
/// 平台集合是封闭的，新增平台时编译器会要求补全这里的分支
#[derive(Clone)]
pub struct ChannelRouter {
    android: Arc<dyn PushChannel>,
    ios: Arc<dyn PushChannel>,
}

impl ChannelRouter {
    pub fn new(android: Arc<dyn PushChannel>, ios: Arc<dyn PushChannel>) -> Self {
        Self { android, ios }
    }

    /// 根据配置创建 FCM 和 APNs 渠道
    pub fn from_config(config: &PushConfig) -> Self {
        Self::new(
            Arc::new(FcmChannel::new(ChannelConfig::from(&config.fcm))),
            Arc::new(ApnsChannel::new(ChannelConfig::from(&config.apns))),
        )
    }

    /// 两个渠道都使用默认配置（模拟模式）
    pub fn with_defaults() -> Self {
        Self::new(
            Arc::new(FcmChannel::with_defaults()),
            Arc::new(ApnsChannel::with_defaults()),
        )
    }

    pub fn sender_for(&self, platform: Platform) -> &Arc<dyn PushChannel> {
        match platform {
            Platform::Android => &self.android,
            Platform::Ios => &self.ios,
        }
    }
}

impl std::fmt::Debug for ChannelRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelRouter")
            .field("android", &self.android.name())
            .field("ios", &self.ios.name())
            .finish()
    }
}
