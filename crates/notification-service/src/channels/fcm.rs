//! FCM 推送渠道
//!
//! 使用 FCM HTTP v1 负载格式向 Android 类设备投递。

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{ChannelConfig, DeliveryReceipt, PushChannel, PushMessage, send_failed};
use crate::error::Result;
use crate::models::Platform;

/// FCM 推送渠道
pub struct FcmChannel {
    config: ChannelConfig,
    client: reqwest::Client,
}

impl FcmChannel {
    pub fn new(config: ChannelConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// 使用默认配置创建
    pub fn with_defaults() -> Self {
        Self::new(ChannelConfig::new(true).with_timeout(3000))
    }

    /// 构造 FCM HTTP v1 请求体
    pub fn build_payload(message: &PushMessage) -> Value {
        let mut android_notification = json!({});
        if message.sound {
            android_notification["sound"] = json!("default");
        }

        json!({
            "message": {
                "token": message.token,
                "notification": {
                    "title": message.title,
                    "body": message.body,
                },
                "data": message.data,
                "android": {
                    "priority": "high",
                    "notification": android_notification,
                },
            }
        })
    }

    async fn post(&self, endpoint: &str, message: &PushMessage) -> Result<String> {
        let mut request = self
            .client
            .post(endpoint)
            .timeout(self.config.timeout())
            .json(&Self::build_payload(message));
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| send_failed(Platform::Android, message, format!("请求 FCM 失败: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(send_failed(
                Platform::Android,
                message,
                format!("FCM 返回 HTTP {status}: {detail}"),
            ));
        }

        // 成功响应形如 {"name": "projects/{project}/messages/{id}"}
        let body: Value = response
            .json()
            .await
            .map_err(|e| send_failed(Platform::Android, message, format!("解析 FCM 响应失败: {e}")))?;

        Ok(body
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("fcm_{}", Uuid::new_v4())))
    }
}

#[async_trait]
impl PushChannel for FcmChannel {
    fn platform(&self) -> Platform {
        Platform::Android
    }

    fn name(&self) -> &str {
        "FCM"
    }

    async fn send(&self, message: &PushMessage) -> Result<DeliveryReceipt> {
        if !self.config.enabled {
            warn!("FCM 渠道已禁用");
            return Err(send_failed(Platform::Android, message, "渠道已禁用"));
        }

        let message_id = match &self.config.endpoint {
            Some(endpoint) => self.post(endpoint, message).await?,
            None => {
                debug!(title = %message.title, "FCM 模拟模式，跳过网络请求");
                format!("fcm_{}", Uuid::new_v4())
            }
        };

        debug!(message_id = %message_id, "FCM 推送成功");

        Ok(DeliveryReceipt {
            platform: Platform::Android,
            message_id,
        })
    }
}
