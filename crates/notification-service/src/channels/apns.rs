//! APNs 推送渠道
//!
//! 向 iOS 类设备投递，请求路径为 `{endpoint}/3/device/{token}`。

use async_trait::async_trait;
use reqwest::Url;
use serde_json::{Map, Value, json};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{ChannelConfig, DeliveryReceipt, PushChannel, PushMessage, send_failed};
use crate::error::Result;
use crate::models::Platform;

/// APNs 推送渠道
pub struct ApnsChannel {
    config: ChannelConfig,
    client: reqwest::Client,
}

impl ApnsChannel {
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

    /// 构造 APNs 请求体
    ///
    /// 业务数据作为与 `aps` 同级的自定义键；与 `aps` 同名的键会被忽略
    pub fn build_payload(message: &PushMessage) -> Value {
        let mut aps = json!({
            "alert": {
                "title": message.title,
                "body": message.body,
            }
        });
        if message.sound {
            aps["sound"] = json!("default");
        }

        let mut root = Map::new();
        for (key, value) in &message.data {
            if key != "aps" {
                root.insert(key.clone(), json!(value));
            }
        }
        root.insert("aps".to_string(), aps);
        Value::Object(root)
    }

    /// 拼接设备地址，token 作为单个路径段编码
    pub fn device_url(endpoint: &str, token: &str) -> std::result::Result<Url, String> {
        let mut url = Url::parse(endpoint).map_err(|e| format!("APNs endpoint 无效: {e}"))?;
        url.path_segments_mut()
            .map_err(|_| format!("APNs endpoint 不能作为基础地址: {endpoint}"))?
            .pop_if_empty()
            .extend(["3", "device", token]);
        Ok(url)
    }

    async fn post(&self, endpoint: &str, message: &PushMessage) -> Result<String> {
        let url = Self::device_url(endpoint, &message.token)
            .map_err(|reason| send_failed(Platform::Ios, message, reason))?;

        let mut request = self
            .client
            .post(url)
            .timeout(self.config.timeout())
            .header("apns-push-type", "alert")
            .json(&Self::build_payload(message));
        if let Some(topic) = &self.config.topic {
            request = request.header("apns-topic", topic);
        }
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| send_failed(Platform::Ios, message, format!("请求 APNs 失败: {e}")))?;

        let status = response.status();
        let apns_id = response
            .headers()
            .get("apns-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if !status.is_success() {
            // 失败响应形如 {"reason": "BadDeviceToken"}
            let reason = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|body| body.get("reason").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_default();
            return Err(send_failed(
                Platform::Ios,
                message,
                format!("APNs 返回 HTTP {status}: {reason}"),
            ));
        }

        Ok(apns_id.unwrap_or_else(|| format!("apns_{}", Uuid::new_v4())))
    }
}

#[async_trait]
impl PushChannel for ApnsChannel {
    fn platform(&self) -> Platform {
        Platform::Ios
    }

    fn name(&self) -> &str {
        "APNs"
    }

    async fn send(&self, message: &PushMessage) -> Result<DeliveryReceipt> {
        if !self.config.enabled {
            warn!("APNs 渠道已禁用");
            return Err(send_failed(Platform::Ios, message, "渠道已禁用"));
        }

        let message_id = match &self.config.endpoint {
            Some(endpoint) => self.post(endpoint, message).await?,
            None => {
                debug!(title = %message.title, "APNs 模拟模式，跳过网络请求");
                format!("apns_{}", Uuid::new_v4())
            }
        };

        debug!(message_id = %message_id, "APNs 推送成功");

        Ok(DeliveryReceipt {
            platform: Platform::Ios,
            message_id,
        })
    }
}
